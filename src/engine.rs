use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use rust_decimal::Decimal;

use crate::clock::ChainClock;
use crate::collateral::LiquidationCheck;
use crate::config::{CallerPolicy, LendingConfig};
use crate::decimal::Money;
use crate::errors::{InvalidField, LendingError, Result};
use crate::events::{Event, EventStore};
use crate::ledger::{CollateralEscrow, PaymentRail};
use crate::serialization::LoanView;
use crate::state::{LoanRecord, LoanSnapshot, LoanTerms};
use crate::store::LoanStore;
use crate::types::{AccountId, BlockHeight, LoanId, LoanStatus};

/// loan lifecycle state machine
///
/// Every operation validates against a read-only copy of the record first, then
/// runs its escrow and payment side effects, and commits the record change last.
/// A failing side effect compensates the ones before it, so an operation either
/// fully commits or leaves store and ledger as they were.
pub struct LendingEngine<E, P, C> {
    config: LendingConfig,
    store: LoanStore,
    escrow: E,
    rail: P,
    clock: C,
    events: EventStore,
}

impl<E, P, C> LendingEngine<E, P, C>
where
    E: CollateralEscrow,
    P: PaymentRail,
    C: ChainClock,
{
    /// engine with default configuration and an empty store
    pub fn new(escrow: E, rail: P, clock: C) -> Self {
        Self {
            config: LendingConfig::default(),
            store: LoanStore::new(),
            escrow,
            rail,
            clock,
            events: EventStore::new(),
        }
    }

    pub fn with_config(config: LendingConfig, escrow: E, rail: P, clock: C) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::new(escrow, rail, clock)
        })
    }

    /// resume from a previously exported store
    pub fn with_store(mut self, store: LoanStore) -> Self {
        self.store = store;
        self
    }

    /// request a loan; the caller becomes the borrower and their collateral is locked
    pub fn create(&mut self, caller: &AccountId, terms: LoanTerms) -> Result<LoanId> {
        self.validate_terms(&terms)?;

        let loan_id = self.store.next_id();
        let (height, now) = (self.clock.height(), self.clock.now());

        self.escrow
            .lock(loan_id, caller, terms.collateral_amount)
            .map_err(|source| {
                warn!("loan {} collateral lock failed for {}: {}", loan_id, caller, source);
                LendingError::InsufficientCollateralFunds {
                    account: caller.clone(),
                    required: terms.collateral_amount,
                    source,
                }
            })?;

        let principal = terms.principal;
        let collateral_amount = terms.collateral_amount;
        let record = LoanRecord::new(loan_id, caller.clone(), terms, height, now);

        if let Err(err) = self.store.insert(record) {
            if let Err(undo) = self.escrow.release(loan_id, caller) {
                warn!("loan {} collateral rollback failed: {}", loan_id, undo);
            }
            return Err(err);
        }
        self.store.audit(loan_id, height, "create")?;

        self.events.emit(Event::CollateralLocked {
            loan_id,
            owner: caller.clone(),
            amount: collateral_amount,
            timestamp: now,
        });
        self.events.emit(Event::LoanCreated {
            loan_id,
            borrower: caller.clone(),
            principal,
            collateral_amount,
            height,
            timestamp: now,
        });

        info!(
            "loan {} created by {}: principal {}, collateral {}",
            loan_id, caller, principal, collateral_amount
        );
        Ok(loan_id)
    }

    /// fund a pending loan; the caller becomes the lender and pays the principal to the borrower
    pub fn fund(&mut self, caller: &AccountId, loan_id: LoanId) -> Result<()> {
        let record = self.store.get(loan_id)?.clone();

        if record.status != LoanStatus::Pending {
            return Err(LendingError::LoanNotPending {
                loan_id,
                status: record.status,
            });
        }
        if !self.config.allow_self_funding && caller == &record.borrower {
            return Err(LendingError::Unauthorized {
                loan_id,
                caller: caller.clone(),
                action: "fund",
            });
        }

        let (height, now) = (self.clock.height(), self.clock.now());
        let principal = record.principal();
        let due_at_height = record.terms.maturity(height).ok_or_else(|| {
            LendingError::invalid(
                InvalidField::TermLength,
                format!(
                    "term of {} blocks runs past the last block when funded at {}",
                    record.terms.term_length, height
                ),
            )
        })?;

        self.transfer(caller, &record.borrower, principal)?;

        let committed = self.store.update(loan_id, |r| {
            r.activate(caller.clone(), height, now);
            Ok(())
        });
        if let Err(err) = committed {
            self.compensate_transfer(&record.borrower, caller, principal);
            return Err(err);
        }
        self.store.audit(loan_id, height, "fund")?;

        self.events.emit(Event::LoanFunded {
            loan_id,
            lender: caller.clone(),
            principal,
            due_at_height,
            timestamp: now,
        });
        self.emit_status_change(loan_id, LoanStatus::Pending, LoanStatus::Active, height, now);

        info!("loan {} funded by {}, due at height {}", loan_id, caller, due_at_height);
        Ok(())
    }

    /// settle an active loan in full and return the collateral to the borrower
    pub fn repay(&mut self, caller: &AccountId, loan_id: LoanId, amount: Money) -> Result<()> {
        let record = self.store.get(loan_id)?.clone();
        let lender = Self::require_active(&record)?;

        if caller != &record.borrower {
            return Err(LendingError::Unauthorized {
                loan_id,
                caller: caller.clone(),
                action: "repay",
            });
        }

        let (height, now) = (self.clock.height(), self.clock.now());
        let outstanding = self
            .config
            .accrual_model
            .calculate(&record, height)
            .outstanding();
        debug!("loan {} outstanding {} at height {}", loan_id, outstanding, height);

        if amount < outstanding {
            return Err(LendingError::InsufficientRepaymentAmount {
                outstanding,
                provided: amount,
            });
        }

        self.transfer(caller, &lender, amount)?;

        let released = match self.release_collateral(loan_id, &record.borrower) {
            Ok(released) => released,
            Err(err) => {
                self.compensate_transfer(&lender, caller, amount);
                return Err(err);
            }
        };

        self.store.update(loan_id, |r| {
            r.amount_repaid = amount;
            r.close(LoanStatus::Repaid, height, now);
            Ok(())
        })?;
        self.store.audit(loan_id, height, "repay")?;

        self.events.emit(Event::LoanRepaid {
            loan_id,
            amount,
            outstanding,
            timestamp: now,
        });
        self.emit_release(loan_id, &record.borrower, released, now);
        self.emit_status_change(loan_id, LoanStatus::Active, LoanStatus::Repaid, height, now);

        info!("loan {} repaid with {} (outstanding {})", loan_id, amount, outstanding);
        Ok(())
    }

    /// force-close a past-due or undercollateralized loan, forfeiting collateral to the lender
    pub fn liquidate(&mut self, caller: &AccountId, loan_id: LoanId) -> Result<()> {
        let record = self.store.get(loan_id)?.clone();
        let lender = Self::require_active(&record)?;
        Self::authorize(self.config.liquidation_policy, caller, &lender, loan_id, "liquidate")?;

        let (height, now) = (self.clock.height(), self.clock.now());
        let check = self.assess(&record, height)?;
        debug!(
            "loan {} collateralization {} bps (threshold {}), past due: {}",
            loan_id, check.ratio_bps, check.threshold_bps, check.past_due
        );

        let reason = check.reason().ok_or(LendingError::LiquidationImpossible {
            loan_id,
            ratio_bps: check.ratio_bps,
        })?;

        let released = self.release_collateral(loan_id, &lender)?;

        self.store.update(loan_id, |r| {
            r.close(LoanStatus::Liquidated, height, now);
            Ok(())
        })?;
        self.store.audit(loan_id, height, "liquidate")?;

        self.events.emit(Event::LoanLiquidated {
            loan_id,
            caller: caller.clone(),
            reason,
            collateral_value: check.collateral_value,
            timestamp: now,
        });
        self.emit_release(loan_id, &lender, released, now);
        self.emit_status_change(loan_id, LoanStatus::Active, LoanStatus::Liquidated, height, now);

        info!("loan {} liquidated by {} ({:?})", loan_id, caller, reason);
        Ok(())
    }

    /// close a matured, unrepaid loan as defaulted, forfeiting collateral to the lender
    pub fn default_loan(&mut self, caller: &AccountId, loan_id: LoanId) -> Result<()> {
        let record = self.store.get(loan_id)?.clone();
        let lender = Self::require_active(&record)?;
        Self::authorize(self.config.default_policy, caller, &lender, loan_id, "default")?;

        let (height, now) = (self.clock.height(), self.clock.now());
        let due_at_height = record.due_at_height.unwrap_or(height);
        if !record.is_past_due(height) {
            return Err(LendingError::NotYetDue {
                loan_id,
                due_at: due_at_height,
                height,
            });
        }

        let released = self.release_collateral(loan_id, &lender)?;

        self.store.update(loan_id, |r| {
            r.close(LoanStatus::Defaulted, height, now);
            Ok(())
        })?;
        self.store.audit(loan_id, height, "default")?;

        self.events.emit(Event::LoanDefaulted {
            loan_id,
            due_at_height,
            height,
            timestamp: now,
        });
        self.emit_release(loan_id, &lender, released, now);
        self.emit_status_change(loan_id, LoanStatus::Active, LoanStatus::Defaulted, height, now);

        info!("loan {} defaulted at height {}", loan_id, height);
        Ok(())
    }

    pub fn loan(&self, loan_id: LoanId) -> Result<&LoanRecord> {
        self.store.get(loan_id)
    }

    /// amount `repay` would currently require
    pub fn outstanding_amount(&self, loan_id: LoanId) -> Result<Money> {
        let record = self.store.get(loan_id)?;
        Ok(self
            .config
            .accrual_model
            .calculate(record, self.clock.height())
            .outstanding())
    }

    pub fn collateralization_bps(&self, loan_id: LoanId) -> Result<Decimal> {
        Ok(self.liquidation_check(loan_id)?.ratio_bps)
    }

    pub fn liquidation_check(&self, loan_id: LoanId) -> Result<LiquidationCheck> {
        let record = self.store.get(loan_id)?;
        self.assess(record, self.clock.height())
    }

    pub fn loans_by_borrower(&self, account: &AccountId) -> Vec<&LoanRecord> {
        self.store.by_borrower(account).collect()
    }

    pub fn loans_by_lender(&self, account: &AccountId) -> Vec<&LoanRecord> {
        self.store.by_lender(account).collect()
    }

    pub fn loan_count(&self) -> usize {
        self.store.len()
    }

    pub fn history(&self, loan_id: LoanId) -> Vec<&LoanSnapshot> {
        self.store.history(loan_id)
    }

    /// serializable view of one loan
    pub fn view(&self, loan_id: LoanId) -> Result<LoanView> {
        let record = self.store.get(loan_id)?;
        let outstanding = if record.status.is_terminal() {
            Money::ZERO
        } else {
            self.outstanding_amount(loan_id)?
        };
        Ok(LoanView::from_record(
            record,
            outstanding,
            self.escrow.locked(loan_id),
            self.clock.height(),
        ))
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        self.events.take_events()
    }

    pub fn events(&self) -> &[Event] {
        self.events.events()
    }

    pub fn store(&self) -> &LoanStore {
        &self.store
    }

    pub fn config(&self) -> &LendingConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn escrow(&self) -> &E {
        &self.escrow
    }

    pub fn rail(&self) -> &P {
        &self.rail
    }

    fn validate_terms(&self, terms: &LoanTerms) -> Result<()> {
        if !terms.principal.is_positive() {
            return Err(LendingError::invalid(
                InvalidField::Principal,
                format!("principal must be positive, got {}", terms.principal),
            ));
        }
        let (min, max) = (self.config.min_interest_rate_bps, self.config.max_interest_rate_bps);
        if !(min..=max).contains(&terms.interest_rate_bps) {
            return Err(LendingError::invalid(
                InvalidField::InterestRate,
                format!("rate {} bps outside {}..={}", terms.interest_rate_bps, min, max),
            ));
        }
        let owed = terms
            .principal
            .checked_apply(terms.interest_rate())
            .and_then(|interest| terms.principal.checked_add(interest));
        if owed.is_none() {
            return Err(LendingError::invalid(
                InvalidField::Principal,
                format!("principal {} plus interest is not representable", terms.principal),
            ));
        }
        if terms.term_length == 0 {
            return Err(LendingError::invalid(
                InvalidField::TermLength,
                "term length must be at least one block",
            ));
        }
        if terms.maturity(self.clock.height()).is_none() {
            return Err(LendingError::invalid(
                InvalidField::TermLength,
                format!("term of {} blocks runs past the last block", terms.term_length),
            ));
        }
        if !terms.collateral_amount.is_positive() {
            return Err(LendingError::invalid(
                InvalidField::CollateralAmount,
                format!("collateral must be positive, got {}", terms.collateral_amount),
            ));
        }
        if terms.liquidation_threshold_bps == 0 {
            return Err(LendingError::invalid(
                InvalidField::LiquidationThreshold,
                "liquidation threshold must be positive",
            ));
        }
        if let Some(cap) = self.config.max_liquidation_threshold_bps {
            if terms.liquidation_threshold_bps > cap {
                return Err(LendingError::invalid(
                    InvalidField::LiquidationThreshold,
                    format!("threshold {} bps above cap {}", terms.liquidation_threshold_bps, cap),
                ));
            }
        }
        Ok(())
    }

    /// active loans always carry a lender
    fn require_active(record: &LoanRecord) -> Result<AccountId> {
        match (&record.status, &record.lender) {
            (LoanStatus::Active, Some(lender)) => Ok(lender.clone()),
            _ => Err(LendingError::LoanNotActive {
                loan_id: record.id,
                status: record.status,
            }),
        }
    }

    fn authorize(
        policy: CallerPolicy,
        caller: &AccountId,
        lender: &AccountId,
        loan_id: LoanId,
        action: &'static str,
    ) -> Result<()> {
        match policy {
            CallerPolicy::Permissionless => Ok(()),
            CallerPolicy::LenderOnly if caller == lender => Ok(()),
            CallerPolicy::LenderOnly => Err(LendingError::Unauthorized {
                loan_id,
                caller: caller.clone(),
                action,
            }),
        }
    }

    fn assess(&self, record: &LoanRecord, height: BlockHeight) -> Result<LiquidationCheck> {
        let value = self
            .escrow
            .collateral_value(record.id)
            .map_err(|source| {
                warn!("loan {} collateral valuation failed: {}", record.id, source);
                LendingError::CollateralValuationFailed {
                    loan_id: record.id,
                    source,
                }
            })?;
        Ok(LiquidationCheck::assess(record, value, height))
    }

    fn transfer(&self, from: &AccountId, to: &AccountId, amount: Money) -> Result<()> {
        self.rail.transfer(from, to, amount).map_err(|source| {
            warn!("transfer {} -> {} of {} failed: {}", from, to, amount, source);
            LendingError::PaymentTransferFailed {
                from: from.clone(),
                to: to.clone(),
                amount,
                source,
            }
        })
    }

    fn compensate_transfer(&self, from: &AccountId, to: &AccountId, amount: Money) {
        warn!("reversing transfer of {} back to {}", amount, to);
        if let Err(err) = self.rail.transfer(from, to, amount) {
            warn!("reversal {} -> {} of {} failed: {}", from, to, amount, err);
        }
    }

    fn release_collateral(&self, loan_id: LoanId, to: &AccountId) -> Result<Money> {
        self.escrow.release(loan_id, to).map_err(|source| {
            warn!("loan {} collateral release to {} failed: {}", loan_id, to, source);
            LendingError::CollateralReleaseFailed { loan_id, source }
        })
    }

    fn emit_release(&mut self, loan_id: LoanId, recipient: &AccountId, amount: Money, now: DateTime<Utc>) {
        self.events.emit(Event::CollateralReleased {
            loan_id,
            recipient: recipient.clone(),
            amount,
            timestamp: now,
        });
    }

    fn emit_status_change(
        &mut self,
        loan_id: LoanId,
        old_status: LoanStatus,
        new_status: LoanStatus,
        height: BlockHeight,
        now: DateTime<Utc>,
    ) {
        self.events.emit(Event::StatusChanged {
            loan_id,
            old_status,
            new_status,
            height,
            timestamp: now,
        });
    }
}
