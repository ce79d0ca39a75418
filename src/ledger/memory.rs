use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use log::debug;

use crate::decimal::Money;
use crate::errors::LedgerError;
use crate::ledger::{CollateralEscrow, LedgerResult, PaymentRail};
use crate::types::{AccountId, LoanId};

#[derive(Debug, Clone)]
struct EscrowPosition {
    owner: AccountId,
    amount: Money,
    value: Money,
}

#[derive(Debug, Default)]
struct Book {
    balances: HashMap<AccountId, Money>,
    escrow: HashMap<LoanId, EscrowPosition>,
    fail_next_release: bool,
    fail_next_transfer: bool,
}

impl Book {
    fn debit(&mut self, account: &AccountId, amount: Money) -> LedgerResult<()> {
        let available = self.balances.get(account).copied().unwrap_or(Money::ZERO);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                account: account.clone(),
                available,
                requested: amount,
            });
        }
        self.balances.insert(account.clone(), available - amount);
        Ok(())
    }

    fn credit(&mut self, account: &AccountId, amount: Money) {
        let balance = self.balances.entry(account.clone()).or_default();
        *balance = balance.saturating_add(amount);
    }
}

/// single-process token ledger implementing both escrow and payment services
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    book: Mutex<Book>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn book(&self) -> LedgerResult<MutexGuard<'_, Book>> {
        self.book.lock().map_err(|_| LedgerError::Unavailable {
            message: "ledger lock poisoned".to_string(),
        })
    }

    /// mint funds into an account
    pub fn deposit(&self, account: &AccountId, amount: Money) -> LedgerResult<()> {
        self.book()?.credit(account, amount);
        Ok(())
    }

    /// revalue a locked position without changing its face amount
    pub fn mark_collateral(&self, loan_id: LoanId, value: Money) -> LedgerResult<()> {
        let mut book = self.book()?;
        let position = book
            .escrow
            .get_mut(&loan_id)
            .ok_or(LedgerError::NoLockedCollateral { loan_id })?;
        debug!("loan {} collateral marked {} -> {}", loan_id, position.value, value);
        position.value = value;
        Ok(())
    }

    /// make the next `release` report the ledger as unavailable
    pub fn fail_next_release(&self) {
        if let Ok(mut book) = self.book() {
            book.fail_next_release = true;
        }
    }

    /// make the next `transfer` report the ledger as unavailable
    pub fn fail_next_transfer(&self) {
        if let Ok(mut book) = self.book() {
            book.fail_next_transfer = true;
        }
    }
}

impl CollateralEscrow for InMemoryLedger {
    fn lock(&self, loan_id: LoanId, owner: &AccountId, amount: Money) -> LedgerResult<()> {
        let mut book = self.book()?;
        if book.escrow.contains_key(&loan_id) {
            return Err(LedgerError::AlreadyLocked { loan_id });
        }
        book.debit(owner, amount)?;
        book.escrow.insert(
            loan_id,
            EscrowPosition {
                owner: owner.clone(),
                amount,
                value: amount,
            },
        );
        Ok(())
    }

    fn release(&self, loan_id: LoanId, to: &AccountId) -> LedgerResult<Money> {
        let mut book = self.book()?;
        if std::mem::take(&mut book.fail_next_release) {
            return Err(LedgerError::Unavailable {
                message: "escrow release rejected".to_string(),
            });
        }
        let position = book
            .escrow
            .remove(&loan_id)
            .ok_or(LedgerError::NoLockedCollateral { loan_id })?;
        debug!(
            "loan {} collateral {} released from {} to {}",
            loan_id, position.amount, position.owner, to
        );
        book.credit(to, position.amount);
        Ok(position.amount)
    }

    fn locked(&self, loan_id: LoanId) -> Money {
        self.book()
            .ok()
            .and_then(|book| book.escrow.get(&loan_id).map(|p| p.amount))
            .unwrap_or(Money::ZERO)
    }

    fn collateral_value(&self, loan_id: LoanId) -> LedgerResult<Money> {
        self.book()?
            .escrow
            .get(&loan_id)
            .map(|p| p.value)
            .ok_or(LedgerError::NoLockedCollateral { loan_id })
    }
}

impl PaymentRail for InMemoryLedger {
    fn transfer(&self, from: &AccountId, to: &AccountId, amount: Money) -> LedgerResult<()> {
        let mut book = self.book()?;
        if std::mem::take(&mut book.fail_next_transfer) {
            return Err(LedgerError::Unavailable {
                message: "transfer rejected".to_string(),
            });
        }
        book.debit(from, amount)?;
        book.credit(to, amount);
        Ok(())
    }

    fn balance(&self, account: &AccountId) -> Money {
        self.book()
            .ok()
            .and_then(|book| book.balances.get(account).copied())
            .unwrap_or(Money::ZERO)
    }
}
