use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::{Money, Rate};
use crate::types::{AccountId, BlockHeight, LoanId, LoanStatus};

/// terms requested by the borrower, fixed at creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanTerms {
    pub principal: Money,
    pub interest_rate_bps: u32,
    pub term_length: BlockHeight,
    pub collateral_amount: Money,
    pub liquidation_threshold_bps: u32,
}

impl LoanTerms {
    pub fn new(
        principal: impl Into<Money>,
        interest_rate_bps: u32,
        term_length: BlockHeight,
        collateral_amount: impl Into<Money>,
        liquidation_threshold_bps: u32,
    ) -> Self {
        Self {
            principal: principal.into(),
            interest_rate_bps,
            term_length,
            collateral_amount: collateral_amount.into(),
            liquidation_threshold_bps,
        }
    }

    pub fn interest_rate(&self) -> Rate {
        Rate::from_bps(self.interest_rate_bps)
    }

    pub fn liquidation_threshold(&self) -> Rate {
        Rate::from_bps(self.liquidation_threshold_bps)
    }

    /// due height for a loan funded at `funded_at`; `None` past the end of the chain
    pub fn maturity(&self, funded_at: BlockHeight) -> Option<BlockHeight> {
        funded_at.checked_add(self.term_length)
    }
}

/// one loan: immutable identity and terms plus lifecycle state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanRecord {
    // identification
    pub id: LoanId,
    pub borrower: AccountId,
    pub lender: Option<AccountId>,

    pub terms: LoanTerms,

    // lifecycle
    pub status: LoanStatus,
    pub created_at_height: BlockHeight,
    pub funded_at_height: Option<BlockHeight>,
    pub due_at_height: Option<BlockHeight>,
    pub closed_at_height: Option<BlockHeight>,
    pub amount_repaid: Money,
    pub last_status_change: DateTime<Utc>,
}

impl LoanRecord {
    /// new pending loan
    pub fn new(
        id: LoanId,
        borrower: AccountId,
        terms: LoanTerms,
        height: BlockHeight,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            borrower,
            lender: None,
            terms,
            status: LoanStatus::Pending,
            created_at_height: height,
            funded_at_height: None,
            due_at_height: None,
            closed_at_height: None,
            amount_repaid: Money::ZERO,
            last_status_change: timestamp,
        }
    }

    pub fn principal(&self) -> Money {
        self.terms.principal
    }

    /// past maturity at `height`; never true before funding
    pub fn is_past_due(&self, height: BlockHeight) -> bool {
        self.due_at_height.map_or(false, |due| height > due)
    }

    /// blocks elapsed since funding, capped at the term
    pub fn elapsed_blocks(&self, height: BlockHeight) -> BlockHeight {
        self.funded_at_height
            .map_or(0, |funded| height.saturating_sub(funded))
            .min(self.terms.term_length)
    }

    /// set the lender and start the term; the lender is written exactly once
    pub fn activate(&mut self, lender: AccountId, height: BlockHeight, timestamp: DateTime<Utc>) {
        debug_assert!(self.lender.is_none());
        self.lender = Some(lender);
        self.funded_at_height = Some(height);
        self.due_at_height = Some(height.saturating_add(self.terms.term_length));
        self.update_status(LoanStatus::Active, timestamp);
    }

    /// move to a terminal status at `height`
    pub fn close(&mut self, status: LoanStatus, height: BlockHeight, timestamp: DateTime<Utc>) {
        debug_assert!(status.is_terminal());
        self.closed_at_height = Some(height);
        self.update_status(status, timestamp);
    }

    fn update_status(&mut self, new_status: LoanStatus, timestamp: DateTime<Utc>) {
        debug_assert!(self.status.can_transition_to(new_status));
        self.status = new_status;
        self.last_status_change = timestamp;
    }
}

/// state snapshot for audit trail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanSnapshot {
    pub snapshot_id: Uuid,
    pub loan_id: LoanId,
    pub height: BlockHeight,
    pub timestamp: DateTime<Utc>,
    pub record: LoanRecord,
    pub trigger: String,
}

impl LoanSnapshot {
    pub fn capture(record: &LoanRecord, height: BlockHeight, trigger: impl Into<String>) -> Self {
        Self {
            snapshot_id: Uuid::new_v4(),
            loan_id: record.id,
            height,
            timestamp: record.last_status_change,
            record: record.clone(),
            trigger: trigger.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending() -> LoanRecord {
        LoanRecord::new(
            1,
            AccountId::new("borrower"),
            LoanTerms::new(1_000u64, 50, 100, 2_500u64, 500),
            2,
            Utc::now(),
        )
    }

    #[test]
    fn test_new_record_is_pending() {
        let record = pending();
        assert_eq!(record.status, LoanStatus::Pending);
        assert!(record.lender.is_none());
        assert_eq!(record.amount_repaid, Money::ZERO);
        assert!(!record.is_past_due(1_000_000));
    }

    #[test]
    fn test_activate_sets_due_height() {
        let mut record = pending();
        record.activate(AccountId::new("lender"), 10, Utc::now());

        assert_eq!(record.status, LoanStatus::Active);
        assert_eq!(record.lender, Some(AccountId::new("lender")));
        assert_eq!(record.funded_at_height, Some(10));
        assert_eq!(record.due_at_height, Some(110));
        assert!(!record.is_past_due(110));
        assert!(record.is_past_due(111));
    }

    #[test]
    fn test_maturity_at_the_end_of_the_chain() {
        let terms = LoanTerms::new(1_000u64, 50, u64::MAX - 1, 2_500u64, 500);

        assert_eq!(terms.maturity(1), Some(u64::MAX));
        assert_eq!(terms.maturity(2), None);
    }

    #[test]
    fn test_elapsed_blocks_capped_at_term() {
        let mut record = pending();
        assert_eq!(record.elapsed_blocks(50), 0);

        record.activate(AccountId::new("lender"), 10, Utc::now());
        assert_eq!(record.elapsed_blocks(60), 50);
        assert_eq!(record.elapsed_blocks(5_000), 100);
    }

    #[test]
    fn test_snapshot_copies_record() {
        let mut record = pending();
        record.activate(AccountId::new("lender"), 10, Utc::now());

        let snapshot = LoanSnapshot::capture(&record, 10, "fund");
        assert_eq!(snapshot.loan_id, 1);
        assert_eq!(snapshot.record, record);
        assert_eq!(snapshot.trigger, "fund");
    }
}
