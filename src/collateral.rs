use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::state::LoanRecord;
use crate::types::{BlockHeight, LoanId};

/// why a loan may be liquidated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LiquidationReason {
    /// matured without repayment
    PastDue,
    /// collateral value at or below the threshold ratio
    Undercollateralized,
}

/// collateral health of one loan at a given height
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidationCheck {
    pub loan_id: LoanId,
    pub height: BlockHeight,
    pub collateral_value: Money,
    pub ratio_bps: Decimal,
    pub threshold_bps: u32,
    pub past_due: bool,
    pub undercollateralized: bool,
}

impl LiquidationCheck {
    pub fn assess(record: &LoanRecord, collateral_value: Money, height: BlockHeight) -> Self {
        let ratio_bps = collateralization_bps(collateral_value, record.principal());
        let threshold_bps = record.terms.liquidation_threshold_bps;

        Self {
            loan_id: record.id,
            height,
            collateral_value,
            ratio_bps,
            threshold_bps,
            past_due: record.is_past_due(height),
            undercollateralized: ratio_bps <= Decimal::from(threshold_bps),
        }
    }

    pub fn is_eligible(&self) -> bool {
        self.past_due || self.undercollateralized
    }

    /// past-due takes precedence when both hold
    pub fn reason(&self) -> Option<LiquidationReason> {
        if self.past_due {
            Some(LiquidationReason::PastDue)
        } else if self.undercollateralized {
            Some(LiquidationReason::Undercollateralized)
        } else {
            None
        }
    }
}

/// collateral-to-principal ratio in basis points; a zero principal counts as fully covered
pub fn collateralization_bps(collateral_value: Money, principal: Money) -> Decimal {
    collateral_value.ratio_bps(principal).unwrap_or(Decimal::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::LoanTerms;
    use crate::types::AccountId;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn active() -> LoanRecord {
        let mut record = LoanRecord::new(
            1,
            AccountId::new("borrower"),
            LoanTerms::new(1_000u64, 50, 50_000, 2_500u64, 500),
            2,
            Utc::now(),
        );
        record.activate(AccountId::new("lender"), 3, Utc::now());
        record
    }

    #[test]
    fn test_fresh_loan_not_eligible() {
        let record = active();
        let check = LiquidationCheck::assess(&record, Money::from_major(2_500), 4);

        assert_eq!(check.ratio_bps, dec!(25000));
        assert!(!check.past_due);
        assert!(!check.undercollateralized);
        assert!(!check.is_eligible());
        assert_eq!(check.reason(), None);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let record = active();

        let at = LiquidationCheck::assess(&record, Money::from_major(50), 4);
        assert_eq!(at.ratio_bps, dec!(500));
        assert_eq!(at.reason(), Some(LiquidationReason::Undercollateralized));

        let above = LiquidationCheck::assess(&record, Money::from_major(51), 4);
        assert!(!above.is_eligible());
    }

    #[test]
    fn test_past_due_after_maturity() {
        let record = active();
        let due = record.due_at_height.unwrap();

        assert!(!LiquidationCheck::assess(&record, Money::from_major(2_500), due).is_eligible());

        let late = LiquidationCheck::assess(&record, Money::from_major(2_500), due + 1);
        assert_eq!(late.reason(), Some(LiquidationReason::PastDue));
    }

    #[test]
    fn test_zero_principal_ratio() {
        assert_eq!(collateralization_bps(Money::from_major(1), Money::ZERO), Decimal::MAX);
    }
}
