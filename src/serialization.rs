/// serialization support for loans
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::state::LoanRecord;
use crate::types::{AccountId, BlockHeight, LoanId, LoanStatus};

/// serializable view of a loan's state
#[derive(Debug, Serialize, Deserialize)]
pub struct LoanView {
    pub id: LoanId,
    pub borrower: AccountId,
    pub lender: Option<AccountId>,
    pub status: LoanStatus,
    pub terms: TermsView,
    pub schedule: ScheduleView,
    pub settlement: SettlementView,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TermsView {
    pub principal: Money,
    pub interest_rate: Rate,
    pub term_length: BlockHeight,
    pub collateral_amount: Money,
    pub liquidation_threshold: Rate,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScheduleView {
    pub created_at_height: BlockHeight,
    pub funded_at_height: Option<BlockHeight>,
    pub due_at_height: Option<BlockHeight>,
    pub closed_at_height: Option<BlockHeight>,
    pub current_height: BlockHeight,
    pub blocks_remaining: Option<BlockHeight>,
    pub last_status_change: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SettlementView {
    pub outstanding: Money,
    pub amount_repaid: Money,
    pub collateral_locked: Money,
}

impl LoanView {
    pub fn from_record(
        record: &LoanRecord,
        outstanding: Money,
        collateral_locked: Money,
        current_height: BlockHeight,
    ) -> Self {
        let blocks_remaining = match record.status {
            LoanStatus::Active => record
                .due_at_height
                .map(|due| due.saturating_sub(current_height)),
            _ => None,
        };

        LoanView {
            id: record.id,
            borrower: record.borrower.clone(),
            lender: record.lender.clone(),
            status: record.status,
            terms: TermsView {
                principal: record.terms.principal,
                interest_rate: record.terms.interest_rate(),
                term_length: record.terms.term_length,
                collateral_amount: record.terms.collateral_amount,
                liquidation_threshold: record.terms.liquidation_threshold(),
            },
            schedule: ScheduleView {
                created_at_height: record.created_at_height,
                funded_at_height: record.funded_at_height,
                due_at_height: record.due_at_height,
                closed_at_height: record.closed_at_height,
                current_height,
                blocks_remaining,
                last_status_change: record.last_status_change,
            },
            settlement: SettlementView {
                outstanding,
                amount_repaid: record.amount_repaid,
                collateral_locked,
            },
        }
    }

    /// convert to pretty-printed json string
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::LoanTerms;

    #[test]
    fn test_view_of_active_loan() {
        let mut record = LoanRecord::new(
            3,
            AccountId::new("borrower"),
            LoanTerms::new(1_000u64, 50, 100, 2_500u64, 500),
            1,
            Utc::now(),
        );
        record.activate(AccountId::new("lender"), 10, Utc::now());

        let view = LoanView::from_record(&record, Money::from_major(1_005), Money::from_major(2_500), 30);
        assert_eq!(view.schedule.blocks_remaining, Some(80));
        assert_eq!(view.terms.interest_rate, Rate::from_bps(50));

        let json = view.to_json_pretty().unwrap();
        assert!(json.contains("\"status\": \"Active\""));
        assert!(json.contains("\"lender\": \"lender\""));
        assert!(json.contains("\"outstanding\": \"1005\""));
    }
}
