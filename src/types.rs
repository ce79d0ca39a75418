use serde::{Deserialize, Serialize};
use std::fmt;

/// loan identifier, assigned monotonically from 1 and never reused
pub type LoanId = u64;

/// chain height in block-count units
pub type BlockHeight = u64;

/// account identifier bound to the principal invoking an operation
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        AccountId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        AccountId::new(s)
    }
}

impl From<String> for AccountId {
    fn from(s: String) -> Self {
        AccountId(s)
    }
}

/// loan status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoanStatus {
    /// requested by the borrower, collateral locked, awaiting a lender
    Pending,
    /// funded and running until repayment or closure
    Active,
    /// settled in full, collateral returned to borrower
    Repaid,
    /// force-closed, collateral forfeited to lender
    Liquidated,
    /// matured without repayment, collateral forfeited to lender
    Defaulted,
}

impl LoanStatus {
    /// the only legal edges: Pending -> Active -> {Repaid, Liquidated, Defaulted}
    pub fn can_transition_to(self, next: LoanStatus) -> bool {
        matches!(
            (self, next),
            (LoanStatus::Pending, LoanStatus::Active)
                | (LoanStatus::Active, LoanStatus::Repaid)
                | (LoanStatus::Active, LoanStatus::Liquidated)
                | (LoanStatus::Active, LoanStatus::Defaulted)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            LoanStatus::Repaid | LoanStatus::Liquidated | LoanStatus::Defaulted
        )
    }
}
