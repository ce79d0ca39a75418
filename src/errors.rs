use thiserror::Error;

use crate::decimal::Money;
use crate::types::{AccountId, BlockHeight, LoanId, LoanStatus};

/// creation parameter that failed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidField {
    Principal,
    InterestRate,
    TermLength,
    CollateralAmount,
    LiquidationThreshold,
}

/// error taxonomy used by callers to decide how to react
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    State,
    Authorization,
    Resource,
    Eligibility,
    Internal,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LendingError {
    #[error("invalid parameters: {field:?} {message}")]
    InvalidParameters {
        field: InvalidField,
        message: String,
    },

    #[error("loan not found: {loan_id}")]
    LoanNotFound {
        loan_id: LoanId,
    },

    #[error("loan {loan_id} not pending: current status is {status:?}")]
    LoanNotPending {
        loan_id: LoanId,
        status: LoanStatus,
    },

    #[error("unauthorized: {caller} may not {action} loan {loan_id}")]
    Unauthorized {
        loan_id: LoanId,
        caller: AccountId,
        action: &'static str,
    },

    #[error("loan {loan_id} not active: current status is {status:?}")]
    LoanNotActive {
        loan_id: LoanId,
        status: LoanStatus,
    },

    #[error("liquidation impossible: loan {loan_id} is current and collateralized at {ratio_bps} bps")]
    LiquidationImpossible {
        loan_id: LoanId,
        ratio_bps: rust_decimal::Decimal,
    },

    #[error("insufficient repayment amount: outstanding {outstanding}, provided {provided}")]
    InsufficientRepaymentAmount {
        outstanding: Money,
        provided: Money,
    },

    #[error("insufficient collateral funds: {account} cannot lock {required}")]
    InsufficientCollateralFunds {
        account: AccountId,
        required: Money,
        #[source]
        source: LedgerError,
    },

    #[error("payment transfer failed: {from} -> {to} for {amount}")]
    PaymentTransferFailed {
        from: AccountId,
        to: AccountId,
        amount: Money,
        #[source]
        source: LedgerError,
    },

    #[error("collateral release failed for loan {loan_id}")]
    CollateralReleaseFailed {
        loan_id: LoanId,
        #[source]
        source: LedgerError,
    },

    #[error("collateral valuation unavailable for loan {loan_id}")]
    CollateralValuationFailed {
        loan_id: LoanId,
        #[source]
        source: LedgerError,
    },

    #[error("duplicate loan id: {loan_id}")]
    DuplicateLoanId {
        loan_id: LoanId,
    },

    #[error("loan {loan_id} not yet due: due at height {due_at}, current height {height}")]
    NotYetDue {
        loan_id: LoanId,
        due_at: BlockHeight,
        height: BlockHeight,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },
}

impl LendingError {
    /// stable numeric code, part of the public contract
    pub fn code(&self) -> u32 {
        match self {
            LendingError::InvalidParameters { field, .. } => match field {
                InvalidField::Principal => 100,
                InvalidField::InterestRate => 101,
                InvalidField::TermLength => 102,
                InvalidField::CollateralAmount => 103,
                InvalidField::LiquidationThreshold => 104,
            },
            LendingError::LoanNotFound { .. } => 105,
            LendingError::LoanNotPending { .. } => 106,
            LendingError::Unauthorized { .. } => 107,
            LendingError::LoanNotActive { .. } => 108,
            LendingError::LiquidationImpossible { .. } => 109,
            LendingError::InsufficientRepaymentAmount { .. } => 110,
            LendingError::InsufficientCollateralFunds { .. } => 111,
            LendingError::PaymentTransferFailed { .. } => 112,
            LendingError::CollateralReleaseFailed { .. } => 113,
            LendingError::DuplicateLoanId { .. } => 114,
            LendingError::NotYetDue { .. } => 115,
            LendingError::InvalidConfiguration { .. } => 116,
            LendingError::CollateralValuationFailed { .. } => 117,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            LendingError::InvalidParameters { .. } => ErrorKind::Validation,
            LendingError::LoanNotFound { .. }
            | LendingError::LoanNotPending { .. }
            | LendingError::LoanNotActive { .. } => ErrorKind::State,
            LendingError::Unauthorized { .. } => ErrorKind::Authorization,
            LendingError::InsufficientCollateralFunds { .. }
            | LendingError::PaymentTransferFailed { .. }
            | LendingError::CollateralReleaseFailed { .. }
            | LendingError::CollateralValuationFailed { .. } => ErrorKind::Resource,
            LendingError::LiquidationImpossible { .. }
            | LendingError::InsufficientRepaymentAmount { .. }
            | LendingError::NotYetDue { .. } => ErrorKind::Eligibility,
            LendingError::DuplicateLoanId { .. } | LendingError::InvalidConfiguration { .. } => {
                ErrorKind::Internal
            }
        }
    }

    pub fn is_state_error(&self) -> bool {
        self.kind() == ErrorKind::State
    }

    pub(crate) fn invalid(field: InvalidField, message: impl Into<String>) -> Self {
        LendingError::InvalidParameters {
            field,
            message: message.into(),
        }
    }
}

/// failures reported by the external escrow and payment services
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("insufficient balance: {account} has {available}, needs {requested}")]
    InsufficientBalance {
        account: AccountId,
        available: Money,
        requested: Money,
    },

    #[error("no collateral locked for loan {loan_id}")]
    NoLockedCollateral {
        loan_id: LoanId,
    },

    #[error("collateral already locked for loan {loan_id}")]
    AlreadyLocked {
        loan_id: LoanId,
    },

    #[error("ledger unavailable: {message}")]
    Unavailable {
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, LendingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_liquidation_code_is_109() {
        let err = LendingError::LiquidationImpossible {
            loan_id: 1,
            ratio_bps: rust_decimal::Decimal::from(25_000),
        };
        assert_eq!(err.code(), 109);
        assert_eq!(err.kind(), ErrorKind::Eligibility);
    }

    #[test]
    fn test_validation_codes_in_100_range() {
        let fields = [
            InvalidField::Principal,
            InvalidField::InterestRate,
            InvalidField::TermLength,
            InvalidField::CollateralAmount,
            InvalidField::LiquidationThreshold,
        ];
        for field in fields {
            let code = LendingError::invalid(field, "bad").code();
            assert!((100..105).contains(&code));
        }
    }

    #[test]
    fn test_state_errors() {
        assert!(LendingError::LoanNotActive { loan_id: 1, status: LoanStatus::Repaid }.is_state_error());
        assert!(LendingError::LoanNotPending { loan_id: 1, status: LoanStatus::Active }.is_state_error());
        assert!(!LendingError::Unauthorized {
            loan_id: 1,
            caller: AccountId::new("mallory"),
            action: "repay",
        }
        .is_state_error());
    }

    #[test]
    fn test_source_is_preserved() {
        use std::error::Error as _;

        let err = LendingError::CollateralReleaseFailed {
            loan_id: 7,
            source: LedgerError::NoLockedCollateral { loan_id: 7 },
        };
        assert!(err.source().is_some());
    }

    #[test]
    fn test_valuation_failure_is_not_a_release_failure() {
        let err = LendingError::CollateralValuationFailed {
            loan_id: 7,
            source: LedgerError::NoLockedCollateral { loan_id: 7 },
        };
        assert_eq!(err.code(), 117);
        assert_eq!(err.kind(), ErrorKind::Resource);
        assert!(!err.to_string().contains("release"));
    }
}
