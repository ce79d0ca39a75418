pub mod memory;

use std::sync::Arc;

use crate::decimal::Money;
use crate::errors::LedgerError;
use crate::types::{AccountId, LoanId};

pub use memory::InMemoryLedger;

pub type LedgerResult<T> = std::result::Result<T, LedgerError>;

/// custodial holding of collateral on behalf of a loan
pub trait CollateralEscrow {
    /// move `amount` out of `owner`'s balance into the loan's escrow position
    fn lock(&self, loan_id: LoanId, owner: &AccountId, amount: Money) -> LedgerResult<()>;

    /// pay the whole position out to `to`, returning the amount released
    fn release(&self, loan_id: LoanId, to: &AccountId) -> LedgerResult<Money>;

    /// face amount currently locked for the loan
    fn locked(&self, loan_id: LoanId) -> Money;

    /// current value of the locked position, used for collateralization checks
    fn collateral_value(&self, loan_id: LoanId) -> LedgerResult<Money>;
}

/// moves funds between accounts
pub trait PaymentRail {
    fn transfer(&self, from: &AccountId, to: &AccountId, amount: Money) -> LedgerResult<()>;

    fn balance(&self, account: &AccountId) -> Money;
}

impl<T: CollateralEscrow + ?Sized> CollateralEscrow for Arc<T> {
    fn lock(&self, loan_id: LoanId, owner: &AccountId, amount: Money) -> LedgerResult<()> {
        (**self).lock(loan_id, owner, amount)
    }

    fn release(&self, loan_id: LoanId, to: &AccountId) -> LedgerResult<Money> {
        (**self).release(loan_id, to)
    }

    fn locked(&self, loan_id: LoanId) -> Money {
        (**self).locked(loan_id)
    }

    fn collateral_value(&self, loan_id: LoanId) -> LedgerResult<Money> {
        (**self).collateral_value(loan_id)
    }
}

impl<T: PaymentRail + ?Sized> PaymentRail for Arc<T> {
    fn transfer(&self, from: &AccountId, to: &AccountId, amount: Money) -> LedgerResult<()> {
        (**self).transfer(from, to, amount)
    }

    fn balance(&self, account: &AccountId) -> Money {
        (**self).balance(account)
    }
}
