use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::state::LoanRecord;
use crate::types::BlockHeight;

/// how interest accrues over a loan's term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccrualModel {
    /// full-term interest owed from funding: principal * rate
    Flat,
    /// interest accrues linearly with elapsed blocks, capped at the full term
    Prorated,
}

/// interest owed on a loan at `height`
#[derive(Debug, Clone, PartialEq)]
pub struct InterestCalculation {
    pub principal: Money,
    pub interest: Money,
    pub elapsed_blocks: BlockHeight,
    pub model: AccrualModel,
}

impl InterestCalculation {
    /// principal plus interest; saturates instead of overflowing
    pub fn outstanding(&self) -> Money {
        self.principal.saturating_add(self.interest)
    }
}

impl AccrualModel {
    pub fn calculate(self, record: &LoanRecord, height: BlockHeight) -> InterestCalculation {
        let principal = record.principal();
        let full_term = principal.apply(record.terms.interest_rate());
        let elapsed_blocks = record.elapsed_blocks(height);

        let interest = match self {
            AccrualModel::Flat => full_term,
            AccrualModel::Prorated => {
                let term = record.terms.term_length.max(1);
                full_term * (Decimal::from(elapsed_blocks) / Decimal::from(term))
            }
        };

        InterestCalculation {
            principal,
            interest,
            elapsed_blocks,
            model: self,
        }
    }
}
