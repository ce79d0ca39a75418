use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::collateral::LiquidationReason;
use crate::decimal::Money;
use crate::types::{AccountId, BlockHeight, LoanId, LoanStatus};

/// all events that can be emitted by the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // lifecycle events
    LoanCreated {
        loan_id: LoanId,
        borrower: AccountId,
        principal: Money,
        collateral_amount: Money,
        height: BlockHeight,
        timestamp: DateTime<Utc>,
    },
    LoanFunded {
        loan_id: LoanId,
        lender: AccountId,
        principal: Money,
        due_at_height: BlockHeight,
        timestamp: DateTime<Utc>,
    },
    LoanRepaid {
        loan_id: LoanId,
        amount: Money,
        outstanding: Money,
        timestamp: DateTime<Utc>,
    },
    LoanLiquidated {
        loan_id: LoanId,
        caller: AccountId,
        reason: LiquidationReason,
        collateral_value: Money,
        timestamp: DateTime<Utc>,
    },
    LoanDefaulted {
        loan_id: LoanId,
        due_at_height: BlockHeight,
        height: BlockHeight,
        timestamp: DateTime<Utc>,
    },

    // collateral events
    CollateralLocked {
        loan_id: LoanId,
        owner: AccountId,
        amount: Money,
        timestamp: DateTime<Utc>,
    },
    CollateralReleased {
        loan_id: LoanId,
        recipient: AccountId,
        amount: Money,
        timestamp: DateTime<Utc>,
    },

    // status change events
    StatusChanged {
        loan_id: LoanId,
        old_status: LoanStatus,
        new_status: LoanStatus,
        height: BlockHeight,
        timestamp: DateTime<Utc>,
    },
}

impl Event {
    pub fn loan_id(&self) -> LoanId {
        match self {
            Event::LoanCreated { loan_id, .. }
            | Event::LoanFunded { loan_id, .. }
            | Event::LoanRepaid { loan_id, .. }
            | Event::LoanLiquidated { loan_id, .. }
            | Event::LoanDefaulted { loan_id, .. }
            | Event::CollateralLocked { loan_id, .. }
            | Event::CollateralReleased { loan_id, .. }
            | Event::StatusChanged { loan_id, .. } => *loan_id,
        }
    }
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
        }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_change(loan_id: LoanId) -> Event {
        Event::StatusChanged {
            loan_id,
            old_status: LoanStatus::Pending,
            new_status: LoanStatus::Active,
            height: 1,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_take_events_drains() {
        let mut store = EventStore::new();
        store.emit(status_change(1));
        store.emit(status_change(2));

        let taken = store.take_events();
        assert_eq!(taken.iter().map(Event::loan_id).collect::<Vec<_>>(), vec![1, 2]);
        assert!(store.events().is_empty());
    }

    #[test]
    fn test_event_json_names_variant() {
        let json = serde_json::to_string(&status_change(3)).unwrap();
        assert!(json.starts_with("{\"StatusChanged\""));

        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back.loan_id(), 3);
    }
}
