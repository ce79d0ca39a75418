pub mod clock;
pub mod collateral;
pub mod config;
pub mod decimal;
pub mod engine;
pub mod errors;
pub mod events;
pub mod interest;
pub mod ledger;
pub mod serialization;
pub mod state;
pub mod store;
pub mod types;

// re-export key types
pub use clock::{BlockClock, ChainClock};
pub use collateral::{LiquidationCheck, LiquidationReason};
pub use config::{CallerPolicy, LendingConfig};
pub use decimal::{Money, Rate};
pub use engine::LendingEngine;
pub use errors::{ErrorKind, InvalidField, LedgerError, LendingError, Result};
pub use events::{Event, EventStore};
pub use interest::AccrualModel;
pub use ledger::{CollateralEscrow, InMemoryLedger, PaymentRail};
pub use serialization::LoanView;
pub use state::{LoanRecord, LoanSnapshot, LoanTerms};
pub use store::LoanStore;
pub use types::{AccountId, BlockHeight, LoanId, LoanStatus};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
