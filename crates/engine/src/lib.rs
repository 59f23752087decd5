//! Recurring-rule engine for a local personal ledger.
//!
//! The [`Engine`] owns a SQLite connection and exposes:
//! - account and ledger operations used as collaborators,
//! - recurring rule storage,
//! - [`Engine::generate_recurring`], which materializes every pending
//!   occurrence of every active rule exactly once.

pub use accounts::Account;
pub use clock::{Clock, FixedClock, SystemClock};
pub use commands::{RecurringRuleCmd, TransactionCmd, UpdateTransactionCmd};
pub use error::EngineError;
pub use money::MoneyCents;
pub use occurrences::{Occurrences, occurrences};
pub use ops::{Engine, EngineBuilder, TransactionListFilter};
pub use recurring::{Cadence, Frequency, RecurringRule, Schedule};
pub use transactions::{Transaction, TransactionKind};

mod accounts;
mod clock;
mod commands;
mod error;
mod money;
mod occurrences;
mod ops;
mod recurring;
mod transactions;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
