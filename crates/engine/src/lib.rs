//! Ledger domain core.
//!
//! The [`Engine`] owns the database connection and exposes the owner-scoped
//! transaction store operations. [`TransactionService`] orchestrates them,
//! wiring in currency conversion (via the `rates` crate), domain events and
//! the outbound notification queue.

pub use currency::Currency;
pub use error::EngineError;
pub use money::MoneyCents;
pub use ops::{Engine, EngineBuilder};
pub use ops::transactions::{
    DateRange, Page, PageRequest, Sort, SortDirection, SortField, Summary, TransactionFilter,
};
pub use reporting::{Balance, ConvertedAmount, ConvertedSummary, TransactionAggregator};
pub use service::{
    ChannelNotifier, NotificationJob, NotificationQueue, QueueClosed, TransactionCreated,
    TransactionError, TransactionService,
};
pub use transactions::{Transaction, TransactionKind};

mod currency;
mod error;
mod money;
mod ops;
mod reporting;
mod service;
pub mod transactions;
pub mod users;

type ResultEngine<T> = Result<T, EngineError>;
