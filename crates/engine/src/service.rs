//! Transaction orchestration: store access, domain events and outbound
//! notifications behind one error boundary.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{broadcast, mpsc};
use uuid::Uuid;

use crate::ops::transactions::{DateRange, Page, PageRequest, Sort, Summary, TransactionFilter};
use crate::reporting::{Balance, ConvertedSummary, TransactionAggregator};
use crate::{Engine, EngineError, MoneyCents, Transaction};

const EVENT_CAPACITY: usize = 64;

/// Failure of a service operation, with the engine cause attached.
#[derive(Debug, Error)]
pub enum TransactionError {
    #[error("transaction not found")]
    NotFound(#[source] EngineError),
    #[error("transaction {operation} failed")]
    Operation {
        operation: &'static str,
        #[source]
        source: EngineError,
    },
}

fn wrap(operation: &'static str, owner_id: &str, err: EngineError) -> TransactionError {
    if matches!(err, EngineError::NotFound(_)) {
        return TransactionError::NotFound(err);
    }
    tracing::error!(operation, owner_id, error = %err, "transaction operation failed");
    TransactionError::Operation {
        operation,
        source: err,
    }
}

type ServiceResult<T> = Result<T, TransactionError>;

/// Broadcast after a transaction has been persisted.
#[derive(Clone, Debug)]
pub struct TransactionCreated {
    pub transaction: Transaction,
}

/// Payload handed to the notification queue after a create.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NotificationJob {
    pub owner_id: String,
    pub transaction_id: Uuid,
    pub title: Option<String>,
    pub amount: MoneyCents,
}

/// The queue consumer has gone away.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("notification queue closed")]
pub struct QueueClosed;

/// Sink for [`NotificationJob`]s. Enqueueing must not block.
pub trait NotificationQueue: Send + Sync {
    fn enqueue(&self, job: NotificationJob) -> Result<(), QueueClosed>;
}

/// [`NotificationQueue`] over an unbounded tokio channel; the receiving half
/// is consumed by a worker owned by the binary.
#[derive(Clone, Debug)]
pub struct ChannelNotifier {
    sender: mpsc::UnboundedSender<NotificationJob>,
}

impl ChannelNotifier {
    pub fn channel() -> (ChannelNotifier, mpsc::UnboundedReceiver<NotificationJob>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (ChannelNotifier { sender }, receiver)
    }
}

impl NotificationQueue for ChannelNotifier {
    fn enqueue(&self, job: NotificationJob) -> Result<(), QueueClosed> {
        self.sender.send(job).map_err(|_| QueueClosed)
    }
}

/// Orchestrates transaction operations for the HTTP layer.
pub struct TransactionService {
    engine: Arc<Engine>,
    aggregator: TransactionAggregator,
    notifier: Arc<dyn NotificationQueue>,
    events: broadcast::Sender<TransactionCreated>,
}

impl TransactionService {
    pub fn new(
        engine: Arc<Engine>,
        aggregator: TransactionAggregator,
        notifier: Arc<dyn NotificationQueue>,
    ) -> TransactionService {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        TransactionService {
            engine,
            aggregator,
            notifier,
            events,
        }
    }

    /// Subscribe to [`TransactionCreated`] events emitted by [`Self::create`].
    pub fn subscribe(&self) -> broadcast::Receiver<TransactionCreated> {
        self.events.subscribe()
    }

    /// Persist a transaction, then emit the domain event and enqueue the
    /// notification job. Neither side effect can fail the create: the event
    /// goes to zero or more subscribers, and a closed queue is only logged.
    pub async fn create(
        &self,
        owner_id: &str,
        title: Option<String>,
        amount: MoneyCents,
    ) -> ServiceResult<Transaction> {
        let transaction = self
            .engine
            .create_transaction(owner_id, title, amount)
            .await
            .map_err(|err| wrap("create", owner_id, err))?;

        let _ = self.events.send(TransactionCreated {
            transaction: transaction.clone(),
        });

        let job = NotificationJob {
            owner_id: transaction.owner_id.clone(),
            transaction_id: transaction.id,
            title: transaction.title.clone(),
            amount: transaction.amount,
        };
        if self.notifier.enqueue(job).is_err() {
            tracing::warn!(owner_id, "notification queue closed, job dropped");
        }

        Ok(transaction)
    }

    pub async fn delete(&self, owner_id: &str, id: Uuid) -> ServiceResult<Transaction> {
        self.engine
            .delete_transaction(owner_id, id)
            .await
            .map_err(|err| wrap("delete", owner_id, err))
    }

    pub async fn list(
        &self,
        owner_id: &str,
        filter: &TransactionFilter,
        sort: Sort,
        page: PageRequest,
    ) -> ServiceResult<Page<Transaction>> {
        self.engine
            .list_transactions(owner_id, filter, sort, page)
            .await
            .map_err(|err| wrap("list", owner_id, err))
    }

    pub async fn summary(&self, owner_id: &str, range: DateRange) -> ServiceResult<Summary> {
        self.engine
            .summarize_transactions(owner_id, range)
            .await
            .map_err(|err| wrap("summary", owner_id, err))
    }

    pub async fn summary_with_conversion(
        &self,
        owner_id: &str,
        range: DateRange,
    ) -> ServiceResult<ConvertedSummary> {
        self.aggregator
            .summary_with_conversion(owner_id, range)
            .await
            .map_err(|err| wrap("summary_with_conversion", owner_id, err))
    }

    pub async fn balance(&self, owner_id: &str) -> ServiceResult<Balance> {
        self.aggregator
            .balance(owner_id)
            .await
            .map_err(|err| wrap("balance", owner_id, err))
    }
}
