use crate::{TransactionId, WalletId};
use thiserror::Error;

/// Errors raised by the event queues themselves.
#[derive(Debug, Error)]
pub enum EventQueueError {
    /// The queue's consumer has shut down and accepts no more events.
    #[error("{queue} queue is closed")]
    Closed {
        /// The label of the closed queue.
        queue: &'static str,
    },

    /// The consumer task did not run to completion.
    #[error("{queue} queue consumer failed: {source}")]
    Join {
        /// The label of the failed queue.
        queue: &'static str,
        /// The underlying task error.
        source: tokio::task::JoinError,
    },
}

/// Errors raised while dispatching a single event.
///
/// A dispatch error never stops a queue. It is logged and counted, and the queue moves on to
/// the next event.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DispatchError {
    /// A listener callback reported a failure.
    #[error("listener failed: {0}")]
    Listener(String),

    /// The event refers to a wallet the manager does not know.
    #[error("unknown wallet {0}")]
    UnknownWallet(WalletId),

    /// The event refers to a transaction the manager does not know.
    #[error("unknown transaction {0}")]
    UnknownTransaction(TransactionId),

    /// A listener event produced during dispatch could not be submitted.
    #[error("failed to signal listener event: {0}")]
    SignalFailed(String),

    /// The dispatcher panicked.
    #[error("dispatch panicked: {0}")]
    Panicked(String),
}

impl From<EventQueueError> for DispatchError {
    fn from(err: EventQueueError) -> Self {
        Self::SignalFailed(err.to_string())
    }
}
