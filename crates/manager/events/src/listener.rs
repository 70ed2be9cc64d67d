//! Listener events: the externally observable notifications of the manager.

use crate::{
    BlockEvent, BlockId, DispatchError, EventDispatcher, EventQueueError, EventSender, EwmStatus,
    ManagerEvent, PeerEvent, TransactionEvent, TransactionId, TypedEvent, WalletEvent, WalletId,
};
use async_trait::async_trait;
use core::fmt;
use tracing::debug;

/// A notification for the registered [EwmListener].
///
/// Every event carries a status and, for failures, a human-readable description. A change
/// that could not be applied is still reported, with a failing [EwmStatus].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenerEvent {
    /// A wallet changed.
    Wallet {
        /// The wallet.
        wallet: WalletId,
        /// What changed.
        event: WalletEvent,
        /// The outcome.
        status: EwmStatus,
        /// Why the change failed, if it did.
        error_description: Option<String>,
    },

    /// A block changed.
    Block {
        /// The block.
        block: BlockId,
        /// What changed.
        event: BlockEvent,
        /// The outcome.
        status: EwmStatus,
        /// Why the change failed, if it did.
        error_description: Option<String>,
    },

    /// A transaction changed.
    Transaction {
        /// The wallet holding the transaction.
        wallet: WalletId,
        /// The transaction.
        transaction: TransactionId,
        /// What changed.
        event: TransactionEvent,
        /// The outcome.
        status: EwmStatus,
        /// Why the change failed, if it did.
        error_description: Option<String>,
    },

    /// A peer changed.
    Peer {
        /// What changed.
        event: PeerEvent,
        /// The outcome.
        status: EwmStatus,
        /// Why the change failed, if it did.
        error_description: Option<String>,
    },

    /// The manager itself changed.
    Manager {
        /// What changed.
        event: ManagerEvent,
        /// The outcome.
        status: EwmStatus,
        /// Why the change failed, if it did.
        error_description: Option<String>,
    },
}

impl ListenerEvent {
    /// Returns the kind of the event.
    pub const fn kind(&self) -> ListenerEventKind {
        match self {
            Self::Wallet { .. } => ListenerEventKind::Wallet,
            Self::Block { .. } => ListenerEventKind::Block,
            Self::Transaction { .. } => ListenerEventKind::Transaction,
            Self::Peer { .. } => ListenerEventKind::Peer,
            Self::Manager { .. } => ListenerEventKind::Manager,
        }
    }

    /// Returns the status attached to the event.
    pub const fn status(&self) -> EwmStatus {
        match self {
            Self::Wallet { status, .. } |
            Self::Block { status, .. } |
            Self::Transaction { status, .. } |
            Self::Peer { status, .. } |
            Self::Manager { status, .. } => *status,
        }
    }

    /// Returns the error description attached to the event.
    pub fn error_description(&self) -> Option<&str> {
        match self {
            Self::Wallet { error_description, .. } |
            Self::Block { error_description, .. } |
            Self::Transaction { error_description, .. } |
            Self::Peer { error_description, .. } |
            Self::Manager { error_description, .. } => error_description.as_deref(),
        }
    }
}

/// The kinds of [ListenerEvent].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerEventKind {
    /// [ListenerEvent::Wallet].
    Wallet,
    /// [ListenerEvent::Block].
    Block,
    /// [ListenerEvent::Transaction].
    Transaction,
    /// [ListenerEvent::Peer].
    Peer,
    /// [ListenerEvent::Manager].
    Manager,
}

impl ListenerEventKind {
    /// Every listener event kind.
    pub const ALL: [Self; 5] =
        [Self::Wallet, Self::Block, Self::Transaction, Self::Peer, Self::Manager];

    /// Returns the diagnostic name of the kind.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Wallet => "EWM: Listener Wallet Event",
            Self::Block => "EWM: Listener Block Event",
            Self::Transaction => "EWM: Listener Transaction Event",
            Self::Peer => "EWM: Listener Peer Event",
            Self::Manager => "EWM: Listener EWM Event",
        }
    }

    /// Returns the metrics label of the kind.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Wallet => "wallet",
            Self::Block => "block",
            Self::Transaction => "transaction",
            Self::Peer => "peer",
            Self::Manager => "manager",
        }
    }
}

impl fmt::Display for ListenerEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TypedEvent for ListenerEvent {
    const QUEUE: &'static str = "listener";
    const LABELS: &'static [&'static str] = &["wallet", "block", "transaction", "peer", "manager"];

    fn name(&self) -> &'static str {
        self.kind().name()
    }

    fn label(&self) -> &'static str {
        self.kind().label()
    }
}

/// The externally registered receiver of [ListenerEvent]s, with one callback per kind.
///
/// Each dispatched event invokes exactly one callback, exactly once, in submission order.
/// An error returned here is logged and counted; it does not stop the queue.
#[async_trait]
pub trait EwmListener: Send + 'static {
    /// Receives a [ListenerEvent::Wallet].
    async fn on_wallet_event(
        &mut self,
        wallet: WalletId,
        event: WalletEvent,
        status: EwmStatus,
        error_description: Option<String>,
    ) -> Result<(), DispatchError>;

    /// Receives a [ListenerEvent::Block].
    async fn on_block_event(
        &mut self,
        block: BlockId,
        event: BlockEvent,
        status: EwmStatus,
        error_description: Option<String>,
    ) -> Result<(), DispatchError>;

    /// Receives a [ListenerEvent::Transaction].
    async fn on_transaction_event(
        &mut self,
        wallet: WalletId,
        transaction: TransactionId,
        event: TransactionEvent,
        status: EwmStatus,
        error_description: Option<String>,
    ) -> Result<(), DispatchError>;

    /// Receives a [ListenerEvent::Peer].
    async fn on_peer_event(
        &mut self,
        event: PeerEvent,
        status: EwmStatus,
        error_description: Option<String>,
    ) -> Result<(), DispatchError>;

    /// Receives a [ListenerEvent::Manager].
    async fn on_manager_event(
        &mut self,
        event: ManagerEvent,
        status: EwmStatus,
        error_description: Option<String>,
    ) -> Result<(), DispatchError>;
}

/// Routes each [ListenerEvent] to the matching [EwmListener] callback.
#[derive(Debug)]
pub struct ListenerDispatcher<L> {
    listener: L,
}

impl<L: EwmListener> ListenerDispatcher<L> {
    /// Creates a new [ListenerDispatcher].
    pub const fn new(listener: L) -> Self {
        Self { listener }
    }

    /// Returns the listener.
    pub fn into_listener(self) -> L {
        self.listener
    }
}

#[async_trait]
impl<L: EwmListener> EventDispatcher for ListenerDispatcher<L> {
    type Event = ListenerEvent;

    async fn dispatch(&mut self, event: ListenerEvent) -> Result<(), DispatchError> {
        if !event.status().is_success() {
            debug!(
                target: "ewm::events::listener",
                kind = %event.kind(),
                status = %event.status(),
                error = event.error_description(),
                "Delivering failure notification"
            );
        }

        match event {
            ListenerEvent::Wallet { wallet, event, status, error_description } => {
                self.listener.on_wallet_event(wallet, event, status, error_description).await
            }
            ListenerEvent::Block { block, event, status, error_description } => {
                self.listener.on_block_event(block, event, status, error_description).await
            }
            ListenerEvent::Transaction { wallet, transaction, event, status, error_description } => {
                self.listener
                    .on_transaction_event(wallet, transaction, event, status, error_description)
                    .await
            }
            ListenerEvent::Peer { event, status, error_description } => {
                self.listener.on_peer_event(event, status, error_description).await
            }
            ListenerEvent::Manager { event, status, error_description } => {
                self.listener.on_manager_event(event, status, error_description).await
            }
        }
    }
}

/// The submission handle of the listener queue.
pub type ListenerSignal = EventSender<ListenerEvent>;

impl EventSender<ListenerEvent> {
    /// Submits a [ListenerEvent::Wallet].
    pub fn signal_wallet_event(
        &self,
        wallet: WalletId,
        event: WalletEvent,
        status: EwmStatus,
        error_description: Option<String>,
    ) -> Result<(), EventQueueError> {
        self.signal(ListenerEvent::Wallet { wallet, event, status, error_description })
    }

    /// Submits a [ListenerEvent::Block].
    pub fn signal_block_event(
        &self,
        block: BlockId,
        event: BlockEvent,
        status: EwmStatus,
        error_description: Option<String>,
    ) -> Result<(), EventQueueError> {
        self.signal(ListenerEvent::Block { block, event, status, error_description })
    }

    /// Submits a [ListenerEvent::Transaction].
    pub fn signal_transaction_event(
        &self,
        wallet: WalletId,
        transaction: TransactionId,
        event: TransactionEvent,
        status: EwmStatus,
        error_description: Option<String>,
    ) -> Result<(), EventQueueError> {
        self.signal(ListenerEvent::Transaction {
            wallet,
            transaction,
            event,
            status,
            error_description,
        })
    }

    /// Submits a [ListenerEvent::Peer].
    pub fn signal_peer_event(
        &self,
        event: PeerEvent,
        status: EwmStatus,
        error_description: Option<String>,
    ) -> Result<(), EventQueueError> {
        self.signal(ListenerEvent::Peer { event, status, error_description })
    }

    /// Submits a [ListenerEvent::Manager].
    pub fn signal_manager_event(
        &self,
        event: ManagerEvent,
        status: EwmStatus,
        error_description: Option<String>,
    ) -> Result<(), EventQueueError> {
        self.signal(ListenerEvent::Manager { event, status, error_description })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EventCoreConfig, EventQueue};
    use mockall::{Sequence, mock, predicate::*};
    use tokio_util::sync::CancellationToken;

    mock!(
        #[derive(Debug)]
        pub Listener {}

        #[async_trait]
        impl EwmListener for Listener {
            async fn on_wallet_event(
                &mut self,
                wallet: WalletId,
                event: WalletEvent,
                status: EwmStatus,
                error_description: Option<String>,
            ) -> Result<(), DispatchError>;

            async fn on_block_event(
                &mut self,
                block: BlockId,
                event: BlockEvent,
                status: EwmStatus,
                error_description: Option<String>,
            ) -> Result<(), DispatchError>;

            async fn on_transaction_event(
                &mut self,
                wallet: WalletId,
                transaction: TransactionId,
                event: TransactionEvent,
                status: EwmStatus,
                error_description: Option<String>,
            ) -> Result<(), DispatchError>;

            async fn on_peer_event(
                &mut self,
                event: PeerEvent,
                status: EwmStatus,
                error_description: Option<String>,
            ) -> Result<(), DispatchError>;

            async fn on_manager_event(
                &mut self,
                event: ManagerEvent,
                status: EwmStatus,
                error_description: Option<String>,
            ) -> Result<(), DispatchError>;
        }
    );

    #[test]
    fn test_descriptor_registry() {
        let names: Vec<_> = ListenerEventKind::ALL.iter().map(|kind| kind.name()).collect();
        assert_eq!(
            names,
            [
                "EWM: Listener Wallet Event",
                "EWM: Listener Block Event",
                "EWM: Listener Transaction Event",
                "EWM: Listener Peer Event",
                "EWM: Listener EWM Event",
            ]
        );
        let labels: Vec<_> = ListenerEventKind::ALL.iter().map(|kind| kind.label()).collect();
        assert_eq!(labels, ListenerEvent::LABELS);
    }

    #[test]
    fn test_status_accessors() {
        let event = ListenerEvent::Wallet {
            wallet: WalletId(3),
            event: WalletEvent::DefaultGasPriceUpdated,
            status: EwmStatus::UnknownWallet,
            error_description: Some("unknown wallet 3".to_owned()),
        };
        assert_eq!(event.kind(), ListenerEventKind::Wallet);
        assert_eq!(event.status(), EwmStatus::UnknownWallet);
        assert_eq!(event.error_description(), Some("unknown wallet 3"));
        assert_eq!(event.name(), "EWM: Listener Wallet Event");
    }

    #[tokio::test]
    async fn test_each_kind_invokes_its_callback_once_in_order() {
        let mut listener = MockListener::new();
        let mut seq = Sequence::new();
        listener
            .expect_on_manager_event()
            .with(eq(ManagerEvent::SyncStarted), eq(EwmStatus::Success), eq(None))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(()));
        listener
            .expect_on_wallet_event()
            .with(eq(WalletId(1)), eq(WalletEvent::Created), eq(EwmStatus::Success), eq(None))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _, _| Ok(()));
        listener
            .expect_on_block_event()
            .with(eq(BlockId(9)), eq(BlockEvent::Chained), always(), always())
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _, _| Ok(()));
        listener
            .expect_on_transaction_event()
            .with(
                eq(WalletId(1)),
                eq(TransactionId(4)),
                eq(TransactionEvent::Errored),
                eq(EwmStatus::Failure),
                eq(Some("dropped".to_owned())),
            )
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _, _, _| Ok(()));
        listener
            .expect_on_peer_event()
            .with(eq(PeerEvent::Deleted), always(), always())
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(()));

        let (queue, signal) = EventQueue::new(
            ListenerDispatcher::new(listener),
            EventCoreConfig::default(),
            CancellationToken::new(),
        );
        let consumer = tokio::spawn(queue.start());

        signal.signal_manager_event(ManagerEvent::SyncStarted, EwmStatus::Success, None).unwrap();
        signal
            .signal_wallet_event(WalletId(1), WalletEvent::Created, EwmStatus::Success, None)
            .unwrap();
        signal
            .signal_block_event(BlockId(9), BlockEvent::Chained, EwmStatus::Success, None)
            .unwrap();
        signal
            .signal_transaction_event(
                WalletId(1),
                TransactionId(4),
                TransactionEvent::Errored,
                EwmStatus::Failure,
                Some("dropped".to_owned()),
            )
            .unwrap();
        signal.signal_peer_event(PeerEvent::Deleted, EwmStatus::Success, None).unwrap();
        drop(signal);

        let mut listener = consumer.await.unwrap().into_listener();
        listener.checkpoint();
    }

    #[tokio::test]
    async fn test_failing_listener_keeps_receiving() {
        let mut listener = MockListener::new();
        listener
            .expect_on_peer_event()
            .times(3)
            .returning(|_, _, _| Err(DispatchError::Listener("ui thread gone".to_owned())));

        let (queue, signal) = EventQueue::new(
            ListenerDispatcher::new(listener),
            EventCoreConfig::default(),
            CancellationToken::new(),
        );
        let consumer = tokio::spawn(queue.start());

        for _ in 0..3 {
            signal.signal_peer_event(PeerEvent::Created, EwmStatus::Success, None).unwrap();
        }
        drop(signal);

        let mut listener = consumer.await.unwrap().into_listener();
        listener.checkpoint();
    }
}
