//! Main events: chain data observed by the sync layer, applied to the manager state.

use crate::{
    Amount, DispatchError, EventDispatcher, EventQueueError, EventSender, Gas, GasPrice,
    ListenerSignal, ObservedTransaction, TransactionId, TypedEvent, WalletId,
};
use async_trait::async_trait;
use core::fmt;
use tracing::trace;

/// An observation to be applied to the manager state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MainEvent {
    /// A balance was observed.
    Balance {
        /// The balance, identifying its wallet by currency.
        amount: Amount,
    },
    /// The account nonce was observed.
    Nonce {
        /// The nonce.
        nonce: u64,
    },
    /// A default gas price was observed for a wallet.
    GasPrice {
        /// The wallet.
        wallet: WalletId,
        /// The gas price.
        gas_price: GasPrice,
    },
    /// A gas estimate was computed for a transaction.
    GasEstimate {
        /// The wallet holding the transaction.
        wallet: WalletId,
        /// The transaction.
        transaction: TransactionId,
        /// The estimate.
        gas_estimate: Gas,
    },
    /// A transaction was observed.
    Transaction {
        /// The transaction.
        transaction: ObservedTransaction,
    },
}

impl MainEvent {
    /// Returns the kind of the event.
    pub const fn kind(&self) -> MainEventKind {
        match self {
            Self::Balance { .. } => MainEventKind::Balance,
            Self::Nonce { .. } => MainEventKind::Nonce,
            Self::GasPrice { .. } => MainEventKind::GasPrice,
            Self::GasEstimate { .. } => MainEventKind::GasEstimate,
            Self::Transaction { .. } => MainEventKind::Transaction,
        }
    }
}

/// The kinds of [MainEvent].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MainEventKind {
    /// [MainEvent::Balance].
    Balance,
    /// [MainEvent::Nonce].
    Nonce,
    /// [MainEvent::GasPrice].
    GasPrice,
    /// [MainEvent::GasEstimate].
    GasEstimate,
    /// [MainEvent::Transaction].
    Transaction,
}

impl MainEventKind {
    /// Every main event kind.
    pub const ALL: [Self; 5] =
        [Self::Balance, Self::Nonce, Self::GasPrice, Self::GasEstimate, Self::Transaction];

    /// Returns the diagnostic name of the kind.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Balance => "EWM: Handle Balance Event",
            Self::Nonce => "EWM: Handle Nonce Event",
            Self::GasPrice => "EWM: Handle GasPrice Event",
            Self::GasEstimate => "EWM: Handle GasEstimate Event",
            Self::Transaction => "EWM: Handle Transaction Event",
        }
    }

    /// Returns the metrics label of the kind.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Balance => "balance",
            Self::Nonce => "nonce",
            Self::GasPrice => "gas_price",
            Self::GasEstimate => "gas_estimate",
            Self::Transaction => "transaction",
        }
    }
}

impl fmt::Display for MainEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TypedEvent for MainEvent {
    const QUEUE: &'static str = "main";
    const LABELS: &'static [&'static str] =
        &["balance", "nonce", "gas_price", "gas_estimate", "transaction"];

    fn name(&self) -> &'static str {
        self.kind().name()
    }

    fn label(&self) -> &'static str {
        self.kind().label()
    }
}

/// The manager-owned state that [MainEvent]s update.
///
/// Only the main queue's consumer calls these routines, one at a time, so implementations
/// need no locking. Each routine may report the outcome through `listener`. A failure should
/// be reported there with a failing status as well as returned.
pub trait ManagerState: Send + 'static {
    /// Applies an observed balance.
    fn handle_balance(
        &mut self,
        amount: Amount,
        listener: &ListenerSignal,
    ) -> Result<(), DispatchError>;

    /// Applies an observed account nonce.
    fn handle_nonce(&mut self, nonce: u64, listener: &ListenerSignal) -> Result<(), DispatchError>;

    /// Applies an observed default gas price.
    fn handle_gas_price(
        &mut self,
        wallet: WalletId,
        gas_price: GasPrice,
        listener: &ListenerSignal,
    ) -> Result<(), DispatchError>;

    /// Applies a computed gas estimate.
    fn handle_gas_estimate(
        &mut self,
        wallet: WalletId,
        transaction: TransactionId,
        gas_estimate: Gas,
        listener: &ListenerSignal,
    ) -> Result<(), DispatchError>;

    /// Applies an observed transaction.
    fn handle_transaction(
        &mut self,
        transaction: ObservedTransaction,
        listener: &ListenerSignal,
    ) -> Result<(), DispatchError>;
}

/// Routes each [MainEvent] to the matching [ManagerState] routine.
#[derive(Debug)]
pub struct MainDispatcher<S> {
    state: S,
    listener: ListenerSignal,
}

impl<S: ManagerState> MainDispatcher<S> {
    /// Creates a new [MainDispatcher] reporting to `listener`.
    pub const fn new(state: S, listener: ListenerSignal) -> Self {
        Self { state, listener }
    }

    /// Returns the state.
    pub const fn state(&self) -> &S {
        &self.state
    }

    /// Consumes the dispatcher, returning the state.
    pub fn into_state(self) -> S {
        self.state
    }
}

#[async_trait]
impl<S: ManagerState> EventDispatcher for MainDispatcher<S> {
    type Event = MainEvent;

    async fn dispatch(&mut self, event: MainEvent) -> Result<(), DispatchError> {
        trace!(target: "ewm::events::main", kind = %event.kind(), "Handling main event");

        let listener = &self.listener;
        match event {
            MainEvent::Balance { amount } => self.state.handle_balance(amount, listener),
            MainEvent::Nonce { nonce } => self.state.handle_nonce(nonce, listener),
            MainEvent::GasPrice { wallet, gas_price } => {
                self.state.handle_gas_price(wallet, gas_price, listener)
            }
            MainEvent::GasEstimate { wallet, transaction, gas_estimate } => {
                self.state.handle_gas_estimate(wallet, transaction, gas_estimate, listener)
            }
            MainEvent::Transaction { transaction } => {
                self.state.handle_transaction(transaction, listener)
            }
        }
    }
}

/// The submission handle of the main queue.
pub type MainSignal = EventSender<MainEvent>;

impl EventSender<MainEvent> {
    /// Submits a [MainEvent::Balance].
    pub fn signal_balance(&self, amount: Amount) -> Result<(), EventQueueError> {
        self.signal(MainEvent::Balance { amount })
    }

    /// Submits a [MainEvent::Nonce].
    pub fn signal_nonce(&self, nonce: u64) -> Result<(), EventQueueError> {
        self.signal(MainEvent::Nonce { nonce })
    }

    /// Submits a [MainEvent::GasPrice].
    pub fn signal_gas_price(
        &self,
        wallet: WalletId,
        gas_price: GasPrice,
    ) -> Result<(), EventQueueError> {
        self.signal(MainEvent::GasPrice { wallet, gas_price })
    }

    /// Submits a [MainEvent::GasEstimate].
    pub fn signal_gas_estimate(
        &self,
        wallet: WalletId,
        transaction: TransactionId,
        gas_estimate: Gas,
    ) -> Result<(), EventQueueError> {
        self.signal(MainEvent::GasEstimate { wallet, transaction, gas_estimate })
    }

    /// Submits a [MainEvent::Transaction].
    pub fn signal_transaction(
        &self,
        transaction: ObservedTransaction,
    ) -> Result<(), EventQueueError> {
        self.signal(MainEvent::Transaction { transaction })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EventCoreConfig, EventQueue, EwmStatus, ListenerEvent, TransactionState, WalletEvent};
    use alloy_primitives::{B256, U256};
    use mockall::{mock, predicate::*};
    use tokio::sync::mpsc;
    use tokio_util::sync::CancellationToken;

    mock!(
        #[derive(Debug)]
        pub State {}

        impl ManagerState for State {
            fn handle_balance(
                &mut self,
                amount: Amount,
                listener: &ListenerSignal,
            ) -> Result<(), DispatchError>;

            fn handle_nonce(
                &mut self,
                nonce: u64,
                listener: &ListenerSignal,
            ) -> Result<(), DispatchError>;

            fn handle_gas_price(
                &mut self,
                wallet: WalletId,
                gas_price: GasPrice,
                listener: &ListenerSignal,
            ) -> Result<(), DispatchError>;

            fn handle_gas_estimate(
                &mut self,
                wallet: WalletId,
                transaction: TransactionId,
                gas_estimate: Gas,
                listener: &ListenerSignal,
            ) -> Result<(), DispatchError>;

            fn handle_transaction(
                &mut self,
                transaction: ObservedTransaction,
                listener: &ListenerSignal,
            ) -> Result<(), DispatchError>;
        }
    );

    #[test]
    fn test_descriptor_registry() {
        let names: Vec<_> = MainEventKind::ALL.iter().map(|kind| kind.name()).collect();
        assert_eq!(
            names,
            [
                "EWM: Handle Balance Event",
                "EWM: Handle Nonce Event",
                "EWM: Handle GasPrice Event",
                "EWM: Handle GasEstimate Event",
                "EWM: Handle Transaction Event",
            ]
        );
        let labels: Vec<_> = MainEventKind::ALL.iter().map(|kind| kind.label()).collect();
        assert_eq!(labels, MainEvent::LABELS);
        assert_eq!(MainEventKind::GasPrice.to_string(), "EWM: Handle GasPrice Event");
    }

    #[tokio::test]
    async fn test_routes_each_kind_to_its_routine() {
        let transaction = ObservedTransaction {
            id: TransactionId(5),
            wallet: WalletId(0),
            hash: B256::repeat_byte(0xab),
            state: TransactionState::Pending,
        };

        let mut state = MockState::new();
        state
            .expect_handle_balance()
            .with(eq(Amount::ether(U256::from(10))), always())
            .times(1)
            .returning(|_, _| Ok(()));
        state.expect_handle_nonce().with(eq(7), always()).times(1).returning(|_, _| Ok(()));
        state
            .expect_handle_gas_price()
            .with(eq(WalletId(0)), eq(GasPrice(U256::from(2_000_000_000u64))), always())
            .times(1)
            .returning(|_, _, _| Ok(()));
        state
            .expect_handle_gas_estimate()
            .with(eq(WalletId(0)), eq(TransactionId(5)), eq(Gas(21_000)), always())
            .times(1)
            .returning(|_, _, _, _| Ok(()));
        state
            .expect_handle_transaction()
            .with(eq(transaction.clone()), always())
            .times(1)
            .returning(|_, _| Ok(()));

        let (listener_tx, _listener_rx) = mpsc::unbounded_channel();
        let (queue, signal) = EventQueue::new(
            MainDispatcher::new(state, ListenerSignal::new(listener_tx)),
            EventCoreConfig::default(),
            CancellationToken::new(),
        );
        let consumer = tokio::spawn(queue.start());

        signal.signal_balance(Amount::ether(U256::from(10))).unwrap();
        signal.signal_nonce(7).unwrap();
        signal.signal_gas_price(WalletId(0), GasPrice(U256::from(2_000_000_000u64))).unwrap();
        signal.signal_gas_estimate(WalletId(0), TransactionId(5), Gas(21_000)).unwrap();
        signal.signal_transaction(transaction).unwrap();
        drop(signal);

        let mut state = consumer.await.unwrap().into_state();
        state.checkpoint();
    }

    #[tokio::test]
    async fn test_routine_signals_listener_events() {
        let mut state = MockState::new();
        state.expect_handle_balance().returning(|_, listener| {
            listener.signal_wallet_event(
                WalletId(0),
                WalletEvent::BalanceUpdated,
                EwmStatus::Success,
                None,
            )?;
            Ok(())
        });

        let (listener_tx, mut listener_rx) = mpsc::unbounded_channel();
        let (queue, signal) = EventQueue::new(
            MainDispatcher::new(state, ListenerSignal::new(listener_tx)),
            EventCoreConfig::default(),
            CancellationToken::new(),
        );
        let consumer = tokio::spawn(queue.start());

        signal.signal_balance(Amount::ether(U256::from(1))).unwrap();
        drop(signal);
        let _state = consumer.await.unwrap();

        assert_eq!(
            listener_rx.recv().await,
            Some(ListenerEvent::Wallet {
                wallet: WalletId(0),
                event: WalletEvent::BalanceUpdated,
                status: EwmStatus::Success,
                error_description: None,
            })
        );
    }
}
