#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod errors;
pub use errors::{DispatchError, EventQueueError};

mod types;
pub use types::{
    Amount, BlockEvent, BlockId, EwmStatus, Gas, GasPrice, ManagerEvent, ObservedTransaction,
    PeerEvent, TransactionEvent, TransactionId, TransactionState, WalletEvent, WalletId,
};

mod config;
pub use config::{EventCoreConfig, ShutdownPolicy};

mod metrics;

mod queue;
pub use queue::{EventDispatcher, EventQueue, EventSender, TypedEvent};

mod listener;
pub use listener::{
    EwmListener, ListenerDispatcher, ListenerEvent, ListenerEventKind, ListenerSignal,
};

mod handler;
pub use handler::{MainDispatcher, MainEvent, MainEventKind, MainSignal, ManagerState};

mod ledger;
pub use ledger::{TrackedTransaction, Wallet, WalletLedger};

mod manager;
pub use manager::EwmEvents;
