//! Identifiers, amounts and the event codes reported to listeners.

use alloy_primitives::{Address, B256, U256};
use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

/// A wallet handle, unique within one manager.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From, Serialize, Deserialize,
)]
pub struct WalletId(pub u32);

/// A block handle, unique within one manager.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From, Serialize, Deserialize,
)]
pub struct BlockId(pub u32);

/// A transaction handle, unique within one manager.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From, Serialize, Deserialize,
)]
pub struct TransactionId(pub u32);

/// A gas price, in wei per unit of gas.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, From, Serialize, Deserialize,
)]
pub struct GasPrice(pub U256);

/// An amount of gas.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, From, Serialize, Deserialize,
)]
pub struct Gas(pub u64);

/// A balance denominated in ether or in an ERC-20 token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Amount {
    /// The token contract, or [None] for ether.
    pub token: Option<Address>,
    /// The raw value, in the smallest unit of the currency.
    pub value: U256,
}

impl Amount {
    /// An amount of ether, in wei.
    pub const fn ether(value: U256) -> Self {
        Self { token: None, value }
    }

    /// An amount of the token at `token`.
    pub const fn token(token: Address, value: U256) -> Self {
        Self { token: Some(token), value }
    }
}

/// The chain state of an observed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionState {
    /// Submitted, not yet in a block.
    Pending,
    /// Included in a block.
    Included {
        /// The including block's hash.
        block_hash: B256,
        /// The including block's number.
        block_number: u64,
    },
    /// Dropped or failed.
    Errored {
        /// Why the transaction failed.
        reason: String,
    },
}

/// A transaction as observed by the sync layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObservedTransaction {
    /// The manager's handle for the transaction.
    pub id: TransactionId,
    /// The wallet the transaction belongs to.
    pub wallet: WalletId,
    /// The transaction hash.
    pub hash: B256,
    /// The observed chain state.
    pub state: TransactionState,
}

/// Wallet changes reported to listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum WalletEvent {
    /// A wallet was created.
    Created,
    /// The balance changed.
    BalanceUpdated,
    /// The default gas limit changed.
    DefaultGasLimitUpdated,
    /// The default gas price changed.
    DefaultGasPriceUpdated,
    /// A wallet was deleted.
    Deleted,
}

/// Block changes reported to listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum BlockEvent {
    /// A block was announced.
    Created,
    /// A block joined the canonical chain.
    Chained,
    /// A block left the canonical chain.
    Orphaned,
    /// A block was released.
    Deleted,
}

/// Transaction changes reported to listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum TransactionEvent {
    /// A transaction was created in a wallet.
    Created,
    /// A transaction was signed.
    Signed,
    /// A transaction was submitted to the network.
    Submitted,
    /// A transaction was included in a block.
    Included,
    /// A transaction was dropped or failed.
    Errored,
    /// The gas estimate of a transaction changed.
    GasEstimateUpdated,
    /// The confirmation count of an included transaction changed.
    BlockConfirmationsUpdated,
}

/// Peer changes reported to listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum PeerEvent {
    /// A peer connected.
    Created,
    /// A peer disconnected.
    Deleted,
}

/// Manager-wide changes reported to listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum ManagerEvent {
    /// The manager was created.
    Created,
    /// Chain sync started.
    SyncStarted,
    /// Chain sync made progress.
    SyncContinues,
    /// Chain sync stopped.
    SyncStopped,
    /// The network became unreachable.
    NetworkUnavailable,
    /// The manager was deleted.
    Deleted,
}

/// The outcome attached to a listener event.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum EwmStatus {
    /// The change succeeded.
    #[default]
    Success,
    /// The referenced wallet does not exist.
    UnknownWallet,
    /// The referenced transaction does not exist.
    UnknownTransaction,
    /// The referenced block does not exist.
    UnknownBlock,
    /// No node is connected.
    NodeNotConnected,
    /// Any other failure; see the error description.
    Failure,
}

impl EwmStatus {
    /// Returns `true` for [EwmStatus::Success].
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}
