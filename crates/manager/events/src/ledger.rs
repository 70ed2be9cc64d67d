//! An in-memory [ManagerState] tracking wallets and their transactions.

use crate::{
    Amount, DispatchError, EwmStatus, Gas, GasPrice, ListenerSignal, ManagerState,
    ObservedTransaction, TransactionEvent, TransactionId, TransactionState, WalletEvent, WalletId,
};
use alloy_primitives::{Address, B256, U256};
use std::collections::{HashMap, hash_map::Entry};
use tracing::{debug, warn};

/// A wallet holding one currency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wallet {
    /// The token contract, or [None] for ether.
    pub token: Option<Address>,
    /// The last observed balance.
    pub balance: U256,
    /// The gas price used for new transactions.
    pub default_gas_price: GasPrice,
}

/// A transaction known to a wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedTransaction {
    /// The wallet the transaction belongs to.
    pub wallet: WalletId,
    /// The transaction hash.
    pub hash: B256,
    /// The last observed chain state.
    pub state: TransactionState,
    /// The last computed gas estimate.
    pub gas_estimate: Option<Gas>,
}

/// Wallets, transactions and the account nonce, updated by the main queue.
///
/// Every applied change is reported to listeners. A change referring to an unknown wallet or
/// transaction is reported with [EwmStatus::UnknownWallet] or [EwmStatus::UnknownTransaction]
/// and an error description, and fails the dispatch.
#[derive(Debug, Default)]
pub struct WalletLedger {
    next_wallet: u32,
    wallets: HashMap<WalletId, Wallet>,
    transactions: HashMap<TransactionId, TrackedTransaction>,
    nonce: u64,
}

impl WalletLedger {
    /// Creates an empty [WalletLedger].
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the wallet holding `token`, creating it if needed.
    pub fn add_wallet(&mut self, token: Option<Address>) -> WalletId {
        if let Some(wallet) = self.wallet_for_token(token) {
            return wallet;
        }

        let wallet = WalletId(self.next_wallet);
        self.next_wallet += 1;
        self.wallets.insert(
            wallet,
            Wallet { token, balance: U256::ZERO, default_gas_price: GasPrice::default() },
        );
        wallet
    }

    /// Returns the wallet.
    pub fn wallet(&self, wallet: WalletId) -> Option<&Wallet> {
        self.wallets.get(&wallet)
    }

    /// Returns the wallet holding `token`.
    pub fn wallet_for_token(&self, token: Option<Address>) -> Option<WalletId> {
        self.wallets.iter().find(|(_, wallet)| wallet.token == token).map(|(id, _)| *id)
    }

    /// Returns the transaction.
    pub fn transaction(&self, transaction: TransactionId) -> Option<&TrackedTransaction> {
        self.transactions.get(&transaction)
    }

    /// Returns the highest observed account nonce.
    pub const fn nonce(&self) -> u64 {
        self.nonce
    }

    fn wallet_holding(
        &mut self,
        token: Option<Address>,
        listener: &ListenerSignal,
    ) -> Result<WalletId, DispatchError> {
        if let Some(wallet) = self.wallet_for_token(token) {
            return Ok(wallet);
        }

        let wallet = self.add_wallet(token);
        debug!(target: "ewm::events::main", %wallet, ?token, "Created wallet for observed balance");
        listener.signal_wallet_event(wallet, WalletEvent::Created, EwmStatus::Success, None)?;
        Ok(wallet)
    }
}

const fn state_event(state: &TransactionState) -> TransactionEvent {
    match state {
        TransactionState::Pending => TransactionEvent::Submitted,
        TransactionState::Included { .. } => TransactionEvent::Included,
        TransactionState::Errored { .. } => TransactionEvent::Errored,
    }
}

impl ManagerState for WalletLedger {
    fn handle_balance(
        &mut self,
        amount: Amount,
        listener: &ListenerSignal,
    ) -> Result<(), DispatchError> {
        let wallet = self.wallet_holding(amount.token, listener)?;
        let Some(entry) = self.wallets.get_mut(&wallet) else {
            return Err(DispatchError::UnknownWallet(wallet));
        };

        if entry.balance != amount.value {
            entry.balance = amount.value;
            listener.signal_wallet_event(
                wallet,
                WalletEvent::BalanceUpdated,
                EwmStatus::Success,
                None,
            )?;
        }
        Ok(())
    }

    fn handle_nonce(&mut self, nonce: u64, _listener: &ListenerSignal) -> Result<(), DispatchError> {
        if nonce > self.nonce {
            self.nonce = nonce;
        } else if nonce < self.nonce {
            debug!(
                target: "ewm::events::main",
                current = self.nonce,
                observed = nonce,
                "Ignoring stale account nonce"
            );
        }
        Ok(())
    }

    fn handle_gas_price(
        &mut self,
        wallet: WalletId,
        gas_price: GasPrice,
        listener: &ListenerSignal,
    ) -> Result<(), DispatchError> {
        let Some(entry) = self.wallets.get_mut(&wallet) else {
            warn!(target: "ewm::events::main", %wallet, "Gas price for unknown wallet");
            listener.signal_wallet_event(
                wallet,
                WalletEvent::DefaultGasPriceUpdated,
                EwmStatus::UnknownWallet,
                Some(format!("unknown wallet {wallet}")),
            )?;
            return Err(DispatchError::UnknownWallet(wallet));
        };

        entry.default_gas_price = gas_price;
        listener.signal_wallet_event(
            wallet,
            WalletEvent::DefaultGasPriceUpdated,
            EwmStatus::Success,
            None,
        )?;
        Ok(())
    }

    fn handle_gas_estimate(
        &mut self,
        wallet: WalletId,
        transaction: TransactionId,
        gas_estimate: Gas,
        listener: &ListenerSignal,
    ) -> Result<(), DispatchError> {
        match self.transactions.get_mut(&transaction) {
            Some(tracked) if tracked.wallet == wallet => {
                tracked.gas_estimate = Some(gas_estimate);
                listener.signal_transaction_event(
                    wallet,
                    transaction,
                    TransactionEvent::GasEstimateUpdated,
                    EwmStatus::Success,
                    None,
                )?;
                Ok(())
            }
            _ => {
                warn!(
                    target: "ewm::events::main",
                    %wallet,
                    %transaction,
                    "Gas estimate for unknown transaction"
                );
                listener.signal_transaction_event(
                    wallet,
                    transaction,
                    TransactionEvent::GasEstimateUpdated,
                    EwmStatus::UnknownTransaction,
                    Some(format!("unknown transaction {transaction} in wallet {wallet}")),
                )?;
                Err(DispatchError::UnknownTransaction(transaction))
            }
        }
    }

    fn handle_transaction(
        &mut self,
        transaction: ObservedTransaction,
        listener: &ListenerSignal,
    ) -> Result<(), DispatchError> {
        let ObservedTransaction { id, wallet, hash, state } = transaction;
        if !self.wallets.contains_key(&wallet) {
            warn!(target: "ewm::events::main", %wallet, transaction = %id, "Transaction for unknown wallet");
            listener.signal_transaction_event(
                wallet,
                id,
                TransactionEvent::Created,
                EwmStatus::UnknownWallet,
                Some(format!("unknown wallet {wallet}")),
            )?;
            return Err(DispatchError::UnknownWallet(wallet));
        }

        let event = state_event(&state);
        match self.transactions.entry(id) {
            Entry::Vacant(entry) => {
                entry.insert(TrackedTransaction { wallet, hash, state, gas_estimate: None });
                listener.signal_transaction_event(
                    wallet,
                    id,
                    TransactionEvent::Created,
                    EwmStatus::Success,
                    None,
                )?;
            }
            Entry::Occupied(mut entry) => {
                let tracked = entry.get_mut();
                if tracked.state == state && tracked.hash == hash {
                    return Ok(());
                }
                tracked.hash = hash;
                tracked.state = state;
            }
        }

        listener.signal_transaction_event(wallet, id, event, EwmStatus::Success, None)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EventSender, ListenerEvent};
    use alloy_primitives::{address, b256};
    use tokio::sync::mpsc;

    const USDC: Address = address!("0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48");
    const TX_HASH: B256 =
        b256!("0x1111111111111111111111111111111111111111111111111111111111111111");

    fn listener() -> (ListenerSignal, mpsc::UnboundedReceiver<ListenerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (EventSender::new(tx), rx)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<ListenerEvent>) -> Vec<ListenerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn wallet_event(wallet: WalletId, event: WalletEvent) -> ListenerEvent {
        ListenerEvent::Wallet { wallet, event, status: EwmStatus::Success, error_description: None }
    }

    fn transaction_event(
        wallet: WalletId,
        transaction: TransactionId,
        event: TransactionEvent,
    ) -> ListenerEvent {
        ListenerEvent::Transaction {
            wallet,
            transaction,
            event,
            status: EwmStatus::Success,
            error_description: None,
        }
    }

    fn observed(wallet: WalletId, state: TransactionState) -> ObservedTransaction {
        ObservedTransaction { id: TransactionId(1), wallet, hash: TX_HASH, state }
    }

    #[test]
    fn test_balance_creates_wallet_and_reports_changes_only() {
        let (signal, mut rx) = listener();
        let mut ledger = WalletLedger::new();

        ledger.handle_balance(Amount::token(USDC, U256::from(5)), &signal).unwrap();
        let wallet = ledger.wallet_for_token(Some(USDC)).unwrap();
        assert_eq!(
            drain(&mut rx),
            vec![
                wallet_event(wallet, WalletEvent::Created),
                wallet_event(wallet, WalletEvent::BalanceUpdated),
            ]
        );

        ledger.handle_balance(Amount::token(USDC, U256::from(5)), &signal).unwrap();
        assert!(drain(&mut rx).is_empty());

        ledger.handle_balance(Amount::token(USDC, U256::from(6)), &signal).unwrap();
        assert_eq!(drain(&mut rx), vec![wallet_event(wallet, WalletEvent::BalanceUpdated)]);
        assert_eq!(ledger.wallet(wallet).unwrap().balance, U256::from(6));
    }

    #[test]
    fn test_zero_balance_for_new_wallet_only_reports_creation() {
        let (signal, mut rx) = listener();
        let mut ledger = WalletLedger::new();

        ledger.handle_balance(Amount::ether(U256::ZERO), &signal).unwrap();
        let wallet = ledger.wallet_for_token(None).unwrap();
        assert_eq!(drain(&mut rx), vec![wallet_event(wallet, WalletEvent::Created)]);
    }

    #[test]
    fn test_nonce_only_moves_forward() {
        let (signal, mut rx) = listener();
        let mut ledger = WalletLedger::new();

        ledger.handle_nonce(4, &signal).unwrap();
        ledger.handle_nonce(2, &signal).unwrap();
        assert_eq!(ledger.nonce(), 4);
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_gas_price_for_unknown_wallet_reports_status() {
        let (signal, mut rx) = listener();
        let mut ledger = WalletLedger::new();

        let result = ledger.handle_gas_price(WalletId(8), GasPrice(U256::from(1)), &signal);
        assert_eq!(result, Err(DispatchError::UnknownWallet(WalletId(8))));
        assert_eq!(
            drain(&mut rx),
            vec![ListenerEvent::Wallet {
                wallet: WalletId(8),
                event: WalletEvent::DefaultGasPriceUpdated,
                status: EwmStatus::UnknownWallet,
                error_description: Some("unknown wallet 8".to_owned()),
            }]
        );
    }

    #[test]
    fn test_gas_price_updates_wallet() {
        let (signal, mut rx) = listener();
        let mut ledger = WalletLedger::new();
        let wallet = ledger.add_wallet(None);

        let gas_price = GasPrice(U256::from(3_000_000_000u64));
        ledger.handle_gas_price(wallet, gas_price, &signal).unwrap();
        assert_eq!(ledger.wallet(wallet).unwrap().default_gas_price, gas_price);
        assert_eq!(drain(&mut rx), vec![wallet_event(wallet, WalletEvent::DefaultGasPriceUpdated)]);
    }

    #[test]
    fn test_transaction_lifecycle() {
        let (signal, mut rx) = listener();
        let mut ledger = WalletLedger::new();
        let wallet = ledger.add_wallet(None);
        let id = TransactionId(1);

        ledger.handle_transaction(observed(wallet, TransactionState::Pending), &signal).unwrap();
        assert_eq!(
            drain(&mut rx),
            vec![
                transaction_event(wallet, id, TransactionEvent::Created),
                transaction_event(wallet, id, TransactionEvent::Submitted),
            ]
        );

        ledger.handle_transaction(observed(wallet, TransactionState::Pending), &signal).unwrap();
        assert!(drain(&mut rx).is_empty());

        let included =
            TransactionState::Included { block_hash: B256::repeat_byte(0x22), block_number: 9 };
        ledger.handle_transaction(observed(wallet, included.clone()), &signal).unwrap();
        assert_eq!(drain(&mut rx), vec![transaction_event(wallet, id, TransactionEvent::Included)]);
        assert_eq!(ledger.transaction(id).unwrap().state, included);

        ledger.handle_gas_estimate(wallet, id, Gas(21_000), &signal).unwrap();
        assert_eq!(
            drain(&mut rx),
            vec![transaction_event(wallet, id, TransactionEvent::GasEstimateUpdated)]
        );
        assert_eq!(ledger.transaction(id).unwrap().gas_estimate, Some(Gas(21_000)));
    }

    #[test]
    fn test_transaction_for_unknown_wallet_is_rejected() {
        let (signal, mut rx) = listener();
        let mut ledger = WalletLedger::new();

        let result =
            ledger.handle_transaction(observed(WalletId(3), TransactionState::Pending), &signal);
        assert_eq!(result, Err(DispatchError::UnknownWallet(WalletId(3))));
        assert!(ledger.transaction(TransactionId(1)).is_none());

        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].status(), EwmStatus::UnknownWallet);
    }

    #[test]
    fn test_gas_estimate_requires_matching_wallet() {
        let (signal, mut rx) = listener();
        let mut ledger = WalletLedger::new();
        let ether = ledger.add_wallet(None);
        let token = ledger.add_wallet(Some(USDC));
        ledger.handle_transaction(observed(ether, TransactionState::Pending), &signal).unwrap();
        drain(&mut rx);

        let result = ledger.handle_gas_estimate(token, TransactionId(1), Gas(50_000), &signal);
        assert_eq!(result, Err(DispatchError::UnknownTransaction(TransactionId(1))));
        assert_eq!(
            drain(&mut rx),
            vec![ListenerEvent::Transaction {
                wallet: token,
                transaction: TransactionId(1),
                event: TransactionEvent::GasEstimateUpdated,
                status: EwmStatus::UnknownTransaction,
                error_description: Some("unknown transaction 1 in wallet 1".to_owned()),
            }]
        );
        assert_eq!(ledger.transaction(TransactionId(1)).unwrap().gas_estimate, None);
    }

    #[test]
    fn test_closed_listener_queue_fails_dispatch() {
        let (signal, rx) = listener();
        drop(rx);
        let mut ledger = WalletLedger::new();

        let result = ledger.handle_balance(Amount::ether(U256::from(1)), &signal);
        assert!(matches!(result, Err(DispatchError::SignalFailed(_))));
    }
}
