//! In-memory test doubles for the wallet, remote indexer, and peer
//! manager collaborators, grounded in the inline test-double style used
//! throughout `network::sync` and `network::integrated_sync`.

#![cfg(test)]

use std::collections::HashMap;
use std::sync::Mutex;

use crate::blockchain::Transaction;
use crate::crypto::Hash;
use crate::wallet_sync::client::SyncClient;
use crate::wallet_sync::events::ManagerHandle;
use crate::wallet_sync::peer_manager::{PeerManagerHandle, SyncProgress};
use crate::wallet_sync::wallet_capability::{AddressChain, Wallet, WalletAddress, WalletTransactionRecord};

#[derive(Default)]
struct InMemoryWalletState {
    addresses: Vec<WalletAddress>,
    first_unused: HashMap<AddressChain, WalletAddress>,
    transactions: HashMap<Hash, WalletTransactionRecord>,
    sent_amounts: HashMap<Hash, u64>,
    invalid: std::collections::HashSet<Hash>,
    reject_next_registration: bool,
}

/// A wallet double backed by plain in-memory collections.
pub struct InMemoryWallet {
    state: Mutex<InMemoryWalletState>,
}

impl InMemoryWallet {
    pub fn new() -> Self {
        InMemoryWallet {
            state: Mutex::new(InMemoryWalletState::default()),
        }
    }

    /// Add an address to the wallet's full set and make it the chain's
    /// current first-unused address.
    pub fn add_address(&self, chain: AddressChain, legacy: &str, native: &str) {
        let address = WalletAddress {
            legacy: legacy.to_string(),
            native: native.to_string(),
        };
        let mut state = self.state.lock().unwrap();
        state.addresses.push(address.clone());
        state.first_unused.insert(chain, address);
    }

    /// Move the chain's first-unused address without adding it to the
    /// full set — simulates the wallet having derived further addresses
    /// as a side effect of something other than `realize_unused_addresses`.
    pub fn set_first_unused(&self, chain: AddressChain, legacy: &str, native: &str) {
        let mut state = self.state.lock().unwrap();
        state.first_unused.insert(
            chain,
            WalletAddress {
                legacy: legacy.to_string(),
                native: native.to_string(),
            },
        );
    }

    pub fn set_amount_sent(&self, txid: Hash, amount: u64) {
        self.state.lock().unwrap().sent_amounts.insert(txid, amount);
    }

    pub fn mark_invalid(&self, txid: Hash) {
        self.state.lock().unwrap().invalid.insert(txid);
    }

    /// The next `register_transaction` call will reject instead of
    /// accepting.
    pub fn reject_next_registration(&self) {
        self.state.lock().unwrap().reject_next_registration = true;
    }

    pub fn has_transaction(&self, txid: &Hash) -> bool {
        self.state.lock().unwrap().transactions.contains_key(txid)
    }
}

impl Wallet for InMemoryWallet {
    fn all_addresses(&self) -> Vec<WalletAddress> {
        self.state.lock().unwrap().addresses.clone()
    }

    fn realize_unused_addresses(&self, _chain: AddressChain, _gap_limit: u32) -> Vec<WalletAddress> {
        Vec::new()
    }

    fn first_unused_address(&self, chain: AddressChain) -> Option<WalletAddress> {
        self.state.lock().unwrap().first_unused.get(&chain).cloned()
    }

    fn transaction_by_hash(&self, txid: &Hash) -> Option<WalletTransactionRecord> {
        self.state.lock().unwrap().transactions.get(txid).cloned()
    }

    fn register_transaction(
        &self,
        transaction: Transaction,
        timestamp: u64,
        block_height: u32,
    ) -> Option<Transaction> {
        let mut state = self.state.lock().unwrap();
        if state.reject_next_registration {
            state.reject_next_registration = false;
            return Some(transaction);
        }
        let txid = transaction.hash();
        state.transactions.insert(
            txid,
            WalletTransactionRecord {
                transaction,
                block_height,
                timestamp,
            },
        );
        None
    }

    fn update_transaction_metadata(&self, txid: &Hash, timestamp: u64, block_height: u32) {
        let mut state = self.state.lock().unwrap();
        if let Some(record) = state.transactions.get_mut(txid) {
            record.timestamp = timestamp;
            record.block_height = block_height;
        }
    }

    fn all_transaction_records(&self) -> Vec<WalletTransactionRecord> {
        self.state.lock().unwrap().transactions.values().cloned().collect()
    }

    fn amount_sent_by(&self, transaction: &Transaction) -> u64 {
        self.state
            .lock()
            .unwrap()
            .sent_amounts
            .get(&transaction.hash())
            .copied()
            .unwrap_or(0)
    }

    fn validate_transaction(&self, transaction: &Transaction) -> bool {
        !self.state.lock().unwrap().invalid.contains(&transaction.hash())
    }
}

/// A single call the engine made to a [`SyncClient`].
#[derive(Debug, Clone)]
pub enum ClientCall {
    GetBlockNumber {
        manager: ManagerHandle,
        rid: u64,
    },
    GetTransactions {
        manager: ManagerHandle,
        addresses: Vec<String>,
        beg_block_number: u32,
        end_block_number: u32,
        rid: u64,
    },
    SubmitTransaction {
        manager: ManagerHandle,
        raw: Vec<u8>,
        txid: Hash,
        rid: u64,
    },
}

/// A `SyncClient` double that just records every call it receives; tests
/// drive replies by calling the engine's `announce_*` methods directly.
#[derive(Default)]
pub struct InMemorySyncClient {
    calls: Mutex<Vec<ClientCall>>,
}

impl InMemorySyncClient {
    pub fn new() -> Self {
        InMemorySyncClient::default()
    }

    pub fn calls(&self) -> Vec<ClientCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last_call(&self) -> Option<ClientCall> {
        self.calls.lock().unwrap().last().cloned()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl SyncClient for InMemorySyncClient {
    fn get_block_number(&self, manager: ManagerHandle, rid: u64) {
        self.calls.lock().unwrap().push(ClientCall::GetBlockNumber { manager, rid });
    }

    fn get_transactions(
        &self,
        manager: ManagerHandle,
        addresses: Vec<String>,
        beg_block_number: u32,
        end_block_number: u32,
        rid: u64,
    ) {
        self.calls.lock().unwrap().push(ClientCall::GetTransactions {
            manager,
            addresses,
            beg_block_number,
            end_block_number,
            rid,
        });
    }

    fn submit_transaction(&self, manager: ManagerHandle, raw: Vec<u8>, txid: Hash, rid: u64) {
        self.calls.lock().unwrap().push(ClientCall::SubmitTransaction {
            manager,
            raw,
            txid,
            rid,
        });
    }
}

/// A `PeerManagerHandle` double with scriptable connectivity/progress and
/// a call log, mirroring the `SimplePeerManager` test doubles in
/// `network::simple_peer_manager`'s own test module.
#[derive(Default)]
pub struct InMemoryPeerManager {
    connected: Mutex<bool>,
    progress: Mutex<Option<SyncProgress>>,
    calls: Mutex<Vec<String>>,
}

impl InMemoryPeerManager {
    pub fn new() -> Self {
        InMemoryPeerManager::default()
    }

    pub fn set_connected(&self, connected: bool) {
        *self.connected.lock().unwrap() = connected;
    }

    pub fn set_progress(&self, progress: Option<SyncProgress>) {
        *self.progress.lock().unwrap() = progress;
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl PeerManagerHandle for InMemoryPeerManager {
    fn connect(&self) {
        self.calls.lock().unwrap().push("connect".to_string());
        *self.connected.lock().unwrap() = true;
    }

    fn disconnect(&self) {
        self.calls.lock().unwrap().push("disconnect".to_string());
        *self.connected.lock().unwrap() = false;
    }

    fn rescan_from_height(&self, from_height: u32) {
        self.calls.lock().unwrap().push(format!("rescan_from_height({from_height})"));
    }

    fn submit_transaction(&self, _transaction: Transaction) {
        self.calls.lock().unwrap().push("submit_transaction".to_string());
    }

    fn sync_progress(&self) -> Option<SyncProgress> {
        *self.progress.lock().unwrap()
    }

    fn is_connected(&self) -> bool {
        *self.connected.lock().unwrap()
    }
}
