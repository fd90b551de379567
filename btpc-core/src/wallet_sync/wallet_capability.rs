//! The narrow wallet capability the sync engines consume.
//!
//! Mirrors the `trait BlockchainDatabase { ... }` pattern used for storage
//! collaborators elsewhere in this crate: a small, hand-picked surface
//! rather than the wallet's full API, so the engines can be exercised
//! against an in-memory double in tests.

use crate::blockchain::Transaction;
use crate::crypto::Hash;

/// Which derivation chain an address belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressChain {
    External,
    Internal,
}

/// An address in both string forms the engine needs to hand to a remote
/// indexer or track in a scan's known-address set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WalletAddress {
    /// Base58Check legacy encoding (`crate::crypto::Address::to_string`).
    pub legacy: String,
    /// Native encoding. This wallet's chain has no segwit/bech32
    /// equivalent, so this is the same hash160 rendered with a `bt1`
    /// prefix and hex body rather than Base58Check — a placeholder native
    /// form, not a second real encoding (see DESIGN.md).
    pub native: String,
}

impl WalletAddress {
    /// Both string forms, in a fixed order, as handed to `getTransactions`.
    pub fn forms(&self) -> [&str; 2] {
        [self.legacy.as_str(), self.native.as_str()]
    }
}

/// A transaction together with the metadata the wallet tracks about it
/// once it has been registered (block height and first-seen timestamp, a
/// height of 0 meaning "unconfirmed").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletTransactionRecord {
    pub transaction: Transaction,
    pub block_height: u32,
    pub timestamp: u64,
}

/// The wallet capability set consumed by both sync engines.
pub trait Wallet: Send + Sync {
    /// All addresses the wallet currently knows about, in both forms.
    fn all_addresses(&self) -> Vec<WalletAddress>;

    /// Force the wallet to derive addresses on `chain` until it has
    /// `gap_limit` consecutive unused addresses, returning the newly
    /// realized ones (empty if the gap was already satisfied).
    fn realize_unused_addresses(&self, chain: AddressChain, gap_limit: u32) -> Vec<WalletAddress>;

    /// The first (lowest-index) currently unused address on `chain`.
    fn first_unused_address(&self, chain: AddressChain) -> Option<WalletAddress>;

    /// Look up a previously registered transaction by hash.
    fn transaction_by_hash(&self, txid: &Hash) -> Option<WalletTransactionRecord>;

    /// Offer a transaction to the wallet for registration, stamped with
    /// the block height/timestamp it was observed at. Returns `None` if
    /// the wallet accepted and retained it, `Some(transaction)` handing
    /// it back unchanged if the wallet rejected it — the explicit
    /// ownership-transfer encoding of the source's pointer-identity check.
    fn register_transaction(
        &self,
        transaction: Transaction,
        timestamp: u64,
        block_height: u32,
    ) -> Option<Transaction>;

    /// Update the recorded timestamp/height of an already-known transaction.
    fn update_transaction_metadata(&self, txid: &Hash, timestamp: u64, block_height: u32);

    /// Every transaction the wallet currently holds, with metadata.
    fn all_transaction_records(&self) -> Vec<WalletTransactionRecord>;

    /// Net amount sent by this wallet in `transaction` (0 if the
    /// transaction is purely incoming to the wallet).
    fn amount_sent_by(&self, transaction: &Transaction) -> u64;

    /// Structural/signature validation independent of confirmation depth.
    fn validate_transaction(&self, transaction: &Transaction) -> bool;
}

/// The maximum block height among the wallet's confirmed outbound
/// transactions, or `None` if there are none.
///
/// A transaction counts if it sends a nonzero amount, validates, and is
/// confirmed by at least `confirmation_block_count` blocks at
/// `network_block_height`.
pub fn last_confirmed_send_tx_height(
    wallet: &dyn Wallet,
    network_block_height: u32,
    confirmation_block_count: u32,
) -> Option<u32> {
    wallet
        .all_transaction_records()
        .into_iter()
        .filter(|record| record.block_height > 0)
        .filter(|record| {
            network_block_height.saturating_sub(record.block_height) >= confirmation_block_count
        })
        .filter(|record| wallet.amount_sent_by(&record.transaction) > 0)
        .filter(|record| wallet.validate_transaction(&record.transaction))
        .map(|record| record.block_height)
        .max()
}

/// A transaction is unsigned if every input's unlocking script is empty.
/// Coinbase inputs carry an empty `script_sig` by construction and are
/// filtered out separately by callers before this check matters.
pub fn is_unsigned(transaction: &Transaction) -> bool {
    transaction
        .inputs
        .iter()
        .all(|input| input.script_sig.operations().is_empty())
}
