//! The API-mode remote indexer contract.

use crate::crypto::Hash;
use crate::wallet_sync::events::ManagerHandle;

/// Callback surface an API sync engine drives. Each method must
/// eventually invoke the matching `announce_*` entry point on the
/// originating [`crate::wallet_sync::SyncManager`] with the same `rid`.
///
/// Implementations are expected to do their own I/O off this call (e.g.
/// hand the request to a background HTTP client) and reply later from
/// whatever thread their I/O completes on — the engine's locking
/// discipline makes no assumption about which thread calls `announce_*`.
pub trait SyncClient: Send + Sync {
    fn get_block_number(&self, manager: ManagerHandle, rid: u64);

    fn get_transactions(
        &self,
        manager: ManagerHandle,
        addresses: Vec<String>,
        beg_block_number: u32,
        end_block_number: u32,
        rid: u64,
    );

    fn submit_transaction(&self, manager: ManagerHandle, raw_transaction: Vec<u8>, txid: Hash, rid: u64);
}
