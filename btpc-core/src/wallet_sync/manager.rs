//! The dispatcher: selects a sync strategy at construction and forwards
//! every public operation to the matching engine.

use crate::blockchain::Transaction;
use crate::wallet_sync::api_engine::ApiEngine;
use crate::wallet_sync::events::ScanDepth;
use crate::wallet_sync::peer_adapter::PeerEngine;

/// A wallet sync manager, fixed to one mode for its whole lifetime.
/// API-only announcements received while wrapping a [`PeerEngine`] are
/// silently dropped — the owner may have switched modes; not an error.
pub enum SyncManager {
    Api(ApiEngine),
    Peer(PeerEngine),
}

impl SyncManager {
    pub fn connect(&self) {
        match self {
            SyncManager::Api(engine) => engine.connect(),
            SyncManager::Peer(engine) => engine.connect(),
        }
    }

    pub fn disconnect(&self) {
        match self {
            SyncManager::Api(engine) => engine.disconnect(),
            SyncManager::Peer(engine) => engine.disconnect(),
        }
    }

    pub fn scan_to_depth(&self, depth: ScanDepth) {
        match self {
            SyncManager::Api(engine) => engine.scan_to_depth(depth),
            SyncManager::Peer(engine) => engine.scan_to_depth(depth),
        }
    }

    /// A full rescan in either mode, matching the original's
    /// `BRSyncManagerScan`, which forwards to `ScanToDepth(SYNC_DEPTH_HIGH)`
    /// regardless of mode.
    pub fn scan(&self) {
        match self {
            SyncManager::Api(engine) => engine.scan(),
            SyncManager::Peer(engine) => engine.scan(),
        }
    }

    pub fn submit(&self, transaction: Transaction) {
        match self {
            SyncManager::Api(engine) => engine.submit(transaction),
            SyncManager::Peer(engine) => engine.submit(transaction),
        }
    }

    pub fn tick_tock(&self) {
        match self {
            SyncManager::Api(engine) => engine.tick_tock(),
            SyncManager::Peer(engine) => engine.tick_tock(),
        }
    }

    pub fn get_block_height(&self) -> u32 {
        match self {
            SyncManager::Api(engine) => engine.get_block_height(),
            SyncManager::Peer(engine) => engine.get_block_height(),
        }
    }

    pub fn is_connected(&self) -> bool {
        match self {
            SyncManager::Api(engine) => engine.is_connected(),
            SyncManager::Peer(engine) => engine.is_connected(),
        }
    }

    pub fn announce_get_block_number(&self, rid: u64, height: u32) {
        if let SyncManager::Api(engine) = self {
            engine.announce_get_block_number(rid, height);
        }
    }

    pub fn announce_get_transactions_item(
        &self,
        rid: u64,
        raw_transaction: &[u8],
        timestamp: u64,
        block_height: u32,
    ) {
        if let SyncManager::Api(engine) = self {
            engine.announce_get_transactions_item(rid, raw_transaction, timestamp, block_height);
        }
    }

    pub fn announce_get_transactions_done(&self, rid: u64, success: bool) {
        if let SyncManager::Api(engine) = self {
            engine.announce_get_transactions_done(rid, success);
        }
    }

    pub fn announce_submit_transaction(&self, rid: u64, transaction: Transaction, error: i32) {
        if let SyncManager::Api(engine) = self {
            engine.announce_submit_transaction(rid, transaction, error);
        }
    }

    pub fn as_api(&self) -> Option<&ApiEngine> {
        match self {
            SyncManager::Api(engine) => Some(engine),
            SyncManager::Peer(_) => None,
        }
    }

    pub fn as_peer(&self) -> Option<&PeerEngine> {
        match self {
            SyncManager::Peer(engine) => Some(engine),
            SyncManager::Api(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::NetworkParams;
    use crate::wallet_sync::checkpoint::test_support::StaticCheckpoints;
    use crate::wallet_sync::checkpoint::Checkpoint;
    use crate::wallet_sync::config::SyncManagerConfig;
    use crate::wallet_sync::test_support::{InMemoryPeerManager, InMemorySyncClient, InMemoryWallet};
    use crate::wallet_sync::ManagerHandle;
    use crate::crypto::Hash;
    use std::sync::{Arc, Mutex};

    fn make_api_manager() -> (SyncManager, Arc<InMemorySyncClient>) {
        let wallet = Arc::new(InMemoryWallet::new());
        let client = Arc::new(InMemorySyncClient::new());
        let checkpoints = Arc::new(StaticCheckpoints(vec![Checkpoint {
            height: 699_900,
            time: 0,
            hash: Hash::zero(),
        }]));
        let events: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let events_clone = events.clone();
        let engine = ApiEngine::new(
            ManagerHandle::new("test"),
            NetworkParams::mainnet(),
            wallet.clone(),
            client.clone(),
            Arc::new(move |event| events_clone.lock().unwrap().push(format!("{event:?}"))),
            checkpoints,
            SyncManagerConfig::default(),
            ONE_WEEK_PLUS_A_DAY,
            700_000,
        )
        .unwrap();
        (SyncManager::Api(engine), client)
    }

    const ONE_WEEK_PLUS_A_DAY: u64 = 604_800 + 86_400;

    #[test]
    fn api_mode_scan_forwards_as_a_full_rescan() {
        let (manager, _client) = make_api_manager();
        // Disconnected: no effect, mirrors peer-manager semantics.
        manager.scan();
        assert_eq!(manager.as_api().unwrap().synced_block_height_for_test(), 699_900);

        manager.connect();
        manager.as_api().unwrap().set_synced_block_height_for_test(700_000);
        manager.scan();
        // `scan()` is a full rescan (`ScanDepth::High`): synced height
        // resets all the way back to `init_block_height`.
        assert_eq!(manager.as_api().unwrap().synced_block_height_for_test(), 699_900);
    }

    #[test]
    fn api_announcements_are_forwarded() {
        let (manager, client) = make_api_manager();
        manager.connect();
        assert!(client.call_count() >= 1);
        manager.announce_get_block_number(1, 700_500);
        assert_eq!(manager.get_block_height(), 700_500);
    }

    #[test]
    fn peer_mode_drops_api_only_announcements() {
        let wallet = Arc::new(InMemoryWallet::new());
        let peer_manager = Arc::new(InMemoryPeerManager::new());
        let checkpoints = Arc::new(StaticCheckpoints(vec![]));
        let engine = PeerEngine::new(
            ManagerHandle::new("peer"),
            peer_manager,
            wallet,
            checkpoints,
            Arc::new(|_event| {}),
            SyncManagerConfig::default(),
            700_000,
        );
        let manager = SyncManager::Peer(engine);
        // Must be silently ignored, not panic.
        manager.announce_get_block_number(1, 700_500);
        manager.announce_get_transactions_done(1, true);
        assert_eq!(manager.get_block_height(), 700_000);
    }
}
