//! Bridges peer-manager callbacks to the unified event stream.
//!
//! Simpler adaptation glue over a pre-existing peer manager: delegates
//! outbound operations to a [`PeerManagerHandle`] and re-emits its
//! callbacks (driven by whatever thread the peer manager's own pool uses)
//! as [`SyncEvent`]s, preserving the same lock-then-emit-then-call
//! discipline as the API engine.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::blockchain::Transaction;
use crate::wallet_sync::checkpoint::{Checkpoint, CheckpointQuery, CheckpointSource};
use crate::wallet_sync::config::{SyncManagerConfig, SYNC_STOPPED_ERROR, SYNC_STOPPED_SUCCESS};
use crate::wallet_sync::events::{EventCallback, ManagerHandle, ScanDepth, SyncEvent};
use crate::wallet_sync::peer_manager::PeerManagerHandle;
use crate::wallet_sync::wallet_capability::{last_confirmed_send_tx_height, Wallet};

struct PeerEngineState {
    is_connected: bool,
    is_full_scan: bool,
    network_block_height: u32,
}

pub struct PeerEngine {
    handle: ManagerHandle,
    peer_manager: Arc<dyn PeerManagerHandle>,
    wallet: Arc<dyn Wallet>,
    checkpoint_source: Arc<dyn CheckpointSource>,
    event_callback: EventCallback,
    config: SyncManagerConfig,
    state: Mutex<PeerEngineState>,
}

impl PeerEngine {
    pub fn new(
        handle: ManagerHandle,
        peer_manager: Arc<dyn PeerManagerHandle>,
        wallet: Arc<dyn Wallet>,
        checkpoint_source: Arc<dyn CheckpointSource>,
        event_callback: EventCallback,
        config: SyncManagerConfig,
        network_block_height: u32,
    ) -> Self {
        PeerEngine {
            handle,
            peer_manager,
            wallet,
            checkpoint_source,
            event_callback,
            config,
            state: Mutex::new(PeerEngineState {
                is_connected: false,
                is_full_scan: false,
                network_block_height,
            }),
        }
    }

    fn emit_locked(&self, _state: &MutexGuard<'_, PeerEngineState>, event: SyncEvent) {
        (self.event_callback)(event);
    }

    fn emit(&self, event: SyncEvent) {
        (self.event_callback)(event);
    }

    pub fn get_block_height(&self) -> u32 {
        self.state.lock().unwrap().network_block_height
    }

    pub fn is_connected(&self) -> bool {
        self.state.lock().unwrap().is_connected
    }

    pub fn connect(&self) {
        self.peer_manager.connect();
    }

    pub fn disconnect(&self) {
        self.peer_manager.disconnect();
    }

    /// A full rescan, matching the original's `BRPeerSyncManagerScan`,
    /// itself defined as `BRPeerSyncManagerScanToDepth(manager, SYNC_DEPTH_HIGH)`.
    pub fn scan(&self) {
        self.scan_to_depth(ScanDepth::High);
    }

    pub fn scan_to_depth(&self, depth: ScanDepth) {
        let network_height = self.state.lock().unwrap().network_block_height;
        let from_height = match depth {
            ScanDepth::Low => {
                last_confirmed_send_tx_height(self.wallet.as_ref(), network_height, self.config.confirmation_block_count)
                    .unwrap_or(0)
            }
            ScanDepth::Medium => self
                .checkpoint_source
                .checkpoint(CheckpointQuery::AtOrBeforeHeight(network_height))
                .map(|c: Checkpoint| c.height)
                .unwrap_or(0),
            ScanDepth::High => 0,
        };
        self.peer_manager.rescan_from_height(from_height);
    }

    /// Hands the peer manager a copy of `transaction` for publication.
    /// The real peer manager's publish path is asynchronous in the
    /// original; this trait boundary is synchronous (see the concurrency
    /// model's "no cooperative suspension points"), so success is
    /// considered immediate and `TXN_SUBMITTED` follows the call directly.
    pub fn submit(&self, transaction: Transaction) {
        self.peer_manager.submit_transaction(transaction.clone());
        self.emit(SyncEvent::TxnSubmitted { manager: self.handle.clone(), transaction, error: SYNC_STOPPED_SUCCESS });
    }

    pub fn tick_tock(&self) {
        let Some(progress) = self.peer_manager.sync_progress() else {
            return;
        };
        let state = self.state.lock().unwrap();
        if state.is_connected && state.is_full_scan && progress.percent > 0 && progress.percent < 100 {
            self.emit_locked(
                &state,
                SyncEvent::SyncProgress {
                    manager: self.handle.clone(),
                    timestamp: progress.timestamp,
                    percent: progress.percent,
                },
            );
        }
    }

    /// Peer manager reports a scan beginning.
    pub fn on_sync_started(&self) {
        let mut state = self.state.lock().unwrap();
        let need_connect = !state.is_connected;
        let need_stop = state.is_full_scan;
        state.is_connected = true;
        state.is_full_scan = true;
        if need_stop {
            self.emit_locked(
                &state,
                SyncEvent::SyncStopped { manager: self.handle.clone(), error: SYNC_STOPPED_ERROR },
            );
        }
        if need_connect {
            self.emit_locked(&state, SyncEvent::Connected { manager: self.handle.clone() });
        }
        self.emit_locked(&state, SyncEvent::SyncStarted { manager: self.handle.clone() });
    }

    /// Peer manager reports a scan ending, successfully or not.
    pub fn on_sync_stopped(&self, error: i32) {
        let mut state = self.state.lock().unwrap();
        let need_stop = state.is_full_scan;
        let connected_now = self.peer_manager.is_connected();
        let need_disconnect = !connected_now && state.is_connected;
        state.is_full_scan = false;
        if need_stop {
            self.emit_locked(&state, SyncEvent::SyncStopped { manager: self.handle.clone(), error });
        }
        if need_disconnect {
            state.is_connected = false;
            self.emit_locked(&state, SyncEvent::Disconnected { manager: self.handle.clone() });
        }
    }

    /// Peer manager reports updated chain tip / wallet transaction state.
    pub fn on_txn_status_update(&self, new_height: u32) {
        let mut state = self.state.lock().unwrap();
        let need_height = new_height > state.network_block_height;
        if need_height {
            state.network_block_height = new_height;
            self.emit_locked(&state, SyncEvent::BlockHeightUpdated { manager: self.handle.clone(), height: new_height });
        }

        let need_stop = state.is_full_scan;
        if need_stop {
            state.is_full_scan = false;
            self.emit_locked(&state, SyncEvent::SyncStopped { manager: self.handle.clone(), error: SYNC_STOPPED_SUCCESS });
        }

        let connected_now = self.peer_manager.is_connected();
        let need_disconnect = !connected_now && state.is_connected;
        if need_disconnect {
            state.is_connected = false;
            self.emit_locked(&state, SyncEvent::Disconnected { manager: self.handle.clone() });
        }

        self.emit_locked(&state, SyncEvent::TxnsUpdated { manager: self.handle.clone() });
    }

    pub fn on_save_blocks(&self, replace: bool, blocks: Vec<crate::blockchain::Block>) {
        if replace {
            self.emit(SyncEvent::SetBlocks { manager: self.handle.clone(), blocks });
        } else {
            self.emit(SyncEvent::AddBlocks { manager: self.handle.clone(), blocks });
        }
    }

    pub fn on_save_peers(&self, replace: bool, peers: Vec<crate::network::PeerInfo>) {
        if replace {
            self.emit(SyncEvent::SetPeers { manager: self.handle.clone(), peers });
        } else {
            self.emit(SyncEvent::AddPeers { manager: self.handle.clone(), peers });
        }
    }

    /// The original always answers reachability probes affirmatively;
    /// this adapter has no independent way to judge reachability.
    pub fn network_is_reachable(&self) -> bool {
        true
    }
}
