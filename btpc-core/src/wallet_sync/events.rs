//! Event and mode types exposed across the sync/peer boundary.

use std::sync::Arc;

use crate::blockchain::{Block, Transaction};
use crate::network::PeerInfo;

/// Which strategy a [`crate::wallet_sync::SyncManager`] was constructed with.
/// Immutable for the lifetime of the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    ApiOnly,
    P2pOnly,
}

/// Depth selector for [`crate::wallet_sync::SyncManager::scan_to_depth`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanDepth {
    /// Rescan from the last confirmed outbound transaction.
    Low,
    /// Rescan from the latest checkpoint at or before the current network height.
    Medium,
    /// Full rescan from the manager's initial block height.
    High,
}

/// Opaque, cloneable identity of the manager that emitted an event. Stands
/// in for the raw manager pointer the original carries on every event; here
/// it is just an `Arc`-shared id, safe to hold past the manager's own
/// lifetime for logging or test assertions.
#[derive(Debug, Clone)]
pub struct ManagerHandle(pub(crate) Arc<str>);

impl ManagerHandle {
    pub fn new(label: impl Into<String>) -> Self {
        ManagerHandle(Arc::from(label.into()))
    }

    pub fn label(&self) -> &str {
        &self.0
    }
}

impl PartialEq for ManagerHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Lifecycle and progress events emitted by a sync manager. Always tagged
/// with the emitting manager's handle so an owner juggling several wallets
/// can tell them apart.
#[derive(Debug, Clone)]
pub enum SyncEvent {
    Connected {
        manager: ManagerHandle,
    },
    Disconnected {
        manager: ManagerHandle,
    },
    SyncStarted {
        manager: ManagerHandle,
    },
    SyncProgress {
        manager: ManagerHandle,
        timestamp: u64,
        percent: u8,
    },
    /// `error == 0` on success, negative on failure. See spec Open Question
    /// in the design notes: no finer-grained error taxonomy is carried.
    SyncStopped {
        manager: ManagerHandle,
        error: i32,
    },
    BlockHeightUpdated {
        manager: ManagerHandle,
        height: u32,
    },
    TxnSubmitted {
        manager: ManagerHandle,
        transaction: Transaction,
        error: i32,
    },
    TxnsUpdated {
        manager: ManagerHandle,
    },
    SetBlocks {
        manager: ManagerHandle,
        blocks: Vec<Block>,
    },
    AddBlocks {
        manager: ManagerHandle,
        blocks: Vec<Block>,
    },
    SetPeers {
        manager: ManagerHandle,
        peers: Vec<PeerInfo>,
    },
    AddPeers {
        manager: ManagerHandle,
        peers: Vec<PeerInfo>,
    },
}

/// Callback invoked for every emitted event. `Send + Sync` so it can be
/// shared across the engine's lock boundary and invoked from any thread,
/// the same contract `network::simple_peer_manager` gives its own
/// callbacks.
pub type EventCallback = Arc<dyn Fn(SyncEvent) + Send + Sync>;
