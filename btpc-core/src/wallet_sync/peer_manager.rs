//! The minimal delegate surface the peer sync adapter drives.

use crate::blockchain::Transaction;

/// Progress of an in-flight peer-manager sync: the timestamp of the block
/// currently being processed and completion percent in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncProgress {
    pub timestamp: u64,
    pub percent: u8,
}

/// The peer manager, from the adapter's point of view. A subset of
/// [`crate::network::simple_peer_manager::SimplePeerManager`]'s surface —
/// connect/disconnect/rescan-from-height plus a progress query — wrapped
/// behind a trait so the adapter is testable without a live P2P stack.
pub trait PeerManagerHandle: Send + Sync {
    fn connect(&self);
    fn disconnect(&self);

    /// Rescan starting at `from_height` (full rescan if 0).
    fn rescan_from_height(&self, from_height: u32);

    fn submit_transaction(&self, transaction: Transaction);

    /// `None` if no scan is in flight.
    fn sync_progress(&self) -> Option<SyncProgress>;

    fn is_connected(&self) -> bool;
}
