//! Chain checkpoints: the trust anchors construction and `scanToDepth`
//! consult to bound how far back a scan needs to look.
//!
//! `btpc-core`'s existing checkpoint concept
//! ([`crate::blockchain::utxo::UTXOCheckpoint`]) is a UTXO-set rollback
//! snapshot, not a chain-level `(height, time, hash)` trust anchor — a
//! different thing entirely — so this module defines its own.

use crate::crypto::Hash;

/// A hardcoded `(height, time, hash)` trust anchor bundled with chain
/// parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    pub height: u32,
    pub time: u64,
    pub hash: Hash,
}

/// How a checkpoint lookup is bounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointQuery {
    /// Latest checkpoint with `time <= t`.
    AtOrBeforeTime(u64),
    /// Latest checkpoint with `height <= h`.
    AtOrBeforeHeight(u32),
}

/// Injectable source of checkpoints, consumed at construction and by
/// `scanToDepth(Medium)`. Kept as a narrow trait so engine construction is
/// testable without a real checkpoint table.
pub trait CheckpointSource: Send + Sync {
    fn checkpoint(&self, query: CheckpointQuery) -> Option<Checkpoint>;
}
