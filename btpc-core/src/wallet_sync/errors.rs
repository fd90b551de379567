//! Error taxonomy for the wallet sync manager.

use thiserror::Error;

/// Failures that can occur while constructing a [`crate::wallet_sync::SyncManager`].
///
/// Runtime races (stale request ids, mode mismatches, parse failures,
/// transient scan failures) are deliberately *not* represented here — the
/// manager surfaces those as silently dropped input or as `SyncEvent`s
/// (`SyncStopped`, `TxnSubmitted`), never as a returned `Result`. Only
/// failures that prevent a usable manager from coming into existence at all
/// belong to this enum, mirroring how [`crate::network::NetworkError`]
/// separates hard setup failures from routine runtime drops.
#[derive(Debug, Error)]
pub enum SyncEngineError {
    #[error("no checkpoint available at or before the requested lookback window")]
    NoCheckpointAvailable,
    #[error("checkpoint source error: {0}")]
    CheckpointSource(String),
}

/// Result type for sync manager construction.
pub type SyncResult<T> = Result<T, SyncEngineError>;
