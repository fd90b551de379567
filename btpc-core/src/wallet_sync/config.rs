//! Tuning constants and configuration for the wallet sync manager.

/// Number of confirmations a sent transaction needs before it counts as
/// "confirmed" for `ScanDepth::Low` purposes.
pub const CONFIRMATION_BLOCK_COUNT: u32 = 6;

/// Window, in whole days, used when bounding a partial scan's start.
pub const BRD_SYNC_DAYS_OFFSET: u32 = 1;

/// Expected block spacing in minutes, used to convert the day offset above
/// into a block count.
pub const MINUTES_PER_BLOCK: u32 = 10;

/// `BRD_SYNC_DAYS_OFFSET` days' worth of blocks at `MINUTES_PER_BLOCK`
/// spacing: `(24 * 60 / 10) = 144`. A scan whose range exceeds this many
/// blocks is a full scan.
pub const BRD_SYNC_START_BLOCK_OFFSET: u32 = (BRD_SYNC_DAYS_OFFSET * 24 * 60) / MINUTES_PER_BLOCK;

/// Seconds in a week, used to locate the construction-time checkpoint.
pub const ONE_WEEK_IN_SECONDS: u64 = 604_800;

/// Gap limit: consecutive unused derived addresses past which a wallet
/// stops scanning a chain by default.
pub const GAP_LIMIT_EXTERNAL: u32 = 20;
pub const GAP_LIMIT_INTERNAL: u32 = 10;

/// Error code carried by a `SyncEvent::SyncStopped` that terminates a scan
/// because of a transient failure (disconnect, client error, rescan).
pub const SYNC_STOPPED_ERROR: i32 = -1;

/// Error code carried by a successful `SyncEvent::SyncStopped`.
pub const SYNC_STOPPED_SUCCESS: i32 = 0;

/// Tunables for a [`crate::wallet_sync::SyncManager`].
///
/// Mirrors the shape of [`crate::network::NetworkConfig`]-style config
/// structs elsewhere in this crate: a plain data bag with a sensible
/// [`Default`], constructed once by the owner and handed to the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncManagerConfig {
    /// Confirmations required before a sent transaction counts as settled.
    pub confirmation_block_count: u32,
    /// Block-count threshold above which a scan is a "full scan".
    pub full_scan_block_offset: u32,
    /// External-chain gap limit.
    pub gap_limit_external: u32,
    /// Internal-chain gap limit.
    pub gap_limit_internal: u32,
    /// Seconds before a key's first-use time that construction looks back
    /// when selecting the initial checkpoint.
    pub checkpoint_lookback_seconds: u64,
}

impl Default for SyncManagerConfig {
    fn default() -> Self {
        SyncManagerConfig {
            confirmation_block_count: CONFIRMATION_BLOCK_COUNT,
            full_scan_block_offset: BRD_SYNC_START_BLOCK_OFFSET,
            gap_limit_external: GAP_LIMIT_EXTERNAL,
            gap_limit_internal: GAP_LIMIT_INTERNAL,
            checkpoint_lookback_seconds: ONE_WEEK_IN_SECONDS,
        }
    }
}
