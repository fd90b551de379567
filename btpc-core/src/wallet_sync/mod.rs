//! Wallet sync manager: keeps a local wallet's view of transaction
//! history and block height consistent with an external network,
//! abstracting an API-driven sync strategy and a peer-to-peer strategy
//! behind one dispatch surface.
//!
//! See [`SyncManager`] for the public entry point.

pub mod address_tracker;
pub mod api_engine;
pub mod checkpoint;
pub mod client;
pub mod config;
pub mod errors;
pub mod events;
pub mod manager;
pub mod peer_adapter;
pub mod peer_manager;
pub mod scan_state;
#[cfg(test)]
pub(crate) mod test_support;
pub mod wallet_capability;

pub use api_engine::ApiEngine;
pub use checkpoint::{Checkpoint, CheckpointQuery, CheckpointSource};
pub use client::SyncClient;
pub use config::SyncManagerConfig;
pub use errors::{SyncEngineError, SyncResult};
pub use events::{EventCallback, ManagerHandle, ScanDepth, SyncEvent, SyncMode};
pub use manager::SyncManager;
pub use peer_adapter::PeerEngine;
pub use peer_manager::{PeerManagerHandle, SyncProgress};
pub use scan_state::{Scan, ScanState};
pub use wallet_capability::{AddressChain, Wallet, WalletAddress, WalletTransactionRecord};
