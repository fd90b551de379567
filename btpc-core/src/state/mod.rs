//! Blockchain State Management
//!
//! This module provides state tracking and management for the BTPC blockchain.

pub mod network_state;

pub use network_state::{NetworkState, NetworkStateManager};