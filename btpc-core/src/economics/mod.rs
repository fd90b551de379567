//! Economics module for BTPC
//!
//! This module contains economic constants, reward calculations, and monetary policy
//! implementation for the BTPC blockchain.

pub mod constants;
pub mod rewards;

pub use constants::*;
pub use rewards::*;
