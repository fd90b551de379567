//! Address-set snapshotting and gap-limit discovery detection.

use std::collections::HashSet;

use crate::wallet_sync::config::SyncManagerConfig;
use crate::wallet_sync::wallet_capability::{AddressChain, Wallet, WalletAddress};

/// The wallet's complete current address set, both native and legacy
/// forms, as a flat string set suitable for seeding
/// `Scan::known_addresses`.
pub fn snapshot_known_addresses(wallet: &dyn Wallet) -> HashSet<String> {
    let mut known = HashSet::new();
    for address in wallet.all_addresses() {
        known.insert(address.legacy);
        known.insert(address.native);
    }
    known
}

/// Force the wallet to realize its gap-limit-worth of unused addresses on
/// both chains, returning the first-unused address of each chain
/// afterward (used to seed `Scan::last_external_address` /
/// `last_internal_address`).
pub fn realize_gap_limit(
    wallet: &dyn Wallet,
    config: &SyncManagerConfig,
) -> (Option<WalletAddress>, Option<WalletAddress>) {
    wallet.realize_unused_addresses(AddressChain::External, config.gap_limit_external);
    wallet.realize_unused_addresses(AddressChain::Internal, config.gap_limit_internal);
    (
        wallet.first_unused_address(AddressChain::External),
        wallet.first_unused_address(AddressChain::Internal),
    )
}

/// Diff the wallet's current address set against `known`, inserting any
/// addresses not yet present and returning the delta (in both forms) for a
/// targeted re-query.
pub fn newly_known_addresses(known: &mut HashSet<String>, wallet: &dyn Wallet) -> Vec<String> {
    let mut delta = Vec::new();
    for address in wallet.all_addresses() {
        if known.insert(address.legacy.clone()) {
            delta.push(address.legacy);
        }
        if known.insert(address.native.clone()) {
            delta.push(address.native);
        }
    }
    delta
}

/// True if the wallet's first-unused address on either chain has moved
/// since the last snapshot taken at scan start or the previous batch —
/// i.e. the wallet derived new addresses because of gap-limit expansion.
pub fn addresses_advanced(
    wallet: &dyn Wallet,
    last_external: &Option<WalletAddress>,
    last_internal: &Option<WalletAddress>,
) -> bool {
    wallet.first_unused_address(AddressChain::External) != *last_external
        || wallet.first_unused_address(AddressChain::Internal) != *last_internal
}
