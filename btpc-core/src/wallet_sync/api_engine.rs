//! Drives API-mode synchronization: scheduling `getBlockNumber` /
//! `getTransactions` requests, iterating on address discovery, and
//! reporting progress.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::blockchain::{NetworkParams, Transaction};
use crate::wallet_sync::address_tracker::{
    addresses_advanced, newly_known_addresses, realize_gap_limit, snapshot_known_addresses,
};
use crate::wallet_sync::checkpoint::{Checkpoint, CheckpointQuery, CheckpointSource};
use crate::wallet_sync::client::SyncClient;
use crate::wallet_sync::config::{SyncManagerConfig, SYNC_STOPPED_ERROR, SYNC_STOPPED_SUCCESS};
use crate::wallet_sync::errors::{SyncEngineError, SyncResult};
use crate::wallet_sync::events::{EventCallback, ManagerHandle, ScanDepth, SyncEvent};
use crate::wallet_sync::scan_state::{Scan, ScanState};
use crate::wallet_sync::wallet_capability::{
    is_unsigned, last_confirmed_send_tx_height, AddressChain, Wallet,
};

struct ApiEngineState {
    network_block_height: u32,
    synced_block_height: u32,
    is_connected: bool,
    request_id_generator: u64,
    scan: ScanState,
}

/// Drives the API sync scan-state machine described in the component
/// design. Construction, `connect`, and `scan_to_depth` look up
/// checkpoints and realize wallet addresses — collaborator calls that
/// happen with the lock released, per the locking discipline: acquire,
/// mutate/emit, snapshot, release, then call out.
pub struct ApiEngine {
    handle: ManagerHandle,
    chain: NetworkParams,
    wallet: Arc<dyn Wallet>,
    client: Arc<dyn SyncClient>,
    event_callback: EventCallback,
    config: SyncManagerConfig,
    init_block_height: u32,
    checkpoint_source: Arc<dyn CheckpointSource>,
    state: Mutex<ApiEngineState>,
}

impl ApiEngine {
    /// Construct a new engine. Looks up the latest checkpoint with
    /// `time <= key_time - checkpoint_lookback_seconds` to seed
    /// `init_block_height`/`network_block_height` alongside the
    /// network's own advertised height.
    pub fn new(
        handle: ManagerHandle,
        chain: NetworkParams,
        wallet: Arc<dyn Wallet>,
        client: Arc<dyn SyncClient>,
        event_callback: EventCallback,
        checkpoint_source: Arc<dyn CheckpointSource>,
        config: SyncManagerConfig,
        key_time: u64,
        advertised_height: u32,
    ) -> SyncResult<Self> {
        let lookback = key_time.saturating_sub(config.checkpoint_lookback_seconds);
        let checkpoint: Checkpoint = checkpoint_source
            .checkpoint(CheckpointQuery::AtOrBeforeTime(lookback))
            .ok_or(SyncEngineError::NoCheckpointAvailable)?;

        let init_block_height = checkpoint.height.min(advertised_height);
        let network_block_height = checkpoint.height.max(advertised_height);

        tracing::debug!(
            target: "wallet_sync",
            init_block_height,
            network_block_height,
            "api sync engine constructed"
        );

        Ok(ApiEngine {
            handle,
            chain,
            wallet,
            client,
            event_callback,
            config,
            init_block_height,
            checkpoint_source,
            state: Mutex::new(ApiEngineState {
                network_block_height,
                synced_block_height: init_block_height,
                is_connected: false,
                request_id_generator: 0,
                scan: ScanState::Idle,
            }),
        })
    }

    pub fn chain_params(&self) -> &NetworkParams {
        &self.chain
    }

    pub fn get_block_height(&self) -> u32 {
        self.state.lock().unwrap().network_block_height
    }

    pub fn is_connected(&self) -> bool {
        self.state.lock().unwrap().is_connected
    }

    fn next_request_id(&self, state: &mut ApiEngineState) -> u64 {
        state.request_id_generator += 1;
        state.request_id_generator
    }

    fn emit_locked(&self, _state: &MutexGuard<'_, ApiEngineState>, event: SyncEvent) {
        (self.event_callback)(event);
    }

    fn emit(&self, event: SyncEvent) {
        (self.event_callback)(event);
    }

    pub fn connect(&self) {
        let became_connected = {
            let mut state = self.state.lock().unwrap();
            if state.is_connected {
                false
            } else {
                state.is_connected = true;
                self.emit_locked(&state, SyncEvent::Connected { manager: self.handle.clone() });
                true
            }
        };
        if became_connected {
            tracing::debug!(target: "wallet_sync", "api engine connected");
            self.update_block_number();
            self.update_transactions();
        }
    }

    pub fn disconnect(&self) {
        let mut state = self.state.lock().unwrap();
        if !state.is_connected {
            return;
        }
        state.is_connected = false;
        let was_full_scan = matches!(&state.scan, ScanState::InProgress(scan) if scan.is_full_scan);
        if was_full_scan {
            self.emit_locked(
                &state,
                SyncEvent::SyncStopped { manager: self.handle.clone(), error: SYNC_STOPPED_ERROR },
            );
        }
        state.scan = ScanState::Idle;
        self.emit_locked(&state, SyncEvent::Disconnected { manager: self.handle.clone() });
        tracing::debug!(target: "wallet_sync", "api engine disconnected");
    }

    /// A full rescan, matching the original's `BRClientSyncManagerScan`,
    /// itself defined as `BRClientSyncManagerScanToDepth(manager, SYNC_DEPTH_HIGH)`.
    pub fn scan(&self) {
        self.scan_to_depth(ScanDepth::High);
    }

    pub fn scan_to_depth(&self, depth: ScanDepth) {
        let (is_connected, network_height) = {
            let state = self.state.lock().unwrap();
            (state.is_connected, state.network_block_height)
        };
        if !is_connected {
            return;
        }

        let new_synced = match depth {
            ScanDepth::Low => last_confirmed_send_tx_height(
                self.wallet.as_ref(),
                network_height,
                self.config.confirmation_block_count,
            )
            .unwrap_or(self.init_block_height),
            ScanDepth::Medium => self
                .checkpoint_source
                .checkpoint(CheckpointQuery::AtOrBeforeHeight(network_height))
                .map(|c| c.height)
                .unwrap_or(self.init_block_height),
            ScanDepth::High => self.init_block_height,
        };

        let mut state = self.state.lock().unwrap();
        if !state.is_connected {
            return;
        }
        state.synced_block_height = new_synced;
        let was_full_scan = matches!(&state.scan, ScanState::InProgress(scan) if scan.is_full_scan);
        if was_full_scan {
            self.emit_locked(
                &state,
                SyncEvent::SyncStopped { manager: self.handle.clone(), error: SYNC_STOPPED_ERROR },
            );
        }
        state.scan = ScanState::Idle;
        self.emit_locked(&state, SyncEvent::Disconnected { manager: self.handle.clone() });
        self.emit_locked(&state, SyncEvent::Connected { manager: self.handle.clone() });
        drop(state);

        tracing::debug!(target: "wallet_sync", new_synced, "scan_to_depth reset synced height");
        self.update_block_number();
        self.update_transactions();
    }

    pub fn update_block_number(&self) {
        let rid = {
            let mut state = self.state.lock().unwrap();
            if !state.is_connected {
                None
            } else {
                Some(self.next_request_id(&mut state))
            }
        };
        if let Some(rid) = rid {
            self.client.get_block_number(self.handle.clone(), rid);
        }
    }

    pub fn update_transactions(&self) {
        let should_scan = {
            let state = self.state.lock().unwrap();
            state.is_connected && state.scan.is_idle()
        };
        if !should_scan {
            return;
        }

        let (last_external_address, last_internal_address) =
            realize_gap_limit(self.wallet.as_ref(), &self.config);
        let known = snapshot_known_addresses(self.wallet.as_ref());

        let mut state = self.state.lock().unwrap();
        if !state.is_connected || !state.scan.is_idle() {
            return;
        }

        let end = state.network_block_height.max(state.synced_block_height) + 1;
        let beg = state
            .synced_block_height
            .min(end.saturating_sub(self.config.full_scan_block_offset));
        let rid = self.next_request_id(&mut state);
        let is_full_scan = end - beg > self.config.full_scan_block_offset;

        state.scan = ScanState::InProgress(Scan {
            request_id: rid,
            beg_block_number: beg,
            end_block_number: end,
            is_full_scan,
            known_addresses: known.clone(),
            last_external_address,
            last_internal_address,
        });

        if is_full_scan {
            self.emit_locked(&state, SyncEvent::SyncStarted { manager: self.handle.clone() });
        }
        drop(state);

        tracing::debug!(target: "wallet_sync", rid, beg, end, is_full_scan, "scan started");
        self.client
            .get_transactions(self.handle.clone(), known.into_iter().collect(), beg, end, rid);
    }

    pub fn announce_get_block_number(&self, _rid: u64, height: u32) {
        let mut state = self.state.lock().unwrap();
        if state.is_connected && height > state.network_block_height {
            state.network_block_height = height;
            self.emit_locked(&state, SyncEvent::BlockHeightUpdated { manager: self.handle.clone(), height });
        }
    }

    pub fn announce_get_transactions_item(
        &self,
        rid: u64,
        raw_transaction: &[u8],
        timestamp: u64,
        block_height: u32,
    ) {
        let transaction = match Transaction::deserialize(raw_transaction) {
            Ok(transaction) => transaction,
            Err(error) => {
                tracing::warn!(target: "wallet_sync", %error, "dropping unparseable transaction");
                return;
            }
        };
        if is_unsigned(&transaction) {
            tracing::warn!(target: "wallet_sync", "dropping unsigned transaction");
            return;
        }

        let applicable = {
            let state = self.state.lock().unwrap();
            state.is_connected && state.scan.matching(rid).is_some()
        };
        if !applicable {
            tracing::debug!(target: "wallet_sync", rid, "dropping stale transaction item");
            return;
        }

        let txid = transaction.hash();
        if self.wallet.transaction_by_hash(&txid).is_some() {
            self.wallet.update_transaction_metadata(&txid, timestamp, block_height);
        } else if let Some(_rejected) = self.wallet.register_transaction(transaction, timestamp, block_height) {
            tracing::debug!(target: "wallet_sync", "wallet rejected transaction");
        }
    }

    pub fn announce_get_transactions_done(&self, rid: u64, success: bool) {
        let applicable = {
            let state = self.state.lock().unwrap();
            state.is_connected && state.scan.matching(rid).is_some()
        };
        if !applicable {
            return;
        }

        if !success {
            let mut state = self.state.lock().unwrap();
            let was_full_scan = matches!(state.scan.matching(rid), Some(scan) if scan.is_full_scan);
            state.scan = ScanState::Idle;
            if was_full_scan {
                self.emit_locked(
                    &state,
                    SyncEvent::SyncStopped { manager: self.handle.clone(), error: SYNC_STOPPED_ERROR },
                );
            }
            return;
        }

        let snapshot = {
            let state = self.state.lock().unwrap();
            state.scan.matching(rid).map(|scan| {
                (
                    scan.beg_block_number,
                    scan.end_block_number,
                    scan.is_full_scan,
                    scan.known_addresses.clone(),
                    scan.last_external_address.clone(),
                    scan.last_internal_address.clone(),
                )
            })
        };
        let Some((beg, end, is_full_scan, mut known, last_external, last_internal)) = snapshot else {
            return;
        };

        let delta = newly_known_addresses(&mut known, self.wallet.as_ref());
        let advanced = addresses_advanced(self.wallet.as_ref(), &last_external, &last_internal);
        let new_external = self.wallet.first_unused_address(AddressChain::External);
        let new_internal = self.wallet.first_unused_address(AddressChain::Internal);

        let mut state = self.state.lock().unwrap();
        if state.scan.matching(rid).is_none() {
            return;
        }

        if advanced {
            if let ScanState::InProgress(scan) = &mut state.scan {
                scan.known_addresses = known;
                scan.last_external_address = new_external;
                scan.last_internal_address = new_internal;
            }
            drop(state);
            tracing::debug!(target: "wallet_sync", rid, discovered = delta.len(), "re-querying after address discovery");
            self.client.get_transactions(self.handle.clone(), delta, beg, end, rid);
            return;
        }

        state.synced_block_height = end - 1;
        state.scan = ScanState::Idle;
        if is_full_scan {
            self.emit_locked(
                &state,
                SyncEvent::SyncStopped { manager: self.handle.clone(), error: SYNC_STOPPED_SUCCESS },
            );
        }
        tracing::debug!(target: "wallet_sync", synced_block_height = end - 1, "scan completed");
    }

    pub fn submit(&self, transaction: Transaction) {
        let rid = {
            let mut state = self.state.lock().unwrap();
            if state.is_connected {
                Some(self.next_request_id(&mut state))
            } else {
                None
            }
        };
        match rid {
            Some(rid) => {
                let raw = transaction.serialize();
                let txid = transaction.hash();
                self.client.submit_transaction(self.handle.clone(), raw, txid, rid);
            }
            None => {
                self.emit(SyncEvent::TxnSubmitted {
                    manager: self.handle.clone(),
                    transaction,
                    error: SYNC_STOPPED_ERROR,
                });
            }
        }
    }

    pub fn announce_submit_transaction(&self, _rid: u64, transaction: Transaction, error: i32) {
        if error == 0 && self.wallet.transaction_by_hash(&transaction.hash()).is_none() {
            let _ = self.wallet.register_transaction(transaction.clone(), 0, 0);
        }
        self.emit(SyncEvent::TxnSubmitted { manager: self.handle.clone(), transaction, error });
    }

    pub fn tick_tock(&self) {
        self.update_block_number();
        self.update_transactions();
    }

    #[cfg(test)]
    pub(crate) fn synced_block_height_for_test(&self) -> u32 {
        self.state.lock().unwrap().synced_block_height
    }

    #[cfg(test)]
    pub(crate) fn set_synced_block_height_for_test(&self, height: u32) {
        self.state.lock().unwrap().synced_block_height = height;
    }
}
