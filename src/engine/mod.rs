// This is the heart of the crate: a single-owner mining engine that drives
// the search loop, owns the chain/mempool/stats exclusively, and exposes the
// synchronous operations everything else calls. Collaborators only ever see
// snapshots and channel events; nothing outside this module mutates engine
// state directly.

pub mod stats;

pub use stats::{MiningStats, WorkerSnapshot};

use crate::config::{EngineConfig, HardwareItem};
use crate::core::{subsidy, Block, DifficultyController, Ledger, ProofOfWork, Transaction};
use crate::error::Result;
use crate::storage::{Mempool, PersistedState, StateStore};
use crate::utils::current_timestamp;
use crate::wallet;
use log::{error, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, RwLock};
use std::thread::{self, JoinHandle};
use std::time::Instant;

/// Events the mining loop publishes to the driver.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// Fresh stats snapshot, emitted once per progress batch
    Progress(MiningStats),
    /// Per-worker hashrate split, emitted alongside each progress snapshot
    Workers(Vec<WorkerSnapshot>),
    /// A block passed validation and was appended
    BlockFound(Block),
    /// A mined block failed re-validation and was discarded
    BlockRejected { index: u64, reason: String },
    /// The loop exited; no further events will arrive
    Stopped,
}

struct EngineState {
    ledger: Ledger,
    stats: MiningStats,
    wallet_address: String,
    /// Difficulty the next candidate will be built with
    difficulty: u32,
    inventory: Vec<HardwareItem>,
    last_payout_ms: i64,
}

struct Shared {
    config: EngineConfig,
    store: Box<dyn StateStore>,
    state: RwLock<EngineState>,
    mempool: Mempool,
    running: AtomicBool,
    stop: AtomicBool,
}

struct RoundPlan {
    candidate: Block,
    selected_ids: Vec<String>,
}

enum RoundOutcome {
    Committed(Block),
    Rejected { index: u64, reason: String },
}

/// The simulated proof-of-work mining engine.
pub struct MiningEngine {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl MiningEngine {
    /// Build an engine, restoring persisted state when the store has any.
    ///
    /// A missing record is not an error: the engine starts a fresh genesis
    /// chain. A corrupt record or an invalid restored chain is logged and
    /// likewise falls back to fresh state.
    pub fn new(config: EngineConfig, store: Box<dyn StateStore>) -> Result<MiningEngine> {
        config.validate()?;
        let now = current_timestamp()?;

        let (state, pending) = match store.load() {
            Ok(Some(persisted)) => {
                if Ledger::is_valid_chain(&persisted.chain) {
                    info!(
                        "Restored state: {} blocks, {} pending transactions, balance {}",
                        persisted.chain.len(),
                        persisted.mempool.len(),
                        persisted.stats.balance
                    );
                    let difficulty = persisted
                        .difficulty
                        .clamp(config.min_difficulty, config.max_difficulty);
                    let mut stats = persisted.stats;
                    stats.difficulty = difficulty;
                    let state = EngineState {
                        ledger: Ledger::from_blocks(persisted.chain)?,
                        stats,
                        wallet_address: persisted.wallet_address,
                        difficulty,
                        inventory: persisted.inventory,
                        last_payout_ms: now,
                    };
                    (state, persisted.mempool)
                } else {
                    warn!("Persisted chain failed validation; starting from genesis");
                    (Self::fresh_state(&config, now), Vec::new())
                }
            }
            Ok(None) => (Self::fresh_state(&config, now), Vec::new()),
            Err(e) => {
                warn!("Failed to load persisted state, starting from genesis: {e}");
                (Self::fresh_state(&config, now), Vec::new())
            }
        };

        let mempool = Mempool::new();
        mempool.extend(pending);

        let shared = Arc::new(Shared {
            config,
            store,
            state: RwLock::new(state),
            mempool,
            running: AtomicBool::new(false),
            stop: AtomicBool::new(false),
        });

        // Record the (possibly fresh) state so the wallet address survives a
        // crash before the first commit
        {
            let state = shared.read_state();
            shared.persist_logged(&state);
        }

        Ok(MiningEngine {
            shared,
            worker: Mutex::new(None),
        })
    }

    fn fresh_state(config: &EngineConfig, now: i64) -> EngineState {
        EngineState {
            ledger: Ledger::new(config.initial_difficulty),
            stats: MiningStats::fresh(config.initial_difficulty, now),
            wallet_address: wallet::new_wallet_address(),
            difficulty: config.initial_difficulty,
            inventory: config.hardware_catalog.clone(),
            last_payout_ms: now,
        }
    }

    /// Spawn the mining loop. Idempotent: returns `false` when the loop is
    /// already running, `true` when this call started it.
    pub fn start(&self, events: Sender<EngineEvent>) -> bool {
        if self.shared.running.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.shared.stop.store(false, Ordering::SeqCst);

        {
            let mut state = self.shared.write_state();
            let now = current_timestamp().unwrap_or(state.last_payout_ms);
            state.stats.started_at_ms = now;
            state.last_payout_ms = now;
        }

        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name("hashrig-miner".to_string())
            .spawn(move || mine_loop(shared, events));

        match spawned {
            Ok(handle) => {
                *self
                    .worker
                    .lock()
                    .expect("Failed to acquire worker handle lock - this should never happen") =
                    Some(handle);
                true
            }
            Err(e) => {
                error!("Failed to spawn mining worker: {e}");
                self.shared.running.store(false, Ordering::SeqCst);
                false
            }
        }
    }

    /// Cooperative stop: raises the stop flag, waits for the loop to finish
    /// its current batch and exit, then persists. No partial block commits.
    pub fn stop(&self) {
        self.shared.stop.store(true, Ordering::SeqCst);
        let handle = self
            .worker
            .lock()
            .expect("Failed to acquire worker handle lock - this should never happen")
            .take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                error!("Mining worker panicked");
            }
        }
        let state = self.shared.read_state();
        self.shared.persist_logged(&state);
    }

    pub fn is_mining(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// Append a pending transaction to the mempool. Always succeeds; the
    /// transaction becomes eligible for the next round's selection.
    pub fn submit_transaction(
        &self,
        from: &str,
        to: &str,
        amount: u64,
        fee: u64,
    ) -> Result<Transaction> {
        let tx = Transaction::new(from, to, amount, fee)?;
        self.shared.mempool.add(tx.clone());
        let state = self.shared.read_state();
        self.shared.persist_logged(&state);
        Ok(tx)
    }

    /// Buy one unit of a catalog item. Returns `false` for an unknown id or
    /// when the balance cannot cover the cost and `bypass_cost` is off.
    pub fn purchase_hardware(&self, item_id: &str, bypass_cost: bool) -> bool {
        let mut state = self.shared.write_state();
        self.shared.payout_locked(&mut state);

        let Some(idx) = state.inventory.iter().position(|item| item.id == item_id) else {
            warn!("Unknown hardware id: {item_id}");
            return false;
        };

        let cost = state.inventory[idx].cost;
        if !bypass_cost {
            if state.stats.balance < cost {
                info!(
                    "Purchase of {item_id} declined: cost {cost}, balance {}",
                    state.stats.balance
                );
                return false;
            }
            state.stats.balance -= cost;
        }

        state.inventory[idx].owned += 1;
        state.stats.hardware_count += 1;
        state.stats.virtual_hashrate = virtual_hashrate(&state.inventory);
        info!(
            "Purchased {item_id}; virtual hashrate now {}",
            state.stats.virtual_hashrate
        );
        self.shared.persist_logged(&state);
        true
    }

    /// Move `amount` out of the balance toward `destination`. Returns
    /// `Ok(false)` when the balance is insufficient; on success the debit and
    /// the enqueued withdrawal transaction happen together.
    pub fn withdraw(&self, amount: u64, destination: &str) -> Result<bool> {
        let mut state = self.shared.write_state();
        self.shared.payout_locked(&mut state);

        if amount > state.stats.balance {
            info!(
                "Withdrawal of {amount} declined: balance {}",
                state.stats.balance
            );
            return Ok(false);
        }

        // Build the transaction before touching the balance so a failure
        // cannot leave a partial debit
        let tx = Transaction::new(
            &state.wallet_address,
            destination,
            amount,
            self.shared.config.withdrawal_fee,
        )?;
        state.stats.balance -= amount;
        self.shared.mempool.add(tx);
        self.shared.persist_logged(&state);
        Ok(true)
    }

    /// Discard the chain, mempool and stats; keep the wallet address and the
    /// hardware inventory; reinitialize genesis and persist.
    pub fn reset_chain(&self) -> Result<()> {
        let now = current_timestamp()?;
        let mut state = self.shared.write_state();

        state.ledger = Ledger::new(self.shared.config.initial_difficulty);
        state.difficulty = self.shared.config.initial_difficulty;
        self.shared.mempool.clear();

        let owned_units: u64 = state.inventory.iter().map(|item| item.owned).sum();
        state.stats = MiningStats::fresh(self.shared.config.initial_difficulty, now);
        state.stats.hardware_count = owned_units;
        state.stats.virtual_hashrate = virtual_hashrate(&state.inventory);
        state.last_payout_ms = now;

        info!("Chain reset to genesis");
        self.shared.persist_logged(&state);
        Ok(())
    }

    /// Stats snapshot. Applies any due passive payout first so the balance
    /// read here is never stale.
    pub fn stats(&self) -> MiningStats {
        let mut state = self.shared.write_state();
        self.shared.payout_locked(&mut state);
        state.stats.clone()
    }

    /// Deep copy of the committed chain.
    pub fn chain(&self) -> Vec<Block> {
        self.shared.read_state().ledger.to_vec()
    }

    /// Copy of the pending transactions in arrival order.
    pub fn mempool(&self) -> Vec<Transaction> {
        self.shared.mempool.snapshot()
    }

    pub fn wallet_address(&self) -> String {
        self.shared.read_state().wallet_address.clone()
    }

    /// Copy of the hardware inventory with current owned counts.
    pub fn inventory(&self) -> Vec<HardwareItem> {
        self.shared.read_state().inventory.clone()
    }

    /// Full-state JSON dump for external storage or inspection.
    pub fn export_snapshot(&self) -> Result<String> {
        let state = self.shared.read_state();
        let record = self.shared.persisted_record(&state);
        Ok(serde_json::to_string_pretty(&record)?)
    }
}

impl Drop for MiningEngine {
    fn drop(&mut self) {
        // Engines dropped while mining stop cleanly rather than detaching
        // the worker thread
        if self.is_mining() {
            self.stop();
        }
    }
}

impl Shared {
    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, EngineState> {
        self.state
            .read()
            .expect("Failed to acquire read lock on engine state - this should never happen")
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, EngineState> {
        self.state
            .write()
            .expect("Failed to acquire write lock on engine state - this should never happen")
    }

    /// Credit passive income from owned hardware. Time-gated to the payout
    /// tick; called at every suspension point and before balance reads so
    /// the search loop and synchronous readers agree on ordering.
    fn payout_locked(&self, state: &mut EngineState) {
        let now = match current_timestamp() {
            Ok(now) => now,
            Err(e) => {
                error!("Skipping payout tick: {e}");
                return;
            }
        };
        let elapsed = now.saturating_sub(state.last_payout_ms);
        if elapsed < self.config.payout_tick_ms as i64 {
            return;
        }

        let rate = virtual_hashrate(&state.inventory);
        state.stats.virtual_hashrate = rate;
        if rate > 0 {
            let credit = (rate as u128 * elapsed as u128)
                / (self.config.payout_hash_per_satoshi as u128 * 1_000);
            state.stats.balance = state.stats.balance.saturating_add(credit as u64);
        }
        state.last_payout_ms = now;
    }

    fn persisted_record(&self, state: &EngineState) -> PersistedState {
        PersistedState {
            chain: state.ledger.to_vec(),
            stats: state.stats.clone(),
            wallet_address: state.wallet_address.clone(),
            mempool: self.mempool.snapshot(),
            difficulty: state.difficulty,
            inventory: state.inventory.clone(),
        }
    }

    /// Save the current state; a failing store is logged and the engine
    /// keeps running in memory.
    fn persist_logged(&self, state: &EngineState) {
        let record = self.persisted_record(state);
        if let Err(e) = self.store.save(&record) {
            error!("State save failed; continuing in memory: {e}");
        }
    }

    /// Fix the next round's candidate: chain tip, difficulty, coinbase and
    /// the fee-ordered mempool selection. Transactions submitted after this
    /// point wait for the next round.
    fn begin_round(&self) -> Result<RoundPlan> {
        let (index, tip_hash, difficulty, wallet_address) = {
            let mut state = self.write_state();
            self.payout_locked(&mut state);
            (
                state.ledger.tip().get_index() + 1,
                state.ledger.tip().get_hash().to_string(),
                state.difficulty,
                state.wallet_address.clone(),
            )
        };

        let reward = subsidy(index, self.config.base_reward, self.config.halving_interval);
        let selected = self.mempool.select(self.config.mempool_cap);
        let selected_ids: Vec<String> = selected
            .iter()
            .map(|tx| tx.get_id().to_string())
            .collect();

        let mut transactions = Vec::with_capacity(selected.len() + 1);
        transactions.push(Transaction::new_coinbase(index, &wallet_address, reward)?);
        transactions.extend(selected);

        let candidate = Block::candidate(
            index,
            tip_hash,
            transactions,
            difficulty,
            wallet_address,
            reward,
        )?;

        Ok(RoundPlan {
            candidate,
            selected_ids,
        })
    }

    /// Validate and commit a sealed block, or record the rejection. The
    /// chain never advances on a rejected block.
    fn commit_round(
        &self,
        block: Block,
        selected_ids: &[String],
        tail_hashes: u64,
    ) -> RoundOutcome {
        let mut state = self.write_state();
        state.stats.total_hashes = state.stats.total_hashes.saturating_add(tail_hashes);

        match state.ledger.append(block.clone()) {
            Err(e) => {
                state.stats.rejected_blocks += 1;
                RoundOutcome::Rejected {
                    index: block.get_index(),
                    reason: e.to_string(),
                }
            }
            Ok(()) => {
                self.mempool.remove_ids(selected_ids);
                state.stats.blocks_found += 1;
                state.stats.balance = state.stats.balance.saturating_add(block.get_reward());

                let current = state.difficulty;
                state.difficulty =
                    DifficultyController::evaluate(state.ledger.blocks(), current, &self.config);
                state.stats.difficulty = state.difficulty;

                self.persist_logged(&state);
                RoundOutcome::Committed(block)
            }
        }
    }

    /// Progress bookkeeping at a batch boundary: payout tick, stats update,
    /// event emission.
    fn on_batch(
        &self,
        events: &Sender<EngineEvent>,
        round_started: &Instant,
        hashes: u64,
        batch_index: u64,
    ) {
        let elapsed = round_started.elapsed().as_secs_f64();
        let measured = if elapsed > 0.0 {
            (hashes as f64 / elapsed) as u64
        } else {
            0
        };

        let snapshot = {
            let mut state = self.write_state();
            self.payout_locked(&mut state);

            state.stats.hashrate = measured.saturating_add(state.stats.virtual_hashrate);
            state.stats.total_hashes = state
                .stats
                .total_hashes
                .saturating_add(self.config.progress_batch);
            state.stats.estimated_secs = MiningStats::estimate_secs(state.difficulty, measured);

            let inventory_watts: u64 = state
                .inventory
                .iter()
                .map(|item| item.power_watts.saturating_mul(item.owned))
                .sum();
            let search_watts = measured.saturating_mul(3) / 2_000;
            state.stats.power_draw_watts = inventory_watts.saturating_add(search_watts);
            state.stats.efficiency = if state.stats.power_draw_watts > 0 {
                state.stats.hashrate as f64 / state.stats.power_draw_watts as f64
            } else {
                0.0
            };
            state.stats.clone()
        };

        let workers = self.worker_snapshots(measured, batch_index);
        let _ = events.send(EngineEvent::Progress(snapshot));
        let _ = events.send(EngineEvent::Workers(workers));
    }

    /// Split the measured hashrate across the logical workers; batches are
    /// attributed round-robin as shares.
    fn worker_snapshots(&self, measured: u64, batch_index: u64) -> Vec<WorkerSnapshot> {
        let count = self.config.worker_count;
        let per_worker = measured / count as u64;
        (0..count)
            .map(|id| WorkerSnapshot {
                id: id + 1,
                hashrate: per_worker,
                shares: batch_index / count as u64
                    + u64::from((batch_index as usize % count) > id),
            })
            .collect()
    }
}

fn virtual_hashrate(inventory: &[HardwareItem]) -> u64 {
    inventory
        .iter()
        .fold(0u64, |sum, item| {
            sum.saturating_add(item.hashrate.saturating_mul(item.owned))
        })
}

/// The mining loop proper: one round in flight at a time, rounds repeat
/// until the stop flag is observed at a batch boundary.
fn mine_loop(shared: Arc<Shared>, events: Sender<EngineEvent>) {
    info!("Mining loop started");

    while !shared.stop.load(Ordering::SeqCst) {
        let plan = match shared.begin_round() {
            Ok(plan) => plan,
            Err(e) => {
                error!("Failed to build a candidate block: {e}");
                break;
            }
        };
        let RoundPlan {
            candidate,
            selected_ids,
        } = plan;

        let pow = ProofOfWork::new(candidate.get_difficulty());
        let round_started = Instant::now();
        let mut batches: u64 = 0;

        let outcome = pow.search(&candidate, shared.config.progress_batch, |hashes| {
            batches += 1;
            shared.on_batch(&events, &round_started, hashes, batches);
            !shared.stop.load(Ordering::SeqCst)
        });

        let Some((nonce, hash)) = outcome else {
            // Cancelled mid-search: the candidate is discarded whole
            break;
        };

        let mut sealed = candidate;
        sealed.seal(nonce, hash);

        // Hashes tried since the last batch boundary; the boundaries
        // themselves were already counted in on_batch
        let tail_hashes = nonce - (batches * shared.config.progress_batch).min(nonce);

        match shared.commit_round(sealed, &selected_ids, tail_hashes) {
            RoundOutcome::Committed(block) => {
                info!(
                    "Block {} committed after {} hashes: {}",
                    block.get_index(),
                    nonce,
                    block.get_hash()
                );
                let _ = events.send(EngineEvent::BlockFound(block));
            }
            RoundOutcome::Rejected { index, reason } => {
                warn!("Block {index} rejected: {reason}");
                let _ = events.send(EngineEvent::BlockRejected { index, reason });
            }
        }
    }

    shared.running.store(false, Ordering::SeqCst);
    {
        let state = shared.read_state();
        shared.persist_logged(&state);
    }
    let _ = events.send(EngineEvent::Stopped);
    info!("Mining loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStateStore;

    /// Config with a hard search (difficulty 8) so nothing mines by accident,
    /// and a tiny catalog with flat numbers.
    fn idle_config() -> EngineConfig {
        EngineConfig {
            initial_difficulty: 8,
            hardware_catalog: vec![
                HardwareItem {
                    id: "rig".to_string(),
                    name: "Test Rig".to_string(),
                    hashrate: 1_000,
                    power_watts: 100,
                    cost: 500,
                    owned: 0,
                },
                HardwareItem {
                    id: "farm".to_string(),
                    name: "Test Farm".to_string(),
                    hashrate: 50_000,
                    power_watts: 2_000,
                    cost: 1_000_000,
                    owned: 0,
                },
            ],
            ..EngineConfig::default()
        }
    }

    fn idle_engine() -> MiningEngine {
        MiningEngine::new(idle_config(), Box::new(MemoryStateStore::new())).unwrap()
    }

    #[test]
    fn test_fresh_engine_starts_at_genesis() {
        let engine = idle_engine();
        let chain = engine.chain();
        assert_eq!(chain.len(), 1);
        assert_eq!(chain[0].get_index(), 0);
        assert_eq!(engine.stats().balance, 0);
        assert!(engine.mempool().is_empty());
        assert!(!engine.is_mining());
        assert!(wallet::validate_address(&engine.wallet_address()));
    }

    #[test]
    fn test_submit_transaction_lands_in_mempool() {
        let engine = idle_engine();
        let tx = engine
            .submit_transaction("alice", "bob", 1_000, 25)
            .unwrap();

        let pool = engine.mempool();
        assert_eq!(pool.len(), 1);
        assert_eq!(pool[0].get_id(), tx.get_id());
        assert_eq!(pool[0].get_fee(), 25);
    }

    #[test]
    fn test_purchase_requires_balance_unless_bypassed() {
        let engine = idle_engine();

        // No funds yet
        assert!(!engine.purchase_hardware("rig", false));
        assert_eq!(engine.stats().hardware_count, 0);

        // Bypass ignores cost
        assert!(engine.purchase_hardware("rig", true));
        let stats = engine.stats();
        assert_eq!(stats.hardware_count, 1);
        assert_eq!(stats.virtual_hashrate, 1_000);
        assert_eq!(stats.balance, 0);

        // Unknown ids fail
        assert!(!engine.purchase_hardware("nonexistent", true));

        let inventory = engine.inventory();
        assert_eq!(
            inventory.iter().find(|i| i.id == "rig").unwrap().owned,
            1
        );
    }

    #[test]
    fn test_withdraw_rejects_overdraft() {
        let engine = idle_engine();
        assert!(!engine.withdraw(1, "1SomeDestination").unwrap());
        assert_eq!(engine.stats().balance, 0);
        assert!(engine.mempool().is_empty());
    }

    #[test]
    fn test_reset_keeps_wallet_and_inventory() {
        let engine = idle_engine();
        let address = engine.wallet_address();
        engine.purchase_hardware("rig", true);
        engine.submit_transaction("alice", "bob", 10, 1).unwrap();

        engine.reset_chain().unwrap();

        assert_eq!(engine.chain().len(), 1);
        assert!(engine.mempool().is_empty());
        assert_eq!(engine.wallet_address(), address);
        let stats = engine.stats();
        assert_eq!(stats.blocks_found, 0);
        assert_eq!(stats.hardware_count, 1);
        assert_eq!(stats.virtual_hashrate, 1_000);
    }

    #[test]
    fn test_export_snapshot_is_json() {
        let engine = idle_engine();
        let json = engine.export_snapshot().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert!(value.get("chain").is_some());
        assert!(value.get("stats").is_some());
        assert!(value.get("wallet_address").is_some());
        assert!(value.get("mempool").is_some());
        assert!(value.get("difficulty").is_some());
        assert!(value.get("inventory").is_some());
    }

    #[test]
    fn test_start_is_idempotent() {
        let engine = idle_engine();
        let (tx, _rx) = std::sync::mpsc::channel();
        let (tx2, _rx2) = std::sync::mpsc::channel();

        assert!(engine.start(tx));
        assert!(engine.is_mining());
        // Second start is refused while the loop runs
        assert!(!engine.start(tx2));

        engine.stop();
        assert!(!engine.is_mining());
    }

    #[test]
    fn test_worker_snapshots_split_rate() {
        let engine = idle_engine();
        let workers = engine.shared.worker_snapshots(4_000, 5);
        assert_eq!(workers.len(), engine.shared.config.worker_count);
        assert!(workers.iter().all(|w| w.hashrate == 1_000));
        let total_shares: u64 = workers.iter().map(|w| w.shares).sum();
        assert_eq!(total_shares, 5);
    }
}
