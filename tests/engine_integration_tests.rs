//! Engine integration tests
//!
//! Drives a real engine end to end at low difficulty: mining rounds, mempool
//! drain, cancellation, purchases, withdrawals, resets and persistence
//! round-trips through both store implementations.

use hashrig::{
    EngineConfig, EngineEvent, HardwareItem, MemoryStateStore, MiningEngine, PersistedState,
    ProofOfWork, SledStateStore, StateStore,
};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;
use tempfile::tempdir;

const EVENT_TIMEOUT: Duration = Duration::from_secs(30);

/// Config that mines instantly (difficulty 1) with a small test catalog.
fn fast_config() -> EngineConfig {
    EngineConfig {
        initial_difficulty: 1,
        progress_batch: 100,
        hardware_catalog: vec![HardwareItem {
            id: "rig".to_string(),
            name: "Test Rig".to_string(),
            hashrate: 100_000,
            power_watts: 50,
            cost: 1_000,
            owned: 0,
        }],
        ..EngineConfig::default()
    }
}

/// Config whose search will not finish on its own (difficulty 8).
fn slow_config() -> EngineConfig {
    EngineConfig {
        initial_difficulty: 8,
        progress_batch: 100,
        ..fast_config()
    }
}

/// Receive events until `count` blocks have been found, then stop the engine.
fn mine_blocks(engine: &MiningEngine, events: &Receiver<EngineEvent>, count: u64) {
    let mut found = 0;
    loop {
        match events.recv_timeout(EVENT_TIMEOUT).expect("mining timed out") {
            EngineEvent::BlockFound(_) => {
                found += 1;
                if found >= count {
                    engine.stop();
                    return;
                }
            }
            EngineEvent::Stopped => panic!("engine stopped before finding {count} blocks"),
            _ => {}
        }
    }
}

#[test]
fn test_mining_extends_a_valid_chain() {
    let engine = MiningEngine::new(fast_config(), Box::new(MemoryStateStore::new())).unwrap();
    let (tx, rx) = std::sync::mpsc::channel();

    assert!(engine.start(tx));
    mine_blocks(&engine, &rx, 2);

    // A round already in flight when the stop flag rises may legally finish,
    // so the chain holds at least the two requested blocks
    let chain = engine.chain();
    assert!(chain.len() >= 3); // genesis + 2 mined

    for i in 1..chain.len() {
        let block = &chain[i];
        assert_eq!(block.get_index(), i as u64);
        assert_eq!(block.get_previous_hash(), chain[i - 1].get_hash());
        assert!(ProofOfWork::has_required_prefix(
            block.get_hash(),
            block.get_difficulty()
        ));
        // Stored hash round-trips through the header digest
        assert_eq!(block.compute_hash(), block.get_hash());
        assert!(block.verify_merkle_root());
        // Every block carries its coinbase first
        assert!(block.get_transactions()[0].is_coinbase());
    }

    let stats = engine.stats();
    assert_eq!(stats.blocks_found, (chain.len() - 1) as u64);
    let expected_balance: u64 = chain[1..].iter().map(|b| b.get_reward()).sum();
    assert_eq!(stats.balance, expected_balance);
    assert!(stats.total_hashes > 0);
}

#[test]
fn test_mempool_drains_into_block_by_fee() {
    let engine = MiningEngine::new(fast_config(), Box::new(MemoryStateStore::new())).unwrap();
    engine.submit_transaction("alice", "bob", 100, 5).unwrap();
    engine.submit_transaction("carol", "dave", 100, 1).unwrap();
    engine.submit_transaction("erin", "frank", 100, 9).unwrap();

    let (tx, rx) = std::sync::mpsc::channel();
    engine.start(tx);
    mine_blocks(&engine, &rx, 1);

    let chain = engine.chain();
    // The pool was populated before the first round, so block 1 carries it
    let block = &chain[1];
    let txs = block.get_transactions();

    assert_eq!(txs.len(), 4); // coinbase + 3 pending
    assert!(txs[0].is_coinbase());
    let fees: Vec<u64> = txs[1..].iter().map(|t| t.get_fee()).collect();
    assert_eq!(fees, vec![9, 5, 1]);

    // Committed entries left the pool exactly once
    assert!(engine.mempool().is_empty());
}

#[test]
fn test_stop_cancels_the_round_without_commit() {
    let engine = MiningEngine::new(slow_config(), Box::new(MemoryStateStore::new())).unwrap();
    let (tx, rx) = std::sync::mpsc::channel();
    engine.start(tx);

    // Wait until the search is demonstrably running
    loop {
        match rx.recv_timeout(EVENT_TIMEOUT).expect("no progress arrived") {
            EngineEvent::Progress(_) => break,
            EngineEvent::BlockFound(_) => panic!("difficulty 8 should not solve this fast"),
            _ => {}
        }
    }

    engine.stop();
    assert!(!engine.is_mining());

    // Everything still buffered must be progress chatter, never a block
    loop {
        match rx.recv_timeout(Duration::from_millis(100)) {
            Ok(EngineEvent::BlockFound(_)) => panic!("cancelled round committed a block"),
            Ok(EngineEvent::Stopped) | Err(RecvTimeoutError::Disconnected) => break,
            Ok(_) => {}
            Err(RecvTimeoutError::Timeout) => break,
        }
    }

    assert_eq!(engine.chain().len(), 1);
    assert_eq!(engine.stats().blocks_found, 0);
}

#[test]
fn test_withdraw_debits_and_enqueues_transaction() {
    let config = fast_config();
    let withdrawal_fee = config.withdrawal_fee;
    let engine = MiningEngine::new(config, Box::new(MemoryStateStore::new())).unwrap();

    let (tx, rx) = std::sync::mpsc::channel();
    engine.start(tx);
    mine_blocks(&engine, &rx, 1);

    let balance = engine.stats().balance;
    assert!(balance > 0);

    // Overdraft fails without side effects
    assert!(!engine.withdraw(balance + 1, "1Destination").unwrap());
    assert_eq!(engine.stats().balance, balance);
    assert!(engine.mempool().is_empty());

    // A covered withdrawal debits and enqueues
    let amount = balance / 2;
    assert!(engine.withdraw(amount, "1Destination").unwrap());
    assert_eq!(engine.stats().balance, balance - amount);

    let pool = engine.mempool();
    assert_eq!(pool.len(), 1);
    assert_eq!(pool[0].get_from(), engine.wallet_address());
    assert_eq!(pool[0].get_to(), "1Destination");
    assert_eq!(pool[0].get_amount(), amount);
    assert_eq!(pool[0].get_fee(), withdrawal_fee);
}

#[test]
fn test_virtual_hashrate_pays_out_passively() {
    let config = EngineConfig {
        // Generous rate and a fast tick so the test finishes quickly
        payout_hash_per_satoshi: 1_000,
        payout_tick_ms: 10,
        ..slow_config()
    };
    let engine = MiningEngine::new(config, Box::new(MemoryStateStore::new())).unwrap();

    assert!(engine.purchase_hardware("rig", true));
    assert_eq!(engine.stats().balance, 0);

    std::thread::sleep(Duration::from_millis(50));
    // 100_000 h/s at 1_000 hashes per satoshi-second pays ~0.1 sat/ms
    let stats = engine.stats();
    assert!(stats.balance > 0, "passive payout never accrued");
    assert_eq!(stats.virtual_hashrate, 100_000);
}

#[test]
fn test_persistence_round_trip_through_sled() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("engine_state");

    let (chain_before, balance_before, wallet_before, pending_id) = {
        let store = SledStateStore::open(&path).unwrap();
        let engine = MiningEngine::new(fast_config(), Box::new(store)).unwrap();

        let (tx, rx) = std::sync::mpsc::channel();
        engine.start(tx);
        mine_blocks(&engine, &rx, 2);

        let pending = engine
            .submit_transaction("alice", "bob", 77, 3)
            .unwrap();
        (
            engine.chain(),
            engine.stats().balance,
            engine.wallet_address(),
            pending.get_id().to_string(),
        )
    };

    // A brand new engine over the same store resumes where the first left off
    let store = SledStateStore::open(&path).unwrap();
    let engine = MiningEngine::new(fast_config(), Box::new(store)).unwrap();

    assert_eq!(engine.chain(), chain_before);
    assert_eq!(engine.stats().balance, balance_before);
    assert_eq!(engine.wallet_address(), wallet_before);

    let pool = engine.mempool();
    assert_eq!(pool.len(), 1);
    assert_eq!(pool[0].get_id(), pending_id);

    // And it can keep mining on top of the restored chain
    let (tx, rx) = std::sync::mpsc::channel();
    engine.start(tx);
    mine_blocks(&engine, &rx, 1);
    assert!(engine.chain().len() > chain_before.len());
}

#[test]
fn test_tampered_persisted_chain_falls_back_to_genesis() {
    let store = MemoryStateStore::new();

    // Produce a legitimate persisted record first
    {
        let engine = MiningEngine::new(fast_config(), Box::new(MemoryStateStore::new())).unwrap();
        let (tx, rx) = std::sync::mpsc::channel();
        engine.start(tx);
        mine_blocks(&engine, &rx, 2);

        let record: PersistedState =
            serde_json::from_str(&engine.export_snapshot().unwrap()).unwrap();
        // Cut out the middle block so the linkage no longer holds
        let mut chain = record.chain.clone();
        chain.remove(1);
        store
            .save(&PersistedState { chain, ..record })
            .unwrap();
    }

    let engine = MiningEngine::new(fast_config(), Box::new(store)).unwrap();
    assert_eq!(engine.chain().len(), 1, "tampered chain must not be restored");
    assert_eq!(engine.stats().balance, 0);
}

#[test]
fn test_reset_discards_chain_and_mempool() {
    let engine = MiningEngine::new(fast_config(), Box::new(MemoryStateStore::new())).unwrap();
    let (tx, rx) = std::sync::mpsc::channel();
    engine.start(tx);
    mine_blocks(&engine, &rx, 2);
    engine.submit_transaction("alice", "bob", 10, 1).unwrap();

    engine.reset_chain().unwrap();

    assert_eq!(engine.chain().len(), 1);
    assert_eq!(engine.chain()[0].get_index(), 0);
    assert!(engine.mempool().is_empty());
    let stats = engine.stats();
    assert_eq!(stats.balance, 0);
    assert_eq!(stats.blocks_found, 0);
    assert_eq!(stats.total_hashes, 0);
}

#[test]
fn test_transaction_submitted_mid_round_waits_for_next_round() {
    let engine = MiningEngine::new(slow_config(), Box::new(MemoryStateStore::new())).unwrap();
    let (tx, rx) = std::sync::mpsc::channel();
    engine.start(tx);

    // The round's candidate is already fixed once progress arrives
    loop {
        if let EngineEvent::Progress(_) = rx.recv_timeout(EVENT_TIMEOUT).expect("no progress") {
            break;
        }
    }

    engine.submit_transaction("late", "larry", 10, 1).unwrap();
    engine.stop();

    // The cancelled round never consumed it
    assert_eq!(engine.mempool().len(), 1);
}
