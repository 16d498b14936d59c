// CLI driver for the mining engine. The binary is a collaborator only: it
// builds one engine over the on-disk store, invokes its operations and
// renders the snapshots/events; all ledger state stays inside the engine.

use clap::Parser;
use hashrig::core::reward::{format_coins, DEFAULT_TRANSACTION_FEE};
use hashrig::{
    validate_address, Command, EngineConfig, EngineEvent, MiningEngine, Opt, SledStateStore,
};
use log::{error, info, warn, LevelFilter};
use std::env::current_dir;
use std::path::PathBuf;
use std::process;
use std::sync::mpsc;

fn main() {
    env_logger::builder().filter_level(LevelFilter::Info).init();

    let opt = Opt::parse();

    if let Err(e) = run_command(opt) {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn default_data_dir() -> Result<PathBuf, Box<dyn std::error::Error>> {
    Ok(current_dir()?.join("data"))
}

fn run_command(opt: Opt) -> Result<(), Box<dyn std::error::Error>> {
    let data_dir = match opt.data_dir {
        Some(dir) => dir,
        None => default_data_dir()?,
    };
    let store = SledStateStore::open(&data_dir)?;
    let engine = MiningEngine::new(EngineConfig::default(), Box::new(store))?;

    match opt.command {
        Command::Address => {
            println!("{}", engine.wallet_address());
        }
        Command::Stats => {
            let stats = engine.stats();
            println!("Balance:          {} coins", format_coins(stats.balance));
            println!("Difficulty:       {}", stats.difficulty);
            println!("Blocks found:     {}", stats.blocks_found);
            println!("Blocks rejected:  {}", stats.rejected_blocks);
            println!("Total hashes:     {}", stats.total_hashes);
            println!("Hashrate:         {} h/s", stats.hashrate);
            println!("Virtual hashrate: {} h/s", stats.virtual_hashrate);
            println!("Hardware owned:   {}", stats.hardware_count);
            println!("Power draw:       {} W", stats.power_draw_watts);
        }
        Command::Chain { limit } => {
            let chain = engine.chain();
            let skip = limit.map_or(0, |n| chain.len().saturating_sub(n));
            for block in chain.iter().skip(skip) {
                println!("Block #{}", block.get_index());
                println!("  Hash:       {}", block.get_hash());
                println!("  Prev hash:  {}", block.get_previous_hash());
                println!("  Difficulty: {}", block.get_difficulty());
                println!("  Nonce:      {}", block.get_nonce());
                println!("  Miner:      {}", block.get_miner());
                println!("  Reward:     {} coins", format_coins(block.get_reward()));
                println!("  Merkle:     {}", block.get_merkle_root());
                for tx in block.get_transactions() {
                    println!(
                        "  - {} {} -> {} amount {} fee {}",
                        tx.get_id(),
                        tx.get_from(),
                        tx.get_to(),
                        tx.get_amount(),
                        tx.get_fee()
                    );
                }
                println!();
            }
        }
        Command::Mempool => {
            let pool = engine.mempool();
            if pool.is_empty() {
                println!("Mempool is empty");
            }
            for tx in pool {
                println!(
                    "{} {} -> {} amount {} fee {}",
                    tx.get_id(),
                    tx.get_from(),
                    tx.get_to(),
                    tx.get_amount(),
                    tx.get_fee()
                );
            }
        }
        Command::Inventory => {
            for item in engine.inventory() {
                println!(
                    "{:<16} {:<20} {:>16} h/s  {:>6} W  cost {} coins  owned {}",
                    item.id,
                    item.name,
                    item.hashrate,
                    item.power_watts,
                    format_coins(item.cost),
                    item.owned
                );
            }
        }
        Command::Mine { blocks } => {
            mine(&engine, blocks)?;
        }
        Command::Submit {
            from,
            to,
            amount,
            fee,
        } => {
            let tx = engine.submit_transaction(
                &from,
                &to,
                amount,
                fee.unwrap_or(DEFAULT_TRANSACTION_FEE),
            )?;
            println!("Submitted {}", tx.get_id());
        }
        Command::Buy { item, free } => {
            if engine.purchase_hardware(&item, free) {
                println!("Purchased {item}");
            } else {
                return Err(format!("Could not purchase {item} (unknown id or insufficient balance)").into());
            }
        }
        Command::Withdraw { amount, address } => {
            if !validate_address(&address) {
                return Err(format!("Invalid destination address: {address}").into());
            }
            if engine.withdraw(amount, &address)? {
                println!(
                    "Withdrew {} coins to {address}",
                    format_coins(amount)
                );
            } else {
                return Err("Insufficient balance".into());
            }
        }
        Command::Reset => {
            engine.reset_chain()?;
            println!("Chain reset to genesis");
        }
        Command::Export => {
            println!("{}", engine.export_snapshot()?);
        }
    }
    Ok(())
}

// Drives a bounded mining session: start the loop, render events, stop after
// the requested number of blocks has been committed.
fn mine(engine: &MiningEngine, blocks: u64) -> Result<(), Box<dyn std::error::Error>> {
    if blocks == 0 {
        return Ok(());
    }

    let (events_tx, events_rx) = mpsc::channel();
    engine.start(events_tx);
    println!(
        "Mining to {} (stopping after {blocks} block{})",
        engine.wallet_address(),
        if blocks == 1 { "" } else { "s" }
    );

    let mut found = 0u64;
    while let Ok(event) = events_rx.recv() {
        match event {
            EngineEvent::Progress(stats) => {
                info!(
                    "{} h/s, difficulty {}, ~{}s to next block",
                    stats.hashrate, stats.difficulty, stats.estimated_secs
                );
            }
            EngineEvent::Workers(_) => {}
            EngineEvent::BlockFound(block) => {
                println!(
                    "Found block #{} ({} coins): {}",
                    block.get_index(),
                    format_coins(block.get_reward()),
                    block.get_hash()
                );
                found += 1;
                if found >= blocks {
                    engine.stop();
                    break;
                }
            }
            EngineEvent::BlockRejected { index, reason } => {
                warn!("Block {index} rejected: {reason}");
            }
            EngineEvent::Stopped => break,
        }
    }

    let stats = engine.stats();
    println!(
        "Session finished: {} block(s) this chain, balance {} coins",
        stats.blocks_found,
        format_coins(stats.balance)
    );
    Ok(())
}
