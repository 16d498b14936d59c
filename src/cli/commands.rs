use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "hashrig", about = "Simulated proof-of-work mining engine")]
pub struct Opt {
    /// Directory holding the persistent engine state (default: ./data)
    #[arg(long = "data-dir", global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(name = "address", about = "Print the engine's wallet address")]
    Address,
    #[command(name = "stats", about = "Print the current mining statistics")]
    Stats,
    #[command(name = "chain", about = "Print committed blocks, newest last")]
    Chain {
        #[arg(long, help = "Only print the newest N blocks")]
        limit: Option<usize>,
    },
    #[command(name = "mempool", about = "Print pending transactions")]
    Mempool,
    #[command(name = "inventory", about = "Print the hardware catalog and owned counts")]
    Inventory,
    #[command(name = "mine", about = "Mine until the given number of blocks is found")]
    Mine {
        #[arg(help = "Number of blocks to mine before stopping")]
        blocks: u64,
    },
    #[command(name = "submit", about = "Submit a transaction to the mempool")]
    Submit {
        #[arg(help = "Sender address")]
        from: String,
        #[arg(help = "Recipient address")]
        to: String,
        #[arg(help = "Amount in satoshis")]
        amount: u64,
        #[arg(long, help = "Fee in satoshis (default: standard fee)")]
        fee: Option<u64>,
    },
    #[command(name = "buy", about = "Purchase one unit of a hardware item")]
    Buy {
        #[arg(help = "Catalog item id (see 'inventory')")]
        item: String,
        #[arg(long, help = "Skip the cost check")]
        free: bool,
    },
    #[command(name = "withdraw", about = "Withdraw balance to an address")]
    Withdraw {
        #[arg(help = "Amount in satoshis")]
        amount: u64,
        #[arg(help = "Destination address")]
        address: String,
    },
    #[command(name = "reset", about = "Discard the chain and start over from genesis")]
    Reset,
    #[command(name = "export", about = "Dump the full engine state as JSON")]
    Export,
}
