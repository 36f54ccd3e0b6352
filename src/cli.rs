//! Command Line Interface
//!
//! clap definitions of the harness commands.

use clap::{Args, Parser, Subcommand};

use crate::config::InitParams;

/// Benchmark harness for tag-indexed caches
#[derive(Parser, Debug)]
#[command(name = "tagbench", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate a dataset, per-client op files and a run script
    Init(InitArgs),
    /// Flush the cache under test entirely
    Clean,
    /// Save every record of a dataset into the cache
    Load {
        /// Name of the test dataset
        #[arg(long, default_value = "default")]
        name: String,
    },
    /// Time one tag query per tag currently in the cache
    Tags {
        /// Print the timing of every tag
        #[arg(short, long)]
        verbose: bool,
    },
    /// Replay the pre-generated operations of one client
    Ops {
        /// Name of the test dataset
        #[arg(long)]
        name: String,
        /// Client number (0-based)
        #[arg(long)]
        client: usize,
        /// Only print the result line
        #[arg(short, long)]
        quiet: bool,
    },
    /// Aggregate the client results of a run
    Report {
        /// Name of the test dataset
        #[arg(long, default_value = "default")]
        name: String,
    },
    /// Run the whole benchmark in one process
    Bench {
        /// Name of the test dataset
        #[arg(long, default_value = "default")]
        name: String,
        /// Reuse the current cache contents instead of flushing and loading
        #[arg(long)]
        keep: bool,
    },
}

#[derive(Args, Debug, Clone)]
pub struct InitArgs {
    /// Name of the test dataset
    #[arg(long, default_value = "default")]
    pub name: String,
    /// Number of cache keys
    #[arg(long, default_value_t = 10_000)]
    pub keys: usize,
    /// Number of cache tags
    #[arg(long, default_value_t = 2_000)]
    pub tags: usize,
    /// The min number of tags to use for each record
    #[arg(long, default_value_t = 0)]
    pub min_tags: usize,
    /// The max number of tags to use for each record
    #[arg(long, default_value_t = 15)]
    pub max_tags: usize,
    /// The smallest size for a record
    #[arg(long, default_value_t = 1)]
    pub min_rec_size: usize,
    /// The largest size for a record
    #[arg(long, default_value_t = 1024)]
    pub max_rec_size: usize,
    /// The number of concurrent processes to run
    #[arg(long, default_value_t = 4)]
    pub clients: usize,
    /// The number of operations per client
    #[arg(long, default_value_t = 100_000)]
    pub ops: usize,
    /// The chance-factor that a key will be overwritten
    #[arg(long, default_value_t = 1_000)]
    pub write_chance: u32,
    /// The chance-factor that a tag will be cleaned
    #[arg(long, default_value_t = 5_000)]
    pub clean_chance: u32,
    /// Shortest lifetime in seconds of records that expire
    #[arg(long, default_value_t = 10)]
    pub min_ttl: u64,
    /// Longest lifetime in seconds of records that expire
    #[arg(long, default_value_t = 14_400)]
    pub max_ttl: u64,
    /// Random seed; drawn and recorded when omitted
    #[arg(long)]
    pub seed: Option<u64>,
}

impl From<InitArgs> for InitParams {
    fn from(args: InitArgs) -> Self {
        Self {
            name: args.name,
            num_keys: args.keys,
            num_tags: args.tags,
            min_tags: args.min_tags,
            max_tags: args.max_tags,
            min_size: args.min_rec_size,
            max_size: args.max_rec_size,
            num_clients: args.clients,
            num_ops: args.ops,
            write_factor: args.write_chance,
            clean_factor: args.clean_chance,
            min_ttl: args.min_ttl,
            max_ttl: args.max_ttl,
            seed: args.seed,
        }
    }
}
