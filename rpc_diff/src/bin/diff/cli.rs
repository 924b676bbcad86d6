use alloy::transports::http::reqwest::Url;
use clap::{Parser, Subcommand, ValueHint};
use rpc_diff::provider::MAX_NUMBER_OF_PARALLEL_REQUESTS;
use rpc_diff::DEFAULT_SCAN_CONCURRENCY;

/// Finds where two EVM JSON-RPC endpoints start to disagree.
#[derive(Parser)]
#[command(version, propagate_version = true)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Command,

    /// The reference node RPC URL.
    #[arg(short = 'a', long, env = "CHAIN_DIFF_REFERENCE_URL", value_hint = ValueHint::Url)]
    pub(crate) reference_url: Url,
    /// The candidate node RPC URL.
    #[arg(short = 'b', long, env = "CHAIN_DIFF_CANDIDATE_URL", value_hint = ValueHint::Url)]
    pub(crate) candidate_url: Url,
    /// Upper bound on in-flight requests per endpoint.
    #[arg(
        long,
        env = "CHAIN_DIFF_MAX_PARALLEL_REQUESTS",
        default_value_t = MAX_NUMBER_OF_PARALLEL_REQUESTS
    )]
    pub(crate) max_parallel_requests: usize,
    /// Stop the run after this many seconds.
    #[arg(long, env = "CHAIN_DIFF_DEADLINE")]
    pub(crate) deadline: Option<u64>,
    /// Write findings to stdout as JSON lines instead of logging them.
    #[arg(long, global = true)]
    pub(crate) json: bool,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Binary search for the first height with differing block hashes, then
    /// compare that block in full.
    Bisect {
        /// The first height to search (inclusive).
        #[arg(short, long, default_value_t = 0)]
        start: u64,
        /// The last height to search (inclusive). Defaults to the lower of the
        /// two endpoint heads.
        #[arg(short, long)]
        end: Option<u64>,
    },
    /// Compare every block whose height is a multiple of the stride.
    Scan {
        /// The first height to scan (inclusive).
        #[arg(short, long, default_value_t = 0)]
        start: u64,
        /// The last height to scan (inclusive). Defaults to the lower of the
        /// two endpoint heads.
        #[arg(short, long)]
        end: Option<u64>,
        #[arg(long, default_value_t = 100)]
        stride: u64,
        /// Log progress every time the scan passes a multiple of this.
        #[arg(long, default_value_t = 10_000)]
        progress_every: u64,
        /// Number of heights compared at the same time.
        #[arg(short, long, default_value_t = DEFAULT_SCAN_CONCURRENCY)]
        concurrency: usize,
    },
    /// Compare the execution traces of every transaction in one block.
    Traces {
        #[arg(short = 'n', long)]
        block: u64,
    },
}
