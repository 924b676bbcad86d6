use std::time::Duration;

use alloy::providers::RootProvider;
use anyhow::Result;
use chain_diff::finder::find_divergence;
use chain_diff::scanner::{scan, ScanConfig};
use chain_diff::trace_run::compare_block_traces;
use chain_diff::{ChainDataSource, EndpointPair, Reporter};
use clap::Parser;
use cli::Command;
use rpc_diff::env::load_env_file;
use rpc_diff::provider::RpcSource;
use rpc_diff::report::{JsonReporter, TracingReporter};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use self::diff::*;
mod diff {
    pub mod cli;
}

#[tokio::main]
async fn main() -> Result<()> {
    let env_file = load_env_file();
    rpc_diff::tracing::init();
    env_file.log();

    let args = cli::Cli::parse();

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupted, stopping");
                cancel.cancel();
            }
        }
    });
    if let Some(secs) = args.deadline {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            warn!(secs, "deadline reached, stopping");
            cancel.cancel();
        });
    }

    let pair = EndpointPair::new(
        RpcSource::new(
            RootProvider::new_http(args.reference_url),
            args.max_parallel_requests,
        ),
        RpcSource::new(
            RootProvider::new_http(args.candidate_url),
            args.max_parallel_requests,
        ),
    );

    match args.json {
        true => run(args.command, &pair, &cancel, &mut JsonReporter::new(std::io::stdout())).await,
        false => run(args.command, &pair, &cancel, &mut TracingReporter).await,
    }
}

async fn run<A, B>(
    command: Command,
    pair: &EndpointPair<A, B>,
    cancel: &CancellationToken,
    reporter: &mut impl Reporter,
) -> Result<()>
where
    A: ChainDataSource,
    B: ChainDataSource,
{
    match command {
        Command::Bisect { start, end } => {
            let end = match end {
                Some(end) => end,
                None => pair.working_height().await?,
            };
            let divergence = find_divergence(pair, start..=end, cancel, reporter).await?;
            match divergence.bisection.diverged() {
                true => info!(
                    height = divergence.bisection.height,
                    "endpoints diverge"
                ),
                false => info!(start, end, "endpoints agree on the whole range"),
            }
        }
        Command::Scan {
            start,
            end,
            stride,
            progress_every,
            concurrency,
        } => {
            let end = match end {
                Some(end) => end,
                None => pair.working_height().await?,
            };
            let config = ScanConfig {
                range: start..=end,
                stride,
                progress_every,
                concurrency,
            };
            let summary = scan(pair, &config, cancel, reporter).await?;
            if summary.cancelled {
                warn!(sampled = summary.sampled, "scan did not cover the whole range");
            }
        }
        Command::Traces { block } => {
            let summary = compare_block_traces(pair, block, cancel, reporter).await?;
            info!(
                block,
                compared = summary.compared,
                mismatching = summary.mismatching.len(),
                failed = summary.failed.len(),
                "trace comparison finished"
            );
        }
    }
    Ok(())
}
