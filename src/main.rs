//! Provisor CLI entry point

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use provisor::config::cli::{Cli, Command};
use provisor::config::FleetConfig;
use provisor::context::LogReporter;
use provisor::engine::NoEngine;
use provisor::network::NoChecker;
use provisor::rpc::TcpFleetClient;
use provisor::{Coordinator, NodeRef};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse_args();
    let config = provisor::config::parse_fleet_file(&cli.config)?;

    let runtime = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;
    runtime.block_on(run(cli, config))
}

async fn run(cli: Cli, config: FleetConfig) -> Result<()> {
    let task_id = cli
        .task_id
        .clone()
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let timeout = cli
        .timeout
        .map(Duration::from_secs)
        .unwrap_or_else(|| config.call_timeout());

    let client = TcpFleetClient::new(config.agents.clone());
    let coordinator = Coordinator::new(client, NoEngine, NoChecker);
    let reporter = Arc::new(LogReporter);

    match cli.command {
        Command::Discover { uids } => {
            let nodes: Vec<NodeRef> = uids.iter().map(NodeRef::new).collect();
            let types = coordinator
                .node_type(reporter, &task_id, &nodes, Some(timeout))
                .await?;
            println!("{}", serde_json::to_string_pretty(&types)?);
        }
        Command::Remove { uids } => {
            let nodes: Vec<NodeRef> = uids.iter().map(NodeRef::new).collect();
            let report = coordinator.remove_nodes(reporter, &task_id, &nodes).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            if report.is_error() {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
