//! CLI argument parsing using clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Provisor - fleet provisioning coordinator
#[derive(Parser, Debug)]
#[command(name = "provisor")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Fleet inventory file (TOML, node uid -> agent address)
    #[arg(short = 'c', long, default_value = "fleet.toml", env = "PROVISOR_FLEET")]
    pub config: PathBuf,

    /// Task identifier used for log correlation (generated when absent)
    #[arg(long)]
    pub task_id: Option<String>,

    /// Fan-out call timeout in seconds (overrides the inventory default)
    #[arg(long)]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Discover the system type of each node (best-effort, silent nodes omitted)
    Discover {
        /// Node uids to query
        #[arg(required = true)]
        uids: Vec<String>,
    },

    /// Erase and reboot nodes, reconciling every requested node into the report
    Remove {
        /// Node uids to remove
        #[arg(required = true)]
        uids: Vec<String>,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_remove() {
        let cli = Cli::try_parse_from(["provisor", "--task-id", "t-1", "remove", "1", "2"]).unwrap();
        assert_eq!(cli.task_id.as_deref(), Some("t-1"));
        match cli.command {
            Command::Remove { uids } => assert_eq!(uids, vec!["1", "2"]),
            other => panic!("wrong command: {other:?}"),
        }
    }

    #[test]
    fn test_remove_requires_uids() {
        assert!(Cli::try_parse_from(["provisor", "remove"]).is_err());
    }

    #[test]
    fn test_discover_with_timeout() {
        let cli = Cli::try_parse_from(["provisor", "--timeout", "5", "discover", "1"]).unwrap();
        assert_eq!(cli.timeout, Some(5));
        assert!(matches!(cli.command, Command::Discover { .. }));
    }
}
