//! Fleet inventory configuration
//!
//! The inventory maps node uids to agent addresses and carries the default
//! fan-out timeout. It is a TOML file:
//!
//! ```toml
//! call_timeout_secs = 30
//!
//! [agents]
//! "1" = "10.0.1.10:9930"
//! "2" = "10.0.1.11:9930"
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub mod cli;

fn default_call_timeout_secs() -> u64 {
    30
}

/// Fleet inventory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetConfig {
    /// Node uid -> agent address ("host:port")
    pub agents: HashMap<String, String>,

    /// Default fan-out call timeout in seconds
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,
}

impl FleetConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }
}

/// Parse a fleet inventory file
pub fn parse_fleet_file(path: &Path) -> Result<FleetConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;

    parse_fleet_string(&contents)
        .map_err(|e| Error::Config(format!("failed to parse {}: {e}", path.display())))
}

/// Parse a fleet inventory from a TOML string
pub fn parse_fleet_string(contents: &str) -> Result<FleetConfig> {
    toml::from_str(contents).map_err(|e| Error::Config(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const INVENTORY: &str = r#"
call_timeout_secs = 10

[agents]
"1" = "10.0.1.10:9930"
"2" = "10.0.1.11:9930"
"#;

    #[test]
    fn test_parse_inventory() {
        let config = parse_fleet_string(INVENTORY).unwrap();
        assert_eq!(config.agents.len(), 2);
        assert_eq!(config.agents["1"], "10.0.1.10:9930");
        assert_eq!(config.call_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_timeout_defaults_when_absent() {
        let config = parse_fleet_string("[agents]\n\"1\" = \"localhost:9930\"\n").unwrap();
        assert_eq!(config.call_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_parse_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(INVENTORY.as_bytes()).unwrap();

        let config = parse_fleet_file(file.path()).unwrap();
        assert_eq!(config.agents.len(), 2);
    }

    #[test]
    fn test_missing_file_is_a_config_error() {
        let err = parse_fleet_file(Path::new("/nonexistent/fleet.toml")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
