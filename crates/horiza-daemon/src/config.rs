// crates/horiza-daemon/src/config.rs
//
// Runtime configuration for the Horiza Protocol daemon.
// Loaded from a TOML file or populated with sensible defaults.

use serde::Deserialize;
use std::fs;

use horiza_core::types::amount_string;
use horiza_core::{Address, Amount, Timestamp};
use horiza_economics::{EmissionPolicy, ProtocolConfig, Roles, ONE_WEEK};

/// An account funded when the daemon starts without persisted state.
#[derive(Debug, Clone, Deserialize)]
pub struct GenesisBalance {
    pub account: Address,
    /// Balance in wei, as a decimal string.
    #[serde(with = "amount_string")]
    pub amount: Amount,
}

/// Runtime configuration for the daemon.
#[derive(Debug, Clone, Deserialize)]
pub struct DaemonConfig {
    /// Directory holding `state.json` and `snapshots/`.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Host address for the RPC server.
    #[serde(default = "default_rpc_host")]
    pub rpc_host: String,

    /// Port for the RPC server.
    #[serde(default = "default_rpc_port")]
    pub rpc_port: u16,

    /// Log level: "trace", "debug", "info", "warn", "error".
    /// `RUST_LOG` takes precedence when set.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Seconds per epoch.
    #[serde(default = "default_epoch_duration")]
    pub epoch_duration: u64,

    /// Unix time of epoch 0. Defaults to the first start.
    #[serde(default)]
    pub genesis_timestamp: Option<Timestamp>,

    #[serde(default = "default_roles")]
    pub roles: Roles,

    #[serde(default)]
    pub emission: EmissionPolicy,

    /// How often the scheduler checks whether an epoch is due.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Advance epochs and distribute emission automatically as the operator.
    #[serde(default = "default_auto_epoch")]
    pub auto_epoch: bool,

    /// Only applied when no persisted state exists.
    #[serde(default)]
    pub genesis_balances: Vec<GenesisBalance>,
}

fn default_data_dir() -> String {
    "~/.horiza/data".to_string()
}

fn default_rpc_host() -> String {
    "127.0.0.1".to_string()
}

fn default_rpc_port() -> u16 {
    50061
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_epoch_duration() -> u64 {
    ONE_WEEK
}

fn default_poll_interval_secs() -> u64 {
    30
}

fn default_auto_epoch() -> bool {
    true
}

/// Development role addresses 0x..01 (operator), 0x..02 (authority) and
/// 0x..03 (team).
fn default_roles() -> Roles {
    let dev = |n: u8| {
        let mut bytes = [0u8; 20];
        bytes[19] = n;
        Address(bytes)
    };
    Roles {
        operator: dev(1),
        authority: dev(2),
        team: dev(3),
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            rpc_host: default_rpc_host(),
            rpc_port: default_rpc_port(),
            log_level: default_log_level(),
            epoch_duration: default_epoch_duration(),
            genesis_timestamp: None,
            roles: default_roles(),
            emission: EmissionPolicy::default(),
            poll_interval_secs: default_poll_interval_secs(),
            auto_epoch: default_auto_epoch(),
            genesis_balances: Vec::new(),
        }
    }
}

impl DaemonConfig {
    /// Load configuration from a TOML file at the given path.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(expand_tilde(path))?;
        let config: DaemonConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Protocol parameters for a fresh engine whose epoch 0 starts at
    /// `genesis_timestamp`, or at `now` when none is configured.
    pub fn protocol_config(&self, now: Timestamp) -> ProtocolConfig {
        ProtocolConfig {
            roles: self.roles,
            epoch_duration: self.epoch_duration,
            genesis_timestamp: self.genesis_timestamp.unwrap_or(now),
            emission: self.emission.clone(),
        }
    }

    pub fn data_dir(&self) -> String {
        expand_tilde(&self.data_dir)
    }
}

/// Expand `~` at the start of a path to the user's home directory.
pub fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return format!("{}/{}", home.display(), rest);
        }
    }
    path.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: DaemonConfig = toml::from_str("").unwrap();
        assert_eq!(config.rpc_port, 50061);
        assert_eq!(config.epoch_duration, ONE_WEEK);
        assert_eq!(config.emission, EmissionPolicy::default());
        assert!(config.auto_epoch);
        assert!(config.genesis_balances.is_empty());
        assert_eq!(config.roles.operator.0[19], 1);
    }

    #[test]
    fn test_full_file() {
        let config: DaemonConfig = toml::from_str(
            r#"
            data_dir = "/var/lib/horiza"
            rpc_port = 6000
            epoch_duration = 60
            genesis_timestamp = 1700000000
            auto_epoch = false

            [roles]
            operator = "0x1111111111111111111111111111111111111111"
            authority = "0x2222222222222222222222222222222222222222"
            team = "0x3333333333333333333333333333333333333333"

            [emission]
            initial_weekly_emission = "1000000000000000000000"
            emission_decay_bps = 50
            team_bps = 300
            holder_bps = 200

            [[genesis_balances]]
            account = "0xa1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1"
            amount = "500000000000000000000000"
            "#,
        )
        .unwrap();

        assert_eq!(config.data_dir(), "/var/lib/horiza");
        assert_eq!(config.emission.team_bps, 300);
        assert_eq!(config.genesis_balances[0].amount, 500_000 * 10u128.pow(18));

        let protocol = config.protocol_config(42);
        assert_eq!(protocol.genesis_timestamp, 1_700_000_000);
        assert_eq!(protocol.epoch_duration, 60);
        assert_eq!(protocol.roles.team, Address([0x33; 20]));
    }

    #[test]
    fn test_genesis_defaults_to_now() {
        let config = DaemonConfig::default();
        assert_eq!(config.protocol_config(1234).genesis_timestamp, 1234);
    }
}
