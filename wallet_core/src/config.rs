//! Client configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use tron_types::NetworkId;

use crate::fee::FeeSchedule;
use crate::WalletError;

/// Configuration for talking to a ledger node.
///
/// Can be loaded from a TOML file via [`ClientConfig::from_toml_file`] or
/// built programmatically (e.g. for tests). Every field has a default.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Which network to use.
    pub network: NetworkId,

    /// Full-node HTTP endpoint. Falls back to the network default when unset.
    pub node_url: Option<String>,

    /// API key sent as the `TRON-PRO-API-KEY` header.
    pub api_key: Option<String>,

    /// Upper bound on a single request, connect included.
    pub timeout_secs: u64,

    pub connect_timeout_secs: u64,

    /// Maximum sun a token transfer may burn for energy.
    pub fee_limit_sun: u64,

    /// Sun burned per bandwidth point when free and staked bandwidth run out.
    pub bandwidth_price_sun: u64,

    /// Sun burned per energy point.
    pub energy_price_sun: u64,

    /// Flat fee charged for creating the recipient account.
    pub account_activation_fee_sun: u64,

    /// Path used when deriving wallets from a mnemonic.
    pub derivation_path: String,

    /// Log format: "human" or "json".
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    pub log_level: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            network: NetworkId::Mainnet,
            node_url: None,
            api_key: None,
            timeout_secs: 30,
            connect_timeout_secs: 10,
            fee_limit_sun: 100_000_000,
            bandwidth_price_sun: 1_000,
            energy_price_sun: 420,
            account_activation_fee_sun: 1_000_000,
            derivation_path: tron_crypto::DEFAULT_DERIVATION_PATH.to_string(),
            log_format: "human".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl ClientConfig {
    /// Configuration for `network` with every other field defaulted.
    pub fn for_network(network: NetworkId) -> Self {
        Self {
            network,
            ..Self::default()
        }
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, WalletError> {
        let config: Self =
            toml::from_str(contents).map_err(|e| WalletError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, WalletError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| WalletError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<(), WalletError> {
        if self.timeout_secs == 0 {
            return Err(WalletError::Config("timeout_secs must be positive".into()));
        }
        if let Some(url) = &self.node_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(WalletError::Config(format!(
                    "node_url must be an http(s) URL, got {url}"
                )));
            }
        }
        self.derivation_path
            .parse::<tron_crypto::DerivationPath>()
            .map_err(|e| WalletError::Config(e.to_string()))?;
        Ok(())
    }

    /// The endpoint requests go to, without a trailing slash.
    pub fn endpoint(&self) -> String {
        self.node_url
            .as_deref()
            .unwrap_or_else(|| self.network.default_endpoint())
            .trim_end_matches('/')
            .to_string()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn fee_schedule(&self) -> FeeSchedule {
        FeeSchedule {
            bandwidth_price_sun: self.bandwidth_price_sun,
            energy_price_sun: self.energy_price_sun,
            account_activation_fee_sun: self.account_activation_fee_sun,
        }
    }
}
