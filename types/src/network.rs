//! Network identifier.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifies which TRON network a wallet talks to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkId {
    /// The production network.
    #[default]
    Mainnet,
    /// The Shasta public test network.
    Shasta,
    /// The Nile public test network.
    Nile,
}

impl NetworkId {
    /// Default full-node HTTP endpoint for this network.
    pub fn default_endpoint(&self) -> &'static str {
        match self {
            Self::Mainnet => "https://api.trongrid.io",
            Self::Shasta => "https://api.shasta.trongrid.io",
            Self::Nile => "https://nile.trongrid.io",
        }
    }

    /// Human-readable name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Shasta => "shasta",
            Self::Nile => "nile",
        }
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NetworkId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" | "main" | "live" => Ok(Self::Mainnet),
            "shasta" => Ok(Self::Shasta),
            "nile" => Ok(Self::Nile),
            other => Err(format!("unknown network: {other}")),
        }
    }
}
