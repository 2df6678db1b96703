//! Fee arithmetic for bandwidth and energy.
//!
//! A transaction consumes one bandwidth point per serialized byte. When the
//! sender's free and staked bandwidth cannot cover the whole transaction,
//! the full amount is paid by burning balance. Energy is burned only for
//! the part the account cannot cover.

use serde::{Deserialize, Serialize};

use crate::service::AccountResources;

/// Bandwidth added per signature.
pub const SIGNATURE_BANDWIDTH: u64 = 65;

/// Bandwidth for the result and protobuf framing added by the node.
pub const RESULT_BANDWIDTH: u64 = 64;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    pub bandwidth_price_sun: u64,
    pub energy_price_sun: u64,
    pub account_activation_fee_sun: u64,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            bandwidth_price_sun: 1_000,
            energy_price_sun: 420,
            account_activation_fee_sun: 1_000_000,
        }
    }
}

/// Bandwidth a transaction of `raw_len` bytes uses once signed.
pub fn transaction_bandwidth(raw_len: usize, signatures: usize) -> u64 {
    raw_len as u64 + SIGNATURE_BANDWIDTH * signatures as u64 + RESULT_BANDWIDTH
}

impl FeeSchedule {
    pub fn bandwidth_fee(&self, required: u64, resources: &AccountResources) -> u64 {
        if resources.available_bandwidth() >= required {
            0
        } else {
            required.saturating_mul(self.bandwidth_price_sun)
        }
    }

    pub fn energy_fee(&self, required: u64, resources: &AccountResources) -> u64 {
        required
            .saturating_sub(resources.available_energy())
            .saturating_mul(self.energy_price_sun)
    }

    /// Fee for a native transfer. Creating the recipient costs extra.
    pub fn transfer_fee(
        &self,
        bandwidth: u64,
        resources: &AccountResources,
        recipient_exists: bool,
    ) -> u64 {
        let activation = if recipient_exists {
            0
        } else {
            self.account_activation_fee_sun
        };
        self.bandwidth_fee(bandwidth, resources)
            .saturating_add(activation)
    }

    /// Fee for a contract call.
    pub fn contract_call_fee(
        &self,
        bandwidth: u64,
        energy: u64,
        resources: &AccountResources,
    ) -> u64 {
        self.bandwidth_fee(bandwidth, resources)
            .saturating_add(self.energy_fee(energy, resources))
    }
}
