//! HTTP client for a full node's `/wallet/*` API.

use serde::Deserialize;
use serde_json::{json, Value};
use tron_types::Address;

use crate::config::ClientConfig;
use crate::fee::{transaction_bandwidth, FeeSchedule};
use crate::permission::PermissionUpdate;
use crate::service::{ensure_account_matches, AccountInfo, AccountResources, LedgerService};
use crate::token::{self, BALANCE_OF_SIGNATURE, TRANSFER_SIGNATURE};
use crate::transaction::{
    BroadcastResult, SignedTransaction, TransactionEnvelope, UnsignedTransaction,
};
use crate::WalletError;

/// Blocking HTTP client implementing [`LedgerService`].
///
/// Addresses are sent as hex with `visible: false`. Every request shares
/// the timeouts from [`ClientConfig`].
#[derive(Clone)]
pub struct HttpLedgerClient {
    http: reqwest::blocking::Client,
    endpoint: String,
    fee_limit_sun: u64,
    fees: FeeSchedule,
}

impl HttpLedgerClient {
    pub fn new(config: &ClientConfig) -> Result<Self, WalletError> {
        config.validate()?;
        let mut headers = reqwest::header::HeaderMap::new();
        if let Some(key) = &config.api_key {
            let value = reqwest::header::HeaderValue::from_str(key)
                .map_err(|e| WalletError::Config(format!("invalid api_key: {e}")))?;
            headers.insert("TRON-PRO-API-KEY", value);
        }
        let http = reqwest::blocking::Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| WalletError::Transport(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            http,
            endpoint: config.endpoint(),
            fee_limit_sun: config.fee_limit_sun,
            fees: config.fee_schedule(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// POST `body` to `path` and return the parsed JSON reply.
    fn post(&self, path: &str, body: Value) -> Result<Value, WalletError> {
        let url = format!("{}{}", self.endpoint, path);
        tracing::debug!(%url, "node request");

        let response = self.http.post(&url).json(&body).send().map_err(|e| {
            if e.is_timeout() {
                WalletError::Timeout(format!("{path}: {e}"))
            } else {
                WalletError::Transport(format!("{path}: {e}"))
            }
        })?;

        if !response.status().is_success() {
            return Err(WalletError::Node(format!(
                "{path} returned HTTP {}",
                response.status()
            )));
        }

        let json: Value = response.json().map_err(|e| {
            if e.is_timeout() {
                WalletError::Timeout(format!("{path}: {e}"))
            } else {
                WalletError::Node(format!("{path}: invalid JSON response: {e}"))
            }
        })?;

        if let Some(err) = json.get("Error").and_then(Value::as_str) {
            return Err(WalletError::rejected("ERROR", err));
        }
        Ok(json)
    }

    fn trigger(&self, path: &str, body: Value) -> Result<TriggerReply, WalletError> {
        let reply = self.post(path, body)?;
        serde_json::from_value(reply)
            .map_err(|e| WalletError::Node(format!("{path}: unexpected response: {e}")))
    }

    fn token_call_body(
        &self,
        from: &Address,
        token: &Address,
        signature: &str,
        parameters: &[u8],
    ) -> Value {
        json!({
            "owner_address": from.to_hex(),
            "contract_address": token.to_hex(),
            "function_selector": signature,
            "parameter": hex::encode(parameters),
            "fee_limit": self.fee_limit_sun,
            "call_value": 0,
            "visible": false,
        })
    }

    fn recipient_exists(&self, to: &Address) -> Result<bool, WalletError> {
        match self.get_account(to) {
            Ok(_) => Ok(true),
            Err(WalletError::AccountNotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

impl LedgerService for HttpLedgerClient {
    fn get_account(&self, address: &Address) -> Result<AccountInfo, WalletError> {
        let reply = self.post(
            "/wallet/getaccount",
            json!({ "address": address.to_hex(), "visible": false }),
        )?;
        let record: AccountRecord = serde_json::from_value(reply)
            .map_err(|e| WalletError::Node(format!("getaccount: unexpected response: {e}")))?;
        let returned = record
            .address
            .as_deref()
            .and_then(Address::from_hex)
            .ok_or_else(|| WalletError::AccountNotFound(tron_crypto::to_base58(address)))?;
        ensure_account_matches(
            address,
            AccountInfo {
                address: returned,
                balance: record.balance,
            },
        )
    }

    fn get_account_resources(&self, address: &Address) -> Result<AccountResources, WalletError> {
        let reply = self.post(
            "/wallet/getaccountresource",
            json!({ "address": address.to_hex(), "visible": false }),
        )?;
        let record: ResourceRecord = serde_json::from_value(reply).map_err(|e| {
            WalletError::Node(format!("getaccountresource: unexpected response: {e}"))
        })?;
        Ok(AccountResources {
            free_net_used: record.free_net_used,
            free_net_limit: record.free_net_limit,
            net_used: record.net_used,
            net_limit: record.net_limit,
            energy_used: record.energy_used,
            energy_limit: record.energy_limit,
        })
    }

    fn build_unsigned_transfer(
        &self,
        from: &Address,
        to: &Address,
        amount: u64,
    ) -> Result<UnsignedTransaction, WalletError> {
        let reply = self.post(
            "/wallet/createtransaction",
            json!({
                "owner_address": from.to_hex(),
                "to_address": to.to_hex(),
                "amount": amount,
                "visible": false,
            }),
        )?;
        parse_transaction(&reply)
    }

    fn build_unsigned_token_transfer(
        &self,
        from: &Address,
        token: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<UnsignedTransaction, WalletError> {
        let body = self.token_call_body(
            from,
            token,
            TRANSFER_SIGNATURE,
            &token::transfer_parameters(to, amount),
        );
        self.trigger("/wallet/triggersmartcontract", body)?
            .into_envelope()?
            .into_transaction()
    }

    fn token_balance(&self, token: &Address, owner: &Address) -> Result<u128, WalletError> {
        let body = self.token_call_body(
            owner,
            token,
            BALANCE_OF_SIGNATURE,
            &token::address_word(owner),
        );
        let reply = self.trigger("/wallet/triggerconstantcontract", body)?;
        reply.check()?;
        let word = reply
            .constant_result
            .first()
            .ok_or_else(|| WalletError::Node("balanceOf returned no value".into()))?;
        token::decode_balance(word)
    }

    fn estimate_transfer_fee(
        &self,
        from: &Address,
        to: &Address,
        amount: u64,
    ) -> Result<u64, WalletError> {
        let tx = self.build_unsigned_transfer(from, to, amount)?;
        let resources = self.get_account_resources(from)?;
        let bandwidth = transaction_bandwidth(tx.raw_data_bytes().len(), 1);
        let exists = self.recipient_exists(to)?;
        let fee = self.fees.transfer_fee(bandwidth, &resources, exists);
        tracing::debug!(bandwidth, recipient_exists = exists, fee, "estimated transfer fee");
        Ok(fee)
    }

    fn estimate_token_transfer_fee(
        &self,
        from: &Address,
        token: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<u64, WalletError> {
        let body = self.token_call_body(
            from,
            token,
            TRANSFER_SIGNATURE,
            &token::transfer_parameters(to, amount),
        );
        let simulated = self.trigger("/wallet/triggerconstantcontract", body)?;
        simulated.check()?;
        let energy = simulated.energy_used;

        let tx = self.build_unsigned_token_transfer(from, token, to, amount)?;
        let bandwidth = transaction_bandwidth(tx.raw_data_bytes().len(), 1);
        let resources = self.get_account_resources(from)?;
        let fee = self.fees.contract_call_fee(bandwidth, energy, &resources);
        tracing::debug!(bandwidth, energy, fee, "estimated token transfer fee");
        Ok(fee)
    }

    fn submit_permission_update(
        &self,
        update: &PermissionUpdate,
    ) -> Result<TransactionEnvelope, WalletError> {
        let reply = self.post("/wallet/accountpermissionupdate", update.to_json())?;
        if is_empty_object(&reply) {
            return Ok(TransactionEnvelope::accepted(None));
        }
        Ok(TransactionEnvelope::success(parse_transaction(&reply)?))
    }

    fn broadcast(&self, tx: &SignedTransaction) -> Result<BroadcastResult, WalletError> {
        let reply = self.post("/wallet/broadcasttransaction", tx.to_json())?;
        let record: BroadcastRecord = serde_json::from_value(reply).map_err(|e| {
            WalletError::Node(format!("broadcasttransaction: unexpected response: {e}"))
        })?;
        if record.result {
            return Ok(BroadcastResult::accepted());
        }
        Ok(BroadcastResult::rejected(
            record.code.unwrap_or_else(|| "UNKNOWN".to_string()),
            record.message.as_deref().map(decode_message).unwrap_or_default(),
        ))
    }
}

fn is_empty_object(value: &Value) -> bool {
    value.as_object().map_or(true, |obj| obj.is_empty())
}

/// Parse `{txID, raw_data, raw_data_hex}` and verify the id.
fn parse_transaction(value: &Value) -> Result<UnsignedTransaction, WalletError> {
    if is_empty_object(value) {
        return Err(WalletError::EmptyTransaction);
    }
    let claimed = value
        .get("txID")
        .and_then(Value::as_str)
        .ok_or_else(|| WalletError::Node("transaction is missing txID".into()))?;
    let raw_hex = value
        .get("raw_data_hex")
        .and_then(Value::as_str)
        .ok_or_else(|| WalletError::Node("transaction is missing raw_data_hex".into()))?;
    let raw_data = value.get("raw_data").cloned().unwrap_or(Value::Null);
    UnsignedTransaction::with_claimed_txid(raw_data, raw_hex, claimed)
}

/// Node messages are usually hex-encoded UTF-8.
fn decode_message(message: &str) -> String {
    hex::decode(message)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .unwrap_or_else(|| message.to_string())
}

// ── Response shapes ─────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct AccountRecord {
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    balance: u64,
}

#[derive(Debug, Deserialize)]
struct ResourceRecord {
    #[serde(rename = "freeNetUsed", default)]
    free_net_used: u64,
    #[serde(rename = "freeNetLimit", default)]
    free_net_limit: u64,
    #[serde(rename = "NetUsed", default)]
    net_used: u64,
    #[serde(rename = "NetLimit", default)]
    net_limit: u64,
    #[serde(rename = "EnergyUsed", default)]
    energy_used: u64,
    #[serde(rename = "EnergyLimit", default)]
    energy_limit: u64,
}

#[derive(Debug, Default, Deserialize)]
struct CallResult {
    #[serde(default)]
    result: bool,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TriggerReply {
    #[serde(default)]
    result: CallResult,
    #[serde(default)]
    transaction: Option<Value>,
    #[serde(default)]
    constant_result: Vec<String>,
    #[serde(default)]
    energy_used: u64,
}

impl TriggerReply {
    fn check(&self) -> Result<(), WalletError> {
        if self.result.result {
            return Ok(());
        }
        Err(WalletError::rejected(
            self.result.code.clone().unwrap_or_else(|| "UNKNOWN".to_string()),
            self.result
                .message
                .as_deref()
                .map(decode_message)
                .unwrap_or_default(),
        ))
    }

    fn into_envelope(self) -> Result<TransactionEnvelope, WalletError> {
        if let Err(WalletError::RemoteRejected { code, message }) = self.check() {
            return Ok(TransactionEnvelope::rejected(code, message));
        }
        let transaction = match self.transaction {
            Some(tx) if !is_empty_object(&tx) => Some(parse_transaction(&tx)?),
            _ => None,
        };
        Ok(TransactionEnvelope::accepted(transaction))
    }
}

#[derive(Debug, Deserialize)]
struct BroadcastRecord {
    #[serde(default)]
    result: bool,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}
