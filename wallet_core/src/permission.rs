//! Account permissions: weighted key sets, thresholds, and capability masks.
//!
//! An account carries one owner permission, an optional witness permission,
//! and up to eight active permissions. Each permission is a set of at most
//! five weighted keys plus a threshold; a transaction is authorized under a
//! permission when the weights of its distinct signers reach the threshold.
//! Active permissions additionally restrict which operations they may sign
//! through a 256-bit capability mask.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use tron_types::Address;

use crate::service::LedgerService;
use crate::transaction::UnsignedTransaction;
use crate::WalletError;

/// Maximum number of keys in a single permission.
pub const MAX_PERMISSION_KEYS: usize = 5;

/// Maximum number of active permissions on one account.
pub const MAX_ACTIVE_PERMISSIONS: usize = 8;

pub const OWNER_PERMISSION_ID: i32 = 0;
pub const WITNESS_PERMISSION_ID: i32 = 1;
/// Active permissions are numbered from here upwards in request order.
pub const FIRST_ACTIVE_PERMISSION_ID: i32 = 2;

/// Revision of the capability table below. Bump when an index changes.
pub const CAPABILITY_TABLE_VERSION: u32 = 1;

// ── Capabilities ────────────────────────────────────────────────────────

/// A named operation type that an active permission may be allowed to sign.
///
/// Indices are fixed by the ledger's contract-type enumeration and must not
/// be renumbered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Capability {
    AccountCreate,
    Transfer,
    TransferAsset,
    VoteAsset,
    VoteWitness,
    WitnessCreate,
    AssetIssue,
    WitnessUpdate,
    ParticipateAssetIssue,
    AccountUpdate,
    FreezeBalance,
    UnfreezeBalance,
    WithdrawBalance,
    UnfreezeAsset,
    UpdateAsset,
    ProposalCreate,
    ProposalApprove,
    ProposalDelete,
    SetAccountId,
    Custom,
    CreateSmartContract,
    TriggerSmartContract,
    GetContract,
    UpdateSetting,
    ExchangeCreate,
    ExchangeInject,
    ExchangeWithdraw,
    ExchangeTransaction,
    UpdateEnergyLimit,
    AccountPermissionUpdate,
    ClearAbi,
    UpdateBrokerage,
    ShieldedTransfer,
    MarketSellAsset,
    MarketCancelOrder,
    FreezeBalanceV2,
    UnfreezeBalanceV2,
    WithdrawExpireUnfreeze,
    DelegateResource,
    UnDelegateResource,
    CancelAllUnfreezeV2,
}

impl Capability {
    pub const ALL: [Capability; 41] = [
        Self::AccountCreate,
        Self::Transfer,
        Self::TransferAsset,
        Self::VoteAsset,
        Self::VoteWitness,
        Self::WitnessCreate,
        Self::AssetIssue,
        Self::WitnessUpdate,
        Self::ParticipateAssetIssue,
        Self::AccountUpdate,
        Self::FreezeBalance,
        Self::UnfreezeBalance,
        Self::WithdrawBalance,
        Self::UnfreezeAsset,
        Self::UpdateAsset,
        Self::ProposalCreate,
        Self::ProposalApprove,
        Self::ProposalDelete,
        Self::SetAccountId,
        Self::Custom,
        Self::CreateSmartContract,
        Self::TriggerSmartContract,
        Self::GetContract,
        Self::UpdateSetting,
        Self::ExchangeCreate,
        Self::ExchangeInject,
        Self::ExchangeWithdraw,
        Self::ExchangeTransaction,
        Self::UpdateEnergyLimit,
        Self::AccountPermissionUpdate,
        Self::ClearAbi,
        Self::UpdateBrokerage,
        Self::ShieldedTransfer,
        Self::MarketSellAsset,
        Self::MarketCancelOrder,
        Self::FreezeBalanceV2,
        Self::UnfreezeBalanceV2,
        Self::WithdrawExpireUnfreeze,
        Self::DelegateResource,
        Self::UnDelegateResource,
        Self::CancelAllUnfreezeV2,
    ];

    /// The capabilities granted by [`standard_co_signed_update`].
    pub const STANDARD_SET: [Capability; 29] = [
        Self::AccountCreate,
        Self::Transfer,
        Self::TransferAsset,
        Self::VoteAsset,
        Self::VoteWitness,
        Self::WitnessCreate,
        Self::AssetIssue,
        Self::WitnessUpdate,
        Self::ParticipateAssetIssue,
        Self::AccountUpdate,
        Self::FreezeBalance,
        Self::UnfreezeBalance,
        Self::WithdrawBalance,
        Self::UnfreezeAsset,
        Self::UpdateAsset,
        Self::ProposalCreate,
        Self::ProposalApprove,
        Self::ProposalDelete,
        Self::SetAccountId,
        Self::Custom,
        Self::CreateSmartContract,
        Self::TriggerSmartContract,
        Self::GetContract,
        Self::UpdateSetting,
        Self::ExchangeCreate,
        Self::ExchangeInject,
        Self::ExchangeWithdraw,
        Self::ExchangeTransaction,
        Self::UpdateEnergyLimit,
    ];

    /// Bit index of this capability in an [`OperationMask`].
    pub fn index(self) -> u8 {
        match self {
            Self::AccountCreate => 0,
            Self::Transfer => 1,
            Self::TransferAsset => 2,
            Self::VoteAsset => 3,
            Self::VoteWitness => 4,
            Self::WitnessCreate => 5,
            Self::AssetIssue => 6,
            Self::WitnessUpdate => 8,
            Self::ParticipateAssetIssue => 9,
            Self::AccountUpdate => 10,
            Self::FreezeBalance => 11,
            Self::UnfreezeBalance => 12,
            Self::WithdrawBalance => 13,
            Self::UnfreezeAsset => 14,
            Self::UpdateAsset => 15,
            Self::ProposalCreate => 16,
            Self::ProposalApprove => 17,
            Self::ProposalDelete => 18,
            Self::SetAccountId => 19,
            Self::Custom => 20,
            Self::CreateSmartContract => 30,
            Self::TriggerSmartContract => 31,
            Self::GetContract => 32,
            Self::UpdateSetting => 33,
            Self::ExchangeCreate => 41,
            Self::ExchangeInject => 42,
            Self::ExchangeWithdraw => 43,
            Self::ExchangeTransaction => 44,
            Self::UpdateEnergyLimit => 45,
            Self::AccountPermissionUpdate => 46,
            Self::ClearAbi => 48,
            Self::UpdateBrokerage => 49,
            Self::ShieldedTransfer => 51,
            Self::MarketSellAsset => 52,
            Self::MarketCancelOrder => 53,
            Self::FreezeBalanceV2 => 54,
            Self::UnfreezeBalanceV2 => 55,
            Self::WithdrawExpireUnfreeze => 56,
            Self::DelegateResource => 57,
            Self::UnDelegateResource => 58,
            Self::CancelAllUnfreezeV2 => 59,
        }
    }

    /// The ledger's name for this operation type.
    pub fn name(self) -> &'static str {
        match self {
            Self::AccountCreate => "AccountCreateContract",
            Self::Transfer => "TransferContract",
            Self::TransferAsset => "TransferAssetContract",
            Self::VoteAsset => "VoteAssetContract",
            Self::VoteWitness => "VoteWitnessContract",
            Self::WitnessCreate => "WitnessCreateContract",
            Self::AssetIssue => "AssetIssueContract",
            Self::WitnessUpdate => "WitnessUpdateContract",
            Self::ParticipateAssetIssue => "ParticipateAssetIssueContract",
            Self::AccountUpdate => "AccountUpdateContract",
            Self::FreezeBalance => "FreezeBalanceContract",
            Self::UnfreezeBalance => "UnfreezeBalanceContract",
            Self::WithdrawBalance => "WithdrawBalanceContract",
            Self::UnfreezeAsset => "UnfreezeAssetContract",
            Self::UpdateAsset => "UpdateAssetContract",
            Self::ProposalCreate => "ProposalCreateContract",
            Self::ProposalApprove => "ProposalApproveContract",
            Self::ProposalDelete => "ProposalDeleteContract",
            Self::SetAccountId => "SetAccountIdContract",
            Self::Custom => "CustomContract",
            Self::CreateSmartContract => "CreateSmartContract",
            Self::TriggerSmartContract => "TriggerSmartContract",
            Self::GetContract => "GetContract",
            Self::UpdateSetting => "UpdateSettingContract",
            Self::ExchangeCreate => "ExchangeCreateContract",
            Self::ExchangeInject => "ExchangeInjectContract",
            Self::ExchangeWithdraw => "ExchangeWithdrawContract",
            Self::ExchangeTransaction => "ExchangeTransactionContract",
            Self::UpdateEnergyLimit => "UpdateEnergyLimitContract",
            Self::AccountPermissionUpdate => "AccountPermissionUpdateContract",
            Self::ClearAbi => "ClearABIContract",
            Self::UpdateBrokerage => "UpdateBrokerageContract",
            Self::ShieldedTransfer => "ShieldedTransferContract",
            Self::MarketSellAsset => "MarketSellAssetContract",
            Self::MarketCancelOrder => "MarketCancelOrderContract",
            Self::FreezeBalanceV2 => "FreezeBalanceV2Contract",
            Self::UnfreezeBalanceV2 => "UnfreezeBalanceV2Contract",
            Self::WithdrawExpireUnfreeze => "WithdrawExpireUnfreezeContract",
            Self::DelegateResource => "DelegateResourceContract",
            Self::UnDelegateResource => "UnDelegateResourceContract",
            Self::CancelAllUnfreezeV2 => "CancelAllUnfreezeV2Contract",
        }
    }

    /// Look a capability up by its ledger name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|cap| cap.name() == name)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── OperationMask ───────────────────────────────────────────────────────

/// A 256-bit capability mask, serialized as a 32-byte big-endian integer.
///
/// Capability index `i` is bit `i % 8` of byte `31 - i / 8`, so index 0 is
/// the least-significant bit of the last byte.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct OperationMask([u8; 32]);

impl OperationMask {
    pub const LEN: usize = 32;

    pub fn empty() -> Self {
        Self([0u8; Self::LEN])
    }

    pub fn from_bytes(bytes: [u8; Self::LEN]) -> Self {
        Self(bytes)
    }

    pub fn from_capabilities(capabilities: impl IntoIterator<Item = Capability>) -> Self {
        let mut mask = Self::empty();
        for cap in capabilities {
            mask.insert(cap.index());
        }
        mask
    }

    pub fn insert(&mut self, index: u8) {
        let (byte, bit) = Self::position(index);
        self.0[byte] |= 1 << bit;
    }

    pub fn contains(&self, index: u8) -> bool {
        let (byte, bit) = Self::position(index);
        self.0[byte] & (1 << bit) != 0
    }

    pub fn allows(&self, capability: Capability) -> bool {
        self.contains(capability.index())
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    pub fn as_bytes(&self) -> &[u8; Self::LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    fn position(index: u8) -> (usize, u8) {
        (Self::LEN - 1 - usize::from(index / 8), index % 8)
    }
}

impl fmt::Debug for OperationMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OperationMask({})", self.to_hex())
    }
}

// ── Permission ──────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionKind {
    Owner,
    Witness,
    Active,
}

impl PermissionKind {
    /// Numeric code used on the wire.
    pub fn code(self) -> i32 {
        match self {
            Self::Owner => 0,
            Self::Witness => 1,
            Self::Active => 2,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WeightedKey {
    pub address: Address,
    pub weight: i64,
}

/// A validated permission. Construct through [`build_permission`] or
/// [`Permission::single_key_owner`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Permission {
    kind: PermissionKind,
    id: i32,
    name: String,
    threshold: i64,
    operations: Option<OperationMask>,
    keys: Vec<WeightedKey>,
}

impl Permission {
    /// The permission every fresh account starts with: its own key, weight 1,
    /// threshold 1.
    pub fn single_key_owner(address: Address) -> Self {
        Self {
            kind: PermissionKind::Owner,
            id: OWNER_PERMISSION_ID,
            name: "owner".to_string(),
            threshold: 1,
            operations: None,
            keys: vec![WeightedKey { address, weight: 1 }],
        }
    }

    pub fn kind(&self) -> PermissionKind {
        self.kind
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn threshold(&self) -> i64 {
        self.threshold
    }

    pub fn operations(&self) -> Option<&OperationMask> {
        self.operations.as_ref()
    }

    pub fn keys(&self) -> &[WeightedKey] {
        &self.keys
    }

    /// Sum of all key weights, saturating at `i64::MAX`.
    pub fn total_weight(&self) -> i64 {
        self.keys
            .iter()
            .fold(0i64, |acc, k| acc.saturating_add(k.weight))
    }

    /// Combined weight of the distinct `signers` that hold a key here.
    pub fn signed_weight(&self, signers: &[Address]) -> i64 {
        let distinct: HashSet<&Address> = signers.iter().collect();
        self.keys
            .iter()
            .filter(|k| distinct.contains(&k.address))
            .fold(0i64, |acc, k| acc.saturating_add(k.weight))
    }

    pub fn is_satisfied_by(&self, signers: &[Address]) -> bool {
        self.signed_weight(signers) >= self.threshold
    }

    /// Whether this permission may sign `capability`. Permissions without a
    /// mask (owner and witness) may sign anything.
    pub fn allows(&self, capability: Capability) -> bool {
        self.operations.map_or(true, |mask| mask.allows(capability))
    }

    /// JSON shape accepted by the node's permission-update endpoint.
    pub fn to_json(&self) -> serde_json::Value {
        let keys: Vec<serde_json::Value> = self
            .keys
            .iter()
            .map(|k| serde_json::json!({ "address": k.address.to_hex(), "weight": k.weight }))
            .collect();
        let mut value = serde_json::json!({
            "type": self.kind.code(),
            "id": self.id,
            "permission_name": self.name,
            "threshold": self.threshold,
            "keys": keys,
        });
        if let (Some(mask), Some(obj)) = (&self.operations, value.as_object_mut()) {
            obj.insert("operations".into(), serde_json::json!(mask.to_hex()));
        }
        value
    }
}

// ── Requests ────────────────────────────────────────────────────────────

/// One key entry of a permission request. `address` is base58check text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySpec {
    pub address: String,
    pub weight: i64,
}

impl KeySpec {
    pub fn new(address: impl Into<String>, weight: i64) -> Self {
        Self {
            address: address.into(),
            weight,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerPermissionSpec {
    pub threshold: i64,
    pub keys: Vec<KeySpec>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WitnessPermissionSpec {
    pub threshold: i64,
    pub keys: Vec<KeySpec>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivePermissionSpec {
    pub name: String,
    pub threshold: i64,
    /// Capability name to granted flag. Only `true` entries set a bit.
    #[serde(default)]
    pub operations: BTreeMap<String, bool>,
    pub keys: Vec<KeySpec>,
}

impl ActivePermissionSpec {
    /// A request granting exactly `capabilities`.
    pub fn granting(
        name: impl Into<String>,
        threshold: i64,
        capabilities: &[Capability],
        keys: Vec<KeySpec>,
    ) -> Self {
        Self {
            name: name.into(),
            threshold,
            operations: capabilities
                .iter()
                .map(|cap| (cap.name().to_string(), true))
                .collect(),
            keys,
        }
    }
}

/// A full permission layout for one account, as written in a TOML file:
///
/// ```toml
/// [owner]
/// threshold = 2
/// keys = [{ address = "T...", weight = 1 }, { address = "T...", weight = 1 }]
///
/// [[actives]]
/// name = "payments"
/// threshold = 1
/// operations = { TransferContract = true }
/// keys = [{ address = "T...", weight = 1 }]
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSet {
    pub owner: OwnerPermissionSpec,
    #[serde(default)]
    pub witness: Option<WitnessPermissionSpec>,
    #[serde(default)]
    pub actives: Vec<ActivePermissionSpec>,
}

impl PermissionSet {
    pub fn from_toml_str(contents: &str) -> Result<Self, WalletError> {
        toml::from_str(contents).map_err(|e| WalletError::Config(e.to_string()))
    }
}

/// Build and validate a single permission.
///
/// Checks run in this order: key count, then each key's address, weight
/// and uniqueness, then the names of enabled capabilities, then the
/// threshold. Disabled entries are ignored whatever their name. An empty
/// `operations` map produces a permission without a mask; a non-empty map
/// whose entries are all `false` produces an all-zero mask.
pub fn build_permission(
    name: &str,
    kind: PermissionKind,
    id: i32,
    threshold: i64,
    operations: &BTreeMap<String, bool>,
    keys: &[KeySpec],
) -> Result<Permission, WalletError> {
    if keys.len() > MAX_PERMISSION_KEYS {
        return Err(WalletError::TooManyKeys {
            max: MAX_PERMISSION_KEYS,
            actual: keys.len(),
        });
    }

    let mut weighted = Vec::with_capacity(keys.len());
    let mut seen = HashSet::with_capacity(keys.len());
    let mut total_weight: i64 = 0;
    for key in keys {
        let address = tron_crypto::from_base58(&key.address)?;
        if key.weight <= 0 {
            return Err(WalletError::InvalidWeight {
                address: key.address.clone(),
                weight: key.weight,
            });
        }
        if !seen.insert(address) {
            return Err(WalletError::DuplicateKey(key.address.clone()));
        }
        total_weight = total_weight.saturating_add(key.weight);
        weighted.push(WeightedKey {
            address,
            weight: key.weight,
        });
    }

    let mask = if operations.is_empty() {
        None
    } else {
        let mut mask = OperationMask::empty();
        for (op, granted) in operations {
            if *granted {
                let cap = Capability::from_name(op)
                    .ok_or_else(|| WalletError::UnknownCapability(op.clone()))?;
                mask.insert(cap.index());
            }
        }
        Some(mask)
    };

    if threshold <= 0 {
        return Err(WalletError::InvalidThreshold(threshold));
    }
    if threshold > total_weight {
        return Err(WalletError::ThresholdUnreachable {
            threshold,
            total_weight,
        });
    }

    Ok(Permission {
        kind,
        id,
        name: name.to_string(),
        threshold,
        operations: mask,
        keys: weighted,
    })
}

/// A complete, validated permission-update request for one account.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PermissionUpdate {
    pub owner_address: Address,
    pub owner: Permission,
    pub witness: Option<Permission>,
    pub actives: Vec<Permission>,
}

impl PermissionUpdate {
    /// Request body for the node's permission-update endpoint.
    pub fn to_json(&self) -> serde_json::Value {
        let mut body = serde_json::json!({
            "owner_address": self.owner_address.to_hex(),
            "owner": self.owner.to_json(),
            "actives": self.actives.iter().map(Permission::to_json).collect::<Vec<_>>(),
            "visible": false,
        });
        if let (Some(witness), Some(obj)) = (&self.witness, body.as_object_mut()) {
            obj.insert("witness".into(), witness.to_json());
        }
        body
    }
}

/// Validate a full permission set. Active permissions get ids 2, 3, ... in
/// the order given.
pub fn build_permission_update(
    owner_address: &str,
    owner: &OwnerPermissionSpec,
    witness: Option<&WitnessPermissionSpec>,
    actives: &[ActivePermissionSpec],
) -> Result<PermissionUpdate, WalletError> {
    if actives.len() > MAX_ACTIVE_PERMISSIONS {
        return Err(WalletError::TooManyActivePermissions {
            max: MAX_ACTIVE_PERMISSIONS,
            actual: actives.len(),
        });
    }
    let owner_address = tron_crypto::from_base58(owner_address)?;
    let no_ops = BTreeMap::new();

    let owner = build_permission(
        "owner",
        PermissionKind::Owner,
        OWNER_PERMISSION_ID,
        owner.threshold,
        &no_ops,
        &owner.keys,
    )?;

    let witness = witness
        .map(|w| {
            build_permission(
                "witness",
                PermissionKind::Witness,
                WITNESS_PERMISSION_ID,
                w.threshold,
                &no_ops,
                &w.keys,
            )
        })
        .transpose()?;

    let actives = actives
        .iter()
        .zip(FIRST_ACTIVE_PERMISSION_ID..)
        .map(|(active, id)| {
            build_permission(
                &active.name,
                PermissionKind::Active,
                id,
                active.threshold,
                &active.operations,
                &active.keys,
            )
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(PermissionUpdate {
        owner_address,
        owner,
        witness,
        actives,
    })
}

/// Validate the permission set locally, then ask the ledger service for
/// the unsigned update transaction.
pub fn update_account_permission(
    service: &impl LedgerService,
    owner_address: &str,
    owner: &OwnerPermissionSpec,
    witness: Option<&WitnessPermissionSpec>,
    actives: &[ActivePermissionSpec],
) -> Result<UnsignedTransaction, WalletError> {
    let update = build_permission_update(owner_address, owner, witness, actives)?;
    tracing::debug!(
        owner = %owner_address,
        actives = update.actives.len(),
        witness = update.witness.is_some(),
        "requesting permission update"
    );
    service.submit_permission_update(&update)?.into_transaction()
}

/// The 2-of-2 layout used by `Wallet::update_permission`: the account and
/// `co_signer` each hold weight 1 in both the owner permission and an
/// active permission named "active" granting [`Capability::STANDARD_SET`].
pub fn standard_co_signed_update(
    owner_address: &str,
    co_signer: &str,
) -> (OwnerPermissionSpec, ActivePermissionSpec) {
    let keys = vec![KeySpec::new(owner_address, 1), KeySpec::new(co_signer, 1)];
    let owner = OwnerPermissionSpec {
        threshold: 2,
        keys: keys.clone(),
    };
    let active = ActivePermissionSpec::granting("active", 2, &Capability::STANDARD_SET, keys);
    (owner, active)
}
