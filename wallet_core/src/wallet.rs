//! Core wallet struct: one key pair plus the operations it can sign.

use tron_crypto::DerivationPath;
use tron_types::{Address, KeyPair};

use crate::multisig;
use crate::permission::{
    self, standard_co_signed_update, ActivePermissionSpec, OwnerPermissionSpec,
    WitnessPermissionSpec,
};
use crate::service::LedgerService;
use crate::token::Token;
use crate::transaction::broadcast_signed;
use crate::WalletError;

/// A wallet bound to a single secp256k1 key pair.
///
/// Holds no connection state: every operation that talks to the ledger
/// takes the [`LedgerService`] to use.
pub struct Wallet {
    keys: KeyPair,
    address: Address,
}

impl Wallet {
    /// Create a new wallet with a fresh random key.
    pub fn generate() -> Result<Self, WalletError> {
        Self::from_keypair(tron_crypto::generate_keypair()?)
    }

    /// Restore a wallet from a 64-hex-digit private key.
    pub fn from_private_key_hex(private_key: &str) -> Result<Self, WalletError> {
        Self::from_keypair(tron_crypto::keypair_from_hex(private_key)?)
    }

    /// Derive a wallet from a BIP-39 mnemonic along `path`.
    pub fn from_mnemonic(
        mnemonic: &str,
        path: &str,
        passphrase: &str,
    ) -> Result<Self, WalletError> {
        Self::from_keypair(tron_crypto::keypair_from_mnemonic(mnemonic, path, passphrase)?)
    }

    /// Derive a wallet from a BIP-39 seed along `path`.
    pub fn from_seed(seed: &[u8], path: &DerivationPath) -> Result<Self, WalletError> {
        Self::from_keypair(tron_crypto::keypair_from_seed(seed, path)?)
    }

    pub fn from_keypair(keys: KeyPair) -> Result<Self, WalletError> {
        let address = tron_crypto::address_from_public_key(&keys.public)?;
        Ok(Self { keys, address })
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Address in base58check form, e.g. `T...`.
    pub fn address_base58(&self) -> String {
        tron_crypto::to_base58(&self.address)
    }

    pub fn address_hex(&self) -> String {
        self.address.to_hex()
    }

    pub fn public_key_hex(&self) -> String {
        self.keys.public.to_hex()
    }

    pub fn private_key_hex(&self) -> String {
        self.keys.private.to_hex()
    }

    pub fn keys(&self) -> &KeyPair {
        &self.keys
    }

    /// Native balance in sun.
    pub fn balance(&self, service: &impl LedgerService) -> Result<u64, WalletError> {
        Ok(service.get_account(&self.address)?.balance)
    }

    pub fn token_balance(
        &self,
        service: &impl LedgerService,
        token: &Token,
    ) -> Result<u128, WalletError> {
        service.token_balance(&token.contract, &self.address)
    }

    /// Send `amount` sun to `to` and return the transaction id.
    pub fn transfer(
        &self,
        service: &impl LedgerService,
        to: &str,
        amount: u64,
    ) -> Result<String, WalletError> {
        let to = tron_crypto::from_base58(to)?;
        tracing::info!(from = %self.address_base58(), to = %to, amount, "transfer");
        let tx = service.build_unsigned_transfer(&self.address, &to, amount)?;
        broadcast_signed(service, &tx.sign(&self.keys)?)
    }

    /// Send `amount` base units of `token` to `to` and return the transaction id.
    pub fn transfer_token(
        &self,
        service: &impl LedgerService,
        token: &Token,
        to: &str,
        amount: u128,
    ) -> Result<String, WalletError> {
        let to = tron_crypto::from_base58(to)?;
        tracing::info!(
            from = %self.address_base58(),
            token = %token.contract,
            to = %to,
            amount,
            "token transfer"
        );
        let tx = service.build_unsigned_token_transfer(&self.address, &token.contract, &to, amount)?;
        broadcast_signed(service, &tx.sign(&self.keys)?)
    }

    pub fn estimate_transfer_fee(
        &self,
        service: &impl LedgerService,
        to: &str,
        amount: u64,
    ) -> Result<u64, WalletError> {
        let to = tron_crypto::from_base58(to)?;
        service.estimate_transfer_fee(&self.address, &to, amount)
    }

    pub fn estimate_token_transfer_fee(
        &self,
        service: &impl LedgerService,
        token: &Token,
        to: &str,
        amount: u128,
    ) -> Result<u64, WalletError> {
        let to = tron_crypto::from_base58(to)?;
        service.estimate_token_transfer_fee(&self.address, &token.contract, &to, amount)
    }

    /// Replace this account's permissions, signing the update with this
    /// wallet's key. Returns the transaction id.
    pub fn update_account_permission(
        &self,
        service: &impl LedgerService,
        owner: &OwnerPermissionSpec,
        witness: Option<&WitnessPermissionSpec>,
        actives: &[ActivePermissionSpec],
    ) -> Result<String, WalletError> {
        let tx = permission::update_account_permission(
            service,
            &self.address_base58(),
            owner,
            witness,
            actives,
        )?;
        broadcast_signed(service, &tx.sign(&self.keys)?)
    }

    /// Put this account under joint control with `co_signer`: both the
    /// owner permission and an active permission become 2-of-2 over this
    /// wallet's key and `co_signer`'s.
    pub fn update_permission(
        &self,
        service: &impl LedgerService,
        co_signer: &str,
    ) -> Result<String, WalletError> {
        let own = self.address_base58();
        let (owner, active) = standard_co_signed_update(&own, co_signer);
        tracing::info!(account = %own, co_signer, "installing co-signed permissions");
        self.update_account_permission(service, &owner, None, &[active])
    }

    /// Token transfer from this account signed by this wallet and
    /// `co_signer`, for accounts set up through [`Wallet::update_permission`].
    pub fn multi_transfer_token(
        &self,
        service: &impl LedgerService,
        co_signer: &Wallet,
        token: &Token,
        to: &str,
        amount: u128,
    ) -> Result<String, WalletError> {
        multisig::create_and_broadcast_multi_signed_token_transfer(
            service,
            &self.address_base58(),
            token,
            to,
            amount,
            &[&self.keys, &co_signer.keys],
        )
    }
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address_base58())
            .finish_non_exhaustive()
    }
}
