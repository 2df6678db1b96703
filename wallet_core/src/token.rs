//! Token contract calls: `transfer(address,uint256)` and `balanceOf(address)`.

use tron_types::Address;

use crate::WalletError;

pub const TRANSFER_SIGNATURE: &str = "transfer(address,uint256)";
pub const BALANCE_OF_SIGNATURE: &str = "balanceOf(address)";

/// A fungible token contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Token {
    pub contract: Address,
}

impl Token {
    pub fn new(contract: Address) -> Self {
        Self { contract }
    }

    pub fn from_base58(text: &str) -> Result<Self, WalletError> {
        Ok(Self::new(tron_crypto::from_base58(text)?))
    }
}

/// First four bytes of the Keccak-256 of a function signature.
pub fn method_id(signature: &str) -> [u8; 4] {
    let hash = tron_crypto::keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// An address as a 32-byte ABI word: the 20-byte account hash, left-padded.
pub fn address_word(address: &Address) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address.account_hash());
    word
}

pub fn uint_word(value: u128) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[16..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Arguments of `transfer(to, amount)` without the selector.
pub fn transfer_parameters(to: &Address, amount: u128) -> Vec<u8> {
    let mut params = Vec::with_capacity(64);
    params.extend_from_slice(&address_word(to));
    params.extend_from_slice(&uint_word(amount));
    params
}

/// Full call data of `transfer(to, amount)`.
pub fn encode_transfer_call(to: &Address, amount: u128) -> Vec<u8> {
    let mut data = method_id(TRANSFER_SIGNATURE).to_vec();
    data.extend(transfer_parameters(to, amount));
    data
}

/// Split `transfer(to, amount)` call data back into its arguments.
pub fn decode_transfer_call(data: &[u8]) -> Option<(Address, u128)> {
    if data.len() != 68 || data[..4] != method_id(TRANSFER_SIGNATURE) {
        return None;
    }
    let to_word = &data[4..36];
    if to_word[..12].iter().any(|b| *b != 0) {
        return None;
    }
    let mut hash = [0u8; 20];
    hash.copy_from_slice(&to_word[12..]);
    let amount = decode_uint(&data[36..68])?;
    Some((Address::from_account_hash(hash), amount))
}

/// Decode a 32-byte big-endian word, failing if it exceeds `u128`.
pub fn decode_uint(word: &[u8]) -> Option<u128> {
    if word.len() != 32 || word[..16].iter().any(|b| *b != 0) {
        return None;
    }
    let mut low = [0u8; 16];
    low.copy_from_slice(&word[16..]);
    Some(u128::from_be_bytes(low))
}

/// Decode the hex return value of `balanceOf`.
pub fn decode_balance(hex_result: &str) -> Result<u128, WalletError> {
    let bytes = hex::decode(hex_result)
        .map_err(|e| WalletError::Node(format!("balanceOf returned invalid hex: {e}")))?;
    decode_uint(&bytes).ok_or_else(|| {
        WalletError::Node(format!("balanceOf returned an unexpected value: {hex_result}"))
    })
}
