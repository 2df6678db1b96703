#![no_main]

use libfuzzer_sys::fuzz_target;
use tron_wallet_core::token;

fuzz_target!(|data: &[u8]| {
    if let Some((to, amount)) = token::decode_transfer_call(data) {
        assert_eq!(token::encode_transfer_call(&to, amount), data);
    }
    let _ = token::decode_uint(data);
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = token::decode_balance(text);
    }
});
