#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Address text arrives from users and nodes; decoding must never panic.
    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(address) = tron_crypto::from_base58(text) {
            assert_eq!(tron_crypto::to_base58(&address), text.trim());
        }
        let _ = tron_crypto::decode_base58_check(text);
        let _ = tron_types::Address::from_hex(text);
        let _ = text.parse::<tron_crypto::DerivationPath>();
    }
});
