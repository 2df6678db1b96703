#![no_main]

use libfuzzer_sys::fuzz_target;
use tron_types::RecoverableSignature;

fuzz_target!(|input: ([u8; 32], [u8; 65])| {
    let (digest, sig) = input;
    let _ = tron_crypto::recover_address(&digest, &RecoverableSignature(sig));
});
