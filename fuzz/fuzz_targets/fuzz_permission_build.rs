#![no_main]

use std::collections::BTreeMap;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tron_wallet_core::{build_permission, KeySpec, PermissionKind};

#[derive(Debug, Arbitrary)]
struct Input {
    threshold: i64,
    keys: Vec<(u8, i64)>,
    operations: Vec<(String, bool)>,
}

fuzz_target!(|input: Input| {
    let keys: Vec<KeySpec> = input
        .keys
        .iter()
        .map(|(seed, weight)| {
            let address = tron_types::Address::from_account_hash([*seed; 20]);
            KeySpec::new(tron_crypto::to_base58(&address), *weight)
        })
        .collect();
    let operations: BTreeMap<String, bool> = input.operations.into_iter().collect();
    if let Ok(perm) = build_permission(
        "fuzz",
        PermissionKind::Active,
        2,
        input.threshold,
        &operations,
        &keys,
    ) {
        assert!(perm.keys().len() <= 5);
        assert!(perm.threshold() > 0 && perm.threshold() <= perm.total_weight());
    }
});
