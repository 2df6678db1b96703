//! End-to-end wallet flows against the nullable ledger.

use tron_nullables::NullLedger;
use tron_types::Address;
use tron_wallet_core::permission::standard_co_signed_update;
use tron_wallet_core::{
    create_and_broadcast_multi_signed_transfer, update_account_permission, ActivePermissionSpec,
    Capability, KeySpec, LedgerService, OwnerPermissionSpec, Token, Wallet, WalletError,
};

fn wallet(byte: u8) -> Wallet {
    Wallet::from_private_key_hex(&hex::encode([byte; 32])).unwrap()
}

fn usdt() -> Token {
    Token::from_base58("TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t").unwrap()
}

fn is_txid(s: &str) -> bool {
    s.len() == 64 && s.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
}

#[test]
fn transfer_returns_txid_and_moves_funds() {
    let (alice, bob) = (wallet(1), wallet(2));
    let ledger = NullLedger::new();
    ledger.fund(alice.address(), 5_000_000);

    let txid = alice
        .transfer(&ledger, &bob.address_base58(), 1_000_000)
        .unwrap();

    assert!(is_txid(&txid));
    assert_eq!(bob.balance(&ledger).unwrap(), 1_000_000);
    assert_eq!(alice.balance(&ledger).unwrap(), 4_000_000);
    assert_eq!(ledger.broadcasts().len(), 1);
    assert_eq!(ledger.broadcasts()[0].txid().to_hex(), txid);
}

#[test]
fn balance_of_unknown_account_is_not_found() {
    let ledger = NullLedger::new();
    assert!(matches!(
        wallet(3).balance(&ledger),
        Err(WalletError::AccountNotFound(_))
    ));
}

#[test]
fn transfer_to_malformed_address_fails_before_building() {
    let alice = wallet(1);
    let ledger = NullLedger::new();
    ledger.fund(alice.address(), 5);
    let err = alice.transfer(&ledger, "not-an-address", 1).unwrap_err();
    assert!(matches!(err, WalletError::Address(_)));
    assert_eq!(ledger.built(), 0);
}

#[test]
fn rejected_broadcast_surfaces_code_and_message() {
    let (alice, bob) = (wallet(1), wallet(2));
    let ledger = NullLedger::new();
    ledger.fund(alice.address(), 10);
    ledger.reject_next_broadcast("SIGERROR", "Validate signature error");

    let err = alice.transfer(&ledger, &bob.address_base58(), 1).unwrap_err();
    assert!(matches!(
        err,
        WalletError::RemoteRejected { ref code, ref message }
            if code == "SIGERROR" && message == "Validate signature error"
    ));
    assert_eq!(ledger.balance_of(bob.address()), 0);
}

#[test]
fn token_transfer_and_balance() {
    let (alice, bob) = (wallet(1), wallet(2));
    let token = usdt();
    let ledger = NullLedger::new();
    ledger.create_account(alice.address());
    ledger.fund_token(&token.contract, alice.address(), 2_500_000);

    let txid = alice
        .transfer_token(&ledger, &token, &bob.address_base58(), 500_000)
        .unwrap();

    assert!(is_txid(&txid));
    assert_eq!(alice.token_balance(&ledger, &token).unwrap(), 2_000_000);
    assert_eq!(bob.token_balance(&ledger, &token).unwrap(), 500_000);
}

#[test]
fn fee_estimates() {
    let (alice, bob) = (wallet(1), wallet(2));
    let token = usdt();
    let ledger = NullLedger::new();
    ledger.fund(alice.address(), 10_000_000);

    // Free bandwidth covers the transfer; only activation is charged.
    let fee = alice
        .estimate_transfer_fee(&ledger, &bob.address_base58(), 1)
        .unwrap();
    assert_eq!(fee, 1_000_000);

    ledger.create_account(bob.address());
    let fee = alice
        .estimate_transfer_fee(&ledger, &bob.address_base58(), 1)
        .unwrap();
    assert_eq!(fee, 0);

    let fresh = alice
        .estimate_token_transfer_fee(&ledger, &token, &bob.address_base58(), 1)
        .unwrap();
    ledger.fund_token(&token.contract, bob.address(), 1);
    let existing = alice
        .estimate_token_transfer_fee(&ledger, &token, &bob.address_base58(), 1)
        .unwrap();
    assert!(fresh > existing);
    assert!(existing > 0);
}

#[test]
fn multi_signed_transfer_meets_two_of_two() {
    let (alice, carol, bob) = (wallet(1), wallet(2), wallet(3));
    let ledger = NullLedger::new();
    ledger.fund(alice.address(), 10_000_000);

    alice
        .update_permission(&ledger, &carol.address_base58())
        .unwrap();
    let owner = ledger.owner_permission(alice.address()).unwrap();
    assert_eq!(owner.threshold(), 2);
    assert_eq!(ledger.active_permissions(alice.address()).len(), 1);

    // A lone signature no longer suffices.
    let err = alice.transfer(&ledger, &bob.address_base58(), 1).unwrap_err();
    assert!(matches!(err, WalletError::RemoteRejected { ref code, .. } if code == "SIGERROR"));

    let txid = create_and_broadcast_multi_signed_transfer(
        &ledger,
        &alice.address_base58(),
        &bob.address_base58(),
        3_000_000,
        &[alice.keys(), carol.keys()],
    )
    .unwrap();
    assert!(is_txid(&txid));
    assert_eq!(ledger.balance_of(bob.address()), 3_000_000);

    let last = ledger.broadcasts().pop().unwrap();
    assert_eq!(last.signatures().len(), 2);
    assert_eq!(
        last.signers().unwrap(),
        vec![*alice.address(), *carol.address()]
    );
}

#[test]
fn multi_transfer_token_with_co_signer() {
    let (alice, carol, bob) = (wallet(1), wallet(2), wallet(3));
    let token = usdt();
    let ledger = NullLedger::new();
    ledger.fund(alice.address(), 10_000_000);
    ledger.fund_token(&token.contract, alice.address(), 100);
    alice
        .update_permission(&ledger, &carol.address_base58())
        .unwrap();

    alice
        .multi_transfer_token(&ledger, &carol, &token, &bob.address_base58(), 60)
        .unwrap();
    assert_eq!(ledger.token_balance_of(&token.contract, bob.address()), 60);
}

#[test]
fn multi_signed_transfer_without_keys_builds_nothing() {
    let (alice, bob) = (wallet(1), wallet(2));
    let ledger = NullLedger::new();
    ledger.fund(alice.address(), 10);
    let err = create_and_broadcast_multi_signed_transfer(
        &ledger,
        &alice.address_base58(),
        &bob.address_base58(),
        1,
        &[],
    )
    .unwrap_err();
    assert!(matches!(err, WalletError::NoSigners));
    assert_eq!(ledger.built(), 0);
    assert!(ledger.broadcasts().is_empty());
}

#[test]
fn active_permission_limited_by_mask() {
    let (alice, dave, bob) = (wallet(1), wallet(4), wallet(3));
    let ledger = NullLedger::new();
    ledger.fund(alice.address(), 10_000_000);

    // Dave may only sign token calls on Alice's behalf.
    let owner = OwnerPermissionSpec {
        threshold: 1,
        keys: vec![KeySpec::new(alice.address_base58(), 1)],
    };
    let active = ActivePermissionSpec::granting(
        "tokens-only",
        1,
        &[Capability::TriggerSmartContract],
        vec![KeySpec::new(dave.address_base58(), 1)],
    );
    alice
        .update_account_permission(&ledger, &owner, None, &[active])
        .unwrap();

    let err = create_and_broadcast_multi_signed_transfer(
        &ledger,
        &alice.address_base58(),
        &bob.address_base58(),
        1,
        &[dave.keys()],
    )
    .unwrap_err();
    assert!(matches!(err, WalletError::RemoteRejected { .. }));

    let token = usdt();
    ledger.fund_token(&token.contract, alice.address(), 10);
    tron_wallet_core::create_and_broadcast_multi_signed_token_transfer(
        &ledger,
        &alice.address_base58(),
        &token,
        &bob.address_base58(),
        10,
        &[dave.keys()],
    )
    .unwrap();
    assert_eq!(ledger.token_balance_of(&token.contract, bob.address()), 10);
}

#[test]
fn permission_update_rejections_propagate() {
    let (alice, carol) = (wallet(1), wallet(2));
    let ledger = NullLedger::new();
    ledger.fund(alice.address(), 1);
    let (owner, active) =
        standard_co_signed_update(&alice.address_base58(), &carol.address_base58());

    ledger.reject_next_permission_update("CONTRACT_VALIDATE_ERROR", "fee not enough");
    assert!(matches!(
        update_account_permission(&ledger, &alice.address_base58(), &owner, None, &[active.clone()]),
        Err(WalletError::RemoteRejected { ref message, .. }) if message == "fee not enough"
    ));

    ledger.respond_empty_to_next_permission_update();
    assert!(matches!(
        update_account_permission(&ledger, &alice.address_base58(), &owner, None, &[active.clone()]),
        Err(WalletError::EmptyTransaction)
    ));

    let tx =
        update_account_permission(&ledger, &alice.address_base58(), &owner, None, &[active])
            .unwrap();
    assert_eq!(tx.txid().as_bytes(), tx.signing_hash());
}

#[test]
fn invalid_permission_never_reaches_the_ledger() {
    let (alice, carol) = (wallet(1), wallet(2));
    let ledger = NullLedger::new();
    ledger.fund(alice.address(), 1);
    let owner = OwnerPermissionSpec {
        threshold: 3,
        keys: vec![
            KeySpec::new(alice.address_base58(), 1),
            KeySpec::new(carol.address_base58(), 1),
        ],
    };
    let err = alice
        .update_account_permission(&ledger, &owner, None, &[])
        .unwrap_err();
    assert!(matches!(err, WalletError::ThresholdUnreachable { .. }));
    assert_eq!(ledger.built(), 0);
}

#[test]
fn service_is_usable_through_a_reference() {
    fn total(service: &impl LedgerService, accounts: &[Address]) -> u64 {
        accounts
            .iter()
            .filter_map(|a| service.get_account(a).ok())
            .map(|info| info.balance)
            .sum()
    }
    let ledger = NullLedger::new();
    let (a, b) = (wallet(1), wallet(2));
    ledger.fund(a.address(), 3);
    ledger.fund(b.address(), 4);
    assert_eq!(total(&ledger, &[*a.address(), *b.address()]), 7);
}
