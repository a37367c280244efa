//! End-to-end authentication flows against a real store.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

use crate::test_utils::{AccountClient, AssertionClient, TestEnv};
use capstream_auth::{AuthError, IdentityAssertion, HTTP_AUTH_KIND};
use capstream_core::time::unix_now;
use capstream_domain::AuthMethod;

#[test]
fn assertion_login_end_to_end() {
    let env = TestEnv::new();
    let client = AssertionClient::new([11u8; 32]);
    env.add_investor(client.investor(75_000.0));

    let outcome = env
        .gateway
        .login_with_assertion(&client.signed_assertion())
        .unwrap();
    assert_eq!(outcome.method, AuthMethod::Assertion);
    assert_eq!(outcome.investor.investment_amount, 75_000.0);

    let investor = env.gateway.require_session(&outcome.session_id).unwrap();
    assert_eq!(
        investor.assertion_key.as_deref(),
        Some(client.public_key_hex.as_str())
    );
}

#[test]
fn assertion_login_via_bearer_header() {
    let env = TestEnv::new();
    let client = AssertionClient::new([11u8; 32]);
    env.add_investor(client.investor(75_000.0));

    let raw = serde_json::to_vec(&client.signed_assertion()).unwrap();
    let header = format!("Nostr {}", BASE64.encode(raw));

    let assertion = IdentityAssertion::from_bearer_header(&header).unwrap();
    assert!(env.gateway.login_with_assertion(&assertion).is_ok());
}

#[test]
fn assertion_login_rejections() {
    let env = TestEnv::new();
    let client = AssertionClient::new([11u8; 32]);
    env.add_investor(client.investor(75_000.0));

    // Stale assertion.
    let stale = client.signed_assertion_at(unix_now() - 301, HTTP_AUTH_KIND);
    assert!(matches!(
        env.gateway.login_with_assertion(&stale),
        Err(AuthError::StaleAssertion)
    ));

    // Wrong purpose code.
    let wrong_kind = client.signed_assertion_at(unix_now(), 1);
    assert!(matches!(
        env.gateway.login_with_assertion(&wrong_kind),
        Err(AuthError::WrongPurpose)
    ));

    // Tampered content.
    let mut tampered = client.signed_assertion();
    tampered.content = "paid".to_string();
    assert!(matches!(
        env.gateway.login_with_assertion(&tampered),
        Err(AuthError::InvalidSignature)
    ));

    // Valid signature, unregistered key.
    let stranger = AssertionClient::new([13u8; 32]);
    let err = env
        .gateway
        .login_with_assertion(&stranger.signed_assertion())
        .unwrap_err();
    assert!(matches!(err, AuthError::UnknownIdentity));
    assert_eq!(err.status_code(), 404);
}

#[test]
fn challenge_login_end_to_end() {
    let env = TestEnv::new();
    let client = AccountClient::new([21u8; 32]);
    env.add_investor(client.investor(50_000.0));

    let issued = env.gateway.begin_challenge(&client.public_key_hex).unwrap();
    assert_eq!(issued.network_passphrase, crate::test_utils::NETWORK_PASSPHRASE);

    let signed = client.counter_sign(&issued.transaction);
    let outcome = env.gateway.complete_challenge(&signed).unwrap();
    assert_eq!(outcome.method, AuthMethod::Challenge);

    let investor = env.gateway.require_session(&outcome.session_id).unwrap();
    assert_eq!(
        investor.account_key.as_deref(),
        Some(client.public_key_hex.as_str())
    );
}

#[test]
fn challenge_replay_is_rejected() {
    let env = TestEnv::new();
    let client = AccountClient::new([21u8; 32]);
    env.add_investor(client.investor(50_000.0));

    let issued = env.gateway.begin_challenge(&client.public_key_hex).unwrap();
    let signed = client.counter_sign(&issued.transaction);

    env.gateway.complete_challenge(&signed).unwrap();
    let replay = env.gateway.complete_challenge(&signed).unwrap_err();
    assert!(matches!(replay, AuthError::ChallengeNotFound));
    assert_eq!(replay.status_code(), 401);
}

#[test]
fn challenge_reissue_invalidates_earlier_envelope() {
    let env = TestEnv::new();
    let client = AccountClient::new([21u8; 32]);
    env.add_investor(client.investor(50_000.0));

    let first = env.gateway.begin_challenge(&client.public_key_hex).unwrap();
    let _second = env.gateway.begin_challenge(&client.public_key_hex).unwrap();

    let signed_first = client.counter_sign(&first.transaction);
    assert!(matches!(
        env.gateway.complete_challenge(&signed_first),
        Err(AuthError::ChallengeNotFound)
    ));
}

#[test]
fn challenge_without_counter_signature_fails() {
    let env = TestEnv::new();
    let client = AccountClient::new([21u8; 32]);
    env.add_investor(client.investor(50_000.0));

    let issued = env.gateway.begin_challenge(&client.public_key_hex).unwrap();
    assert!(matches!(
        env.gateway.complete_challenge(&issued.transaction),
        Err(AuthError::InvalidSignature)
    ));
}

#[test]
fn challenge_for_unregistered_account_resolves_to_unknown_identity() {
    let env = TestEnv::new();
    let stranger = AccountClient::new([23u8; 32]);

    let issued = env
        .gateway
        .begin_challenge(&stranger.public_key_hex)
        .unwrap();
    let signed = stranger.counter_sign(&issued.transaction);
    assert!(matches!(
        env.gateway.complete_challenge(&signed),
        Err(AuthError::UnknownIdentity)
    ));
}

#[test]
fn both_keys_on_one_investor_share_payout_history() {
    let env = TestEnv::new();
    let account = AccountClient::new([21u8; 32]);
    let assertion = AssertionClient::new([11u8; 32]);

    let mut investor = account.investor(50_000.0);
    investor.assertion_key = Some(assertion.public_key_hex.clone());
    let created = env.add_investor(investor);

    // Challenge path.
    let issued = env.gateway.begin_challenge(&account.public_key_hex).unwrap();
    let outcome_a = env
        .gateway
        .complete_challenge(&account.counter_sign(&issued.transaction))
        .unwrap();

    // Assertion path.
    let outcome_b = env
        .gateway
        .login_with_assertion(&assertion.signed_assertion())
        .unwrap();

    assert_eq!(outcome_a.investor.id, created.id);
    assert_eq!(outcome_b.investor.id, created.id);
}

#[test]
fn session_lifecycle_through_gateway() {
    let env = TestEnv::new();
    let client = AccountClient::new([21u8; 32]);
    env.add_investor(client.investor(50_000.0));

    let issued = env.gateway.begin_challenge(&client.public_key_hex).unwrap();
    let outcome = env
        .gateway
        .complete_challenge(&client.counter_sign(&issued.transaction))
        .unwrap();

    let status = env.gateway.session_status(&outcome.session_id);
    assert!(status.authenticated);
    assert_eq!(status.method, Some(AuthMethod::Challenge));

    env.gateway.logout(&outcome.session_id);
    let status = env.gateway.session_status(&outcome.session_id);
    assert!(!status.authenticated);
    assert!(matches!(
        env.gateway.require_session(&outcome.session_id),
        Err(AuthError::Unauthenticated)
    ));
}

#[test]
fn expired_challenges_self_heal_and_sweep() {
    let env = TestEnv::with_ttls(0, 0);
    let client = AccountClient::new([21u8; 32]);
    env.add_investor(client.investor(50_000.0));

    let issued = env.gateway.begin_challenge(&client.public_key_hex).unwrap();
    let signed = client.counter_sign(&issued.transaction);
    std::thread::sleep(std::time::Duration::from_millis(1100));

    // The outstanding challenge aged out before completion.
    assert!(matches!(
        env.gateway.complete_challenge(&signed),
        Err(AuthError::ChallengeExpired)
    ));

    // Leftover expired state is sweepable.
    let issued = env.gateway.begin_challenge(&client.public_key_hex).unwrap();
    let _ = issued;
    std::thread::sleep(std::time::Duration::from_millis(1100));
    let report = env.gateway.sweep_expired();
    assert_eq!(report.challenges, 1);
}

#[test]
fn require_session_never_faults_on_garbage() {
    let env = TestEnv::new();
    for garbage in ["", "x", "<script>", &"a".repeat(4096)] {
        assert!(matches!(
            env.gateway.require_session(garbage),
            Err(AuthError::Unauthenticated)
        ));
    }
}
