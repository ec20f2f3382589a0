//! Session behavior over HTTP.
//!
//! Covers the token lifecycle (refresh on 401, forced logout when the
//! refresh fails) and retrying of idempotent requests.

use demo_wallet::{
    domain::models::{Transaction, TxKind, TxStatus},
    domain::session::Route,
};

use super::backend::{FakeBackend, USER_ID};
use super::{TestEnv, PASSWORD, PHRASE, PHRASE_ADDRESS, RECIPIENT};

async fn logged_in() -> (FakeBackend, TestEnv) {
    let backend = FakeBackend::default();
    let addr = backend.spawn().await;
    let env = TestEnv::rest(addr);
    let next = env
        .session
        .login("alice@example.com", PASSWORD)
        .await
        .expect("login");
    assert_eq!(next, Route::WalletSetup);
    (backend, env)
}

#[tokio::test]
async fn test_login_stores_tokens() {
    let (_backend, env) = logged_in().await;
    let tokens = env.store.auth_tokens().unwrap().unwrap();
    assert_eq!(tokens.access_token, "access-1");
    assert_eq!(tokens.refresh_token, "refresh-1");

    let user = env.session.current_user().unwrap().unwrap();
    assert_eq!(user.user_id, USER_ID);
    assert_eq!(user.username, "alice");
}

#[tokio::test]
async fn test_bad_credentials_show_server_message() {
    let backend = FakeBackend::default();
    let env = TestEnv::rest(backend.spawn().await);

    let err = env
        .session
        .login("alice@example.com", "Wrong-Horse-1")
        .await
        .unwrap_err();
    assert_eq!(err.user_message(), "Invalid credentials");
    // A failed login is not an expired session
    assert!(!err.is_session_expired());
    assert!(env.store.auth_tokens().unwrap().is_none());
    assert_eq!(backend.state().refresh_calls, 0);
}

#[tokio::test]
async fn test_expired_token_is_refreshed_once() {
    let (backend, env) = logged_in().await;
    backend.state().expire_access_token();

    let view = env.session.fetch_profile().await.unwrap();
    assert!(view.synced);
    assert_eq!(view.user.display_name(), "Alice Liddell");
    assert_eq!(backend.state().refresh_calls, 1);

    // Rotated pair is persisted and reused
    let tokens = env.store.auth_tokens().unwrap().unwrap();
    assert_eq!(tokens.access_token, "access-3");
    assert_eq!(tokens.refresh_token, "refresh-3");

    env.session.fetch_profile().await.unwrap();
    assert_eq!(backend.state().refresh_calls, 1);
}

#[tokio::test]
async fn test_failed_refresh_clears_session() {
    let (backend, env) = logged_in().await;
    {
        let mut state = backend.state();
        state.expire_access_token();
        state.refresh_allowed = false;
    }

    let err = env.session.fetch_profile().await.unwrap_err();
    assert!(err.is_session_expired());
    assert_eq!(err.user_message(), "Session expired. Please log in again.");

    assert!(env.store.auth_tokens().unwrap().is_none());
    assert!(env.store.current_user().unwrap().is_none());
    assert_eq!(env.session.route_guard(Route::Profile).unwrap(), Route::Login);
}

#[tokio::test]
async fn test_second_unauthorized_forces_logout() {
    let (backend, env) = logged_in().await;
    backend.state().always_unauthorized = true;

    let err = env.session.fetch_profile().await.unwrap_err();
    assert!(err.is_session_expired());
    assert_eq!(backend.state().refresh_calls, 1);
    assert!(env.store.auth_tokens().unwrap().is_none());
}

#[tokio::test]
async fn test_expired_session_during_wallet_import() {
    let (backend, env) = logged_in().await;
    {
        let mut state = backend.state();
        state.expire_access_token();
        state.refresh_allowed = false;
    }

    let err = env.session.import_wallet(PHRASE).await.unwrap_err();
    assert!(err.is_session_expired());
    assert!(env.store.wallet().unwrap().is_none());
}

#[tokio::test]
async fn test_balance_retries_server_errors() {
    let (backend, env) = logged_in().await;
    let wallet = env.session.import_wallet(PHRASE).await.unwrap();
    assert_eq!(wallet.address, PHRASE_ADDRESS);
    assert_eq!(wallet.balance, "1.5000");
    let before = backend.state().balance_calls;

    backend.state().server_errors = 2;
    let view = env.session.refresh_balance().await.unwrap();
    assert!(!view.stale);
    assert_eq!(view.balance, "1.5000");
    assert_eq!(view.usd_value, "3750.00");
    assert_eq!(backend.state().balance_calls, before + 3);
}

#[tokio::test]
async fn test_balance_falls_back_to_cache_when_retries_exhausted() {
    let (backend, env) = logged_in().await;
    env.session.import_wallet(PHRASE).await.unwrap();
    let before = backend.state().balance_calls;

    backend.state().server_errors = 10;
    let view = env.session.refresh_balance().await.unwrap();
    assert!(view.stale);
    assert_eq!(view.balance, "1.5000");
    assert_eq!(view.usd_value, "3750.00");
    // One attempt plus two retries
    assert_eq!(backend.state().balance_calls, before + 3);
}

#[tokio::test]
async fn test_price_feed() {
    let (_backend, env) = logged_in().await;
    assert_eq!(env.session.eth_price().await, 2500.0);
}

fn local_transfer() -> Transaction {
    Transaction {
        id: "tx_local".to_string(),
        kind: TxKind::Sent,
        amount: "0.2500".to_string(),
        address: RECIPIENT.to_string(),
        timestamp: 1_700_000_000_000,
        status: TxStatus::Pending,
        tx_hash: None,
        signature: None,
    }
}

#[tokio::test]
async fn test_unknown_transaction_uses_local_record() {
    let (_backend, env) = logged_in().await;
    env.session.import_wallet(PHRASE).await.unwrap();

    let tx = local_transfer();
    let detail = env.session.transaction_details(&tx).await.unwrap();
    assert_eq!(detail.id, "tx_local");
    assert_eq!(detail.from_address, PHRASE_ADDRESS);
    assert_eq!(detail.to_address, RECIPIENT);
    assert_eq!(detail.status, TxStatus::Pending);
    assert_eq!(detail.kind_for(PHRASE_ADDRESS), TxKind::Sent);
}

#[tokio::test]
async fn test_not_found_with_error_body_uses_local_record() {
    let (backend, env) = logged_in().await;
    env.session.import_wallet(PHRASE).await.unwrap();
    backend.state().json_not_found = true;

    let detail = env
        .session
        .transaction_details(&local_transfer())
        .await
        .unwrap();
    assert_eq!(detail.id, "tx_local");
    assert_eq!(detail.to_address, RECIPIENT);
    assert_eq!(detail.amount, "0.2500");
}

#[tokio::test]
async fn test_logout_wipes_local_data() {
    let (backend, env) = logged_in().await;
    env.session.import_wallet(PHRASE).await.unwrap();

    env.session.logout().await.unwrap();
    assert_eq!(backend.state().logout_calls, 1);
    assert!(env.store.wallet().unwrap().is_none());
    assert!(env.store.auth_tokens().unwrap().is_none());
    assert!(env.store.current_user().unwrap().is_none());
}
