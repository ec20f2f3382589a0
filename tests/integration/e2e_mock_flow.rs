//! End-to-end user journey against the mock backend.
//!
//! 1. Sign up and land on wallet setup
//! 2. Generate a wallet and confirm the backup
//! 3. Send funds and check history
//! 4. Manage additional wallets
//! 5. Edit the profile and log out

use std::{sync::Arc, time::Duration};

use demo_wallet::{
    domain::{
        models::{Currency, TxKind, TxStatus},
        session::{Route, SessionError},
    },
    infra::api::MockApi,
};

use super::{wait, TestEnv, PASSWORD, PHRASE, PHRASE_ADDRESS, RECIPIENT};

#[tokio::test]
async fn test_full_user_journey() {
    let api = Arc::new(MockApi::instant());
    let env = TestEnv::mock(api.clone());
    let session = &env.session;

    // Signup
    let next = session
        .signup("dana@example.com", "dana", PASSWORD, PASSWORD)
        .await
        .unwrap();
    assert_eq!(next, Route::WalletSetup);
    assert_eq!(session.route_guard(Route::Dashboard).unwrap(), Route::WalletSetup);

    // Generate and back up a wallet
    let generated = session.create_wallet().unwrap();
    assert_eq!(generated.mnemonic.as_ref().unwrap().split(' ').count(), 12);
    api.set_balance(&generated.address, 4.0);
    let wallet = session.save_generated_wallet(generated.clone()).await.unwrap();
    assert_eq!(wallet.balance, "4.0000");
    assert_eq!(session.route_guard(Route::Login).unwrap(), Route::Dashboard);

    let view = session.refresh_balance().await.unwrap();
    assert!(!view.stale);
    assert_eq!(view.usd_value, "10000.00");

    // Send 1000 USD worth at 2500 USD/ETH
    let price = session.eth_price().await;
    let draft = session
        .review_send(RECIPIENT, "1000", Currency::Usd, price)
        .unwrap();
    let quote = session.initiate_send(&draft).await.unwrap();
    assert_eq!(quote.eth_amount, "0.400000");
    let tx = session.sign_and_send(&draft, &quote).await.unwrap();
    assert_eq!(tx.kind, TxKind::Sent);
    assert_eq!(tx.status, TxStatus::Success);
    assert_eq!(session.wallet().unwrap().unwrap().balance, "3.6000");

    // History and details
    let history = session.transactions().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, tx.id);
    let detail = session.transaction_details(&history[0]).await.unwrap();
    assert_eq!(detail.to_address, RECIPIENT);
    assert_eq!(detail.gas_fee.as_deref(), Some("0.00021"));

    // A quote cannot be replayed
    let err = session.sign_and_send(&draft, &quote).await.unwrap_err();
    assert!(matches!(err, SessionError::Api(_)));
    assert_eq!(session.transactions().unwrap().len(), 1);

    // Extra wallets
    let added = session
        .import_remote_wallet("Savings", PHRASE)
        .await
        .unwrap();
    assert_eq!(added, PHRASE_ADDRESS);
    let wallets = session.list_wallets().await.unwrap();
    assert_eq!(wallets.len(), 2);
    assert!(wallets
        .iter()
        .any(|w| w.address.eq_ignore_ascii_case(&generated.address) && w.is_primary));

    let savings = wallets
        .iter()
        .find(|w| w.wallet_name == "Savings")
        .unwrap();
    let selected = session.select_wallet(savings).unwrap();
    assert!(!selected.can_sign());
    let err = session
        .review_send(RECIPIENT, "0.1", Currency::Eth, price)
        .unwrap_err();
    assert!(matches!(err, SessionError::WatchOnly));

    // Keys only survive while the wallet stays active
    let main = wallets
        .iter()
        .find(|w| w.address.eq_ignore_ascii_case(&generated.address))
        .unwrap();
    let selected = session.select_wallet(main).unwrap();
    assert_eq!(selected.address, generated.address);
    assert!(!selected.can_sign());

    // Profile
    let user = session
        .update_profile("Dana", "Scully", "+1 555 0100")
        .await
        .unwrap();
    assert_eq!(user.display_name(), "Dana Scully");
    let view = session.fetch_profile().await.unwrap();
    assert!(view.synced);
    assert_eq!(view.user.phone_number.as_deref(), Some("+1 555 0100"));

    // Logout
    session.logout().await.unwrap();
    assert!(session.current_user().unwrap().is_none());
    assert!(session.wallet().unwrap().is_none());
    assert!(session.transactions().unwrap().is_empty());
    assert_eq!(session.route_guard(Route::Dashboard).unwrap(), Route::Login);
}

#[tokio::test]
async fn test_quote_expires_before_signing() {
    let api = Arc::new(MockApi::instant().with_expiry(Duration::from_millis(50)));
    api.set_balance(PHRASE_ADDRESS, 2.0);
    let env = TestEnv::mock(api);
    let session = &env.session;

    session.login("erin@example.com", PASSWORD).await.unwrap();
    session.import_wallet(PHRASE).await.unwrap();

    let draft = session
        .review_send(RECIPIENT, "0.5", Currency::Eth, 2500.0)
        .unwrap();
    let quote = session.initiate_send(&draft).await.unwrap();
    wait(80).await;

    let err = session.sign_and_send(&draft, &quote).await.unwrap_err();
    assert!(matches!(err, SessionError::Expired));
    assert_eq!(err.user_message(), "Transaction expired");
    assert!(session.transactions().unwrap().is_empty());
    assert_eq!(session.wallet().unwrap().unwrap().balance, "2.0000");
}

#[tokio::test]
async fn test_duplicate_signup_is_rejected() {
    let api = Arc::new(MockApi::instant());
    let env = TestEnv::mock(api);
    let session = &env.session;

    session
        .signup("frank@example.com", "frank", PASSWORD, PASSWORD)
        .await
        .unwrap();
    let err = session
        .signup("frank@example.com", "frank2", PASSWORD, PASSWORD)
        .await
        .unwrap_err();
    assert_eq!(err.user_message(), "Email already registered");
}
