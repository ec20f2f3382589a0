//! Session orchestration over the local store and the backend API.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    config::TransferConfig,
    domain::{
        amount::Wei,
        models::{
            now_millis, Currency, RemoteWallet, Transaction, TransactionDetail, TransferQuote,
            TxKind, User, Wallet,
        },
        validation::{self, ValidationError},
        wallet::{self, WalletError},
    },
    infra::{
        api::{
            ApiError, ConfirmRequest, ProfileUpdate, SignupRequest, TransferRequest, WalletApi,
            WalletRegistration,
        },
        store::Store,
    },
};

/// Where the user is, or is being sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Signup,
    WalletSetup,
    Dashboard,
    Send,
    Receive,
    History,
    Wallets,
    Profile,
}

impl Route {
    fn needs_wallet(self) -> bool {
        matches!(
            self,
            Route::Dashboard | Route::Send | Route::Receive | Route::History
        )
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Wallet(#[from] WalletError),
    #[error("Insufficient balance")]
    InsufficientBalance,
    #[error("No wallet found")]
    NoWallet,
    #[error("Not logged in")]
    NotLoggedIn,
    #[error("Wallet has no signing key on this device")]
    WatchOnly,
    #[error("Transaction expired")]
    Expired,
    #[error("Storage error: {0}")]
    Store(String),
}

impl From<color_eyre::Report> for SessionError {
    fn from(err: color_eyre::Report) -> Self {
        SessionError::Store(err.to_string())
    }
}

impl SessionError {
    pub fn user_message(&self) -> String {
        match self {
            SessionError::Validation(e) => e.message.clone(),
            SessionError::Api(e) => e.user_message(),
            SessionError::Store(_) => "Failed to access local storage".to_string(),
            other => other.to_string(),
        }
    }

    /// The backend rejected the session and local data has been wiped.
    pub fn is_session_expired(&self) -> bool {
        matches!(self, SessionError::Api(ApiError::SessionExpired))
    }
}

pub type SessionResult<T> = Result<T, SessionError>;

/// Balance as shown on the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceView {
    /// ETH, 4 decimals.
    pub balance: String,
    /// USD, 2 decimals.
    pub usd_value: String,
    /// Served from the local cache because the backend was unreachable.
    pub stale: bool,
}

/// A validated send form awaiting a quote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendDraft {
    pub recipient: String,
    /// Amount as entered, in `currency` units.
    pub amount: String,
    pub currency: Currency,
    pub eth_amount: Wei,
}

/// Profile data, and whether it came from the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileView {
    pub user: User,
    pub synced: bool,
}

/// Owns the signed-in state: the current user, the active wallet, tokens
/// and local history.
#[derive(Clone)]
pub struct SessionManager {
    store: Store,
    api: Arc<dyn WalletApi>,
    transfer: TransferConfig,
}

impl SessionManager {
    pub fn new(store: Store, api: Arc<dyn WalletApi>, transfer: TransferConfig) -> Self {
        Self {
            store,
            api,
            transfer,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn current_user(&self) -> SessionResult<Option<User>> {
        Ok(self.store.current_user()?.filter(|u| u.is_logged_in))
    }

    pub fn wallet(&self) -> SessionResult<Option<Wallet>> {
        Ok(self.store.wallet()?)
    }

    fn require_user(&self) -> SessionResult<User> {
        self.current_user()?.ok_or(SessionError::NotLoggedIn)
    }

    fn require_wallet(&self) -> SessionResult<Wallet> {
        self.store.wallet()?.ok_or(SessionError::NoWallet)
    }

    /// Screen to land on after authentication.
    fn landing(&self) -> SessionResult<Route> {
        Ok(if self.store.wallet()?.is_some() {
            Route::Dashboard
        } else {
            Route::WalletSetup
        })
    }

    /// Redirect `route` according to the session state.
    pub fn route_guard(&self, route: Route) -> SessionResult<Route> {
        let logged_in = self.current_user()?.is_some();
        let has_wallet = self.store.wallet()?.is_some();

        Ok(match route {
            Route::Login | Route::Signup if logged_in => self.landing()?,
            Route::Login | Route::Signup => route,
            _ if !logged_in => Route::Login,
            r if r.needs_wallet() && !has_wallet => Route::WalletSetup,
            r => r,
        })
    }

    pub async fn signup(
        &self,
        email: &str,
        username: &str,
        password: &str,
        confirm_password: &str,
    ) -> SessionResult<Route> {
        let form = validation::validate_signup(email, username, password, confirm_password)?;
        let wallet_address = self.store.wallet()?.map(|w| w.address);

        let session = self
            .api
            .signup(&SignupRequest {
                email: form.email.clone(),
                username: form.username.clone(),
                password: form.password,
                wallet_address,
            })
            .await?;

        self.store.set_auth_tokens(&session.tokens)?;
        self.store.set_current_user(&User {
            user_id: session.user_id,
            email: form.email,
            username: form.username,
            is_logged_in: true,
            created_at: Some(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        })?;
        info!("Signed up");
        self.landing()
    }

    pub async fn login(&self, email: &str, password: &str) -> SessionResult<Route> {
        let form = validation::validate_login(email, password)?;
        let session = self.api.login(&form.email, &form.password).await?;

        let username = session.username.clone().unwrap_or_else(|| {
            form.email
                .split('@')
                .next()
                .unwrap_or(&form.email)
                .to_string()
        });
        // Keep locally known profile fields for the same account
        let previous = self
            .store
            .current_user()?
            .filter(|u| u.user_id == session.user_id);

        self.store.set_auth_tokens(&session.tokens)?;
        self.store.set_current_user(&User {
            user_id: session.user_id,
            email: form.email,
            username,
            is_logged_in: true,
            ..previous.unwrap_or_default()
        })?;
        info!("Logged in");
        self.landing()
    }

    /// End the session and wipe all local data.
    pub async fn logout(&self) -> SessionResult<()> {
        if let Err(e) = self.api.logout().await {
            warn!("Backend logout failed: {}", e);
        }
        self.store.clear_all()?;
        info!("Logged out");
        Ok(())
    }

    /// Drop the stored session after the backend stopped recognising it.
    pub fn end_expired_session(&self) -> SessionResult<()> {
        self.store.clear_all()?;
        info!("Local session cleared");
        Ok(())
    }

    /// Generate a wallet for the setup screen. Nothing is saved until
    /// [`save_generated_wallet`](Self::save_generated_wallet).
    pub fn create_wallet(&self) -> SessionResult<Wallet> {
        Ok(wallet::generate_wallet()?)
    }

    /// Persist a wallet the user has backed up.
    pub async fn save_generated_wallet(&self, wallet: Wallet) -> SessionResult<Wallet> {
        self.activate_wallet(wallet).await
    }

    /// Restore a wallet from a recovery phrase and make it active.
    pub async fn import_wallet(&self, phrase: &str) -> SessionResult<Wallet> {
        let phrase = validation::validate_mnemonic(phrase)?;
        let wallet = wallet::import_wallet(&phrase)?;
        self.activate_wallet(wallet).await
    }

    async fn activate_wallet(&self, mut wallet: Wallet) -> SessionResult<Wallet> {
        if wallet.wallet_name.is_none() {
            wallet.wallet_name = Some("Main Wallet".to_string());
        }
        if let Some(mnemonic) = wallet.mnemonic.clone() {
            let reg = WalletRegistration {
                mnemonic,
                wallet_name: wallet.label(),
                is_primary: true,
            };
            match self.api.create_wallet(&reg).await {
                Ok(()) => {}
                Err(ApiError::SessionExpired) => return Err(ApiError::SessionExpired.into()),
                Err(e) => warn!("Wallet registration failed: {}", e),
            }
        }

        match self.api.get_balance(&wallet.address).await {
            Ok(info) => wallet.balance = normalize_balance(&info.balance),
            Err(ApiError::SessionExpired) => return Err(ApiError::SessionExpired.into()),
            Err(e) => warn!("Initial balance lookup failed: {}", e),
        }

        self.store.set_wallet(&wallet)?;
        info!("Wallet {} activated", wallet::format_address(&wallet.address));
        Ok(wallet)
    }

    /// Current ETH price, or the configured fallback.
    pub async fn eth_price(&self) -> f64 {
        match self.api.get_eth_price().await {
            Ok(price) => price,
            Err(e) => {
                debug!("Price lookup failed, using fallback: {}", e);
                self.transfer.fallback_eth_price
            }
        }
    }

    /// Fetch the balance of the active wallet, falling back to the cached
    /// value when the backend is unreachable.
    pub async fn refresh_balance(&self) -> SessionResult<BalanceView> {
        let mut wallet = self.require_wallet()?;
        match self.api.get_balance(&wallet.address).await {
            Ok(info) => {
                wallet.balance = normalize_balance(&info.balance);
                self.store.set_wallet(&wallet)?;
                Ok(BalanceView {
                    balance: wallet.balance,
                    usd_value: info.usd_value,
                    stale: false,
                })
            }
            Err(ApiError::SessionExpired) => Err(ApiError::SessionExpired.into()),
            Err(e) => {
                warn!("Balance refresh failed, using cached balance: {}", e);
                let usd_value = wallet::eth_to_usd(&wallet.balance, self.transfer.fallback_eth_price);
                Ok(BalanceView {
                    balance: wallet.balance,
                    usd_value,
                    stale: true,
                })
            }
        }
    }

    /// Validate a send form against the active wallet.
    pub fn review_send(
        &self,
        recipient: &str,
        amount: &str,
        currency: Currency,
        eth_price: f64,
    ) -> SessionResult<SendDraft> {
        let wallet = self.require_wallet()?;
        if !wallet.can_sign() {
            return Err(SessionError::WatchOnly);
        }

        let form = validation::validate_send(recipient, amount)?;
        let eth_amount = match currency {
            Currency::Eth => form.amount,
            Currency::Usd => {
                let eth = wallet::usd_to_eth(amount, eth_price);
                Wei::parse_eth(&eth).map_err(|_| ValidationError {
                    field: "amount",
                    message: "Invalid amount".to_string(),
                })?
            }
        };
        if eth_amount.is_zero() {
            return Err(ValidationError {
                field: "amount",
                message: "Amount must be greater than 0".to_string(),
            }
            .into());
        }

        let balance = Wei::parse_eth(&wallet.balance).unwrap_or(Wei::ZERO);
        if eth_amount > balance {
            return Err(SessionError::InsufficientBalance);
        }

        Ok(SendDraft {
            recipient: form.recipient,
            amount: amount.trim().to_string(),
            currency,
            eth_amount,
        })
    }

    /// Ask the backend for a signable quote.
    pub async fn initiate_send(&self, draft: &SendDraft) -> SessionResult<TransferQuote> {
        let wallet = self.require_wallet()?;
        let quote = self
            .api
            .initiate_transfer(&TransferRequest {
                from: wallet.address,
                to: draft.recipient.clone(),
                amount: draft.amount.clone(),
                currency: draft.currency,
            })
            .await?;
        debug!(
            "Quote {} expires in {}s",
            quote.message_hash,
            quote.seconds_left(now_millis())
        );
        Ok(quote)
    }

    /// Sign the quote, confirm it and record the transfer locally.
    pub async fn sign_and_send(
        &self,
        draft: &SendDraft,
        quote: &TransferQuote,
    ) -> SessionResult<Transaction> {
        if quote.is_expired_at(now_millis()) {
            return Err(SessionError::Expired);
        }
        let mut wallet = self.require_wallet()?;
        let private_key = wallet.private_key.clone().ok_or(SessionError::WatchOnly)?;

        let signature = wallet::sign_message(&private_key, &quote.message)?;
        let receipt = self
            .api
            .confirm_transfer(&ConfirmRequest {
                signature: signature.clone(),
                message_hash: quote.message_hash.clone(),
                from: wallet.address.clone(),
                to: draft.recipient.clone(),
                amount: quote.eth_amount.clone(),
            })
            .await?;

        let now = now_millis();
        let tx = Transaction {
            id: receipt
                .transaction_id
                .clone()
                .unwrap_or_else(|| format!("tx_{}", now)),
            kind: TxKind::Sent,
            amount: quote.eth_amount.clone(),
            address: draft.recipient.clone(),
            timestamp: now,
            status: receipt.status,
            tx_hash: Some(receipt.tx_hash),
            signature: Some(signature),
        };
        self.store.add_transaction(&tx)?;

        let sent = Wei::parse_eth(&quote.eth_amount).unwrap_or(draft.eth_amount);
        let balance = Wei::parse_eth(&wallet.balance).unwrap_or(Wei::ZERO);
        wallet.balance = balance.saturating_sub(sent).to_fixed(4);
        self.store.set_wallet(&wallet)?;

        info!("Sent {} ETH to {}", tx.amount, wallet::format_address(&tx.address));
        Ok(tx)
    }

    /// Local history, newest first.
    pub fn transactions(&self) -> SessionResult<Vec<Transaction>> {
        Ok(self.store.transactions()?)
    }

    pub fn recent_transactions(&self, limit: usize) -> SessionResult<Vec<Transaction>> {
        let mut txs = self.store.transactions()?;
        txs.truncate(limit);
        Ok(txs)
    }

    /// Full record of `tx` from the backend. Records the backend does not
    /// know are described from local history.
    pub async fn transaction_details(&self, tx: &Transaction) -> SessionResult<TransactionDetail> {
        match self.api.get_transaction(&tx.id).await {
            Ok(detail) => Ok(detail),
            Err(ApiError::NotFound(_)) => {
                debug!("Transaction {} unknown to backend, using local record", tx.id);
                let own = self.require_wallet()?.address;
                let (from_address, to_address) = match tx.kind {
                    TxKind::Sent => (own, tx.address.clone()),
                    TxKind::Received => (tx.address.clone(), own),
                };
                let created_at = chrono::DateTime::from_timestamp_millis(tx.timestamp)
                    .unwrap_or_default()
                    .to_rfc3339();
                Ok(TransactionDetail {
                    id: tx.id.clone(),
                    from_address,
                    to_address,
                    amount: tx.amount.clone(),
                    status: tx.status,
                    signature: tx.signature.clone(),
                    transaction_hash: tx.tx_hash.clone(),
                    gas_fee: None,
                    block_number: None,
                    created_at,
                    updated_at: None,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn list_wallets(&self) -> SessionResult<Vec<RemoteWallet>> {
        Ok(self.api.list_wallets().await?)
    }

    /// Generate and register an additional wallet. Returns its address.
    pub async fn create_remote_wallet(&self, name: &str) -> SessionResult<String> {
        let name = validation::validate_wallet_name(name)?;
        let generated = wallet::generate_wallet()?;
        let mnemonic = generated.mnemonic.clone().ok_or(SessionError::NoWallet)?;
        self.api
            .create_wallet(&WalletRegistration {
                mnemonic,
                wallet_name: name,
                is_primary: false,
            })
            .await?;
        Ok(generated.address)
    }

    /// Register an existing wallet by phrase. Returns its address.
    pub async fn import_remote_wallet(&self, name: &str, phrase: &str) -> SessionResult<String> {
        let name = validation::validate_wallet_name(name)?;
        let phrase = validation::validate_mnemonic(phrase)?;
        let imported = wallet::import_wallet(&phrase)?;
        self.api
            .import_wallet(&WalletRegistration {
                mnemonic: phrase,
                wallet_name: name,
                is_primary: false,
            })
            .await?;
        Ok(imported.address)
    }

    /// Make a listed wallet the active one. Key material is kept when the
    /// listed wallet is the one already active.
    pub fn select_wallet(&self, remote: &RemoteWallet) -> SessionResult<Wallet> {
        let current = self
            .store
            .wallet()?
            .filter(|w| w.address.eq_ignore_ascii_case(&remote.address));

        let wallet = Wallet {
            id: Some(remote.id.clone()),
            wallet_name: Some(remote.wallet_name.clone()),
            is_primary: remote.is_primary,
            address: remote.address.clone(),
            balance: format!("{:.4}", remote.balance),
            mnemonic: current.as_ref().and_then(|w| w.mnemonic.clone()),
            private_key: current.and_then(|w| w.private_key),
        };
        self.store.set_wallet(&wallet)?;
        info!("Selected wallet {}", wallet::format_address(&wallet.address));
        Ok(wallet)
    }

    /// Load the profile from the backend, falling back to local data.
    pub async fn fetch_profile(&self) -> SessionResult<ProfileView> {
        let mut user = self.require_user()?;
        match self.api.get_profile().await {
            Ok(profile) => {
                if let Some(email) = profile.email.filter(|e| !e.is_empty()) {
                    user.email = email;
                }
                user.first_name = profile.first_name.or(user.first_name);
                user.last_name = profile.last_name.or(user.last_name);
                user.phone_number = profile.phone_number.or(user.phone_number);
                user.created_at = profile.created_at.or(user.created_at);
                user.updated_at = profile.updated_at.or(user.updated_at);
                self.store.set_current_user(&user)?;
                Ok(ProfileView { user, synced: true })
            }
            Err(ApiError::SessionExpired) => Err(ApiError::SessionExpired.into()),
            Err(e) => {
                warn!("Profile fetch failed, using local data: {}", e);
                Ok(ProfileView {
                    user,
                    synced: false,
                })
            }
        }
    }

    pub async fn update_profile(
        &self,
        first_name: &str,
        last_name: &str,
        phone_number: &str,
    ) -> SessionResult<User> {
        let mut user = self.require_user()?;
        let form = validation::validate_profile(first_name, last_name, phone_number)?;
        let updated = self
            .api
            .update_profile(&ProfileUpdate {
                first_name: form.first_name.clone(),
                last_name: form.last_name.clone(),
                phone_number: form.phone_number.clone(),
            })
            .await?;

        user.first_name = Some(form.first_name);
        user.last_name = Some(form.last_name);
        user.phone_number = form.phone_number;
        user.updated_at = Some(
            updated
                .updated_at
                .unwrap_or_else(|| chrono::Utc::now().to_rfc3339()),
        );
        self.store.set_current_user(&user)?;
        Ok(user)
    }
}

/// Normalize a backend balance to 4 decimals.
fn normalize_balance(balance: &str) -> String {
    Wei::parse_eth(balance)
        .map(|w| w.to_fixed(4))
        .unwrap_or_else(|_| balance.to_string())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::{domain::models::TxStatus, infra::api::MockApi};

    const PHRASE: &str =
        "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
    const PHRASE_ADDRESS: &str = "0x9858EfFD232B4033E47d90003D41EC34EcaEda94";
    const RECIPIENT: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
    const PASSWORD: &str = "Correct-Horse-9";

    fn manager() -> (TempDir, Arc<MockApi>, SessionManager) {
        let dir = TempDir::new().unwrap();
        let store = Store::with_path(dir.path().join("wallet.mdb")).unwrap();
        let api = Arc::new(MockApi::instant());
        let session = SessionManager::new(store, api.clone(), TransferConfig::default());
        (dir, api, session)
    }

    async fn logged_in_with_wallet(balance: f64) -> (TempDir, Arc<MockApi>, SessionManager) {
        let (dir, api, session) = manager();
        api.set_balance(PHRASE_ADDRESS, balance);
        session.login("alice@example.com", PASSWORD).await.unwrap();
        session.import_wallet(PHRASE).await.unwrap();
        (dir, api, session)
    }

    #[tokio::test]
    async fn test_route_guard() {
        let (_dir, _api, session) = manager();
        assert_eq!(session.route_guard(Route::Dashboard).unwrap(), Route::Login);
        assert_eq!(session.route_guard(Route::Signup).unwrap(), Route::Signup);

        let next = session.login("alice@example.com", PASSWORD).await.unwrap();
        assert_eq!(next, Route::WalletSetup);
        assert_eq!(session.route_guard(Route::Send).unwrap(), Route::WalletSetup);
        assert_eq!(session.route_guard(Route::Profile).unwrap(), Route::Profile);
        assert_eq!(session.route_guard(Route::Login).unwrap(), Route::WalletSetup);

        session.import_wallet(PHRASE).await.unwrap();
        assert_eq!(session.route_guard(Route::Send).unwrap(), Route::Send);
        assert_eq!(session.route_guard(Route::Login).unwrap(), Route::Dashboard);
    }

    #[tokio::test]
    async fn test_signup_validation_stops_before_api() {
        let (_dir, _api, session) = manager();
        let err = session
            .signup("alice@example.com", "alice", PASSWORD, "Other-Horse-9")
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Passwords don't match");
        assert!(session.current_user().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_signup_stores_user_and_tokens() {
        let (_dir, _api, session) = manager();
        let next = session
            .signup(" alice@example.com ", "alice", PASSWORD, PASSWORD)
            .await
            .unwrap();
        assert_eq!(next, Route::WalletSetup);
        let user = session.current_user().unwrap().unwrap();
        assert_eq!(user.email, "alice@example.com");
        assert!(user.is_logged_in);
        assert!(session.store().auth_tokens().unwrap().is_some());
    }

    #[tokio::test]
    async fn test_login_with_local_wallet_lands_on_dashboard() {
        let (_dir, _api, session) = logged_in_with_wallet(3.0).await;
        session.store().clear_current_user().unwrap();
        let next = session.login("alice@example.com", PASSWORD).await.unwrap();
        assert_eq!(next, Route::Dashboard);
        assert_eq!(session.current_user().unwrap().unwrap().username, "alice");
    }

    #[tokio::test]
    async fn test_import_sets_balance() {
        let (_dir, _api, session) = logged_in_with_wallet(3.0).await;
        let wallet = session.wallet().unwrap().unwrap();
        assert_eq!(wallet.address, PHRASE_ADDRESS);
        assert_eq!(wallet.balance, "3.0000");
        assert!(wallet.can_sign());
    }

    #[tokio::test]
    async fn test_import_rejects_bad_phrase() {
        let (_dir, _api, session) = manager();
        session.login("alice@example.com", PASSWORD).await.unwrap();
        let err = session.import_wallet("one two three").await.unwrap_err();
        assert_eq!(err.user_message(), "Mnemonic must be 12 or 24 words");
        let twelve_abandons = vec!["abandon"; 12].join(" ");
        let err = session.import_wallet(&twelve_abandons).await.unwrap_err();
        assert_eq!(err.user_message(), "Invalid mnemonic phrase");
    }

    #[tokio::test]
    async fn test_generated_wallet_is_saved_only_on_confirm() {
        let (_dir, _api, session) = manager();
        session.login("alice@example.com", PASSWORD).await.unwrap();
        let wallet = session.create_wallet().unwrap();
        assert!(session.wallet().unwrap().is_none());
        let saved = session.save_generated_wallet(wallet.clone()).await.unwrap();
        assert_eq!(saved.address, wallet.address);
        assert_eq!(session.wallet().unwrap().unwrap().label(), "Main Wallet");
    }

    #[tokio::test]
    async fn test_review_send_rules() {
        let (_dir, _api, session) = logged_in_with_wallet(2.0).await;

        let draft = session
            .review_send(RECIPIENT, "1.5", Currency::Eth, 2500.0)
            .unwrap();
        assert_eq!(draft.eth_amount, Wei::parse_eth("1.5").unwrap());

        let err = session
            .review_send(RECIPIENT, "2.5", Currency::Eth, 2500.0)
            .unwrap_err();
        assert!(matches!(err, SessionError::InsufficientBalance));

        // 2500 USD at 2500 USD/ETH is exactly 1 ETH
        let draft = session
            .review_send(RECIPIENT, "2500", Currency::Usd, 2500.0)
            .unwrap();
        assert_eq!(draft.eth_amount, Wei::parse_eth("1").unwrap());

        let err = session
            .review_send("0x1234", "1", Currency::Eth, 2500.0)
            .unwrap_err();
        assert_eq!(err.user_message(), "Invalid Ethereum address");
    }

    #[tokio::test]
    async fn test_sign_and_send_records_and_deducts() {
        let (_dir, _api, session) = logged_in_with_wallet(5.0).await;
        let draft = session
            .review_send(RECIPIENT, "1.25", Currency::Eth, 2500.0)
            .unwrap();
        let quote = session.initiate_send(&draft).await.unwrap();
        let tx = session.sign_and_send(&draft, &quote).await.unwrap();

        assert_eq!(tx.kind, TxKind::Sent);
        assert_eq!(tx.status, TxStatus::Success);
        assert_eq!(tx.address, RECIPIENT);
        assert_eq!(session.wallet().unwrap().unwrap().balance, "3.7500");

        let recent = session.recent_transactions(5).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id, tx.id);

        let detail = session.transaction_details(&tx).await.unwrap();
        assert_eq!(detail.from_address, PHRASE_ADDRESS);
        assert_eq!(detail.transaction_hash, tx.tx_hash);
    }

    #[tokio::test]
    async fn test_expired_quote_is_not_signed() {
        let (_dir, _api, session) = logged_in_with_wallet(5.0).await;
        let draft = session
            .review_send(RECIPIENT, "1", Currency::Eth, 2500.0)
            .unwrap();
        let mut quote = session.initiate_send(&draft).await.unwrap();
        quote.expiry = now_millis() - 1;
        let err = session.sign_and_send(&draft, &quote).await.unwrap_err();
        assert_eq!(err.user_message(), "Transaction expired");
        assert!(session.transactions().unwrap().is_empty());
        assert_eq!(session.wallet().unwrap().unwrap().balance, "5.0000");
    }

    #[tokio::test]
    async fn test_local_details_fallback() {
        let (_dir, _api, session) = logged_in_with_wallet(5.0).await;
        let tx = Transaction {
            id: "tx_local".to_string(),
            kind: TxKind::Received,
            amount: "0.1".to_string(),
            address: RECIPIENT.to_string(),
            timestamp: 1_700_000_000_000,
            status: TxStatus::Pending,
            tx_hash: None,
            signature: None,
        };
        let detail = session.transaction_details(&tx).await.unwrap();
        assert_eq!(detail.from_address, RECIPIENT);
        assert_eq!(detail.to_address, PHRASE_ADDRESS);
        assert!(detail.created_at.starts_with("2023-11-14"));
    }

    #[tokio::test]
    async fn test_selected_remote_wallet_is_watch_only() {
        let (_dir, _api, session) = logged_in_with_wallet(5.0).await;
        let address = session.create_remote_wallet("Savings").await.unwrap();
        let wallets = session.list_wallets().await.unwrap();
        let savings = wallets.iter().find(|w| w.address == address).unwrap();
        assert_eq!(savings.wallet_name, "Savings");

        let selected = session.select_wallet(savings).unwrap();
        assert!(!selected.can_sign());
        let err = session
            .review_send(RECIPIENT, "0.1", Currency::Eth, 2500.0)
            .unwrap_err();
        assert!(matches!(err, SessionError::WatchOnly));

        // Keys survive only when re-selecting the wallet that is already active
        let main = wallets.iter().find(|w| w.address == PHRASE_ADDRESS).unwrap();
        assert!(!session.select_wallet(main).unwrap().can_sign());
    }

    #[tokio::test]
    async fn test_remote_wallet_name_required() {
        let (_dir, _api, session) = logged_in_with_wallet(5.0).await;
        let err = session.create_remote_wallet("  ").await.unwrap_err();
        assert_eq!(err.user_message(), "Wallet name is required");
        let err = session
            .import_remote_wallet("Old", "not enough words")
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Mnemonic must be 12 or 24 words");
    }

    #[tokio::test]
    async fn test_profile_update_and_fetch() {
        let (_dir, _api, session) = logged_in_with_wallet(5.0).await;
        let err = session.update_profile("", "Lovelace", "").await.unwrap_err();
        assert_eq!(err.user_message(), "First name is required");

        let user = session
            .update_profile("Ada", "Lovelace", "+1 555 0100")
            .await
            .unwrap();
        assert_eq!(user.display_name(), "Ada Lovelace");

        let view = session.fetch_profile().await.unwrap();
        assert!(view.synced);
        assert_eq!(view.user.phone_number.as_deref(), Some("+1 555 0100"));
    }

    #[tokio::test]
    async fn test_profile_falls_back_to_local() {
        let (_dir, api, session) = logged_in_with_wallet(5.0).await;
        api.logout().await.unwrap();
        let view = session.fetch_profile().await.unwrap();
        assert!(!view.synced);
        assert_eq!(view.user.email, "alice@example.com");
    }

    #[tokio::test]
    async fn test_backend_forgetting_the_account_ends_session() {
        let (_dir, _api, session) = logged_in_with_wallet(5.0).await;

        // Fresh backend, same local store
        let store = session.store().clone();
        let session =
            SessionManager::new(store, Arc::new(MockApi::instant()), TransferConfig::default());
        assert_eq!(session.route_guard(Route::Login).unwrap(), Route::Dashboard);

        let err = session.list_wallets().await.unwrap_err();
        assert!(err.is_session_expired());
        session.end_expired_session().unwrap();
        assert_eq!(session.route_guard(Route::Login).unwrap(), Route::Login);
        assert!(session.wallet().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_logout_wipes_everything() {
        let (_dir, _api, session) = logged_in_with_wallet(5.0).await;
        session.logout().await.unwrap();
        assert!(session.current_user().unwrap().is_none());
        assert!(session.wallet().unwrap().is_none());
        assert!(session.store().auth_tokens().unwrap().is_none());
        assert_eq!(session.route_guard(Route::History).unwrap(), Route::Login);
    }

    #[tokio::test]
    async fn test_price_and_balance() {
        let (_dir, _api, session) = logged_in_with_wallet(2.0).await;
        assert_eq!(session.eth_price().await, 2500.0);
        let view = session.refresh_balance().await.unwrap();
        assert_eq!(view.balance, "2.0000");
        assert_eq!(view.usd_value, "5000.00");
        assert!(!view.stale);
    }
}
