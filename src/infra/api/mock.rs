use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
    time::Duration,
};

use async_trait::async_trait;
use rand::Rng;
use tracing::debug;

use super::{
    ApiError, ApiResult, ConfirmRequest, ProfileUpdate, SignupRequest, TransferRequest,
    WalletApi, WalletRegistration,
};
use crate::domain::{
    crypto,
    models::{
        now_millis, AuthSession, AuthTokens, BalanceInfo, Currency, Profile, RemoteWallet,
        TransactionDetail, TransferQuote, TransferReceipt, TxStatus,
    },
    wallet::{self, DEFAULT_ETH_PRICE},
};

/// Quotes expire after this long unless configured otherwise.
const DEFAULT_EXPIRY: Duration = Duration::from_secs(30);

struct MockUser {
    user_id: String,
    username: String,
    password: String,
    profile: Profile,
}

struct PendingQuote {
    quote: TransferQuote,
    from: String,
    to: String,
}

#[derive(Default)]
struct MockState {
    users: HashMap<String, MockUser>,
    current_email: Option<String>,
    /// Keyed by account email.
    wallets: HashMap<String, Vec<RemoteWallet>>,
    balances: HashMap<String, f64>,
    quotes: HashMap<String, PendingQuote>,
    /// Keyed by account email, newest last.
    transactions: HashMap<String, Vec<TransactionDetail>>,
}

impl MockState {
    /// Email of the signed-in account.
    fn account(&self) -> ApiResult<String> {
        self.current_email.clone().ok_or(ApiError::SessionExpired)
    }
}

/// In-memory backend with artificial latency.
///
/// Balances are random (1..10 ETH) the first time an address is seen and
/// stay put afterwards, except for confirmed transfers which move funds.
/// Wallets and transaction records belong to the account that created them.
pub struct MockApi {
    delay: Duration,
    confirm_delay: Duration,
    expiry: Duration,
    eth_price: f64,
    state: Mutex<MockState>,
}

impl Default for MockApi {
    fn default() -> Self {
        Self::new(Duration::from_millis(500))
    }
}

impl MockApi {
    /// Confirmations take twice the base delay.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            confirm_delay: delay * 2,
            expiry: DEFAULT_EXPIRY,
            eth_price: DEFAULT_ETH_PRICE,
            state: Mutex::new(MockState::default()),
        }
    }

    /// No latency, for tests.
    pub fn instant() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn with_expiry(mut self, expiry: Duration) -> Self {
        self.expiry = expiry;
        self
    }

    pub fn with_eth_price(mut self, price: f64) -> Self {
        self.eth_price = price;
        self
    }

    /// Pin the balance of an address.
    pub fn set_balance(&self, address: &str, balance: f64) {
        self.state()
            .balances
            .insert(address.to_ascii_lowercase(), balance);
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        // A poisoned lock only means a test panicked mid-update
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn latency(&self, delay: Duration) {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    fn session_for(user: &MockUser, wallet_address: Option<String>) -> AuthSession {
        AuthSession {
            user_id: user.user_id.clone(),
            tokens: AuthTokens {
                access_token: format!("mock_access_{}", uuid::Uuid::new_v4().simple()),
                refresh_token: format!("mock_refresh_{}", uuid::Uuid::new_v4().simple()),
            },
            wallet_address,
            username: Some(user.username.clone()),
        }
    }

    fn random_hash() -> String {
        let bytes: [u8; 32] = rand::thread_rng().gen();
        format!("0x{}", hex::encode(bytes))
    }

    fn register(&self, reg: &WalletRegistration) -> ApiResult<()> {
        let derived = wallet::import_wallet(&reg.mnemonic)
            .map_err(|_| ApiError::Validation("Invalid mnemonic phrase".to_string()))?;

        let mut state = self.state();
        let account = state.account()?;
        let balance = balance_of(&mut state, &derived.address);
        let wallets = state.wallets.entry(account).or_default();
        if wallets
            .iter()
            .any(|w| w.address.eq_ignore_ascii_case(&derived.address))
        {
            return Err(ApiError::Validation("Wallet already exists".to_string()));
        }

        let is_primary = reg.is_primary || wallets.is_empty();
        if is_primary {
            for w in wallets.iter_mut() {
                w.is_primary = false;
            }
        }
        let created_at = chrono::Utc::now().to_rfc3339();
        wallets.push(RemoteWallet {
            id: format!("wallet_{}", uuid::Uuid::new_v4().simple()),
            address: derived.address,
            balance,
            wallet_name: reg.wallet_name.clone(),
            is_primary,
            created_at: Some(created_at.clone()),
            updated_at: Some(created_at),
        });
        Ok(())
    }
}

fn balance_of(state: &mut MockState, address: &str) -> f64 {
    *state
        .balances
        .entry(address.to_ascii_lowercase())
        .or_insert_with(|| {
            let raw: f64 = rand::thread_rng().gen_range(1.0..10.0);
            (raw * 10_000.0).round() / 10_000.0
        })
}

#[async_trait]
impl WalletApi for MockApi {
    async fn signup(&self, req: &SignupRequest) -> ApiResult<AuthSession> {
        self.latency(self.delay).await;
        let mut state = self.state();
        if state.users.contains_key(&req.email) {
            return Err(ApiError::Http {
                status: 409,
                message: "Email already registered".to_string(),
            });
        }

        let user = MockUser {
            user_id: format!("user_{}", &uuid::Uuid::new_v4().simple().to_string()[..9]),
            username: req.username.clone(),
            password: req.password.clone(),
            profile: Profile {
                email: Some(req.email.clone()),
                created_at: Some(chrono::Utc::now().to_rfc3339()),
                ..Default::default()
            },
        };
        let session = Self::session_for(&user, req.wallet_address.clone());
        debug!("mock signup {}", user.user_id);
        state.users.insert(req.email.clone(), user);
        state.current_email = Some(req.email.clone());
        Ok(session)
    }

    async fn login(&self, email: &str, password: &str) -> ApiResult<AuthSession> {
        self.latency(self.delay).await;
        let mut state = self.state();

        // Unknown emails are accepted and registered on the fly
        let user = state
            .users
            .entry(email.to_string())
            .or_insert_with(|| MockUser {
                user_id: format!("user_{}", &uuid::Uuid::new_v4().simple().to_string()[..9]),
                username: email.split('@').next().unwrap_or(email).to_string(),
                password: password.to_string(),
                profile: Profile {
                    email: Some(email.to_string()),
                    ..Default::default()
                },
            });
        if user.password != password {
            return Err(ApiError::Unauthorized);
        }
        let session = Self::session_for(user, None);
        state.current_email = Some(email.to_string());
        Ok(session)
    }

    async fn logout(&self) -> ApiResult<()> {
        self.latency(self.delay).await;
        self.state().current_email = None;
        Ok(())
    }

    async fn get_profile(&self) -> ApiResult<Profile> {
        self.latency(self.delay).await;
        let state = self.state();
        let user = state
            .current_email
            .as_ref()
            .and_then(|email| state.users.get(email))
            .ok_or_else(|| ApiError::NotFound("Profile".to_string()))?;
        Ok(Profile {
            id: Some(user.user_id.clone()),
            ..user.profile.clone()
        })
    }

    async fn update_profile(&self, update: &ProfileUpdate) -> ApiResult<Profile> {
        self.latency(self.delay).await;
        let mut state = self.state();
        let email = state
            .current_email
            .clone()
            .ok_or_else(|| ApiError::NotFound("Profile".to_string()))?;
        let user = state
            .users
            .get_mut(&email)
            .ok_or_else(|| ApiError::NotFound("Profile".to_string()))?;
        user.profile.first_name = Some(update.first_name.clone());
        user.profile.last_name = Some(update.last_name.clone());
        user.profile.phone_number = update.phone_number.clone();
        user.profile.updated_at = Some(chrono::Utc::now().to_rfc3339());
        Ok(Profile {
            id: Some(user.user_id.clone()),
            ..user.profile.clone()
        })
    }

    async fn create_wallet(&self, reg: &WalletRegistration) -> ApiResult<()> {
        self.latency(self.delay).await;
        self.register(reg)
    }

    async fn import_wallet(&self, reg: &WalletRegistration) -> ApiResult<()> {
        self.latency(self.delay).await;
        self.register(reg)
    }

    async fn list_wallets(&self) -> ApiResult<Vec<RemoteWallet>> {
        self.latency(self.delay).await;
        let mut state = self.state();
        let account = state.account()?;
        let mut wallets = state.wallets.get(&account).cloned().unwrap_or_default();
        for w in wallets.iter_mut() {
            w.balance = balance_of(&mut state, &w.address);
        }
        state.wallets.insert(account, wallets.clone());
        Ok(wallets)
    }

    async fn get_balance(&self, address: &str) -> ApiResult<BalanceInfo> {
        self.latency(self.delay).await;
        let balance = balance_of(&mut self.state(), address);
        Ok(BalanceInfo {
            balance: format!("{:.4}", balance),
            usd_value: format!("{:.2}", balance * self.eth_price),
        })
    }

    async fn get_eth_price(&self) -> ApiResult<f64> {
        self.latency(self.delay).await;
        Ok(self.eth_price)
    }

    async fn initiate_transfer(&self, req: &TransferRequest) -> ApiResult<TransferQuote> {
        self.latency(self.delay).await;
        if !crypto::is_address(&req.to) {
            return Err(ApiError::Validation("Invalid Ethereum address".to_string()));
        }
        let (eth_amount, usd_amount) = match req.currency {
            Currency::Eth => (req.amount.clone(), wallet::eth_to_usd(&req.amount, self.eth_price)),
            Currency::Usd => (wallet::usd_to_eth(&req.amount, self.eth_price), req.amount.clone()),
        };
        let message = format!("Transfer {} ETH to {}", eth_amount, req.to);
        let message_hash = format!("0x{}", hex::encode(crypto::hash_message(message.as_bytes())));
        let quote = TransferQuote {
            message,
            message_hash: message_hash.clone(),
            eth_amount,
            usd_amount,
            expiry: now_millis() + self.expiry.as_millis() as i64,
        };

        self.state().quotes.insert(
            message_hash,
            PendingQuote {
                quote: quote.clone(),
                from: req.from.clone(),
                to: req.to.clone(),
            },
        );
        Ok(quote)
    }

    async fn confirm_transfer(&self, req: &ConfirmRequest) -> ApiResult<TransferReceipt> {
        self.latency(self.confirm_delay).await;
        let mut state = self.state();
        let account = state.account()?;
        let pending = state
            .quotes
            .remove(&req.message_hash)
            .ok_or_else(|| ApiError::NotFound("Transfer".to_string()))?;

        if pending.quote.is_expired_at(now_millis()) {
            return Err(ApiError::Expired);
        }
        if !pending.from.eq_ignore_ascii_case(&req.from) || !pending.to.eq_ignore_ascii_case(&req.to)
        {
            return Err(ApiError::Validation(
                "Transfer does not match the quote".to_string(),
            ));
        }
        let signer = wallet::recover_address(&pending.quote.message, &req.signature)
            .map_err(|_| ApiError::Validation("Invalid signature".to_string()))?;
        if !signer.eq_ignore_ascii_case(&req.from) {
            return Err(ApiError::Validation("Invalid signature".to_string()));
        }

        let amount: f64 = pending.quote.eth_amount.parse().unwrap_or(0.0);
        let from_balance = balance_of(&mut state, &req.from);
        if amount > from_balance {
            return Err(ApiError::Validation("Insufficient balance".to_string()));
        }
        state
            .balances
            .insert(req.from.to_ascii_lowercase(), from_balance - amount);
        if let Some(to_balance) = state.balances.get_mut(&req.to.to_ascii_lowercase()) {
            *to_balance += amount;
        }

        let tx_hash = Self::random_hash();
        let id = format!("tx_{}", now_millis());
        let now = chrono::Utc::now().to_rfc3339();
        state.transactions.entry(account).or_default().push(TransactionDetail {
            id: id.clone(),
            from_address: req.from.clone(),
            to_address: req.to.clone(),
            amount: pending.quote.eth_amount.clone(),
            status: TxStatus::Success,
            signature: Some(req.signature.clone()),
            transaction_hash: Some(tx_hash.clone()),
            gas_fee: Some("0.00021".to_string()),
            block_number: Some(rand::thread_rng().gen_range(18_000_000..19_000_000)),
            created_at: now.clone(),
            updated_at: Some(now),
        });

        Ok(TransferReceipt {
            tx_hash,
            status: TxStatus::Success,
            transaction_id: Some(id),
        })
    }

    async fn list_transactions(&self, address: &str) -> ApiResult<Vec<TransactionDetail>> {
        self.latency(self.delay).await;
        let state = self.state();
        let account = state.account()?;
        Ok(state
            .transactions
            .get(&account)
            .into_iter()
            .flatten()
            .rev()
            .filter(|tx| {
                tx.from_address.eq_ignore_ascii_case(address)
                    || tx.to_address.eq_ignore_ascii_case(address)
            })
            .cloned()
            .collect())
    }

    async fn get_transaction(&self, id: &str) -> ApiResult<TransactionDetail> {
        self.latency(self.delay).await;
        let state = self.state();
        let account = state.account()?;
        state
            .transactions
            .get(&account)
            .into_iter()
            .flatten()
            .find(|tx| tx.id == id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound("Transaction".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PHRASE: &str =
        "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
    const PHRASE_ADDRESS: &str = "0x9858EfFD232B4033E47d90003D41EC34EcaEda94";
    const PHRASE_KEY: &str = "0x1ab42cc412b618bdea3a599e3c9bae199ebf030895b039e9db1e30dafb12b727";
    const RECIPIENT: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";

    fn transfer(amount: &str, currency: Currency) -> TransferRequest {
        TransferRequest {
            from: PHRASE_ADDRESS.to_string(),
            to: RECIPIENT.to_string(),
            amount: amount.to_string(),
            currency,
        }
    }

    fn registration(name: &str) -> WalletRegistration {
        WalletRegistration {
            mnemonic: PHRASE.to_string(),
            wallet_name: name.to_string(),
            is_primary: false,
        }
    }

    /// Signed in, with the sender funded.
    async fn funded(api: MockApi) -> MockApi {
        api.login("alice@b.io", "pw").await.unwrap();
        api.set_balance(PHRASE_ADDRESS, 5.0);
        api
    }

    async fn sign_and_confirm(api: &MockApi, quote: &TransferQuote) -> ApiResult<TransferReceipt> {
        let signature = wallet::sign_message(PHRASE_KEY, &quote.message).unwrap();
        api.confirm_transfer(&ConfirmRequest {
            signature,
            message_hash: quote.message_hash.clone(),
            from: PHRASE_ADDRESS.to_string(),
            to: RECIPIENT.to_string(),
            amount: quote.eth_amount.clone(),
        })
        .await
    }

    #[tokio::test]
    async fn test_signup_then_duplicate() {
        let api = MockApi::instant();
        let req = SignupRequest {
            email: "a@b.io".to_string(),
            username: "alice".to_string(),
            password: "Correct-Horse-9".to_string(),
            wallet_address: None,
        };
        let session = api.signup(&req).await.unwrap();
        assert!(session.user_id.starts_with("user_"));
        assert!(session.tokens.access_token.starts_with("mock_access_"));

        let err = api.signup(&req).await.unwrap_err();
        assert_eq!(err.user_message(), "Email already registered");
    }

    #[tokio::test]
    async fn test_login_checks_known_password() {
        let api = MockApi::instant();
        let first = api.login("bob@b.io", "secret").await.unwrap();
        let again = api.login("bob@b.io", "secret").await.unwrap();
        assert_eq!(first.user_id, again.user_id);
        assert_eq!(first.username.as_deref(), Some("bob"));
        assert_eq!(
            api.login("bob@b.io", "wrong").await.unwrap_err(),
            ApiError::Unauthorized
        );
    }

    #[tokio::test]
    async fn test_profile_roundtrip() {
        let api = MockApi::instant();
        assert!(matches!(
            api.get_profile().await,
            Err(ApiError::NotFound(_))
        ));
        api.login("c@b.io", "pw").await.unwrap();
        let updated = api
            .update_profile(&ProfileUpdate {
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                phone_number: None,
            })
            .await
            .unwrap();
        assert_eq!(updated.first_name.as_deref(), Some("Ada"));
        assert_eq!(api.get_profile().await.unwrap().last_name.as_deref(), Some("Lovelace"));
    }

    #[tokio::test]
    async fn test_balance_is_stable() {
        let api = MockApi::instant();
        let a = api.get_balance(RECIPIENT).await.unwrap();
        let b = api.get_balance(RECIPIENT).await.unwrap();
        assert_eq!(a, b);
        let eth: f64 = a.balance.parse().unwrap();
        assert!((1.0..=10.0).contains(&eth));
    }

    #[tokio::test]
    async fn test_wallet_registration() {
        let api = MockApi::instant();
        api.login("alice@b.io", "pw").await.unwrap();
        let reg = registration("Main");
        api.import_wallet(&reg).await.unwrap();
        let wallets = api.list_wallets().await.unwrap();
        assert_eq!(wallets.len(), 1);
        assert_eq!(wallets[0].address, PHRASE_ADDRESS);
        // First wallet becomes primary
        assert!(wallets[0].is_primary);

        assert_eq!(
            api.import_wallet(&reg).await.unwrap_err().user_message(),
            "Wallet already exists"
        );
        let bad = WalletRegistration {
            mnemonic: "not a phrase".to_string(),
            ..reg
        };
        assert_eq!(
            api.create_wallet(&bad).await.unwrap_err().user_message(),
            "Invalid mnemonic phrase"
        );
    }

    #[tokio::test]
    async fn test_quote_conversion() {
        let api = MockApi::instant();
        let quote = api.initiate_transfer(&transfer("1.5", Currency::Eth)).await.unwrap();
        assert_eq!(quote.eth_amount, "1.5");
        assert_eq!(quote.usd_amount, "3750.00");
        assert_eq!(quote.message, format!("Transfer 1.5 ETH to {}", RECIPIENT));

        let quote = api.initiate_transfer(&transfer("50", Currency::Usd)).await.unwrap();
        assert_eq!(quote.eth_amount, "0.020000");
        assert_eq!(quote.usd_amount, "50");
        assert!(quote.expiry > now_millis());
    }

    #[tokio::test]
    async fn test_configured_price() {
        let api = MockApi::instant().with_eth_price(2000.0);
        assert_eq!(api.get_eth_price().await.unwrap(), 2000.0);
        let quote = api.initiate_transfer(&transfer("100", Currency::Usd)).await.unwrap();
        assert_eq!(quote.eth_amount, "0.050000");
    }

    #[tokio::test]
    async fn test_confirm_records_transaction() {
        let api = funded(MockApi::instant()).await;
        let quote = api.initiate_transfer(&transfer("1", Currency::Eth)).await.unwrap();
        let receipt = sign_and_confirm(&api, &quote).await.unwrap();
        assert_eq!(receipt.status, TxStatus::Success);

        let id = receipt.transaction_id.unwrap();
        let detail = api.get_transaction(&id).await.unwrap();
        assert_eq!(detail.transaction_hash.as_deref(), Some(receipt.tx_hash.as_str()));
        assert_eq!(api.list_transactions(RECIPIENT).await.unwrap().len(), 1);
        assert_eq!(api.get_balance(PHRASE_ADDRESS).await.unwrap().balance, "4.0000");

        // Quotes are single use
        assert!(matches!(
            sign_and_confirm(&api, &quote).await,
            Err(ApiError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_confirm_rejects_wrong_signer() {
        let api = funded(MockApi::instant()).await;
        let quote = api.initiate_transfer(&transfer("1", Currency::Eth)).await.unwrap();
        let other_key = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";
        let signature = wallet::sign_message(other_key, &quote.message).unwrap();
        let err = api
            .confirm_transfer(&ConfirmRequest {
                signature,
                message_hash: quote.message_hash.clone(),
                from: PHRASE_ADDRESS.to_string(),
                to: RECIPIENT.to_string(),
                amount: quote.eth_amount.clone(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Invalid signature");
    }

    #[tokio::test]
    async fn test_confirm_after_expiry() {
        let api = funded(MockApi::instant().with_expiry(Duration::ZERO)).await;
        let quote = api.initiate_transfer(&transfer("1", Currency::Eth)).await.unwrap();
        assert_eq!(
            sign_and_confirm(&api, &quote).await.unwrap_err(),
            ApiError::Expired
        );
    }

    #[tokio::test]
    async fn test_get_missing_transaction() {
        let api = MockApi::instant();
        api.login("alice@b.io", "pw").await.unwrap();
        assert_eq!(
            api.get_transaction("tx_0").await.unwrap_err().user_message(),
            "Transaction not found"
        );
    }

    #[tokio::test]
    async fn test_records_are_per_account() {
        let api = funded(MockApi::instant()).await;
        api.import_wallet(&registration("Main")).await.unwrap();
        let quote = api.initiate_transfer(&transfer("1", Currency::Eth)).await.unwrap();
        let id = sign_and_confirm(&api, &quote).await.unwrap().transaction_id.unwrap();

        api.login("bob@b.io", "pw").await.unwrap();
        assert!(api.list_wallets().await.unwrap().is_empty());
        assert!(api.list_transactions(PHRASE_ADDRESS).await.unwrap().is_empty());
        assert!(matches!(
            api.get_transaction(&id).await,
            Err(ApiError::NotFound(_))
        ));
        // Same phrase registers independently under another account
        api.import_wallet(&registration("Bob's")).await.unwrap();
        assert!(api.list_wallets().await.unwrap()[0].is_primary);

        api.login("alice@b.io", "pw").await.unwrap();
        let wallets = api.list_wallets().await.unwrap();
        assert_eq!(wallets.len(), 1);
        assert_eq!(wallets[0].wallet_name, "Main");
        assert_eq!(api.get_transaction(&id).await.unwrap().id, id);
    }

    #[tokio::test]
    async fn test_records_need_a_session() {
        let api = MockApi::instant();
        assert_eq!(api.list_wallets().await.unwrap_err(), ApiError::SessionExpired);
        assert_eq!(
            api.import_wallet(&registration("Main")).await.unwrap_err(),
            ApiError::SessionExpired
        );
        api.login("alice@b.io", "pw").await.unwrap();
        api.logout().await.unwrap();
        assert_eq!(
            api.list_transactions(PHRASE_ADDRESS).await.unwrap_err(),
            ApiError::SessionExpired
        );
    }
}
