use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::{
    ApiError, ApiResult, ConfirmRequest, ProfileUpdate, SignupRequest, TransferRequest,
    WalletApi, WalletRegistration,
};
use crate::{
    config::ApiConfig,
    domain::models::{
        AuthSession, AuthTokens, BalanceInfo, Profile, RemoteWallet, TransactionDetail,
        TransferQuote, TransferReceipt,
    },
    infra::store::Store,
};

#[derive(Deserialize)]
struct AuthResponse {
    #[serde(alias = "userId")]
    user_id: String,
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    username: Option<String>,
    #[serde(default, alias = "walletAddress")]
    wallet_address: Option<String>,
}

#[derive(Deserialize)]
struct RefreshResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Profile endpoints answer either `{ "user": {...} }` or the bare record.
#[derive(Deserialize)]
#[serde(untagged)]
enum ProfileEnvelope {
    Nested { user: Profile },
    Flat(Profile),
}

impl ProfileEnvelope {
    fn into_profile(self) -> Profile {
        match self {
            ProfileEnvelope::Nested { user } => user,
            ProfileEnvelope::Flat(profile) => profile,
        }
    }
}

#[derive(Deserialize)]
struct SuccessResponse {
    success: bool,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize)]
struct WalletsResponse {
    #[serde(default)]
    wallets: Vec<RemoteWallet>,
}

#[derive(Deserialize)]
struct BalanceResponse {
    #[serde(deserialize_with = "string_or_number")]
    balance: String,
    #[serde(deserialize_with = "string_or_number")]
    usd_value: String,
}

#[derive(Deserialize)]
struct PriceResponse {
    success: bool,
    #[serde(default)]
    price: f64,
}

#[derive(Deserialize)]
struct TransactionsResponse {
    #[serde(default)]
    transactions: Vec<TransactionDetail>,
}

#[derive(Deserialize)]
struct TransactionResponse {
    transaction: TransactionDetail,
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}

/// Pull a human readable message out of an error body.
fn error_message(body: &str) -> Option<String> {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        return ["message", "error", "detail"]
            .iter()
            .find_map(|key| value.get(key).and_then(Value::as_str))
            .map(str::to_string);
    }
    let body = body.trim();
    (!body.is_empty() && body.len() <= 200).then(|| body.to_string())
}

/// HTTP backend client.
///
/// Authenticated requests carry the access token from the [`Store`]. A 401
/// triggers one refresh through `/auth/refresh` followed by one replay of
/// the request; if either fails the local session is wiped and
/// [`ApiError::SessionExpired`] is returned.
pub struct RestApi {
    client: reqwest::Client,
    base_url: String,
    store: Store,
    max_retries: u32,
    retry_backoff: Duration,
    refresh_lock: tokio::sync::Mutex<()>,
}

impl RestApi {
    pub fn new(config: &ApiConfig, store: Store) -> ApiResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            store,
            max_retries: config.max_retries,
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
            refresh_lock: tokio::sync::Mutex::new(()),
        })
    }

    async fn send_once(
        &self,
        method: &Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
        token: Option<&str>,
    ) -> ApiResult<Response> {
        let mut request = self
            .client
            .request(method.clone(), format!("{}{}", self.base_url, path));
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))
    }

    /// Send, retrying GETs on transient failures with exponential backoff.
    async fn send_with_retry(
        &self,
        method: &Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
        token: Option<&str>,
    ) -> ApiResult<Response> {
        let attempts = if *method == Method::GET {
            self.max_retries + 1
        } else {
            1
        };

        let mut attempt = 0;
        loop {
            attempt += 1;
            let result = self.send_once(method, path, query, body, token).await;
            let retryable = match &result {
                Ok(resp) => resp.status().is_server_error(),
                Err(e) => e.is_transient(),
            };
            if !retryable || attempt >= attempts {
                return result;
            }

            let delay = backoff_delay(self.retry_backoff, attempt);
            warn!(
                "{} {} failed (attempt {}/{}), retrying in {:?}",
                method, path, attempt, attempts, delay
            );
            tokio::time::sleep(delay).await;
        }
    }

    fn force_logout(&self) -> ApiResult<ApiError> {
        warn!("Session could not be refreshed, clearing local data");
        self.store.clear_all()?;
        Ok(ApiError::SessionExpired)
    }

    /// Obtain a fresh access token after `failed` was rejected.
    async fn refresh(&self, failed: Option<&str>) -> ApiResult<String> {
        let _guard = self.refresh_lock.lock().await;

        let Some(tokens) = self.store.auth_tokens()? else {
            return Err(self.force_logout()?);
        };
        // Another request refreshed while we waited for the lock
        if failed.is_some_and(|t| t != tokens.access_token) {
            return Ok(tokens.access_token);
        }

        let body = json!({ "refresh_token": tokens.refresh_token });
        let response = self
            .send_once(&Method::POST, "/auth/refresh", &[], Some(&body), None)
            .await;
        let refreshed = match response {
            Ok(resp) if resp.status().is_success() => resp.json::<RefreshResponse>().await.ok(),
            Ok(resp) => {
                debug!("Token refresh rejected with {}", resp.status());
                None
            }
            Err(e) => {
                debug!("Token refresh failed: {}", e);
                None
            }
        };

        match refreshed {
            Some(refreshed) => {
                let tokens = AuthTokens {
                    access_token: refreshed.access_token,
                    refresh_token: refreshed.refresh_token.unwrap_or(tokens.refresh_token),
                };
                self.store.set_auth_tokens(&tokens)?;
                info!("Access token refreshed");
                Ok(tokens.access_token)
            }
            None => Err(self.force_logout()?),
        }
    }

    /// Run a request and return the successful response.
    async fn execute(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<Value>,
        auth: bool,
    ) -> ApiResult<Response> {
        let token = if auth {
            self.store.auth_tokens()?.map(|t| t.access_token)
        } else {
            None
        };

        let mut response = self
            .send_with_retry(&method, path, query, body.as_ref(), token.as_deref())
            .await?;

        if auth && response.status() == StatusCode::UNAUTHORIZED {
            debug!("{} {} unauthorized, refreshing token", method, path);
            let fresh = self.refresh(token.as_deref()).await?;
            response = self
                .send_once(&method, path, query, body.as_ref(), Some(&fresh))
                .await?;
            if response.status() == StatusCode::UNAUTHORIZED {
                return Err(self.force_logout()?);
            }
        }

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = error_message(&text).unwrap_or_default();
        debug!("{} {} failed with {}: {}", method, path, status, message);
        Err(match status {
            StatusCode::UNAUTHORIZED if message.is_empty() => ApiError::Unauthorized,
            StatusCode::NOT_FOUND => ApiError::NotFound("Resource".to_string()),
            _ => ApiError::Http {
                status: status.as_u16(),
                message,
            },
        })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<Value>,
        auth: bool,
    ) -> ApiResult<T> {
        let response = self.execute(method, path, query, body, auth).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn register_wallet(&self, path: &str, reg: &WalletRegistration) -> ApiResult<()> {
        let resp: SuccessResponse = self
            .call(Method::POST, path, &[], Some(to_value(reg)?), true)
            .await?;
        if resp.success {
            Ok(())
        } else {
            Err(ApiError::Validation(
                resp.message
                    .unwrap_or_else(|| "Failed to register wallet".to_string()),
            ))
        }
    }
}

/// Largest doubling applied to the base backoff.
const MAX_BACKOFF_SHIFT: u32 = 10;

/// Delay before retrying after `attempt` failed attempts.
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let shift = attempt.saturating_sub(1).min(MAX_BACKOFF_SHIFT);
    base.saturating_mul(1 << shift)
}

fn to_value<T: serde::Serialize>(value: &T) -> ApiResult<Value> {
    serde_json::to_value(value).map_err(|e| ApiError::Decode(e.to_string()))
}

impl From<AuthResponse> for AuthSession {
    fn from(resp: AuthResponse) -> Self {
        AuthSession {
            user_id: resp.user_id,
            tokens: AuthTokens {
                access_token: resp.access_token,
                refresh_token: resp.refresh_token,
            },
            wallet_address: resp.wallet_address,
            username: resp.username,
        }
    }
}

#[async_trait]
impl WalletApi for RestApi {
    async fn signup(&self, req: &SignupRequest) -> ApiResult<AuthSession> {
        let resp: AuthResponse = self
            .call(Method::POST, "/auth/signup", &[], Some(to_value(req)?), false)
            .await?;
        Ok(resp.into())
    }

    async fn login(&self, email: &str, password: &str) -> ApiResult<AuthSession> {
        let body = json!({ "email": email, "password": password });
        let resp: AuthResponse = self
            .call(Method::POST, "/auth/login", &[], Some(body), false)
            .await?;
        Ok(resp.into())
    }

    async fn logout(&self) -> ApiResult<()> {
        self.execute(Method::POST, "/auth/logout", &[], None, true)
            .await?;
        Ok(())
    }

    async fn get_profile(&self) -> ApiResult<Profile> {
        let resp: ProfileEnvelope = self
            .call(Method::GET, "/auth/profile", &[], None, true)
            .await?;
        Ok(resp.into_profile())
    }

    async fn update_profile(&self, update: &ProfileUpdate) -> ApiResult<Profile> {
        let resp: ProfileEnvelope = self
            .call(Method::PUT, "/auth/profile", &[], Some(to_value(update)?), true)
            .await?;
        Ok(resp.into_profile())
    }

    async fn create_wallet(&self, reg: &WalletRegistration) -> ApiResult<()> {
        self.register_wallet("/wallet/create", reg).await
    }

    async fn import_wallet(&self, reg: &WalletRegistration) -> ApiResult<()> {
        self.register_wallet("/wallet/import", reg).await
    }

    async fn list_wallets(&self) -> ApiResult<Vec<RemoteWallet>> {
        let resp: WalletsResponse = self
            .call(Method::GET, "/wallet/list", &[], None, true)
            .await?;
        Ok(resp.wallets)
    }

    async fn get_balance(&self, address: &str) -> ApiResult<BalanceInfo> {
        let resp: BalanceResponse = self
            .call(
                Method::GET,
                &format!("/wallet/balance/{}", address),
                &[],
                None,
                true,
            )
            .await?;
        Ok(BalanceInfo {
            balance: resp.balance,
            usd_value: resp.usd_value,
        })
    }

    async fn get_eth_price(&self) -> ApiResult<f64> {
        let resp: PriceResponse = self
            .call(Method::GET, "/wallet/price/eth", &[], None, false)
            .await?;
        if resp.success && resp.price > 0.0 {
            Ok(resp.price)
        } else {
            Err(ApiError::Decode("price unavailable".to_string()))
        }
    }

    async fn initiate_transfer(&self, req: &TransferRequest) -> ApiResult<TransferQuote> {
        self.call(
            Method::POST,
            "/transactions/initiate",
            &[],
            Some(to_value(req)?),
            true,
        )
        .await
    }

    async fn confirm_transfer(&self, req: &ConfirmRequest) -> ApiResult<TransferReceipt> {
        self.call(
            Method::POST,
            "/transactions/confirm",
            &[],
            Some(to_value(req)?),
            true,
        )
        .await
    }

    async fn list_transactions(&self, address: &str) -> ApiResult<Vec<TransactionDetail>> {
        let resp: TransactionsResponse = self
            .call(
                Method::GET,
                "/transactions",
                &[("address", address)],
                None,
                true,
            )
            .await?;
        Ok(resp.transactions)
    }

    async fn get_transaction(&self, id: &str) -> ApiResult<TransactionDetail> {
        let resp: TransactionResponse = self
            .call(Method::GET, &format!("/transactions/{}", id), &[], None, true)
            .await
            .map_err(|e| match e {
                ApiError::NotFound(_) => ApiError::NotFound("Transaction".to_string()),
                other => other,
            })?;
        Ok(resp.transaction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_from_json() {
        assert_eq!(
            error_message(r#"{"message": "Email already registered"}"#).as_deref(),
            Some("Email already registered")
        );
        assert_eq!(
            error_message(r#"{"error": "Invalid token"}"#).as_deref(),
            Some("Invalid token")
        );
        assert_eq!(error_message(r#"{"code": 7}"#), None);
    }

    #[test]
    fn test_error_message_from_text() {
        assert_eq!(error_message("Bad Gateway").as_deref(), Some("Bad Gateway"));
        assert_eq!(error_message("   "), None);
    }

    #[test]
    fn test_profile_envelope() {
        let nested: ProfileEnvelope =
            serde_json::from_str(r#"{"user": {"first_name": "Ada"}}"#).unwrap();
        assert_eq!(nested.into_profile().first_name.as_deref(), Some("Ada"));
        let flat: ProfileEnvelope = serde_json::from_str(r#"{"first_name": "Bob"}"#).unwrap();
        assert_eq!(flat.into_profile().first_name.as_deref(), Some("Bob"));
    }

    #[test]
    fn test_balance_accepts_numbers() {
        let resp: BalanceResponse =
            serde_json::from_str(r#"{"balance": 1.5, "usd_value": "3750.00"}"#).unwrap();
        assert_eq!(resp.balance, "1.5");
        assert_eq!(resp.usd_value, "3750.00");
    }

    #[test]
    fn test_wallet_list_accepts_string_balances() {
        let resp: WalletsResponse = serde_json::from_str(
            r#"{"wallets": [
                {"id": "w1", "address": "0xabc", "balance": "2.5", "wallet_name": "Main", "is_primary": true},
                {"id": "w2", "address": "0xdef", "balance": 0.75, "wallet_name": "Savings", "is_primary": false}
            ]}"#,
        )
        .unwrap();
        assert_eq!(resp.wallets[0].balance, 2.5);
        assert_eq!(resp.wallets[1].balance, 0.75);
    }

    #[test]
    fn test_backoff_is_capped() {
        let base = Duration::from_millis(300);
        assert_eq!(backoff_delay(base, 1), base);
        assert_eq!(backoff_delay(base, 3), base * 4);
        // Large retry counts from config must not overflow
        assert_eq!(backoff_delay(base, 40), base * 1024);
        assert_eq!(backoff_delay(base, u32::MAX), base * 1024);
    }
}
