//! Backend API client.
//!
//! [`WalletApi`] is implemented by [`MockApi`], an in-memory stand-in with
//! artificial latency, and [`RestApi`], which talks to the HTTP backend and
//! transparently refreshes expired access tokens.

mod mock;
mod rest;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use mock::MockApi;
pub use rest::RestApi;

use crate::domain::models::{
    AuthSession, BalanceInfo, Currency, Profile, RemoteWallet, TransactionDetail, TransferQuote,
    TransferReceipt,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Session expired")]
    SessionExpired,
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },
    #[error("Network error: {0}")]
    Network(String),
    #[error("Invalid response: {0}")]
    Decode(String),
    #[error("Transfer quote expired")]
    Expired,
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
    #[error("Storage error: {0}")]
    Store(String),
}

impl ApiError {
    /// Short text for a notification.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Unauthorized => "Invalid email or password".to_string(),
            ApiError::SessionExpired => "Session expired. Please log in again.".to_string(),
            ApiError::Http { status, message } if message.is_empty() => {
                format!("Request failed ({})", status)
            }
            ApiError::Http { message, .. } => message.clone(),
            ApiError::Network(_) => "Network error. Please check your connection.".to_string(),
            ApiError::Decode(_) => "Unexpected response from server".to_string(),
            ApiError::Expired => "Transaction expired".to_string(),
            ApiError::NotFound(what) => format!("{} not found", what),
            ApiError::Validation(message) => message.clone(),
            ApiError::Store(_) => "Failed to access local storage".to_string(),
        }
    }

    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Network(_) => true,
            ApiError::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<color_eyre::Report> for ApiError {
    fn from(err: color_eyre::Report) -> Self {
        ApiError::Store(err.to_string())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Request for a transfer quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub from: String,
    pub to: String,
    /// Amount in `currency` units, as entered.
    pub amount: String,
    pub currency: Currency,
}

/// Signed confirmation of a quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmRequest {
    pub signature: String,
    pub message_hash: String,
    pub from: String,
    pub to: String,
    /// ETH amount from the quote.
    pub amount: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub username: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

/// Wallet registration on the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletRegistration {
    pub mnemonic: String,
    pub wallet_name: String,
    pub is_primary: bool,
}

#[async_trait]
pub trait WalletApi: Send + Sync {
    async fn signup(&self, req: &SignupRequest) -> ApiResult<AuthSession>;

    async fn login(&self, email: &str, password: &str) -> ApiResult<AuthSession>;

    async fn logout(&self) -> ApiResult<()>;

    async fn get_profile(&self) -> ApiResult<Profile>;

    async fn update_profile(&self, update: &ProfileUpdate) -> ApiResult<Profile>;

    /// Register a freshly generated wallet.
    async fn create_wallet(&self, reg: &WalletRegistration) -> ApiResult<()>;

    /// Register an existing wallet from its recovery phrase.
    async fn import_wallet(&self, reg: &WalletRegistration) -> ApiResult<()>;

    async fn list_wallets(&self) -> ApiResult<Vec<RemoteWallet>>;

    async fn get_balance(&self, address: &str) -> ApiResult<BalanceInfo>;

    /// Current ETH price in USD.
    async fn get_eth_price(&self) -> ApiResult<f64>;

    async fn initiate_transfer(&self, req: &TransferRequest) -> ApiResult<TransferQuote>;

    async fn confirm_transfer(&self, req: &ConfirmRequest) -> ApiResult<TransferReceipt>;

    /// Transactions touching `address`, newest first.
    async fn list_transactions(&self, address: &str) -> ApiResult<Vec<TransactionDetail>>;

    async fn get_transaction(&self, id: &str) -> ApiResult<TransactionDetail>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages() {
        assert_eq!(
            ApiError::Http {
                status: 400,
                message: "Email already registered".to_string()
            }
            .user_message(),
            "Email already registered"
        );
        assert_eq!(
            ApiError::Http {
                status: 502,
                message: String::new()
            }
            .user_message(),
            "Request failed (502)"
        );
        assert_eq!(
            ApiError::NotFound("Transaction".to_string()).user_message(),
            "Transaction not found"
        );
    }

    #[test]
    fn test_transient() {
        assert!(ApiError::Network("reset".to_string()).is_transient());
        assert!(ApiError::Http {
            status: 503,
            message: String::new()
        }
        .is_transient());
        assert!(!ApiError::Http {
            status: 404,
            message: String::new()
        }
        .is_transient());
        assert!(!ApiError::SessionExpired.is_transient());
    }
}
