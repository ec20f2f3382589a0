//! Records persisted locally and exchanged with the backend.

use serde::{Deserialize, Deserializer, Serialize};
use strum::Display;

/// The signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct User {
    pub user_id: String,
    pub email: String,
    pub username: String,
    pub is_logged_in: bool,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl User {
    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) if !first.is_empty() && !last.is_empty() => {
                format!("{} {}", first, last)
            }
            _ => self.username.clone(),
        }
    }
}

/// The active wallet.
///
/// Wallets generated or imported locally carry their key material. A wallet
/// picked from the backend list only knows its address and cannot sign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Wallet {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub wallet_name: Option<String>,
    #[serde(default)]
    pub is_primary: bool,
    #[serde(default)]
    pub mnemonic: Option<String>,
    pub address: String,
    #[serde(default)]
    pub private_key: Option<String>,
    /// ETH balance, 4 decimals.
    pub balance: String,
}

impl Wallet {
    pub fn can_sign(&self) -> bool {
        self.private_key.is_some()
    }

    pub fn label(&self) -> String {
        self.wallet_name
            .clone()
            .unwrap_or_else(|| "Main Wallet".to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TxKind {
    Sent,
    Received,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TxStatus {
    #[serde(alias = "completed")]
    Success,
    Pending,
    Failed,
}

/// A transaction in the local history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub kind: TxKind,
    /// ETH amount as entered/confirmed.
    pub amount: String,
    /// Counterparty address.
    pub address: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub status: TxStatus,
    #[serde(default)]
    pub tx_hash: Option<String>,
    #[serde(default)]
    pub signature: Option<String>,
}

/// Access/refresh token pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
}

/// A wallet as listed by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteWallet {
    pub id: String,
    pub address: String,
    #[serde(deserialize_with = "number_or_string")]
    pub balance: f64,
    pub wallet_name: String,
    pub is_primary: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Full transaction record as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionDetail {
    pub id: String,
    pub from_address: String,
    pub to_address: String,
    pub amount: String,
    pub status: TxStatus,
    #[serde(default)]
    pub signature: Option<String>,
    #[serde(default)]
    pub transaction_hash: Option<String>,
    #[serde(default)]
    pub gas_fee: Option<String>,
    #[serde(default)]
    pub block_number: Option<u64>,
    pub created_at: String,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl TransactionDetail {
    /// Direction of this transaction from the point of view of `address`.
    pub fn kind_for(&self, address: &str) -> TxKind {
        if self.from_address.eq_ignore_ascii_case(address) {
            TxKind::Sent
        } else {
            TxKind::Received
        }
    }
}

/// Editable profile fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Profile {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[strum(serialize = "ETH")]
    Eth,
    #[strum(serialize = "USD")]
    Usd,
}

impl Currency {
    pub fn toggle(self) -> Self {
        match self {
            Currency::Eth => Currency::Usd,
            Currency::Usd => Currency::Eth,
        }
    }
}

/// Balance snapshot for an address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceInfo {
    pub balance: String,
    pub usd_value: String,
}

/// A pending transfer the user has to sign before it expires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferQuote {
    pub message: String,
    pub message_hash: String,
    pub eth_amount: String,
    pub usd_amount: String,
    /// Expiry in milliseconds since the Unix epoch.
    pub expiry: i64,
}

impl TransferQuote {
    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        now_ms >= self.expiry
    }

    /// Whole seconds left before expiry, clamped at zero.
    pub fn seconds_left(&self, now_ms: i64) -> u64 {
        if now_ms >= self.expiry {
            0
        } else {
            ((self.expiry - now_ms) as u64).div_ceil(1000)
        }
    }
}

/// Backend acknowledgement of a confirmed transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
    pub tx_hash: String,
    pub status: TxStatus,
    #[serde(default)]
    pub transaction_id: Option<String>,
}

/// Result of signup/login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub user_id: String,
    pub tokens: AuthTokens,
    #[serde(default)]
    pub wallet_address: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

/// Backends send balances either as JSON numbers or as decimal strings.
fn number_or_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }
    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Current time in milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
