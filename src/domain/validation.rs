//! Form input validation.
//!
//! Each validator returns the first failing rule as a [`ValidationError`]
//! whose message is shown to the user verbatim.

use thiserror::Error;

use crate::domain::{amount::Wei, crypto};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

pub type ValidationResult<T> = Result<T, ValidationError>;

const EMAIL_MAX_LEN: usize = 255;
const PASSWORD_MIN_LEN: usize = 12;
const PASSWORD_MAX_LEN: usize = 128;
const USERNAME_MIN_LEN: usize = 3;
const USERNAME_MAX_LEN: usize = 30;

fn is_email(s: &str) -> bool {
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    if local.starts_with('.') || local.ends_with('.') || local.contains("..") {
        return false;
    }
    if !local
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "._%+-'".contains(c))
    {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return false;
    }
    let labels_ok = labels.iter().all(|label| {
        !label.is_empty()
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    });
    let tld = labels[labels.len() - 1];
    labels_ok && tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic())
}

/// Validate and normalize (trim) an email address.
pub fn validate_email(email: &str) -> ValidationResult<String> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ValidationError::new("email", "Email is required"));
    }
    if !is_email(email) {
        return Err(ValidationError::new("email", "Invalid email address"));
    }
    if email.chars().count() > EMAIL_MAX_LEN {
        return Err(ValidationError::new(
            "email",
            "Email must be less than 255 characters",
        ));
    }
    Ok(email.to_string())
}

/// Validate password strength.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    let len = password.chars().count();
    if len < PASSWORD_MIN_LEN {
        return Err(ValidationError::new(
            "password",
            "Password must be at least 12 characters",
        ));
    }
    if len > PASSWORD_MAX_LEN {
        return Err(ValidationError::new(
            "password",
            "Password must be less than 128 characters",
        ));
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(ValidationError::new(
            "password",
            "Password must contain at least one lowercase letter",
        ));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(ValidationError::new(
            "password",
            "Password must contain at least one uppercase letter",
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(ValidationError::new(
            "password",
            "Password must contain at least one number",
        ));
    }
    if password.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::new(
            "password",
            "Password must contain at least one special character",
        ));
    }
    Ok(())
}

/// Validate and normalize (trim) a username.
pub fn validate_username(username: &str) -> ValidationResult<String> {
    let username = username.trim();
    let len = username.chars().count();
    if len < USERNAME_MIN_LEN {
        return Err(ValidationError::new(
            "username",
            "Username must be at least 3 characters",
        ));
    }
    if len > USERNAME_MAX_LEN {
        return Err(ValidationError::new(
            "username",
            "Username must be less than 30 characters",
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(ValidationError::new(
            "username",
            "Username can only contain letters, numbers, underscores, and hyphens",
        ));
    }
    Ok(username.to_string())
}

/// Validate a recipient address and return it checksummed.
pub fn validate_address(address: &str) -> ValidationResult<String> {
    let address = address.trim();
    if address.is_empty() {
        return Err(ValidationError::new("recipient", "Address is required"));
    }
    match crypto::parse_address(address) {
        Some(bytes) => Ok(crypto::to_checksum_address(&bytes)),
        None => Err(ValidationError::new("recipient", "Invalid Ethereum address")),
    }
}

/// Validate a positive amount with at most 18 decimals.
pub fn validate_amount(amount: &str) -> ValidationResult<Wei> {
    let amount = amount.trim();
    if amount.is_empty() {
        return Err(ValidationError::new("amount", "Amount is required"));
    }
    let positive = || ValidationError::new("amount", "Amount must be greater than 0");
    if !amount.parse::<f64>().is_ok_and(|v| v > 0.0) {
        return Err(positive());
    }
    let decimals = amount.split('.').nth(1).map(str::len).unwrap_or(0);
    if decimals > crate::domain::amount::ETH_DECIMALS {
        return Err(ValidationError::new("amount", "Too many decimal places"));
    }
    match Wei::parse_eth(amount) {
        Ok(wei) if !wei.is_zero() => Ok(wei),
        _ => Err(positive()),
    }
}

/// Validate the shape of a recovery phrase and return it normalized.
///
/// This only checks the word count and alphabet; the BIP39 checksum is
/// verified on import.
pub fn validate_mnemonic(phrase: &str) -> ValidationResult<String> {
    let words: Vec<&str> = phrase.split_whitespace().collect();
    if words.len() != 12 && words.len() != 24 {
        return Err(ValidationError::new(
            "mnemonic",
            "Mnemonic must be 12 or 24 words",
        ));
    }
    if !words
        .iter()
        .all(|w| w.chars().all(|c| c.is_ascii_lowercase()))
    {
        return Err(ValidationError::new(
            "mnemonic",
            "Mnemonic words must contain only lowercase letters",
        ));
    }
    Ok(words.join(" "))
}

/// Validate a wallet display name.
pub fn validate_wallet_name(name: &str) -> ValidationResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::new("wallet_name", "Wallet name is required"));
    }
    Ok(name.to_string())
}

fn is_phone(s: &str) -> bool {
    let digits = s.strip_prefix('+').unwrap_or(s);
    !digits.is_empty()
        && digits
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_whitespace() || "-()".contains(c))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupForm {
    pub email: String,
    pub username: String,
    pub password: String,
}

/// Validate the signup form.
pub fn validate_signup(
    email: &str,
    username: &str,
    password: &str,
    confirm_password: &str,
) -> ValidationResult<SignupForm> {
    let email = validate_email(email)?;
    let username = validate_username(username)?;
    validate_password(password)?;
    if password != confirm_password {
        return Err(ValidationError::new(
            "confirm_password",
            "Passwords don't match",
        ));
    }
    Ok(SignupForm {
        email,
        username,
        password: password.to_string(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Validate the login form.
pub fn validate_login(email: &str, password: &str) -> ValidationResult<LoginForm> {
    let email = validate_email(email)?;
    if password.is_empty() {
        return Err(ValidationError::new("password", "Password is required"));
    }
    Ok(LoginForm {
        email,
        password: password.to_string(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendForm {
    pub recipient: String,
    pub amount: Wei,
}

/// Validate the send form. `amount` is in ETH.
pub fn validate_send(recipient: &str, amount: &str) -> ValidationResult<SendForm> {
    let recipient = validate_address(recipient)?;
    let amount = validate_amount(amount)?;
    Ok(SendForm { recipient, amount })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileForm {
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
}

/// Validate the profile form.
pub fn validate_profile(
    first_name: &str,
    last_name: &str,
    phone_number: &str,
) -> ValidationResult<ProfileForm> {
    let first_name = first_name.trim();
    if first_name.is_empty() {
        return Err(ValidationError::new("first_name", "First name is required"));
    }
    let last_name = last_name.trim();
    if last_name.is_empty() {
        return Err(ValidationError::new("last_name", "Last name is required"));
    }
    let phone_number = phone_number.trim();
    if !phone_number.is_empty() && !is_phone(phone_number) {
        return Err(ValidationError::new(
            "phone_number",
            "Invalid phone number format",
        ));
    }
    Ok(ProfileForm {
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        phone_number: (!phone_number.is_empty()).then(|| phone_number.to_string()),
    })
}
