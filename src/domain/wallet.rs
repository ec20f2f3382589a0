//! Wallet module for BIP39 mnemonics, BIP32 key derivation and message signing.
//!
//! Derivation path: m/44'/60'/0'/0/0
//!   - 60 = Ethereum coin type
//!   - Only the first external address of the first account is used.

use bip32::{DerivationPath, XPrv};
use bip39::Mnemonic;
use rand::{rngs::OsRng, RngCore};
use secp256k1::{
    ecdsa::{RecoverableSignature, RecoveryId},
    Message, PublicKey, Secp256k1, SecretKey,
};
use thiserror::Error;
use zeroize::Zeroizing;

use crate::domain::{
    crypto::{hash_message, public_key_to_address},
    models::Wallet,
};

/// Ethereum coin type for BIP44 derivation.
const ETH_COIN_TYPE: u32 = 60;

/// Fallback ETH/USD price when the price feed is unavailable.
pub const DEFAULT_ETH_PRICE: f64 = 2500.0;

/// Word count of freshly generated phrases.
pub const DEFAULT_WORD_COUNT: usize = 12;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("Invalid mnemonic phrase")]
    InvalidMnemonic,
    #[error("Invalid private key")]
    InvalidPrivateKey,
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("Key derivation failed: {0}")]
    Derivation(String),
}

/// Generate a new random mnemonic with 12 or 24 words.
pub fn generate_mnemonic(word_count: usize) -> Result<Mnemonic, WalletError> {
    let entropy_len = match word_count {
        12 => 16,
        24 => 32,
        _ => return Err(WalletError::InvalidMnemonic),
    };
    let mut entropy = Zeroizing::new([0u8; 32]);
    OsRng.fill_bytes(&mut entropy[..entropy_len]);
    Mnemonic::from_entropy(&entropy[..entropy_len]).map_err(|_| WalletError::InvalidMnemonic)
}

/// Parse mnemonic from user input (whitespace-separated words).
pub fn parse_mnemonic(words: &str) -> Result<Mnemonic, WalletError> {
    let normalized = words.split_whitespace().collect::<Vec<_>>().join(" ");
    Mnemonic::parse_normalized(&normalized).map_err(|_| WalletError::InvalidMnemonic)
}

/// Derive the secret key at m/44'/60'/account'/0/index.
pub fn derive_secret_key(
    mnemonic: &Mnemonic,
    account: u32,
    index: u32,
) -> Result<SecretKey, WalletError> {
    let seed = Zeroizing::new(mnemonic.to_seed(""));
    let path: DerivationPath = format!("m/44'/{}'/{}'/0/{}", ETH_COIN_TYPE, account, index)
        .parse()
        .map_err(|e: bip32::Error| WalletError::Derivation(e.to_string()))?;
    let xprv = XPrv::derive_from_path(&seed[..], &path)
        .map_err(|e| WalletError::Derivation(e.to_string()))?;

    let key_bytes: Zeroizing<[u8; 32]> = Zeroizing::new(xprv.private_key().to_bytes().into());
    SecretKey::from_slice(&key_bytes[..]).map_err(|_| WalletError::InvalidPrivateKey)
}

fn wallet_from_mnemonic(mnemonic: &Mnemonic) -> Result<Wallet, WalletError> {
    let secret = derive_secret_key(mnemonic, 0, 0)?;
    let secp = Secp256k1::new();
    let public = PublicKey::from_secret_key(&secp, &secret);

    Ok(Wallet {
        id: None,
        wallet_name: None,
        is_primary: true,
        mnemonic: Some(mnemonic.to_string()),
        address: public_key_to_address(&public),
        private_key: Some(format!("0x{}", hex::encode(secret.secret_bytes()))),
        balance: "0.0000".to_string(),
    })
}

/// Create a brand-new wallet with a random 12-word phrase.
pub fn generate_wallet() -> Result<Wallet, WalletError> {
    let mnemonic = generate_mnemonic(DEFAULT_WORD_COUNT)?;
    wallet_from_mnemonic(&mnemonic)
}

/// Restore a wallet from its recovery phrase.
pub fn import_wallet(phrase: &str) -> Result<Wallet, WalletError> {
    let mnemonic = parse_mnemonic(phrase)?;
    wallet_from_mnemonic(&mnemonic)
}

fn parse_secret_key(private_key: &str) -> Result<SecretKey, WalletError> {
    let hex_str = private_key.trim();
    let hex_str = hex_str.strip_prefix("0x").unwrap_or(hex_str);
    let bytes = Zeroizing::new(hex::decode(hex_str).map_err(|_| WalletError::InvalidPrivateKey)?);
    SecretKey::from_slice(&bytes).map_err(|_| WalletError::InvalidPrivateKey)
}

/// Sign `message` as an EIP-191 personal message.
///
/// Returns `0x` + r (32B) || s (32B) || v (1B, 27 or 28).
pub fn sign_message(private_key: &str, message: &str) -> Result<String, WalletError> {
    let secret = parse_secret_key(private_key)?;
    let digest = hash_message(message.as_bytes());

    let secp = Secp256k1::new();
    let signature = secp.sign_ecdsa_recoverable(&Message::from_digest(digest), &secret);
    let (recovery_id, compact) = signature.serialize_compact();

    let mut out = [0u8; 65];
    out[..64].copy_from_slice(&compact);
    out[64] = recovery_id.to_i32() as u8 + 27;
    Ok(format!("0x{}", hex::encode(out)))
}

/// Recover the checksummed address that produced `signature` over `message`.
pub fn recover_address(message: &str, signature: &str) -> Result<String, WalletError> {
    let sig_hex = signature.trim();
    let sig_hex = sig_hex.strip_prefix("0x").unwrap_or(sig_hex);
    let bytes = hex::decode(sig_hex).map_err(|_| WalletError::InvalidSignature)?;
    if bytes.len() != 65 {
        return Err(WalletError::InvalidSignature);
    }

    let v = match bytes[64] {
        27 | 28 => bytes[64] - 27,
        0 | 1 => bytes[64],
        _ => return Err(WalletError::InvalidSignature),
    };
    let recovery_id =
        RecoveryId::from_i32(v as i32).map_err(|_| WalletError::InvalidSignature)?;
    let signature = RecoverableSignature::from_compact(&bytes[..64], recovery_id)
        .map_err(|_| WalletError::InvalidSignature)?;

    let digest = hash_message(message.as_bytes());
    let secp = Secp256k1::new();
    let public = secp
        .recover_ecdsa(&Message::from_digest(digest), &signature)
        .map_err(|_| WalletError::InvalidSignature)?;
    Ok(public_key_to_address(&public))
}

/// Short form of an address: `0x1234...abcd`.
pub fn format_address(address: &str) -> String {
    if address.len() <= 10 {
        return address.to_string();
    }
    format!("{}...{}", &address[..6], &address[address.len() - 4..])
}

/// Convert an ETH amount string to USD with 2 decimals.
pub fn eth_to_usd(eth: &str, price: f64) -> String {
    let eth: f64 = eth.trim().parse().unwrap_or(0.0);
    format!("{:.2}", eth * price)
}

/// Convert a USD amount string to ETH with 6 decimals.
pub fn usd_to_eth(usd: &str, price: f64) -> String {
    let usd: f64 = usd.trim().parse().unwrap_or(0.0);
    if price <= 0.0 {
        return format!("{:.6}", 0.0);
    }
    format!("{:.6}", usd / price)
}
