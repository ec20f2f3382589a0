//! Ethereum hashing and address helpers.
//!
//! Keccak-256 for address derivation, EIP-55 checksums and EIP-191
//! personal message hashes.

use secp256k1::PublicKey;
use sha3::{Digest, Keccak256};

/// Length of an address in bytes.
pub const ADDRESS_LEN: usize = 20;

/// EIP-191 prefix for personal messages.
const PERSONAL_MESSAGE_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n";

/// Keccak-256 digest.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Compute the EIP-191 personal message hash.
///
/// `keccak256("\x19Ethereum Signed Message:\n" || len(message) || message)`
pub fn hash_message(message: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(PERSONAL_MESSAGE_PREFIX);
    hasher.update(message.len().to_string().as_bytes());
    hasher.update(message);
    hasher.finalize().into()
}

/// Raw 20-byte address of a public key: last 20 bytes of the Keccak-256 of
/// the uncompressed point without its `0x04` tag.
pub fn address_bytes(public_key: &PublicKey) -> [u8; ADDRESS_LEN] {
    let uncompressed = public_key.serialize_uncompressed();
    let hash = keccak256(&uncompressed[1..]);
    let mut address = [0u8; ADDRESS_LEN];
    address.copy_from_slice(&hash[12..]);
    address
}

/// EIP-55 checksummed address string for a public key.
pub fn public_key_to_address(public_key: &PublicKey) -> String {
    to_checksum_address(&address_bytes(public_key))
}

/// Encode raw address bytes with the EIP-55 mixed-case checksum.
pub fn to_checksum_address(address: &[u8; ADDRESS_LEN]) -> String {
    let lower = hex::encode(address);
    let hash = keccak256(lower.as_bytes());

    let mut out = String::with_capacity(2 + lower.len());
    out.push_str("0x");
    for (i, c) in lower.chars().enumerate() {
        let nibble = if i % 2 == 0 {
            hash[i / 2] >> 4
        } else {
            hash[i / 2] & 0x0f
        };
        if c.is_ascii_alphabetic() && nibble >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Parse a `0x`-prefixed 40 hex digit address.
///
/// All-lowercase and all-uppercase inputs are accepted as-is; mixed-case
/// input must carry a valid EIP-55 checksum.
pub fn parse_address(s: &str) -> Option<[u8; ADDRESS_LEN]> {
    let body = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"))?;
    if body.len() != ADDRESS_LEN * 2 || !body.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    let mut bytes = [0u8; ADDRESS_LEN];
    hex::decode_to_slice(body, &mut bytes).ok()?;

    let has_lower = body.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = body.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper && to_checksum_address(&bytes)[2..] != *body {
        return None;
    }

    Some(bytes)
}

/// Whether `s` is a valid address.
pub fn is_address(s: &str) -> bool {
    parse_address(s).is_some()
}
