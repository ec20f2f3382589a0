//! Demo Wallet - a terminal wallet for Ethereum-style accounts.
//!
//! This library provides:
//! - BIP39/BIP32 wallet generation, import and EIP-191 message signing
//! - Form validation
//! - A backend API client (in-memory mock or REST with token refresh)
//! - Local storage for the session, the active wallet and history

pub mod config;
pub mod domain;
pub mod infra;
