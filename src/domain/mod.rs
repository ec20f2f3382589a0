pub mod amount;
pub mod crypto;
pub mod models;
pub mod session;
pub mod validation;
pub mod wallet;
