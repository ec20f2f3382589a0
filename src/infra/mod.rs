pub mod api;
pub mod qr;
pub mod store;
