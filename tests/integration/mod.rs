//! Integration tests for demo-wallet.
//!
//! Drives `SessionManager` end to end against:
//! - the in-process mock backend
//! - a fake REST server (axum) for token refresh and retry behavior
//!
//! Each test gets its own LMDB store in a temporary directory.

pub mod backend;
pub mod e2e_mock_flow;
pub mod e2e_rest_session;

use std::{net::SocketAddr, sync::Arc, time::Duration};

use demo_wallet::{
    config::{ApiConfig, Backend, TransferConfig},
    domain::session::SessionManager,
    infra::{
        api::{MockApi, RestApi},
        store::Store,
    },
};
use tempfile::TempDir;

pub const PHRASE: &str =
    "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
pub const PHRASE_ADDRESS: &str = "0x9858EfFD232B4033E47d90003D41EC34EcaEda94";
pub const RECIPIENT: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
pub const PASSWORD: &str = "Correct-Horse-9";

/// A session over a throwaway store. Keep `_dir` alive for the test.
pub struct TestEnv {
    pub _dir: TempDir,
    pub store: Store,
    pub session: SessionManager,
}

fn temp_store() -> (TempDir, Store) {
    let dir = TempDir::new().expect("temp dir");
    let store = Store::with_path(dir.path().join("wallet.mdb")).expect("open store");
    (dir, store)
}

impl TestEnv {
    pub fn mock(api: Arc<MockApi>) -> Self {
        let (dir, store) = temp_store();
        let session = SessionManager::new(store.clone(), api, TransferConfig::default());
        Self {
            _dir: dir,
            store,
            session,
        }
    }

    pub fn rest(addr: SocketAddr) -> Self {
        let (dir, store) = temp_store();
        let config = ApiConfig {
            backend: Backend::Rest,
            base_url: format!("http://{}", addr),
            timeout_secs: 5,
            max_retries: 2,
            retry_backoff_ms: 10,
            mock_delay_ms: 0,
        };
        let api = RestApi::new(&config, store.clone()).expect("build client");
        let session = SessionManager::new(store.clone(), Arc::new(api), TransferConfig::default());
        Self {
            _dir: dir,
            store,
            session,
        }
    }
}

/// Short pause so quote expiry can be observed without slowing the suite.
pub async fn wait(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}
