//! In-process fake of the wallet REST backend.
//!
//! Serves the subset of routes the session tests touch and lets each test
//! rotate tokens, refuse refreshes or inject server errors.

use std::{
    net::SocketAddr,
    sync::{Arc, Mutex, MutexGuard},
};

use axum::{
    extract::{Path, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

pub const USER_ID: &str = "user_42";

#[derive(Debug)]
pub struct BackendState {
    /// Generation of the currently valid token pair.
    pub generation: u32,
    pub refresh_allowed: bool,
    /// Reject authenticated calls even with a fresh token.
    pub always_unauthorized: bool,
    /// Number of upcoming balance requests answered with a 500.
    pub server_errors: u32,
    pub refresh_calls: u32,
    pub balance_calls: u32,
    pub logout_calls: u32,
    /// Answer unknown transactions with a JSON error body instead of an empty one.
    pub json_not_found: bool,
}

impl Default for BackendState {
    fn default() -> Self {
        Self {
            generation: 1,
            refresh_allowed: true,
            always_unauthorized: false,
            server_errors: 0,
            refresh_calls: 0,
            balance_calls: 0,
            logout_calls: 0,
            json_not_found: false,
        }
    }
}

impl BackendState {
    fn access_token(&self) -> String {
        format!("access-{}", self.generation)
    }

    fn refresh_token(&self) -> String {
        format!("refresh-{}", self.generation)
    }

    /// Invalidate the current access token without issuing a new one.
    pub fn expire_access_token(&mut self) {
        self.generation += 1;
    }
}

#[derive(Clone, Default)]
pub struct FakeBackend {
    state: Arc<Mutex<BackendState>>,
}

impl FakeBackend {
    pub fn state(&self) -> MutexGuard<'_, BackendState> {
        self.state.lock().unwrap()
    }

    /// Bind to an ephemeral port and serve in the background.
    pub async fn spawn(&self) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(self.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        let state = self.state();
        if state.always_unauthorized {
            return false;
        }
        let expected = format!("Bearer {}", state.access_token());
        headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == expected)
    }
}

fn router(backend: FakeBackend) -> Router {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
        .route("/auth/profile", get(profile))
        .route("/wallet/create", post(register_wallet))
        .route("/wallet/balance/:address", get(balance))
        .route("/wallet/price/eth", get(price))
        .route("/transactions/:id", get(transaction))
        .with_state(backend)
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Token expired" }))).into_response()
}

async fn login(State(backend): State<FakeBackend>, Json(body): Json<Value>) -> Response {
    if body["password"] != "Correct-Horse-9" {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Invalid credentials" })),
        )
            .into_response();
    }
    let state = backend.state();
    Json(json!({
        "userId": USER_ID,
        "access_token": state.access_token(),
        "refresh_token": state.refresh_token(),
        "username": "alice",
    }))
    .into_response()
}

async fn refresh(State(backend): State<FakeBackend>, Json(body): Json<Value>) -> Response {
    let mut state = backend.state();
    state.refresh_calls += 1;
    if !state.refresh_allowed {
        return unauthorized();
    }
    // Any refresh token issued so far is accepted
    if !body["refresh_token"]
        .as_str()
        .is_some_and(|t| t.starts_with("refresh-"))
    {
        return unauthorized();
    }
    state.generation += 1;
    Json(json!({
        "access_token": state.access_token(),
        "refresh_token": state.refresh_token(),
    }))
    .into_response()
}

async fn logout(State(backend): State<FakeBackend>) -> StatusCode {
    backend.state().logout_calls += 1;
    StatusCode::OK
}

async fn profile(State(backend): State<FakeBackend>, headers: HeaderMap) -> Response {
    if !backend.authorized(&headers) {
        return unauthorized();
    }
    Json(json!({
        "user": {
            "id": USER_ID,
            "email": "alice@example.com",
            "first_name": "Alice",
            "last_name": "Liddell",
            "created_at": "2024-01-01T00:00:00Z",
        }
    }))
    .into_response()
}

async fn register_wallet(State(backend): State<FakeBackend>, headers: HeaderMap) -> Response {
    if !backend.authorized(&headers) {
        return unauthorized();
    }
    Json(json!({ "success": true })).into_response()
}

async fn balance(
    State(backend): State<FakeBackend>,
    headers: HeaderMap,
    Path(_address): Path<String>,
) -> Response {
    if !backend.authorized(&headers) {
        return unauthorized();
    }
    let mut state = backend.state();
    state.balance_calls += 1;
    if state.server_errors > 0 {
        state.server_errors -= 1;
        return (StatusCode::INTERNAL_SERVER_ERROR, "upstream node unavailable").into_response();
    }
    Json(json!({ "balance": 1.5, "usd_value": "3750.00" })).into_response()
}

async fn price() -> Json<Value> {
    Json(json!({ "success": true, "price": 2500.0 }))
}

async fn transaction(
    State(backend): State<FakeBackend>,
    headers: HeaderMap,
    Path(_id): Path<String>,
) -> Response {
    if !backend.authorized(&headers) {
        return unauthorized();
    }
    if backend.state().json_not_found {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "Transaction not found" })),
        )
            .into_response();
    }
    StatusCode::NOT_FOUND.into_response()
}
