#![allow(dead_code)]

use axum::{Router, extract::ConnectInfo};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tower::Layer;

use shortkey::config::{Config, StoreBackend};
use shortkey::domain::visit_event::VisitEvent;
use shortkey::infrastructure::store::MemoryStore;
use shortkey::routes;
use shortkey::state::AppState;

pub const BASE_URL: &str = "http://short.test";
pub const PEER_IP: &str = "127.0.0.1";

pub fn test_config() -> Config {
    Config {
        store_backend: StoreBackend::Memory,
        redis_url: "redis://127.0.0.1:6379/0".to_string(),
        store_timeout_ms: 2000,
        listen_addr: "127.0.0.1:0".to_string(),
        base_url: BASE_URL.to_string(),
        log_level: "info".to_string(),
        log_format: "text".to_string(),
        behind_proxy: false,
        visit_queue_capacity: 100,
        visit_worker_concurrency: 1,
        short_key_length: 8,
        key_allocation_attempts: 5,
        require_auth: true,
        jwt_secret: "test-jwt-secret".to_string(),
        token_ttl_hours: 1,
        visitor_hash_secret: None,
    }
}

pub fn create_test_state(config: &Config) -> (AppState, mpsc::Receiver<VisitEvent>) {
    AppState::build(Arc::new(MemoryStore::new()), config)
}

/// Full router with a fixed peer address, as seen by handlers behind `ConnectInfo`.
pub fn test_app(state: AppState) -> Router {
    routes::router(state).layer(MockConnectInfoLayer)
}

/// Registers `username` and returns a bearer token for it.
pub async fn create_user_token(state: &AppState, username: &str) -> String {
    state
        .account_service
        .register(username, "correct-horse-battery")
        .await
        .unwrap();
    state
        .account_service
        .login(username, "correct-horse-battery")
        .await
        .unwrap()
}

/// Records every visit currently queued, as the background worker would.
pub async fn process_visits(state: &AppState, rx: &mut mpsc::Receiver<VisitEvent>) -> usize {
    let mut processed = 0;
    while let Ok(event) = rx.try_recv() {
        state.analytics.record_visit(&event).await;
        processed += 1;
    }
    processed
}

/// Extracts the short key from a `Short URL created: ...` response body.
pub fn key_from_body(body: &str) -> String {
    body.trim()
        .rsplit('/')
        .next()
        .unwrap()
        .to_string()
}

#[derive(Clone)]
pub struct MockConnectInfoLayer;

impl<S> Layer<S> for MockConnectInfoLayer {
    type Service = MockConnectInfoService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MockConnectInfoService { inner }
    }
}

#[derive(Clone)]
pub struct MockConnectInfoService<S> {
    inner: S,
}

impl<S, B> tower::Service<axum::http::Request<B>> for MockConnectInfoService<S>
where
    S: tower::Service<axum::http::Request<B>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        let addr: SocketAddr = format!("{PEER_IP}:12345").parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        self.inner.call(req)
    }
}
