//! Shared helpers for client integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use triage_client::{ApiClient, ClientConfig, MemoryTokenStore, SessionHandler, TokenStore};
use wiremock::MockServer;

/// Session handler that counts how often it was asked to escalate.
#[derive(Debug, Default)]
pub struct CountingSession {
    calls: AtomicUsize,
}

impl CountingSession {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SessionHandler for CountingSession {
    fn session_expired(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct TestClient {
    pub client: ApiClient,
    pub tokens: Arc<MemoryTokenStore>,
    pub session: Arc<CountingSession>,
}

/// Build a client pointed at `server`, optionally holding a token.
pub fn client_for(server: &MockServer, token: Option<&str>) -> TestClient {
    let tokens = Arc::new(match token {
        Some(t) => MemoryTokenStore::with_token(t),
        None => MemoryTokenStore::new(),
    });
    let session = Arc::new(CountingSession::default());
    let config = ClientConfig::default().with_base_url(&server.uri());

    let client = ApiClient::new(
        &config,
        Arc::clone(&tokens) as Arc<dyn TokenStore>,
        Arc::clone(&session) as Arc<dyn SessionHandler>,
    )
    .expect("client should build");

    TestClient {
        client,
        tokens,
        session,
    }
}
