//! Test doubles — a scripted provider and a throwaway upstream server.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::{DailyQuota, ProviderError, TranslationProvider};

/// Provider that replays scripted responses and counts calls.
///
/// Once the script runs out it repeats `fallback`.
pub struct StubProvider {
    id: &'static str,
    script: Mutex<VecDeque<Result<String, String>>>,
    fallback: Result<String, String>,
    calls: Arc<AtomicUsize>,
}

impl StubProvider {
    pub fn succeeding(id: &'static str, text: &str) -> Self {
        Self::new(id, Ok(text.to_string()))
    }

    /// Always fails with `message` (e.g. "Rate limit exceeded").
    pub fn failing(id: &'static str, message: &str) -> Self {
        Self::new(id, Err(message.to_string()))
    }

    fn new(id: &'static str, fallback: Result<String, String>) -> Self {
        Self {
            id,
            script: Mutex::new(VecDeque::new()),
            fallback,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Queue a one-off response ahead of the fallback.
    pub fn then(self, response: Result<&str, &str>) -> Self {
        self.script
            .lock()
            .unwrap()
            .push_back(response.map(String::from).map_err(String::from));
        self
    }

    /// Shared counter, readable after the provider is moved into a pool.
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl TranslationProvider for StubProvider {
    fn id(&self) -> &str {
        self.id
    }

    fn display_name(&self) -> &str {
        self.id
    }

    fn daily_quota(&self) -> DailyQuota {
        DailyQuota::Unlimited
    }

    async fn translate(&self, _text: &str) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        next.map_err(|detail| ProviderError::malformed("stub", detail))
    }
}

/// Bind `app` on an ephemeral local port and return its base URL.
pub async fn serve(app: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Base URL of a local port with nothing listening on it.
pub async fn dead_base() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

pub fn client() -> reqwest::Client {
    client_with_timeout(std::time::Duration::from_secs(5))
}

pub fn client_with_timeout(timeout: std::time::Duration) -> reqwest::Client {
    reqwest::Client::builder().timeout(timeout).build().unwrap()
}
