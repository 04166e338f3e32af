//! Translation provider trait — backend-agnostic interface.
//!
//! Every translation backend (LibreTranslate, MyMemory, Google, Lingva)
//! implements this trait. The pool calls providers in priority order;
//! providers never see each other or the availability tracker.

use async_trait::async_trait;
use serde::{Serialize, Serializer};

pub mod google;
pub mod libretranslate;
pub mod lingva;
pub mod mymemory;

#[cfg(test)]
pub mod stub;

/// Longest upstream body excerpt kept in an error message.
const MAX_ERROR_BODY: usize = 300;

// ── Core Types ──────────────────────────────────────────────────────

/// Source/target language codes sent with every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguagePair {
    pub source: String,
    pub target: String,
}

impl LanguagePair {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self { source: source.into(), target: target.into() }
    }
}

/// Advisory daily quota a provider declares. Never enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DailyQuota {
    Requests(u32),
    Unlimited,
    Unofficial,
}

impl Serialize for DailyQuota {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DailyQuota::Requests(n) => serializer.serialize_u32(*n),
            DailyQuota::Unlimited => serializer.serialize_str("unlimited"),
            DailyQuota::Unofficial => serializer.serialize_str("unofficial"),
        }
    }
}

/// Why a single provider call failed.
///
/// The `Display` text is what the pool feeds to the rate-limit
/// classifier, so upstream messages are kept verbatim where possible.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Rate limit exceeded (HTTP 429)")]
    RateLimited,

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Transport failure, with the request URL stripped. The URL carries
    /// the user's text and API keys.
    #[error("Network error: {0}")]
    Network(String),

    #[error("{provider} translation failed: {detail}")]
    Malformed { provider: &'static str, detail: String },
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        ProviderError::Network(error_chain(&e.without_url()))
    }
}

/// `e` and each of its sources, joined with ": ".
fn error_chain(e: &dyn std::error::Error) -> String {
    let mut message = e.to_string();
    let mut source = e.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

impl ProviderError {
    pub fn malformed(provider: &'static str, detail: impl Into<String>) -> Self {
        ProviderError::Malformed { provider, detail: detail.into() }
    }
}

// ── Provider Trait ──────────────────────────────────────────────────

/// The universal translation provider trait.
///
/// Adding a backend = implementing this trait in a new file, then
/// registering it in the pool's registry at startup.
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    /// Unique provider identifier (e.g., "libretranslate").
    fn id(&self) -> &str;

    /// Human-readable provider name.
    fn display_name(&self) -> &str;

    fn daily_quota(&self) -> DailyQuota;

    /// Translate `text` using the configured language pair.
    ///
    /// Must never panic on a bad upstream response — every failure comes
    /// back as a `ProviderError`.
    async fn translate(&self, text: &str) -> Result<String, ProviderError>;
}

// ── Response Helpers ────────────────────────────────────────────────

/// Map a 429 to `RateLimited` and any other non-2xx status to
/// `ProviderError::Status`, passing successful responses through.
pub(crate) async fn check_status(
    resp: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    let status = resp.status();
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(ProviderError::RateLimited);
    }
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ProviderError::Status {
            status: status.as_u16(),
            body: truncate(body.trim(), MAX_ERROR_BODY).to_string(),
        });
    }
    Ok(resp)
}

/// Non-empty string at `value`, or a descriptive `Malformed` error.
pub(crate) fn required_text(
    provider: &'static str,
    value: &serde_json::Value,
    field: &str,
) -> Result<String, ProviderError> {
    match value {
        serde_json::Value::String(s) if !s.is_empty() => Ok(s.clone()),
        serde_json::Value::String(_) => {
            Err(ProviderError::malformed(provider, format!("'{}' is empty", field)))
        }
        serde_json::Value::Null => {
            Err(ProviderError::malformed(provider, format!("'{}' missing from response", field)))
        }
        other => Err(ProviderError::malformed(
            provider,
            format!("'{}' is not a string: {}", field, truncate(&other.to_string(), 80)),
        )),
    }
}

/// Cut `s` to at most `max` bytes on a char boundary.
pub(crate) fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
