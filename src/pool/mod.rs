//! Translation pool — picks a provider for each request.
//!
//! Walks the registry in priority order, skipping providers that are
//! cooling down after a rate limit, and returns the first success.
//! Rate-limit failures put the provider on cooldown; every failure moves
//! on to the next provider. Attempts are strictly sequential.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::adapters::DailyQuota;

pub mod availability;
pub mod classifier;
pub mod registry;

use availability::AvailabilityTracker;
use registry::ProviderRegistry;

/// Service name that means "let the pool choose".
pub const AUTO: &str = "auto";

// ── Outcome Types ───────────────────────────────────────────────────

/// A successful translation and the provider that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub text: String,
    pub provider: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TranslateError {
    #[error("Invalid service")]
    InvalidService(String),

    #[error("Empty line")]
    EmptyLine,

    #[error("All translation services failed")]
    AllServicesFailed,
}

pub type Outcome = Result<Translation, TranslateError>;

/// Point-in-time view of one provider for the services listing.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatus {
    #[serde(skip)]
    pub id: String,
    pub name: String,
    pub daily_limit: DailyQuota,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_at: Option<DateTime<Utc>>,
}

// ── Pool ────────────────────────────────────────────────────────────

pub struct TranslationPool {
    providers: ProviderRegistry,
    availability: Arc<AvailabilityTracker>,
    /// Pause between consecutive lines of a batch.
    batch_delay: Duration,
}

impl TranslationPool {
    pub fn new(
        providers: ProviderRegistry,
        availability: Arc<AvailabilityTracker>,
        batch_delay: Duration,
    ) -> Self {
        Self { providers, availability, batch_delay }
    }

    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    pub fn availability(&self) -> &AvailabilityTracker {
        &self.availability
    }

    /// Dispatch on the requested service: `"auto"` falls back across all
    /// providers, anything else prefers that provider.
    pub async fn translate(&self, service: &str, text: &str) -> Outcome {
        if service == AUTO {
            self.translate_auto(text).await
        } else {
            self.translate_with(service, text).await
        }
    }

    /// Try every available provider in priority order; first success wins.
    pub async fn translate_auto(&self, text: &str) -> Outcome {
        for provider in self.providers.iter() {
            let id = provider.id();
            if !self.availability.is_available(id) {
                tracing::info!(provider = id, "Skipping provider — rate limited");
                continue;
            }

            if let Some(translation) = self.attempt(id, text).await {
                return Ok(translation);
            }
        }

        tracing::warn!(providers = self.providers.len(), "All translation services failed");
        Err(TranslateError::AllServicesFailed)
    }

    /// Prefer `service`; fall back to `translate_auto` if it is cooling
    /// down or fails. Unknown services are rejected without fallback.
    ///
    /// The fallback pass does not exclude `service`, so a provider that
    /// failed without a rate limit is tried once more.
    pub async fn translate_with(&self, service: &str, text: &str) -> Outcome {
        if self.providers.get(service).is_none() {
            tracing::warn!(service, "Unknown translation service requested");
            return Err(TranslateError::InvalidService(service.to_string()));
        }

        if !self.availability.is_available(service) {
            tracing::info!(provider = service, "Requested provider rate limited — using fallback");
            return self.translate_auto(text).await;
        }

        match self.attempt(service, text).await {
            Some(translation) => Ok(translation),
            None => self.translate_auto(text).await,
        }
    }

    /// Translate each line in order. Blank lines fail with `EmptyLine` and
    /// an unknown service fails every line, neither touching a provider or
    /// waiting out the delay. Nothing aborts the batch.
    pub async fn translate_batch(&self, lines: &[String], service: &str) -> Vec<Outcome> {
        let mut results = Vec::with_capacity(lines.len());
        let mut first = true;

        for line in lines {
            if line.trim().is_empty() {
                results.push(Err(TranslateError::EmptyLine));
                continue;
            }
            if service != AUTO && self.providers.get(service).is_none() {
                results.push(Err(TranslateError::InvalidService(service.to_string())));
                continue;
            }

            if !first && !self.batch_delay.is_zero() {
                tokio::time::sleep(self.batch_delay).await;
            }
            first = false;

            results.push(self.translate(service, line).await);
        }

        let succeeded = results.iter().filter(|r| r.is_ok()).count();
        tracing::info!(
            lines = lines.len(),
            succeeded,
            failed = lines.len() - succeeded,
            "Batch translation finished"
        );
        results
    }

    /// Status of every provider, in priority order.
    pub fn service_status(&self) -> Vec<ServiceStatus> {
        self.providers
            .iter()
            .map(|p| ServiceStatus {
                id: p.id().to_string(),
                name: p.display_name().to_string(),
                daily_limit: p.daily_quota(),
                available: self.availability.is_available(p.id()),
                available_at: self.availability.available_at(p.id()),
            })
            .collect()
    }

    /// One call to one provider. Rate-limit failures start its cooldown.
    async fn attempt(&self, id: &str, text: &str) -> Option<Translation> {
        let provider = self.providers.get(id)?;

        match provider.translate(text).await {
            Ok(translated) => {
                tracing::info!(provider = id, "Translation successful");
                Some(Translation { text: translated, provider: id.to_string() })
            }
            Err(e) => {
                let message = e.to_string();
                tracing::warn!(provider = id, error = %message, "Provider failed");
                if classifier::is_rate_limit_error(&message) {
                    self.availability.mark_unavailable(id);
                }
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::stub::StubProvider;
    use super::availability::ManualClock;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const COOLDOWN: Duration = Duration::from_secs(60);

    /// Pool over `providers` (in order) plus each provider's call counter.
    fn pool(providers: Vec<StubProvider>) -> (TranslationPool, Vec<Arc<AtomicUsize>>, Arc<ManualClock>) {
        let clock = ManualClock::new();
        let mut registry = ProviderRegistry::new();
        let mut counters = Vec::new();
        for p in providers {
            counters.push(p.calls());
            registry.register(Arc::new(p)).unwrap();
        }
        let tracker = Arc::new(AvailabilityTracker::with_clock(COOLDOWN, clock.clone()));
        (TranslationPool::new(registry, tracker, Duration::ZERO), counters, clock)
    }

    fn calls(counters: &[Arc<AtomicUsize>]) -> Vec<usize> {
        counters.iter().map(|c| c.load(Ordering::SeqCst)).collect()
    }

    fn translated(text: &str, provider: &str) -> Outcome {
        Ok(Translation { text: text.into(), provider: provider.into() })
    }

    // ── translate_auto ──

    #[tokio::test]
    async fn test_auto_first_success_short_circuits() {
        let (pool, counters, _) = pool(vec![
            StubProvider::succeeding("libretranslate", "Hello"),
            StubProvider::succeeding("mymemory", "Hi"),
            StubProvider::succeeding("google", "Hey"),
        ]);
        assert_eq!(pool.translate_auto("Hei").await, translated("Hello", "libretranslate"));
        assert_eq!(calls(&counters), vec![1, 0, 0]);
    }

    #[tokio::test]
    async fn test_auto_falls_through_failures_in_order() {
        let (pool, counters, _) = pool(vec![
            StubProvider::failing("libretranslate", "Connection error"),
            StubProvider::failing("mymemory", "MyMemory translation failed"),
            StubProvider::succeeding("google", "Hello"),
            StubProvider::succeeding("lingva", "Hi"),
        ]);
        assert_eq!(pool.translate_auto("Hei").await, translated("Hello", "google"));
        assert_eq!(calls(&counters), vec![1, 1, 1, 0]);
        // Non rate-limit failures do not start a cooldown
        assert!(pool.availability().is_available("libretranslate"));
        assert!(pool.availability().is_available("mymemory"));
    }

    #[tokio::test]
    async fn test_auto_all_fail_tries_each_once() {
        let (pool, counters, _) = pool(vec![
            StubProvider::failing("libretranslate", "Rate limit exceeded"),
            StubProvider::failing("mymemory", "Connection error"),
            StubProvider::failing("google", "Too many requests"),
        ]);
        assert_eq!(pool.translate_auto("Hei").await, Err(TranslateError::AllServicesFailed));
        assert_eq!(calls(&counters), vec![1, 1, 1]);
    }

    #[tokio::test]
    async fn test_auto_marks_rate_limited_and_skips_next_call() {
        let (pool, counters, _) = pool(vec![
            StubProvider::failing("libretranslate", "Rate limit exceeded"),
            StubProvider::succeeding("mymemory", "Hello"),
        ]);
        assert_eq!(pool.translate_auto("Hei").await, translated("Hello", "mymemory"));
        assert!(!pool.availability().is_available("libretranslate"));

        assert_eq!(pool.translate_auto("Kiitos").await, translated("Hello", "mymemory"));
        assert_eq!(calls(&counters), vec![1, 2], "cooling provider must not be invoked");
    }

    #[tokio::test]
    async fn test_auto_never_invokes_unavailable_provider() {
        let (pool, counters, _) = pool(vec![
            StubProvider::succeeding("libretranslate", "Hello"),
            StubProvider::succeeding("mymemory", "Hi"),
        ]);
        pool.availability().mark_unavailable("libretranslate");
        assert_eq!(pool.translate_auto("Hei").await, translated("Hi", "mymemory"));
        assert_eq!(calls(&counters), vec![0, 1]);
    }

    #[tokio::test]
    async fn test_auto_all_unavailable_fails_without_calls() {
        let (pool, counters, _) = pool(vec![
            StubProvider::succeeding("libretranslate", "Hello"),
            StubProvider::succeeding("mymemory", "Hi"),
        ]);
        pool.availability().mark_unavailable("libretranslate");
        pool.availability().mark_unavailable("mymemory");
        assert_eq!(pool.translate_auto("Hei").await, Err(TranslateError::AllServicesFailed));
        assert_eq!(calls(&counters), vec![0, 0]);
    }

    #[tokio::test]
    async fn test_auto_retries_provider_after_cooldown() {
        let (pool, counters, clock) = pool(vec![
            StubProvider::succeeding("libretranslate", "Hello").then(Err("429 error")),
            StubProvider::succeeding("mymemory", "Hi"),
        ]);
        assert_eq!(pool.translate_auto("Hei").await, translated("Hi", "mymemory"));

        clock.advance(COOLDOWN + Duration::from_secs(1));
        assert_eq!(pool.translate_auto("Hei").await, translated("Hello", "libretranslate"));
        assert_eq!(calls(&counters), vec![2, 1]);
    }

    #[tokio::test]
    async fn test_auto_with_no_providers() {
        let (pool, _, _) = pool(vec![]);
        assert_eq!(pool.translate_auto("Hei").await, Err(TranslateError::AllServicesFailed));
    }

    // ── translate_with ──

    #[tokio::test]
    async fn test_with_unknown_service_invokes_nothing() {
        let (pool, counters, _) = pool(vec![
            StubProvider::succeeding("libretranslate", "Hello"),
            StubProvider::succeeding("mymemory", "Hi"),
        ]);
        assert_eq!(
            pool.translate_with("invalid_provider_key", "Hei").await,
            Err(TranslateError::InvalidService("invalid_provider_key".into()))
        );
        assert_eq!(calls(&counters), vec![0, 0]);
    }

    #[tokio::test]
    async fn test_with_uses_requested_provider() {
        let (pool, counters, _) = pool(vec![
            StubProvider::succeeding("libretranslate", "Hello"),
            StubProvider::succeeding("google", "Hey"),
        ]);
        assert_eq!(pool.translate_with("google", "Hei").await, translated("Hey", "google"));
        assert_eq!(calls(&counters), vec![0, 1]);
    }

    #[tokio::test]
    async fn test_with_unavailable_provider_delegates_to_auto() {
        let (pool, counters, _) = pool(vec![
            StubProvider::succeeding("libretranslate", "Hello"),
            StubProvider::succeeding("google", "Hey"),
        ]);
        pool.availability().mark_unavailable("google");
        assert_eq!(pool.translate_with("google", "Hei").await, translated("Hello", "libretranslate"));
        assert_eq!(calls(&counters), vec![1, 0]);
    }

    #[tokio::test]
    async fn test_with_rate_limited_failure_marks_and_falls_back() {
        let (pool, counters, _) = pool(vec![
            StubProvider::succeeding("libretranslate", "Hello"),
            StubProvider::failing("google", "Quota limit exceeded"),
        ]);
        assert_eq!(pool.translate_with("google", "Hei").await, translated("Hello", "libretranslate"));
        assert!(!pool.availability().is_available("google"));
        assert_eq!(calls(&counters), vec![1, 1]);
    }

    #[tokio::test]
    async fn test_with_plain_failure_retries_same_provider_in_fallback() {
        let (pool, counters, _) = pool(vec![
            StubProvider::failing("libretranslate", "Connection error"),
            StubProvider::succeeding("google", "Hey").then(Err("Connection error")),
        ]);
        // google fails directly, libretranslate fails, then google is tried again
        assert_eq!(pool.translate_with("google", "Hei").await, translated("Hey", "google"));
        assert_eq!(calls(&counters), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_dispatch_auto_keyword() {
        let (pool, counters, _) = pool(vec![
            StubProvider::succeeding("libretranslate", "Hello"),
            StubProvider::succeeding("google", "Hey"),
        ]);
        assert_eq!(pool.translate(AUTO, "Hei").await, translated("Hello", "libretranslate"));
        assert_eq!(pool.translate("google", "Hei").await, translated("Hey", "google"));
        assert_eq!(calls(&counters), vec![1, 1]);
    }

    // ── translate_batch ──

    #[tokio::test]
    async fn test_batch_empty_line_skips_providers() {
        let (pool, counters, _) = pool(vec![StubProvider::succeeding("libretranslate", "ok")]);
        let lines = vec!["Hei".to_string(), "".to_string(), "Kiitos".to_string()];
        let results = pool.translate_batch(&lines, AUTO).await;

        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert_eq!(results[1], Err(TranslateError::EmptyLine));
        assert!(results[2].is_ok());
        assert_eq!(calls(&counters), vec![2]);
    }

    #[tokio::test]
    async fn test_batch_continues_after_failures() {
        let (pool, _, _) = pool(vec![
            StubProvider::succeeding("libretranslate", "ok").then(Err("Connection error")),
        ]);
        let lines = vec!["a".to_string(), "   ".to_string(), "b".to_string()];
        let results = pool.translate_batch(&lines, AUTO).await;
        assert_eq!(results[0], Err(TranslateError::AllServicesFailed));
        assert_eq!(results[1], Err(TranslateError::EmptyLine));
        assert_eq!(results[2], translated("ok", "libretranslate"));
    }

    #[tokio::test]
    async fn test_batch_invalid_service_fails_per_line() {
        let (pool, counters, _) = pool(vec![StubProvider::succeeding("libretranslate", "ok")]);
        let lines = vec!["a".to_string(), "b".to_string()];
        let results = pool.translate_batch(&lines, "deepl").await;
        assert!(results
            .iter()
            .all(|r| matches!(r, Err(TranslateError::InvalidService(s)) if s == "deepl")));
        assert_eq!(calls(&counters), vec![0]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_waits_between_lines() {
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(StubProvider::succeeding("libretranslate", "ok"))).unwrap();
        let tracker = Arc::new(AvailabilityTracker::new(COOLDOWN));
        let pool = TranslationPool::new(registry, tracker, Duration::from_millis(500));

        let lines: Vec<String> = ["a", "", "b", "c"].iter().map(|s| s.to_string()).collect();
        let start = tokio::time::Instant::now();
        let results = pool.translate_batch(&lines, AUTO).await;

        assert_eq!(results.len(), 4);
        // Two gaps between the three non-empty lines
        let waited = start.elapsed();
        assert!(waited >= Duration::from_millis(1000), "waited {:?}", waited);
        assert!(waited < Duration::from_millis(1500), "waited {:?}", waited);
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_invalid_service_does_not_wait() {
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(StubProvider::succeeding("libretranslate", "ok"))).unwrap();
        let tracker = Arc::new(AvailabilityTracker::new(COOLDOWN));
        let pool = TranslationPool::new(registry, tracker, Duration::from_millis(500));

        let lines: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        let start = tokio::time::Instant::now();
        let results = pool.translate_batch(&lines, "deepl").await;

        assert_eq!(results.len(), 3);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    // ── service_status ──

    #[tokio::test]
    async fn test_service_status_reflects_cooldowns() {
        let (pool, _, _) = pool(vec![
            StubProvider::succeeding("libretranslate", "a"),
            StubProvider::succeeding("mymemory", "b"),
        ]);
        pool.availability().mark_unavailable("mymemory");

        let status = pool.service_status();
        assert_eq!(status.len(), 2);
        assert_eq!(status[0].id, "libretranslate");
        assert!(status[0].available);
        assert!(status[0].available_at.is_none());
        assert_eq!(status[1].id, "mymemory");
        assert!(!status[1].available);
        assert!(status[1].available_at.is_some());
    }
}
