//! In-memory availability tracker — per-provider rate-limit cooldowns.
//!
//! When a provider is caught rate-limiting, its id is stamped with the
//! current time. For the next `cooldown` the pool skips it instead of
//! spending a call that will 429 again. Expired stamps are removed lazily
//! on the next lookup; there is no background sweep.
//!
//! Thread-safe via `Mutex<HashMap>`; state is never persisted.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

// ── Clock ───────────────────────────────────────────────────────────

/// Time source, injectable so cooldown expiry can be tested.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

// ── Tracker ─────────────────────────────────────────────────────────

pub struct AvailabilityTracker {
    /// provider id → when it was marked rate-limited
    marked: Mutex<HashMap<String, DateTime<Utc>>>,
    cooldown: Duration,
    clock: Arc<dyn Clock>,
}

impl AvailabilityTracker {
    pub fn new(cooldown: Duration) -> Self {
        Self::with_clock(cooldown, Arc::new(SystemClock))
    }

    pub fn with_clock(cooldown: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            marked: Mutex::new(HashMap::new()),
            cooldown,
            clock,
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// A poisoned lock still holds a consistent map: every operation
    /// is a single insert or remove.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, DateTime<Utc>>> {
        self.marked.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// False only while `provider_id` is inside its cooldown window.
    /// An expired record is dropped as a side effect.
    pub fn is_available(&self, provider_id: &str) -> bool {
        let mut marked = self.lock();
        let Some(&marked_at) = marked.get(provider_id) else {
            return true;
        };

        // A clock that stepped backwards counts as no time elapsed
        let elapsed = (self.clock.now() - marked_at).to_std().unwrap_or(Duration::ZERO);
        if elapsed < self.cooldown {
            return false;
        }

        marked.remove(provider_id);
        tracing::debug!(provider = provider_id, "Cooldown expired, provider available again");
        true
    }

    /// Start (or restart) the cooldown for `provider_id`.
    pub fn mark_unavailable(&self, provider_id: &str) {
        let now = self.clock.now();
        self.lock().insert(provider_id.to_string(), now);
        tracing::info!(
            provider = provider_id,
            cooldown_secs = self.cooldown.as_secs(),
            "Provider marked as rate-limited"
        );
    }

    /// When `provider_id` leaves its cooldown, if it is in one.
    pub fn available_at(&self, provider_id: &str) -> Option<DateTime<Utc>> {
        let marked_at = *self.lock().get(provider_id)?;
        let until = marked_at.checked_add_signed(chrono::Duration::from_std(self.cooldown).ok()?)?;
        (until > self.clock.now()).then_some(until)
    }
}

/// Manually advanced clock for tests.
#[cfg(test)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

#[cfg(test)]
impl ManualClock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self { now: Mutex::new(Utc::now()) })
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now = *now + chrono::Duration::from_std(by).unwrap();
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}
