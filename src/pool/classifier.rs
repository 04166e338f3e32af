//! Rate-limit classifier — decides from a failure message whether a
//! provider should be put on cooldown.
//!
//! Providers report throttling in many shapes (HTTP 429, "quota" bodies,
//! free-text errors), so classification is a case-insensitive substring
//! match over the rendered error rather than a status check.

const RATE_LIMIT_KEYWORDS: &[&str] = &[
    "rate limit",
    "too many requests",
    "429",
    "quota",
    "limit exceeded",
];

/// True if `message` looks like a rate-limit or quota failure.
pub fn is_rate_limit_error(message: &str) -> bool {
    let lower = message.to_lowercase();
    RATE_LIMIT_KEYWORDS.iter().any(|k| lower.contains(k))
}
