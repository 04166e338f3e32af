//! Google Translate adapter — the keyless `translate_a/single` endpoint.
//!
//! Unofficial: no quota is published and the response is a bare nested
//! array. Each sentence comes back as its own segment `[translated,
//! original, ...]` under `data[0]`, so segments are joined.

use async_trait::async_trait;
use serde_json::Value;

use super::{check_status, DailyQuota, LanguagePair, ProviderError, TranslationProvider};

pub struct GoogleAdapter {
    client: reqwest::Client,
    url: String,
    langs: LanguagePair,
}

impl GoogleAdapter {
    pub fn new(client: reqwest::Client, url: impl Into<String>, langs: LanguagePair) -> Self {
        Self { client, url: url.into(), langs }
    }
}

/// Join the translated part of every segment in `data[0]`.
fn parse_segments(body: &Value) -> Result<String, ProviderError> {
    let segments = body
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| ProviderError::malformed("Google Translate", "expected nested array at [0]"))?;

    let text: String = segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(Value::as_str))
        .collect();

    if text.is_empty() {
        return Err(ProviderError::malformed("Google Translate", "no translated segments"));
    }
    Ok(text)
}

#[async_trait]
impl TranslationProvider for GoogleAdapter {
    fn id(&self) -> &str {
        "google"
    }

    fn display_name(&self) -> &str {
        "Google Translate"
    }

    fn daily_quota(&self) -> DailyQuota {
        DailyQuota::Unofficial
    }

    async fn translate(&self, text: &str) -> Result<String, ProviderError> {
        let resp = self
            .client
            .get(&self.url)
            .query(&[
                ("client", "gtx"),
                ("sl", self.langs.source.as_str()),
                ("tl", self.langs.target.as_str()),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await?;
        let body: Value = check_status(resp).await?.json().await?;
        parse_segments(&body)
    }
}
