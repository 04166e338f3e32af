//! Lingva adapter — Google Translate front-end with a clean JSON API.
//!
//! The text travels as a path segment:
//! `GET {base}/api/v1/{source}/{target}/{text}`.

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Url;
use serde_json::Value;

use super::{
    check_status, required_text, DailyQuota, LanguagePair, ProviderError, TranslationProvider,
};

pub struct LingvaAdapter {
    client: reqwest::Client,
    base: Url,
    langs: LanguagePair,
}

impl LingvaAdapter {
    pub fn new(client: reqwest::Client, base_url: &str, langs: LanguagePair) -> anyhow::Result<Self> {
        let base = Url::parse(base_url)
            .with_context(|| format!("Invalid Lingva base URL '{}'", base_url))?;
        if base.cannot_be_a_base() {
            anyhow::bail!("Lingva base URL '{}' cannot carry a path", base_url);
        }
        Ok(Self { client, base, langs })
    }

    fn endpoint(&self, text: &str) -> Url {
        let mut url = self.base.clone();
        // cannot_be_a_base was ruled out in new()
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["api", "v1", self.langs.source.as_str(), self.langs.target.as_str(), text]);
        }
        url
    }
}

#[async_trait]
impl TranslationProvider for LingvaAdapter {
    fn id(&self) -> &str {
        "lingva"
    }

    fn display_name(&self) -> &str {
        "Lingva Translate"
    }

    fn daily_quota(&self) -> DailyQuota {
        DailyQuota::Unlimited
    }

    async fn translate(&self, text: &str) -> Result<String, ProviderError> {
        let resp = self.client.get(self.endpoint(text)).send().await?;
        let body: Value = check_status(resp).await?.json().await?;
        required_text("Lingva Translate", &body["translation"], "translation")
    }
}
