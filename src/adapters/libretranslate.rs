//! LibreTranslate adapter — JSON POST, usually a self-hosted instance.

use async_trait::async_trait;
use serde_json::Value;

use super::{
    check_status, required_text, DailyQuota, LanguagePair, ProviderError, TranslationProvider,
};

pub struct LibreTranslateAdapter {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
    langs: LanguagePair,
}

impl LibreTranslateAdapter {
    pub fn new(
        client: reqwest::Client,
        url: impl Into<String>,
        api_key: Option<String>,
        langs: LanguagePair,
    ) -> Self {
        Self { client, url: url.into(), api_key, langs }
    }

    fn request_body(&self, text: &str) -> Value {
        let mut body = serde_json::json!({
            "q": text,
            "source": &self.langs.source,
            "target": &self.langs.target,
            "format": "text",
        });
        if let Some(key) = &self.api_key {
            body["api_key"] = Value::String(key.clone());
        }
        body
    }
}

#[async_trait]
impl TranslationProvider for LibreTranslateAdapter {
    fn id(&self) -> &str {
        "libretranslate"
    }

    fn display_name(&self) -> &str {
        "LibreTranslate (Local)"
    }

    fn daily_quota(&self) -> DailyQuota {
        DailyQuota::Unlimited
    }

    async fn translate(&self, text: &str) -> Result<String, ProviderError> {
        let resp = self.client.post(&self.url).json(&self.request_body(text)).send().await?;
        let body: Value = check_status(resp).await?.json().await?;
        required_text("LibreTranslate", &body["translatedText"], "translatedText")
    }
}
