//! MyMemory adapter — free public API, 1000 requests/day without a key.
//!
//! MyMemory answers quota exhaustion with HTTP 200 and a
//! `responseStatus` of 429 in the body, so the body status is checked
//! as well as the transport status.

use async_trait::async_trait;
use serde_json::Value;

use super::{
    check_status, required_text, truncate, DailyQuota, LanguagePair, ProviderError,
    TranslationProvider,
};

pub struct MyMemoryAdapter {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
    langs: LanguagePair,
}

impl MyMemoryAdapter {
    pub fn new(
        client: reqwest::Client,
        url: impl Into<String>,
        api_key: Option<String>,
        langs: LanguagePair,
    ) -> Self {
        Self { client, url: url.into(), api_key, langs }
    }

    fn query(&self, text: &str) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("q", text.to_string()),
            ("langpair", format!("{}|{}", self.langs.source, self.langs.target)),
        ];
        if let Some(key) = &self.api_key {
            query.push(("key", key.clone()));
        }
        query
    }
}

/// `responseStatus` arrives as either a number or a numeric string.
fn response_status(body: &Value) -> Option<u64> {
    match &body["responseStatus"] {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[async_trait]
impl TranslationProvider for MyMemoryAdapter {
    fn id(&self) -> &str {
        "mymemory"
    }

    fn display_name(&self) -> &str {
        "MyMemory"
    }

    fn daily_quota(&self) -> DailyQuota {
        DailyQuota::Requests(1000)
    }

    async fn translate(&self, text: &str) -> Result<String, ProviderError> {
        let resp = self.client.get(&self.url).query(&self.query(text)).send().await?;
        let body: Value = check_status(resp).await?.json().await?;

        match response_status(&body) {
            Some(200) => {}
            Some(429) => return Err(ProviderError::RateLimited),
            status => {
                let details = body["responseDetails"].as_str().unwrap_or("no details");
                return Err(ProviderError::malformed(
                    "MyMemory",
                    format!(
                        "responseStatus {}: {}",
                        status.map_or_else(|| "missing".to_string(), |s| s.to_string()),
                        truncate(details, 200)
                    ),
                ));
            }
        }

        required_text(
            "MyMemory",
            &body["responseData"]["translatedText"],
            "responseData.translatedText",
        )
    }
}
