//! Process configuration — CLI flags with environment variable fallbacks.
//!
//! Every setting has a default, so the relay starts with no arguments
//! against a local LibreTranslate and the free public providers.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Address to bind the HTTP server to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    /// Source language code sent to every provider
    #[arg(long, env = "SOURCE_LANG", default_value = "fi")]
    pub source_lang: String,

    /// Target language code sent to every provider
    #[arg(long, env = "TARGET_LANG", default_value = "en")]
    pub target_lang: String,

    /// Per-request timeout for provider calls
    #[arg(long, env = "REQUEST_TIMEOUT", default_value_t = 10)]
    pub request_timeout_secs: u64,

    /// How long a rate-limited provider is skipped
    #[arg(long, env = "RATE_LIMIT_COOLDOWN", default_value_t = 60)]
    pub rate_limit_cooldown_secs: u64,

    /// Pause between consecutive lines of a batch request
    #[arg(long, env = "BATCH_DELAY_MS", default_value_t = 500)]
    pub batch_delay_ms: u64,

    #[arg(long, env = "LIBRETRANSLATE_URL", default_value = "http://localhost:5001/translate")]
    pub libretranslate_url: String,

    #[arg(long, env = "LIBRETRANSLATE_API_KEY")]
    pub libretranslate_api_key: Option<String>,

    #[arg(long, env = "MYMEMORY_URL", default_value = "https://api.mymemory.translated.net/get")]
    pub mymemory_url: String,

    /// Optional key for higher MyMemory daily limits
    #[arg(long, env = "MYMEMORY_API_KEY")]
    pub mymemory_api_key: Option<String>,

    #[arg(
        long,
        env = "GOOGLE_TRANSLATE_URL",
        default_value = "https://translate.googleapis.com/translate_a/single"
    )]
    pub google_url: String,

    /// Lingva instance base URL (the API path is appended)
    #[arg(long, env = "LINGVA_URL", default_value = "https://lingva.ml")]
    pub lingva_url: String,

    /// Directory served at `/` (index.html, scripts, styles)
    #[arg(long, env = "STATIC_DIR")]
    pub static_dir: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, env = "LOG_JSON", default_value_t = false)]
    pub log_json: bool,
}

impl Config {
    pub fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse()
            .map_err(|e| anyhow::anyhow!("Invalid bind address '{}': {}", addr, e))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn rate_limit_cooldown(&self) -> Duration {
        Duration::from_secs(self.rate_limit_cooldown_secs)
    }

    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }
}
