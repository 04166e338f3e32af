//! Translation relay — Finnish→English translation over free providers.
//!
//! Serves a small HTTP JSON API. Each request is routed to the first
//! usable translation backend:
//! - Local LibreTranslate instance first, then MyMemory, Google, Lingva
//! - Providers caught rate-limiting sit out a cooldown window
//! - Batches are translated line by line with a pause between calls
//!
//! All state is in memory; nothing survives a restart.

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::info;

mod adapters;
mod config;
mod pool;
mod server;

use adapters::{
    google::GoogleAdapter, libretranslate::LibreTranslateAdapter, lingva::LingvaAdapter,
    mymemory::MyMemoryAdapter, LanguagePair,
};
use config::Config;
use pool::availability::AvailabilityTracker;
use pool::registry::ProviderRegistry;
use pool::TranslationPool;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();
    init_tracing(config.log_json);

    info!("🌍 Translation relay v{}", env!("CARGO_PKG_VERSION"));
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let addr = config.bind_addr()?;

    // ── Provider Adapters ───────────────────────────────────────────
    let client = reqwest::Client::builder()
        .timeout(config.request_timeout())
        .build()
        .context("Failed to build HTTP client")?;

    let registry = build_registry(&config, client)?;
    info!(
        providers = ?registry.ids(),
        source = %config.source_lang,
        target = %config.target_lang,
        "🔌 Providers registered (fallback order)"
    );

    // ── Translation Pool ────────────────────────────────────────────
    let tracker = Arc::new(AvailabilityTracker::new(config.rate_limit_cooldown()));
    let pool = Arc::new(TranslationPool::new(registry, tracker, config.batch_delay()));
    info!(
        cooldown_secs = pool.availability().cooldown().as_secs(),
        batch_delay_ms = config.batch_delay_ms,
        "⏱  Rate-limit cooldown and batch pacing configured"
    );

    if let Some(dir) = &config.static_dir {
        info!(dir = %dir.display(), "📄 Serving static files");
    }

    // ── HTTP Server ─────────────────────────────────────────────────
    let srv = server::Server::new(addr, Arc::clone(&pool), config.static_dir.clone());

    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("Translation relay ready — {} provider(s)", pool.providers().len());
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    srv.run().await?;

    Ok(())
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "translate_relay=info,tower_http=info".into());

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Register every backend in fallback priority order.
fn build_registry(config: &Config, client: reqwest::Client) -> Result<ProviderRegistry> {
    let langs = LanguagePair::new(&config.source_lang, &config.target_lang);

    let registry = ProviderRegistry::new()
        .with(LibreTranslateAdapter::new(
            client.clone(),
            &config.libretranslate_url,
            config.libretranslate_api_key.clone(),
            langs.clone(),
        ))?
        .with(MyMemoryAdapter::new(
            client.clone(),
            &config.mymemory_url,
            config.mymemory_api_key.clone(),
            langs.clone(),
        ))?
        .with(GoogleAdapter::new(client.clone(), &config.google_url, langs.clone()))?
        .with(
            LingvaAdapter::new(client, &config.lingva_url, langs)
                .context("Invalid Lingva base URL")?,
        )?;

    Ok(registry)
}
