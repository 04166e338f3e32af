//! HTTP JSON API over the translation pool.
//!
//! Routes:
//! - `POST /api/translate`        — one text, `{text, service?}`
//! - `POST /api/translate-batch`  — many lines, `{lines, service?}`
//! - `GET  /api/services`         — provider names, quotas, availability
//!
//! Every response carries `success`; failures carry `error`. An optional
//! static directory is served for everything else.

use anyhow::{Context, Result};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use uuid::Uuid;

use crate::pool::{Outcome, TranslateError, Translation, TranslationPool, AUTO};

// ── Request / Response Types ────────────────────────────────────────

/// An absent `service` means auto; an explicit `null` names no provider
/// and is rejected like any unknown service.
#[derive(Debug, Deserialize)]
struct TranslateRequest {
    #[serde(default)]
    text: Option<String>,
    #[serde(default = "auto_service")]
    service: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BatchRequest {
    #[serde(default)]
    lines: Option<Vec<String>>,
    #[serde(default = "auto_service")]
    service: Option<String>,
}

fn auto_service() -> Option<String> {
    Some(AUTO.to_string())
}

/// Wire shape of one translation result.
#[derive(Debug, Serialize)]
struct OutcomeBody {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    translation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    service: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl OutcomeBody {
    fn translated(t: &Translation) -> Self {
        Self {
            success: true,
            translation: Some(t.text.clone()),
            service: Some(t.provider.clone()),
            error: None,
        }
    }

    fn failed(error: String) -> Self {
        Self { success: false, translation: None, service: None, error: Some(error) }
    }
}

impl From<&Outcome> for OutcomeBody {
    fn from(outcome: &Outcome) -> Self {
        match outcome {
            Ok(t) => Self::translated(t),
            Err(e) => Self::failed(e.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
struct BatchBody {
    success: bool,
    results: Vec<OutcomeBody>,
}

// ── Errors ──────────────────────────────────────────────────────────

/// Request-level failure, rendered as `{success: false, error}`.
#[derive(Debug, thiserror::Error)]
enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unavailable(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<TranslateError> for ApiError {
    fn from(e: TranslateError) -> Self {
        match e {
            TranslateError::InvalidService(_) | TranslateError::EmptyLine => {
                ApiError::BadRequest(e.to_string())
            }
            TranslateError::AllServicesFailed => ApiError::Unavailable(e.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Internal(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = OutcomeBody::failed(self.to_string());
        (self.status(), Json(body)).into_response()
    }
}

// ── Server ──────────────────────────────────────────────────────────

pub struct Server {
    addr: SocketAddr,
    pool: Arc<TranslationPool>,
    static_dir: Option<PathBuf>,
}

impl Server {
    pub fn new(addr: SocketAddr, pool: Arc<TranslationPool>, static_dir: Option<PathBuf>) -> Self {
        Self { addr, pool, static_dir }
    }

    pub async fn run(self) -> Result<()> {
        let app = router(Arc::clone(&self.pool), self.static_dir.clone());
        let listener = TcpListener::bind(self.addr)
            .await
            .with_context(|| format!("Failed to bind {}", self.addr))?;

        info!(addr = %self.addr, "🌐 Translation relay listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("HTTP server failed")?;

        info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

pub fn router(pool: Arc<TranslationPool>, static_dir: Option<PathBuf>) -> Router {
    let api = Router::new()
        .route("/api/translate", post(handle_translate))
        .route("/api/translate-batch", post(handle_translate_batch))
        .route("/api/services", get(handle_services))
        .with_state(pool);

    let app = match static_dir {
        Some(dir) => api.fallback_service(ServeDir::new(dir)),
        None => api,
    };

    app.layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

// ── Handlers ────────────────────────────────────────────────────────

async fn handle_translate(
    State(pool): State<Arc<TranslationPool>>,
    payload: Result<Json<TranslateRequest>, JsonRejection>,
) -> Result<Json<OutcomeBody>, ApiError> {
    let Json(req) = payload?;
    let request_id = Uuid::new_v4();

    let text = req.text.as_deref().unwrap_or_default().trim();
    if text.is_empty() {
        return Err(ApiError::BadRequest("No text provided".into()));
    }
    let service = req.service.as_deref().unwrap_or_default();

    info!(%request_id, service, chars = text.chars().count(), "Translate request");
    match pool.translate(service, text).await {
        Ok(t) => {
            info!(%request_id, provider = %t.provider, "Translate request served");
            Ok(Json(OutcomeBody::translated(&t)))
        }
        Err(TranslateError::InvalidService(name)) => {
            warn!(%request_id, service = %name, "Translate request for unknown service");
            Err(TranslateError::InvalidService(name).into())
        }
        Err(e) => {
            warn!(%request_id, error = %e, "Translate request failed");
            Err(e.into())
        }
    }
}

async fn handle_translate_batch(
    State(pool): State<Arc<TranslationPool>>,
    payload: Result<Json<BatchRequest>, JsonRejection>,
) -> Result<Json<BatchBody>, ApiError> {
    let Json(req) = payload?;
    let request_id = Uuid::new_v4();

    let lines = req.lines.unwrap_or_default();
    if lines.is_empty() {
        return Err(ApiError::BadRequest("No lines provided".into()));
    }
    let service = req.service.as_deref().unwrap_or_default();

    info!(%request_id, service, lines = lines.len(), "Batch translate request");
    let outcomes = pool.translate_batch(&lines, service).await;

    Ok(Json(BatchBody {
        success: true,
        results: outcomes.iter().map(OutcomeBody::from).collect(),
    }))
}

async fn handle_services(State(pool): State<Arc<TranslationPool>>) -> Json<serde_json::Value> {
    let services: serde_json::Map<String, serde_json::Value> = pool
        .service_status()
        .into_iter()
        .map(|s| {
            let value = serde_json::to_value(&s).unwrap_or(serde_json::Value::Null);
            (s.id, value)
        })
        .collect();

    Json(serde_json::json!({
        "success": true,
        "services": services,
    }))
}
