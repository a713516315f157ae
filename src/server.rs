//! HTTP API server.
//!
//! Thin axum plumbing over the core gateways. Handlers extract and shape
//! input, call the gateway, and map its outcome onto a status code.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/` | Liveness banner |
//! | `GET`  | `/api/health` | Status, version, store availability |
//! | `GET`  | `/test` | Store diagnostic report |
//! | `POST` | `/api/leads` | Web-form lead (multipart, optional `file`) |
//! | `POST` | `/api/contact` | Contact message (multipart, optional `file`) |
//! | `POST` | `/api/chatbot/lead` | Chatbot lead (JSON) |
//! | `GET`  | `/api/components` | Component catalog with fallback |
//! | `GET`  | `/api/faq` | Static FAQ |
//!
//! # Submission Contract
//!
//! ```json
//! { "ok": true, "id": "3f0c…" }
//! { "ok": true, "id": null, "warning": "DB non configurato: richiesta ricevuta ma non salvata." }
//! ```
//!
//! A reachable store that rejects a write is the only case answered with a
//! server error. An absent or unreachable store is answered with success and
//! a warning.
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "validation_error", "message": "email: value is not a valid email address" } }
//! ```
//!
//! Error codes: `validation_error` (422), `payload_too_large` (413),
//! `write_failed` (500), `internal` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so the public website and
//! the chatbot widget can call the API from the browser.

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::{JsonRejection, QueryRejection},
        DefaultBodyLimit, Multipart, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use ceap_core::catalog::{CatalogGateway, ComponentQuery, FallbackCatalog, DEFAULT_LIMIT};
use ceap_core::diagnostics::{probe_health, ConfigPresence, HealthReport};
use ceap_core::error::ValidationError;
use ceap_core::faq::{FaqEntry, FAQ};
use ceap_core::gateway::{SubmissionError, SubmissionGateway, SubmissionOutcome};
use ceap_core::models::ChatbotLead;
use ceap_core::store::{Document, DocumentStore};

use crate::config::Config;
use crate::intake::FormSubmission;
use crate::store::open_store;

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    store: Option<Arc<dyn DocumentStore>>,
    submissions: SubmissionGateway,
    catalog: CatalogGateway,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        store: Option<Arc<dyn DocumentStore>>,
        fallback: FallbackCatalog,
    ) -> Self {
        Self {
            submissions: SubmissionGateway::new(store.clone()),
            catalog: CatalogGateway::new(store.clone(), fallback),
            config,
            store,
        }
    }
}

/// Starts the HTTP server with the store described by `config`.
///
/// A configured store is opened lazily and migrated best-effort; if the
/// database cannot be reached the server still starts, in degraded mode.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let store = open_store(config, true).await?;
    run_server_with_store(config, store).await
}

/// Starts the HTTP server over an explicit store handle (`None` for
/// degraded mode). Runs until the process is terminated.
pub async fn run_server_with_store(
    config: &Config,
    store: Option<Arc<dyn DocumentStore>>,
) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    if store.is_none() {
        tracing::warn!("no document store configured, submissions will not be persisted");
    }

    let state = AppState::new(Arc::new(config.clone()), store, FallbackCatalog::demo());
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("CEAP Componenti API listening on http://{}", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handle_root))
        .route("/api/health", get(handle_health))
        .route("/test", get(handle_diagnostics))
        .route("/api/leads", post(handle_create_lead))
        .route("/api/contact", post(handle_create_contact))
        .route("/api/chatbot/lead", post(handle_chatbot_lead))
        .route("/api/components", get(handle_list_components))
        .route("/api/faq", get(handle_faq))
        .layer(DefaultBodyLimit::max(state.config.server.max_upload_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn validation_error(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::UNPROCESSABLE_ENTITY,
        code: "validation_error".to_string(),
        message: message.into(),
    }
}

fn write_failed(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "write_failed".to_string(),
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        validation_error(e.to_string())
    }
}

impl From<SubmissionError> for AppError {
    fn from(e: SubmissionError) -> Self {
        match e {
            SubmissionError::Validation(v) => v.into(),
            SubmissionError::Encode(e) => {
                tracing::error!(error = %e, "failed to encode submission");
                internal("failed to encode submission")
            }
        }
    }
}

impl From<MultipartError> for AppError {
    fn from(e: MultipartError) -> Self {
        let status = e.status();
        if status == StatusCode::PAYLOAD_TOO_LARGE {
            return AppError {
                status,
                code: "payload_too_large".to_string(),
                message: e.body_text(),
            };
        }
        validation_error(format!("body: {}", e.body_text()))
    }
}

impl From<MultipartRejection> for AppError {
    fn from(e: MultipartRejection) -> Self {
        validation_error(format!("body: {}", e.body_text()))
    }
}

impl From<JsonRejection> for AppError {
    fn from(e: JsonRejection) -> Self {
        validation_error(format!("body: {}", e.body_text()))
    }
}

impl From<QueryRejection> for AppError {
    fn from(e: QueryRejection) -> Self {
        validation_error(format!("query: {}", e.body_text()))
    }
}

// ============ Submissions ============

/// Acknowledgement returned for every successful submission.
#[derive(Debug, Serialize)]
struct SubmissionAck {
    ok: bool,
    id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warning: Option<&'static str>,
}

fn acknowledge(outcome: SubmissionOutcome) -> Result<Json<SubmissionAck>, AppError> {
    match outcome {
        SubmissionOutcome::Saved(id) => Ok(Json(SubmissionAck {
            ok: true,
            id: Some(id),
            warning: None,
        })),
        SubmissionOutcome::Accepted { warning } => Ok(Json(SubmissionAck {
            ok: true,
            id: None,
            warning: Some(warning),
        })),
        SubmissionOutcome::Failed { kind, .. } => Err(write_failed(kind.failure_detail())),
    }
}

/// Handler for `POST /api/leads`.
async fn handle_create_lead(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<SubmissionAck>, AppError> {
    let multipart = multipart?;
    let (lead, upload) = FormSubmission::read(multipart).await?.into_lead()?;
    let outcome = state.submissions.submit_lead(lead, upload).await?;
    acknowledge(outcome)
}

/// Handler for `POST /api/contact`.
async fn handle_create_contact(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<SubmissionAck>, AppError> {
    let multipart = multipart?;
    let (message, upload) = FormSubmission::read(multipart).await?.into_contact()?;
    let outcome = state.submissions.submit_contact(message, upload).await?;
    acknowledge(outcome)
}

/// Handler for `POST /api/chatbot/lead`.
async fn handle_chatbot_lead(
    State(state): State<AppState>,
    payload: Result<Json<ChatbotLead>, JsonRejection>,
) -> Result<Json<SubmissionAck>, AppError> {
    let Json(lead) = payload?;
    let outcome = state.submissions.submit_chatbot_lead(lead).await?;
    acknowledge(outcome)
}

// ============ Catalog ============

/// Query parameters for `GET /api/components`.
#[derive(Debug, Deserialize)]
struct ComponentParams {
    #[serde(rename = "type")]
    kind: Option<String>,
    mount: Option<String>,
    package: Option<String>,
    brand: Option<String>,
    limit: Option<usize>,
}

#[derive(Serialize)]
struct ItemsResponse<T: Serialize> {
    items: Vec<T>,
}

/// Handler for `GET /api/components`.
async fn handle_list_components(
    State(state): State<AppState>,
    params: Result<Query<ComponentParams>, QueryRejection>,
) -> Result<Json<ItemsResponse<Document>>, AppError> {
    let Query(params) = params?;
    let query = ComponentQuery {
        kind: params.kind,
        mount: params.mount,
        package: params.package,
        brand: params.brand,
    };
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
    let items = state.catalog.list_components(&query, limit).await;
    Ok(Json(ItemsResponse { items }))
}

/// Handler for `GET /api/faq`.
async fn handle_faq() -> Json<ItemsResponse<FaqEntry>> {
    Json(ItemsResponse {
        items: FAQ.to_vec(),
    })
}

// ============ Health ============

async fn handle_root() -> Json<serde_json::Value> {
    Json(json!({ "message": "CEAP Componenti Backend Running" }))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    store_available: bool,
}

/// Handler for `GET /api/health`. Never fails.
async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        store_available: state.submissions.probe().is_available().await,
    })
}

/// Handler for `GET /test`. Never fails.
async fn handle_diagnostics(State(state): State<AppState>) -> Json<HealthReport> {
    let presence = ConfigPresence {
        url_set: state.config.store.url_set(),
        name_set: state.config.store.name_set(),
    };
    Json(probe_health(state.store.as_ref(), presence).await)
}
