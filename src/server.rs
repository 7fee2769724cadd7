use crate::constants::{CSV_CONTENT_TYPE, CSV_FILE_FIELD, DEFAULT_PROVIDER_LIMIT};
use crate::error::{IntakeError, Result};
use crate::metrics::{self, IntakeMetrics};
use crate::pipeline::{ClaimStorage, IntakePipeline};
use crate::rate_limiter::RateLimiter;
use axum::{
    extract::{ConnectInfo, Multipart, Path, Query},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Extension, Router,
};
use hyper::Server;
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

/// Shared handles for request handlers
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<IntakePipeline>,
    pub storage: Arc<dyn ClaimStorage>,
    pub limiter: RateLimiter,
}

impl AppState {
    pub fn new(storage: Arc<dyn ClaimStorage>, limiter: RateLimiter) -> Self {
        Self {
            pipeline: Arc::new(IntakePipeline::new(storage.clone())),
            storage,
            limiter,
        }
    }
}

impl IntoResponse for IntakeError {
    fn into_response(self) -> Response {
        let (status, detail) = if self.is_client_input() {
            (StatusCode::BAD_REQUEST, format!("Error processing file: {self}"))
        } else {
            let status = match &self {
                Self::UnsupportedMediaType { .. } | Self::Multipart(_) => StatusCode::BAD_REQUEST,
                Self::NotFound(_) => StatusCode::NOT_FOUND,
                Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (status, self.to_string())
        };

        let mut response = (status, Json(serde_json::json!({ "detail": detail }))).into_response();
        if let Self::RateLimited { retry_after_secs } = self {
            if let Ok(value) = HeaderValue::from_str(&retry_after_secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "claims-intake",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

fn is_csv(content_type: Option<&str>) -> bool {
    content_type
        .and_then(|value| value.split(';').next())
        .map(|essence| essence.trim().eq_ignore_ascii_case(CSV_CONTENT_TYPE))
        .unwrap_or(false)
}

/// Upload a CSV of claims as the `csv_file` form part
async fn post_claims(
    Extension(state): Extension<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| IntakeError::Multipart(e.to_string()))?
    {
        if field.name() != Some(CSV_FILE_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field.content_type().map(str::to_string);
        if !is_csv(content_type.as_deref()) {
            warn!("Rejected upload with content type {:?}", content_type);
            return Err(IntakeError::UnsupportedMediaType { content_type });
        }

        let content = field
            .bytes()
            .await
            .map_err(|e| IntakeError::Multipart(e.to_string()))?;
        info!("Received upload '{}' ({} bytes)", file_name, content.len());

        let batch = state.pipeline.ingest(&content).await?;
        return Ok(Json(batch));
    }

    Err(IntakeError::Multipart(format!(
        "missing `{CSV_FILE_FIELD}` form part"
    )))
}

async fn get_claims(
    Extension(state): Extension<AppState>,
    Path(claim_id): Path<String>,
) -> Result<impl IntoResponse> {
    let claims = state.storage.find_by_id(&claim_id).await?;
    if claims.is_empty() {
        return Err(IntakeError::NotFound("Claims not found.".to_string()));
    }
    info!("Found {} claim(s) for id {}", claims.len(), claim_id);
    Ok(Json(claims))
}

#[derive(Debug, Deserialize)]
struct ProvidersQuery {
    limit: Option<usize>,
}

/// Forwarded-for first, then the peer address
fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "anonymous".to_string())
}

async fn top_providers(
    Extension(state): Extension<AppState>,
    headers: HeaderMap,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    Query(query): Query<ProvidersQuery>,
) -> Result<impl IntoResponse> {
    let key = client_key(&headers, connect_info.map(|ConnectInfo(addr)| addr));
    if let Err(wait) = state.limiter.check(&key).await {
        warn!("Rate limit exceeded for {}", key);
        IntakeMetrics::record_rate_limited();
        return Err(IntakeError::RateLimited {
            retry_after_secs: wait.as_secs().max(1),
        });
    }

    let limit = query.limit.unwrap_or(DEFAULT_PROVIDER_LIMIT);
    let providers = state.storage.top_providers(limit).await?;
    IntakeMetrics::record_provider_query();

    if providers.is_empty() {
        return Err(IntakeError::NotFound("No providers found".to_string()));
    }
    info!("Returning {} provider(s)", providers.len());
    Ok(Json(providers))
}

async fn metrics_text() -> Response {
    match metrics::render() {
        Some(text) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        None => IntakeError::NotFound("Metrics recorder not installed".to_string()).into_response(),
    }
}

/// Create the HTTP server with all routes
pub fn create_server(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/claims", post(post_claims))
        .route("/claims/:claim_id", get(get_claims))
        .route("/providers", get(top_providers))
        .route("/metrics", get(metrics_text))
        .layer(Extension(state))
        .layer(ServiceBuilder::new().layer(cors))
}

/// Start the HTTP server on the specified port
pub async fn start_server(state: AppState, port: u16) -> Result<()> {
    let app = create_server(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("HTTP server running on http://localhost:{port}");
    info!("Health check: http://localhost:{port}/health");
    Server::bind(&addr)
        .serve(app.into_make_service_with_connect_info::<SocketAddr>())
        .await?;
    Ok(())
}
