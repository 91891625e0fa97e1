//! Policy assistant HTTP server.
//!
//! Exposes the query pipeline to the booking front-end, plus ingestion and
//! collection listing for operators.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::application::RagContext;
use crate::domain::errors::{DomainError, ErrorKind};
use crate::domain::models::{CollectionInfo, IngestPolicy, IngestReport, ServerConfig};
use crate::domain::ports::VectorStore;

/// Configuration for the policy HTTP server.
#[derive(Debug, Clone)]
pub struct PolicyHttpConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Whether to enable CORS.
    pub enable_cors: bool,
}

impl Default for PolicyHttpConfig {
    fn default() -> Self {
        Self::from(&ServerConfig::default())
    }
}

impl From<&ServerConfig> for PolicyHttpConfig {
    fn from(server: &ServerConfig) -> Self {
        Self {
            host: server.host.clone(),
            port: server.port,
            enable_cors: server.enable_cors,
        }
    }
}

/// Question from the booking front-end.
#[derive(Debug, Deserialize)]
pub struct QueryInfoRequest {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub collection: Option<String>,
}

/// Answer text. Failures are reported as an apology in `response`.
#[derive(Debug, Serialize, Deserialize)]
pub struct QueryInfoResponse {
    pub response: String,
}

/// Request to (re-)ingest the configured source directory.
#[derive(Debug, Default, Deserialize)]
pub struct IngestHttpRequest {
    #[serde(default)]
    pub collection: Option<String>,
    #[serde(default)]
    pub policy: Option<IngestPolicy>,
}

/// Result of deleting a collection.
#[derive(Debug, Serialize, Deserialize)]
pub struct ResetResponse {
    pub collection: String,
    pub entries_removed: usize,
}

/// Error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(e: &DomainError, code: &str) -> ApiError {
    let status = match e.kind() {
        ErrorKind::Configuration => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::Transient => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Data | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse {
            error: e.to_string(),
            code: code.to_string(),
        }),
    )
}

/// Policy assistant HTTP server.
pub struct PolicyHttpServer {
    config: PolicyHttpConfig,
    context: Arc<RagContext>,
}

impl PolicyHttpServer {
    pub fn new(context: Arc<RagContext>, config: PolicyHttpConfig) -> Self {
        Self { config, context }
    }

    /// Build the router.
    pub fn build_router(&self) -> Router {
        let app = Router::new()
            .route("/api/query_info", post(query_info))
            .route("/api/ingest", post(ingest))
            .route("/api/collections", get(list_collections))
            .route("/api/collections/{name}", delete(reset_collection))
            .route("/health", get(health_check))
            .with_state(self.context.clone());

        if self.config.enable_cors {
            app.layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
                .layer(TraceLayer::new_for_http())
        } else {
            app.layer(TraceLayer::new_for_http())
        }
    }

    /// Start the server with a shutdown signal.
    pub async fn serve_with_shutdown<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port).parse()?;
        let router = self.build_router();

        tracing::info!("Policy HTTP server listening on {}", addr);

        let listener = TcpListener::bind(addr).await?;
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await?;
        Ok(())
    }
}

// Handler functions

async fn health_check() -> &'static str {
    "OK"
}

async fn query_info(
    State(context): State<Arc<RagContext>>,
    Json(req): Json<QueryInfoRequest>,
) -> Json<QueryInfoResponse> {
    let collection = req.collection.as_deref().unwrap_or_else(|| context.collection());
    let response = context.query().answer(&req.query, collection).await;
    Json(QueryInfoResponse { response })
}

async fn ingest(
    State(context): State<Arc<RagContext>>,
    Json(req): Json<IngestHttpRequest>,
) -> Result<Json<IngestReport>, ApiError> {
    let mut request = context.ingest_request();
    if let Some(collection) = req.collection {
        request.collection = collection;
    }
    if let Some(policy) = req.policy {
        request.policy = policy;
    }

    context
        .ingestion()
        .ingest(&request)
        .await
        .map(Json)
        .map_err(|e| api_error(&e, "INGEST_ERROR"))
}

async fn list_collections(
    State(context): State<Arc<RagContext>>,
) -> Result<Json<Vec<CollectionInfo>>, ApiError> {
    context
        .store()
        .list_collections()
        .await
        .map(Json)
        .map_err(|e| api_error(&e, "LIST_ERROR"))
}

async fn reset_collection(
    State(context): State<Arc<RagContext>>,
    Path(name): Path<String>,
) -> Result<Json<ResetResponse>, ApiError> {
    context
        .ingestion()
        .reset(&name)
        .await
        .map(|entries_removed| {
            Json(ResetResponse {
                collection: name,
                entries_removed,
            })
        })
        .map_err(|e| api_error(&e, "RESET_ERROR"))
}
