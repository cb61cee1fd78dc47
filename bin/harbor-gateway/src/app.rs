//! Application state and router assembly

use crate::data_plane;
use crate::error::ApiError;
use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::response::IntoResponse;
use axum::routing::{any, get, put};
use harbor_auth::Authenticator;
use harbor_placement::BackendConfig;
use harbor_store::{DataStoreRegistry, MetadataStore};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Path prefix of the internal replication protocol
pub const INTERNAL_PREFIX: &str = "/_internal/replication";

/// Application state shared across handlers.
///
/// Read-only after startup; per-request state lives on the stack of each
/// handler invocation.
pub struct AppState {
    /// Backend mode and location tables, passed to the resolver per call
    pub backend: BackendConfig,
    /// Object/bucket metadata collaborator
    pub metadata: Arc<dyn MetadataStore>,
    /// Data stores keyed by `dataStoreName`
    pub data: Arc<DataStoreRegistry>,
    /// Authenticator for the internal data plane
    pub authenticator: Arc<dyn Authenticator>,
}

/// Build the gateway router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        // Set bucket replication configuration (?replication)
        .route("/{bucket}", put(crate::bucket_api::put_bucket))
        // Internal replication protocol: (bucket, object, resourceType)
        .route(
            "/_internal/replication/{bucket}/{object}/{resource}",
            any(data_plane::dispatch),
        )
        .fallback(fallback)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Unmatched paths: a malformed internal-protocol shape is a routing
/// failure; anything else is simply not served by this gateway.
async fn fallback(State(_state): State<Arc<AppState>>, uri: Uri) -> ApiError {
    if uri.path().starts_with(INTERNAL_PREFIX) {
        ApiError::method_not_allowed(format!("unroutable internal request: {}", uri.path()))
    } else {
        ApiError::new(
            StatusCode::NOT_IMPLEMENTED,
            "NotImplemented",
            "this gateway only serves the internal replication protocol",
        )
    }
}
