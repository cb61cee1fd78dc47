//! Bucket replication configuration handler
//!
//! `PUT /{bucket}?replication` validates the XML body into a typed
//! configuration and persists it onto the bucket's metadata. Validation
//! always completes before any write; responses on both arms carry the
//! CORS headers collected from the bucket's own rules.

use crate::app::AppState;
use crate::cors::collect_cors_headers;
use crate::error::ApiError;
use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use harbor_auth::AuthRequest;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Largest accepted replication configuration body
const MAX_CONFIG_SIZE: usize = 1024 * 1024;

/// Query parameters for PUT bucket operations
#[derive(Debug, Deserialize, Default)]
pub struct PutBucketParams {
    /// If present (even empty), this is a replication request
    replication: Option<String>,
}

impl PutBucketParams {
    /// Check if this is a replication operation (has ?replication in the
    /// query string)
    pub const fn is_replication_request(&self) -> bool {
        self.replication.is_some()
    }
}

/// `PUT /{bucket}` entry point
pub async fn put_bucket(
    State(state): State<Arc<AppState>>,
    Path(bucket): Path<String>,
    Query(params): Query<PutBucketParams>,
    method: Method,
    headers: HeaderMap,
    body: Body,
) -> Response {
    if !params.is_replication_request() {
        return ApiError::new(
            StatusCode::NOT_IMPLEMENTED,
            "NotImplemented",
            "only the replication sub-resource is served by this gateway",
        )
        .into_response();
    }

    put_bucket_replication(&state, &bucket, &method, &headers, body)
        .await
        .unwrap_or_else(|err| err.with_resource(format!("/{bucket}")).into_response())
}

async fn put_bucket_replication(
    state: &AppState,
    bucket: &str,
    method: &Method,
    headers: &HeaderMap,
    body: Body,
) -> Result<Response, ApiError> {
    let path = format!("/{bucket}");
    let auth_request = AuthRequest::new(method.as_str(), &path, headers);
    let identity = state
        .authenticator
        .authenticate(&auth_request)
        .await
        .map_err(|err| ApiError::from_auth(&err))?;

    let origin = headers
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok());

    let bucket_metadata = state.metadata.get_bucket(bucket).await?;
    let cors = collect_cors_headers(origin, method, Some(&bucket_metadata));

    if bucket_metadata.owner != identity.subject {
        debug!(
            bucket,
            owner = %bucket_metadata.owner,
            requester = %identity.subject,
            "replication configuration write denied"
        );
        return Err(ApiError::from(harbor_common::Error::AccessDenied).with_headers(cors));
    }

    let bytes = axum::body::to_bytes(body, MAX_CONFIG_SIZE)
        .await
        .map_err(|err| {
            ApiError::new(
                StatusCode::BAD_REQUEST,
                "InvalidArgument",
                format!("failed to read request body: {err}"),
            )
            .with_headers(cors.clone())
        })?;

    // Validation completes before any persistence side effect
    let config = harbor_replication::parse(&bytes)
        .map_err(|err| ApiError::from(harbor_common::Error::from(err)).with_headers(cors.clone()))?;

    let rule_count = config.rules.len();
    state
        .metadata
        .put_bucket_replication(bucket, config)
        .await
        .map_err(|err| ApiError::from(err).with_headers(cors.clone()))?;
    info!(bucket, rule_count, "replication configuration updated");

    let request_id = Uuid::new_v4().to_string();
    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header("x-amz-request-id", &request_id)
        .header("x-amz-id-2", &request_id);
    if let Some(response_headers) = builder.headers_mut() {
        response_headers.extend(cors);
    }
    builder
        .body(Body::empty())
        .map_err(|err| ApiError::from(harbor_common::Error::internal(err.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::router;
    use axum::http::Request;
    use harbor_auth::SharedSecretAuthenticator;
    use harbor_placement::{BackendConfig, BackendMode};
    use harbor_store::{
        BucketMetadata, CorsRule, DataStoreRegistry, MemMetadataStore, MetadataStore,
    };
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    const SECRET: &str = "test-secret";

    const VALID_CONFIG: &str = "<ReplicationConfiguration>\
        <Role>arn:aws:iam::123456789012:role/repl</Role>\
        <Rule><ID>rule-1</ID><Status>Enabled</Status><Prefix>logs/</Prefix>\
        <Destination><Bucket>arn:aws:s3:::dest</Bucket>\
        <StorageClass>STANDARD_IA</StorageClass></Destination></Rule>\
        </ReplicationConfiguration>";

    async fn test_state() -> (Arc<AppState>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let backend = BackendConfig::local(BackendMode::Mem, dir.path());
        let data = Arc::new(DataStoreRegistry::from_backend_config(&backend).unwrap());
        let metadata = Arc::new(MemMetadataStore::new());
        metadata
            .put_bucket(
                BucketMetadata::new("b1", "replication-worker").with_cors_rule(CorsRule {
                    allowed_origins: vec!["https://console.example".to_string()],
                    allowed_methods: vec!["PUT".to_string()],
                }),
            )
            .await
            .unwrap();
        metadata
            .put_bucket(BucketMetadata::new("other", "someone-else"))
            .await
            .unwrap();
        let state = Arc::new(AppState {
            backend,
            metadata,
            data,
            authenticator: Arc::new(SharedSecretAuthenticator::new(SECRET)),
        });
        (state, dir)
    }

    fn put_replication(bucket: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("PUT")
            .uri(format!("/{bucket}?replication"))
            .header("authorization", format!("Bearer {SECRET}"))
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_string(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    #[tokio::test]
    async fn test_valid_configuration_is_persisted() {
        let (state, _dir) = test_state().await;
        let app = router(state.clone());

        let response = app.oneshot(put_replication("b1", VALID_CONFIG)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bucket = state.metadata.get_bucket("b1").await.unwrap();
        let config = bucket.replication.expect("configuration stored");
        assert_eq!(config.rules.len(), 1);
        assert_eq!(config.rules[0].prefix, "logs/");
    }

    #[tokio::test]
    async fn test_cors_headers_echoed_on_success() {
        let (state, _dir) = test_state().await;
        let app = router(state);

        let request = Request::builder()
            .method("PUT")
            .uri("/b1?replication")
            .header("authorization", format!("Bearer {SECRET}"))
            .header("origin", "https://console.example")
            .body(Body::from(VALID_CONFIG))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .unwrap(),
            "https://console.example"
        );
    }

    #[tokio::test]
    async fn test_empty_body_is_malformed() {
        let (state, _dir) = test_state().await;
        let app = router(state.clone());

        let response = app.oneshot(put_replication("b1", "")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_string(response).await.contains("MalformedXML"));

        // No partial write happened
        let bucket = state.metadata.get_bucket("b1").await.unwrap();
        assert!(bucket.replication.is_none());
    }

    #[tokio::test]
    async fn test_illegal_configuration_is_rejected() {
        let (state, _dir) = test_state().await;
        let app = router(state);

        let missing_role = "<ReplicationConfiguration>\
            <Rule><Status>Enabled</Status><Prefix></Prefix>\
            <Destination><Bucket>arn:aws:s3:::dest</Bucket></Destination></Rule>\
            </ReplicationConfiguration>";
        let response = app.oneshot(put_replication("b1", missing_role)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(
            body_string(response)
                .await
                .contains("IllegalReplicationConfiguration")
        );
    }

    #[tokio::test]
    async fn test_unknown_bucket_is_not_found() {
        let (state, _dir) = test_state().await;
        let app = router(state);

        let response = app
            .oneshot(put_replication("ghost", VALID_CONFIG))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_string(response).await.contains("NoSuchBucket"));
    }

    #[tokio::test]
    async fn test_non_owner_is_denied() {
        let (state, _dir) = test_state().await;
        let app = router(state.clone());

        let response = app
            .oneshot(put_replication("other", VALID_CONFIG))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(body_string(response).await.contains("AccessDenied"));

        let bucket = state.metadata.get_bucket("other").await.unwrap();
        assert!(bucket.replication.is_none());
    }

    #[tokio::test]
    async fn test_other_bucket_put_is_not_implemented() {
        let (state, _dir) = test_state().await;
        let app = router(state);

        let request = Request::builder()
            .method("PUT")
            .uri("/b1")
            .header("authorization", format!("Bearer {SECRET}"))
            .body(Body::from(VALID_CONFIG))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
    }

    #[tokio::test]
    async fn test_replication_requires_authentication() {
        let (state, _dir) = test_state().await;
        let app = router(state);

        let request = Request::builder()
            .method("PUT")
            .uri("/b1?replication")
            .body(Body::from(VALID_CONFIG))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
