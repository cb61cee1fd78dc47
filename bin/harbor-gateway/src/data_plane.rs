//! Internal replication protocol handlers
//!
//! Each request runs a sequential pipeline: validate the route shape,
//! authenticate, then dispatch on method x resourceType. Every branch
//! ends in an explicit success payload or an S3-style error; nothing
//! falls through.
//!
//! ```text
//! GET  /_internal/replication/{bucket}/{object}/metadata  -> metadata document
//! PUT  /_internal/replication/{bucket}/{object}/metadata  -> stored document
//! POST /_internal/replication/{bucket}/{object}/data      -> raw byte stream
//! PUT  /_internal/replication/{bucket}/{object}/data      -> {contentDigest, locations}
//! ```

use crate::app::AppState;
use crate::error::{ApiError, json_response};
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use futures::StreamExt;
use harbor_auth::AuthRequest;
use harbor_store::{DataLocation, ObjectMetadata, PutContext};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Owner identity header on `PUT data`
pub const CANONICAL_ID_HEADER: &str = "x-harbor-canonical-id";
/// Optional per-object location constraint override on `PUT data`
pub const LOCATION_CONSTRAINT_HEADER: &str = "x-harbor-location-constraint";

/// Largest accepted metadata document / location list body
const MAX_DOCUMENT_SIZE: usize = 8 * 1024 * 1024;

/// Entry point for `/{bucket}/{object}/{resource}` under the internal
/// prefix, any method.
pub async fn dispatch(
    State(state): State<Arc<AppState>>,
    Path((bucket, object, resource)): Path<(String, String, String)>,
    method: Method,
    headers: HeaderMap,
    body: Body,
) -> Response {
    // Routing failure precedes authentication
    if resource != "metadata" && resource != "data" {
        return ApiError::method_not_allowed(format!("unsupported resource type: {resource}"))
            .into_response();
    }

    let path = format!("/_internal/replication/{bucket}/{object}/{resource}");
    let auth_request = AuthRequest::new(method.as_str(), &path, &headers);
    let identity = match state.authenticator.authenticate(&auth_request).await {
        Ok(identity) => identity,
        Err(err) => {
            debug!(%path, error = %err, "authentication failed");
            return ApiError::from_auth(&err).into_response();
        }
    };
    debug!(%path, subject = %identity.subject, "authenticated internal request");

    let result = match (method.as_str(), resource.as_str()) {
        ("GET", "metadata") => get_metadata(&state, &bucket, &object).await,
        ("PUT", "metadata") => put_metadata(&state, &bucket, &object, body).await,
        ("POST", "data") => post_data(&state, body).await,
        ("PUT", "data") => put_data(&state, &bucket, &object, &headers, body).await,
        _ => Err(ApiError::method_not_allowed(format!(
            "{method} is not supported for resource type {resource}"
        ))),
    };

    result.unwrap_or_else(|err| {
        warn!(%path, code = err.code(), "internal request failed");
        err.with_resource(path).into_response()
    })
}

/// `GET metadata`: raw metadata document for (bucket, object)
async fn get_metadata(state: &AppState, bucket: &str, object: &str) -> Result<Response, ApiError> {
    let metadata = state.metadata.get_object(bucket, object).await?;
    Ok(json_response(&metadata))
}

/// `PUT metadata`: versioned metadata write, echoing the stored document
async fn put_metadata(
    state: &AppState,
    bucket: &str,
    object: &str,
    body: Body,
) -> Result<Response, ApiError> {
    let bytes = read_body(body).await?;
    let document: ObjectMetadata = serde_json::from_slice(&bytes).map_err(|err| {
        ApiError::new(
            StatusCode::BAD_REQUEST,
            "InvalidArgument",
            format!("invalid metadata document: {err}"),
        )
    })?;
    let Some(version_id) = document.version_id.clone() else {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "InvalidArgument",
            "metadata document is missing a versionId",
        ));
    };

    let stored = state
        .metadata
        .put_object_versioned(bucket, object, document, &version_id)
        .await?;
    Ok(json_response(&stored))
}

/// `POST data`: stream the concatenated bytes for the supplied location
/// descriptors.
///
/// The body is a JSON array in the same descriptor format the resolver
/// and data stores produce; chunks are pulled lazily so the object never
/// has to fit in memory.
async fn post_data(state: &AppState, body: Body) -> Result<Response, ApiError> {
    let bytes = read_body(body).await?;
    let locations: Vec<DataLocation> = serde_json::from_slice(&bytes).map_err(|err| {
        ApiError::new(
            StatusCode::BAD_REQUEST,
            "InvalidArgument",
            format!("invalid location descriptors: {err}"),
        )
    })?;

    let stream = Arc::clone(&state.data).stream_locations(locations);
    let request_id = Uuid::new_v4().to_string();
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header("x-amz-request-id", &request_id)
        .header("x-amz-id-2", &request_id)
        .body(Body::from_stream(stream))
        .map_err(|err| ApiError::from(harbor_common::Error::internal(err.to_string())))
}

/// `PUT data`: resolve the destination backend for the bucket, write the
/// raw byte stream through it, and report the digest and locations.
async fn put_data(
    state: &AppState,
    bucket: &str,
    object: &str,
    headers: &HeaderMap,
    body: Body,
) -> Result<Response, ApiError> {
    let owner = header_str(headers, CANONICAL_ID_HEADER).ok_or_else(|| {
        ApiError::new(
            StatusCode::BAD_REQUEST,
            "InvalidArgument",
            format!("missing {CANONICAL_ID_HEADER} header"),
        )
    })?;
    let content_length = header_str(headers, header::CONTENT_LENGTH.as_str())
        .and_then(|v| v.parse::<u64>().ok())
        .ok_or_else(|| {
            ApiError::new(
                StatusCode::LENGTH_REQUIRED,
                "MissingContentLength",
                "a valid Content-Length header is required",
            )
        })?;

    let bucket_metadata = state.metadata.get_bucket(bucket).await?;

    // Endpoint the client used, as seen by this gateway
    let endpoint = header_str(headers, header::HOST.as_str())
        .map(|host| host.split(':').next().unwrap_or(host).to_string())
        .unwrap_or_default();
    let object_constraint = header_str(headers, LOCATION_CONSTRAINT_HEADER);

    let descriptor = state
        .backend
        .resolve(
            object_constraint,
            bucket_metadata.location_constraint.as_deref(),
            &endpoint,
        )
        .map_err(|err| ApiError::from(harbor_common::Error::from(err)))?;
    debug!(
        bucket,
        object,
        data_store = descriptor.data_store_name(),
        controlling = ?descriptor.controlling(),
        "resolved destination backend"
    );

    let store = state.data.get(descriptor.data_store_name())?;
    let ctx = PutContext::new(bucket, object).with_owner(owner);
    let stream = body
        .into_data_stream()
        .map(|chunk| chunk.map_err(std::io::Error::other))
        .boxed();
    let result = store.put(&ctx, stream, content_length).await?;

    Ok(json_response(&result))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

async fn read_body(body: Body) -> Result<bytes::Bytes, ApiError> {
    axum::body::to_bytes(body, MAX_DOCUMENT_SIZE).await.map_err(|err| {
        ApiError::new(
            StatusCode::BAD_REQUEST,
            "InvalidArgument",
            format!("failed to read request body: {err}"),
        )
    })
}
