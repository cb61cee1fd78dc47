//! CORS echo headers
//!
//! Responses to bucket-scoped requests echo access-control headers
//! derived from the bucket's own CORS rules and the inbound Origin.

use axum::http::{HeaderMap, HeaderValue, Method, header};
use harbor_store::BucketMetadata;

/// Collect the CORS headers a response should carry.
///
/// Empty when the request has no Origin, the bucket is unknown, or no
/// rule matches the (origin, method) pair.
#[must_use]
pub fn collect_cors_headers(
    origin: Option<&str>,
    method: &Method,
    bucket: Option<&BucketMetadata>,
) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let (Some(origin), Some(bucket)) = (origin, bucket) else {
        return headers;
    };

    let Some(rule) = bucket.cors.iter().find(|r| r.allows(origin, method.as_str())) else {
        return headers;
    };

    let allow_origin = if rule.allowed_origins.iter().any(|o| o == "*") {
        "*"
    } else {
        origin
    };
    if let Ok(value) = HeaderValue::from_str(allow_origin) {
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
    }
    if let Ok(value) = HeaderValue::from_str(&rule.allowed_methods.join(", ")) {
        headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, value);
    }
    headers.insert(header::VARY, HeaderValue::from_static("Origin"));
    headers
}
