//! S3-style error responses
//!
//! Every terminal failure renders as an XML body `{Code, Message,
//! Resource, RequestId}` with an explicit status, optionally carrying
//! extra headers (CORS echo) collected before the failure.

use axum::body::Body;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use harbor_auth::AuthError;
use quick_xml::se::to_string as to_xml;
use serde::Serialize;
use uuid::Uuid;

/// XML error document
#[derive(Serialize)]
#[serde(rename = "Error")]
struct ErrorDocument {
    #[serde(rename = "Code")]
    code: String,
    #[serde(rename = "Message")]
    message: String,
    #[serde(rename = "Resource")]
    #[serde(skip_serializing_if = "Option::is_none")]
    resource: Option<String>,
    #[serde(rename = "RequestId")]
    request_id: String,
}

/// Error response carried back to the caller
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: String,
    message: String,
    resource: Option<String>,
    headers: HeaderMap,
}

impl ApiError {
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
            resource: None,
            headers: HeaderMap::new(),
        }
    }

    /// 405 for unroutable internal-protocol requests
    pub fn method_not_allowed(detail: impl Into<String>) -> Self {
        Self::new(
            StatusCode::METHOD_NOT_ALLOWED,
            "MethodNotAllowed",
            detail.into(),
        )
    }

    /// Surface an authenticator failure with its code verbatim
    #[must_use]
    pub fn from_auth(err: &AuthError) -> Self {
        Self::new(
            StatusCode::from_u16(err.status()).unwrap_or(StatusCode::FORBIDDEN),
            err.code(),
            err.to_string(),
        )
    }

    /// Name the resource the failure refers to
    #[must_use]
    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    /// Attach response headers (CORS echo) to the error
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers.extend(headers);
        self
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }
}

impl From<harbor_common::Error> for ApiError {
    fn from(err: harbor_common::Error) -> Self {
        let status =
            StatusCode::from_u16(err.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self::new(status, err.s3_error_code(), err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let request_id = Uuid::new_v4().to_string();
        let document = ErrorDocument {
            code: self.code,
            message: self.message,
            resource: self.resource,
            request_id: request_id.clone(),
        };
        let xml = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{}",
            to_xml(&document).unwrap_or_default()
        );

        let mut builder = Response::builder()
            .status(self.status)
            .header(header::CONTENT_TYPE, "application/xml")
            .header("x-amz-request-id", &request_id)
            .header("x-amz-id-2", &request_id);
        if let Some(headers) = builder.headers_mut() {
            headers.extend(self.headers);
        }
        builder.body(Body::from(xml)).unwrap_or_else(|_| {
            (StatusCode::INTERNAL_SERVER_ERROR, "response build failed").into_response()
        })
    }
}

/// Build a JSON success response with request-id headers
pub fn json_response<T: Serialize>(value: &T) -> Response {
    match serde_json::to_vec(value) {
        Ok(body) => {
            let request_id = Uuid::new_v4().to_string();
            Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, "application/json")
                .header("x-amz-request-id", &request_id)
                .header("x-amz-id-2", &request_id)
                .body(Body::from(body))
                .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
        }
        Err(err) => ApiError::from(harbor_common::Error::Serialization(err.to_string()))
            .into_response(),
    }
}
