//! Request failure taxonomy.
//!
//! Every failed request resolves to exactly one of three kinds:
//!
//! - [`ApiError::Server`] — a response was received with a non-2xx status;
//! - [`ApiError::Network`] — the request was sent but nothing came back;
//! - [`ApiError::Request`] — the request could not even be dispatched.
//!
//! The pipeline never panics on network-level failures and never surfaces
//! anything outside this set, so callers check one `Result` shape
//! everywhere.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The `data` object of a WooCommerce-style error body.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorData {
    /// HTTP status the backend attributes to the error.
    #[serde(default)]
    pub status: u16,
}

/// A WooCommerce-style error body: `{ code, message, data: { status } }`.
///
/// Backends that already speak this shape have their body propagated
/// verbatim; anything else gets a synthesized `http_<status>` body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    /// Machine-readable error code (e.g. `woocommerce_rest_product_invalid_id`).
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Error metadata.
    #[serde(default)]
    pub data: ErrorData,
}

impl ErrorBody {
    /// Synthesize a body for a response that did not carry a well-shaped one.
    pub fn from_status(status: u16) -> Self {
        Self {
            code: format!("http_{status}"),
            message: format!("request failed with status {status}"),
            data: ErrorData { status },
        }
    }
}

/// A classified request failure.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// A response arrived with a non-2xx status.
    #[error("server error {status}: {message}", message = .body.message)]
    Server {
        /// Response status code.
        status: u16,
        /// The backend's error body, verbatim when well-shaped.
        body: ErrorBody,
        /// Response headers with lower-cased names.
        headers: BTreeMap<String, String>,
    },
    /// The request was sent but no response was received (timeout,
    /// connection reset, DNS failure).
    #[error("network error ({code}): {message}")]
    Network {
        /// Transport-derived code (`timeout`, `connect`) or `network_error`.
        code: String,
        /// Transport error description.
        message: String,
    },
    /// The request could not be constructed or dispatched at all.
    #[error("request error: {message}")]
    Request {
        /// What went wrong before dispatch.
        message: String,
    },
}

impl ApiError {
    /// HTTP status of the failure; `0` when no response was received.
    pub fn status(&self) -> u16 {
        match self {
            Self::Server { status, .. } => *status,
            Self::Network { .. } | Self::Request { .. } => 0,
        }
    }

    /// Machine-readable code for the failure.
    pub fn code(&self) -> &str {
        match self {
            Self::Server { body, .. } => &body.code,
            Self::Network { code, .. } => code,
            Self::Request { .. } => "request_error",
        }
    }

    /// Whether a response was received at all.
    pub fn received_response(&self) -> bool {
        matches!(self, Self::Server { .. })
    }

    /// Shorthand for an expired/invalid-credential response.
    pub fn is_auth_error(&self) -> bool {
        self.status() == 401
    }

    /// Build a `Request` error from anything printable.
    pub fn request(message: impl Into<String>) -> Self {
        Self::Request { message: message.into() }
    }
}

/// Uniform result shape for every SDK operation that performs a request.
pub type ApiResult<T> = Result<crate::http::ApiResponse<T>, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_shaped_bodies_deserialize() {
        let raw = r#"{"code":"woocommerce_rest_product_invalid_id","message":"Invalid ID.","data":{"status":404}}"#;
        let body: ErrorBody = serde_json::from_str(raw).unwrap();
        assert_eq!(body.code, "woocommerce_rest_product_invalid_id");
        assert_eq!(body.data.status, 404);
    }

    #[test]
    fn bodies_without_data_default_status_to_zero() {
        let raw = r#"{"code":"oops","message":"broken"}"#;
        let body: ErrorBody = serde_json::from_str(raw).unwrap();
        assert_eq!(body.data.status, 0);
    }

    #[test]
    fn synthesized_body_encodes_the_status() {
        let body = ErrorBody::from_status(502);
        assert_eq!(body.code, "http_502");
        assert_eq!(body.data.status, 502);
    }

    #[test]
    fn status_is_zero_unless_a_response_arrived() {
        let server = ApiError::Server {
            status: 404,
            body: ErrorBody::from_status(404),
            headers: BTreeMap::new(),
        };
        assert_eq!(server.status(), 404);
        assert!(server.received_response());

        let network = ApiError::Network {
            code: "timeout".into(),
            message: "deadline elapsed".into(),
        };
        assert_eq!(network.status(), 0);
        assert!(!network.received_response());

        let request = ApiError::request("no base url");
        assert_eq!(request.status(), 0);
        assert_eq!(request.code(), "request_error");
    }

    #[test]
    fn display_formats_are_stable() {
        let err = ApiError::Server {
            status: 500,
            body: ErrorBody::from_status(500),
            headers: BTreeMap::new(),
        };
        assert_eq!(
            err.to_string(),
            "server error 500: request failed with status 500"
        );

        let err = ApiError::Network { code: "connect".into(), message: "refused".into() };
        assert_eq!(err.to_string(), "network error (connect): refused");
    }
}
