use std::time::Duration;
use thiserror::Error;
use crate::client::ResponseBody;

/// Every failure the HTTP layer can report.
///
/// Errors are `Clone` so one in-flight request can hand the same outcome to every caller
/// waiting on it.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// No response before the deadline; the call was dropped
    #[error("Request timeout after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// No response at all (DNS, connection refused, reset)
    #[error("Network failure: {0}")]
    NetworkFailure(String),

    /// Upstream answered with a non-success status
    #[error("HTTP {status}: {status_text}")]
    RequestFailed {
        status: u16,
        status_text: String,
        body: ResponseBody,
    },

    #[error("Failed to decode response body: {0}")]
    DecodeFailure(String),

    /// The request could not be built (bad URL, header or body)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// HTTP-equivalent status; timeouts map to 408
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Timeout(_) => Some(408),
            ApiError::RequestFailed { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ApiError::Timeout(_))
    }

    /// `status_message` from a movie database error envelope, if the body carries one
    pub fn upstream_message(&self) -> Option<&str> {
        match self {
            ApiError::RequestFailed { body: ResponseBody::Json(json), .. } => {
                json.get("status_message").and_then(|v| v.as_str())
            }
            ApiError::RequestFailed { body: ResponseBody::Text(text), .. } if !text.is_empty() => {
                Some(text.as_str())
            }
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_builder() {
            ApiError::InvalidRequest(error.to_string())
        } else if error.is_decode() {
            ApiError::DecodeFailure(error.to_string())
        } else {
            ApiError::NetworkFailure(error.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_timeout_reports_408() {
        let error = ApiError::Timeout(Duration::from_millis(250));
        assert_eq!(error.status(), Some(408));
        assert!(error.is_timeout());
        assert_eq!(error.to_string(), "Request timeout after 250ms");
    }

    #[test]
    fn test_upstream_message_from_json_body() {
        let error = ApiError::RequestFailed {
            status: 401,
            status_text: "Unauthorized".to_string(),
            body: ResponseBody::Json(json!({
                "status_code": 7,
                "status_message": "Invalid API key: You must be granted a valid key.",
                "success": false
            })),
        };
        assert_eq!(error.status(), Some(401));
        assert_eq!(error.upstream_message(), Some("Invalid API key: You must be granted a valid key."));
        assert_eq!(error.to_string(), "HTTP 401: Unauthorized");
    }

    #[test]
    fn test_network_failure_has_no_status() {
        let error = ApiError::NetworkFailure("connection refused".to_string());
        assert_eq!(error.status(), None);
        assert_eq!(error.upstream_message(), None);
    }
}
