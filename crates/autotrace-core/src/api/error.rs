use std::path::PathBuf;

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Shown when nothing more specific can be said about a failure.
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong while talking to the API.";

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// JSON body the API sends alongside non-2xx responses.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ErrorPayload {
    pub error: Option<String>,
    pub message: Option<String>,
    #[serde(default)]
    pub details: Option<serde_json::Value>,
}

impl ErrorPayload {
    /// Parse a response body. Anything that is not a JSON object yields `None`.
    pub fn from_body(body: &str) -> Option<Self> {
        let value: serde_json::Value = serde_json::from_str(body.trim()).ok()?;
        if !value.is_object() {
            return None;
        }
        serde_json::from_value(value).ok()
    }
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized - token may be expired")]
    Unauthorized(Option<ErrorPayload>),

    #[error("Access denied")]
    AccessDenied(Option<ErrorPayload>),

    #[error("Resource not found")]
    NotFound(Option<ErrorPayload>),

    #[error("Rate limited - please wait before retrying")]
    RateLimited(Option<ErrorPayload>),

    #[error("Server error (status {status})")]
    ServerError {
        status: StatusCode,
        payload: Option<ErrorPayload>,
    },

    #[error("Request failed with status {status}")]
    Status {
        status: StatusCode,
        payload: Option<ErrorPayload>,
    },

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    UploadFailed(String),

    #[error("File error at {}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Credential storage error: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, ApiError>;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    pub(crate) fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let payload = ErrorPayload::from_body(body);
        match status.as_u16() {
            401 => ApiError::Unauthorized(payload),
            403 => ApiError::AccessDenied(payload),
            404 => ApiError::NotFound(payload),
            429 => ApiError::RateLimited(payload),
            500..=599 => ApiError::ServerError { status, payload },
            _ => ApiError::Status { status, payload },
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    /// HTTP status of the response that produced this error, if any.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Unauthorized(_) => Some(StatusCode::UNAUTHORIZED),
            ApiError::AccessDenied(_) => Some(StatusCode::FORBIDDEN),
            ApiError::NotFound(_) => Some(StatusCode::NOT_FOUND),
            ApiError::RateLimited(_) => Some(StatusCode::TOO_MANY_REQUESTS),
            ApiError::ServerError { status, .. } | ApiError::Status { status, .. } => Some(*status),
            ApiError::NetworkError(e) => e.status(),
            _ => None,
        }
    }

    pub fn payload(&self) -> Option<&ErrorPayload> {
        match self {
            ApiError::Unauthorized(payload)
            | ApiError::AccessDenied(payload)
            | ApiError::NotFound(payload)
            | ApiError::RateLimited(payload)
            | ApiError::ServerError { payload, .. }
            | ApiError::Status { payload, .. } => payload.as_ref(),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_))
    }

    /// Single human-readable line for display.
    ///
    /// Resolution order: body `error`, body `message`, the transport's own
    /// message, then [`GENERIC_ERROR_MESSAGE`].
    pub fn user_message(&self) -> String {
        if let Some(payload) = self.payload() {
            return payload
                .error
                .clone()
                .or_else(|| payload.message.clone())
                .unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string());
        }

        let message = self.to_string();
        if message.trim().is_empty() {
            GENERIC_ERROR_MESSAGE.to_string()
        } else {
            message
        }
    }
}

/// Reject blank required fields before anything is sent.
pub(crate) fn require_field(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ApiError::validation(format!("{} is required", field)));
    }
    Ok(())
}

pub(crate) fn require_email(value: &str) -> Result<()> {
    require_field(value, "Email")?;
    if !value.contains('@') {
        return Err(ApiError::validation("Email must be a valid address"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_maps_known_codes() {
        assert!(matches!(
            ApiError::from_status(StatusCode::UNAUTHORIZED, ""),
            ApiError::Unauthorized(None)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::FORBIDDEN, ""),
            ApiError::AccessDenied(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::NOT_FOUND, ""),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::TOO_MANY_REQUESTS, ""),
            ApiError::RateLimited(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::BAD_GATEWAY, ""),
            ApiError::ServerError { .. }
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::UNPROCESSABLE_ENTITY, ""),
            ApiError::Status { .. }
        ));
    }

    #[test]
    fn test_user_message_prefers_error_field() {
        let err = ApiError::from_status(
            StatusCode::BAD_REQUEST,
            r#"{"error": "A", "message": "B"}"#,
        );
        assert_eq!(err.user_message(), "A");
    }

    #[test]
    fn test_user_message_falls_back_to_message_field() {
        let err = ApiError::from_status(StatusCode::BAD_REQUEST, r#"{"message": "B"}"#);
        assert_eq!(err.user_message(), "B");
    }

    #[test]
    fn test_user_message_without_body_uses_transport_message() {
        let err = ApiError::from_status(StatusCode::BAD_REQUEST, "");
        assert_eq!(err.user_message(), "Request failed with status 400 Bad Request");

        let err = ApiError::from_status(StatusCode::UNAUTHORIZED, "");
        assert_eq!(err.user_message(), "Unauthorized - token may be expired");
    }

    #[test]
    fn test_user_message_json_body_without_fields_is_generic() {
        let err = ApiError::from_status(StatusCode::BAD_REQUEST, r#"{"details": [1, 2]}"#);
        assert_eq!(err.user_message(), GENERIC_ERROR_MESSAGE);
    }

    #[test]
    fn test_user_message_empty_display_is_generic() {
        let err = ApiError::validation("");
        assert_eq!(err.user_message(), GENERIC_ERROR_MESSAGE);
    }

    #[test]
    fn test_non_object_body_is_not_a_payload() {
        assert!(ErrorPayload::from_body("<html>oops</html>").is_none());
        assert!(ErrorPayload::from_body("\"just a string\"").is_none());
        assert!(ErrorPayload::from_body("").is_none());
    }

    #[test]
    fn test_status_accessor() {
        let err = ApiError::from_status(StatusCode::SERVICE_UNAVAILABLE, "");
        assert_eq!(err.status(), Some(StatusCode::SERVICE_UNAVAILABLE));
        assert_eq!(ApiError::validation("x").status(), None);
    }

    #[test]
    fn test_truncate_body() {
        let short = "short body";
        assert_eq!(ApiError::truncate_body(short), short);

        let long = "é".repeat(400);
        let truncated = ApiError::truncate_body(&long);
        assert!(truncated.contains("truncated, 800 total bytes"));
    }

    #[test]
    fn test_require_email() {
        assert!(require_email("driver@example.com").is_ok());
        assert!(matches!(require_email("  "), Err(ApiError::Validation(_))));
        assert!(matches!(require_email("driver"), Err(ApiError::Validation(_))));
    }
}
