//! Rejection envelope and error-code constants.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Error codes carried in the rejection envelope.
pub mod codes {
    pub const TENANT_REQUIRED: &str = "TENANT_REQUIRED";
    pub const TENANT_NOT_FOUND: &str = "TENANT_NOT_FOUND";
    pub const TENANT_INACTIVE: &str = "TENANT_INACTIVE";
    pub const SUBSCRIPTION_EXPIRED: &str = "SUBSCRIPTION_EXPIRED";
    pub const TENANT_VALIDATION_ERROR: &str = "TENANT_VALIDATION_ERROR";
}

/// Wire contract for rejected requests.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ErrorEnvelope {
    pub status: &'static str,
    pub message: String,
    pub error_code: &'static str,
    pub timestamp: DateTime<Utc>,
}

/// Build a rejection response.
///
/// `suppress_body` is for protocol-upgrade paths: the connection may already
/// have been upgraded, so only the status line goes out.
pub fn reject(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
    suppress_body: bool,
) -> axum::response::Response {
    if suppress_body {
        return status.into_response();
    }

    (
        status,
        axum::Json(ErrorEnvelope {
            status: "Failed",
            message: message.into(),
            error_code: code,
            timestamp: Utc::now(),
        }),
    )
        .into_response()
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(serde_json::json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_serializes_with_pascal_case_fields() {
        let envelope = ErrorEnvelope {
            status: "Failed",
            message: "A tenant context is required".to_string(),
            error_code: codes::TENANT_REQUIRED,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["Status"], "Failed");
        assert_eq!(json["ErrorCode"], "TENANT_REQUIRED");
        assert!(json.get("Message").is_some());
        assert!(json.get("Timestamp").is_some());
    }
}
