//! Response envelope contract.
//!
//! The envelope is owned by the consuming API layer; it is defined here so
//! service results translate 1:1 without that layer knowing the error
//! taxonomy.

use serde::Serialize;

/// Uniform response envelope.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    pub status_code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            status_code: 200,
            message: "Success".to_string(),
            error_code: None,
            errors: None,
            data: Some(data),
        }
    }

    pub fn fail(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            success: false,
            status_code,
            message: message.into(),
            error_code: Some(-1),
            errors: None,
            data: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::fail(400, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::fail(404, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::fail(409, message)
    }

    /// Generic failure that exposes only a correlation reference.
    pub fn internal_error(correlation: uuid::Uuid) -> Self {
        Self::fail(500, format!("An unexpected error occurred (ref {correlation})"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_envelope_shape() {
        let resp = ApiResponse::ok(vec![1, 2, 3]);
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["statusCode"], 200);
        assert_eq!(json["data"], serde_json::json!([1, 2, 3]));
        assert!(json.get("errorCode").is_none());
    }

    #[test]
    fn failure_carries_code_and_message() {
        let resp = ApiResponse::<()>::not_found("Not found");
        assert!(!resp.success);
        assert_eq!(resp.status_code, 404);
        assert_eq!(resp.error_code, Some(-1));
    }
}
