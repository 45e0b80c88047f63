//! 响应 DTO
//!
//! 所有接口返回统一信封 `{ body, httpStatus, exception, exceptionMessage }`。

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use mokadex::models::User;

use crate::auth::IssuedToken;

/// 统一响应信封
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    #[serde(skip)]
    status: StatusCode,
    pub body: Option<T>,
    /// 状态名，如 `OK`、`NOT_FOUND`
    pub http_status: String,
    /// 错误码，成功时为 null
    pub exception: Option<String>,
    pub exception_message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn with_status(status: StatusCode, body: T) -> Self {
        Self {
            status,
            body: Some(body),
            http_status: status_name(status),
            exception: None,
            exception_message: None,
        }
    }

    pub fn ok(body: T) -> Self {
        Self::with_status(StatusCode::OK, body)
    }

    pub fn created(body: T) -> Self {
        Self::with_status(StatusCode::CREATED, body)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl ApiResponse<()> {
    /// 无响应体的成功响应
    pub fn empty() -> Self {
        Self {
            status: StatusCode::OK,
            body: None,
            http_status: status_name(StatusCode::OK),
            exception: None,
            exception_message: None,
        }
    }

    pub fn error(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: None,
            http_status: status_name(status),
            exception: Some(code.to_string()),
            exception_message: Some(message.into()),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// `404 Not Found` -> `NOT_FOUND`
fn status_name(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => reason
            .to_ascii_uppercase()
            .replace([' ', '-'], "_")
            .replace('\'', ""),
        None => status.as_str().to_string(),
    }
}

/// 登录响应
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    #[serde(flatten)]
    pub token: IssuedToken,
    pub user: User,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_names() {
        assert_eq!(status_name(StatusCode::OK), "OK");
        assert_eq!(status_name(StatusCode::NOT_FOUND), "NOT_FOUND");
        assert_eq!(
            status_name(StatusCode::INTERNAL_SERVER_ERROR),
            "INTERNAL_SERVER_ERROR"
        );
    }

    #[test]
    fn test_envelope_shape() {
        let json = serde_json::to_value(ApiResponse::created(7)).unwrap();
        assert_eq!(json["body"], 7);
        assert_eq!(json["httpStatus"], "CREATED");
        assert!(json["exception"].is_null());
        assert!(json["exceptionMessage"].is_null());
        assert!(json.get("status").is_none());

        let error = ApiResponse::error(StatusCode::CONFLICT, "CONTENT_DUPLICATED", "dup");
        let json = serde_json::to_value(error).unwrap();
        assert!(json["body"].is_null());
        assert_eq!(json["httpStatus"], "CONFLICT");
        assert_eq!(json["exception"], "CONTENT_DUPLICATED");
        assert_eq!(json["exceptionMessage"], "dup");
    }
}
