//! API 错误类型
//!
//! 领域错误按类型映射为 HTTP 状态码，错误响应同样使用统一信封。

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use mokadex::RokaMokaError;

use crate::dto::ApiResponse;

/// API 层错误
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] RokaMokaError),

    #[error("未授权: {0}")]
    Unauthorized(String),

    #[error("参数验证失败: {0}")]
    Validation(String),

    #[error("内部错误: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Domain(e) => match e {
                RokaMokaError::ContentNotFound(_) => StatusCode::NOT_FOUND,
                RokaMokaError::ContentDuplicated(_) => StatusCode::CONFLICT,
                RokaMokaError::Forbidden(_) => StatusCode::FORBIDDEN,
                RokaMokaError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
                RokaMokaError::Validation(_) => StatusCode::BAD_REQUEST,
                RokaMokaError::Database(_)
                | RokaMokaError::Broker(_)
                | RokaMokaError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Domain(e) => e.error_code(),
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // 系统级错误只返回通用提示，详细信息仅记录日志
        let message = if status.is_server_error() {
            tracing::error!(error = %self, code = self.error_code(), "请求处理失败");
            "服务内部错误，请稍后重试".to_string()
        } else {
            self.to_string()
        };

        ApiResponse::<()>::error(status, self.error_code(), message).into_response()
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_status_mapping() {
        let cases = [
            (RokaMokaError::ContentNotFound("x".into()), StatusCode::NOT_FOUND),
            (RokaMokaError::ContentDuplicated("x".into()), StatusCode::CONFLICT),
            (RokaMokaError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (RokaMokaError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (RokaMokaError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (RokaMokaError::Broker("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, status) in cases {
            assert_eq!(ApiError::from(error).status_code(), status);
        }
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            ApiError::from(RokaMokaError::ContentDuplicated("qr".into())).error_code(),
            "CONTENT_DUPLICATED"
        );
        assert_eq!(ApiError::Unauthorized("x".into()).error_code(), "UNAUTHORIZED");
    }
}
