//! 领域错误类型
//!
//! 业务错误（不存在、重复、无权限、未认证、参数校验）与系统错误（数据库、消息队列、内部）。
//! 系统错误的细节只写日志，不对外暴露。

use rokamoka_shared::error::SharedError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RokaMokaError {
    // === 业务错误 ===
    #[error("内容不存在: {0}")]
    ContentNotFound(String),

    #[error("内容重复: {0}")]
    ContentDuplicated(String),

    #[error("无权执行此操作: {0}")]
    Forbidden(String),

    #[error("未认证: {0}")]
    Unauthorized(String),

    #[error("参数校验失败: {0}")]
    Validation(String),

    // === 系统错误 ===
    #[error("数据库错误: {0}")]
    Database(sqlx::Error),

    #[error("消息队列错误: {0}")]
    Broker(String),

    #[error("内部错误: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, RokaMokaError>;

impl RokaMokaError {
    pub fn not_found(what: impl std::fmt::Display, id: impl std::fmt::Display) -> Self {
        Self::ContentNotFound(format!("{what} {id}"))
    }

    /// 错误码（用于 API 响应）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ContentNotFound(_) => "CONTENT_NOT_FOUND",
            Self::ContentDuplicated(_) => "CONTENT_DUPLICATED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Broker(_) => "BROKER_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// 业务错误：重试不会改变结果，消费者应直接丢弃
    pub fn is_domain_error(&self) -> bool {
        !matches!(
            self,
            Self::Database(_) | Self::Broker(_) | Self::Internal(_)
        )
    }

    /// 可重试的瞬时故障
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Broker(_))
    }
}

impl From<sqlx::Error> for RokaMokaError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err
            && db_err.is_unique_violation()
        {
            let constraint = db_err.constraint().unwrap_or("unique").to_string();
            return Self::ContentDuplicated(constraint);
        }
        if matches!(err, sqlx::Error::RowNotFound) {
            return Self::ContentNotFound("记录".to_string());
        }
        Self::Database(err)
    }
}

impl From<SharedError> for RokaMokaError {
    fn from(err: SharedError) -> Self {
        match err {
            SharedError::Database(e) => e.into(),
            SharedError::Kafka(msg) => Self::Broker(msg),
            other => Self::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(
            RokaMokaError::ContentNotFound("artwork".into()).error_code(),
            "CONTENT_NOT_FOUND"
        );
        assert_eq!(
            RokaMokaError::ContentDuplicated("qr".into()).error_code(),
            "CONTENT_DUPLICATED"
        );
        assert_eq!(
            RokaMokaError::Validation("x".into()).error_code(),
            "VALIDATION_ERROR"
        );
    }

    #[test]
    fn test_domain_and_retryable_classification() {
        assert!(RokaMokaError::Forbidden("x".into()).is_domain_error());
        assert!(RokaMokaError::ContentDuplicated("x".into()).is_domain_error());
        assert!(!RokaMokaError::Broker("down".into()).is_domain_error());
        assert!(RokaMokaError::Broker("down".into()).is_retryable());
        assert!(RokaMokaError::Database(sqlx::Error::PoolTimedOut).is_retryable());
        assert!(!RokaMokaError::Internal("bug".into()).is_retryable());
        assert!(!RokaMokaError::Internal("bug".into()).is_domain_error());
    }

    #[test]
    fn test_from_shared_error() {
        let err: RokaMokaError = SharedError::Kafka("broker down".into()).into();
        assert!(matches!(err, RokaMokaError::Broker(_)));

        let err: RokaMokaError = SharedError::Database(sqlx::Error::PoolTimedOut).into();
        assert!(matches!(err, RokaMokaError::Database(_)));

        let err: RokaMokaError = SharedError::Internal("oops".into()).into();
        assert!(matches!(err, RokaMokaError::Internal(_)));
    }

    #[test]
    fn test_row_not_found_maps_to_content_not_found() {
        let err: RokaMokaError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, RokaMokaError::ContentNotFound(_)));
    }
}
