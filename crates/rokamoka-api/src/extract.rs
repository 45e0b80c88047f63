//! 自定义提取器

use std::convert::Infallible;

use axum::Json;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;
use validator::Validate;

use mokadex::{Principal, ServiceContext};
use rokamoka_shared::observability::middleware::ExecutionMeta;

use crate::error::ApiError;

/// 由执行上下文中间件与认证中间件写入的扩展构造 `ServiceContext`
pub struct RequestContext(pub ServiceContext);

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let meta = parts
            .extensions
            .get::<ExecutionMeta>()
            .cloned()
            .unwrap_or_else(ExecutionMeta::start);

        let mut ctx = ServiceContext::new(meta.execution_id, meta.started_at);
        if let Some(principal) = parts.extensions.get::<Principal>() {
            ctx = ctx.with_principal(principal.clone());
        }
        Ok(Self(ctx))
    }
}

/// 反序列化并校验 JSON 请求体，失败时返回统一信封的 400
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::Validation(rejection.body_text()))?;
        value.validate()?;
        Ok(Self(value))
    }
}
