//! JWT 认证中间件
//!
//! 校验 Bearer Token，并把调用者以 `Principal` 写入请求扩展。

use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

/// 无需认证的路径
pub const PUBLIC_PATHS: [&str; 4] = ["/health", "/ready", "/auth/login", "/auth/register"];

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if request.method() == Method::OPTIONS || PUBLIC_PATHS.contains(&request.uri().path()) {
        return next.run(request).await;
    }

    let Some(Authorization(bearer)) = request.headers().typed_get::<Authorization<Bearer>>()
    else {
        return ApiError::Unauthorized("缺少认证 Token".to_string()).into_response();
    };

    match state.jwt.verify(bearer.token()) {
        Ok(claims) => {
            debug!(user_id = claims.uid, "Token 校验通过");
            request.extensions_mut().insert(claims.principal());
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}
