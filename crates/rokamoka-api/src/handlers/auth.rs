//! 认证与账号处理器

use axum::{
    extract::{Path, State},
    http::HeaderMap,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Basic};
use tracing::info;

use mokadex::models::{Device, User};

use crate::dto::{
    ApiResponse, DeviceRequest, LoginResponse, PasswordResetRequest, RegisterRequest,
};
use crate::error::{ApiError, Result};
use crate::extract::{RequestContext, ValidatedJson};
use crate::state::AppState;

/// 用户名密码换取 Token
///
/// POST /auth/login（HTTP Basic）
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<ApiResponse<LoginResponse>> {
    let Some(Authorization(basic)) = headers.typed_get::<Authorization<Basic>>() else {
        return Err(ApiError::Unauthorized("缺少 Basic 认证信息".to_string()));
    };

    let user = state
        .services
        .accounts
        .authenticate(basic.username(), basic.password())
        .await?;
    let token = state.jwt.issue(&user)?;

    info!(user_id = user.id, "登录成功");
    Ok(ApiResponse::ok(LoginResponse { token, user }))
}

/// POST /auth/register
pub async fn register(
    State(state): State<AppState>,
    RequestContext(ctx): RequestContext,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<ApiResponse<User>> {
    let user = state.services.accounts.register(&ctx, req.into()).await?;
    Ok(ApiResponse::created(user))
}

/// GET /auth/me
pub async fn me(
    State(state): State<AppState>,
    RequestContext(ctx): RequestContext,
) -> Result<ApiResponse<User>> {
    let user = state.services.accounts.current_user(&ctx).await?;
    Ok(ApiResponse::ok(user))
}

/// PUT /auth/user/{id}/password
pub async fn reset_password(
    State(state): State<AppState>,
    RequestContext(ctx): RequestContext,
    Path(user_id): Path<i64>,
    ValidatedJson(req): ValidatedJson<PasswordResetRequest>,
) -> Result<ApiResponse<()>> {
    state
        .services
        .accounts
        .reset_password(&ctx, user_id, &req.password)
        .await?;
    Ok(ApiResponse::empty())
}

/// POST /auth/device
pub async fn register_device(
    State(state): State<AppState>,
    RequestContext(ctx): RequestContext,
    ValidatedJson(req): ValidatedJson<DeviceRequest>,
) -> Result<ApiResponse<Device>> {
    let device = state
        .services
        .accounts
        .register_device(&ctx, &req.identifier, req.platform)
        .await?;
    Ok(ApiResponse::created(device))
}

/// GET /auth/device
pub async fn list_devices(
    State(state): State<AppState>,
    RequestContext(ctx): RequestContext,
) -> Result<ApiResponse<Vec<Device>>> {
    let devices = state.services.accounts.list_devices(&ctx).await?;
    Ok(ApiResponse::ok(devices))
}
