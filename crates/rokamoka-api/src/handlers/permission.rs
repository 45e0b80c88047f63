//! 权限申请处理器

use axum::extract::{Path, State};

use mokadex::models::PermissionRequest;

use crate::dto::{ApiResponse, CreatePermissionRequest, DecisionRequest};
use crate::error::Result;
use crate::extract::{RequestContext, ValidatedJson};
use crate::state::AppState;

/// POST /request/permission
pub async fn create_request(
    State(state): State<AppState>,
    RequestContext(ctx): RequestContext,
    ValidatedJson(req): ValidatedJson<CreatePermissionRequest>,
) -> Result<ApiResponse<PermissionRequest>> {
    let request = state
        .services
        .permissions
        .create_request(&ctx, req.role)
        .await?;
    Ok(ApiResponse::created(request))
}

/// GET /request/permission/mine
pub async fn list_mine(
    State(state): State<AppState>,
    RequestContext(ctx): RequestContext,
) -> Result<ApiResponse<Vec<PermissionRequest>>> {
    let requests = state.services.permissions.list_mine(&ctx).await?;
    Ok(ApiResponse::ok(requests))
}

/// GET /request/permission/pending（管理员）
pub async fn list_pending(
    State(state): State<AppState>,
    RequestContext(ctx): RequestContext,
) -> Result<ApiResponse<Vec<PermissionRequest>>> {
    let requests = state.services.permissions.list_pending(&ctx).await?;
    Ok(ApiResponse::ok(requests))
}

pub async fn get_request(
    State(state): State<AppState>,
    RequestContext(ctx): RequestContext,
    Path(id): Path<i64>,
) -> Result<ApiResponse<PermissionRequest>> {
    let request = state.services.permissions.get_request(&ctx, id).await?;
    Ok(ApiResponse::ok(request))
}

/// PUT /request/permission/{id}/accept
pub async fn accept(
    State(state): State<AppState>,
    RequestContext(ctx): RequestContext,
    Path(id): Path<i64>,
    ValidatedJson(req): ValidatedJson<DecisionRequest>,
) -> Result<ApiResponse<PermissionRequest>> {
    let request = state
        .services
        .permissions
        .accept(&ctx, id, &req.justification)
        .await?;
    Ok(ApiResponse::ok(request))
}

/// PUT /request/permission/{id}/deny
pub async fn deny(
    State(state): State<AppState>,
    RequestContext(ctx): RequestContext,
    Path(id): Path<i64>,
    ValidatedJson(req): ValidatedJson<DecisionRequest>,
) -> Result<ApiResponse<PermissionRequest>> {
    let request = state
        .services
        .permissions
        .deny(&ctx, id, &req.justification)
        .await?;
    Ok(ApiResponse::ok(request))
}
