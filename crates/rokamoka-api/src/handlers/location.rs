//! 地点处理器

use axum::extract::{Path, State};

use mokadex::models::Location;

use crate::dto::{ApiResponse, LocationRequest};
use crate::error::Result;
use crate::extract::{RequestContext, ValidatedJson};
use crate::state::AppState;

pub async fn list_locations(
    State(state): State<AppState>,
    RequestContext(ctx): RequestContext,
) -> Result<ApiResponse<Vec<Location>>> {
    let locations = state.services.catalog.list_locations(&ctx).await?;
    Ok(ApiResponse::ok(locations))
}

pub async fn get_location(
    State(state): State<AppState>,
    RequestContext(ctx): RequestContext,
    Path(id): Path<i64>,
) -> Result<ApiResponse<Location>> {
    let location = state.services.catalog.get_location(&ctx, id).await?;
    Ok(ApiResponse::ok(location))
}

pub async fn create_location(
    State(state): State<AppState>,
    RequestContext(ctx): RequestContext,
    ValidatedJson(req): ValidatedJson<LocationRequest>,
) -> Result<ApiResponse<Location>> {
    let location = state
        .services
        .catalog
        .create_location(&ctx, req.into())
        .await?;
    Ok(ApiResponse::created(location))
}

pub async fn update_location(
    State(state): State<AppState>,
    RequestContext(ctx): RequestContext,
    Path(id): Path<i64>,
    ValidatedJson(req): ValidatedJson<LocationRequest>,
) -> Result<ApiResponse<Location>> {
    let location = state
        .services
        .catalog
        .update_location(&ctx, id, req.into())
        .await?;
    Ok(ApiResponse::ok(location))
}

pub async fn delete_location(
    State(state): State<AppState>,
    RequestContext(ctx): RequestContext,
    Path(id): Path<i64>,
) -> Result<ApiResponse<()>> {
    state.services.catalog.delete_location(&ctx, id).await?;
    Ok(ApiResponse::empty())
}
