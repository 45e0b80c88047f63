//! 徽章处理器

use axum::extract::{Path, State};

use mokadex::models::Emblem;

use crate::dto::{ApiResponse, EmblemRequest};
use crate::error::Result;
use crate::extract::{RequestContext, ValidatedJson};
use crate::state::AppState;

pub async fn list_emblems(
    State(state): State<AppState>,
    RequestContext(ctx): RequestContext,
) -> Result<ApiResponse<Vec<Emblem>>> {
    let emblems = state.services.catalog.list_emblems(&ctx).await?;
    Ok(ApiResponse::ok(emblems))
}

pub async fn get_emblem(
    State(state): State<AppState>,
    RequestContext(ctx): RequestContext,
    Path(id): Path<i64>,
) -> Result<ApiResponse<Emblem>> {
    let emblem = state.services.catalog.get_emblem(&ctx, id).await?;
    Ok(ApiResponse::ok(emblem))
}

/// GET /emblem/exhibition/{id}
pub async fn get_emblem_by_exhibition(
    State(state): State<AppState>,
    RequestContext(ctx): RequestContext,
    Path(exhibition_id): Path<i64>,
) -> Result<ApiResponse<Emblem>> {
    let emblem = state
        .services
        .catalog
        .get_emblem_by_exhibition(&ctx, exhibition_id)
        .await?;
    Ok(ApiResponse::ok(emblem))
}

pub async fn create_emblem(
    State(state): State<AppState>,
    RequestContext(ctx): RequestContext,
    ValidatedJson(req): ValidatedJson<EmblemRequest>,
) -> Result<ApiResponse<Emblem>> {
    let emblem = state
        .services
        .catalog
        .create_emblem(&ctx, req.into())
        .await?;
    Ok(ApiResponse::created(emblem))
}

pub async fn delete_emblem(
    State(state): State<AppState>,
    RequestContext(ctx): RequestContext,
    Path(id): Path<i64>,
) -> Result<ApiResponse<()>> {
    state.services.catalog.delete_emblem(&ctx, id).await?;
    Ok(ApiResponse::empty())
}
