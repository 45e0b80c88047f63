//! 展览处理器

use axum::extract::{Path, State};

use mokadex::models::{Artwork, Exhibition};

use crate::dto::{ApiResponse, ExhibitionRequest};
use crate::error::Result;
use crate::extract::{RequestContext, ValidatedJson};
use crate::state::AppState;

pub async fn list_exhibitions(
    State(state): State<AppState>,
    RequestContext(ctx): RequestContext,
) -> Result<ApiResponse<Vec<Exhibition>>> {
    let exhibitions = state.services.catalog.list_exhibitions(&ctx).await?;
    Ok(ApiResponse::ok(exhibitions))
}

pub async fn get_exhibition(
    State(state): State<AppState>,
    RequestContext(ctx): RequestContext,
    Path(id): Path<i64>,
) -> Result<ApiResponse<Exhibition>> {
    let exhibition = state.services.catalog.get_exhibition(&ctx, id).await?;
    Ok(ApiResponse::ok(exhibition))
}

/// GET /exhibition/{id}/artworks
pub async fn list_exhibition_artworks(
    State(state): State<AppState>,
    RequestContext(ctx): RequestContext,
    Path(id): Path<i64>,
) -> Result<ApiResponse<Vec<Artwork>>> {
    let artworks = state
        .services
        .catalog
        .list_exhibition_artworks(&ctx, id)
        .await?;
    Ok(ApiResponse::ok(artworks))
}

pub async fn create_exhibition(
    State(state): State<AppState>,
    RequestContext(ctx): RequestContext,
    ValidatedJson(req): ValidatedJson<ExhibitionRequest>,
) -> Result<ApiResponse<Exhibition>> {
    let exhibition = state
        .services
        .catalog
        .create_exhibition(&ctx, req.into())
        .await?;
    Ok(ApiResponse::created(exhibition))
}

pub async fn update_exhibition(
    State(state): State<AppState>,
    RequestContext(ctx): RequestContext,
    Path(id): Path<i64>,
    ValidatedJson(req): ValidatedJson<ExhibitionRequest>,
) -> Result<ApiResponse<Exhibition>> {
    let exhibition = state
        .services
        .catalog
        .update_exhibition(&ctx, id, req.into())
        .await?;
    Ok(ApiResponse::ok(exhibition))
}

pub async fn delete_exhibition(
    State(state): State<AppState>,
    RequestContext(ctx): RequestContext,
    Path(id): Path<i64>,
) -> Result<ApiResponse<()>> {
    state.services.catalog.delete_exhibition(&ctx, id).await?;
    Ok(ApiResponse::empty())
}
