//! 展品处理器

use axum::extract::{Path, State};

use mokadex::models::Artwork;

use crate::dto::{ApiResponse, ArtworkRequest};
use crate::error::Result;
use crate::extract::{RequestContext, ValidatedJson};
use crate::state::AppState;

pub async fn list_artworks(
    State(state): State<AppState>,
    RequestContext(ctx): RequestContext,
) -> Result<ApiResponse<Vec<Artwork>>> {
    let artworks = state.services.catalog.list_artworks(&ctx).await?;
    Ok(ApiResponse::ok(artworks))
}

pub async fn get_artwork(
    State(state): State<AppState>,
    RequestContext(ctx): RequestContext,
    Path(id): Path<i64>,
) -> Result<ApiResponse<Artwork>> {
    let artwork = state.services.catalog.get_artwork(&ctx, id).await?;
    Ok(ApiResponse::ok(artwork))
}

/// GET /artwork/qrcode/{qrcode}
pub async fn get_artwork_by_qr_code(
    State(state): State<AppState>,
    RequestContext(ctx): RequestContext,
    Path(qr_code): Path<String>,
) -> Result<ApiResponse<Artwork>> {
    let artwork = state
        .services
        .catalog
        .get_artwork_by_qr_code(&ctx, &qr_code)
        .await?;
    Ok(ApiResponse::ok(artwork))
}

pub async fn create_artwork(
    State(state): State<AppState>,
    RequestContext(ctx): RequestContext,
    ValidatedJson(req): ValidatedJson<ArtworkRequest>,
) -> Result<ApiResponse<Artwork>> {
    let artwork = state
        .services
        .catalog
        .create_artwork(&ctx, req.into())
        .await?;
    Ok(ApiResponse::created(artwork))
}

pub async fn update_artwork(
    State(state): State<AppState>,
    RequestContext(ctx): RequestContext,
    Path(id): Path<i64>,
    ValidatedJson(req): ValidatedJson<ArtworkRequest>,
) -> Result<ApiResponse<Artwork>> {
    let artwork = state
        .services
        .catalog
        .update_artwork(&ctx, id, req.into())
        .await?;
    Ok(ApiResponse::ok(artwork))
}

pub async fn delete_artwork(
    State(state): State<AppState>,
    RequestContext(ctx): RequestContext,
    Path(id): Path<i64>,
) -> Result<ApiResponse<()>> {
    state.services.catalog.delete_artwork(&ctx, id).await?;
    Ok(ApiResponse::empty())
}
