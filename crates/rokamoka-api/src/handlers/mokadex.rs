//! 收藏册处理器

use axum::extract::{Path, State};

use mokadex::service::dto::{CollectResult, ExhibitionCompletion, MokadexView};

use crate::dto::ApiResponse;
use crate::error::Result;
use crate::extract::RequestContext;
use crate::state::AppState;

/// GET /mokadex
pub async fn get_mokadex(
    State(state): State<AppState>,
    RequestContext(ctx): RequestContext,
) -> Result<ApiResponse<MokadexView>> {
    let view = state.services.collection.get_my_mokadex(&ctx).await?;
    Ok(ApiResponse::ok(view))
}

/// 扫码收集展品
///
/// POST /mokadex/collect/{qrcode}，重复扫码同样返回 200
pub async fn collect_star(
    State(state): State<AppState>,
    RequestContext(ctx): RequestContext,
    Path(qr_code): Path<String>,
) -> Result<ApiResponse<CollectResult>> {
    let result = state
        .services
        .collection
        .collect_star(&ctx, &qr_code)
        .await?;
    Ok(ApiResponse::ok(result))
}

/// GET /mokadex/exhibition/{id}/complete
pub async fn exhibition_completion(
    State(state): State<AppState>,
    RequestContext(ctx): RequestContext,
    Path(exhibition_id): Path<i64>,
) -> Result<ApiResponse<ExhibitionCompletion>> {
    let completion = state
        .services
        .collection
        .check_exhibition_completion(&ctx, exhibition_id)
        .await?;
    Ok(ApiResponse::ok(completion))
}
