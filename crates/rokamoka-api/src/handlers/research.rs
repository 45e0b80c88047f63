//! 研究统计处理器

use axum::extract::{Path, State};

use mokadex::service::dto::ExhibitionStatistics;

use crate::dto::ApiResponse;
use crate::error::Result;
use crate::extract::RequestContext;
use crate::state::AppState;

/// GET /researcher/exhibition/{id}/statistics
pub async fn exhibition_statistics(
    State(state): State<AppState>,
    RequestContext(ctx): RequestContext,
    Path(exhibition_id): Path<i64>,
) -> Result<ApiResponse<ExhibitionStatistics>> {
    let stats = state
        .services
        .research
        .exhibition_statistics(&ctx, exhibition_id)
        .await?;
    Ok(ApiResponse::ok(stats))
}
