//! HTTP 处理器

pub mod artwork;
pub mod auth;
pub mod emblem;
pub mod exhibition;
pub mod health;
pub mod location;
pub mod mokadex;
pub mod permission;
pub mod research;

use axum::http::StatusCode;

use crate::dto::ApiResponse;

/// 未匹配路由
pub async fn not_found() -> ApiResponse<()> {
    ApiResponse::error(StatusCode::NOT_FOUND, "NOT_FOUND", "资源不存在")
}
