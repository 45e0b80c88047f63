//! 存活与就绪探针

use axum::{extract::State, http::StatusCode};
use serde::Serialize;
use tracing::warn;

use crate::dto::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub service: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<&'static str>,
}

const SERVICE_NAME: &str = "rokamoka-api";

/// 存活探针：服务进程正常即返回 ok
pub async fn health_check() -> ApiResponse<HealthStatus> {
    ApiResponse::ok(HealthStatus {
        status: "ok",
        service: SERVICE_NAME,
        database: None,
    })
}

/// 就绪探针：数据库不可用时返回 503
pub async fn readiness_check(State(state): State<AppState>) -> ApiResponse<HealthStatus> {
    let Some(db) = &state.database else {
        return ApiResponse::ok(HealthStatus {
            status: "ok",
            service: SERVICE_NAME,
            database: None,
        });
    };

    match db.health_check().await {
        Ok(()) => ApiResponse::ok(HealthStatus {
            status: "ok",
            service: SERVICE_NAME,
            database: Some("ok"),
        }),
        Err(e) => {
            warn!(error = %e, "数据库就绪检查失败");
            ApiResponse::with_status(
                StatusCode::SERVICE_UNAVAILABLE,
                HealthStatus {
                    status: "degraded",
                    service: SERVICE_NAME,
                    database: Some("fail"),
                },
            )
        }
    }
}
