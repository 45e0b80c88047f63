//! 路由配置模块
//!
//! 定义所有 REST 端点的路由映射，以及中间件的装配顺序

use std::time::Duration;

use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, post, put},
};
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
};
use tracing::info;

use rokamoka_shared::{config::ServerConfig, observability::middleware as obs_middleware};

use crate::{
    handlers,
    middleware::{auth_middleware, security_headers},
    state::AppState,
};

/// 认证与账号路由（login / register 为公开路由）
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/me", get(handlers::auth::me))
        .route(
            "/auth/user/{id}/password",
            put(handlers::auth::reset_password),
        )
        .route(
            "/auth/device",
            post(handlers::auth::register_device).get(handlers::auth::list_devices),
        )
}

/// 展览、展品、徽章、地点路由
fn catalog_routes() -> Router<AppState> {
    Router::new()
        // 展览
        .route(
            "/exhibition",
            get(handlers::exhibition::list_exhibitions).post(handlers::exhibition::create_exhibition),
        )
        .route(
            "/exhibition/{id}",
            get(handlers::exhibition::get_exhibition)
                .put(handlers::exhibition::update_exhibition)
                .delete(handlers::exhibition::delete_exhibition),
        )
        .route(
            "/exhibition/{id}/artworks",
            get(handlers::exhibition::list_exhibition_artworks),
        )
        // 展品
        .route(
            "/artwork",
            get(handlers::artwork::list_artworks).post(handlers::artwork::create_artwork),
        )
        .route(
            "/artwork/{id}",
            get(handlers::artwork::get_artwork)
                .put(handlers::artwork::update_artwork)
                .delete(handlers::artwork::delete_artwork),
        )
        .route(
            "/artwork/qrcode/{qrcode}",
            get(handlers::artwork::get_artwork_by_qr_code),
        )
        // 徽章
        .route(
            "/emblem",
            get(handlers::emblem::list_emblems).post(handlers::emblem::create_emblem),
        )
        .route(
            "/emblem/{id}",
            get(handlers::emblem::get_emblem).delete(handlers::emblem::delete_emblem),
        )
        .route(
            "/emblem/exhibition/{id}",
            get(handlers::emblem::get_emblem_by_exhibition),
        )
        // 地点
        .route(
            "/location",
            get(handlers::location::list_locations).post(handlers::location::create_location),
        )
        .route(
            "/location/{id}",
            get(handlers::location::get_location)
                .put(handlers::location::update_location)
                .delete(handlers::location::delete_location),
        )
}

/// 收藏册路由
fn mokadex_routes() -> Router<AppState> {
    Router::new()
        .route("/mokadex", get(handlers::mokadex::get_mokadex))
        .route(
            "/mokadex/collect/{qrcode}",
            post(handlers::mokadex::collect_star),
        )
        .route(
            "/mokadex/exhibition/{id}/complete",
            get(handlers::mokadex::exhibition_completion),
        )
}

/// 权限申请路由
fn permission_routes() -> Router<AppState> {
    Router::new()
        .route("/request/permission", post(handlers::permission::create_request))
        .route("/request/permission/mine", get(handlers::permission::list_mine))
        .route("/request/permission/pending", get(handlers::permission::list_pending))
        .route("/request/permission/{id}", get(handlers::permission::get_request))
        .route("/request/permission/{id}/accept", put(handlers::permission::accept))
        .route("/request/permission/{id}/deny", put(handlers::permission::deny))
}

fn research_routes() -> Router<AppState> {
    Router::new().route(
        "/researcher/exhibition/{id}/statistics",
        get(handlers::research::exhibition_statistics),
    )
}

/// 构建完整的 API 路由（不含中间件）
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .merge(auth_routes())
        .merge(catalog_routes())
        .merge(mokadex_routes())
        .merge(permission_routes())
        .merge(research_routes())
}

/// 构建带全部中间件的应用
///
/// 中间件由内到外：认证、安全头、超时、CORS、HTTP 追踪、执行上下文。
/// 执行上下文位于最外层，错误响应同样带 Execution-* 头。
pub fn build_router(state: AppState, server: &ServerConfig) -> Router {
    api_routes()
        .fallback(handlers::not_found)
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(TimeoutLayer::new(Duration::from_secs(
            server.request_timeout_seconds,
        )))
        .layer(cors_layer(&server.cors_origins))
        .layer(middleware::from_fn(obs_middleware::http_tracing))
        .layer(middleware::from_fn(obs_middleware::execution_context))
        .with_state(state)
}

/// 逗号分隔的来源列表；`*` 表示允许全部来源
fn cors_layer(allowed_origins: &str) -> CorsLayer {
    if allowed_origins.trim() == "*" {
        info!("CORS allowed_origins: * (all origins)");
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    info!("CORS allowed_origins: {}", allowed_origins);
    let origins: Vec<_> = allowed_origins
        .split(',')
        .filter_map(|s| s.trim().parse::<HeaderValue>().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}
