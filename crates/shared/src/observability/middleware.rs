//! HTTP 中间件
//!
//! 请求追踪、指标收集，以及执行上下文响应头（Execution-*）。

use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request},
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{Instrument, info_span};
use uuid::Uuid;

use super::metrics;

pub const EXECUTION_UUID: &str = "execution-uuid";
pub const EXECUTION_START_TIME: &str = "execution-start-time";
pub const EXECUTION_END_TIME: &str = "execution-end-time";
pub const EXECUTION_ELAPSED_TIME: &str = "execution-elapsed-time";

/// 未命中任何路由时的指标标签
pub const UNMATCHED_ROUTE: &str = "unmatched";

/// HTTP 请求追踪和指标中间件
///
/// span 记录原始路径；指标的 `path` 标签使用路由模板（如 `/artwork/{id}`），
/// 未命中路由时为 [`UNMATCHED_ROUTE`]。需通过 `Router::layer` 挂载才能读到 [`MatchedPath`]。
///
/// ```ignore
/// use axum::{Router, middleware};
/// use rokamoka_shared::observability::middleware::http_tracing;
///
/// let app = Router::new()
///     .route("/health", get(health))
///     .layer(middleware::from_fn(http_tracing));
/// ```
pub async fn http_tracing(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let uri = request.uri().path().to_string();
    let route = route_label(&request);

    let execution_id = request
        .extensions()
        .get::<ExecutionMeta>()
        .map(|meta| meta.execution_id.to_string())
        .unwrap_or_default();

    let span = info_span!(
        "http_request",
        method = %method,
        uri = %uri,
        execution_id = %execution_id,
        status = tracing::field::Empty,
        latency_ms = tracing::field::Empty,
    );

    let start = Instant::now();
    let response = next.run(request).instrument(span.clone()).await;

    let latency = start.elapsed();
    let status = response.status().as_u16();

    span.record("status", status);
    span.record("latency_ms", latency.as_millis() as i64);

    metrics::record_http_request(&method, &route, status, latency.as_secs_f64());

    response
}

fn route_label(request: &Request) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_ROUTE.to_string())
}

/// 单次请求的执行元数据，放入 request extensions 供 handler 使用
#[derive(Clone, Debug)]
pub struct ExecutionMeta {
    pub execution_id: Uuid,
    pub started_at: DateTime<Utc>,
}

impl ExecutionMeta {
    pub fn start() -> Self {
        Self {
            execution_id: Uuid::new_v4(),
            started_at: Utc::now(),
        }
    }
}

/// 执行上下文中间件
///
/// 为每个请求分配执行 ID 并记录开始时间，响应时写回四个 Execution-* 头。
/// 应作为最外层中间件，保证错误响应同样带有这些头。
pub async fn execution_context(mut request: Request, next: Next) -> Response {
    let meta = ExecutionMeta::start();
    request.extensions_mut().insert(meta.clone());

    let mut response = next.run(request).await;

    let ended_at = Utc::now();
    let elapsed_ms = (ended_at - meta.started_at).num_milliseconds().max(0);

    let headers = response.headers_mut();
    insert_header(headers, EXECUTION_UUID, meta.execution_id.to_string());
    insert_header(
        headers,
        EXECUTION_START_TIME,
        meta.started_at.to_rfc3339_opts(SecondsFormat::Millis, true),
    );
    insert_header(
        headers,
        EXECUTION_END_TIME,
        ended_at.to_rfc3339_opts(SecondsFormat::Millis, true),
    );
    insert_header(headers, EXECUTION_ELAPSED_TIME, elapsed_ms.to_string());

    response
}

fn insert_header(headers: &mut axum::http::HeaderMap, name: &'static str, value: String) {
    if let Ok(value) = HeaderValue::from_str(&value) {
        headers.insert(HeaderName::from_static(name), value);
    }
}
