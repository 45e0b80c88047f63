//! Prometheus 指标模块
//!
//! 基于 metrics crate 和 metrics-exporter-prometheus 实现指标收集与导出。
//! 指标通过独立的 HTTP 端口暴露，供 Prometheus 抓取。

use anyhow::Result;
use axum::{Router, routing::get};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{error, info};

use super::ObservabilityConfig;

/// Metrics 资源守卫
pub struct MetricsHandle {
    _server_handle: tokio::task::JoinHandle<()>,
}

/// 初始化 Prometheus 指标导出，在独立端口暴露 `/metrics`
pub async fn init(config: &ObservabilityConfig) -> Result<MetricsHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    register_common_metrics(&config.service_name);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.metrics_port));
    let server_handle = start_metrics_server(addr, handle).await?;

    Ok(MetricsHandle {
        _server_handle: server_handle,
    })
}

fn register_common_metrics(service_name: &str) {
    metrics::describe_counter!("http_requests_total", "Total number of HTTP requests");
    metrics::describe_histogram!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds"
    );

    metrics::describe_counter!(
        "mokadex_star_collections_total",
        "Artwork QR scans processed, labelled by outcome"
    );
    metrics::describe_counter!(
        "mokadex_emblem_events_total",
        "Emblem collected events published, labelled by status"
    );
    metrics::describe_counter!(
        "mokadex_emblem_collections_total",
        "Emblem events consumed by the worker, labelled by outcome"
    );
    metrics::describe_counter!(
        "permission_decisions_total",
        "Permission request decisions, labelled by decision"
    );

    metrics::counter!("service_starts_total", "service" => service_name.to_string()).increment(1);
}

async fn start_metrics_server(
    addr: SocketAddr,
    handle: PrometheusHandle,
) -> Result<tokio::task::JoinHandle<()>> {
    let app = Router::new()
        .route("/metrics", get(move || std::future::ready(handle.render())))
        .route("/health", get(|| async { "OK" }));

    let listener = TcpListener::bind(addr).await?;
    info!("Metrics server listening on {}", addr);

    let server_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Metrics server error: {}", e);
        }
    });

    Ok(server_handle)
}

/// 记录 HTTP 请求
#[inline]
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let status_str = status.to_string();
    metrics::counter!(
        "http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status_str.clone()
    )
    .increment(1);

    metrics::histogram!(
        "http_request_duration_seconds",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status_str
    )
    .record(duration_secs);
}

/// 记录一次扫码收集，outcome: collected / duplicate / not_found
#[inline]
pub fn record_star_collection(outcome: &str) {
    metrics::counter!("mokadex_star_collections_total", "outcome" => outcome.to_string())
        .increment(1);
}

/// 记录徽章事件发布，status: published / failed
#[inline]
pub fn record_emblem_event(status: &str) {
    metrics::counter!("mokadex_emblem_events_total", "status" => status.to_string()).increment(1);
}

/// 记录 worker 侧徽章收集，outcome: collected / rejected / failed
#[inline]
pub fn record_emblem_collection(outcome: &str) {
    metrics::counter!("mokadex_emblem_collections_total", "outcome" => outcome.to_string())
        .increment(1);
}

/// 记录权限申请审批，decision: CONFIRM / DENY
#[inline]
pub fn record_permission_decision(decision: &str) {
    metrics::counter!("permission_decisions_total", "decision" => decision.to_string())
        .increment(1);
}
