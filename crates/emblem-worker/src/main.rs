//! 徽章 worker
//!
//! 消费徽章收集事件，把徽章收入收藏册。

use std::sync::Arc;

use emblem_worker::{EmblemConsumer, EmblemProcessor};
use mokadex::service::CollectionService;
use mokadex::{KafkaEmblemPublisher, Repositories};
use rokamoka_shared::{
    config::AppConfig, database::Database, dlq::DlqProducer, kafka::KafkaProducer, observability,
    retry::RetryPolicy,
};
use tokio::sync::watch;
use tracing::{error, info};

const SERVICE_NAME: &str = "emblem-worker";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load(SERVICE_NAME)?;
    let _guard = observability::init(&config.observability).await?;

    info!("Starting {SERVICE_NAME}...");

    let db = Database::connect(&config.database).await?;
    let producer = KafkaProducer::new(&config.kafka)?;

    let repos = Repositories::postgres(db.pool().clone());
    // collect_emblem 不发布事件；CollectionService 仍需要发布器，与死信队列共用同一个 producer
    let collection = Arc::new(CollectionService::new(
        &repos,
        Arc::new(KafkaEmblemPublisher::new(producer.clone())),
    ));
    let dlq = Arc::new(DlqProducer::new(producer, SERVICE_NAME));

    let processor = EmblemProcessor::new(collection, dlq, RetryPolicy::default());
    let consumer = EmblemConsumer::new(&config, processor)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        if shutdown_tx.send(true).is_err() {
            error!("消费循环已退出，关闭信号未送达");
        }
    });

    consumer.run(shutdown_rx).await?;

    db.close().await;
    info!("{SERVICE_NAME} shutdown complete");
    Ok(())
}

/// 收到 SIGTERM 或 Ctrl+C 后返回
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "注册 Ctrl+C 处理器失败");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "注册 SIGTERM 处理器失败");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down consumer..."),
        _ = terminate => info!("Received SIGTERM, shutting down consumer..."),
    }
}
