//! RokaMoka API 服务
//!
//! 提供账号、展览目录、收藏册、权限申请与研究统计的 REST API。

use std::sync::Arc;

use mokadex::{KafkaEmblemPublisher, Repositories, Services};
use rokamoka_api::{auth::JwtManager, routes, state::AppState};
use rokamoka_shared::{config::AppConfig, database::Database, kafka::KafkaProducer, observability};
use tokio::net::TcpListener;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 从 config/rokamoka-api.toml 等文件与 ROKAMOKA_ 环境变量加载
    let config = AppConfig::load("rokamoka-api")?;
    let _guard = observability::init(&config.observability).await?;

    info!("Starting rokamoka-api on {}", config.server_addr());

    let db = Database::connect(&config.database).await?;
    if config.database.run_migrations {
        db.run_migrations().await?;
    }

    let producer = KafkaProducer::new(&config.kafka)?;
    let publisher = Arc::new(KafkaEmblemPublisher::new(producer));
    let repos = Repositories::postgres(db.pool().clone());
    let services = Services::new(&repos, publisher);

    if config.is_production() && !config.auth.uses_rsa() {
        warn!("生产环境未配置 RSA 密钥，JWT 将使用 HS256 共享密钥签名");
    }
    let jwt = JwtManager::from_config(&config.auth)?;
    info!(algorithm = ?jwt.algorithm(), "JWT 签名器已就绪");

    match config.bootstrap_admin() {
        Ok(Some(admin)) => match services.accounts.ensure_bootstrap_admin(admin).await {
            Ok(Some(user)) => info!(user_id = user.id, "已创建初始管理员"),
            Ok(None) => info!("初始管理员已存在"),
            // 管理员创建失败不阻止服务启动
            Err(e) => error!(error = %e, "创建初始管理员失败"),
        },
        Ok(None) => {}
        Err(e) => error!(error = %e, "初始管理员配置无效，跳过创建"),
    }

    let state = AppState::new(services, jwt).with_database(db.clone());
    let app = routes::build_router(state, &config.server);

    let listener = TcpListener::bind(config.server_addr()).await?;
    info!("Listening on {}", config.server_addr());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");

    Ok(())
}

/// 监听关闭信号
///
/// 收到 SIGTERM 或 Ctrl+C 后返回，触发 axum 的优雅关闭流程。
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
        _ = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown..."),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown..."),
    }
}
