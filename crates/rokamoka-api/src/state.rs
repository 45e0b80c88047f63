//! 应用状态

use std::sync::Arc;

use mokadex::Services;
use rokamoka_shared::database::Database;

use crate::auth::JwtManager;

/// Axum 路由共享状态
#[derive(Clone)]
pub struct AppState {
    pub services: Services,
    pub jwt: Arc<JwtManager>,
    /// 就绪探针检查用；内存模式下为 None
    pub database: Option<Database>,
}

impl AppState {
    pub fn new(services: Services, jwt: JwtManager) -> Self {
        Self {
            services,
            jwt: Arc::new(jwt),
            database: None,
        }
    }

    pub fn with_database(mut self, database: Database) -> Self {
        self.database = Some(database);
        self
    }
}
