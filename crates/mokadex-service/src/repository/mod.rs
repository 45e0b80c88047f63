//! 数据库仓储层
//!
//! 每个聚合一个仓储 trait，PostgreSQL 实现用于生产，`MemoryStore` 用于测试与本地运行。

mod catalog_repo;
mod memory;
mod mokadex_repo;
mod permission_repo;
mod traits;
mod user_repo;

use std::sync::Arc;

use sqlx::PgPool;

pub use catalog_repo::{ArtworkRepository, EmblemRepository, ExhibitionRepository, LocationRepository};
pub use memory::MemoryStore;
pub use mokadex_repo::MokadexRepository;
pub use permission_repo::PermissionRepository;
pub use traits::*;
pub use user_repo::{DeviceRepository, UserRepository};

/// 服务层使用的全部仓储
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepositoryTrait>,
    pub devices: Arc<dyn DeviceRepositoryTrait>,
    pub exhibitions: Arc<dyn ExhibitionRepositoryTrait>,
    pub artworks: Arc<dyn ArtworkRepositoryTrait>,
    pub emblems: Arc<dyn EmblemRepositoryTrait>,
    pub locations: Arc<dyn LocationRepositoryTrait>,
    pub mokadex: Arc<dyn MokadexRepositoryTrait>,
    pub permissions: Arc<dyn PermissionRepositoryTrait>,
}

impl Repositories {
    /// PostgreSQL 实现，共享同一连接池
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(UserRepository::new(pool.clone())),
            devices: Arc::new(DeviceRepository::new(pool.clone())),
            exhibitions: Arc::new(ExhibitionRepository::new(pool.clone())),
            artworks: Arc::new(ArtworkRepository::new(pool.clone())),
            emblems: Arc::new(EmblemRepository::new(pool.clone())),
            locations: Arc::new(LocationRepository::new(pool.clone())),
            mokadex: Arc::new(MokadexRepository::new(pool.clone())),
            permissions: Arc::new(PermissionRepository::new(pool)),
        }
    }

    /// 内存实现，所有仓储共享同一个 store
    pub fn in_memory(store: Arc<MemoryStore>) -> Self {
        Self {
            users: store.clone(),
            devices: store.clone(),
            exhibitions: store.clone(),
            artworks: store.clone(),
            emblems: store.clone(),
            locations: store.clone(),
            mokadex: store.clone(),
            permissions: store,
        }
    }
}
