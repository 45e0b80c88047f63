//! 业务服务层
//!
//! 每个服务持有所需仓储的 trait 对象，权限校验在服务层完成。

mod account_service;
mod catalog_service;
mod collection_service;
pub mod dto;
mod permission_service;
mod research_service;

use std::sync::Arc;

pub use account_service::AccountService;
pub use catalog_service::CatalogService;
pub use collection_service::CollectionService;
pub use permission_service::PermissionService;
pub use research_service::ResearchService;

use crate::password::DEFAULT_COST;
use crate::publisher::EmblemEventPublisher;
use crate::repository::Repositories;

/// 全部业务服务，供 API 与 worker 共享
#[derive(Clone)]
pub struct Services {
    pub accounts: Arc<AccountService>,
    pub catalog: Arc<CatalogService>,
    pub collection: Arc<CollectionService>,
    pub permissions: Arc<PermissionService>,
    pub research: Arc<ResearchService>,
}

impl Services {
    pub fn new(repos: &Repositories, publisher: Arc<dyn EmblemEventPublisher>) -> Self {
        Self::with_bcrypt_cost(repos, publisher, DEFAULT_COST)
    }

    pub fn with_bcrypt_cost(
        repos: &Repositories,
        publisher: Arc<dyn EmblemEventPublisher>,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            accounts: Arc::new(AccountService::with_bcrypt_cost(repos, bcrypt_cost)),
            catalog: Arc::new(CatalogService::new(repos)),
            collection: Arc::new(CollectionService::new(repos, publisher)),
            permissions: Arc::new(PermissionService::new(repos)),
            research: Arc::new(ResearchService::new(repos)),
        }
    }
}
