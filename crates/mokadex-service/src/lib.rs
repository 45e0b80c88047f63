//! RokaMoka 收藏册核心库
//!
//! 博物馆游览游戏化的领域核心：访客扫描展品二维码收集「星」，
//! 集齐展览全部展品后获得徽章；用户可申请策展人或研究员角色，由管理员审批。
//!
//! - `models`: 领域模型
//! - `repository`: 仓储 trait 及 PostgreSQL / 内存实现
//! - `service`: 业务服务
//! - `publisher`: 徽章事件发布
//! - `context`: 调用上下文与调用者

pub mod context;
pub mod error;
pub mod models;
pub mod password;
pub mod publisher;
pub mod repository;
pub mod service;

pub use context::{Principal, ServiceContext};
pub use error::{Result, RokaMokaError};
pub use publisher::{EmblemEventPublisher, KafkaEmblemPublisher, RecordingPublisher};
pub use repository::{MemoryStore, Repositories};
pub use service::Services;
