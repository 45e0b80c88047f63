//! 仓储 Trait 定义
//!
//! 服务层依赖这些抽象；PostgreSQL 与内存两种实现，测试中也可用 mockall 生成的 mock。
//! 写操作接收 `ServiceContext`，由仓储写入审计字段。

use async_trait::async_trait;

use crate::context::ServiceContext;
use crate::error::Result;
use crate::models::{
    Artwork, Device, DevicePlatform, Emblem, Exhibition, Location, Mokadex, NewArtwork,
    NewEmblem, NewExhibition, NewLocation, NewUser, PermissionRequest, PermissionStatus, RoleName,
    User,
};

/// 用户仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepositoryTrait: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;
    async fn exists_by_username(&self, username: &str) -> Result<bool>;
    async fn exists_by_email(&self, email: &str) -> Result<bool>;
    async fn create(&self, ctx: &ServiceContext, user: &NewUser) -> Result<User>;
    async fn update_password(
        &self,
        ctx: &ServiceContext,
        user_id: i64,
        password_hash: &str,
    ) -> Result<()>;
    /// 授予角色，已持有时无操作
    async fn add_role(&self, user_id: i64, role: RoleName) -> Result<()>;
}

/// 设备仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeviceRepositoryTrait: Send + Sync {
    /// 按 identifier 插入或转移到当前用户
    async fn upsert(
        &self,
        ctx: &ServiceContext,
        user_id: i64,
        identifier: &str,
        platform: DevicePlatform,
    ) -> Result<Device>;
    async fn list_by_user(&self, user_id: i64) -> Result<Vec<Device>>;
}

/// 展览仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExhibitionRepositoryTrait: Send + Sync {
    async fn list(&self) -> Result<Vec<Exhibition>>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Exhibition>>;
    async fn exists(&self, id: i64) -> Result<bool>;
    async fn create(&self, ctx: &ServiceContext, exhibition: &NewExhibition)
    -> Result<Exhibition>;
    async fn update(
        &self,
        ctx: &ServiceContext,
        id: i64,
        exhibition: &NewExhibition,
    ) -> Result<Option<Exhibition>>;
    /// 删除展览（级联删除展品与徽章），返回是否存在
    async fn delete(&self, id: i64) -> Result<bool>;
}

/// 展品仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ArtworkRepositoryTrait: Send + Sync {
    async fn list(&self) -> Result<Vec<Artwork>>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Artwork>>;
    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Artwork>>;
    async fn find_by_qr_code(&self, qr_code: &str) -> Result<Option<Artwork>>;
    async fn list_by_exhibition(&self, exhibition_id: i64) -> Result<Vec<Artwork>>;
    async fn count_by_exhibition(&self, exhibition_id: i64) -> Result<i64>;
    async fn create(&self, ctx: &ServiceContext, artwork: &NewArtwork) -> Result<Artwork>;
    async fn update(
        &self,
        ctx: &ServiceContext,
        id: i64,
        artwork: &NewArtwork,
    ) -> Result<Option<Artwork>>;
    async fn delete(&self, id: i64) -> Result<bool>;
}

/// 徽章仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmblemRepositoryTrait: Send + Sync {
    async fn list(&self) -> Result<Vec<Emblem>>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Emblem>>;
    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Emblem>>;
    async fn find_by_exhibition(&self, exhibition_id: i64) -> Result<Option<Emblem>>;
    async fn create(&self, ctx: &ServiceContext, emblem: &NewEmblem) -> Result<Emblem>;
    async fn delete(&self, id: i64) -> Result<bool>;
}

/// 地点仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LocationRepositoryTrait: Send + Sync {
    async fn list(&self) -> Result<Vec<Location>>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Location>>;
    async fn create(&self, ctx: &ServiceContext, location: &NewLocation) -> Result<Location>;
    async fn update(
        &self,
        ctx: &ServiceContext,
        id: i64,
        location: &NewLocation,
    ) -> Result<Option<Location>>;
    async fn delete(&self, id: i64) -> Result<bool>;
}

/// 收藏册仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MokadexRepositoryTrait: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Mokadex>>;
    async fn find_by_user(&self, user_id: i64) -> Result<Option<Mokadex>>;
    /// 获取用户的收藏册，不存在时创建（并发安全）
    async fn get_or_create(&self, user_id: i64) -> Result<Mokadex>;
    /// 加入展品，返回是否为新加入
    async fn add_artwork(&self, mokadex_id: i64, artwork_id: i64) -> Result<bool>;
    /// 加入徽章，返回是否为新加入
    async fn add_emblem(&self, mokadex_id: i64, emblem_id: i64) -> Result<bool>;
    /// 收藏册中属于该展览的展品数量
    async fn count_collected_in_exhibition(
        &self,
        mokadex_id: i64,
        exhibition_id: i64,
    ) -> Result<i64>;
    /// 至少收集了该展览一件展品的收藏册数量
    async fn count_collectors(&self, exhibition_id: i64) -> Result<i64>;
    async fn count_emblem_holders(&self, emblem_id: i64) -> Result<i64>;
    /// 展览内每件展品被收集的次数：(artwork_id, count)，未被收集的展品计 0
    async fn artwork_collection_counts(&self, exhibition_id: i64) -> Result<Vec<(i64, i64)>>;
}

/// 权限申请仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PermissionRepositoryTrait: Send + Sync {
    async fn create(&self, user_id: i64, role: RoleName) -> Result<PermissionRequest>;
    /// 按 ID 查询，已审批的附带审批记录
    async fn find_by_id(&self, id: i64) -> Result<Option<PermissionRequest>>;
    async fn exists_pending(&self, user_id: i64, role: RoleName) -> Result<bool>;
    async fn list_pending(&self) -> Result<Vec<PermissionRequest>>;
    async fn list_by_user(&self, user_id: i64) -> Result<Vec<PermissionRequest>>;
    /// 审批：仅当申请仍为 PENDING 时生效
    ///
    /// 在同一事务内更新状态、写入审批记录，决定为 CONFIRM 时授予目标角色。
    /// 申请已不是 PENDING（包括并发审批失败的一方）时返回 None。
    async fn decide(
        &self,
        request_id: i64,
        reviewer_id: i64,
        decision: PermissionStatus,
        justification: &str,
    ) -> Result<Option<PermissionRequest>>;
}
