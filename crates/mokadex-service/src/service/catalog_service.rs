//! 目录服务：展览、展品、徽章、地点
//!
//! 任意已登录用户可查询；新增、修改、删除需要 CURATOR 或 ADMIN。

use std::sync::Arc;

use tracing::{info, instrument};

use crate::context::ServiceContext;
use crate::error::{Result, RokaMokaError};
use crate::models::{
    Artwork, Emblem, Exhibition, Location, NewArtwork, NewEmblem, NewExhibition, NewImage,
    NewLocation, RoleName,
};
use crate::repository::{
    ArtworkRepositoryTrait, EmblemRepositoryTrait, ExhibitionRepositoryTrait,
    LocationRepositoryTrait, Repositories,
};

const CATALOG_EDITORS: [RoleName; 2] = [RoleName::Curator, RoleName::Admin];

/// 目录服务
pub struct CatalogService {
    exhibitions: Arc<dyn ExhibitionRepositoryTrait>,
    artworks: Arc<dyn ArtworkRepositoryTrait>,
    emblems: Arc<dyn EmblemRepositoryTrait>,
    locations: Arc<dyn LocationRepositoryTrait>,
}

impl CatalogService {
    pub fn new(repos: &Repositories) -> Self {
        Self {
            exhibitions: repos.exhibitions.clone(),
            artworks: repos.artworks.clone(),
            emblems: repos.emblems.clone(),
            locations: repos.locations.clone(),
        }
    }

    async fn require_exhibition(&self, exhibition_id: i64) -> Result<()> {
        if self.exhibitions.exists(exhibition_id).await? {
            Ok(())
        } else {
            Err(RokaMokaError::not_found("展览", exhibition_id))
        }
    }

    // ==================== 展览 ====================

    pub async fn list_exhibitions(&self, ctx: &ServiceContext) -> Result<Vec<Exhibition>> {
        ctx.require_user()?;
        self.exhibitions.list().await
    }

    pub async fn get_exhibition(&self, ctx: &ServiceContext, id: i64) -> Result<Exhibition> {
        ctx.require_user()?;
        self.exhibitions
            .find_by_id(id)
            .await?
            .ok_or_else(|| RokaMokaError::not_found("展览", id))
    }

    /// 展览下的全部展品
    pub async fn list_exhibition_artworks(
        &self,
        ctx: &ServiceContext,
        exhibition_id: i64,
    ) -> Result<Vec<Artwork>> {
        ctx.require_user()?;
        self.require_exhibition(exhibition_id).await?;
        self.artworks.list_by_exhibition(exhibition_id).await
    }

    #[instrument(skip(self, ctx, exhibition), fields(execution_id = %ctx.execution_id))]
    pub async fn create_exhibition(
        &self,
        ctx: &ServiceContext,
        exhibition: NewExhibition,
    ) -> Result<Exhibition> {
        ctx.require_any_role(&CATALOG_EDITORS)?;
        validate_exhibition(&exhibition)?;
        self.require_location(exhibition.location_id).await?;

        let created = self.exhibitions.create(ctx, &exhibition).await?;
        info!(exhibition_id = created.id, "展览已创建");
        Ok(created)
    }

    #[instrument(skip(self, ctx, exhibition), fields(execution_id = %ctx.execution_id))]
    pub async fn update_exhibition(
        &self,
        ctx: &ServiceContext,
        id: i64,
        exhibition: NewExhibition,
    ) -> Result<Exhibition> {
        ctx.require_any_role(&CATALOG_EDITORS)?;
        validate_exhibition(&exhibition)?;
        self.require_location(exhibition.location_id).await?;

        self.exhibitions
            .update(ctx, id, &exhibition)
            .await?
            .ok_or_else(|| RokaMokaError::not_found("展览", id))
    }

    /// 删除展览，其展品和徽章一并删除
    #[instrument(skip(self, ctx), fields(execution_id = %ctx.execution_id))]
    pub async fn delete_exhibition(&self, ctx: &ServiceContext, id: i64) -> Result<()> {
        ctx.require_any_role(&CATALOG_EDITORS)?;
        if !self.exhibitions.delete(id).await? {
            return Err(RokaMokaError::not_found("展览", id));
        }
        info!(exhibition_id = id, "展览已删除");
        Ok(())
    }

    // ==================== 展品 ====================

    pub async fn list_artworks(&self, ctx: &ServiceContext) -> Result<Vec<Artwork>> {
        ctx.require_user()?;
        self.artworks.list().await
    }

    pub async fn get_artwork(&self, ctx: &ServiceContext, id: i64) -> Result<Artwork> {
        ctx.require_user()?;
        self.artworks
            .find_by_id(id)
            .await?
            .ok_or_else(|| RokaMokaError::not_found("展品", id))
    }

    pub async fn get_artwork_by_qr_code(
        &self,
        ctx: &ServiceContext,
        qr_code: &str,
    ) -> Result<Artwork> {
        ctx.require_user()?;
        self.artworks
            .find_by_qr_code(qr_code)
            .await?
            .ok_or_else(|| RokaMokaError::not_found("二维码", qr_code))
    }

    #[instrument(skip(self, ctx, artwork), fields(execution_id = %ctx.execution_id, qr_code = %artwork.qr_code))]
    pub async fn create_artwork(
        &self,
        ctx: &ServiceContext,
        artwork: NewArtwork,
    ) -> Result<Artwork> {
        ctx.require_any_role(&CATALOG_EDITORS)?;
        validate_artwork(&artwork)?;
        self.require_exhibition(artwork.exhibition_id).await?;

        if self.artworks.find_by_qr_code(&artwork.qr_code).await?.is_some() {
            return Err(RokaMokaError::ContentDuplicated(format!(
                "二维码已被使用: {}",
                artwork.qr_code
            )));
        }

        let created = self.artworks.create(ctx, &artwork).await?;
        info!(artwork_id = created.id, exhibition_id = created.exhibition_id, "展品已创建");
        Ok(created)
    }

    #[instrument(skip(self, ctx, artwork), fields(execution_id = %ctx.execution_id))]
    pub async fn update_artwork(
        &self,
        ctx: &ServiceContext,
        id: i64,
        artwork: NewArtwork,
    ) -> Result<Artwork> {
        ctx.require_any_role(&CATALOG_EDITORS)?;
        validate_artwork(&artwork)?;

        if self.artworks.find_by_id(id).await?.is_none() {
            return Err(RokaMokaError::not_found("展品", id));
        }
        self.require_exhibition(artwork.exhibition_id).await?;

        if let Some(other) = self.artworks.find_by_qr_code(&artwork.qr_code).await?
            && other.id != id
        {
            return Err(RokaMokaError::ContentDuplicated(format!(
                "二维码已被使用: {}",
                artwork.qr_code
            )));
        }

        self.artworks
            .update(ctx, id, &artwork)
            .await?
            .ok_or_else(|| RokaMokaError::not_found("展品", id))
    }

    #[instrument(skip(self, ctx), fields(execution_id = %ctx.execution_id))]
    pub async fn delete_artwork(&self, ctx: &ServiceContext, id: i64) -> Result<()> {
        ctx.require_any_role(&CATALOG_EDITORS)?;
        if !self.artworks.delete(id).await? {
            return Err(RokaMokaError::not_found("展品", id));
        }
        info!(artwork_id = id, "展品已删除");
        Ok(())
    }

    // ==================== 徽章 ====================

    pub async fn list_emblems(&self, ctx: &ServiceContext) -> Result<Vec<Emblem>> {
        ctx.require_user()?;
        self.emblems.list().await
    }

    pub async fn get_emblem(&self, ctx: &ServiceContext, id: i64) -> Result<Emblem> {
        ctx.require_user()?;
        self.emblems
            .find_by_id(id)
            .await?
            .ok_or_else(|| RokaMokaError::not_found("徽章", id))
    }

    pub async fn get_emblem_by_exhibition(
        &self,
        ctx: &ServiceContext,
        exhibition_id: i64,
    ) -> Result<Emblem> {
        ctx.require_user()?;
        self.require_exhibition(exhibition_id).await?;
        self.emblems
            .find_by_exhibition(exhibition_id)
            .await?
            .ok_or_else(|| RokaMokaError::ContentNotFound(format!("展览 {exhibition_id} 的徽章")))
    }

    /// 创建徽章，每个展览最多一个
    #[instrument(skip(self, ctx, emblem), fields(execution_id = %ctx.execution_id, exhibition_id = emblem.exhibition_id))]
    pub async fn create_emblem(&self, ctx: &ServiceContext, emblem: NewEmblem) -> Result<Emblem> {
        ctx.require_any_role(&CATALOG_EDITORS)?;
        if emblem.name.trim().is_empty() {
            return Err(RokaMokaError::Validation("徽章名称不能为空".to_string()));
        }
        validate_image(emblem.image.as_ref())?;
        self.require_exhibition(emblem.exhibition_id).await?;

        if self
            .emblems
            .find_by_exhibition(emblem.exhibition_id)
            .await?
            .is_some()
        {
            return Err(RokaMokaError::ContentDuplicated(format!(
                "展览 {} 已有徽章",
                emblem.exhibition_id
            )));
        }

        let created = self.emblems.create(ctx, &emblem).await?;
        info!(emblem_id = created.id, "徽章已创建");
        Ok(created)
    }

    #[instrument(skip(self, ctx), fields(execution_id = %ctx.execution_id))]
    pub async fn delete_emblem(&self, ctx: &ServiceContext, id: i64) -> Result<()> {
        ctx.require_any_role(&CATALOG_EDITORS)?;
        if !self.emblems.delete(id).await? {
            return Err(RokaMokaError::not_found("徽章", id));
        }
        info!(emblem_id = id, "徽章已删除");
        Ok(())
    }

    // ==================== 地点 ====================

    async fn require_location(&self, location_id: Option<i64>) -> Result<()> {
        if let Some(location_id) = location_id
            && self.locations.find_by_id(location_id).await?.is_none()
        {
            return Err(RokaMokaError::not_found("地点", location_id));
        }
        Ok(())
    }

    pub async fn list_locations(&self, ctx: &ServiceContext) -> Result<Vec<Location>> {
        ctx.require_user()?;
        self.locations.list().await
    }

    pub async fn get_location(&self, ctx: &ServiceContext, id: i64) -> Result<Location> {
        ctx.require_user()?;
        self.locations
            .find_by_id(id)
            .await?
            .ok_or_else(|| RokaMokaError::not_found("地点", id))
    }

    #[instrument(skip(self, ctx, location), fields(execution_id = %ctx.execution_id))]
    pub async fn create_location(
        &self,
        ctx: &ServiceContext,
        location: NewLocation,
    ) -> Result<Location> {
        ctx.require_any_role(&CATALOG_EDITORS)?;
        validate_location(&location)?;
        self.locations.create(ctx, &location).await
    }

    #[instrument(skip(self, ctx, location), fields(execution_id = %ctx.execution_id))]
    pub async fn update_location(
        &self,
        ctx: &ServiceContext,
        id: i64,
        location: NewLocation,
    ) -> Result<Location> {
        ctx.require_any_role(&CATALOG_EDITORS)?;
        validate_location(&location)?;
        self.locations
            .update(ctx, id, &location)
            .await?
            .ok_or_else(|| RokaMokaError::not_found("地点", id))
    }

    #[instrument(skip(self, ctx), fields(execution_id = %ctx.execution_id))]
    pub async fn delete_location(&self, ctx: &ServiceContext, id: i64) -> Result<()> {
        ctx.require_any_role(&CATALOG_EDITORS)?;
        if !self.locations.delete(id).await? {
            return Err(RokaMokaError::not_found("地点", id));
        }
        Ok(())
    }
}

// ==================== 校验 ====================

fn validate_image(image: Option<&NewImage>) -> Result<()> {
    if let Some(image) = image
        && image.url.trim().is_empty()
    {
        return Err(RokaMokaError::Validation("图片地址不能为空".to_string()));
    }
    Ok(())
}

fn validate_exhibition(exhibition: &NewExhibition) -> Result<()> {
    if exhibition.name.trim().is_empty() {
        return Err(RokaMokaError::Validation("展览名称不能为空".to_string()));
    }
    if let (Some(start), Some(end)) = (exhibition.start_date, exhibition.end_date)
        && end < start
    {
        return Err(RokaMokaError::Validation(
            "结束日期不能早于开始日期".to_string(),
        ));
    }
    validate_image(exhibition.image.as_ref())
}

fn validate_artwork(artwork: &NewArtwork) -> Result<()> {
    if artwork.name.trim().is_empty() {
        return Err(RokaMokaError::Validation("展品名称不能为空".to_string()));
    }
    if artwork.qr_code.trim().is_empty() || artwork.qr_code.len() > 255 {
        return Err(RokaMokaError::Validation(
            "二维码长度必须在 1 到 255 之间".to_string(),
        ));
    }
    validate_image(artwork.image.as_ref())
}

fn validate_location(location: &NewLocation) -> Result<()> {
    let address = &location.address;
    if location.name.trim().is_empty()
        || address.city.trim().is_empty()
        || address.state.trim().is_empty()
        || address.country.trim().is_empty()
    {
        return Err(RokaMokaError::Validation(
            "地点名称、城市、州和国家不能为空".to_string(),
        ));
    }
    Ok(())
}
