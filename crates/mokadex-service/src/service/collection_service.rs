//! 收藏册服务
//!
//! 扫码收集展品、判定展览是否集齐、收集徽章。
//!
//! ## 扫码流程
//!
//! 1. 要求已登录 -> 2. 按二维码查展品 -> 3. 获取或创建收藏册
//!    -> 4. 加入展品（重复扫码为无操作）
//!    -> 5. 仅新加入时判定展览是否集齐
//!    -> 6. 集齐、展览有徽章且尚未持有时发布徽章事件（失败只记录，不影响已收集的展品）

use std::sync::Arc;

use tracing::{info, instrument, warn};

use rokamoka_shared::events::EmblemCollectedEvent;
use rokamoka_shared::observability::metrics;

use crate::context::ServiceContext;
use crate::error::{Result, RokaMokaError};
use crate::models::Mokadex;
use crate::publisher::EmblemEventPublisher;
use crate::repository::{
    ArtworkRepositoryTrait, EmblemRepositoryTrait, ExhibitionRepositoryTrait,
    MokadexRepositoryTrait, Repositories,
};
use crate::service::dto::{CollectResult, ExhibitionCompletion, MokadexView};

/// 收藏册服务
pub struct CollectionService {
    artworks: Arc<dyn ArtworkRepositoryTrait>,
    exhibitions: Arc<dyn ExhibitionRepositoryTrait>,
    emblems: Arc<dyn EmblemRepositoryTrait>,
    mokadex: Arc<dyn MokadexRepositoryTrait>,
    publisher: Arc<dyn EmblemEventPublisher>,
}

impl CollectionService {
    pub fn new(repos: &Repositories, publisher: Arc<dyn EmblemEventPublisher>) -> Self {
        Self {
            artworks: repos.artworks.clone(),
            exhibitions: repos.exhibitions.clone(),
            emblems: repos.emblems.clone(),
            mokadex: repos.mokadex.clone(),
            publisher,
        }
    }

    /// 扫描展品二维码，将展品收入当前用户的收藏册
    #[instrument(skip(self, ctx), fields(execution_id = %ctx.execution_id))]
    pub async fn collect_star(&self, ctx: &ServiceContext, qr_code: &str) -> Result<CollectResult> {
        let principal = ctx.require_user()?;

        let Some(artwork) = self.artworks.find_by_qr_code(qr_code).await? else {
            metrics::record_star_collection("not_found");
            return Err(RokaMokaError::not_found("二维码", qr_code));
        };

        let mut mokadex = self.mokadex.get_or_create(principal.user_id).await?;
        let newly_collected = self.mokadex.add_artwork(mokadex.id, artwork.id).await?;
        mokadex.add_artwork(artwork.id);

        if !newly_collected {
            metrics::record_star_collection("duplicate");
            info!(
                mokadex_id = mokadex.id,
                artwork_id = artwork.id,
                "展品已在收藏册中，忽略重复扫码"
            );
            let view = self.view(&mokadex).await?;
            return Ok(CollectResult {
                mokadex: view,
                artwork,
                newly_collected: false,
                exhibition_completed: false,
                emblem_event_published: false,
            });
        }

        metrics::record_star_collection("collected");
        info!(
            mokadex_id = mokadex.id,
            artwork_id = artwork.id,
            exhibition_id = artwork.exhibition_id,
            "展品已收集"
        );

        let exhibition_completed = self
            .is_exhibition_complete(mokadex.id, artwork.exhibition_id)
            .await?;

        let emblem_event_published = if exhibition_completed {
            self.publish_emblem_if_eligible(&mokadex, artwork.exhibition_id)
                .await?
        } else {
            false
        };

        let view = self.view(&mokadex).await?;
        Ok(CollectResult {
            mokadex: view,
            artwork,
            newly_collected: true,
            exhibition_completed,
            emblem_event_published,
        })
    }

    /// 收藏册是否已收集展览的全部展品（展览无展品时视为已集齐）
    #[instrument(skip(self))]
    pub async fn has_collected_all_artworks_in_exhibition(
        &self,
        mokadex_id: i64,
        exhibition_id: i64,
    ) -> Result<bool> {
        if !self.exhibitions.exists(exhibition_id).await? {
            return Err(RokaMokaError::not_found("展览", exhibition_id));
        }
        self.is_exhibition_complete(mokadex_id, exhibition_id).await
    }

    /// 将徽章收入收藏册（消费徽章事件时调用）
    #[instrument(skip(self, ctx), fields(execution_id = %ctx.execution_id))]
    pub async fn collect_emblem(
        &self,
        ctx: &ServiceContext,
        mokadex_id: i64,
        emblem_id: i64,
    ) -> Result<Mokadex> {
        let mut mokadex = self
            .mokadex
            .find_by_id(mokadex_id)
            .await?
            .ok_or_else(|| RokaMokaError::not_found("收藏册", mokadex_id))?;

        let emblem = self
            .emblems
            .find_by_id(emblem_id)
            .await?
            .ok_or_else(|| RokaMokaError::not_found("徽章", emblem_id))?;

        if mokadex.has_emblem(emblem.id) {
            return Err(RokaMokaError::ContentDuplicated(format!(
                "收藏册 {} 已持有徽章 {}",
                mokadex_id, emblem_id
            )));
        }

        if !self
            .has_collected_all_artworks_in_exhibition(mokadex.id, emblem.exhibition_id)
            .await?
        {
            return Err(RokaMokaError::Forbidden(format!(
                "收藏册 {} 尚未集齐展览 {} 的全部展品",
                mokadex_id, emblem.exhibition_id
            )));
        }

        // 并发收集时由集合唯一约束判定
        if !self.mokadex.add_emblem(mokadex.id, emblem.id).await? {
            return Err(RokaMokaError::ContentDuplicated(format!(
                "收藏册 {} 已持有徽章 {}",
                mokadex_id, emblem_id
            )));
        }
        mokadex.add_emblem(emblem.id);

        info!(mokadex_id, emblem_id, "徽章已收入收藏册");
        Ok(mokadex)
    }

    /// 当前用户的收藏册，首次访问时创建
    #[instrument(skip(self, ctx), fields(execution_id = %ctx.execution_id))]
    pub async fn get_my_mokadex(&self, ctx: &ServiceContext) -> Result<MokadexView> {
        let principal = ctx.require_user()?;
        let mokadex = self.mokadex.get_or_create(principal.user_id).await?;
        self.view(&mokadex).await
    }

    /// 当前用户在某展览的收集进度
    #[instrument(skip(self, ctx), fields(execution_id = %ctx.execution_id))]
    pub async fn check_exhibition_completion(
        &self,
        ctx: &ServiceContext,
        exhibition_id: i64,
    ) -> Result<ExhibitionCompletion> {
        let principal = ctx.require_user()?;

        if !self.exhibitions.exists(exhibition_id).await? {
            return Err(RokaMokaError::not_found("展览", exhibition_id));
        }

        let total_artworks = self.artworks.count_by_exhibition(exhibition_id).await?;
        let mokadex = self.mokadex.find_by_user(principal.user_id).await?;
        let collected_artworks = match &mokadex {
            Some(m) => {
                self.mokadex
                    .count_collected_in_exhibition(m.id, exhibition_id)
                    .await?
            }
            None => 0,
        };

        let emblem = self.emblems.find_by_exhibition(exhibition_id).await?;
        let emblem_collected = match (&emblem, &mokadex) {
            (Some(e), Some(m)) => m.has_emblem(e.id),
            _ => false,
        };

        Ok(ExhibitionCompletion {
            exhibition_id,
            total_artworks,
            collected_artworks,
            completed: collected_artworks >= total_artworks,
            emblem_id: emblem.map(|e| e.id),
            emblem_collected,
        })
    }

    async fn is_exhibition_complete(&self, mokadex_id: i64, exhibition_id: i64) -> Result<bool> {
        let total = self.artworks.count_by_exhibition(exhibition_id).await?;
        let collected = self
            .mokadex
            .count_collected_in_exhibition(mokadex_id, exhibition_id)
            .await?;
        Ok(collected >= total)
    }

    /// 展览有徽章且收藏册尚未持有时发布事件，返回是否已发布
    ///
    /// 发布失败只记录日志和指标，不回滚已收集的展品
    async fn publish_emblem_if_eligible(
        &self,
        mokadex: &Mokadex,
        exhibition_id: i64,
    ) -> Result<bool> {
        let Some(emblem) = self.emblems.find_by_exhibition(exhibition_id).await? else {
            info!(exhibition_id, "展览已集齐但未配置徽章");
            return Ok(false);
        };

        if mokadex.has_emblem(emblem.id) {
            return Ok(false);
        }

        let event =
            EmblemCollectedEvent::new(mokadex.id, mokadex.user_id, exhibition_id, emblem.id);

        match self.publisher.publish(&event).await {
            Ok(()) => {
                metrics::record_emblem_event("published");
                info!(
                    event_id = %event.event_id,
                    mokadex_id = mokadex.id,
                    emblem_id = emblem.id,
                    "徽章事件已发布"
                );
                Ok(true)
            }
            Err(e) => {
                metrics::record_emblem_event("failed");
                warn!(
                    event_id = %event.event_id,
                    mokadex_id = mokadex.id,
                    emblem_id = emblem.id,
                    error = %e,
                    "徽章事件发布失败"
                );
                Ok(false)
            }
        }
    }

    async fn view(&self, mokadex: &Mokadex) -> Result<MokadexView> {
        let artwork_ids: Vec<i64> = mokadex.artworks.iter().copied().collect();
        let emblem_ids: Vec<i64> = mokadex.emblems.iter().copied().collect();
        let artworks = self.artworks.find_by_ids(&artwork_ids).await?;
        let emblems = self.emblems.find_by_ids(&emblem_ids).await?;
        Ok(MokadexView::new(mokadex, artworks, emblems))
    }
}
