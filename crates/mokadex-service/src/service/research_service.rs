//! 研究统计服务（RESEARCHER / ADMIN）

use std::collections::HashMap;
use std::sync::Arc;

use tracing::instrument;

use crate::context::ServiceContext;
use crate::error::{Result, RokaMokaError};
use crate::models::RoleName;
use crate::repository::{
    ArtworkRepositoryTrait, EmblemRepositoryTrait, ExhibitionRepositoryTrait,
    MokadexRepositoryTrait, Repositories,
};
use crate::service::dto::{ArtworkStatistic, ExhibitionStatistics};

pub struct ResearchService {
    exhibitions: Arc<dyn ExhibitionRepositoryTrait>,
    artworks: Arc<dyn ArtworkRepositoryTrait>,
    emblems: Arc<dyn EmblemRepositoryTrait>,
    mokadex: Arc<dyn MokadexRepositoryTrait>,
}

impl ResearchService {
    pub fn new(repos: &Repositories) -> Self {
        Self {
            exhibitions: repos.exhibitions.clone(),
            artworks: repos.artworks.clone(),
            emblems: repos.emblems.clone(),
            mokadex: repos.mokadex.clone(),
        }
    }

    /// 展览的收集统计：每件展品被多少收藏册收集、参与人数、徽章持有人数
    #[instrument(skip(self, ctx), fields(execution_id = %ctx.execution_id))]
    pub async fn exhibition_statistics(
        &self,
        ctx: &ServiceContext,
        exhibition_id: i64,
    ) -> Result<ExhibitionStatistics> {
        ctx.require_any_role(&[RoleName::Researcher, RoleName::Admin])?;

        let exhibition = self
            .exhibitions
            .find_by_id(exhibition_id)
            .await?
            .ok_or_else(|| RokaMokaError::not_found("展览", exhibition_id))?;

        let artworks = self.artworks.list_by_exhibition(exhibition_id).await?;
        let counts: HashMap<i64, i64> = self
            .mokadex
            .artwork_collection_counts(exhibition_id)
            .await?
            .into_iter()
            .collect();

        let collectors = self.mokadex.count_collectors(exhibition_id).await?;

        let emblem = self.emblems.find_by_exhibition(exhibition_id).await?;
        let emblem_holders = match &emblem {
            Some(e) => self.mokadex.count_emblem_holders(e.id).await?,
            None => 0,
        };

        let total_artworks = artworks.len() as i64;
        let artworks = artworks
            .into_iter()
            .map(|a| ArtworkStatistic {
                collected_count: counts.get(&a.id).copied().unwrap_or(0),
                artwork_id: a.id,
                name: a.name,
            })
            .collect();

        Ok(ExhibitionStatistics {
            exhibition_id: exhibition.id,
            exhibition_name: exhibition.name,
            total_artworks,
            collectors,
            emblem_id: emblem.map(|e| e.id),
            emblem_holders,
            artworks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Principal;
    use crate::models::{Artwork, Audit, Exhibition};
    use crate::repository::{
        MockArtworkRepositoryTrait, MockEmblemRepositoryTrait, MockExhibitionRepositoryTrait,
        MockMokadexRepositoryTrait,
    };

    fn service(
        exhibitions: MockExhibitionRepositoryTrait,
        artworks: MockArtworkRepositoryTrait,
        emblems: MockEmblemRepositoryTrait,
        mokadex: MockMokadexRepositoryTrait,
    ) -> ResearchService {
        ResearchService {
            exhibitions: Arc::new(exhibitions),
            artworks: Arc::new(artworks),
            emblems: Arc::new(emblems),
            mokadex: Arc::new(mokadex),
        }
    }

    fn artwork(id: i64) -> Artwork {
        Artwork {
            id,
            exhibition_id: 1,
            name: format!("Obra {id}"),
            author: None,
            description: None,
            qr_code: format!("QR-{id}"),
            image_id: None,
            image: None,
            audit: Audit::created("curator"),
        }
    }

    #[tokio::test]
    async fn test_statistics_requires_researcher() {
        let svc = service(
            MockExhibitionRepositoryTrait::new(),
            MockArtworkRepositoryTrait::new(),
            MockEmblemRepositoryTrait::new(),
            MockMokadexRepositoryTrait::new(),
        );
        let ctx = ServiceContext::for_principal(Principal::new(3, "curador", vec![
            RoleName::User,
            RoleName::Curator,
        ]));
        let result = svc.exhibition_statistics(&ctx, 1).await;
        assert!(matches!(result, Err(RokaMokaError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_statistics_fills_missing_counts_with_zero() {
        let mut exhibitions = MockExhibitionRepositoryTrait::new();
        exhibitions.expect_find_by_id().returning(|id| {
            Ok(Some(Exhibition {
                id,
                name: "Semana de 22".to_string(),
                description: None,
                start_date: None,
                end_date: None,
                location_id: None,
                image_id: None,
                image: None,
                audit: Audit::created("curator"),
            }))
        });
        let mut artworks = MockArtworkRepositoryTrait::new();
        artworks
            .expect_list_by_exhibition()
            .returning(|_| Ok(vec![artwork(1), artwork(2)]));
        let mut emblems = MockEmblemRepositoryTrait::new();
        emblems.expect_find_by_exhibition().returning(|_| Ok(None));
        let mut mokadex = MockMokadexRepositoryTrait::new();
        mokadex
            .expect_artwork_collection_counts()
            .returning(|_| Ok(vec![(1, 4)]));
        mokadex.expect_count_collectors().returning(|_| Ok(4));
        mokadex.expect_count_emblem_holders().never();

        let ctx = ServiceContext::for_principal(Principal::new(4, "pesquisa", vec![
            RoleName::Researcher,
        ]));
        let stats = service(exhibitions, artworks, emblems, mokadex)
            .exhibition_statistics(&ctx, 1)
            .await
            .unwrap();

        assert_eq!(stats.total_artworks, 2);
        assert_eq!(stats.collectors, 4);
        assert_eq!(stats.emblem_id, None);
        assert_eq!(stats.emblem_holders, 0);
        assert_eq!(stats.artworks[0].collected_count, 4);
        assert_eq!(stats.artworks[1].collected_count, 0);
    }
}
