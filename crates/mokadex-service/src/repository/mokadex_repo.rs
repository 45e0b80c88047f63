//! 收藏册仓储
//!
//! 集合写入使用 `ON CONFLICT DO NOTHING`，重复收集不会报错，通过影响行数判断是否新加入。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::traits::MokadexRepositoryTrait;
use crate::error::Result;
use crate::models::Mokadex;

#[derive(sqlx::FromRow)]
struct MokadexRow {
    id: i64,
    user_id: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// 收藏册仓储
pub struct MokadexRepository {
    pool: PgPool,
}

impl MokadexRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 加载展品与徽章集合，组装为领域对象
    async fn assemble(&self, row: MokadexRow) -> Result<Mokadex> {
        let artworks: Vec<i64> = sqlx::query_scalar(
            "SELECT artwork_id FROM mokadex_obra WHERE mokadex_id = $1",
        )
        .bind(row.id)
        .fetch_all(&self.pool)
        .await?;

        let emblems: Vec<i64> = sqlx::query_scalar(
            "SELECT emblem_id FROM mokadex_emblema WHERE mokadex_id = $1",
        )
        .bind(row.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Mokadex {
            id: row.id,
            user_id: row.user_id,
            artworks: artworks.into_iter().collect(),
            emblems: emblems.into_iter().collect(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }

    async fn touch(&self, mokadex_id: i64) -> Result<()> {
        sqlx::query("UPDATE mokadex SET updated_at = NOW() WHERE id = $1")
            .bind(mokadex_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl MokadexRepositoryTrait for MokadexRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Mokadex>> {
        let row = sqlx::query_as::<_, MokadexRow>(
            "SELECT id, user_id, created_at, updated_at FROM mokadex WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.assemble(row).await?)),
            None => Ok(None),
        }
    }

    async fn find_by_user(&self, user_id: i64) -> Result<Option<Mokadex>> {
        let row = sqlx::query_as::<_, MokadexRow>(
            "SELECT id, user_id, created_at, updated_at FROM mokadex WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.assemble(row).await?)),
            None => Ok(None),
        }
    }

    async fn get_or_create(&self, user_id: i64) -> Result<Mokadex> {
        // DO UPDATE 保证冲突时也能 RETURNING 已有行
        let row = sqlx::query_as::<_, MokadexRow>(
            r#"
            INSERT INTO mokadex (user_id)
            VALUES ($1)
            ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id
            RETURNING id, user_id, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        self.assemble(row).await
    }

    async fn add_artwork(&self, mokadex_id: i64, artwork_id: i64) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO mokadex_obra (mokadex_id, artwork_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(mokadex_id)
        .bind(artwork_id)
        .execute(&self.pool)
        .await?;

        let inserted = result.rows_affected() == 1;
        if inserted {
            self.touch(mokadex_id).await?;
        }
        Ok(inserted)
    }

    async fn add_emblem(&self, mokadex_id: i64, emblem_id: i64) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO mokadex_emblema (mokadex_id, emblem_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(mokadex_id)
        .bind(emblem_id)
        .execute(&self.pool)
        .await?;

        let inserted = result.rows_affected() == 1;
        if inserted {
            self.touch(mokadex_id).await?;
        }
        Ok(inserted)
    }

    async fn count_collected_in_exhibition(
        &self,
        mokadex_id: i64,
        exhibition_id: i64,
    ) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM mokadex_obra mo
            JOIN obra o ON o.id = mo.artwork_id
            WHERE mo.mokadex_id = $1 AND o.exhibition_id = $2
            "#,
        )
        .bind(mokadex_id)
        .bind(exhibition_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn count_collectors(&self, exhibition_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(DISTINCT mo.mokadex_id)
            FROM mokadex_obra mo
            JOIN obra o ON o.id = mo.artwork_id
            WHERE o.exhibition_id = $1
            "#,
        )
        .bind(exhibition_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn count_emblem_holders(&self, emblem_id: i64) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM mokadex_emblema WHERE emblem_id = $1")
                .bind(emblem_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    async fn artwork_collection_counts(&self, exhibition_id: i64) -> Result<Vec<(i64, i64)>> {
        let counts = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT o.id, COUNT(mo.mokadex_id)
            FROM obra o
            LEFT JOIN mokadex_obra mo ON mo.artwork_id = o.id
            WHERE o.exhibition_id = $1
            GROUP BY o.id
            ORDER BY o.id
            "#,
        )
        .bind(exhibition_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(counts)
    }
}
