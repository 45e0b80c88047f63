//! 目录仓储：展览、展品、徽章、地点
//!
//! 图片存放在 imagem 表，随所属实体在同一事务中创建；查询后批量加载并挂到实体上。

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};

use super::traits::{
    ArtworkRepositoryTrait, EmblemRepositoryTrait, ExhibitionRepositoryTrait,
    LocationRepositoryTrait,
};
use crate::context::ServiceContext;
use crate::error::Result;
use crate::models::{
    Artwork, Emblem, Exhibition, Image, Location, NewArtwork, NewEmblem, NewExhibition, NewImage,
    NewLocation,
};

// ==================== 图片辅助 ====================

async fn insert_image(conn: &mut PgConnection, image: &NewImage) -> Result<Image> {
    let image = sqlx::query_as::<_, Image>(
        r#"
        INSERT INTO imagem (url, description)
        VALUES ($1, $2)
        RETURNING id, url, description
        "#,
    )
    .bind(&image.url)
    .bind(&image.description)
    .fetch_one(conn)
    .await?;

    Ok(image)
}

async fn delete_image(conn: &mut PgConnection, image_id: Option<i64>) -> Result<()> {
    if let Some(image_id) = image_id {
        sqlx::query("DELETE FROM imagem WHERE id = $1")
            .bind(image_id)
            .execute(conn)
            .await?;
    }
    Ok(())
}

/// 批量加载图片
async fn load_images(pool: &PgPool, ids: Vec<i64>) -> Result<HashMap<i64, Image>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let images = sqlx::query_as::<_, Image>(
        "SELECT id, url, description FROM imagem WHERE id = ANY($1)",
    )
    .bind(&ids)
    .fetch_all(pool)
    .await?;

    Ok(images.into_iter().map(|img| (img.id, img)).collect())
}

/// 为一组实体挂载图片
async fn attach_images<T, F, S>(pool: &PgPool, items: &mut [T], image_id: F, slot: S) -> Result<()>
where
    F: Fn(&T) -> Option<i64>,
    S: Fn(&mut T) -> &mut Option<Image>,
{
    let ids: Vec<i64> = items.iter().filter_map(&image_id).collect();
    let images = load_images(pool, ids).await?;
    for item in items.iter_mut() {
        if let Some(id) = image_id(item) {
            *slot(item) = images.get(&id).cloned();
        }
    }
    Ok(())
}

/// 更新时：提供了新图片则插入并返回新 ID，否则保持原图片
///
/// 旧图片由调用方在实体更新后删除
async fn replace_image(
    conn: &mut PgConnection,
    current: Option<i64>,
    new_image: Option<&NewImage>,
) -> Result<Option<i64>> {
    match new_image {
        Some(new_image) => Ok(Some(insert_image(conn, new_image).await?.id)),
        None => Ok(current),
    }
}

// ==================== 展览 ====================

const EXHIBITION_COLUMNS: &str = "id, name, description, start_date, end_date, location_id, \
     image_id, created_at, updated_at, created_by, updated_by";

/// 展览仓储
pub struct ExhibitionRepository {
    pool: PgPool,
}

impl ExhibitionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn with_images(&self, mut items: Vec<Exhibition>) -> Result<Vec<Exhibition>> {
        attach_images(&self.pool, &mut items, |e| e.image_id, |e| &mut e.image).await?;
        Ok(items)
    }

    async fn with_image(&self, item: Option<Exhibition>) -> Result<Option<Exhibition>> {
        Ok(self.with_images(item.into_iter().collect()).await?.pop())
    }
}

#[async_trait]
impl ExhibitionRepositoryTrait for ExhibitionRepository {
    async fn list(&self) -> Result<Vec<Exhibition>> {
        let items = sqlx::query_as::<_, Exhibition>(&format!(
            "SELECT {EXHIBITION_COLUMNS} FROM exposicao ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;

        self.with_images(items).await
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Exhibition>> {
        let item = sqlx::query_as::<_, Exhibition>(&format!(
            "SELECT {EXHIBITION_COLUMNS} FROM exposicao WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        self.with_image(item).await
    }

    async fn exists(&self, id: i64) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM exposicao WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn create(
        &self,
        ctx: &ServiceContext,
        exhibition: &NewExhibition,
    ) -> Result<Exhibition> {
        let actor = ctx.actor();
        let mut tx = self.pool.begin().await?;

        let image_id = match &exhibition.image {
            Some(image) => Some(insert_image(&mut tx, image).await?.id),
            None => None,
        };

        let created = sqlx::query_as::<_, Exhibition>(&format!(
            r#"
            INSERT INTO exposicao (name, description, start_date, end_date, location_id,
                                   image_id, created_by, updated_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            RETURNING {EXHIBITION_COLUMNS}
            "#
        ))
        .bind(&exhibition.name)
        .bind(&exhibition.description)
        .bind(exhibition.start_date)
        .bind(exhibition.end_date)
        .bind(exhibition.location_id)
        .bind(image_id)
        .bind(&actor)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        self.with_image(Some(created))
            .await?
            .ok_or_else(|| crate::error::RokaMokaError::Internal("展览创建后丢失".to_string()))
    }

    async fn update(
        &self,
        ctx: &ServiceContext,
        id: i64,
        exhibition: &NewExhibition,
    ) -> Result<Option<Exhibition>> {
        let actor = ctx.actor();
        let mut tx = self.pool.begin().await?;

        let current: Option<Option<i64>> =
            sqlx::query_scalar("SELECT image_id FROM exposicao WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(current_image) = current else {
            return Ok(None);
        };

        let image_id = replace_image(&mut tx, current_image, exhibition.image.as_ref()).await?;

        let updated = sqlx::query_as::<_, Exhibition>(&format!(
            r#"
            UPDATE exposicao
            SET name = $2, description = $3, start_date = $4, end_date = $5,
                location_id = $6, image_id = $7, updated_by = $8, updated_at = NOW()
            WHERE id = $1
            RETURNING {EXHIBITION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&exhibition.name)
        .bind(&exhibition.description)
        .bind(exhibition.start_date)
        .bind(exhibition.end_date)
        .bind(exhibition.location_id)
        .bind(image_id)
        .bind(&actor)
        .fetch_optional(&mut *tx)
        .await?;

        if image_id != current_image {
            delete_image(&mut tx, current_image).await?;
        }

        tx.commit().await?;
        self.with_image(updated).await
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let deleted: Option<Option<i64>> =
            sqlx::query_scalar("DELETE FROM exposicao WHERE id = $1 RETURNING image_id")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        let found = deleted.is_some();
        if let Some(image_id) = deleted {
            delete_image(&mut tx, image_id).await?;
        }

        tx.commit().await?;
        Ok(found)
    }
}

// ==================== 展品 ====================

const ARTWORK_COLUMNS: &str = "id, exhibition_id, name, author, description, qr_code, image_id, \
     created_at, updated_at, created_by, updated_by";

/// 展品仓储
pub struct ArtworkRepository {
    pool: PgPool,
}

impl ArtworkRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn with_images(&self, mut items: Vec<Artwork>) -> Result<Vec<Artwork>> {
        attach_images(&self.pool, &mut items, |a| a.image_id, |a| &mut a.image).await?;
        Ok(items)
    }

    async fn with_image(&self, item: Option<Artwork>) -> Result<Option<Artwork>> {
        Ok(self.with_images(item.into_iter().collect()).await?.pop())
    }
}

#[async_trait]
impl ArtworkRepositoryTrait for ArtworkRepository {
    async fn list(&self) -> Result<Vec<Artwork>> {
        let items = sqlx::query_as::<_, Artwork>(&format!(
            "SELECT {ARTWORK_COLUMNS} FROM obra ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;

        self.with_images(items).await
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Artwork>> {
        let item = sqlx::query_as::<_, Artwork>(&format!(
            "SELECT {ARTWORK_COLUMNS} FROM obra WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        self.with_image(item).await
    }

    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Artwork>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let items = sqlx::query_as::<_, Artwork>(&format!(
            "SELECT {ARTWORK_COLUMNS} FROM obra WHERE id = ANY($1) ORDER BY id"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        self.with_images(items).await
    }

    async fn find_by_qr_code(&self, qr_code: &str) -> Result<Option<Artwork>> {
        let item = sqlx::query_as::<_, Artwork>(&format!(
            "SELECT {ARTWORK_COLUMNS} FROM obra WHERE qr_code = $1"
        ))
        .bind(qr_code)
        .fetch_optional(&self.pool)
        .await?;

        self.with_image(item).await
    }

    async fn list_by_exhibition(&self, exhibition_id: i64) -> Result<Vec<Artwork>> {
        let items = sqlx::query_as::<_, Artwork>(&format!(
            "SELECT {ARTWORK_COLUMNS} FROM obra WHERE exhibition_id = $1 ORDER BY id"
        ))
        .bind(exhibition_id)
        .fetch_all(&self.pool)
        .await?;

        self.with_images(items).await
    }

    async fn count_by_exhibition(&self, exhibition_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM obra WHERE exhibition_id = $1")
            .bind(exhibition_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn create(&self, ctx: &ServiceContext, artwork: &NewArtwork) -> Result<Artwork> {
        let actor = ctx.actor();
        let mut tx = self.pool.begin().await?;

        let image_id = match &artwork.image {
            Some(image) => Some(insert_image(&mut tx, image).await?.id),
            None => None,
        };

        let created = sqlx::query_as::<_, Artwork>(&format!(
            r#"
            INSERT INTO obra (exhibition_id, name, author, description, qr_code, image_id,
                              created_by, updated_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            RETURNING {ARTWORK_COLUMNS}
            "#
        ))
        .bind(artwork.exhibition_id)
        .bind(&artwork.name)
        .bind(&artwork.author)
        .bind(&artwork.description)
        .bind(&artwork.qr_code)
        .bind(image_id)
        .bind(&actor)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        self.with_image(Some(created))
            .await?
            .ok_or_else(|| crate::error::RokaMokaError::Internal("展品创建后丢失".to_string()))
    }

    async fn update(
        &self,
        ctx: &ServiceContext,
        id: i64,
        artwork: &NewArtwork,
    ) -> Result<Option<Artwork>> {
        let actor = ctx.actor();
        let mut tx = self.pool.begin().await?;

        let current: Option<Option<i64>> =
            sqlx::query_scalar("SELECT image_id FROM obra WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(current_image) = current else {
            return Ok(None);
        };

        let image_id = replace_image(&mut tx, current_image, artwork.image.as_ref()).await?;

        let updated = sqlx::query_as::<_, Artwork>(&format!(
            r#"
            UPDATE obra
            SET exhibition_id = $2, name = $3, author = $4, description = $5, qr_code = $6,
                image_id = $7, updated_by = $8, updated_at = NOW()
            WHERE id = $1
            RETURNING {ARTWORK_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(artwork.exhibition_id)
        .bind(&artwork.name)
        .bind(&artwork.author)
        .bind(&artwork.description)
        .bind(&artwork.qr_code)
        .bind(image_id)
        .bind(&actor)
        .fetch_optional(&mut *tx)
        .await?;

        if image_id != current_image {
            delete_image(&mut tx, current_image).await?;
        }

        tx.commit().await?;
        self.with_image(updated).await
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let deleted: Option<Option<i64>> =
            sqlx::query_scalar("DELETE FROM obra WHERE id = $1 RETURNING image_id")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        let found = deleted.is_some();
        if let Some(image_id) = deleted {
            delete_image(&mut tx, image_id).await?;
        }

        tx.commit().await?;
        Ok(found)
    }
}

// ==================== 徽章 ====================

const EMBLEM_COLUMNS: &str = "id, exhibition_id, name, description, image_id, \
     created_at, updated_at, created_by, updated_by";

/// 徽章仓储
pub struct EmblemRepository {
    pool: PgPool,
}

impl EmblemRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn with_images(&self, mut items: Vec<Emblem>) -> Result<Vec<Emblem>> {
        attach_images(&self.pool, &mut items, |e| e.image_id, |e| &mut e.image).await?;
        Ok(items)
    }

    async fn with_image(&self, item: Option<Emblem>) -> Result<Option<Emblem>> {
        Ok(self.with_images(item.into_iter().collect()).await?.pop())
    }
}

#[async_trait]
impl EmblemRepositoryTrait for EmblemRepository {
    async fn list(&self) -> Result<Vec<Emblem>> {
        let items = sqlx::query_as::<_, Emblem>(&format!(
            "SELECT {EMBLEM_COLUMNS} FROM emblema ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;

        self.with_images(items).await
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Emblem>> {
        let item = sqlx::query_as::<_, Emblem>(&format!(
            "SELECT {EMBLEM_COLUMNS} FROM emblema WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        self.with_image(item).await
    }

    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Emblem>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let items = sqlx::query_as::<_, Emblem>(&format!(
            "SELECT {EMBLEM_COLUMNS} FROM emblema WHERE id = ANY($1) ORDER BY id"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        self.with_images(items).await
    }

    async fn find_by_exhibition(&self, exhibition_id: i64) -> Result<Option<Emblem>> {
        let item = sqlx::query_as::<_, Emblem>(&format!(
            "SELECT {EMBLEM_COLUMNS} FROM emblema WHERE exhibition_id = $1"
        ))
        .bind(exhibition_id)
        .fetch_optional(&self.pool)
        .await?;

        self.with_image(item).await
    }

    async fn create(&self, ctx: &ServiceContext, emblem: &NewEmblem) -> Result<Emblem> {
        let actor = ctx.actor();
        let mut tx = self.pool.begin().await?;

        let image_id = match &emblem.image {
            Some(image) => Some(insert_image(&mut tx, image).await?.id),
            None => None,
        };

        // exhibition_id 上的唯一约束保证一个展览最多一个徽章
        let created = sqlx::query_as::<_, Emblem>(&format!(
            r#"
            INSERT INTO emblema (exhibition_id, name, description, image_id, created_by, updated_by)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING {EMBLEM_COLUMNS}
            "#
        ))
        .bind(emblem.exhibition_id)
        .bind(&emblem.name)
        .bind(&emblem.description)
        .bind(image_id)
        .bind(&actor)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        self.with_image(Some(created))
            .await?
            .ok_or_else(|| crate::error::RokaMokaError::Internal("徽章创建后丢失".to_string()))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let deleted: Option<Option<i64>> =
            sqlx::query_scalar("DELETE FROM emblema WHERE id = $1 RETURNING image_id")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        let found = deleted.is_some();
        if let Some(image_id) = deleted {
            delete_image(&mut tx, image_id).await?;
        }

        tx.commit().await?;
        Ok(found)
    }
}

// ==================== 地点 ====================

const LOCATION_COLUMNS: &str = "id, name, street, number, complement, district, city, state, \
     country, postal_code, created_at, updated_at, created_by, updated_by";

/// 地点仓储
pub struct LocationRepository {
    pool: PgPool,
}

impl LocationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LocationRepositoryTrait for LocationRepository {
    async fn list(&self) -> Result<Vec<Location>> {
        let items = sqlx::query_as::<_, Location>(&format!(
            "SELECT {LOCATION_COLUMNS} FROM localizacao ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Location>> {
        let item = sqlx::query_as::<_, Location>(&format!(
            "SELECT {LOCATION_COLUMNS} FROM localizacao WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(item)
    }

    async fn create(&self, ctx: &ServiceContext, location: &NewLocation) -> Result<Location> {
        let address = &location.address;
        let created = sqlx::query_as::<_, Location>(&format!(
            r#"
            INSERT INTO localizacao (name, street, number, complement, district, city, state,
                                     country, postal_code, created_by, updated_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)
            RETURNING {LOCATION_COLUMNS}
            "#
        ))
        .bind(&location.name)
        .bind(&address.street)
        .bind(&address.number)
        .bind(&address.complement)
        .bind(&address.district)
        .bind(&address.city)
        .bind(&address.state)
        .bind(&address.country)
        .bind(&address.postal_code)
        .bind(ctx.actor())
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn update(
        &self,
        ctx: &ServiceContext,
        id: i64,
        location: &NewLocation,
    ) -> Result<Option<Location>> {
        let address = &location.address;
        let updated = sqlx::query_as::<_, Location>(&format!(
            r#"
            UPDATE localizacao
            SET name = $2, street = $3, number = $4, complement = $5, district = $6,
                city = $7, state = $8, country = $9, postal_code = $10,
                updated_by = $11, updated_at = NOW()
            WHERE id = $1
            RETURNING {LOCATION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&location.name)
        .bind(&address.street)
        .bind(&address.number)
        .bind(&address.complement)
        .bind(&address.district)
        .bind(&address.city)
        .bind(&address.state)
        .bind(&address.country)
        .bind(&address.postal_code)
        .bind(ctx.actor())
        .fetch_optional(&self.pool)
        .await?;
        Ok(updated)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM localizacao WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
