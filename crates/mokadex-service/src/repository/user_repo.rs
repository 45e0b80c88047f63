//! 用户与设备仓储

use async_trait::async_trait;
use sqlx::PgPool;

use super::traits::{DeviceRepositoryTrait, UserRepositoryTrait};
use crate::context::ServiceContext;
use crate::error::Result;
use crate::models::{Device, DevicePlatform, NewUser, Role, RoleName, User};

const USER_COLUMNS: &str =
    "id, name, username, email, password_hash, created_at, updated_at, created_by, updated_by";

/// 用户仓储
///
/// 角色存放在 usuario_papel 关联表中，查询用户时一并加载
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_roles(&self, user_id: i64) -> Result<Vec<RoleName>> {
        let roles = sqlx::query_as::<_, Role>(
            r#"
            SELECT p.id, p.name
            FROM papel p
            JOIN usuario_papel up ON up.role_id = p.id
            WHERE up.user_id = $1
            ORDER BY p.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(roles.into_iter().map(|r| r.name).collect())
    }

    async fn with_roles(&self, user: Option<User>) -> Result<Option<User>> {
        match user {
            Some(mut user) => {
                user.roles = self.load_roles(user.id).await?;
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl UserRepositoryTrait for UserRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM usuario WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        self.with_roles(user).await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM usuario WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        self.with_roles(user).await
    }

    async fn exists_by_username(&self, username: &str) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM usuario WHERE username = $1)")
                .bind(username)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM usuario WHERE LOWER(email) = LOWER($1))",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn create(&self, ctx: &ServiceContext, new_user: &NewUser) -> Result<User> {
        let actor = ctx.actor();
        let mut tx = self.pool.begin().await?;

        let mut user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO usuario (name, username, email, password_hash, created_by, updated_by)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new_user.name)
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(&actor)
        .fetch_one(&mut *tx)
        .await?;

        let role_names: Vec<String> = new_user
            .roles
            .iter()
            .map(|r| r.as_str().to_string())
            .collect();

        sqlx::query(
            r#"
            INSERT INTO usuario_papel (user_id, role_id)
            SELECT $1, id FROM papel WHERE name = ANY($2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(user.id)
        .bind(&role_names)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        user.roles = new_user.roles.clone();
        Ok(user)
    }

    async fn update_password(
        &self,
        ctx: &ServiceContext,
        user_id: i64,
        password_hash: &str,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE usuario
            SET password_hash = $2, updated_by = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(password_hash)
        .bind(ctx.actor())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn add_role(&self, user_id: i64, role: RoleName) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO usuario_papel (user_id, role_id)
            SELECT $1, id FROM papel WHERE name = $2
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(role)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

const DEVICE_COLUMNS: &str =
    "id, user_id, identifier, platform, created_at, updated_at, created_by, updated_by";

/// 设备仓储
pub struct DeviceRepository {
    pool: PgPool,
}

impl DeviceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeviceRepositoryTrait for DeviceRepository {
    async fn upsert(
        &self,
        ctx: &ServiceContext,
        user_id: i64,
        identifier: &str,
        platform: DevicePlatform,
    ) -> Result<Device> {
        let device = sqlx::query_as::<_, Device>(&format!(
            r#"
            INSERT INTO dispositivo (user_id, identifier, platform, created_by, updated_by)
            VALUES ($1, $2, $3, $4, $4)
            ON CONFLICT (identifier) DO UPDATE SET
                user_id = EXCLUDED.user_id,
                platform = EXCLUDED.platform,
                updated_by = EXCLUDED.updated_by,
                updated_at = NOW()
            RETURNING {DEVICE_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(identifier)
        .bind(platform)
        .bind(ctx.actor())
        .fetch_one(&self.pool)
        .await?;

        Ok(device)
    }

    async fn list_by_user(&self, user_id: i64) -> Result<Vec<Device>> {
        let devices = sqlx::query_as::<_, Device>(&format!(
            "SELECT {DEVICE_COLUMNS} FROM dispositivo WHERE user_id = $1 ORDER BY id"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(devices)
    }
}
