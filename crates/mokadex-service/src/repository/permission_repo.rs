//! 权限申请仓储
//!
//! 同一用户同一角色最多一条 PENDING 申请，由部分唯一索引 `uk_solicitacao_pending` 兜底。
//! 审批通过带 `status = 'PENDING'` 条件的更新实现，并发审批只有一方成功。

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;

use super::traits::PermissionRepositoryTrait;
use crate::error::Result;
use crate::models::{PermissionRequest, PermissionReview, PermissionStatus, RoleName};

const REQUEST_COLUMNS: &str = "id, user_id, role, status, created_at, updated_at";
const REVIEW_COLUMNS: &str = "id, request_id, reviewer_id, decision, justification, created_at";

/// 权限申请仓储
pub struct PermissionRepository {
    pool: PgPool,
}

impl PermissionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_review(&self, request_id: i64) -> Result<Option<PermissionReview>> {
        let review = sqlx::query_as::<_, PermissionReview>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM registro_solicitacao WHERE request_id = $1"
        ))
        .bind(request_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(review)
    }
}

#[async_trait]
impl PermissionRepositoryTrait for PermissionRepository {
    async fn create(&self, user_id: i64, role: RoleName) -> Result<PermissionRequest> {
        let request = sqlx::query_as::<_, PermissionRequest>(&format!(
            r#"
            INSERT INTO solicitacao (user_id, role, status)
            VALUES ($1, $2, 'PENDING')
            RETURNING {REQUEST_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(role)
        .fetch_one(&self.pool)
        .await?;

        Ok(request)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<PermissionRequest>> {
        let request = sqlx::query_as::<_, PermissionRequest>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM solicitacao WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match request {
            Some(mut request) => {
                if !request.is_pending() {
                    request.review = self.find_review(request.id).await?;
                }
                Ok(Some(request))
            }
            None => Ok(None),
        }
    }

    async fn exists_pending(&self, user_id: i64, role: RoleName) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM solicitacao
                WHERE user_id = $1 AND role = $2 AND status = 'PENDING'
            )
            "#,
        )
        .bind(user_id)
        .bind(role)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn list_pending(&self) -> Result<Vec<PermissionRequest>> {
        let requests = sqlx::query_as::<_, PermissionRequest>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM solicitacao WHERE status = 'PENDING' ORDER BY created_at, id"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(requests)
    }

    async fn list_by_user(&self, user_id: i64) -> Result<Vec<PermissionRequest>> {
        let requests = sqlx::query_as::<_, PermissionRequest>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM solicitacao WHERE user_id = $1 ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(requests)
    }

    async fn decide(
        &self,
        request_id: i64,
        reviewer_id: i64,
        decision: PermissionStatus,
        justification: &str,
    ) -> Result<Option<PermissionRequest>> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query_as::<_, PermissionRequest>(&format!(
            r#"
            UPDATE solicitacao
            SET status = $2, updated_at = NOW()
            WHERE id = $1 AND status = 'PENDING'
            RETURNING {REQUEST_COLUMNS}
            "#
        ))
        .bind(request_id)
        .bind(decision)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(mut request) = updated else {
            tx.rollback().await?;
            return Ok(None);
        };

        let review = sqlx::query_as::<_, PermissionReview>(&format!(
            r#"
            INSERT INTO registro_solicitacao (request_id, reviewer_id, decision, justification)
            VALUES ($1, $2, $3, $4)
            RETURNING {REVIEW_COLUMNS}
            "#
        ))
        .bind(request_id)
        .bind(reviewer_id)
        .bind(decision)
        .bind(justification)
        .fetch_one(&mut *tx)
        .await?;

        if decision == PermissionStatus::Confirm {
            sqlx::query(
                r#"
                INSERT INTO usuario_papel (user_id, role_id)
                SELECT $1, id FROM papel WHERE name = $2
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(request.user_id)
            .bind(request.role)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(
            request_id,
            reviewer_id,
            decision = %decision,
            role = %request.role,
            "权限申请已审批"
        );

        request.review = Some(review);
        Ok(Some(request))
    }
}
