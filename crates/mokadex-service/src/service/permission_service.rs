//! 权限申请服务
//!
//! 用户申请 CURATOR / RESEARCHER 角色，管理员审批。
//!
//! 状态机：PENDING -> CONFIRM | DENY，终态不可再变。
//! 审批在一个事务内完成状态变更、审批记录写入和角色授予。

use std::sync::Arc;

use tracing::{info, instrument};

use rokamoka_shared::observability::metrics;

use crate::context::ServiceContext;
use crate::error::{Result, RokaMokaError};
use crate::models::{PermissionRequest, PermissionStatus, RoleName};
use crate::repository::{PermissionRepositoryTrait, Repositories, UserRepositoryTrait};

/// 审批意见最大长度
const MAX_JUSTIFICATION_LEN: usize = 500;

/// 权限申请服务
pub struct PermissionService {
    users: Arc<dyn UserRepositoryTrait>,
    permissions: Arc<dyn PermissionRepositoryTrait>,
}

impl PermissionService {
    pub fn new(repos: &Repositories) -> Self {
        Self {
            users: repos.users.clone(),
            permissions: repos.permissions.clone(),
        }
    }

    /// 当前用户申请目标角色
    #[instrument(skip(self, ctx), fields(execution_id = %ctx.execution_id))]
    pub async fn create_request(
        &self,
        ctx: &ServiceContext,
        role: RoleName,
    ) -> Result<PermissionRequest> {
        let principal = ctx.require_user()?;

        if !role.is_requestable() {
            return Err(RokaMokaError::Validation(format!(
                "角色 {role} 不可申请，仅支持 CURATOR 或 RESEARCHER"
            )));
        }

        // 以数据库中的角色为准，token 中的角色可能已过期
        let user = self
            .users
            .find_by_id(principal.user_id)
            .await?
            .ok_or_else(|| RokaMokaError::not_found("用户", principal.user_id))?;

        if user.has_role(role) {
            return Err(RokaMokaError::ContentDuplicated(format!(
                "用户已持有角色 {role}"
            )));
        }

        if self.permissions.exists_pending(user.id, role).await? {
            return Err(RokaMokaError::ContentDuplicated(format!(
                "已存在待审批的 {role} 申请"
            )));
        }

        let request = self.permissions.create(user.id, role).await?;
        info!(request_id = request.id, user_id = user.id, role = %role, "权限申请已创建");
        Ok(request)
    }

    /// 通过申请并授予目标角色
    pub async fn accept(
        &self,
        ctx: &ServiceContext,
        request_id: i64,
        justification: &str,
    ) -> Result<PermissionRequest> {
        self.decide(ctx, request_id, PermissionStatus::Confirm, justification)
            .await
    }

    /// 拒绝申请
    pub async fn deny(
        &self,
        ctx: &ServiceContext,
        request_id: i64,
        justification: &str,
    ) -> Result<PermissionRequest> {
        self.decide(ctx, request_id, PermissionStatus::Deny, justification)
            .await
    }

    #[instrument(skip(self, ctx, justification), fields(execution_id = %ctx.execution_id))]
    async fn decide(
        &self,
        ctx: &ServiceContext,
        request_id: i64,
        decision: PermissionStatus,
        justification: &str,
    ) -> Result<PermissionRequest> {
        let reviewer = ctx.require_any_role(&[RoleName::Admin])?;

        let request = self
            .permissions
            .find_by_id(request_id)
            .await?
            .ok_or_else(|| RokaMokaError::not_found("权限申请", request_id))?;

        if !request.is_pending() {
            return Err(RokaMokaError::Forbidden(format!(
                "申请 {} 已处理，当前状态 {}",
                request_id, request.status
            )));
        }

        if request.user_id == reviewer.user_id {
            return Err(RokaMokaError::Forbidden(
                "不能审批自己的申请".to_string(),
            ));
        }

        let justification = justification.trim();
        if justification.is_empty() {
            return Err(RokaMokaError::Validation("审批意见不能为空".to_string()));
        }
        if justification.chars().count() > MAX_JUSTIFICATION_LEN {
            return Err(RokaMokaError::Validation(format!(
                "审批意见不能超过 {MAX_JUSTIFICATION_LEN} 个字符"
            )));
        }

        // 条件更新失败说明已被并发审批
        let decided = self
            .permissions
            .decide(request_id, reviewer.user_id, decision, justification)
            .await?
            .ok_or_else(|| {
                RokaMokaError::Forbidden(format!("申请 {request_id} 已被其他管理员处理"))
            })?;

        metrics::record_permission_decision(decision.as_str());
        info!(
            request_id,
            reviewer_id = reviewer.user_id,
            decision = %decision,
            "权限申请审批完成"
        );
        Ok(decided)
    }

    /// 所有待审批申请（管理员）
    #[instrument(skip(self, ctx), fields(execution_id = %ctx.execution_id))]
    pub async fn list_pending(&self, ctx: &ServiceContext) -> Result<Vec<PermissionRequest>> {
        ctx.require_any_role(&[RoleName::Admin])?;
        self.permissions.list_pending().await
    }

    /// 当前用户的全部申请
    #[instrument(skip(self, ctx), fields(execution_id = %ctx.execution_id))]
    pub async fn list_mine(&self, ctx: &ServiceContext) -> Result<Vec<PermissionRequest>> {
        let principal = ctx.require_user()?;
        self.permissions.list_by_user(principal.user_id).await
    }

    /// 查询单个申请，仅申请人或管理员可见
    #[instrument(skip(self, ctx), fields(execution_id = %ctx.execution_id))]
    pub async fn get_request(
        &self,
        ctx: &ServiceContext,
        request_id: i64,
    ) -> Result<PermissionRequest> {
        let principal = ctx.require_user()?;

        let request = self
            .permissions
            .find_by_id(request_id)
            .await?
            .ok_or_else(|| RokaMokaError::not_found("权限申请", request_id))?;

        if request.user_id != principal.user_id && !principal.is_admin() {
            return Err(RokaMokaError::Forbidden("无权查看该申请".to_string()));
        }
        Ok(request)
    }
}
