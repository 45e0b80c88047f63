//! 服务调用上下文
//!
//! 每个请求（或每条消息）构造一个 `ServiceContext`，沿调用链显式传递，
//! 携带执行 ID、开始时间和当前调用者。

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{Result, RokaMokaError};
use crate::models::RoleName;

/// 已认证的调用者
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: i64,
    pub username: String,
    pub roles: Vec<RoleName>,
}

impl Principal {
    pub fn new(user_id: i64, username: impl Into<String>, roles: Vec<RoleName>) -> Self {
        Self {
            user_id,
            username: username.into(),
            roles,
        }
    }

    pub fn has_role(&self, role: RoleName) -> bool {
        self.roles.contains(&role)
    }

    pub fn has_any_role(&self, roles: &[RoleName]) -> bool {
        roles.iter().any(|r| self.has_role(*r))
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(RoleName::Admin)
    }
}

/// 单次调用的执行上下文
#[derive(Debug, Clone)]
pub struct ServiceContext {
    pub execution_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub principal: Option<Principal>,
}

impl Default for ServiceContext {
    fn default() -> Self {
        Self::new(Uuid::new_v4(), Utc::now())
    }
}

impl ServiceContext {
    /// 匿名上下文
    pub fn new(execution_id: Uuid, started_at: DateTime<Utc>) -> Self {
        Self {
            execution_id,
            started_at,
            principal: None,
        }
    }

    /// 后台任务（如消息消费）使用的系统上下文
    pub fn system() -> Self {
        Self::default()
    }

    /// 指定调用者的上下文
    pub fn for_principal(principal: Principal) -> Self {
        Self::default().with_principal(principal)
    }

    pub fn with_principal(mut self, principal: Principal) -> Self {
        self.principal = Some(principal);
        self
    }

    /// 要求已认证
    pub fn require_user(&self) -> Result<&Principal> {
        self.principal
            .as_ref()
            .ok_or_else(|| RokaMokaError::Unauthorized("需要登录".to_string()))
    }

    /// 要求已认证且至少持有其中一个角色
    pub fn require_any_role(&self, roles: &[RoleName]) -> Result<&Principal> {
        let principal = self.require_user()?;
        if principal.has_any_role(roles) {
            Ok(principal)
        } else {
            let expected: Vec<&str> = roles.iter().map(RoleName::as_str).collect();
            Err(RokaMokaError::Forbidden(format!(
                "需要以下角色之一: {}",
                expected.join(", ")
            )))
        }
    }

    /// 审计字段中记录的操作人
    pub fn actor(&self) -> String {
        self.principal
            .as_ref()
            .map(|p| p.username.clone())
            .unwrap_or_else(|| "system".to_string())
    }
}
