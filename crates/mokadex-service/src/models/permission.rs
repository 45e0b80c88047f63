//! 权限申请与审批记录

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::{PermissionStatus, RoleName};

/// 角色提升申请（solicitacao 表）
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PermissionRequest {
    pub id: i64,
    pub user_id: i64,
    pub role: RoleName,
    pub status: PermissionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// 已审批时的审批记录
    #[sqlx(skip)]
    pub review: Option<PermissionReview>,
}

identity_eq!(PermissionRequest);

impl PermissionRequest {
    pub fn is_pending(&self) -> bool {
        self.status == PermissionStatus::Pending
    }
}

/// 审批记录（registro_solicitacao 表），与申请一一对应
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PermissionReview {
    pub id: i64,
    pub request_id: i64,
    pub reviewer_id: i64,
    pub decision: PermissionStatus,
    pub justification: String,
    pub created_at: DateTime<Utc>,
}

identity_eq!(PermissionReview);
