//! 审计字段

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 审计信息，嵌入到用户、设备与目录类实体中
///
/// `created_by` / `updated_by` 由仓储层根据 `ServiceContext` 写入
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Audit {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(default)]
    pub created_by: Option<String>,
    #[sqlx(default)]
    pub updated_by: Option<String>,
}

impl Audit {
    /// 新建实体时的审计信息
    pub fn created(actor: &str) -> Self {
        let now = Utc::now();
        Self {
            created_at: now,
            updated_at: now,
            created_by: Some(actor.to_string()),
            updated_by: Some(actor.to_string()),
        }
    }

    /// 标记一次更新
    pub fn touch(&mut self, actor: &str) {
        self.updated_at = Utc::now();
        self.updated_by = Some(actor.to_string());
    }
}
