//! 用户、角色与设备

use serde::{Deserialize, Serialize};

use super::audit::Audit;
use super::enums::{DevicePlatform, RoleName};

/// 用户账号
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub name: String,
    pub username: String,
    pub email: String,
    /// bcrypt 哈希，不对外序列化
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    /// 由仓储单独加载（usuario_papel）
    #[sqlx(skip)]
    #[serde(default)]
    pub roles: Vec<RoleName>,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub audit: Audit,
}

impl User {
    pub fn has_role(&self, role: RoleName) -> bool {
        self.roles.contains(&role)
    }
}

identity_eq!(User);

/// 新用户输入（密码已哈希）
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub roles: Vec<RoleName>,
}

/// 角色（papel 表）
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Role {
    pub id: i64,
    pub name: RoleName,
}

identity_eq!(Role);

/// 用户登记的移动设备
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: i64,
    pub user_id: i64,
    pub identifier: String,
    pub platform: DevicePlatform,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub audit: Audit,
}

identity_eq!(Device);
