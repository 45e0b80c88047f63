//! 枚举类型定义
//!
//! 所有枚举都支持数据库（sqlx，以 varchar 存储）和 JSON（serde）序列化

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// 角色名称
///
/// 新注册用户默认只有 `User`，`Curator`/`Researcher` 需通过权限申请获得
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoleName {
    /// 普通参观者
    User,
    /// 策展人，可维护展览、展品、徽章
    Curator,
    /// 研究员，可查看展览统计
    Researcher,
    /// 管理员，审批权限申请
    Admin,
}

impl RoleName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Curator => "CURATOR",
            Self::Researcher => "RESEARCHER",
            Self::Admin => "ADMIN",
        }
    }

    /// 是否可以通过权限申请获得
    pub fn is_requestable(&self) -> bool {
        matches!(self, Self::Curator | Self::Researcher)
    }
}

impl fmt::Display for RoleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoleName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "USER" => Ok(Self::User),
            "CURATOR" => Ok(Self::Curator),
            "RESEARCHER" => Ok(Self::Researcher),
            "ADMIN" => Ok(Self::Admin),
            other => Err(format!("未知角色: {other}")),
        }
    }
}

/// 权限申请状态
///
/// PENDING 只能转为 CONFIRM 或 DENY，后两者为终态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PermissionStatus {
    #[default]
    Pending,
    Confirm,
    Deny,
}

impl PermissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirm => "CONFIRM",
            Self::Deny => "DENY",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for PermissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PermissionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "CONFIRM" => Ok(Self::Confirm),
            "DENY" => Ok(Self::Deny),
            other => Err(format!("未知申请状态: {other}")),
        }
    }
}

/// 设备平台
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DevicePlatform {
    Android,
    Ios,
    Web,
}

impl DevicePlatform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Android => "ANDROID",
            Self::Ios => "IOS",
            Self::Web => "WEB",
        }
    }
}

impl FromStr for DevicePlatform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ANDROID" => Ok(Self::Android),
            "IOS" => Ok(Self::Ios),
            "WEB" => Ok(Self::Web),
            other => Err(format!("未知设备平台: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_name_serialization() {
        assert_eq!(
            serde_json::to_string(&RoleName::Researcher).unwrap(),
            "\"RESEARCHER\""
        );
        let role: RoleName = serde_json::from_str("\"CURATOR\"").unwrap();
        assert_eq!(role, RoleName::Curator);
    }

    #[test]
    fn test_role_name_from_str_case_insensitive() {
        assert_eq!("admin".parse::<RoleName>().unwrap(), RoleName::Admin);
        assert_eq!(" Curator ".parse::<RoleName>().unwrap(), RoleName::Curator);
        assert!("ROOT".parse::<RoleName>().is_err());
    }

    #[test]
    fn test_requestable_roles() {
        assert!(RoleName::Curator.is_requestable());
        assert!(RoleName::Researcher.is_requestable());
        assert!(!RoleName::Admin.is_requestable());
        assert!(!RoleName::User.is_requestable());
    }

    #[test]
    fn test_permission_status_terminal() {
        assert!(!PermissionStatus::Pending.is_terminal());
        assert!(PermissionStatus::Confirm.is_terminal());
        assert!(PermissionStatus::Deny.is_terminal());
        assert_eq!(PermissionStatus::default(), PermissionStatus::Pending);
    }

    #[test]
    fn test_device_platform_from_str() {
        assert_eq!("ios".parse::<DevicePlatform>().unwrap(), DevicePlatform::Ios);
        assert!("symbian".parse::<DevicePlatform>().is_err());
    }
}
