//! 账号服务
//!
//! 注册、登录校验、自助重置密码、设备登记，以及启动时创建管理员账号。

use std::sync::Arc;

use tracing::{info, instrument, warn};

use rokamoka_shared::config::BootstrapAdminConfig;

use crate::context::ServiceContext;
use crate::error::{Result, RokaMokaError};
use crate::models::{Device, DevicePlatform, NewUser, RoleName, User};
use crate::password::{DEFAULT_COST, hash_password, verify_password};
use crate::repository::{DeviceRepositoryTrait, Repositories, UserRepositoryTrait};
use crate::service::dto::NewAccount;

const MIN_PASSWORD_LEN: usize = 6;
/// bcrypt 只使用前 72 字节
const MAX_PASSWORD_LEN: usize = 72;

/// 账号服务
pub struct AccountService {
    users: Arc<dyn UserRepositoryTrait>,
    devices: Arc<dyn DeviceRepositoryTrait>,
    bcrypt_cost: u32,
}

impl AccountService {
    pub fn new(repos: &Repositories) -> Self {
        Self::with_bcrypt_cost(repos, DEFAULT_COST)
    }

    /// 指定 bcrypt cost（测试中使用较低的 cost 加速）
    pub fn with_bcrypt_cost(repos: &Repositories, bcrypt_cost: u32) -> Self {
        Self {
            users: repos.users.clone(),
            devices: repos.devices.clone(),
            bcrypt_cost,
        }
    }

    /// 注册新用户，默认角色 USER
    #[instrument(skip(self, ctx, account), fields(execution_id = %ctx.execution_id, username = %account.username))]
    pub async fn register(&self, ctx: &ServiceContext, account: NewAccount) -> Result<User> {
        let account = normalize_account(account);
        validate_account(&account)?;

        if self.users.exists_by_username(&account.username).await? {
            return Err(RokaMokaError::ContentDuplicated(format!(
                "用户名已被占用: {}",
                account.username
            )));
        }
        if self.users.exists_by_email(&account.email).await? {
            return Err(RokaMokaError::ContentDuplicated(format!(
                "邮箱已被注册: {}",
                account.email
            )));
        }

        let password_hash = hash_password(&account.password, self.bcrypt_cost)?;
        let user = self
            .users
            .create(
                ctx,
                &NewUser {
                    name: account.name,
                    username: account.username,
                    email: account.email,
                    password_hash,
                    roles: vec![RoleName::User],
                },
            )
            .await?;

        info!(user_id = user.id, "用户注册成功");
        Ok(user)
    }

    /// 校验用户名和密码
    ///
    /// 用户不存在与密码错误返回同一个错误，避免泄露账号是否存在
    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User> {
        let invalid = || RokaMokaError::Unauthorized("用户名或密码错误".to_string());

        let Some(user) = self.users.find_by_username(username).await? else {
            warn!("登录失败：用户不存在");
            return Err(invalid());
        };

        if !verify_password(password, &user.password_hash) {
            warn!(user_id = user.id, "登录失败：密码错误");
            return Err(invalid());
        }

        Ok(user)
    }

    /// 当前登录用户（角色以数据库为准）
    #[instrument(skip(self, ctx), fields(execution_id = %ctx.execution_id))]
    pub async fn current_user(&self, ctx: &ServiceContext) -> Result<User> {
        let principal = ctx.require_user()?;
        self.users
            .find_by_id(principal.user_id)
            .await?
            .ok_or_else(|| RokaMokaError::not_found("用户", principal.user_id))
    }

    /// 重置密码：只能重置自己的密码
    #[instrument(skip(self, ctx, new_password), fields(execution_id = %ctx.execution_id))]
    pub async fn reset_password(
        &self,
        ctx: &ServiceContext,
        user_id: i64,
        new_password: &str,
    ) -> Result<()> {
        let principal = ctx.require_user()?;

        let target = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| RokaMokaError::not_found("用户", user_id))?;

        if target.id != principal.user_id {
            return Err(RokaMokaError::Forbidden("只能重置自己的密码".to_string()));
        }

        validate_password(new_password)?;
        let password_hash = hash_password(new_password, self.bcrypt_cost)?;
        self.users
            .update_password(ctx, target.id, &password_hash)
            .await?;

        info!(user_id, "密码已重置");
        Ok(())
    }

    /// 登记当前用户的设备；同一设备标识被其他用户登记过时转移到当前用户
    #[instrument(skip(self, ctx), fields(execution_id = %ctx.execution_id))]
    pub async fn register_device(
        &self,
        ctx: &ServiceContext,
        identifier: &str,
        platform: DevicePlatform,
    ) -> Result<Device> {
        let principal = ctx.require_user()?;

        let identifier = identifier.trim();
        if identifier.is_empty() || identifier.len() > 255 {
            return Err(RokaMokaError::Validation(
                "设备标识长度必须在 1 到 255 之间".to_string(),
            ));
        }

        self.devices
            .upsert(ctx, principal.user_id, identifier, platform)
            .await
    }

    #[instrument(skip(self, ctx), fields(execution_id = %ctx.execution_id))]
    pub async fn list_devices(&self, ctx: &ServiceContext) -> Result<Vec<Device>> {
        let principal = ctx.require_user()?;
        self.devices.list_by_user(principal.user_id).await
    }

    /// 启动时确保管理员账号存在
    ///
    /// 账号已存在时只补齐 ADMIN 角色，返回 None；新建时返回创建的用户
    #[instrument(skip(self, config), fields(username = %config.username))]
    pub async fn ensure_bootstrap_admin(
        &self,
        config: &BootstrapAdminConfig,
    ) -> Result<Option<User>> {
        if let Some(existing) = self.users.find_by_username(&config.username).await? {
            if !existing.has_role(RoleName::Admin) {
                self.users.add_role(existing.id, RoleName::Admin).await?;
                info!(user_id = existing.id, "已为现有账号补齐 ADMIN 角色");
            }
            return Ok(None);
        }

        let account = normalize_account(NewAccount {
            name: config.name.clone(),
            username: config.username.clone(),
            email: config.email.clone(),
            password: config.password.clone(),
        });
        validate_account(&account)?;

        let password_hash = hash_password(&account.password, self.bcrypt_cost)?;
        let user = self
            .users
            .create(
                &ServiceContext::system(),
                &NewUser {
                    name: account.name,
                    username: account.username,
                    email: account.email,
                    password_hash,
                    roles: vec![RoleName::User, RoleName::Admin],
                },
            )
            .await?;

        info!(user_id = user.id, "管理员账号已创建");
        Ok(Some(user))
    }
}

fn normalize_account(account: NewAccount) -> NewAccount {
    NewAccount {
        name: account.name.trim().to_string(),
        username: account.username.trim().to_string(),
        email: account.email.trim().to_lowercase(),
        password: account.password,
    }
}

fn validate_account(account: &NewAccount) -> Result<()> {
    if account.name.is_empty() || account.name.chars().count() > 120 {
        return Err(RokaMokaError::Validation(
            "姓名长度必须在 1 到 120 之间".to_string(),
        ));
    }

    let username_len = account.username.chars().count();
    if !(3..=50).contains(&username_len)
        || !account
            .username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Err(RokaMokaError::Validation(
            "用户名需为 3 到 50 位字母、数字或 . _ -".to_string(),
        ));
    }

    if !is_valid_email(&account.email) {
        return Err(RokaMokaError::Validation(format!(
            "邮箱格式不正确: {}",
            account.email
        )));
    }

    validate_password(&account.password)
}

fn validate_password(password: &str) -> Result<()> {
    if password.len() < MIN_PASSWORD_LEN || password.len() > MAX_PASSWORD_LEN {
        return Err(RokaMokaError::Validation(format!(
            "密码长度必须在 {MIN_PASSWORD_LEN} 到 {MAX_PASSWORD_LEN} 之间"
        )));
    }
    Ok(())
}

fn is_valid_email(email: &str) -> bool {
    if email.len() > 255 {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !domain.contains('@')
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(username: &str, email: &str, password: &str) -> NewAccount {
        NewAccount {
            name: "Ana Souza".to_string(),
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_validate_account() {
        assert!(validate_account(&account("ana.souza", "ana@museu.br", "segredo1")).is_ok());
        assert!(validate_account(&account("an", "ana@museu.br", "segredo1")).is_err());
        assert!(validate_account(&account("ana souza", "ana@museu.br", "segredo1")).is_err());
        assert!(validate_account(&account("ana", "ana.museu.br", "segredo1")).is_err());
        assert!(validate_account(&account("ana", "ana@museu.br", "123")).is_err());
    }

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("@b.co"));
        assert!(!is_valid_email("a@bco"));
        assert!(!is_valid_email("a@.b.co"));
    }

    #[test]
    fn test_normalize_account_lowercases_email() {
        let normalized = normalize_account(account("  ana ", " Ana@Museu.BR ", "x"));
        assert_eq!(normalized.username, "ana");
        assert_eq!(normalized.email, "ana@museu.br");
    }
}
