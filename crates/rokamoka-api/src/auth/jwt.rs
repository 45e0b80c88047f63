//! JWT Token 处理
//!
//! 配置了 RSA 密钥对时使用 RS256，否则退回 HS256 共享密钥（仅开发环境）。
//! `sub` 为用户名，`uid` 为用户 ID，`scope` 为空格分隔的角色名。

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::info;

use mokadex::Principal;
use mokadex::models::{RoleName, User};
use rokamoka_shared::config::AuthConfig;

use crate::error::{ApiError, Result};

/// JWT Claims（Token 载荷）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// 用户名
    pub sub: String,
    /// 用户 ID
    pub uid: i64,
    /// 空格分隔的角色
    pub scope: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}

impl Claims {
    /// 解析 scope 中的角色，忽略无法识别的值
    pub fn roles(&self) -> Vec<RoleName> {
        self.scope
            .split_whitespace()
            .filter_map(|s| s.parse().ok())
            .collect()
    }

    pub fn principal(&self) -> Principal {
        Principal::new(self.uid, self.sub.clone(), self.roles())
    }
}

/// 签发结果
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedToken {
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub expires_at: DateTime<Utc>,
}

/// JWT 管理器
#[derive(Clone)]
pub struct JwtManager {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    expires_in_secs: i64,
}

impl JwtManager {
    /// 按认证配置构造：同时配置公私钥路径时读取 PEM 文件
    pub fn from_config(config: &AuthConfig) -> Result<Self> {
        match (&config.private_key_path, &config.public_key_path) {
            (Some(private_path), Some(public_path)) => {
                let private_pem = read_pem(private_path)?;
                let public_pem = read_pem(public_path)?;
                info!(issuer = %config.issuer, "JWT 使用 RS256 签名");
                Self::rs256(
                    &private_pem,
                    &public_pem,
                    &config.issuer,
                    config.expires_in_secs,
                )
            }
            _ => {
                info!(issuer = %config.issuer, "未配置 RSA 密钥，JWT 使用 HS256 签名");
                Ok(Self::hs256(
                    &config.secret,
                    &config.issuer,
                    config.expires_in_secs,
                ))
            }
        }
    }

    pub fn rs256(
        private_pem: &[u8],
        public_pem: &[u8],
        issuer: &str,
        expires_in_secs: i64,
    ) -> Result<Self> {
        let encoding_key = EncodingKey::from_rsa_pem(private_pem)
            .map_err(|e| ApiError::Internal(format!("RSA 私钥无效: {e}")))?;
        let decoding_key = DecodingKey::from_rsa_pem(public_pem)
            .map_err(|e| ApiError::Internal(format!("RSA 公钥无效: {e}")))?;

        Ok(Self {
            algorithm: Algorithm::RS256,
            encoding_key,
            decoding_key,
            issuer: issuer.to_string(),
            expires_in_secs,
        })
    }

    pub fn hs256(secret: &str, issuer: &str, expires_in_secs: i64) -> Self {
        Self {
            algorithm: Algorithm::HS256,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.to_string(),
            expires_in_secs,
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// 为用户签发 Token
    pub fn issue(&self, user: &User) -> Result<IssuedToken> {
        let now = Utc::now();
        let expires_at = now + Duration::seconds(self.expires_in_secs);

        let scope = user
            .roles
            .iter()
            .map(|r| r.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        let claims = Claims {
            sub: user.username.clone(),
            uid: user.id,
            scope,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            iss: self.issuer.clone(),
        };

        let token = encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| ApiError::Internal(format!("JWT 生成失败: {e}")))?;

        Ok(IssuedToken {
            token,
            token_type: "Bearer",
            expires_in: self.expires_in_secs,
            expires_at,
        })
    }

    /// 校验签名、签发者与有效期
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(self.algorithm);
        validation.set_issuer(&[&self.issuer]);

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    ApiError::Unauthorized("Token 已过期".to_string())
                }
                jsonwebtoken::errors::ErrorKind::InvalidIssuer => {
                    ApiError::Unauthorized("Token 签发者无效".to_string())
                }
                _ => ApiError::Unauthorized("无效的 Token".to_string()),
            }
        })?;

        Ok(data.claims)
    }
}

fn read_pem(path: &str) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| ApiError::Internal(format!("读取密钥文件失败 {path}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mokadex::models::Audit;

    const PRIVATE_PEM: &str = include_str!("../../tests/fixtures/jwt_private.pem");
    const PUBLIC_PEM: &str = include_str!("../../tests/fixtures/jwt_public.pem");

    fn user() -> User {
        User {
            id: 42,
            name: "Curadora".to_string(),
            username: "curadora".to_string(),
            email: "curadora@rokamoka.dev".to_string(),
            password_hash: String::new(),
            roles: vec![RoleName::User, RoleName::Curator],
            audit: Audit::created("system"),
        }
    }

    #[test]
    fn test_rs256_round_trip() {
        let manager =
            JwtManager::rs256(PRIVATE_PEM.as_bytes(), PUBLIC_PEM.as_bytes(), "rokamoka", 36_000)
                .unwrap();
        let issued = manager.issue(&user()).unwrap();
        assert_eq!(issued.token_type, "Bearer");
        assert_eq!(issued.expires_in, 36_000);

        let claims = manager.verify(&issued.token).unwrap();
        assert_eq!(claims.sub, "curadora");
        assert_eq!(claims.uid, 42);
        assert_eq!(claims.scope, "USER CURATOR");
        assert_eq!(claims.iss, "rokamoka");
        assert_eq!(claims.exp - claims.iat, 36_000);
        assert_eq!(claims.roles(), vec![RoleName::User, RoleName::Curator]);
    }

    #[test]
    fn test_rejects_other_issuer() {
        let issuer_a = JwtManager::hs256("segredo", "museu-a", 60);
        let issuer_b = JwtManager::hs256("segredo", "museu-b", 60);
        let issued = issuer_a.issue(&user()).unwrap();

        assert!(matches!(
            issuer_b.verify(&issued.token),
            Err(ApiError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_rejects_expired_token() {
        let manager = JwtManager::hs256("segredo", "rokamoka", 60);
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "velho".to_string(),
            uid: 1,
            scope: "USER".to_string(),
            iat: now - 7_200,
            exp: now - 3_600,
            iss: "rokamoka".to_string(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"segredo"),
        )
        .unwrap();

        assert!(manager.verify(&token).is_err());
    }

    #[test]
    fn test_rejects_garbage() {
        let manager = JwtManager::hs256("segredo", "rokamoka", 60);
        assert!(manager.verify("nao.e.token").is_err());
    }

    #[test]
    fn test_unknown_scope_entries_are_ignored() {
        let claims = Claims {
            sub: "x".to_string(),
            uid: 1,
            scope: "USER SUPERUSER ADMIN".to_string(),
            iat: 0,
            exp: 0,
            iss: "rokamoka".to_string(),
        };
        assert_eq!(claims.roles(), vec![RoleName::User, RoleName::Admin]);
    }
}
