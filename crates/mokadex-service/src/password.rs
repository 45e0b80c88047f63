//! 密码哈希与校验（bcrypt）

use bcrypt::{hash, verify};

use crate::error::{Result, RokaMokaError};

pub use bcrypt::DEFAULT_COST;

/// 以指定 cost 计算 bcrypt 哈希
pub fn hash_password(password: &str, cost: u32) -> Result<String> {
    hash(password, cost).map_err(|e| RokaMokaError::Internal(format!("密码哈希失败: {e}")))
}

/// 校验明文密码与存储的哈希
///
/// 哈希格式损坏时视为不匹配
pub fn verify_password(password: &str, hashed: &str) -> bool {
    verify(password, hashed).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hashed = hash_password("visita-2024", 4).unwrap();
        assert!(verify_password("visita-2024", &hashed));
        assert!(!verify_password("wrong", &hashed));
    }

    #[test]
    fn test_verify_malformed_hash() {
        assert!(!verify_password("any", "not-a-bcrypt-hash"));
    }
}
