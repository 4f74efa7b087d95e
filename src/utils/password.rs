//! 密码哈希工具模块
//!
//! 使用 Argon2id 算法进行密码哈希和验证，
//! 同时用于用户密码、密码重置 token 和管理员 token。

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use subtle::ConstantTimeEq;

use crate::errors::RewardHubError;

/// 密码哈希错误
#[derive(Debug)]
pub enum PasswordError {
    HashError(String),
    VerifyError(String),
}

impl std::fmt::Display for PasswordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HashError(msg) => write!(f, "Password hash error: {}", msg),
            Self::VerifyError(msg) => write!(f, "Password verify error: {}", msg),
        }
    }
}

impl std::error::Error for PasswordError {}

impl From<PasswordError> for RewardHubError {
    fn from(err: PasswordError) -> Self {
        RewardHubError::password_hash(err.to_string())
    }
}

/// 对密码进行 Argon2id 哈希
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::HashError(e.to_string()))
}

/// 验证密码是否匹配哈希
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| PasswordError::VerifyError(e.to_string()))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// 检测字符串是否是 Argon2 哈希格式
pub fn is_argon2_hash(s: &str) -> bool {
    s.starts_with("$argon2")
}

/// 校验配置中的密钥（管理员 token）
///
/// 配置值为 Argon2 哈希时做哈希校验，否则做常量时间比较。
pub fn verify_secret(input: &str, configured: &str) -> bool {
    if configured.is_empty() {
        return false;
    }
    if is_argon2_hash(configured) {
        return verify_password(input, configured).unwrap_or(false);
    }
    input.as_bytes().ct_eq(configured.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let password = "test_password_123";
        let hash = hash_password(password).expect("hash should succeed");

        assert!(is_argon2_hash(&hash));
        assert!(verify_password(password, &hash).expect("verify should succeed"));
        assert!(!verify_password("wrong_password", &hash).expect("verify should succeed"));
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(verify_password("x", "not-a-hash").is_err());
    }

    #[test]
    fn test_verify_secret_plaintext_and_hash() {
        assert!(verify_secret("admin-token", "admin-token"));
        assert!(!verify_secret("admin-token2", "admin-token"));
        assert!(!verify_secret("", ""));

        let hash = hash_password("admin-token").unwrap();
        assert!(verify_secret("admin-token", &hash));
        assert!(!verify_secret("nope", &hash));
    }
}
