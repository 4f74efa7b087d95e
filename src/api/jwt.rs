use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};
use tracing::warn;

use crate::config::ApiConfig;
use crate::errors::{Result, RewardHubError};

const ACCESS: &str = "access";
const REFRESH: &str = "refresh";

/// 令牌持有者角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

/// JWT Claims（access / refresh 共用）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// 用户 id；管理员为 "admin"
    pub sub: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
    pub token_type: String,
}

impl Claims {
    /// 普通用户的数字 id
    pub fn user_id(&self) -> Option<i64> {
        match self.role {
            Role::User => self.sub.parse().ok(),
            Role::Admin => None,
        }
    }
}

/// JWT Service for generating and validating tokens
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_minutes: u64,
    refresh_token_days: u64,
}

impl JwtService {
    pub fn new(secret: &str, access_token_minutes: u64, refresh_token_days: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_token_minutes,
            refresh_token_days,
        }
    }

    /// 从 API 配置创建；未配置 secret 时每个进程随机生成
    pub fn from_config(api: &ApiConfig) -> Self {
        let secret = if api.jwt_secret.is_empty() {
            warn!("JWT secret not configured, generating a random one (tokens will not survive restarts)");
            crate::utils::generate_random_code(48)
        } else {
            api.jwt_secret.clone()
        };
        Self::new(&secret, api.access_token_minutes, api.refresh_token_days)
    }

    /// Access token 有效期（秒）
    pub fn access_ttl_secs(&self) -> i64 {
        self.access_token_minutes as i64 * 60
    }

    fn issue(&self, sub: String, role: Role, token_type: &str, ttl: Duration) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub,
            role,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            jti: uuid::Uuid::new_v4().to_string(),
            token_type: token_type.to_string(),
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| RewardHubError::token(format!("Failed to sign token: {}", e)))
    }

    pub fn generate_access_token(&self, sub: impl Into<String>, role: Role) -> Result<String> {
        self.issue(
            sub.into(),
            role,
            ACCESS,
            Duration::minutes(self.access_token_minutes as i64),
        )
    }

    pub fn generate_refresh_token(&self, sub: impl Into<String>, role: Role) -> Result<String> {
        self.issue(
            sub.into(),
            role,
            REFRESH,
            Duration::days(self.refresh_token_days as i64),
        )
    }

    fn validate(&self, token: &str, expected_type: &str) -> Result<Claims> {
        let data = decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map_err(|e| RewardHubError::token(format!("Invalid token: {}", e)))?;

        if data.claims.token_type != expected_type {
            return Err(RewardHubError::token(format!(
                "Expected {} token, got {}",
                expected_type, data.claims.token_type
            )));
        }
        Ok(data.claims)
    }

    pub fn validate_access_token(&self, token: &str) -> Result<Claims> {
        self.validate(token, ACCESS)
    }

    pub fn validate_refresh_token(&self, token: &str) -> Result<Claims> {
        self.validate(token, REFRESH)
    }
}
