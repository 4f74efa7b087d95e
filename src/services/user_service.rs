//! Account service
//!
//! Registration, login, token refresh, profile management and the
//! password-reset flow. Admin login also lives here since it issues
//! the same kind of JWT.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::api::jwt::{JwtService, Role};
use crate::errors::{Result, RewardHubError};
use crate::services::validation::{
    normalize_email, optional_text, trimmed_len_between, validate_password,
};
use crate::storage::{KycStatus, NewUser, Page, SeaOrmStorage, User, UserPatch};
use crate::utils::generate_random_code;
use crate::utils::password::{hash_password, verify_password, verify_secret};

const RESET_SECRET_LEN: usize = 32;
const INVALID_CREDENTIALS: &str = "Invalid email or password";
const INVALID_RESET_TOKEN: &str = "Invalid or expired reset token";

// ============ Request/Response DTOs ============

#[derive(Debug, Clone)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub display_name: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    /// `Some("")` clears the phone number
    pub phone: Option<String>,
}

/// Token pair returned by login endpoints
#[derive(Debug, Clone, Serialize)]
pub struct AuthTokens {
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub token_type: &'static str,
    pub expires_in: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

/// Admin view of a user
#[derive(Debug, Clone, Serialize)]
pub struct UserDetail {
    #[serde(flatten)]
    pub user: User,
    pub balance: i64,
    pub kyc_status: Option<KycStatus>,
}

// ============ Reset token delivery ============

/// Delivers password-reset tokens to the account owner
#[async_trait]
pub trait ResetNotifier: Send + Sync {
    async fn send_reset_token(&self, user: &User, token: &str, expires_minutes: i64);
}

/// Writes reset tokens to the log under `rewardhub::mail`
pub struct LogResetNotifier;

#[async_trait]
impl ResetNotifier for LogResetNotifier {
    async fn send_reset_token(&self, user: &User, token: &str, expires_minutes: i64) {
        info!(
            target: "rewardhub::mail",
            "Password reset for {} (valid {} min): {}",
            user.email, expires_minutes, token
        );
    }
}

/// Splits `"<user_id>.<secret>"`
fn parse_reset_token(token: &str) -> Option<(i64, &str)> {
    let (id, secret) = token.trim().split_once('.')?;
    let id = id.parse::<i64>().ok().filter(|id| *id > 0)?;
    (secret.len() == RESET_SECRET_LEN).then_some((id, secret))
}

// ============ UserService Implementation ============

pub struct UserService {
    storage: Arc<SeaOrmStorage>,
    jwt: Arc<JwtService>,
    admin_token: String,
    reset_minutes: i64,
    notifier: Arc<dyn ResetNotifier>,
}

impl UserService {
    pub fn new(
        storage: Arc<SeaOrmStorage>,
        jwt: Arc<JwtService>,
        admin_token: String,
        reset_minutes: i64,
        notifier: Arc<dyn ResetNotifier>,
    ) -> Self {
        Self {
            storage,
            jwt,
            admin_token,
            reset_minutes,
            notifier,
        }
    }

    /// 管理接口是否启用
    pub fn admin_enabled(&self) -> bool {
        !self.admin_token.is_empty()
    }

    fn hash(&self, password: &str) -> Result<String> {
        Ok(hash_password(password)?)
    }

    fn user_tokens(&self, user: User) -> Result<AuthTokens> {
        let sub = user.id.to_string();
        Ok(AuthTokens {
            access_token: self.jwt.generate_access_token(sub.clone(), Role::User)?,
            refresh_token: Some(self.jwt.generate_refresh_token(sub, Role::User)?),
            token_type: "Bearer",
            expires_in: self.jwt.access_ttl_secs(),
            user: Some(user),
        })
    }

    pub async fn register(&self, req: RegisterRequest) -> Result<User> {
        let email = normalize_email(&req.email)?;
        validate_password(&req.password)?;
        let display_name = trimmed_len_between("display_name", &req.display_name, 1, 80)?;
        let phone = optional_text("phone", req.phone.as_deref(), 32)?;

        let user = self
            .storage
            .create_user(NewUser {
                email,
                password_hash: self.hash(&req.password)?,
                display_name,
                phone,
            })
            .await?;

        info!("User registered: id={}, email={}", user.id, user.email);
        Ok(user)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthTokens> {
        let Ok(email) = normalize_email(email) else {
            return Err(RewardHubError::unauthorized(INVALID_CREDENTIALS));
        };
        let Some(user) = self.storage.find_user_by_email(&email).await? else {
            // 不区分账号不存在与密码错误
            return Err(RewardHubError::unauthorized(INVALID_CREDENTIALS));
        };
        if !verify_password(password, &user.password_hash)? {
            info!("Login failed for user {}", user.id);
            return Err(RewardHubError::unauthorized(INVALID_CREDENTIALS));
        }

        self.storage.touch_last_login(user.id).await?;
        info!("User {} logged in", user.id);
        self.user_tokens(user)
    }

    /// 用 refresh token 换新的 access token
    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthTokens> {
        let claims = self
            .jwt
            .validate_refresh_token(refresh_token)
            .map_err(|_| RewardHubError::unauthorized("Invalid refresh token"))?;

        if claims.role == Role::User {
            let user_id = claims
                .user_id()
                .ok_or_else(|| RewardHubError::unauthorized("Invalid refresh token"))?;
            // 账号必须仍然存在
            self.get_profile(user_id)
                .await
                .map_err(|_| RewardHubError::unauthorized("Invalid refresh token"))?;
        }

        Ok(AuthTokens {
            access_token: self.jwt.generate_access_token(claims.sub, claims.role)?,
            refresh_token: None,
            token_type: "Bearer",
            expires_in: self.jwt.access_ttl_secs(),
            user: None,
        })
    }

    pub async fn admin_login(&self, token: &str) -> Result<AuthTokens> {
        if !self.admin_enabled() {
            return Err(RewardHubError::not_found("Admin API is disabled"));
        }
        if !verify_secret(token, &self.admin_token) {
            warn!("Admin login failed");
            return Err(RewardHubError::unauthorized("Invalid admin token"));
        }

        info!("Admin logged in");
        Ok(AuthTokens {
            access_token: self.jwt.generate_access_token("admin", Role::Admin)?,
            refresh_token: Some(self.jwt.generate_refresh_token("admin", Role::Admin)?),
            token_type: "Bearer",
            expires_in: self.jwt.access_ttl_secs(),
            user: None,
        })
    }

    pub async fn get_profile(&self, user_id: i64) -> Result<User> {
        self.storage
            .get_user(user_id)
            .await?
            .ok_or_else(|| RewardHubError::not_found(format!("User {} not found", user_id)))
    }

    pub async fn update_profile(&self, user_id: i64, update: ProfileUpdate) -> Result<User> {
        let mut patch = UserPatch::default();
        if let Some(name) = update.display_name.as_deref() {
            patch.display_name = Some(trimmed_len_between("display_name", name, 1, 80)?);
        }
        if let Some(phone) = update.phone.as_deref() {
            patch.phone = Some(optional_text("phone", Some(phone), 32)?);
        }
        self.storage.update_user(user_id, patch).await
    }

    pub async fn change_password(&self, user_id: i64, old: &str, new: &str) -> Result<()> {
        let user = self.get_profile(user_id).await?;
        if !verify_password(old, &user.password_hash)? {
            return Err(RewardHubError::unauthorized("Current password is incorrect"));
        }
        validate_password(new)?;

        self.storage
            .update_user(
                user_id,
                UserPatch {
                    password_hash: Some(self.hash(new)?),
                    ..Default::default()
                },
            )
            .await?;
        info!("User {} changed password", user_id);
        Ok(())
    }

    /// 始终返回成功，不暴露账号是否存在
    pub async fn request_password_reset(&self, email: &str) -> Result<()> {
        let Ok(email) = normalize_email(email) else {
            return Ok(());
        };
        let Some(user) = self.storage.find_user_by_email(&email).await? else {
            info!("Password reset requested for unknown email");
            return Ok(());
        };

        let secret = generate_random_code(RESET_SECRET_LEN);
        let expires_at = Utc::now() + Duration::minutes(self.reset_minutes);
        self.storage
            .set_password_reset(user.id, self.hash(&secret)?, expires_at)
            .await?;

        let token = format!("{}.{}", user.id, secret);
        self.notifier
            .send_reset_token(&user, &token, self.reset_minutes)
            .await;
        Ok(())
    }

    pub async fn confirm_password_reset(&self, token: &str, new_password: &str) -> Result<()> {
        validate_password(new_password)?;
        let invalid = || RewardHubError::validation(INVALID_RESET_TOKEN);

        let (user_id, secret) = parse_reset_token(token).ok_or_else(invalid)?;
        let user = self.storage.get_user(user_id).await?.ok_or_else(invalid)?;
        let (Some(hash), Some(expires_at)) = (&user.reset_token_hash, user.reset_expires_at) else {
            return Err(invalid());
        };
        if expires_at <= Utc::now() || !verify_password(secret, hash).unwrap_or(false) {
            return Err(invalid());
        }

        let consumed = self
            .storage
            .consume_password_reset(user_id, hash, self.hash(new_password)?)
            .await?;
        if !consumed {
            return Err(invalid());
        }
        info!("Password reset completed for user {}", user_id);
        Ok(())
    }

    /// 运维用：直接设置用户密码（CLI）
    pub async fn set_password_by_email(&self, email: &str, password: &str) -> Result<User> {
        validate_password(password)?;
        let email = normalize_email(email)?;
        let user = self
            .storage
            .find_user_by_email(&email)
            .await?
            .ok_or_else(|| RewardHubError::not_found(format!("No user with email {}", email)))?;

        self.storage
            .clear_password_reset(user.id, Some(self.hash(password)?))
            .await?;
        warn!("Password for user {} was reset by an operator", user.id);
        Ok(user)
    }

    pub async fn list_users(
        &self,
        page: u64,
        page_size: u64,
        search: Option<String>,
    ) -> Result<Page<User>> {
        let search = search.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        self.storage.list_users(page, page_size, search).await
    }

    pub async fn user_detail(&self, user_id: i64) -> Result<UserDetail> {
        let user = self.get_profile(user_id).await?;
        let balance = self.storage.balance_of(user_id).await?;
        let kyc_status = self.storage.get_kyc(user_id).await?.map(|k| k.status);
        Ok(UserDetail {
            user,
            balance,
            kyc_status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reset_token() {
        let secret = "a".repeat(RESET_SECRET_LEN);
        assert_eq!(
            parse_reset_token(&format!("12.{}", secret)),
            Some((12, secret.as_str()))
        );
        assert_eq!(parse_reset_token("12"), None);
        assert_eq!(parse_reset_token("x.abc"), None);
        assert_eq!(parse_reset_token(&format!("-3.{}", secret)), None);
        assert_eq!(parse_reset_token("12.tooshort"), None);
    }
}
