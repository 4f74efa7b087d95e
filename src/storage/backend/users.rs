//! 用户表操作

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, Set, sea_query::Expr,
};
use tracing::info;

use super::converters::model_to_user;
use super::{SeaOrmStorage, retry};
use crate::errors::{Result, RewardHubError};
use crate::storage::models::{NewUser, Page, User, UserPatch};
use migration::entities::user;

impl SeaOrmStorage {
    pub async fn create_user(&self, new_user: NewUser) -> Result<User> {
        let now = Utc::now();
        let model = user::ActiveModel {
            id: NotSet,
            email: Set(new_user.email.clone()),
            password_hash: Set(new_user.password_hash),
            display_name: Set(new_user.display_name),
            phone: Set(new_user.phone),
            created_at: Set(now),
            updated_at: Set(now),
            last_login_at: Set(None),
            reset_token_hash: Set(None),
            reset_expires_at: Set(None),
        };

        let inserted = model.insert(&self.db).await.map_err(|e| {
            if retry::is_unique_violation(&e) {
                RewardHubError::conflict("Email is already registered")
            } else {
                RewardHubError::database_operation(format!("创建用户失败: {}", e))
            }
        })?;

        self.invalidate_count_cache();
        info!("User created: id={}", inserted.id);
        Ok(model_to_user(inserted))
    }

    pub async fn get_user(&self, id: i64) -> Result<Option<User>> {
        let db = &self.db;
        let model = retry::with_retry(&format!("get_user({})", id), self.retry_config, || async {
            user::Entity::find_by_id(id).one(db).await
        })
        .await?;
        Ok(model.map(model_to_user))
    }

    /// 邮箱需调用方先规范化（trim + 小写）
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let db = &self.db;
        let model = retry::with_retry("find_user_by_email", self.retry_config, || async {
            user::Entity::find()
                .filter(user::Column::Email.eq(email))
                .one(db)
                .await
        })
        .await?;
        Ok(model.map(model_to_user))
    }

    pub async fn update_user(&self, id: i64, patch: UserPatch) -> Result<User> {
        let model = user::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| RewardHubError::not_found(format!("User {} not found", id)))?;

        let mut active = model.into_active_model();
        if let Some(display_name) = patch.display_name {
            active.display_name = Set(display_name);
        }
        if let Some(phone) = patch.phone {
            active.phone = Set(phone);
        }
        if let Some(password_hash) = patch.password_hash {
            active.password_hash = Set(password_hash);
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(&self.db).await?;
        self.invalidate_count_cache();
        Ok(model_to_user(updated))
    }

    pub async fn list_users(
        &self,
        page: u64,
        page_size: u64,
        search: Option<String>,
    ) -> Result<Page<User>> {
        let mut condition = Condition::all();
        if let Some(ref search) = search {
            condition = condition.add(
                Condition::any()
                    .add(user::Column::Email.contains(search))
                    .add(user::Column::DisplayName.contains(search)),
            );
        }

        let db = &self.db;
        let cache_key = format!("users:s={:?}", search);
        let total = self
            .cached_count(cache_key, "list_users(count)", || {
                let cond = condition.clone();
                async move { user::Entity::find().filter(cond).count(db).await }
            })
            .await?;

        let models = retry::with_retry("list_users(data)", self.retry_config, || async {
            user::Entity::find()
                .filter(condition.clone())
                .order_by_desc(user::Column::CreatedAt)
                .order_by_desc(user::Column::Id)
                .paginate(db, page_size)
                .fetch_page(page.saturating_sub(1))
                .await
        })
        .await?;

        Ok((models.into_iter().map(model_to_user).collect(), total))
    }

    pub async fn set_password_reset(
        &self,
        id: i64,
        token_hash: String,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        user::Entity::update_many()
            .col_expr(user::Column::ResetTokenHash, Expr::value(token_hash))
            .col_expr(user::Column::ResetExpiresAt, Expr::value(expires_at))
            .filter(user::Column::Id.eq(id))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    /// 清除重置 token；`new_password_hash` 非空时同时更新密码
    pub async fn clear_password_reset(
        &self,
        id: i64,
        new_password_hash: Option<String>,
    ) -> Result<()> {
        let mut update = user::Entity::update_many()
            .col_expr(user::Column::ResetTokenHash, Expr::value(Option::<String>::None))
            .col_expr(
                user::Column::ResetExpiresAt,
                Expr::value(Option::<DateTime<Utc>>::None),
            )
            .col_expr(user::Column::UpdatedAt, Expr::value(Utc::now()));
        if let Some(hash) = new_password_hash {
            update = update.col_expr(user::Column::PasswordHash, Expr::value(hash));
        }

        let result = update.filter(user::Column::Id.eq(id)).exec(&self.db).await?;
        if result.rows_affected == 0 {
            return Err(RewardHubError::not_found(format!("User {} not found", id)));
        }
        self.invalidate_count_cache();
        Ok(())
    }

    /// 用重置 token 换新密码
    ///
    /// 只有 token 哈希仍匹配且未过期时才更新；返回 false 表示 token
    /// 已被使用或已失效（并发确认只有一个成功）。
    pub async fn consume_password_reset(
        &self,
        id: i64,
        token_hash: &str,
        new_password_hash: String,
    ) -> Result<bool> {
        let now = Utc::now();
        let result = user::Entity::update_many()
            .col_expr(user::Column::PasswordHash, Expr::value(new_password_hash))
            .col_expr(user::Column::ResetTokenHash, Expr::value(Option::<String>::None))
            .col_expr(
                user::Column::ResetExpiresAt,
                Expr::value(Option::<DateTime<Utc>>::None),
            )
            .col_expr(user::Column::UpdatedAt, Expr::value(now))
            .filter(user::Column::Id.eq(id))
            .filter(user::Column::ResetTokenHash.eq(token_hash))
            .filter(user::Column::ResetExpiresAt.gt(now))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Ok(false);
        }
        self.invalidate_count_cache();
        Ok(true)
    }

    pub async fn touch_last_login(&self, id: i64) -> Result<()> {
        user::Entity::update_many()
            .col_expr(user::Column::LastLoginAt, Expr::value(Utc::now()))
            .filter(user::Column::Id.eq(id))
            .exec(&self.db)
            .await?;
        self.invalidate_count_cache();
        Ok(())
    }
}
