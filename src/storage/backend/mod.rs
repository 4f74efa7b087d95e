//! SeaORM storage backend
//!
//! This module provides database storage using SeaORM,
//! supporting SQLite, MySQL/MariaDB, and PostgreSQL.
//! Every entity gets its own file; multi-row business writes
//! (reward crediting, withdrawal debit/refund) run in one transaction.

mod connection;
mod converters;
mod kyc;
mod ledger;
pub mod retry;
mod stats;
mod surveys;
mod tasks;
mod users;
mod withdrawals;

use std::time::Duration;

use moka::sync::Cache;
use sea_orm::sea_query::{Alias, Expr, Func, IntoColumnRef, SimpleExpr};
use sea_orm::{DatabaseConnection, DbErr, ExprTrait};
use tracing::{debug, warn};

use crate::config::DatabaseConfig;
use crate::errors::{Result, RewardHubError};

pub use connection::{connect_generic, connect_sqlite, run_migrations};

/// 事务执行结果
///
/// 外层 `DbErr` 交给重试机制判断，内层是业务结果；
/// 内层为 Err 时事务未提交，随 drop 回滚。
pub(crate) type TxOutcome<T> = std::result::Result<Result<T>, DbErr>;

/// 从数据库 URL 推断数据库类型
pub fn infer_backend_from_url(database_url: &str) -> Result<String> {
    if database_url.starts_with("sqlite:")
        || database_url.ends_with(".db")
        || database_url.ends_with(".sqlite")
        || database_url == ":memory:"
    {
        Ok("sqlite".to_string())
    } else if database_url.starts_with("mysql://") || database_url.starts_with("mariadb://") {
        Ok("mysql".to_string())
    } else if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        Ok("postgres".to_string())
    } else {
        Err(RewardHubError::database_config(format!(
            "无法从 URL 推断数据库类型: {}. 支持的 URL 格式: sqlite://, mysql://, mariadb://, postgres://",
            database_url
        )))
    }
}

/// SUM(col) 转为 64 位整数
///
/// PostgreSQL/MySQL 对 BIGINT 求和返回 NUMERIC/DECIMAL，需要显式 CAST。
pub(crate) fn sum_as_i64<C: IntoColumnRef>(backend: &str, col: C) -> SimpleExpr {
    let sum = Expr::expr(Func::sum(Expr::col(col)));
    match backend {
        "postgres" => sum.cast_as(Alias::new("BIGINT")),
        "mysql" => sum.cast_as(Alias::new("SIGNED")),
        _ => sum.into(),
    }
}

/// SeaORM-based storage backend
#[derive(Clone)]
pub struct SeaOrmStorage {
    db: DatabaseConnection,
    backend_name: String,
    /// 分页 COUNT 缓存（TTL 30秒）
    count_cache: Cache<String, u64>,
    /// 重试配置
    retry_config: retry::RetryConfig,
}

impl SeaOrmStorage {
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        let database_url = config.database_url.as_str();
        if database_url.is_empty() {
            return Err(RewardHubError::database_config("DATABASE_URL 未设置"));
        }

        let backend_name = infer_backend_from_url(database_url)?;
        let retry_config = retry::RetryConfig {
            max_retries: config.retry_count,
            base_delay_ms: config.retry_base_delay_ms,
            max_delay_ms: config.retry_max_delay_ms,
        };

        // 根据不同数据库类型配置连接选项
        let db = if backend_name == "sqlite" {
            connect_sqlite(database_url).await?
        } else {
            connect_generic(database_url, &backend_name, config).await?
        };

        let storage = SeaOrmStorage {
            db,
            backend_name,
            count_cache: Cache::builder()
                .time_to_live(Duration::from_secs(30))
                .max_capacity(100)
                .build(),
            retry_config,
        };

        // 运行迁移
        run_migrations(&storage.db).await?;

        warn!(
            "{} Storage initialized.",
            storage.backend_name.to_uppercase()
        );
        Ok(storage)
    }

    pub fn backend_name(&self) -> &str {
        &self.backend_name
    }

    /// 获取数据库连接
    pub fn get_db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// 健康检查：执行一次轻量查询
    pub async fn ping(&self) -> Result<()> {
        self.db
            .ping()
            .await
            .map_err(|e| RewardHubError::database_connection(format!("数据库不可用: {}", e)))
    }

    /// 关闭连接池（优雅关闭时调用）
    pub async fn close(&self) -> Result<()> {
        self.db
            .clone()
            .close()
            .await
            .map_err(|e| RewardHubError::database_connection(format!("关闭连接失败: {}", e)))
    }

    /// 清除分页 COUNT 缓存（数据变更时调用）
    pub fn invalidate_count_cache(&self) {
        self.count_cache.invalidate_all();
    }

    /// 带缓存的 COUNT 查询
    async fn cached_count<F, Fut>(&self, cache_key: String, op_name: &str, count: F) -> Result<u64>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = std::result::Result<u64, DbErr>>,
    {
        if let Some(cached) = self.count_cache.get(&cache_key) {
            debug!("count cache hit: key={}, value={}", cache_key, cached);
            return Ok(cached);
        }

        let total = retry::with_retry(op_name, self.retry_config, count).await?;
        self.count_cache.insert(cache_key, total);
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_backend_from_url() {
        assert_eq!(infer_backend_from_url("sqlite://data.db").unwrap(), "sqlite");
        assert_eq!(infer_backend_from_url("sqlite::memory:").unwrap(), "sqlite");
        assert_eq!(infer_backend_from_url("rewardhub.db").unwrap(), "sqlite");
        assert_eq!(infer_backend_from_url("data/app.sqlite").unwrap(), "sqlite");
        assert_eq!(infer_backend_from_url(":memory:").unwrap(), "sqlite");
        assert_eq!(
            infer_backend_from_url("mysql://u:p@localhost/db").unwrap(),
            "mysql"
        );
        assert_eq!(
            infer_backend_from_url("mariadb://u:p@localhost/db").unwrap(),
            "mysql"
        );
        assert_eq!(
            infer_backend_from_url("postgresql://u:p@localhost/db").unwrap(),
            "postgres"
        );
        assert!(matches!(
            infer_backend_from_url("redis://localhost"),
            Err(RewardHubError::DatabaseConfig(_))
        ));
    }
}
