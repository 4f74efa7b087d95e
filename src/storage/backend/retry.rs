//! 数据库写冲突重试
//!
//! 钱包、提现、问卷写入都是"先读后写"的短事务。SQLite WAL 下
//! 读事务升级为写事务时会返回 BUSY_SNAPSHOT(517)，MySQL/PostgreSQL
//! 下是死锁或序列化失败；这些都整体重跑事务。
//! 业务错误（余额不足、重复提交）在 `TxOutcome` 内层返回，不会进入这里。

use std::future::Future;
use std::time::Duration;

use sea_orm::error::RuntimeErr;
use sea_orm::{DbErr, SqlErr};
use tokio::time::sleep;
use tracing::{debug, warn};

/// SQLite BUSY/LOCKED 及其扩展码
const SQLITE_CONTENTION_CODES: &[&str] = &[
    "5",   // SQLITE_BUSY
    "261", // SQLITE_BUSY_RECOVERY
    "517", // SQLITE_BUSY_SNAPSHOT
    "773", // SQLITE_BUSY_TIMEOUT
    "6",   // SQLITE_LOCKED
    "262", // SQLITE_LOCKED_SHAREDCACHE
    "518", // SQLITE_LOCKED_VTAB
];

/// MySQL 死锁 / 锁等待超时，PostgreSQL 序列化失败 / 死锁
const SERVER_CONTENTION_CODES: &[&str] = &["1213", "1205", "40001", "40P01"];

const CONTENTION_MESSAGES: &[&str] = &[
    "database is locked",
    "database table is locked",
    "deadlock",
    "lock wait timeout",
    "could not serialize access",
    "serialization failure",
];

/// 错误码是否表示写冲突
fn is_contention_code(code: &str) -> bool {
    SQLITE_CONTENTION_CODES.contains(&code) || SERVER_CONTENTION_CODES.contains(&code)
}

fn is_contention_message(message: &str) -> bool {
    let message = message.to_lowercase();
    CONTENTION_MESSAGES.iter().any(|m| message.contains(m))
}

/// 是否值得重跑整个操作
pub fn is_retryable_error(err: &DbErr) -> bool {
    match err {
        DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => true,
        DbErr::Exec(runtime) | DbErr::Query(runtime) => is_contention(runtime),
        _ => false,
    }
}

fn is_contention(err: &RuntimeErr) -> bool {
    match err {
        RuntimeErr::SqlxError(sqlx_err) => {
            let code_matches = sqlx_err
                .as_database_error()
                .and_then(|db_err| db_err.code())
                .is_some_and(|code| is_contention_code(code.as_ref()));
            // 未识别的错误码仍看一眼消息
            code_matches || is_contention_message(&sqlx_err.to_string())
        }
        RuntimeErr::Internal(msg) => is_contention_message(msg),
        #[allow(unreachable_patterns)]
        _ => false,
    }
}

/// 唯一约束冲突（重复邮箱、重复提交、重复入账）
pub fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// 重试参数，来自 `[database]` 配置
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 100,
            max_delay_ms: 2000,
        }
    }
}

impl RetryConfig {
    /// 第 `attempt` 次重试前的等待时间（从 1 开始计）
    ///
    /// 指数增长，封顶 `max_delay_ms`，再叠加不超过 25% 的随机抖动，
    /// 让同时冲突的请求错开。
    fn delay_for(&self, attempt: u32) -> Duration {
        use rand::RngExt;

        let factor = 1u64.checked_shl(attempt.saturating_sub(1)).unwrap_or(u64::MAX);
        let capped = self.base_delay_ms.saturating_mul(factor).min(self.max_delay_ms);
        let jitter = rand::rng().random_range(0..=capped / 4);
        Duration::from_millis(capped + jitter)
    }
}

/// 执行 `operation`，遇到可重试错误时退避后重跑
///
/// `operation` 每次调用都要从头开启新事务。
pub async fn with_retry<T, F, Fut>(
    op_name: &str,
    config: RetryConfig,
    mut operation: F,
) -> Result<T, DbErr>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DbErr>>,
{
    let mut retries = 0;
    loop {
        let err = match operation().await {
            Ok(value) => {
                if retries > 0 {
                    debug!("{} succeeded after {} retries", op_name, retries);
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        if !is_retryable_error(&err) {
            return Err(err);
        }
        if retries >= config.max_retries {
            warn!("{} gave up after {} retries: {}", op_name, retries, err);
            return Err(err);
        }

        retries += 1;
        let delay = config.delay_for(retries);
        debug!(
            "{} hit contention ({}), retry {}/{} in {:?}",
            op_name, err, retries, config.max_retries, delay
        );
        sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn quick() -> RetryConfig {
        RetryConfig {
            max_retries: 2,
            base_delay_ms: 1,
            max_delay_ms: 5,
        }
    }

    #[test]
    fn test_sqlite_extended_busy_codes_are_contention() {
        for code in ["5", "261", "517", "773", "6", "262", "518"] {
            assert!(is_contention_code(code), "code {}", code);
        }
    }

    #[test]
    fn test_server_deadlock_codes_are_contention() {
        for code in ["1213", "1205", "40001", "40P01"] {
            assert!(is_contention_code(code), "code {}", code);
        }
    }

    #[test]
    fn test_constraint_codes_are_not_contention() {
        // SQLITE_CONSTRAINT_UNIQUE / PRIMARYKEY，MySQL 重复键，PG unique_violation
        for code in ["2067", "1555", "19", "1062", "23505"] {
            assert!(!is_contention_code(code), "code {}", code);
        }
    }

    #[test]
    fn test_locked_message_is_retryable() {
        let err = DbErr::Query(RuntimeErr::Internal(
            "error returned from database: (code: 517) database is locked".to_string(),
        ));
        assert!(is_retryable_error(&err));

        let err = DbErr::Exec(RuntimeErr::Internal(
            "Deadlock found when trying to get lock".to_string(),
        ));
        assert!(is_retryable_error(&err));
    }

    #[test]
    fn test_business_errors_are_not_retryable() {
        assert!(!is_retryable_error(&DbErr::RecordNotFound("survey".to_string())));

        let err = DbErr::Custom("reward already credited".to_string());
        assert!(!is_retryable_error(&err));
        assert!(!is_unique_violation(&err));

        let err = DbErr::Exec(RuntimeErr::Internal(
            "UNIQUE constraint failed: users.email".to_string(),
        ));
        assert!(!is_retryable_error(&err));
    }

    #[test]
    fn test_connection_errors_are_retryable() {
        assert!(is_retryable_error(&DbErr::ConnectionAcquire(
            sea_orm::error::ConnAcquireErr::Timeout
        )));
        assert!(is_retryable_error(&DbErr::Conn(RuntimeErr::Internal(
            "connection reset".to_string()
        ))));
    }

    #[test]
    fn test_delay_grows_and_is_capped() {
        let config = RetryConfig::default();
        let first = config.delay_for(1).as_millis();
        let third = config.delay_for(3).as_millis();
        let late = config.delay_for(40).as_millis();
        assert!((100..=125).contains(&first));
        assert!((400..=500).contains(&third));
        assert!((2000..=2500).contains(&late));
    }

    #[tokio::test]
    async fn test_with_retry_reruns_on_lock_contention() {
        let calls = AtomicU32::new(0);
        let result = with_retry("credit", quick(), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(DbErr::Query(RuntimeErr::Internal(
                        "database is locked".to_string(),
                    )))
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_with_retry_stops_after_max_retries() {
        let calls = AtomicU32::new(0);
        let result = with_retry("debit", quick(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err::<(), _>(DbErr::ConnectionAcquire(
                    sea_orm::error::ConnAcquireErr::Timeout,
                ))
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_with_retry_returns_non_retryable_immediately() {
        let calls = AtomicU32::new(0);
        let result = with_retry("lookup", quick(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(DbErr::RecordNotFound("user 7".to_string())) }
        })
        .await;

        assert!(matches!(result, Err(DbErr::RecordNotFound(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
