//! 钱包流水（只追加）
//!
//! 余额不单独存储，始终由 Σcredit − Σdebit 计算。

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, ConnectionTrait, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use tracing::info;

use super::converters::{collect_models, model_to_transaction};
use super::{SeaOrmStorage, retry, sum_as_i64};
use crate::errors::{Result, RewardHubError};
use crate::storage::models::{
    NewTransaction, Page, TransactionKind, WalletTotals, WalletTransaction, reference,
};
use migration::entities::wallet_transaction;

/// 插入一条流水（可在事务内调用）
pub(super) async fn insert_transaction_on<C: ConnectionTrait>(
    conn: &C,
    tx: NewTransaction,
) -> std::result::Result<wallet_transaction::Model, DbErr> {
    wallet_transaction::ActiveModel {
        id: NotSet,
        user_id: Set(tx.user_id),
        kind: Set(tx.kind.to_string()),
        amount: Set(tx.amount),
        description: Set(tx.description),
        reference: Set(tx.reference),
        created_at: Set(Utc::now()),
    }
    .insert(conn)
    .await
}

async fn sum_on<C: ConnectionTrait>(
    conn: &C,
    backend: &str,
    condition: Condition,
) -> std::result::Result<i64, DbErr> {
    let total = wallet_transaction::Entity::find()
        .select_only()
        .column_as(sum_as_i64(backend, wallet_transaction::Column::Amount), "total")
        .filter(condition)
        .into_tuple::<Option<i64>>()
        .one(conn)
        .await?;
    Ok(total.flatten().unwrap_or(0))
}

/// 计算流水汇总；`user_id` 为 None 时统计全部用户
pub(super) async fn totals_on<C: ConnectionTrait>(
    conn: &C,
    backend: &str,
    user_id: Option<i64>,
) -> std::result::Result<WalletTotals, DbErr> {
    use wallet_transaction::Column;

    let base = match user_id {
        Some(id) => Condition::all().add(Column::UserId.eq(id)),
        None => Condition::all(),
    };

    let credits = base
        .clone()
        .add(Column::Kind.eq(TransactionKind::Credit.as_ref()));
    let debits = base.add(Column::Kind.eq(TransactionKind::Debit.as_ref()));

    let credited = sum_on(conn, backend, credits.clone()).await?;
    let debited = sum_on(conn, backend, debits.clone()).await?;
    // 退款 credit 与提现 debit 单独汇总，用于区分收入和提现
    let refunded = sum_on(
        conn,
        backend,
        credits.add(Column::Reference.starts_with(reference::WITHDRAWAL_REFUND_PREFIX)),
    )
    .await?;
    let withdrawal_debits = sum_on(
        conn,
        backend,
        debits.add(Column::Reference.starts_with(reference::WITHDRAWAL_PREFIX)),
    )
    .await?;

    Ok(WalletTotals {
        credited,
        debited,
        refunded,
        withdrawal_debits,
    })
}

impl SeaOrmStorage {
    /// 追加一条流水；reference 重复时返回 Conflict
    pub async fn insert_transaction(&self, tx: NewTransaction) -> Result<WalletTransaction> {
        if tx.amount <= 0 {
            return Err(RewardHubError::validation("Amount must be positive"));
        }
        let reference = tx.reference.clone();
        let model = insert_transaction_on(&self.db, tx).await.map_err(|e| {
            if retry::is_unique_violation(&e) {
                RewardHubError::conflict(format!("Transaction '{}' already recorded", reference))
            } else {
                RewardHubError::database_operation(format!("写入流水失败: {}", e))
            }
        })?;

        self.invalidate_count_cache();
        info!(
            "Ledger {} {} for user {} ({})",
            model.kind, model.amount, model.user_id, model.reference
        );
        model_to_transaction(model)
    }

    /// 管理员手动调整；借记时在事务内检查余额不会变为负数
    pub async fn insert_adjustment(&self, tx: NewTransaction) -> Result<WalletTransaction> {
        if tx.kind == TransactionKind::Credit {
            return self.insert_transaction(tx).await;
        }

        let outcome = retry::with_retry("insert_adjustment", self.retry_config, || {
            self.debit_adjustment_tx(tx.clone())
        })
        .await?;
        let model = outcome?;

        self.invalidate_count_cache();
        info!(
            "Ledger debit adjustment {} for user {} ({})",
            model.amount, model.user_id, model.reference
        );
        model_to_transaction(model)
    }

    async fn debit_adjustment_tx(
        &self,
        tx: NewTransaction,
    ) -> super::TxOutcome<wallet_transaction::Model> {
        use sea_orm::TransactionTrait;

        let txn = self.db.begin().await?;
        let balance = totals_on(&txn, &self.backend_name, Some(tx.user_id))
            .await?
            .balance();
        if tx.amount > balance {
            return Ok(Err(RewardHubError::insufficient_balance(format!(
                "Balance {} is less than requested debit {}",
                balance, tx.amount
            ))));
        }
        let model = insert_transaction_on(&txn, tx).await?;
        txn.commit().await?;
        Ok(Ok(model))
    }

    /// 余额 = Σcredit − Σdebit
    pub async fn balance_of(&self, user_id: i64) -> Result<i64> {
        Ok(self.wallet_totals(Some(user_id)).await?.balance())
    }

    pub async fn wallet_totals(&self, user_id: Option<i64>) -> Result<WalletTotals> {
        let db = &self.db;
        let backend = self.backend_name.as_str();
        let totals = retry::with_retry("wallet_totals", self.retry_config, || async {
            totals_on(db, backend, user_id).await
        })
        .await?;
        Ok(totals)
    }

    /// 分页流水，按时间倒序；`user_id` 为 None 时返回全部
    pub async fn list_transactions(
        &self,
        user_id: Option<i64>,
        page: u64,
        page_size: u64,
    ) -> Result<Page<WalletTransaction>> {
        let condition = match user_id {
            Some(id) => Condition::all().add(wallet_transaction::Column::UserId.eq(id)),
            None => Condition::all(),
        };

        let db = &self.db;
        let cache_key = format!("transactions:u={:?}", user_id);
        let total = self
            .cached_count(cache_key, "list_transactions(count)", || {
                let cond = condition.clone();
                async move {
                    wallet_transaction::Entity::find()
                        .filter(cond)
                        .count(db)
                        .await
                }
            })
            .await?;

        let models = retry::with_retry("list_transactions(data)", self.retry_config, || async {
            wallet_transaction::Entity::find()
                .filter(condition.clone())
                .order_by_desc(wallet_transaction::Column::CreatedAt)
                .order_by_desc(wallet_transaction::Column::Id)
                .paginate(db, page_size)
                .fetch_page(page.saturating_sub(1))
                .await
        })
        .await?;

        Ok((collect_models(models, model_to_transaction)?, total))
    }

    /// 按 id 升序分批读取全部流水（用于 CSV 导出）
    pub async fn stream_all_transactions(
        &self,
        after_id: i64,
        batch_size: u64,
    ) -> Result<Vec<WalletTransaction>> {
        let db = &self.db;
        let models = retry::with_retry("stream_all_transactions", self.retry_config, || async {
            wallet_transaction::Entity::find()
                .filter(wallet_transaction::Column::Id.gt(after_id))
                .order_by_asc(wallet_transaction::Column::Id)
                .limit(batch_size)
                .all(db)
                .await
        })
        .await?;

        collect_models(models, model_to_transaction)
    }
}
