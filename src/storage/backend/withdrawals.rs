//! 提现申请
//!
//! 申请时在同一事务内重新计算余额并写入 debit；
//! 拒绝时以 `withdrawal-refund:<id>` 为幂等键退回。

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait, sea_query::Expr,
};
use tracing::info;

use super::converters::{collect_models, model_to_withdrawal};
use super::ledger::{insert_transaction_on, totals_on};
use super::{SeaOrmStorage, TxOutcome, retry, sum_as_i64};
use crate::errors::{Result, RewardHubError};
use crate::storage::models::{
    NewTransaction, NewWithdrawal, Page, TransactionKind, Withdrawal, WithdrawalFilter,
    WithdrawalStatus, reference,
};
use migration::entities::withdrawal;

impl SeaOrmStorage {
    /// 创建提现申请并扣款（原子）
    pub async fn create_withdrawal_with_debit(&self, request: NewWithdrawal) -> Result<Withdrawal> {
        let outcome = retry::with_retry(
            &format!("create_withdrawal(user={})", request.user_id),
            self.retry_config,
            || self.create_withdrawal_tx(&request),
        )
        .await?;
        let created = outcome?;

        self.invalidate_count_cache();
        info!(
            "Withdrawal {} requested: user={}, amount={}, method={}",
            created.id, created.user_id, created.amount, created.method
        );
        Ok(created)
    }

    async fn create_withdrawal_tx(&self, request: &NewWithdrawal) -> TxOutcome<Withdrawal> {
        let txn = self.db.begin().await?;

        let balance = totals_on(&txn, &self.backend_name, Some(request.user_id))
            .await?
            .balance();
        if request.amount > balance {
            return Ok(Err(RewardHubError::insufficient_balance(format!(
                "Requested {} but available balance is {}",
                request.amount, balance
            ))));
        }

        let model = withdrawal::ActiveModel {
            id: NotSet,
            user_id: Set(request.user_id),
            amount: Set(request.amount),
            method: Set(request.method.to_string()),
            account_details: Set(request.account_details.clone()),
            status: Set(WithdrawalStatus::Pending.to_string()),
            rejection_reason: Set(None),
            payout_reference: Set(None),
            requested_at: Set(Utc::now()),
            processed_at: Set(None),
        }
        .insert(&txn)
        .await?;

        insert_transaction_on(
            &txn,
            NewTransaction {
                user_id: request.user_id,
                kind: TransactionKind::Debit,
                amount: request.amount,
                description: format!("Withdrawal #{} via {}", model.id, request.method),
                reference: reference::withdrawal(model.id),
            },
        )
        .await?;

        txn.commit().await?;
        Ok(model_to_withdrawal(model))
    }

    pub async fn get_withdrawal(&self, id: i64) -> Result<Option<Withdrawal>> {
        let db = &self.db;
        let model = retry::with_retry(&format!("get_withdrawal({})", id), self.retry_config, || async {
            withdrawal::Entity::find_by_id(id).one(db).await
        })
        .await?;
        model.map(model_to_withdrawal).transpose()
    }

    pub async fn list_withdrawals(
        &self,
        filter: WithdrawalFilter,
        page: u64,
        page_size: u64,
    ) -> Result<Page<Withdrawal>> {
        let mut condition = Condition::all();
        if let Some(status) = filter.status {
            condition = condition.add(withdrawal::Column::Status.eq(status.as_ref()));
        }
        if let Some(user_id) = filter.user_id {
            condition = condition.add(withdrawal::Column::UserId.eq(user_id));
        }

        let db = &self.db;
        let cache_key = format!("withdrawals:st={:?}:u={:?}", filter.status, filter.user_id);
        let total = self
            .cached_count(cache_key, "list_withdrawals(count)", || {
                let cond = condition.clone();
                async move { withdrawal::Entity::find().filter(cond).count(db).await }
            })
            .await?;

        let models = retry::with_retry("list_withdrawals(data)", self.retry_config, || async {
            withdrawal::Entity::find()
                .filter(condition.clone())
                .order_by_desc(withdrawal::Column::RequestedAt)
                .order_by_desc(withdrawal::Column::Id)
                .paginate(db, page_size)
                .fetch_page(page.saturating_sub(1))
                .await
        })
        .await?;

        Ok((collect_models(models, model_to_withdrawal)?, total))
    }

    /// 处理中的提现总额；`user_id` 为 None 时统计全部
    pub async fn pending_withdrawal_total(&self, user_id: Option<i64>) -> Result<i64> {
        let mut query = withdrawal::Entity::find()
            .select_only()
            .column_as(sum_as_i64(&self.backend_name, withdrawal::Column::Amount), "total")
            .filter(withdrawal::Column::Status.eq(WithdrawalStatus::Pending.as_ref()));
        if let Some(user_id) = user_id {
            query = query.filter(withdrawal::Column::UserId.eq(user_id));
        }

        let total = query.into_tuple::<Option<i64>>().one(&self.db).await?;
        Ok(total.flatten().unwrap_or(0))
    }

    /// pending -> paid
    pub async fn mark_withdrawal_paid(
        &self,
        id: i64,
        payout_reference: Option<String>,
    ) -> Result<Withdrawal> {
        let updated = withdrawal::Entity::update_many()
            .col_expr(
                withdrawal::Column::Status,
                Expr::value(WithdrawalStatus::Paid.as_ref()),
            )
            .col_expr(withdrawal::Column::PayoutReference, Expr::value(payout_reference))
            .col_expr(withdrawal::Column::ProcessedAt, Expr::value(Utc::now()))
            .filter(withdrawal::Column::Id.eq(id))
            .filter(withdrawal::Column::Status.eq(WithdrawalStatus::Pending.as_ref()))
            .exec(&self.db)
            .await?;

        let record = self
            .get_withdrawal(id)
            .await?
            .ok_or_else(|| RewardHubError::not_found(format!("Withdrawal {} not found", id)))?;
        if updated.rows_affected == 0 {
            return Err(RewardHubError::invalid_state(format!(
                "Withdrawal {} is already {}",
                id, record.status
            )));
        }

        self.invalidate_count_cache();
        info!("Withdrawal {} marked as paid", id);
        Ok(record)
    }

    /// pending -> rejected，并退回扣款
    pub async fn reject_withdrawal_and_refund(&self, id: i64, reason: &str) -> Result<Withdrawal> {
        let outcome = retry::with_retry(
            &format!("reject_withdrawal({})", id),
            self.retry_config,
            || self.reject_withdrawal_tx(id, reason),
        )
        .await?;
        let record = outcome?;

        self.invalidate_count_cache();
        info!(
            "Withdrawal {} rejected, refunded {} to user {}",
            id, record.amount, record.user_id
        );
        Ok(record)
    }

    async fn reject_withdrawal_tx(&self, id: i64, reason: &str) -> TxOutcome<Withdrawal> {
        let txn = self.db.begin().await?;

        let updated = withdrawal::Entity::update_many()
            .col_expr(
                withdrawal::Column::Status,
                Expr::value(WithdrawalStatus::Rejected.as_ref()),
            )
            .col_expr(withdrawal::Column::RejectionReason, Expr::value(reason.to_string()))
            .col_expr(withdrawal::Column::ProcessedAt, Expr::value(Utc::now()))
            .filter(withdrawal::Column::Id.eq(id))
            .filter(withdrawal::Column::Status.eq(WithdrawalStatus::Pending.as_ref()))
            .exec(&txn)
            .await?;

        let Some(model) = withdrawal::Entity::find_by_id(id).one(&txn).await? else {
            return Ok(Err(RewardHubError::not_found(format!(
                "Withdrawal {} not found",
                id
            ))));
        };
        if updated.rows_affected == 0 {
            return Ok(Err(RewardHubError::invalid_state(format!(
                "Withdrawal {} is already {}",
                id, model.status
            ))));
        }

        let refund = NewTransaction {
            user_id: model.user_id,
            kind: TransactionKind::Credit,
            amount: model.amount,
            description: format!("Refund for rejected withdrawal #{}", id),
            reference: reference::withdrawal_refund(id),
        };
        if let Err(e) = insert_transaction_on(&txn, refund).await {
            if retry::is_unique_violation(&e) {
                return Ok(Err(RewardHubError::conflict(format!(
                    "Withdrawal {} was already refunded",
                    id
                ))));
            }
            return Err(e);
        }

        txn.commit().await?;
        Ok(model_to_withdrawal(model))
    }
}
