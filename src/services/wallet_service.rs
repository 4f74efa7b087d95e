//! Wallet and withdrawals
//!
//! The balance is never stored: it is `Σ credits − Σ debits` over the
//! ledger, recomputed on every read. Withdrawal requests of one user are
//! serialized in-process; the storage transaction re-checks the balance.

use std::sync::Arc;

use dashmap::DashMap;
use futures_util::stream::{self, Stream};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::config::RewardsConfig;
use crate::errors::{Result, RewardHubError};
use crate::services::validation::trimmed_len_between;
use crate::storage::{
    KycStatus, NewTransaction, NewWithdrawal, Page, SeaOrmStorage, TransactionKind,
    WalletTransaction, Withdrawal, WithdrawalFilter, WithdrawalMethod, reference,
};

/// 钱包概览；提现驳回的退款既不算收入也不算提现
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct WalletSummary {
    pub balance: i64,
    pub total_earned: i64,
    pub total_withdrawn: i64,
    pub pending_withdrawals: i64,
    pub currency: String,
}

#[derive(Debug, Clone)]
pub struct WithdrawalRequest {
    pub amount: i64,
    pub method: WithdrawalMethod,
    pub account_details: String,
}

pub struct WalletService {
    storage: Arc<SeaOrmStorage>,
    rules: RewardsConfig,
    /// 每个用户一把锁，串行化同一用户的提现申请
    user_locks: DashMap<i64, Arc<Mutex<()>>>,
}

impl WalletService {
    pub fn new(storage: Arc<SeaOrmStorage>, rules: RewardsConfig) -> Self {
        Self {
            storage,
            rules,
            user_locks: DashMap::new(),
        }
    }

    pub fn currency(&self) -> &str {
        &self.rules.currency
    }

    fn lock_for(&self, user_id: i64) -> Arc<Mutex<()>> {
        self.user_locks
            .entry(user_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    pub async fn summary(&self, user_id: i64) -> Result<WalletSummary> {
        let totals = self.storage.wallet_totals(Some(user_id)).await?;
        let pending = self.storage.pending_withdrawal_total(Some(user_id)).await?;

        Ok(WalletSummary {
            balance: totals.balance(),
            total_earned: totals.earned(),
            total_withdrawn: totals.withdrawn(),
            pending_withdrawals: pending,
            currency: self.rules.currency.clone(),
        })
    }

    pub async fn transactions(
        &self,
        user_id: i64,
        page: u64,
        page_size: u64,
    ) -> Result<Page<WalletTransaction>> {
        self.storage
            .list_transactions(Some(user_id), page, page_size)
            .await
    }

    pub async fn all_transactions(&self, page: u64, page_size: u64) -> Result<Page<WalletTransaction>> {
        self.storage.list_transactions(None, page, page_size).await
    }

    /// 管理员手动调整余额
    pub async fn adjust(
        &self,
        user_id: i64,
        kind: TransactionKind,
        amount: i64,
        note: &str,
    ) -> Result<WalletTransaction> {
        if amount <= 0 {
            return Err(RewardHubError::validation("amount must be positive"));
        }
        let note = trimmed_len_between("note", note, 1, 200)?;
        if self.storage.get_user(user_id).await?.is_none() {
            return Err(RewardHubError::not_found(format!("User {} not found", user_id)));
        }

        let lock = self.lock_for(user_id);
        let _guard = lock.lock().await;

        let tx = self
            .storage
            .insert_adjustment(NewTransaction {
                user_id,
                kind,
                amount,
                description: format!("Adjustment: {}", note),
                reference: reference::adjustment(),
            })
            .await?;
        warn!("Manual {} of {} applied to user {}", kind, amount, user_id);
        Ok(tx)
    }

    pub async fn request_withdrawal(
        &self,
        user_id: i64,
        req: WithdrawalRequest,
    ) -> Result<Withdrawal> {
        let account_details =
            trimmed_len_between("account_details", &req.account_details, 1, 200)?;
        if req.amount < self.rules.min_withdrawal {
            return Err(RewardHubError::validation(format!(
                "Minimum withdrawal is {} {}",
                self.rules.min_withdrawal, self.rules.currency
            )));
        }

        let kyc_status = self.storage.get_kyc(user_id).await?.map(|k| k.status);
        if kyc_status != Some(KycStatus::Approved) {
            return Err(RewardHubError::kyc_not_approved(
                "Identity verification must be approved before withdrawing",
            ));
        }

        let lock = self.lock_for(user_id);
        let _guard = lock.lock().await;

        self.storage
            .create_withdrawal_with_debit(NewWithdrawal {
                user_id,
                amount: req.amount,
                method: req.method,
                account_details,
            })
            .await
    }

    pub async fn list_for_user(
        &self,
        user_id: i64,
        page: u64,
        page_size: u64,
    ) -> Result<Page<Withdrawal>> {
        let filter = WithdrawalFilter {
            user_id: Some(user_id),
            ..Default::default()
        };
        self.storage.list_withdrawals(filter, page, page_size).await
    }

    pub async fn list_withdrawals(
        &self,
        filter: WithdrawalFilter,
        page: u64,
        page_size: u64,
    ) -> Result<Page<Withdrawal>> {
        self.storage.list_withdrawals(filter, page, page_size).await
    }

    pub async fn approve_withdrawal(&self, id: i64, payout_reference: Option<String>) -> Result<Withdrawal> {
        let payout_reference = payout_reference
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());
        self.storage.mark_withdrawal_paid(id, payout_reference).await
    }

    pub async fn reject_withdrawal(&self, id: i64, reason: &str) -> Result<Withdrawal> {
        let reason = trimmed_len_between("reason", reason, 1, 500)?;
        self.storage.reject_withdrawal_and_refund(id, &reason).await
    }

    /// 按 id 升序分批读取全部流水，空批次表示结束
    pub fn transaction_batches(
        &self,
        batch_size: u64,
    ) -> impl Stream<Item = Result<Vec<WalletTransaction>>> + Send + 'static {
        let storage = self.storage.clone();
        stream::unfold(Some(0i64), move |cursor| {
            let storage = storage.clone();
            async move {
                let after_id = cursor?;
                match storage.stream_all_transactions(after_id, batch_size).await {
                    Ok(batch) if batch.is_empty() => None,
                    Ok(batch) => {
                        let next = batch.last().map(|tx| tx.id);
                        info!("Ledger export batch: {} rows after id {}", batch.len(), after_id);
                        Some((Ok(batch), next))
                    }
                    Err(e) => Some((Err(e), None)),
                }
            }
        })
    }
}
