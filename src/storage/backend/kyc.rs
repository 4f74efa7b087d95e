use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait, sea_query::Expr,
};
use tracing::info;

use super::converters::{collect_models, model_to_kyc, to_json};
use super::{SeaOrmStorage, TxOutcome, retry};
use crate::errors::{Result, RewardHubError};
use crate::storage::models::{KycInfo, KycStatus, NewKyc, Page};
use migration::entities::kyc_info;

impl SeaOrmStorage {
    pub async fn get_kyc(&self, user_id: i64) -> Result<Option<KycInfo>> {
        let db = &self.db;
        let model = retry::with_retry(&format!("get_kyc({})", user_id), self.retry_config, || async {
            kyc_info::Entity::find()
                .filter(kyc_info::Column::UserId.eq(user_id))
                .one(db)
                .await
        })
        .await?;
        model.map(model_to_kyc).transpose()
    }

    /// 首次提交或被拒后重新提交，状态置为 pending
    pub async fn upsert_kyc_submission(&self, kyc: NewKyc) -> Result<KycInfo> {
        let document_urls = to_json(&kyc.document_urls)?;
        let outcome = retry::with_retry(
            &format!("upsert_kyc({})", kyc.user_id),
            self.retry_config,
            || self.upsert_kyc_tx(&kyc, &document_urls),
        )
        .await?;
        let info = outcome?;

        self.invalidate_count_cache();
        info!("KYC submitted: user={}", info.user_id);
        Ok(info)
    }

    async fn upsert_kyc_tx(&self, kyc: &NewKyc, document_urls: &str) -> TxOutcome<KycInfo> {
        let txn = self.db.begin().await?;
        let now = Utc::now();

        let existing = kyc_info::Entity::find()
            .filter(kyc_info::Column::UserId.eq(kyc.user_id))
            .one(&txn)
            .await?;

        let saved = match existing {
            None => {
                let model = kyc_info::ActiveModel {
                    id: NotSet,
                    user_id: Set(kyc.user_id),
                    full_name: Set(kyc.full_name.clone()),
                    date_of_birth: Set(kyc.date_of_birth),
                    document_type: Set(kyc.document_type.to_string()),
                    document_number: Set(kyc.document_number.clone()),
                    document_urls: Set(document_urls.to_string()),
                    address: Set(kyc.address.clone()),
                    status: Set(KycStatus::Pending.to_string()),
                    rejection_reason: Set(None),
                    submitted_at: Set(now),
                    reviewed_at: Set(None),
                };
                match model.insert(&txn).await {
                    Ok(m) => m,
                    Err(e) if retry::is_unique_violation(&e) => {
                        return Ok(Err(RewardHubError::conflict(
                            "KYC submission already exists",
                        )));
                    }
                    Err(e) => return Err(e),
                }
            }
            Some(model) if model.status == KycStatus::Rejected.as_ref() => {
                let mut active = model.into_active_model();
                active.full_name = Set(kyc.full_name.clone());
                active.date_of_birth = Set(kyc.date_of_birth);
                active.document_type = Set(kyc.document_type.to_string());
                active.document_number = Set(kyc.document_number.clone());
                active.document_urls = Set(document_urls.to_string());
                active.address = Set(kyc.address.clone());
                active.status = Set(KycStatus::Pending.to_string());
                active.rejection_reason = Set(None);
                active.submitted_at = Set(now);
                active.reviewed_at = Set(None);
                active.update(&txn).await?
            }
            Some(model) => {
                return Ok(Err(RewardHubError::conflict(format!(
                    "KYC is already {}",
                    model.status
                ))));
            }
        };

        txn.commit().await?;
        Ok(model_to_kyc(saved))
    }

    /// 审核 KYC：仅 pending 状态可以变更
    pub async fn review_kyc(
        &self,
        user_id: i64,
        status: KycStatus,
        reason: Option<String>,
    ) -> Result<KycInfo> {
        if status == KycStatus::Pending {
            return Err(RewardHubError::validation(
                "Review outcome must be approved or rejected",
            ));
        }

        let updated = kyc_info::Entity::update_many()
            .col_expr(kyc_info::Column::Status, Expr::value(status.as_ref()))
            .col_expr(kyc_info::Column::RejectionReason, Expr::value(reason))
            .col_expr(kyc_info::Column::ReviewedAt, Expr::value(Utc::now()))
            .filter(kyc_info::Column::UserId.eq(user_id))
            .filter(kyc_info::Column::Status.eq(KycStatus::Pending.as_ref()))
            .exec(&self.db)
            .await?;

        let info = self.get_kyc(user_id).await?.ok_or_else(|| {
            RewardHubError::not_found(format!("No KYC submission for user {}", user_id))
        })?;
        if updated.rows_affected == 0 {
            return Err(RewardHubError::invalid_state(format!(
                "KYC for user {} is already {}",
                user_id, info.status
            )));
        }

        self.invalidate_count_cache();
        info!("KYC for user {} reviewed: {}", user_id, status);
        Ok(info)
    }

    pub async fn list_kyc(
        &self,
        status: Option<KycStatus>,
        page: u64,
        page_size: u64,
    ) -> Result<Page<KycInfo>> {
        let mut condition = Condition::all();
        if let Some(status) = status {
            condition = condition.add(kyc_info::Column::Status.eq(status.as_ref()));
        }

        let db = &self.db;
        let total = self
            .cached_count(format!("kyc:st={:?}", status), "list_kyc(count)", || {
                let cond = condition.clone();
                async move { kyc_info::Entity::find().filter(cond).count(db).await }
            })
            .await?;

        let models = retry::with_retry("list_kyc(data)", self.retry_config, || async {
            kyc_info::Entity::find()
                .filter(condition.clone())
                .order_by_asc(kyc_info::Column::SubmittedAt)
                .order_by_asc(kyc_info::Column::Id)
                .paginate(db, page_size)
                .fetch_page(page.saturating_sub(1))
                .await
        })
        .await?;

        Ok((collect_models(models, model_to_kyc)?, total))
    }
}
