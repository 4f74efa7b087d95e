use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

use super::SeaOrmStorage;
use crate::errors::Result;
use crate::storage::models::{
    AdminStats, KycStatus, SurveyStatus, TaskStatus, WithdrawalStatus,
};
use migration::entities::{kyc_info, survey, task, user, withdrawal};

impl SeaOrmStorage {
    /// 管理后台概览
    pub async fn admin_stats(&self) -> Result<AdminStats> {
        let db = &self.db;

        let users = user::Entity::find().count(db).await?;
        let active_tasks = task::Entity::find()
            .filter(task::Column::Status.eq(TaskStatus::Active.as_ref()))
            .count(db)
            .await?;
        let pending_surveys = survey::Entity::find()
            .filter(survey::Column::Status.eq(SurveyStatus::Pending.as_ref()))
            .count(db)
            .await?;
        let approved_surveys = survey::Entity::find()
            .filter(survey::Column::Status.eq(SurveyStatus::Approved.as_ref()))
            .count(db)
            .await?;
        let pending_kyc = kyc_info::Entity::find()
            .filter(kyc_info::Column::Status.eq(KycStatus::Pending.as_ref()))
            .count(db)
            .await?;
        let pending_withdrawals = withdrawal::Entity::find()
            .filter(withdrawal::Column::Status.eq(WithdrawalStatus::Pending.as_ref()))
            .count(db)
            .await?;

        let totals = self.wallet_totals(None).await?;

        Ok(AdminStats {
            users,
            active_tasks,
            pending_surveys,
            approved_surveys,
            pending_kyc,
            pending_withdrawals,
            total_credited: totals.earned(),
            total_withdrawn: totals.withdrawn(),
        })
    }
}
