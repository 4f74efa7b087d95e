//! 问卷提交与审核
//!
//! 审核通过与入账在同一个事务内完成：
//! 1. 条件更新 pending -> approved（并发审核只有一个能成功）
//! 2. 以 `survey:<id>` 为幂等键写入 credit 流水（唯一索引兜底）

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, ConnectionTrait, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
    sea_query::Expr,
};
use tracing::{info, warn};

use super::converters::{collect_models, model_to_survey, to_json};
use super::ledger::insert_transaction_on;
use super::{SeaOrmStorage, TxOutcome, retry};
use crate::errors::{Result, RewardHubError};
use crate::storage::models::{
    NewSurvey, NewTransaction, Page, Survey, SurveyFilter, SurveyStatus, TransactionKind,
    reference,
};
use migration::entities::{survey, task};

/// 非 rejected 的提交占用名额
fn counted_submission() -> Condition {
    Condition::all().add(survey::Column::Status.ne(SurveyStatus::Rejected.as_ref()))
}

fn already_submitted() -> RewardHubError {
    RewardHubError::conflict("You have already submitted a survey for this task")
}

async fn count_task_submissions_on<C: ConnectionTrait>(
    conn: &C,
    task_id: i64,
) -> std::result::Result<u64, sea_orm::DbErr> {
    survey::Entity::find()
        .filter(survey::Column::TaskId.eq(task_id))
        .filter(counted_submission())
        .count(conn)
        .await
}

impl SeaOrmStorage {
    /// 写入新提交；同一 (task, user) 重复提交返回 Conflict，名额已满返回 InvalidState
    pub async fn insert_survey(
        &self,
        new_survey: NewSurvey,
        max_submissions: Option<i32>,
    ) -> Result<Survey> {
        let image_urls = to_json(&new_survey.image_urls)?;
        let responses = to_json(&new_survey.responses)?;

        let outcome = retry::with_retry(
            &format!("insert_survey(task={})", new_survey.task_id),
            self.retry_config,
            || self.insert_survey_tx(&new_survey, &image_urls, &responses, max_submissions),
        )
        .await?;
        let survey = outcome?;

        self.invalidate_count_cache();
        info!(
            "Survey submitted: id={}, task={}, user={}",
            survey.id, survey.task_id, survey.user_id
        );
        Ok(survey)
    }

    async fn insert_survey_tx(
        &self,
        new_survey: &NewSurvey,
        image_urls: &str,
        responses: &str,
        max_submissions: Option<i32>,
    ) -> TxOutcome<Survey> {
        let txn = self.db.begin().await?;

        // 重复提交优先于名额判断
        let existing = survey::Entity::find()
            .filter(survey::Column::TaskId.eq(new_survey.task_id))
            .filter(survey::Column::UserId.eq(new_survey.user_id))
            .count(&txn)
            .await?;
        if existing > 0 {
            return Ok(Err(already_submitted()));
        }

        if let Some(max) = max_submissions {
            let used = count_task_submissions_on(&txn, new_survey.task_id).await?;
            if used >= max.max(0) as u64 {
                return Ok(Err(RewardHubError::invalid_state(
                    "Task has reached its maximum number of submissions",
                )));
            }
        }

        let model = survey::ActiveModel {
            id: NotSet,
            task_id: Set(new_survey.task_id),
            user_id: Set(new_survey.user_id),
            rating: Set(new_survey.rating),
            review_text: Set(new_survey.review_text.clone()),
            image_urls: Set(image_urls.to_string()),
            responses: Set(responses.to_string()),
            status: Set(SurveyStatus::Pending.to_string()),
            rejection_reason: Set(None),
            reward_amount: Set(None),
            submitted_at: Set(Utc::now()),
            reviewed_at: Set(None),
            reviewed_by: Set(None),
        };

        let inserted = match model.insert(&txn).await {
            Ok(m) => m,
            Err(e) if retry::is_unique_violation(&e) => return Ok(Err(already_submitted())),
            Err(e) => return Err(e),
        };

        txn.commit().await?;
        Ok(model_to_survey(inserted))
    }

    pub async fn get_survey(&self, id: i64) -> Result<Option<Survey>> {
        let db = &self.db;
        let model = retry::with_retry(&format!("get_survey({})", id), self.retry_config, || async {
            survey::Entity::find_by_id(id).one(db).await
        })
        .await?;
        model.map(model_to_survey).transpose()
    }

    pub async fn list_surveys(
        &self,
        filter: SurveyFilter,
        page: u64,
        page_size: u64,
    ) -> Result<Page<Survey>> {
        let mut condition = Condition::all();
        if let Some(status) = filter.status {
            condition = condition.add(survey::Column::Status.eq(status.as_ref()));
        }
        if let Some(task_id) = filter.task_id {
            condition = condition.add(survey::Column::TaskId.eq(task_id));
        }
        if let Some(user_id) = filter.user_id {
            condition = condition.add(survey::Column::UserId.eq(user_id));
        }

        let db = &self.db;
        let cache_key = format!(
            "surveys:st={:?}:t={:?}:u={:?}",
            filter.status, filter.task_id, filter.user_id
        );
        let total = self
            .cached_count(cache_key, "list_surveys(count)", || {
                let cond = condition.clone();
                async move { survey::Entity::find().filter(cond).count(db).await }
            })
            .await?;

        let models = retry::with_retry("list_surveys(data)", self.retry_config, || async {
            survey::Entity::find()
                .filter(condition.clone())
                .order_by_desc(survey::Column::SubmittedAt)
                .order_by_desc(survey::Column::Id)
                .paginate(db, page_size)
                .fetch_page(page.saturating_sub(1))
                .await
        })
        .await?;

        Ok((collect_models(models, model_to_survey)?, total))
    }

    /// 任务已占用的提交数（不含 rejected）
    pub async fn count_task_submissions(&self, task_id: i64) -> Result<u64> {
        let db = &self.db;
        let count = retry::with_retry("count_task_submissions", self.retry_config, || async {
            count_task_submissions_on(db, task_id).await
        })
        .await?;
        Ok(count)
    }

    /// 批量统计多个任务的提交数
    pub async fn count_submissions_for_tasks(
        &self,
        task_ids: &[i64],
    ) -> Result<HashMap<i64, u64>> {
        if task_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(i64, i64)> = survey::Entity::find()
            .select_only()
            .column(survey::Column::TaskId)
            .column_as(survey::Column::Id.count(), "submissions")
            .filter(survey::Column::TaskId.is_in(task_ids.iter().copied()))
            .filter(counted_submission())
            .group_by(survey::Column::TaskId)
            .into_tuple()
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(task_id, count)| (task_id, count.max(0) as u64))
            .collect())
    }

    /// 用户在给定任务中已提交过的任务 id
    pub async fn submitted_task_ids(&self, user_id: i64, task_ids: &[i64]) -> Result<HashSet<i64>> {
        if task_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let ids: Vec<i64> = survey::Entity::find()
            .select_only()
            .column(survey::Column::TaskId)
            .filter(survey::Column::UserId.eq(user_id))
            .filter(survey::Column::TaskId.is_in(task_ids.iter().copied()))
            .into_tuple()
            .all(&self.db)
            .await?;

        Ok(ids.into_iter().collect())
    }

    /// 审核通过并按任务当前奖励入账（恰好一次）
    pub async fn approve_survey_and_credit(&self, id: i64, reviewer: &str) -> Result<Survey> {
        let outcome = retry::with_retry(
            &format!("approve_survey({})", id),
            self.retry_config,
            || self.approve_survey_tx(id, reviewer),
        )
        .await?;
        let survey = outcome?;

        self.invalidate_count_cache();
        info!(
            "Survey {} approved by {}: credited {} to user {}",
            id,
            reviewer,
            survey.reward_amount.unwrap_or_default(),
            survey.user_id
        );
        Ok(survey)
    }

    async fn approve_survey_tx(&self, id: i64, reviewer: &str) -> TxOutcome<Survey> {
        let txn = self.db.begin().await?;
        let now = Utc::now();

        let updated = survey::Entity::update_many()
            .col_expr(
                survey::Column::Status,
                Expr::value(SurveyStatus::Approved.as_ref()),
            )
            .col_expr(survey::Column::ReviewedAt, Expr::value(now))
            .col_expr(survey::Column::ReviewedBy, Expr::value(reviewer.to_string()))
            .filter(survey::Column::Id.eq(id))
            .filter(survey::Column::Status.eq(SurveyStatus::Pending.as_ref()))
            .exec(&txn)
            .await?;

        let Some(model) = survey::Entity::find_by_id(id).one(&txn).await? else {
            return Ok(Err(RewardHubError::not_found(format!(
                "Survey {} not found",
                id
            ))));
        };
        if updated.rows_affected == 0 {
            return Ok(Err(RewardHubError::invalid_state(format!(
                "Survey {} is already {}",
                id, model.status
            ))));
        }

        let Some(task_model) = task::Entity::find_by_id(model.task_id).one(&txn).await? else {
            return Ok(Err(RewardHubError::not_found(format!(
                "Task {} not found",
                model.task_id
            ))));
        };
        let amount = task_model.reward_amount;

        let credit = NewTransaction {
            user_id: model.user_id,
            kind: TransactionKind::Credit,
            amount,
            description: format!("Reward for task #{}: {}", task_model.id, task_model.title),
            reference: reference::survey_reward(id),
        };
        if let Err(e) = insert_transaction_on(&txn, credit).await {
            if retry::is_unique_violation(&e) {
                warn!("Reward for survey {} already exists in ledger", id);
                return Ok(Err(RewardHubError::conflict(format!(
                    "Reward for survey {} was already credited",
                    id
                ))));
            }
            return Err(e);
        }

        survey::Entity::update_many()
            .col_expr(survey::Column::RewardAmount, Expr::value(amount))
            .filter(survey::Column::Id.eq(id))
            .exec(&txn)
            .await?;

        let model = survey::Entity::find_by_id(id).one(&txn).await?;
        txn.commit().await?;

        Ok(model
            .ok_or_else(|| RewardHubError::not_found(format!("Survey {} not found", id)))
            .and_then(model_to_survey))
    }

    /// pending -> rejected
    pub async fn reject_survey(&self, id: i64, reviewer: &str, reason: &str) -> Result<Survey> {
        let now = Utc::now();
        let updated = survey::Entity::update_many()
            .col_expr(
                survey::Column::Status,
                Expr::value(SurveyStatus::Rejected.as_ref()),
            )
            .col_expr(survey::Column::RejectionReason, Expr::value(reason.to_string()))
            .col_expr(survey::Column::ReviewedAt, Expr::value(now))
            .col_expr(survey::Column::ReviewedBy, Expr::value(reviewer.to_string()))
            .filter(survey::Column::Id.eq(id))
            .filter(survey::Column::Status.eq(SurveyStatus::Pending.as_ref()))
            .exec(&self.db)
            .await?;

        let survey = self
            .get_survey(id)
            .await?
            .ok_or_else(|| RewardHubError::not_found(format!("Survey {} not found", id)))?;
        if updated.rows_affected == 0 {
            return Err(RewardHubError::invalid_state(format!(
                "Survey {} is already {}",
                id, survey.status
            )));
        }

        self.invalidate_count_cache();
        info!("Survey {} rejected by {}", id, reviewer);
        Ok(survey)
    }
}
