//! 任务表操作

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use tracing::info;

use super::converters::{collect_models, model_to_task, to_json};
use super::{SeaOrmStorage, retry};
use crate::errors::{Result, RewardHubError};
use crate::storage::models::{NewTask, Page, Task, TaskFilter, TaskPatch, TaskStatus};
use migration::entities::task;

impl SeaOrmStorage {
    pub async fn create_task(&self, new_task: NewTask) -> Result<Task> {
        let now = Utc::now();
        let model = task::ActiveModel {
            id: NotSet,
            title: Set(new_task.title),
            description: Set(new_task.description),
            company_name: Set(new_task.company_name),
            category: Set(new_task.category),
            reward_amount: Set(new_task.reward_amount),
            max_submissions: Set(new_task.max_submissions),
            questions: Set(to_json(&new_task.questions)?),
            logo_url: Set(new_task.logo_url),
            status: Set(TaskStatus::Active.to_string()),
            expires_at: Set(new_task.expires_at),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let inserted = model
            .insert(&self.db)
            .await
            .map_err(|e| RewardHubError::database_operation(format!("创建任务失败: {}", e)))?;

        self.invalidate_count_cache();
        info!("Task created: id={}, title={}", inserted.id, inserted.title);
        model_to_task(inserted)
    }

    pub async fn get_task(&self, id: i64) -> Result<Option<Task>> {
        let db = &self.db;
        let model = retry::with_retry(&format!("get_task({})", id), self.retry_config, || async {
            task::Entity::find_by_id(id).one(db).await
        })
        .await?;
        model.map(model_to_task).transpose()
    }

    pub async fn update_task(&self, id: i64, patch: TaskPatch) -> Result<Task> {
        let model = task::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| RewardHubError::not_found(format!("Task {} not found", id)))?;

        let mut active = model.into_active_model();
        if let Some(title) = patch.title {
            active.title = Set(title);
        }
        if let Some(description) = patch.description {
            active.description = Set(description);
        }
        if let Some(company_name) = patch.company_name {
            active.company_name = Set(company_name);
        }
        if let Some(category) = patch.category {
            active.category = Set(category);
        }
        if let Some(reward_amount) = patch.reward_amount {
            active.reward_amount = Set(reward_amount);
        }
        if let Some(max_submissions) = patch.max_submissions {
            active.max_submissions = Set(max_submissions);
        }
        if let Some(ref questions) = patch.questions {
            active.questions = Set(to_json(questions)?);
        }
        if let Some(logo_url) = patch.logo_url {
            active.logo_url = Set(logo_url);
        }
        if let Some(expires_at) = patch.expires_at {
            active.expires_at = Set(expires_at);
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(&self.db).await?;
        self.invalidate_count_cache();
        info!("Task updated: id={}", id);
        model_to_task(updated)
    }

    /// 修改任务状态；closed 为终态
    pub async fn set_task_status(&self, id: i64, status: TaskStatus) -> Result<Task> {
        let model = task::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| RewardHubError::not_found(format!("Task {} not found", id)))?;
        let current = model_to_task(model.clone())?;

        if !current.status.can_transition_to(status) {
            return Err(RewardHubError::invalid_state(format!(
                "Task {} is {} and cannot become {}",
                id, current.status, status
            )));
        }
        if current.status == status {
            return Ok(current);
        }

        let mut active = model.into_active_model();
        active.status = Set(status.to_string());
        active.updated_at = Set(Utc::now());
        let updated = active.update(&self.db).await?;

        self.invalidate_count_cache();
        info!("Task {} status: {} -> {}", id, current.status, status);
        model_to_task(updated)
    }

    /// 带过滤条件的分页加载任务（带 COUNT 缓存）
    pub async fn list_tasks(
        &self,
        filter: TaskFilter,
        page: u64,
        page_size: u64,
    ) -> Result<Page<Task>> {
        let now = Utc::now();
        let mut condition = Condition::all();

        if let Some(status) = filter.status {
            condition = condition.add(task::Column::Status.eq(status.as_ref()));
        }
        if let Some(ref category) = filter.category {
            condition = condition.add(task::Column::Category.eq(category.as_str()));
        }
        if let Some(ref search) = filter.search {
            condition = condition.add(
                Condition::any()
                    .add(task::Column::Title.contains(search))
                    .add(task::Column::CompanyName.contains(search)),
            );
        }
        // only_open: active 且 expires_at 为 null 或 > now
        if filter.only_open {
            condition = condition
                .add(task::Column::Status.eq(TaskStatus::Active.as_ref()))
                .add(
                    Condition::any()
                        .add(task::Column::ExpiresAt.is_null())
                        .add(task::Column::ExpiresAt.gt(now)),
                );
        }

        // only_open 的结果随时间变化，不走缓存
        let db = &self.db;
        let count_cond = condition.clone();
        let total = if filter.only_open {
            retry::with_retry("list_tasks(count)", self.retry_config, || async {
                task::Entity::find()
                    .filter(count_cond.clone())
                    .count(db)
                    .await
            })
            .await?
        } else {
            let cache_key = format!(
                "tasks:st={:?}:c={:?}:s={:?}",
                filter.status, filter.category, filter.search
            );
            self.cached_count(cache_key, "list_tasks(count)", || {
                let cond = count_cond.clone();
                async move { task::Entity::find().filter(cond).count(db).await }
            })
            .await?
        };

        let models = retry::with_retry("list_tasks(data)", self.retry_config, || async {
            task::Entity::find()
                .filter(condition.clone())
                .order_by_desc(task::Column::CreatedAt)
                .order_by_desc(task::Column::Id)
                .paginate(db, page_size)
                .fetch_page(page.saturating_sub(1))
                .await
        })
        .await?;

        Ok((collect_models(models, model_to_task)?, total))
    }
}
