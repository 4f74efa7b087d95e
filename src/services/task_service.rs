//! Task catalogue service

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::{Result, RewardHubError};
use crate::services::validation::{optional_text, trimmed_len_between, validate_logo_url};
use crate::storage::{
    NewTask, Page, SeaOrmStorage, Task, TaskFilter, TaskPatch, TaskQuestion, TaskStatus,
};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub company_name: String,
    pub category: Option<String>,
    pub reward_amount: i64,
    pub max_submissions: Option<i32>,
    #[serde(default)]
    pub questions: Vec<TaskQuestion>,
    pub logo_url: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// 部分更新；可清空字段用空串 / null 表示
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub company_name: Option<String>,
    pub category: Option<String>,
    pub reward_amount: Option<i64>,
    #[serde(default, with = "double_option")]
    pub max_submissions: Option<Option<i32>>,
    pub questions: Option<Vec<TaskQuestion>>,
    pub logo_url: Option<String>,
    #[serde(default, with = "double_option")]
    pub expires_at: Option<Option<DateTime<Utc>>>,
}

/// 区分字段缺失（None）与显式 null（Some(None)）
mod double_option {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

/// 用户视角的任务
#[derive(Debug, Clone, Serialize)]
pub struct TaskView {
    #[serde(flatten)]
    pub task: Task,
    pub submissions_count: u64,
    pub already_submitted: bool,
}

fn validate_questions(questions: &[TaskQuestion]) -> Result<Vec<TaskQuestion>> {
    let mut seen = HashSet::new();
    questions
        .iter()
        .map(|q| {
            let id = q.id.trim();
            if id.is_empty() {
                return Err(RewardHubError::validation("Question id cannot be empty"));
            }
            if !seen.insert(id.to_string()) {
                return Err(RewardHubError::validation(format!(
                    "Duplicate question id: {}",
                    id
                )));
            }
            Ok(TaskQuestion {
                id: id.to_string(),
                prompt: trimmed_len_between("question prompt", &q.prompt, 1, 500)?,
                required: q.required,
            })
        })
        .collect()
}

fn validate_reward(amount: i64) -> Result<()> {
    if amount <= 0 {
        return Err(RewardHubError::validation("reward_amount must be positive"));
    }
    Ok(())
}

fn validate_max_submissions(max: Option<i32>) -> Result<()> {
    if max.is_some_and(|m| m <= 0) {
        return Err(RewardHubError::validation(
            "max_submissions must be positive",
        ));
    }
    Ok(())
}

fn validate_logo(url: Option<&str>) -> Result<Option<String>> {
    match url.map(str::trim).filter(|u| !u.is_empty()) {
        Some(url) => {
            validate_logo_url(url)?;
            Ok(Some(url.to_string()))
        }
        None => Ok(None),
    }
}

pub struct TaskService {
    storage: Arc<SeaOrmStorage>,
}

impl TaskService {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self { storage }
    }

    pub async fn create_task(&self, req: CreateTaskRequest) -> Result<Task> {
        validate_reward(req.reward_amount)?;
        validate_max_submissions(req.max_submissions)?;
        if req.expires_at.is_some_and(|exp| exp <= Utc::now()) {
            return Err(RewardHubError::validation(
                "expires_at must be in the future",
            ));
        }

        let new_task = NewTask {
            title: trimmed_len_between("title", &req.title, 3, 120)?,
            description: trimmed_len_between("description", &req.description, 0, 5000)?,
            company_name: trimmed_len_between("company_name", &req.company_name, 1, 120)?,
            category: optional_text("category", req.category.as_deref(), 60)?,
            reward_amount: req.reward_amount,
            max_submissions: req.max_submissions,
            questions: validate_questions(&req.questions)?,
            logo_url: validate_logo(req.logo_url.as_deref())?,
            expires_at: req.expires_at,
        };

        let task = self.storage.create_task(new_task).await?;
        info!(
            "Task {} created: '{}' by {}, reward {}",
            task.id, task.title, task.company_name, task.reward_amount
        );
        Ok(task)
    }

    pub async fn update_task(&self, id: i64, req: UpdateTaskRequest) -> Result<Task> {
        let mut patch = TaskPatch::default();

        if let Some(title) = req.title.as_deref() {
            patch.title = Some(trimmed_len_between("title", title, 3, 120)?);
        }
        if let Some(desc) = req.description.as_deref() {
            patch.description = Some(trimmed_len_between("description", desc, 0, 5000)?);
        }
        if let Some(company) = req.company_name.as_deref() {
            patch.company_name = Some(trimmed_len_between("company_name", company, 1, 120)?);
        }
        if let Some(category) = req.category.as_deref() {
            patch.category = Some(optional_text("category", Some(category), 60)?);
        }
        if let Some(amount) = req.reward_amount {
            validate_reward(amount)?;
            patch.reward_amount = Some(amount);
        }
        if let Some(max) = req.max_submissions {
            validate_max_submissions(max)?;
            patch.max_submissions = Some(max);
        }
        if let Some(questions) = req.questions.as_deref() {
            patch.questions = Some(validate_questions(questions)?);
        }
        if let Some(logo) = req.logo_url.as_deref() {
            patch.logo_url = Some(validate_logo(Some(logo))?);
        }
        patch.expires_at = req.expires_at;

        let task = self.storage.update_task(id, patch).await?;
        info!("Task {} updated", id);
        Ok(task)
    }

    pub async fn set_status(&self, id: i64, status: TaskStatus) -> Result<Task> {
        self.storage.set_task_status(id, status).await
    }

    pub async fn get_task(&self, id: i64) -> Result<Task> {
        self.storage
            .get_task(id)
            .await?
            .ok_or_else(|| RewardHubError::not_found(format!("Task {} not found", id)))
    }

    pub async fn list_tasks(&self, filter: TaskFilter, page: u64, page_size: u64) -> Result<Page<Task>> {
        self.storage.list_tasks(filter, page, page_size).await
    }

    /// 用户只能看到开放中的任务
    pub async fn list_open_for_user(
        &self,
        user_id: i64,
        category: Option<String>,
        search: Option<String>,
        page: u64,
        page_size: u64,
    ) -> Result<Page<TaskView>> {
        let filter = TaskFilter {
            status: Some(TaskStatus::Active),
            category,
            search,
            only_open: true,
        };
        let (tasks, total) = self.storage.list_tasks(filter, page, page_size).await?;
        Ok((self.decorate(user_id, tasks).await?, total))
    }

    pub async fn get_for_user(&self, user_id: i64, id: i64) -> Result<TaskView> {
        let task = self
            .storage
            .get_task(id)
            .await?
            .filter(|t| t.status == TaskStatus::Active)
            .ok_or_else(|| RewardHubError::not_found(format!("Task {} not found", id)))?;

        let mut views = self.decorate(user_id, vec![task]).await?;
        views
            .pop()
            .ok_or_else(|| RewardHubError::not_found(format!("Task {} not found", id)))
    }

    async fn decorate(&self, user_id: i64, tasks: Vec<Task>) -> Result<Vec<TaskView>> {
        let ids: Vec<i64> = tasks.iter().map(|t| t.id).collect();
        let counts = self.storage.count_submissions_for_tasks(&ids).await?;
        let submitted = self.storage.submitted_task_ids(user_id, &ids).await?;

        Ok(tasks
            .into_iter()
            .map(|task| TaskView {
                submissions_count: counts.get(&task.id).copied().unwrap_or(0),
                already_submitted: submitted.contains(&task.id),
                task,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(id: &str, prompt: &str) -> TaskQuestion {
        TaskQuestion {
            id: id.into(),
            prompt: prompt.into(),
            required: true,
        }
    }

    #[test]
    fn test_validate_questions() {
        assert!(validate_questions(&[q("q1", "How was it?"), q("q2", "Would you return?")]).is_ok());
        assert!(validate_questions(&[q("q1", "A"), q(" q1 ", "B")]).is_err());
        assert!(validate_questions(&[q("", "A")]).is_err());
        assert!(validate_questions(&[q("q1", "  ")]).is_err());
    }

    #[test]
    fn test_update_request_distinguishes_null() {
        let req: UpdateTaskRequest =
            serde_json::from_str(r#"{"max_submissions": null, "title": "New title"}"#).unwrap();
        assert_eq!(req.max_submissions, Some(None));
        assert_eq!(req.expires_at, None);
        assert_eq!(req.title.as_deref(), Some("New title"));
    }

    #[test]
    fn test_numeric_rules() {
        assert!(validate_reward(0).is_err());
        assert!(validate_reward(1).is_ok());
        assert!(validate_max_submissions(Some(0)).is_err());
        assert!(validate_max_submissions(None).is_ok());
    }
}
