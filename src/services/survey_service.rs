//! Survey submission and review
//!
//! Approval credits the task's current reward through the storage
//! layer, which guarantees one credit per survey.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use crate::config::RewardsConfig;
use crate::errors::{Result, RewardHubError};
use crate::services::validation::{trimmed_len_between, validate_media_list};
use crate::storage::{
    NewSurvey, Page, SeaOrmStorage, Survey, SurveyFilter, Task, TaskQuestion,
};

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitSurveyRequest {
    pub rating: i32,
    pub review_text: String,
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default)]
    pub responses: BTreeMap<String, String>,
}

/// 校验问卷答案：必答题非空，不允许未知题目
fn validate_responses(
    questions: &[TaskQuestion],
    responses: &BTreeMap<String, String>,
) -> Result<BTreeMap<String, String>> {
    if let Some(unknown) = responses
        .keys()
        .find(|key| !questions.iter().any(|q| &q.id == *key))
    {
        return Err(RewardHubError::validation(format!(
            "Unknown question: {}",
            unknown
        )));
    }

    let mut cleaned = BTreeMap::new();
    for question in questions {
        let answer = responses
            .get(&question.id)
            .map(|a| a.trim())
            .filter(|a| !a.is_empty());
        match answer {
            Some(answer) if answer.chars().count() > 2000 => {
                return Err(RewardHubError::validation(format!(
                    "Answer to '{}' is too long",
                    question.id
                )));
            }
            Some(answer) => {
                cleaned.insert(question.id.clone(), answer.to_string());
            }
            None if question.required => {
                return Err(RewardHubError::validation(format!(
                    "Question '{}' requires an answer",
                    question.id
                )));
            }
            None => {}
        }
    }
    Ok(cleaned)
}

pub struct SurveyService {
    storage: Arc<SeaOrmStorage>,
    rules: RewardsConfig,
}

impl SurveyService {
    pub fn new(storage: Arc<SeaOrmStorage>, rules: RewardsConfig) -> Self {
        Self { storage, rules }
    }

    async fn open_task(&self, task_id: i64) -> Result<Task> {
        let task = self
            .storage
            .get_task(task_id)
            .await?
            .ok_or_else(|| RewardHubError::not_found(format!("Task {} not found", task_id)))?;
        if !task.is_open(Utc::now()) {
            return Err(RewardHubError::invalid_state(format!(
                "Task {} is not accepting submissions",
                task_id
            )));
        }
        Ok(task)
    }

    pub async fn submit(
        &self,
        user_id: i64,
        task_id: i64,
        req: SubmitSurveyRequest,
    ) -> Result<Survey> {
        let task = self.open_task(task_id).await?;

        if !(1..=5).contains(&req.rating) {
            return Err(RewardHubError::validation("rating must be between 1 and 5"));
        }
        let review_text = trimmed_len_between(
            "review_text",
            &req.review_text,
            self.rules.min_review_length,
            self.rules.max_review_length,
        )?;
        let image_urls = validate_media_list(
            "images",
            &req.image_urls,
            self.rules.min_survey_images,
            self.rules.max_survey_images,
        )?;
        let responses = validate_responses(&task.questions, &req.responses)?;

        let survey = self
            .storage
            .insert_survey(
                NewSurvey {
                    task_id,
                    user_id,
                    rating: req.rating,
                    review_text,
                    image_urls,
                    responses,
                },
                task.max_submissions,
            )
            .await?;

        info!(
            "Survey {} submitted: task={}, user={}",
            survey.id, task_id, user_id
        );
        Ok(survey)
    }

    pub async fn list_for_user(&self, user_id: i64, page: u64, page_size: u64) -> Result<Page<Survey>> {
        let filter = SurveyFilter {
            user_id: Some(user_id),
            ..Default::default()
        };
        self.storage.list_surveys(filter, page, page_size).await
    }

    /// 按 id 读取；`owner` 为 Some 时只允许读取自己的问卷
    pub async fn get(&self, id: i64, owner: Option<i64>) -> Result<Survey> {
        self.storage
            .get_survey(id)
            .await?
            .filter(|s| owner.is_none_or(|uid| s.user_id == uid))
            .ok_or_else(|| RewardHubError::not_found(format!("Survey {} not found", id)))
    }

    pub async fn list(&self, filter: SurveyFilter, page: u64, page_size: u64) -> Result<Page<Survey>> {
        self.storage.list_surveys(filter, page, page_size).await
    }

    pub async fn approve(&self, id: i64, reviewer: &str) -> Result<Survey> {
        self.storage.approve_survey_and_credit(id, reviewer).await
    }

    pub async fn reject(&self, id: i64, reviewer: &str, reason: &str) -> Result<Survey> {
        let reason = trimmed_len_between("reason", reason, 1, 500)?;
        self.storage.reject_survey(id, reviewer, &reason).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn questions() -> Vec<TaskQuestion> {
        vec![
            TaskQuestion {
                id: "taste".into(),
                prompt: "How did it taste?".into(),
                required: true,
            },
            TaskQuestion {
                id: "extra".into(),
                prompt: "Anything else?".into(),
                required: false,
            },
        ]
    }

    fn answers(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_required_answer_missing() {
        let err = validate_responses(&questions(), &answers(&[("extra", "nope")])).unwrap_err();
        assert!(matches!(err, RewardHubError::Validation(_)));

        let err = validate_responses(&questions(), &answers(&[("taste", "   ")])).unwrap_err();
        assert!(matches!(err, RewardHubError::Validation(_)));
    }

    #[test]
    fn test_unknown_question_rejected() {
        let err =
            validate_responses(&questions(), &answers(&[("taste", "good"), ("color", "red")]))
                .unwrap_err();
        assert!(err.message().contains("color"));
    }

    #[test]
    fn test_optional_answers_are_trimmed_and_dropped_when_blank() {
        let cleaned =
            validate_responses(&questions(), &answers(&[("taste", " great "), ("extra", " ")]))
                .unwrap();
        assert_eq!(cleaned, answers(&[("taste", "great")]));
    }
}
