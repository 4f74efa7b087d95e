//! Sea-ORM Model 与领域模型之间的转换
//!
//! 状态字段以字符串存储，JSON 字段（问题、图片、答案）以 TEXT 存储，
//! 读取时解析失败视为数据损坏，返回 Serialization 错误。

use std::str::FromStr;

use serde::de::DeserializeOwned;

use crate::errors::{Result, RewardHubError};
use crate::storage::models::*;
use migration::entities::{kyc_info, survey, task, user, wallet_transaction, withdrawal};

fn parse_enum<T: FromStr>(field: &str, raw: &str) -> Result<T> {
    T::from_str(raw)
        .map_err(|_| RewardHubError::serialization(format!("非法的 {} 值: '{}'", field, raw)))
}

fn parse_json<T: DeserializeOwned>(field: &str, raw: &str) -> Result<T> {
    serde_json::from_str(raw)
        .map_err(|e| RewardHubError::serialization(format!("{} 解析失败: {}", field, e)))
}

pub(super) fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

pub fn model_to_user(model: user::Model) -> User {
    User {
        id: model.id,
        email: model.email,
        password_hash: model.password_hash,
        display_name: model.display_name,
        phone: model.phone,
        created_at: model.created_at,
        updated_at: model.updated_at,
        last_login_at: model.last_login_at,
        reset_token_hash: model.reset_token_hash,
        reset_expires_at: model.reset_expires_at,
    }
}

pub fn model_to_task(model: task::Model) -> Result<Task> {
    Ok(Task {
        id: model.id,
        title: model.title,
        description: model.description,
        company_name: model.company_name,
        category: model.category,
        reward_amount: model.reward_amount,
        max_submissions: model.max_submissions,
        questions: parse_json("tasks.questions", &model.questions)?,
        logo_url: model.logo_url,
        status: parse_enum("tasks.status", &model.status)?,
        expires_at: model.expires_at,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

pub fn model_to_survey(model: survey::Model) -> Result<Survey> {
    Ok(Survey {
        id: model.id,
        task_id: model.task_id,
        user_id: model.user_id,
        rating: model.rating,
        review_text: model.review_text,
        image_urls: parse_json("surveys.image_urls", &model.image_urls)?,
        responses: parse_json("surveys.responses", &model.responses)?,
        status: parse_enum("surveys.status", &model.status)?,
        rejection_reason: model.rejection_reason,
        reward_amount: model.reward_amount,
        submitted_at: model.submitted_at,
        reviewed_at: model.reviewed_at,
        reviewed_by: model.reviewed_by,
    })
}

pub fn model_to_transaction(model: wallet_transaction::Model) -> Result<WalletTransaction> {
    Ok(WalletTransaction {
        id: model.id,
        user_id: model.user_id,
        kind: parse_enum("wallet_transactions.kind", &model.kind)?,
        amount: model.amount,
        description: model.description,
        reference: model.reference,
        created_at: model.created_at,
    })
}

pub fn model_to_kyc(model: kyc_info::Model) -> Result<KycInfo> {
    Ok(KycInfo {
        id: model.id,
        user_id: model.user_id,
        full_name: model.full_name,
        date_of_birth: model.date_of_birth,
        document_type: parse_enum("kyc_info.document_type", &model.document_type)?,
        document_number: model.document_number,
        document_urls: parse_json("kyc_info.document_urls", &model.document_urls)?,
        address: model.address,
        status: parse_enum("kyc_info.status", &model.status)?,
        rejection_reason: model.rejection_reason,
        submitted_at: model.submitted_at,
        reviewed_at: model.reviewed_at,
    })
}

pub fn model_to_withdrawal(model: withdrawal::Model) -> Result<Withdrawal> {
    Ok(Withdrawal {
        id: model.id,
        user_id: model.user_id,
        amount: model.amount,
        method: parse_enum("withdrawals.method", &model.method)?,
        account_details: model.account_details,
        status: parse_enum("withdrawals.status", &model.status)?,
        rejection_reason: model.rejection_reason,
        payout_reference: model.payout_reference,
        requested_at: model.requested_at,
        processed_at: model.processed_at,
    })
}

/// 批量转换，遇到第一条损坏数据即返回错误
pub fn collect_models<M, T>(models: Vec<M>, convert: fn(M) -> Result<T>) -> Result<Vec<T>> {
    models.into_iter().map(convert).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn survey_model() -> survey::Model {
        survey::Model {
            id: 3,
            task_id: 1,
            user_id: 2,
            rating: 4,
            review_text: "Great product, would buy again".to_string(),
            image_urls: r#"["/uploads/a.png","https://cdn.example.com/b.jpg"]"#.to_string(),
            responses: r#"{"q1":"yes"}"#.to_string(),
            status: "pending".to_string(),
            rejection_reason: None,
            reward_amount: None,
            submitted_at: Utc::now(),
            reviewed_at: None,
            reviewed_by: None,
        }
    }

    #[test]
    fn test_model_to_survey() {
        let survey = model_to_survey(survey_model()).unwrap();
        assert_eq!(survey.status, SurveyStatus::Pending);
        assert_eq!(survey.image_urls.len(), 2);
        assert_eq!(survey.responses.get("q1").map(String::as_str), Some("yes"));
    }

    #[test]
    fn test_corrupt_status_is_serialization_error() {
        let mut model = survey_model();
        model.status = "archived".to_string();
        assert!(matches!(
            model_to_survey(model),
            Err(RewardHubError::Serialization(_))
        ));
    }

    #[test]
    fn test_corrupt_json_is_serialization_error() {
        let mut model = survey_model();
        model.image_urls = "not json".to_string();
        assert!(matches!(
            model_to_survey(model),
            Err(RewardHubError::Serialization(_))
        ));
    }

    #[test]
    fn test_model_to_transaction() {
        let model = wallet_transaction::Model {
            id: 1,
            user_id: 2,
            kind: "debit".to_string(),
            amount: 1500,
            description: "Withdrawal via paypal".to_string(),
            reference: "withdrawal:9".to_string(),
            created_at: Utc::now(),
        };
        let tx = model_to_transaction(model).unwrap();
        assert_eq!(tx.kind, TransactionKind::Debit);
        assert_eq!(tx.reference, "withdrawal:9");
    }
}
