use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Utc};
use serde::Deserialize;
use tracing::info;

use crate::errors::{Result, RewardHubError};
use crate::services::validation::{optional_text, trimmed_len_between, validate_media_list};
use crate::storage::{DocumentType, KycInfo, KycStatus, NewKyc, Page, SeaOrmStorage};

const MIN_AGE: i32 = 18;

#[derive(Debug, Clone, Deserialize)]
pub struct KycSubmission {
    pub full_name: String,
    pub date_of_birth: NaiveDate,
    pub document_type: DocumentType,
    pub document_number: String,
    pub document_urls: Vec<String>,
    pub address: Option<String>,
}

/// 满周岁计算
fn age_on(dob: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - dob.year();
    if (today.month(), today.day()) < (dob.month(), dob.day()) {
        age -= 1;
    }
    age
}

fn normalize_document_number(raw: &str) -> Result<String> {
    let number = raw.trim().to_uppercase();
    let len = number.chars().count();
    if !(4..=40).contains(&len)
        || !number
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        return Err(RewardHubError::validation(
            "document_number must be 4-40 letters, digits or dashes",
        ));
    }
    Ok(number)
}

pub struct KycService {
    storage: Arc<SeaOrmStorage>,
}

impl KycService {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self { storage }
    }

    pub async fn submit(&self, user_id: i64, req: KycSubmission) -> Result<KycInfo> {
        let today = Utc::now().date_naive();
        if req.date_of_birth >= today {
            return Err(RewardHubError::validation(
                "date_of_birth must be in the past",
            ));
        }
        if age_on(req.date_of_birth, today) < MIN_AGE {
            return Err(RewardHubError::validation(format!(
                "You must be at least {} years old",
                MIN_AGE
            )));
        }

        let kyc = NewKyc {
            user_id,
            full_name: trimmed_len_between("full_name", &req.full_name, 2, 120)?,
            date_of_birth: req.date_of_birth,
            document_type: req.document_type,
            document_number: normalize_document_number(&req.document_number)?,
            document_urls: validate_media_list("documents", &req.document_urls, 1, 5)?,
            address: optional_text("address", req.address.as_deref(), 300)?,
        };
        self.storage.upsert_kyc_submission(kyc).await
    }

    pub async fn get(&self, user_id: i64) -> Result<KycInfo> {
        self.storage
            .get_kyc(user_id)
            .await?
            .ok_or_else(|| RewardHubError::not_found("No KYC submission found"))
    }

    pub async fn approve(&self, user_id: i64) -> Result<KycInfo> {
        let info = self
            .storage
            .review_kyc(user_id, KycStatus::Approved, None)
            .await?;
        info!("KYC approved for user {}", user_id);
        Ok(info)
    }

    pub async fn reject(&self, user_id: i64, reason: &str) -> Result<KycInfo> {
        let reason = trimmed_len_between("reason", reason, 1, 500)?;
        self.storage
            .review_kyc(user_id, KycStatus::Rejected, Some(reason))
            .await
    }

    pub async fn list(&self, status: Option<KycStatus>, page: u64, page_size: u64) -> Result<Page<KycInfo>> {
        self.storage.list_kyc(status, page, page_size).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_age_on_birthday_boundary() {
        let today = date(2026, 3, 15);
        assert_eq!(age_on(date(2008, 3, 15), today), 18);
        assert_eq!(age_on(date(2008, 3, 16), today), 17);
        assert_eq!(age_on(date(1990, 12, 31), today), 35);
    }

    #[test]
    fn test_document_number_rules() {
        assert_eq!(normalize_document_number(" ab-1234 ").unwrap(), "AB-1234");
        assert!(normalize_document_number("abc").is_err());
        assert!(normalize_document_number("AB 1234").is_err());
        assert!(normalize_document_number(&"9".repeat(41)).is_err());
    }
}
