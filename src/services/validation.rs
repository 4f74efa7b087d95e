//! 输入校验工具
//!
//! 所有函数返回 `RewardHubError::Validation`，消息直接展示给调用方。

use std::collections::HashSet;

use crate::errors::{Result, RewardHubError};
use crate::utils::url_validator::{validate_http_url, validate_media_reference};

/// 去除首尾空白并转小写，同时做基本格式校验
pub fn normalize_email(email: &str) -> Result<String> {
    let email = email.trim().to_lowercase();
    let valid = email.len() <= 254
        && !email.chars().any(char::is_whitespace)
        && email.split_once('@').is_some_and(|(local, domain)| {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .rsplit_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && tld.len() >= 2)
        });

    if valid {
        Ok(email)
    } else {
        Err(RewardHubError::validation("Invalid email address"))
    }
}

pub fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < 8 {
        return Err(RewardHubError::validation(
            "Password must be at least 8 characters",
        ));
    }
    if password.len() > 128 {
        return Err(RewardHubError::validation(
            "Password must be at most 128 bytes",
        ));
    }
    Ok(())
}

/// 修剪后检查字符数范围，返回修剪结果
pub fn trimmed_len_between(field: &str, value: &str, min: usize, max: usize) -> Result<String> {
    let value = value.trim();
    let len = value.chars().count();
    if len < min || len > max {
        return Err(RewardHubError::validation(format!(
            "{} must be between {} and {} characters",
            field, min, max
        )));
    }
    Ok(value.to_string())
}

/// 可选文本：空串视为 None
pub fn optional_text(field: &str, value: Option<&str>, max: usize) -> Result<Option<String>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => trimmed_len_between(field, v, 1, max).map(Some),
    }
}

pub fn validate_logo_url(url: &str) -> Result<()> {
    validate_http_url(url).map_err(|e| RewardHubError::validation(format!("logo_url: {}", e)))
}

/// 校验图片 / 文件引用列表：数量范围、格式、不可重复
pub fn validate_media_list(field: &str, items: &[String], min: usize, max: usize) -> Result<Vec<String>> {
    if items.len() < min {
        return Err(RewardHubError::validation(format!(
            "At least {} {} required, got {}",
            min,
            field,
            items.len()
        )));
    }
    if items.len() > max {
        return Err(RewardHubError::validation(format!(
            "At most {} {} allowed, got {}",
            max,
            field,
            items.len()
        )));
    }

    let mut seen = HashSet::with_capacity(items.len());
    let mut cleaned = Vec::with_capacity(items.len());
    for item in items {
        let item = item.trim();
        validate_media_reference(item)
            .map_err(|e| RewardHubError::validation(format!("{}: {}", field, e)))?;
        if !seen.insert(item) {
            return Err(RewardHubError::validation(format!(
                "Duplicate entry in {}: {}",
                field, item
            )));
        }
        cleaned.push(item.to_string());
    }
    Ok(cleaned)
}
