//! API 请求 / 响应类型

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::storage::{
    DocumentType, KycStatus, SurveyStatus, TaskStatus, TransactionKind, WithdrawalMethod,
    WithdrawalStatus,
};

use super::error_code::ErrorCode;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ApiResponse<T> {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PaginationInfo {
    pub page: u64,
    pub page_size: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl PaginationInfo {
    pub fn new(page: u64, page_size: u64, total: u64) -> Self {
        Self {
            page,
            page_size,
            total,
            total_pages: total.div_ceil(page_size.max(1)),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PaginatedResponse<T> {
    pub code: ErrorCode,
    pub message: String,
    pub data: Vec<T>,
    pub pagination: PaginationInfo,
}

#[derive(Serialize, Clone, Debug)]
pub struct MessageResponse {
    pub message: String,
}

// ============ Query strings ============

#[derive(Deserialize, Clone, Debug, Default)]
pub struct PageQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct TaskListQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    pub category: Option<String>,
    pub search: Option<String>,
    /// 仅管理端使用
    pub status: Option<TaskStatus>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct SurveyListQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    pub status: Option<SurveyStatus>,
    pub task_id: Option<i64>,
    pub user_id: Option<i64>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct KycListQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    pub status: Option<KycStatus>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct WithdrawalListQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    pub status: Option<WithdrawalStatus>,
    pub user_id: Option<i64>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct UserListQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    pub search: Option<String>,
}

// ============ Auth bodies ============

#[derive(Deserialize, Clone, Debug)]
pub struct RegisterBody {
    pub email: String,
    pub password: String,
    pub display_name: String,
    pub phone: Option<String>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct LoginBody {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct RefreshBody {
    pub refresh_token: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct PasswordResetBody {
    pub email: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct PasswordResetConfirmBody {
    pub token: String,
    pub new_password: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct AdminLoginBody {
    pub token: String,
}

// ============ Account bodies ============

#[derive(Deserialize, Clone, Debug, Default)]
pub struct UpdateProfileBody {
    pub display_name: Option<String>,
    pub phone: Option<String>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ChangePasswordBody {
    pub current_password: String,
    pub new_password: String,
}

// ============ Wallet / withdrawals ============

#[derive(Deserialize, Clone, Debug)]
pub struct WithdrawalBody {
    pub amount: i64,
    pub method: WithdrawalMethod,
    pub account_details: String,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct ApproveWithdrawalBody {
    pub payout_reference: Option<String>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct AdjustBalanceBody {
    pub kind: TransactionKind,
    pub amount: i64,
    pub note: String,
}

// ============ Review ============

#[derive(Deserialize, Clone, Debug)]
pub struct RejectBody {
    pub reason: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct TaskStatusBody {
    pub status: TaskStatus,
}

// ============ KYC ============

#[derive(Deserialize, Clone, Debug)]
pub struct KycBody {
    pub full_name: String,
    pub date_of_birth: NaiveDate,
    pub document_type: DocumentType,
    pub document_number: String,
    pub document_urls: Vec<String>,
    pub address: Option<String>,
}

// ============ CSV export ============

/// 流水导出的 CSV 行
#[derive(Serialize, Clone, Debug)]
pub struct CsvTransactionRow {
    pub id: i64,
    pub user_id: i64,
    pub kind: String,
    pub amount: i64,
    pub reference: String,
    pub description: String,
    pub created_at: String,
}
