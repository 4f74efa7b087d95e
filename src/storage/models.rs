//! 存储层领域模型
//!
//! 数据库实体（`migration::entities`）与业务层之间的类型。
//! 金额统一使用 i64 最小货币单位（如美分）。

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// 分页结果：(当前页数据, 总条数)
pub type Page<T> = (Vec<T>, u64);

// ============================================================
// Status / kind enums
// ============================================================

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TaskStatus {
    Active,
    Paused,
    Closed,
}

impl TaskStatus {
    /// closed 是终态
    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        self != TaskStatus::Closed || next == TaskStatus::Closed
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SurveyStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TransactionKind {
    Credit,
    Debit,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum KycStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DocumentType {
    Passport,
    NationalId,
    DriversLicense,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WithdrawalMethod {
    BankTransfer,
    Paypal,
    Upi,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WithdrawalStatus {
    Pending,
    Paid,
    Rejected,
}

// ============================================================
// Users
// ============================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub display_name: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    pub reset_token_hash: Option<String>,
    #[serde(skip)]
    pub reset_expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub display_name: String,
    pub phone: Option<String>,
}

/// 部分更新；`phone: Some(None)` 表示清空
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub display_name: Option<String>,
    pub phone: Option<Option<String>>,
    pub password_hash: Option<String>,
}

// ============================================================
// Tasks
// ============================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskQuestion {
    pub id: String,
    pub prompt: String,
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub company_name: String,
    pub category: Option<String>,
    pub reward_amount: i64,
    pub max_submissions: Option<i32>,
    pub questions: Vec<TaskQuestion>,
    pub logo_url: Option<String>,
    pub status: TaskStatus,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// 任务对用户开放：状态为 active 且未过期
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.status == TaskStatus::Active && self.expires_at.is_none_or(|exp| exp > now)
    }
}

#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub company_name: String,
    pub category: Option<String>,
    pub reward_amount: i64,
    pub max_submissions: Option<i32>,
    pub questions: Vec<TaskQuestion>,
    pub logo_url: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub company_name: Option<String>,
    pub category: Option<Option<String>>,
    pub reward_amount: Option<i64>,
    pub max_submissions: Option<Option<i32>>,
    pub questions: Option<Vec<TaskQuestion>>,
    pub logo_url: Option<Option<String>>,
    pub expires_at: Option<Option<DateTime<Utc>>>,
}

/// 任务过滤条件
#[derive(Default, Clone, Debug)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub category: Option<String>,
    /// 模糊搜索标题或公司名
    pub search: Option<String>,
    /// 只返回 active 且未过期的任务
    pub only_open: bool,
}

// ============================================================
// Surveys
// ============================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Survey {
    pub id: i64,
    pub task_id: i64,
    pub user_id: i64,
    pub rating: i32,
    pub review_text: String,
    pub image_urls: Vec<String>,
    pub responses: BTreeMap<String, String>,
    pub status: SurveyStatus,
    pub rejection_reason: Option<String>,
    pub reward_amount: Option<i64>,
    pub submitted_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewSurvey {
    pub task_id: i64,
    pub user_id: i64,
    pub rating: i32,
    pub review_text: String,
    pub image_urls: Vec<String>,
    pub responses: BTreeMap<String, String>,
}

#[derive(Default, Clone, Debug)]
pub struct SurveyFilter {
    pub status: Option<SurveyStatus>,
    pub task_id: Option<i64>,
    pub user_id: Option<i64>,
}

// ============================================================
// Wallet ledger
// ============================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletTransaction {
    pub id: i64,
    pub user_id: i64,
    pub kind: TransactionKind,
    pub amount: i64,
    pub description: String,
    pub reference: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub user_id: i64,
    pub kind: TransactionKind,
    pub amount: i64,
    pub description: String,
    pub reference: String,
}

/// 流水汇总（均为正数）
///
/// `refunded` 是驳回提现退回的 credit，`withdrawal_debits` 是提现申请的 debit；
/// 二者已分别计入 `credited` / `debited`。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletTotals {
    pub credited: i64,
    pub debited: i64,
    pub refunded: i64,
    pub withdrawal_debits: i64,
}

impl WalletTotals {
    pub fn balance(&self) -> i64 {
        self.credited - self.debited
    }

    /// 奖励与人工加款，不含提现退款
    pub fn earned(&self) -> i64 {
        self.credited - self.refunded
    }

    /// 未被驳回的提现金额（pending + approved + paid）
    pub fn withdrawn(&self) -> i64 {
        self.withdrawal_debits - self.refunded
    }
}

/// 幂等键
pub mod reference {
    pub const WITHDRAWAL_PREFIX: &str = "withdrawal:";
    pub const WITHDRAWAL_REFUND_PREFIX: &str = "withdrawal-refund:";

    pub fn survey_reward(survey_id: i64) -> String {
        format!("survey:{}", survey_id)
    }

    pub fn withdrawal(withdrawal_id: i64) -> String {
        format!("{}{}", WITHDRAWAL_PREFIX, withdrawal_id)
    }

    pub fn withdrawal_refund(withdrawal_id: i64) -> String {
        format!("{}{}", WITHDRAWAL_REFUND_PREFIX, withdrawal_id)
    }

    pub fn adjustment() -> String {
        format!("adjustment:{}", uuid::Uuid::new_v4())
    }
}

// ============================================================
// KYC
// ============================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KycInfo {
    pub id: i64,
    pub user_id: i64,
    pub full_name: String,
    pub date_of_birth: NaiveDate,
    pub document_type: DocumentType,
    pub document_number: String,
    pub document_urls: Vec<String>,
    pub address: Option<String>,
    pub status: KycStatus,
    pub rejection_reason: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewKyc {
    pub user_id: i64,
    pub full_name: String,
    pub date_of_birth: NaiveDate,
    pub document_type: DocumentType,
    pub document_number: String,
    pub document_urls: Vec<String>,
    pub address: Option<String>,
}

// ============================================================
// Withdrawals
// ============================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Withdrawal {
    pub id: i64,
    pub user_id: i64,
    pub amount: i64,
    pub method: WithdrawalMethod,
    pub account_details: String,
    pub status: WithdrawalStatus,
    pub rejection_reason: Option<String>,
    pub payout_reference: Option<String>,
    pub requested_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewWithdrawal {
    pub user_id: i64,
    pub amount: i64,
    pub method: WithdrawalMethod,
    pub account_details: String,
}

#[derive(Default, Clone, Debug)]
pub struct WithdrawalFilter {
    pub status: Option<WithdrawalStatus>,
    pub user_id: Option<i64>,
}

// ============================================================
// Stats
// ============================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdminStats {
    pub users: u64,
    pub active_tasks: u64,
    pub pending_surveys: u64,
    pub approved_surveys: u64,
    pub pending_kyc: u64,
    pub pending_withdrawals: u64,
    pub total_credited: i64,
    pub total_withdrawn: i64,
}
