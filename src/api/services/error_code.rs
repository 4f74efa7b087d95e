//! 统一 API 错误码定义

use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::errors::RewardHubError;

/// API 错误码枚举
///
/// 使用 serde_repr 序列化为数字，按千位分域：
/// - 0: 成功
/// - 1000-1099: 通用错误
/// - 2000-2099: 认证错误
/// - 3000-3099: 任务与问卷
/// - 4000-4099: 钱包与提现
/// - 5000-5099: KYC
/// - 6000-6099: 上传
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,

    // 通用错误 1000-1099
    BadRequest = 1000,
    Unauthorized = 1001,
    NotFound = 1004,
    InternalServerError = 1005,
    Conflict = 1009,
    InvalidState = 1022,
    ServiceUnavailable = 1030,

    // 认证错误 2000-2099
    AuthFailed = 2000,
    TokenExpired = 2001,
    TokenInvalid = 2002,
    Forbidden = 2003,
    RateLimitExceeded = 2004,
    EmailTaken = 2005,

    // 任务与问卷 3000-3099
    TaskNotFound = 3000,
    TaskNotOpen = 3001,
    TaskClosed = 3002,
    SurveyNotFound = 3010,
    SurveyAlreadySubmitted = 3011,
    SurveyAlreadyReviewed = 3012,
    RewardAlreadyCredited = 3013,

    // 钱包与提现 4000-4099
    InsufficientBalance = 4000,
    WithdrawalNotFound = 4001,
    WithdrawalAlreadyProcessed = 4002,
    DuplicateTransaction = 4003,
    ExportFailed = 4004,

    // KYC 5000-5099
    KycNotApproved = 5000,
    KycNotFound = 5001,
    KycAlreadySubmitted = 5002,
    KycAlreadyReviewed = 5003,

    // 上传 6000-6099
    UnsupportedFileType = 6000,
    FileTooLarge = 6001,
    InvalidMultipartData = 6002,
    FileNotFound = 6003,
}

/// 请求所属的业务域，用于把通用错误细化成域内错误码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Area {
    General,
    Auth,
    Task,
    Survey,
    Wallet,
    Withdrawal,
    Kyc,
    Upload,
}

impl ErrorCode {
    pub fn for_error(err: &RewardHubError, area: Area) -> Self {
        use RewardHubError as E;

        match (err, area) {
            (E::KycNotApproved(_), _) => ErrorCode::KycNotApproved,
            (E::InsufficientBalance(_), _) => ErrorCode::InsufficientBalance,
            (E::Forbidden(_), _) => ErrorCode::Forbidden,
            (E::Unauthorized(_), Area::Auth) => ErrorCode::AuthFailed,
            (E::Unauthorized(_), _) => ErrorCode::Unauthorized,
            (E::Token(msg), _) if msg.contains("ExpiredSignature") => ErrorCode::TokenExpired,
            (E::Token(_), _) => ErrorCode::TokenInvalid,

            (E::NotFound(_), Area::Task) => ErrorCode::TaskNotFound,
            (E::NotFound(_), Area::Survey) => ErrorCode::SurveyNotFound,
            (E::NotFound(_), Area::Withdrawal) => ErrorCode::WithdrawalNotFound,
            (E::NotFound(_), Area::Kyc) => ErrorCode::KycNotFound,
            (E::NotFound(_), Area::Upload) => ErrorCode::FileNotFound,
            (E::NotFound(_), _) => ErrorCode::NotFound,

            (E::Conflict(_), Area::Auth) => ErrorCode::EmailTaken,
            (E::Conflict(_), Area::Survey) if err.message().contains("credited") => {
                ErrorCode::RewardAlreadyCredited
            }
            (E::Conflict(_), Area::Survey) => ErrorCode::SurveyAlreadySubmitted,
            (E::Conflict(_), Area::Kyc) => ErrorCode::KycAlreadySubmitted,
            (E::Conflict(_), Area::Wallet | Area::Withdrawal) => ErrorCode::DuplicateTransaction,
            (E::Conflict(_), _) => ErrorCode::Conflict,

            (E::InvalidState(_), Area::Task) => ErrorCode::TaskClosed,
            (E::InvalidState(_), Area::Survey) if err.message().contains("submissions") => {
                ErrorCode::TaskNotOpen
            }
            (E::InvalidState(_), Area::Survey) => ErrorCode::SurveyAlreadyReviewed,
            (E::InvalidState(_), Area::Withdrawal) => ErrorCode::WithdrawalAlreadyProcessed,
            (E::InvalidState(_), Area::Kyc) => ErrorCode::KycAlreadyReviewed,
            (E::InvalidState(_), _) => ErrorCode::InvalidState,

            (E::Validation(msg), Area::Upload) if msg.starts_with("Unsupported file type") => {
                ErrorCode::UnsupportedFileType
            }
            (E::Validation(msg), Area::Upload) if msg.contains("byte limit") => {
                ErrorCode::FileTooLarge
            }
            (E::Validation(_), _) => ErrorCode::BadRequest,

            (E::DatabaseConnection(_), _) => ErrorCode::ServiceUnavailable,
            (
                E::DatabaseConfig(_)
                | E::DatabaseOperation(_)
                | E::FileOperation(_)
                | E::Serialization(_)
                | E::PasswordHash(_),
                _,
            ) => ErrorCode::InternalServerError,
        }
    }
}
