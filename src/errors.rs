use std::fmt;

#[derive(Debug, Clone)]
pub enum RewardHubError {
    DatabaseConfig(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
    Validation(String),
    NotFound(String),
    Conflict(String),
    InvalidState(String),
    Unauthorized(String),
    Forbidden(String),
    KycNotApproved(String),
    InsufficientBalance(String),
    FileOperation(String),
    Serialization(String),
    PasswordHash(String),
    Token(String),
}

impl RewardHubError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            RewardHubError::DatabaseConfig(_) => "E001",
            RewardHubError::DatabaseConnection(_) => "E002",
            RewardHubError::DatabaseOperation(_) => "E003",
            RewardHubError::Validation(_) => "E004",
            RewardHubError::NotFound(_) => "E005",
            RewardHubError::Conflict(_) => "E006",
            RewardHubError::InvalidState(_) => "E007",
            RewardHubError::Unauthorized(_) => "E008",
            RewardHubError::Forbidden(_) => "E009",
            RewardHubError::KycNotApproved(_) => "E010",
            RewardHubError::InsufficientBalance(_) => "E011",
            RewardHubError::FileOperation(_) => "E012",
            RewardHubError::Serialization(_) => "E013",
            RewardHubError::PasswordHash(_) => "E014",
            RewardHubError::Token(_) => "E015",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            RewardHubError::DatabaseConfig(_) => "Database Configuration Error",
            RewardHubError::DatabaseConnection(_) => "Database Connection Error",
            RewardHubError::DatabaseOperation(_) => "Database Operation Error",
            RewardHubError::Validation(_) => "Validation Error",
            RewardHubError::NotFound(_) => "Resource Not Found",
            RewardHubError::Conflict(_) => "Conflict",
            RewardHubError::InvalidState(_) => "Invalid State",
            RewardHubError::Unauthorized(_) => "Unauthorized",
            RewardHubError::Forbidden(_) => "Forbidden",
            RewardHubError::KycNotApproved(_) => "KYC Not Approved",
            RewardHubError::InsufficientBalance(_) => "Insufficient Balance",
            RewardHubError::FileOperation(_) => "File Operation Error",
            RewardHubError::Serialization(_) => "Serialization Error",
            RewardHubError::PasswordHash(_) => "Password Hash Error",
            RewardHubError::Token(_) => "Token Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            RewardHubError::DatabaseConfig(msg)
            | RewardHubError::DatabaseConnection(msg)
            | RewardHubError::DatabaseOperation(msg)
            | RewardHubError::Validation(msg)
            | RewardHubError::NotFound(msg)
            | RewardHubError::Conflict(msg)
            | RewardHubError::InvalidState(msg)
            | RewardHubError::Unauthorized(msg)
            | RewardHubError::Forbidden(msg)
            | RewardHubError::KycNotApproved(msg)
            | RewardHubError::InsufficientBalance(msg)
            | RewardHubError::FileOperation(msg)
            | RewardHubError::Serialization(msg)
            | RewardHubError::PasswordHash(msg)
            | RewardHubError::Token(msg) => msg,
        }
    }

    /// 对应的 HTTP 状态码
    pub fn http_status(&self) -> u16 {
        match self {
            RewardHubError::Validation(_) => 400,
            RewardHubError::Unauthorized(_) | RewardHubError::Token(_) => 401,
            RewardHubError::Forbidden(_) | RewardHubError::KycNotApproved(_) => 403,
            RewardHubError::NotFound(_) => 404,
            RewardHubError::Conflict(_) => 409,
            RewardHubError::InvalidState(_) | RewardHubError::InsufficientBalance(_) => 422,
            RewardHubError::DatabaseConfig(_)
            | RewardHubError::DatabaseConnection(_)
            | RewardHubError::DatabaseOperation(_)
            | RewardHubError::FileOperation(_)
            | RewardHubError::Serialization(_)
            | RewardHubError::PasswordHash(_) => 500,
        }
    }

    /// 是否属于服务端内部错误（日志级别用 error）
    pub fn is_internal(&self) -> bool {
        self.http_status() >= 500
    }

    /// 格式化为彩色输出（用于 Server 模式）
    #[cfg(feature = "server")]
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出（用于 CLI 模式）
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for RewardHubError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for RewardHubError {}

// 便捷的构造函数
impl RewardHubError {
    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        RewardHubError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        RewardHubError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        RewardHubError::DatabaseOperation(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        RewardHubError::Validation(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        RewardHubError::NotFound(msg.into())
    }

    pub fn conflict<T: Into<String>>(msg: T) -> Self {
        RewardHubError::Conflict(msg.into())
    }

    pub fn invalid_state<T: Into<String>>(msg: T) -> Self {
        RewardHubError::InvalidState(msg.into())
    }

    pub fn unauthorized<T: Into<String>>(msg: T) -> Self {
        RewardHubError::Unauthorized(msg.into())
    }

    pub fn forbidden<T: Into<String>>(msg: T) -> Self {
        RewardHubError::Forbidden(msg.into())
    }

    pub fn kyc_not_approved<T: Into<String>>(msg: T) -> Self {
        RewardHubError::KycNotApproved(msg.into())
    }

    pub fn insufficient_balance<T: Into<String>>(msg: T) -> Self {
        RewardHubError::InsufficientBalance(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        RewardHubError::FileOperation(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        RewardHubError::Serialization(msg.into())
    }

    pub fn password_hash<T: Into<String>>(msg: T) -> Self {
        RewardHubError::PasswordHash(msg.into())
    }

    pub fn token<T: Into<String>>(msg: T) -> Self {
        RewardHubError::Token(msg.into())
    }
}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for RewardHubError {
    fn from(err: sea_orm::DbErr) -> Self {
        RewardHubError::DatabaseOperation(err.to_string())
    }
}

impl From<std::io::Error> for RewardHubError {
    fn from(err: std::io::Error) -> Self {
        RewardHubError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for RewardHubError {
    fn from(err: serde_json::Error) -> Self {
        RewardHubError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RewardHubError>;
