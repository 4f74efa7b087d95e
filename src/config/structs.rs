use serde::{Deserialize, Serialize};

/// 默认配置文件路径
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// 静态配置（从 TOML 加载，启动时使用）
///
/// - server: 服务器地址、端口、CPU 数量
/// - database: 数据库连接配置
/// - logging: 日志配置
/// - api: 鉴权相关（管理员 token、JWT、可信代理、CORS）
/// - rewards: 业务规则（币种、问卷图片数量、最低提现额等）
/// - uploads: 上传目录与大小限制
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StaticConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub rewards: RewardsConfig,
    #[serde(default)]
    pub uploads: UploadsConfig,
}

impl StaticConfig {
    /// 从默认路径加载
    pub fn load() -> Self {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// 从 TOML 文件和环境变量加载配置
    ///
    /// 优先级：ENV > config.toml > 默认值
    /// ENV 前缀：RH，分隔符：__
    /// 示例：RH__SERVER__PORT=9999
    pub fn load_from(path: &str) -> Self {
        use config::{Config, Environment, File};

        let builder = Config::builder()
            // 1. 从 TOML 文件加载（可选）
            .add_source(File::with_name(path).required(false))
            // 2. 从环境变量覆盖
            .add_source(
                Environment::with_prefix("RH")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("api.trusted_proxies")
                    .with_list_parse_key("api.cors_allowed_origins")
                    .try_parsing(true),
            );

        match builder.build() {
            Ok(settings) => match settings.try_deserialize::<StaticConfig>() {
                Ok(config) => {
                    if std::path::Path::new(path).exists() {
                        eprintln!("[INFO] Configuration loaded from: {}", path);
                    }
                    config
                }
                Err(e) => {
                    eprintln!("[ERROR] Failed to deserialize config: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("[ERROR] Failed to build config: {}", e);
                Self::default()
            }
        }
    }

    /// 生成示例 TOML 配置文件
    pub fn generate_sample_config() -> String {
        let sample_config = Self::default();
        toml::to_string_pretty(&sample_config)
            .unwrap_or_else(|e| format!("Error generating sample config: {}", e))
    }

    /// 保存配置到 TOML 文件
    pub fn save_to_file<P: AsRef<std::path::Path>>(
        &self,
        path: P,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;

        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    #[serde(default = "default_cpu_count")]
    pub cpu_count: usize,
}

/// 数据库连接配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_database_pool_size")]
    pub pool_size: u32,
    #[serde(default = "default_database_timeout")]
    pub timeout: u64,
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default = "default_max_backups")]
    pub max_backups: u32,
    #[serde(default = "default_enable_rotation")]
    pub enable_rotation: bool,
}

/// API 鉴权配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// 管理员 token，可以是明文或 argon2 哈希；为空时禁用管理接口
    #[serde(default)]
    pub admin_token: String,
    /// JWT 签名密钥；为空时每个进程随机生成
    #[serde(default)]
    pub jwt_secret: String,
    #[serde(default = "default_access_token_minutes")]
    pub access_token_minutes: u64,
    #[serde(default = "default_refresh_token_days")]
    pub refresh_token_days: u64,
    /// 可信反向代理（IP 或 CIDR），仅对这些来源信任 X-Forwarded-For
    #[serde(default)]
    pub trusted_proxies: Vec<String>,
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,
}

/// 业务规则配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardsConfig {
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_min_survey_images")]
    pub min_survey_images: usize,
    #[serde(default = "default_max_survey_images")]
    pub max_survey_images: usize,
    #[serde(default = "default_min_review_length")]
    pub min_review_length: usize,
    #[serde(default = "default_max_review_length")]
    pub max_review_length: usize,
    /// 最低提现金额（最小货币单位）
    #[serde(default = "default_min_withdrawal")]
    pub min_withdrawal: i64,
    #[serde(default = "default_password_reset_minutes")]
    pub password_reset_minutes: i64,
}

/// 上传配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadsConfig {
    #[serde(default = "default_upload_dir")]
    pub dir: String,
    #[serde(default = "default_max_file_size")]
    pub max_file_size: usize,
}

// ============================================================
// Default value functions
// ============================================================

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8080
}

fn default_cpu_count() -> usize {
    num_cpus::get()
}

fn default_database_url() -> String {
    "rewardhub.db".to_string()
}

fn default_database_pool_size() -> u32 {
    10
}

fn default_database_timeout() -> u64 {
    30
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    100
}

fn default_retry_max_delay_ms() -> u64 {
    2000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_max_backups() -> u32 {
    5
}

fn default_enable_rotation() -> bool {
    true
}

fn default_access_token_minutes() -> u64 {
    60
}

fn default_refresh_token_days() -> u64 {
    30
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_min_survey_images() -> usize {
    2
}

fn default_max_survey_images() -> usize {
    10
}

fn default_min_review_length() -> usize {
    20
}

fn default_max_review_length() -> usize {
    5000
}

fn default_min_withdrawal() -> i64 {
    1000
}

fn default_password_reset_minutes() -> i64 {
    30
}

fn default_upload_dir() -> String {
    "uploads".to_string()
}

fn default_max_file_size() -> usize {
    5 * 1024 * 1024
}

// ============================================================
// Default implementations
// ============================================================

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            cpu_count: default_cpu_count(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            pool_size: default_database_pool_size(),
            timeout: default_database_timeout(),
            retry_count: default_retry_count(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
            max_backups: default_max_backups(),
            enable_rotation: default_enable_rotation(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            admin_token: String::new(),
            jwt_secret: String::new(),
            access_token_minutes: default_access_token_minutes(),
            refresh_token_days: default_refresh_token_days(),
            trusted_proxies: Vec::new(),
            cors_allowed_origins: Vec::new(),
        }
    }
}

impl Default for RewardsConfig {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            min_survey_images: default_min_survey_images(),
            max_survey_images: default_max_survey_images(),
            min_review_length: default_min_review_length(),
            max_review_length: default_max_review_length(),
            min_withdrawal: default_min_withdrawal(),
            password_reset_minutes: default_password_reset_minutes(),
        }
    }
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            dir: default_upload_dir(),
            max_file_size: default_max_file_size(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = StaticConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.database_url, "rewardhub.db");
        assert_eq!(config.rewards.min_survey_images, 2);
        assert_eq!(config.rewards.min_withdrawal, 1000);
        assert_eq!(config.uploads.max_file_size, 5 * 1024 * 1024);
        assert!(config.api.admin_token.is_empty());
    }

    #[test]
    fn test_sample_config_parses_back() {
        let sample = StaticConfig::generate_sample_config();
        let parsed: StaticConfig = toml::from_str(&sample).unwrap();
        assert_eq!(parsed.rewards.currency, "USD");
        assert_eq!(parsed.api.access_token_minutes, 60);
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            "[server]\nport = 9100\n\n[rewards]\nmin_withdrawal = 2500\ncurrency = \"INR\"\n",
        )
        .unwrap();

        let config = StaticConfig::load_from(path.to_str().unwrap());
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.rewards.min_withdrawal, 2500);
        assert_eq!(config.rewards.currency, "INR");
        // 未配置的字段保持默认
        assert_eq!(config.rewards.min_survey_images, 2);
    }

    #[test]
    fn test_save_to_file_creates_parent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/dir/config.toml");
        StaticConfig::default().save_to_file(&path).unwrap();
        assert!(path.exists());
    }
}
