//! URL / 媒体引用校验
//!
//! 任务 logo 只接受 http(s) URL；问卷图片和 KYC 文件还可以是本地上传路径
//! `/uploads/<uuid>.<ext>`。

use url::Url;

/// 本地上传文件的 URL 前缀
pub const UPLOAD_URL_PREFIX: &str = "/uploads/";

/// 允许的上传扩展名
pub const UPLOAD_EXTENSIONS: &[&str] = &["jpg", "png", "webp", "pdf"];

#[derive(Debug, PartialEq, Eq)]
pub enum UrlValidationError {
    EmptyUrl,
    InvalidProtocol(String),
    DangerousProtocol(String),
    InvalidFormat(String),
    InvalidUploadPath(String),
}

impl std::fmt::Display for UrlValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyUrl => write!(f, "URL cannot be empty"),
            Self::InvalidProtocol(proto) => write!(
                f,
                "Invalid protocol: {}. Only http:// and https:// are allowed",
                proto
            ),
            Self::DangerousProtocol(proto) => write!(f, "Dangerous protocol blocked: {}", proto),
            Self::InvalidFormat(msg) => write!(f, "Invalid URL format: {}", msg),
            Self::InvalidUploadPath(path) => write!(f, "Unknown upload path: {}", path),
        }
    }
}

impl std::error::Error for UrlValidationError {}

const DANGEROUS_PROTOCOLS: &[&str] = &["javascript:", "data:", "file:", "vbscript:", "blob:"];

/// 校验外部 http(s) URL
pub fn validate_http_url(url: &str) -> Result<(), UrlValidationError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(UrlValidationError::EmptyUrl);
    }

    let lower = url.to_ascii_lowercase();
    if let Some(proto) = DANGEROUS_PROTOCOLS.iter().find(|p| lower.starts_with(**p)) {
        return Err(UrlValidationError::DangerousProtocol(proto.to_string()));
    }

    let parsed = Url::parse(url).map_err(|e| UrlValidationError::InvalidFormat(e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => return Err(UrlValidationError::InvalidProtocol(format!("{}:", other))),
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(UrlValidationError::InvalidFormat("missing host".into()));
    }
    Ok(())
}

/// 上传文件名是否为 `<uuid>.<ext>` 形式
pub fn is_upload_file_name(name: &str) -> bool {
    let Some((stem, ext)) = name.rsplit_once('.') else {
        return false;
    };
    UPLOAD_EXTENSIONS.contains(&ext) && uuid::Uuid::try_parse(stem).is_ok()
}

/// 校验图片 / 文件引用：http(s) URL 或本地上传路径
pub fn validate_media_reference(reference: &str) -> Result<(), UrlValidationError> {
    let reference = reference.trim();
    if let Some(name) = reference.strip_prefix(UPLOAD_URL_PREFIX) {
        if is_upload_file_name(name) {
            return Ok(());
        }
        return Err(UrlValidationError::InvalidUploadPath(reference.to_string()));
    }
    validate_http_url(reference)
}
