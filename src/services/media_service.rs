//! Local upload storage
//!
//! Files are stored flat as `<uuid>.<ext>` under the configured
//! directory and served back from `/uploads/<name>`.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::config::UploadsConfig;
use crate::errors::{Result, RewardHubError};
use crate::utils::url_validator::{UPLOAD_URL_PREFIX, is_upload_file_name};

/// (content type, extension)
const ALLOWED_TYPES: &[(&str, &str)] = &[
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/webp", "webp"),
    ("application/pdf", "pdf"),
];

#[derive(Debug, Clone, Serialize)]
pub struct StoredFile {
    pub url: String,
    pub content_type: String,
    pub size: usize,
}

pub fn extension_for(content_type: &str) -> Option<&'static str> {
    ALLOWED_TYPES
        .iter()
        .find(|(ct, _)| *ct == content_type)
        .map(|(_, ext)| *ext)
}

pub fn content_type_for(file_name: &str) -> Option<&'static str> {
    let ext = file_name.rsplit_once('.')?.1;
    ALLOWED_TYPES
        .iter()
        .find(|(_, e)| *e == ext)
        .map(|(ct, _)| *ct)
}

pub struct MediaService {
    dir: PathBuf,
    max_file_size: usize,
}

impl MediaService {
    pub fn new(config: &UploadsConfig) -> Self {
        Self {
            dir: PathBuf::from(&config.dir),
            max_file_size: config.max_file_size,
        }
    }

    pub fn max_file_size(&self) -> usize {
        self.max_file_size
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// 上传前的类型检查，返回扩展名
    pub fn check_content_type(&self, content_type: &str) -> Result<&'static str> {
        extension_for(content_type).ok_or_else(|| {
            RewardHubError::validation(format!("Unsupported file type: {}", content_type))
        })
    }

    pub async fn save(&self, content_type: &str, data: &[u8]) -> Result<StoredFile> {
        let ext = self.check_content_type(content_type)?;
        if data.is_empty() {
            return Err(RewardHubError::validation("Uploaded file is empty"));
        }
        if data.len() > self.max_file_size {
            return Err(RewardHubError::validation(format!(
                "File exceeds the {} byte limit",
                self.max_file_size
            )));
        }

        tokio::fs::create_dir_all(&self.dir).await?;
        let name = format!("{}.{}", uuid::Uuid::new_v4(), ext);
        tokio::fs::write(self.dir.join(&name), data).await?;

        info!("Stored upload {} ({} bytes)", name, data.len());
        Ok(StoredFile {
            url: format!("{}{}", UPLOAD_URL_PREFIX, name),
            content_type: content_type.to_string(),
            size: data.len(),
        })
    }

    /// 解析上传文件名；名称不合法或文件不存在时返回 NotFound
    pub async fn locate(&self, name: &str) -> Result<(PathBuf, &'static str)> {
        let not_found = || RewardHubError::not_found("File not found");
        if !is_upload_file_name(name) {
            debug!("Rejected upload name: {}", name);
            return Err(not_found());
        }
        let content_type = content_type_for(name).ok_or_else(not_found)?;
        let path = self.dir.join(name);
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok((path, content_type)),
            _ => Err(not_found()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn service(dir: &TempDir, max: usize) -> MediaService {
        MediaService::new(&UploadsConfig {
            dir: dir.path().to_string_lossy().to_string(),
            max_file_size: max,
        })
    }

    #[tokio::test]
    async fn test_save_and_locate() {
        let dir = TempDir::new().unwrap();
        let media = service(&dir, 1024);

        let stored = media.save("image/png", b"\x89PNG....").await.unwrap();
        assert!(stored.url.starts_with("/uploads/"));
        assert!(stored.url.ends_with(".png"));
        assert_eq!(stored.size, 8);

        let name = stored.url.trim_start_matches("/uploads/");
        let (path, ct) = media.locate(name).await.unwrap();
        assert_eq!(ct, "image/png");
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_rejects_bad_uploads() {
        let dir = TempDir::new().unwrap();
        let media = service(&dir, 4);

        assert!(media.save("text/html", b"<p>").await.is_err());
        assert!(media.save("image/jpeg", b"").await.is_err());
        assert!(media.save("image/jpeg", b"12345").await.is_err());
        assert!(matches!(
            media.locate("../secret.png").await,
            Err(RewardHubError::NotFound(_))
        ));
        let missing = format!("{}.pdf", uuid::Uuid::new_v4());
        assert!(media.locate(&missing).await.is_err());
    }

    #[test]
    fn test_type_mapping() {
        assert_eq!(extension_for("image/jpeg"), Some("jpg"));
        assert_eq!(content_type_for("x.webp"), Some("image/webp"));
        assert_eq!(extension_for("image/gif"), None);
    }
}
