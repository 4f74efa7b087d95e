//! Server pre-startup: storage, upload directory, shared state

use std::sync::Arc;

use actix_web::web;
use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::api::AppState;
use crate::config::StaticConfig;
use crate::storage::{SeaOrmStorage, StorageFactory};

pub struct StartupContext {
    pub storage: Arc<SeaOrmStorage>,
    pub state: web::Data<AppState>,
}

/// 准备服务器启动的上下文
pub async fn prepare_server_startup(config: &StaticConfig) -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    let storage = StorageFactory::create()
        .await
        .context("Failed to create storage backend")?;
    info!("Using storage backend: {}", storage.backend_name());

    tokio::fs::create_dir_all(&config.uploads.dir)
        .await
        .with_context(|| format!("Failed to create upload directory '{}'", config.uploads.dir))?;
    debug!("Upload directory ready: {}", config.uploads.dir);

    if config.api.admin_token.is_empty() {
        warn!("Admin API is disabled (api.admin_token is empty)");
    } else {
        info!("Admin API enabled");
    }
    if config.api.trusted_proxies.is_empty() {
        warn!(
            "No trusted proxies configured: X-Forwarded-For is honored only for private peers"
        );
    }

    let state = web::Data::new(AppState::new(storage.clone(), config));

    debug!("Pre-startup completed in {:?}", start_time.elapsed());
    Ok(StartupContext { storage, state })
}
