//! 共享应用状态
//!
//! 由 server 模式构建一次，通过 `web::Data<AppState>` 注入所有 handler。

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::api::jwt::JwtService;
use crate::config::StaticConfig;
use crate::services::{
    KycService, LogResetNotifier, MediaService, ResetNotifier, SurveyService, TaskService,
    UserService, WalletService,
};
use crate::storage::SeaOrmStorage;

pub struct AppState {
    pub storage: Arc<SeaOrmStorage>,
    pub jwt: Arc<JwtService>,
    pub users: UserService,
    pub tasks: TaskService,
    pub surveys: SurveyService,
    pub wallet: WalletService,
    pub kyc: KycService,
    pub media: MediaService,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(storage: Arc<SeaOrmStorage>, config: &StaticConfig) -> Self {
        Self::with_notifier(storage, config, Arc::new(LogResetNotifier))
    }

    pub fn with_notifier(
        storage: Arc<SeaOrmStorage>,
        config: &StaticConfig,
        notifier: Arc<dyn ResetNotifier>,
    ) -> Self {
        let jwt = Arc::new(JwtService::from_config(&config.api));
        Self {
            users: UserService::new(
                storage.clone(),
                jwt.clone(),
                config.api.admin_token.clone(),
                config.rewards.password_reset_minutes,
                notifier,
            ),
            tasks: TaskService::new(storage.clone()),
            surveys: SurveyService::new(storage.clone(), config.rewards.clone()),
            wallet: WalletService::new(storage.clone(), config.rewards.clone()),
            kyc: KycService::new(storage.clone()),
            media: MediaService::new(&config.uploads),
            started_at: Utc::now(),
            storage,
            jwt,
        }
    }
}
