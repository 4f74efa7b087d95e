//! 集成测试共用的环境：临时 SQLite 数据库 + 完整 AppState
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use actix_web::web;
use async_trait::async_trait;
use chrono::NaiveDate;
use rewardhub::api::AppState;
use rewardhub::config::StaticConfig;
use rewardhub::services::{
    CreateTaskRequest, KycSubmission, RegisterRequest, ResetNotifier, SubmitSurveyRequest,
};
use rewardhub::storage::{DocumentType, SeaOrmStorage, Task, TaskQuestion, User};
use tempfile::TempDir;

pub const ADMIN_TOKEN: &str = "integration-admin-token";
pub const PASSWORD: &str = "correct horse battery";

/// 记录发出的重置 token，代替邮件发送
#[derive(Default)]
pub struct CapturingNotifier {
    pub tokens: Mutex<Vec<String>>,
}

impl CapturingNotifier {
    pub fn last_token(&self) -> Option<String> {
        self.tokens.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ResetNotifier for CapturingNotifier {
    async fn send_reset_token(&self, _user: &User, token: &str, _expires_minutes: i64) {
        self.tokens.lock().unwrap().push(token.to_string());
    }
}

pub struct TestEnv {
    pub storage: Arc<SeaOrmStorage>,
    pub state: web::Data<AppState>,
    pub config: StaticConfig,
    pub notifier: Arc<CapturingNotifier>,
    _dir: TempDir,
}

pub fn test_config(dir: &TempDir) -> StaticConfig {
    let mut config = StaticConfig::default();
    config.database.database_url =
        format!("sqlite://{}?mode=rwc", dir.path().join("test.db").display());
    config.api.admin_token = ADMIN_TOKEN.to_string();
    config.api.jwt_secret = "integration-test-secret-0123456789abcdef".to_string();
    config.uploads.dir = dir.path().join("uploads").to_string_lossy().into_owned();
    // 并发测试会制造写冲突，退避要短、次数要够
    config.database.retry_count = 10;
    config.database.retry_base_delay_ms = 10;
    config.database.retry_max_delay_ms = 200;
    config
}

pub async fn setup() -> TestEnv {
    setup_with(|_| {}).await
}

/// 可在建库前修改配置（例如关闭管理接口）
pub async fn setup_with(tweak: impl FnOnce(&mut StaticConfig)) -> TestEnv {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let mut config = test_config(&dir);
    tweak(&mut config);

    let storage = Arc::new(
        SeaOrmStorage::new(&config.database)
            .await
            .expect("Failed to create storage"),
    );
    let notifier = Arc::new(CapturingNotifier::default());
    let state = web::Data::new(AppState::with_notifier(
        storage.clone(),
        &config,
        notifier.clone(),
    ));

    TestEnv {
        storage,
        state,
        config,
        notifier,
        _dir: dir,
    }
}

pub async fn register(env: &TestEnv, email: &str) -> User {
    env.state
        .users
        .register(RegisterRequest {
            email: email.to_string(),
            password: PASSWORD.to_string(),
            display_name: "Test User".to_string(),
            phone: None,
        })
        .await
        .expect("register failed")
}

pub fn task_request(reward: i64) -> CreateTaskRequest {
    CreateTaskRequest {
        title: "Review our coffee shop".to_string(),
        description: "Visit and tell us what you think".to_string(),
        company_name: "Bean There".to_string(),
        category: Some("food".to_string()),
        reward_amount: reward,
        max_submissions: None,
        questions: vec![TaskQuestion {
            id: "q1".to_string(),
            prompt: "Was the staff friendly?".to_string(),
            required: true,
        }],
        logo_url: None,
        expires_at: None,
    }
}

pub async fn create_task(env: &TestEnv, reward: i64) -> Task {
    env.state
        .tasks
        .create_task(task_request(reward))
        .await
        .expect("create task failed")
}

pub fn survey_request(images: usize) -> SubmitSurveyRequest {
    SubmitSurveyRequest {
        rating: 4,
        review_text: "Great espresso and quick service overall.".to_string(),
        image_urls: (0..images)
            .map(|i| format!("https://cdn.example.com/photo-{}.jpg", i))
            .collect(),
        responses: [("q1".to_string(), "Yes, very".to_string())]
            .into_iter()
            .collect(),
    }
}

pub fn kyc_submission() -> KycSubmission {
    KycSubmission {
        full_name: "Jamie Doe".to_string(),
        date_of_birth: NaiveDate::from_ymd_opt(1990, 5, 17).unwrap(),
        document_type: DocumentType::Passport,
        document_number: "x1234567".to_string(),
        document_urls: vec!["https://cdn.example.com/passport.jpg".to_string()],
        address: Some("1 Main St".to_string()),
    }
}

/// 提交并通过 KYC
pub async fn approve_kyc(env: &TestEnv, user_id: i64) {
    env.state
        .kyc
        .submit(user_id, kyc_submission())
        .await
        .expect("kyc submit failed");
    env.state
        .kyc
        .approve(user_id)
        .await
        .expect("kyc approve failed");
}

/// 给用户一笔已审核的问卷奖励
pub async fn earn(env: &TestEnv, user_id: i64, reward: i64) -> i64 {
    let task = create_task(env, reward).await;
    let survey = env
        .state
        .surveys
        .submit(user_id, task.id, survey_request(2))
        .await
        .expect("submit failed");
    env.state
        .surveys
        .approve(survey.id, "admin")
        .await
        .expect("approve failed");
    survey.id
}
