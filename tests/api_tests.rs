//! HTTP 接口集成测试

mod common;

use actix_web::http::StatusCode;
use actix_web::{App, test as actix_test};
use common::{ADMIN_TOKEN, PASSWORD, TestEnv, approve_kyc, earn, setup, setup_with};
use rewardhub::runtime::modes::configure_app;
use serde_json::{Value, json};

macro_rules! init_app {
    ($env:expr) => {
        actix_test::init_service(
            App::new()
                .app_data($env.state.clone())
                .configure(configure_app),
        )
        .await
    };
}

fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}

fn task_body(reward: i64) -> Value {
    json!({
        "title": "Try our new burger",
        "description": "Order the signature burger and review it",
        "company_name": "Grill House",
        "category": "food",
        "reward_amount": reward,
        "questions": [
            { "id": "taste", "prompt": "How did it taste?", "required": true }
        ]
    })
}

fn survey_body() -> Value {
    json!({
        "rating": 5,
        "review_text": "Juicy, well seasoned and served hot.",
        "image_urls": [
            "https://cdn.example.com/burger-1.jpg",
            "https://cdn.example.com/burger-2.jpg"
        ],
        "responses": { "taste": "Excellent" }
    })
}

/// 注册并登录，返回 access token
macro_rules! signup {
    ($app:expr, $email:expr) => {{
        let req = actix_test::TestRequest::post()
            .uri("/api/v1/auth/register")
            .set_json(json!({
                "email": $email,
                "password": PASSWORD,
                "display_name": "Api User"
            }))
            .to_request();
        let resp = actix_test::call_service(&$app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let req = actix_test::TestRequest::post()
            .uri("/api/v1/auth/login")
            .set_json(json!({ "email": $email, "password": PASSWORD }))
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&$app, req).await;
        assert_eq!(body["code"], 0);
        body["data"]["access_token"]
            .as_str()
            .expect("access token")
            .to_string()
    }};
}

macro_rules! admin_token {
    ($app:expr) => {{
        let req = actix_test::TestRequest::post()
            .uri("/admin/v1/auth/login")
            .set_json(json!({ "token": ADMIN_TOKEN }))
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&$app, req).await;
        assert_eq!(body["code"], 0);
        body["data"]["access_token"]
            .as_str()
            .expect("admin access token")
            .to_string()
    }};
}

async fn user_id(env: &TestEnv, email: &str) -> i64 {
    env.storage
        .find_user_by_email(email)
        .await
        .unwrap()
        .expect("user exists")
        .id
}

#[actix_web::test]
async fn test_health_endpoints() {
    let env = setup().await;
    let app = init_app!(env);

    let req = actix_test::TestRequest::get().uri("/health").to_request();
    let body: Value = actix_test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["code"], 0);
    assert_eq!(body["data"]["status"], "healthy");
    assert_eq!(body["data"]["storage"]["backend"], "sqlite");

    let req = actix_test::TestRequest::get().uri("/health/ready").to_request();
    let resp = actix_test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = actix_test::TestRequest::get().uri("/health/live").to_request();
    let resp = actix_test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}

#[actix_web::test]
async fn test_register_login_and_profile() {
    let env = setup().await;
    let app = init_app!(env);
    let token = signup!(app, "profile@example.com");

    let req = actix_test::TestRequest::get()
        .uri("/api/v1/me")
        .insert_header(bearer(&token))
        .to_request();
    let body: Value = actix_test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["email"], "profile@example.com");
    assert!(body["data"].get("password_hash").is_none());

    let req = actix_test::TestRequest::put()
        .uri("/api/v1/me")
        .insert_header(bearer(&token))
        .set_json(json!({ "display_name": "Renamed" }))
        .to_request();
    let body: Value = actix_test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["display_name"], "Renamed");

    // 重复注册
    let req = actix_test::TestRequest::post()
        .uri("/api/v1/auth/register")
        .set_json(json!({
            "email": "profile@example.com",
            "password": PASSWORD,
            "display_name": "Again"
        }))
        .to_request();
    let resp = actix_test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = actix_test::read_body_json(resp).await;
    assert_eq!(body["code"], 2005);
}

#[actix_web::test]
async fn test_bad_credentials() {
    let env = setup().await;
    let app = init_app!(env);
    signup!(app, "creds@example.com");

    let req = actix_test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .set_json(json!({ "email": "creds@example.com", "password": "wrong password" }))
        .to_request();
    let resp = actix_test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = actix_test::read_body_json(resp).await;
    assert_eq!(body["code"], 2000);
}

#[actix_web::test]
async fn test_missing_or_invalid_token() {
    let env = setup().await;
    let app = init_app!(env);

    let req = actix_test::TestRequest::get().uri("/api/v1/wallet").to_request();
    let resp = actix_test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = actix_test::read_body_json(resp).await;
    assert_eq!(body["code"], 1001);

    let req = actix_test::TestRequest::get()
        .uri("/api/v1/wallet")
        .insert_header(bearer("not-a-jwt"))
        .to_request();
    let resp = actix_test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_admin_api_disabled_without_token() {
    let env = setup_with(|config| config.api.admin_token.clear()).await;
    let app = init_app!(env);

    let req = actix_test::TestRequest::post()
        .uri("/admin/v1/auth/login")
        .set_json(json!({ "token": "" }))
        .to_request();
    let resp = actix_test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = actix_test::TestRequest::get().uri("/admin/v1/stats").to_request();
    let resp = actix_test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_user_token_cannot_reach_admin() {
    let env = setup().await;
    let app = init_app!(env);
    let token = signup!(app, "sneaky@example.com");

    let req = actix_test::TestRequest::get()
        .uri("/admin/v1/stats")
        .insert_header(bearer(&token))
        .to_request();
    let resp = actix_test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = actix_test::read_body_json(resp).await;
    assert_eq!(body["code"], 2003);

    let req = actix_test::TestRequest::post()
        .uri("/admin/v1/auth/login")
        .set_json(json!({ "token": "wrong" }))
        .to_request();
    let resp = actix_test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_survey_review_credits_wallet() {
    let env = setup().await;
    let app = init_app!(env);
    let admin = admin_token!(app);
    let user = signup!(app, "flow@example.com");

    let req = actix_test::TestRequest::post()
        .uri("/admin/v1/tasks")
        .insert_header(bearer(&admin))
        .set_json(task_body(1250))
        .to_request();
    let resp = actix_test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = actix_test::read_body_json(resp).await;
    let task_id = body["data"]["id"].as_i64().expect("task id");

    let req = actix_test::TestRequest::get()
        .uri("/api/v1/tasks?page=1&page_size=10")
        .insert_header(bearer(&user))
        .to_request();
    let body: Value = actix_test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["data"][0]["id"], task_id);
    assert_eq!(body["data"][0]["already_submitted"], false);

    let req = actix_test::TestRequest::post()
        .uri(&format!("/api/v1/tasks/{}/surveys", task_id))
        .insert_header(bearer(&user))
        .set_json(survey_body())
        .to_request();
    let resp = actix_test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = actix_test::read_body_json(resp).await;
    let survey_id = body["data"]["id"].as_i64().expect("survey id");
    assert_eq!(body["data"]["status"], "pending");

    // 同一任务重复提交
    let req = actix_test::TestRequest::post()
        .uri(&format!("/api/v1/tasks/{}/surveys", task_id))
        .insert_header(bearer(&user))
        .set_json(survey_body())
        .to_request();
    let resp = actix_test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = actix_test::read_body_json(resp).await;
    assert_eq!(body["code"], 3011);

    let req = actix_test::TestRequest::get()
        .uri("/admin/v1/surveys?status=pending")
        .insert_header(bearer(&admin))
        .to_request();
    let body: Value = actix_test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["pagination"]["total"], 1);

    let req = actix_test::TestRequest::post()
        .uri(&format!("/admin/v1/surveys/{}/approve", survey_id))
        .insert_header(bearer(&admin))
        .to_request();
    let body: Value = actix_test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["status"], "approved");
    assert_eq!(body["data"]["reward_amount"], 1250);

    let req = actix_test::TestRequest::get()
        .uri("/api/v1/wallet")
        .insert_header(bearer(&user))
        .to_request();
    let body: Value = actix_test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["balance"], 1250);
    assert_eq!(body["data"]["total_earned"], 1250);

    let req = actix_test::TestRequest::post()
        .uri(&format!("/admin/v1/surveys/{}/approve", survey_id))
        .insert_header(bearer(&admin))
        .to_request();
    let resp = actix_test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = actix_test::read_body_json(resp).await;
    assert_eq!(body["code"], 3012);

    let req = actix_test::TestRequest::get()
        .uri("/api/v1/wallet/transactions")
        .insert_header(bearer(&user))
        .to_request();
    let body: Value = actix_test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["data"][0]["kind"], "credit");
}

#[actix_web::test]
async fn test_withdrawal_flow() {
    let env = setup().await;
    let app = init_app!(env);
    let user = signup!(app, "cashout@example.com");
    let uid = user_id(&env, "cashout@example.com").await;
    earn(&env, uid, 4000).await;

    let withdraw = json!({
        "amount": 2500,
        "method": "bank_transfer",
        "account_details": "IBAN GB00 0000 1111"
    });

    let req = actix_test::TestRequest::post()
        .uri("/api/v1/withdrawals")
        .insert_header(bearer(&user))
        .set_json(&withdraw)
        .to_request();
    let resp = actix_test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = actix_test::read_body_json(resp).await;
    assert_eq!(body["code"], 5000);

    approve_kyc(&env, uid).await;

    let req = actix_test::TestRequest::post()
        .uri("/api/v1/withdrawals")
        .insert_header(bearer(&user))
        .set_json(&withdraw)
        .to_request();
    let resp = actix_test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = actix_test::read_body_json(resp).await;
    let withdrawal_id = body["data"]["id"].as_i64().expect("withdrawal id");

    let req = actix_test::TestRequest::post()
        .uri("/api/v1/withdrawals")
        .insert_header(bearer(&user))
        .set_json(&withdraw)
        .to_request();
    let resp = actix_test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = actix_test::read_body_json(resp).await;
    assert_eq!(body["code"], 4000);

    let admin = admin_token!(app);
    let req = actix_test::TestRequest::post()
        .uri(&format!("/admin/v1/withdrawals/{}/reject", withdrawal_id))
        .insert_header(bearer(&admin))
        .set_json(json!({ "reason": "Name does not match account" }))
        .to_request();
    let body: Value = actix_test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["status"], "rejected");

    let req = actix_test::TestRequest::get()
        .uri("/api/v1/wallet")
        .insert_header(bearer(&user))
        .to_request();
    let body: Value = actix_test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["balance"], 4000);
    assert_eq!(body["data"]["pending_withdrawals"], 0);

    let req = actix_test::TestRequest::post()
        .uri(&format!("/admin/v1/withdrawals/{}/approve", withdrawal_id))
        .insert_header(bearer(&admin))
        .to_request();
    let resp = actix_test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = actix_test::read_body_json(resp).await;
    assert_eq!(body["code"], 4002);
}

#[actix_web::test]
async fn test_kyc_endpoints() {
    let env = setup().await;
    let app = init_app!(env);
    let user = signup!(app, "identity@example.com");
    let uid = user_id(&env, "identity@example.com").await;

    let req = actix_test::TestRequest::get()
        .uri("/api/v1/kyc")
        .insert_header(bearer(&user))
        .to_request();
    let resp = actix_test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = actix_test::read_body_json(resp).await;
    assert_eq!(body["code"], 5001);

    let req = actix_test::TestRequest::put()
        .uri("/api/v1/kyc")
        .insert_header(bearer(&user))
        .set_json(json!({
            "full_name": "Robin Example",
            "date_of_birth": "1988-02-29",
            "document_type": "national_id",
            "document_number": "ab-123456",
            "document_urls": ["https://cdn.example.com/id-front.jpg"]
        }))
        .to_request();
    let body: Value = actix_test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["status"], "pending");
    assert_eq!(body["data"]["document_number"], "AB-123456");

    let admin = admin_token!(app);
    let req = actix_test::TestRequest::get()
        .uri("/admin/v1/kyc?status=pending")
        .insert_header(bearer(&admin))
        .to_request();
    let body: Value = actix_test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["pagination"]["total"], 1);

    let req = actix_test::TestRequest::post()
        .uri(&format!("/admin/v1/kyc/{}/approve", uid))
        .insert_header(bearer(&admin))
        .to_request();
    let body: Value = actix_test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["status"], "approved");

    let req = actix_test::TestRequest::get()
        .uri(&format!("/admin/v1/users/{}", uid))
        .insert_header(bearer(&admin))
        .to_request();
    let body: Value = actix_test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["kyc_status"], "approved");
    assert_eq!(body["data"]["balance"], 0);
}

#[actix_web::test]
async fn test_upload_and_serve() {
    let env = setup().await;
    let app = init_app!(env);
    let user = signup!(app, "uploader@example.com");

    let boundary = "----rewardhub-test-boundary";
    let png: &[u8] = b"\x89PNG\r\n\x1a\nnot-really-a-png";
    let mut payload = Vec::new();
    payload.extend_from_slice(
        format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"photo.png\"\r\nContent-Type: image/png\r\n\r\n",
            b = boundary
        )
        .as_bytes(),
    );
    payload.extend_from_slice(png);
    payload.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

    let req = actix_test::TestRequest::post()
        .uri("/api/v1/uploads")
        .insert_header(bearer(&user))
        .insert_header((
            "Content-Type",
            format!("multipart/form-data; boundary={}", boundary),
        ))
        .set_payload(payload)
        .to_request();
    let resp = actix_test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = actix_test::read_body_json(resp).await;
    let url = body["data"]["url"].as_str().expect("upload url").to_string();
    assert!(url.starts_with("/uploads/") && url.ends_with(".png"));
    assert_eq!(body["data"]["size"], png.len());

    let req = actix_test::TestRequest::get().uri(&url).to_request();
    let resp = actix_test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get("Content-Type").unwrap(), "image/png");
    let bytes = actix_test::read_body(resp).await;
    assert_eq!(bytes.as_ref(), png);

    let req = actix_test::TestRequest::get()
        .uri("/uploads/not-a-real-file.png")
        .to_request();
    let resp = actix_test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_upload_rejects_unsupported_type() {
    let env = setup().await;
    let app = init_app!(env);
    let user = signup!(app, "badfile@example.com");

    let boundary = "----rewardhub-test-boundary";
    let payload = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"run.sh\"\r\nContent-Type: text/x-shellscript\r\n\r\necho hi\r\n--{b}--\r\n",
        b = boundary
    );
    let req = actix_test::TestRequest::post()
        .uri("/api/v1/uploads")
        .insert_header(bearer(&user))
        .insert_header((
            "Content-Type",
            format!("multipart/form-data; boundary={}", boundary),
        ))
        .set_payload(payload)
        .to_request();
    let resp = actix_test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(resp).await;
    assert_eq!(body["code"], 6000);
}

#[actix_web::test]
async fn test_transactions_csv_export() {
    let env = setup().await;
    let app = init_app!(env);
    signup!(app, "export@example.com");
    let uid = user_id(&env, "export@example.com").await;
    earn(&env, uid, 800).await;
    earn(&env, uid, 200).await;

    let admin = admin_token!(app);
    let req = actix_test::TestRequest::get()
        .uri("/admin/v1/transactions/export")
        .insert_header(bearer(&admin))
        .to_request();
    let resp = actix_test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(
        resp.headers()
            .get("Content-Disposition")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("transactions_"))
    );

    let bytes = actix_test::read_body(resp).await;
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines[0],
        "id,user_id,kind,amount,reference,description,created_at"
    );
    assert_eq!(lines.len(), 3);
    assert!(lines[1].contains(",credit,800,"));
}

#[actix_web::test]
async fn test_admin_stats_endpoint() {
    let env = setup().await;
    let app = init_app!(env);
    signup!(app, "counted@example.com");
    let uid = user_id(&env, "counted@example.com").await;
    earn(&env, uid, 650).await;

    let admin = admin_token!(app);
    let req = actix_test::TestRequest::get()
        .uri("/admin/v1/stats")
        .insert_header(bearer(&admin))
        .to_request();
    let body: Value = actix_test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["users"], 1);
    assert_eq!(body["data"]["approved_surveys"], 1);
    assert_eq!(body["data"]["total_credited"], 650);
}

#[actix_web::test]
async fn test_invalid_json_uses_envelope() {
    let env = setup().await;
    let app = init_app!(env);

    let req = actix_test::TestRequest::post()
        .uri("/api/v1/auth/register")
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{ not json")
        .to_request();
    let resp = actix_test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(resp).await;
    assert_eq!(body["code"], 1000);
    assert!(body["message"].is_string());
}

#[actix_web::test]
async fn test_password_reset_over_http() {
    let env = setup().await;
    let app = init_app!(env);
    signup!(app, "forgot@example.com");

    for email in ["forgot@example.com", "stranger@example.com"] {
        let req = actix_test::TestRequest::post()
            .uri("/api/v1/auth/password-reset")
            .set_json(json!({ "email": email }))
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["code"], 0);
        assert_eq!(
            body["data"]["message"],
            "If the account exists, a reset link has been sent"
        );
    }
    let token = env.notifier.last_token().expect("reset token");
    assert_eq!(env.notifier.tokens.lock().unwrap().len(), 1);

    let req = actix_test::TestRequest::post()
        .uri("/api/v1/auth/password-reset/confirm")
        .set_json(json!({ "token": token, "new_password": "fresh password 9" }))
        .to_request();
    let body: Value = actix_test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["code"], 0);

    let req = actix_test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .set_json(json!({ "email": "forgot@example.com", "password": "fresh password 9" }))
        .to_request();
    let resp = actix_test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}
