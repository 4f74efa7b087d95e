//! Public account endpoints under `/api/v1/auth`

use actix_web::{Responder, Result as ActixResult, web};
use tracing::info;

use crate::api::services::error_code::Area;
use crate::api::services::helpers::{api_result, created_response, error_from_rewardhub, success_response};
use crate::api::services::types::{
    LoginBody, MessageResponse, PasswordResetBody, PasswordResetConfirmBody, RefreshBody,
    RegisterBody,
};
use crate::api::state::AppState;
use crate::services::RegisterRequest;

pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterBody>,
) -> ActixResult<impl Responder> {
    let body = body.into_inner();
    let result = state
        .users
        .register(RegisterRequest {
            email: body.email,
            password: body.password,
            display_name: body.display_name,
            phone: body.phone,
        })
        .await;

    Ok(match result {
        Ok(user) => created_response(user),
        Err(e) => error_from_rewardhub(&e, Area::Auth),
    })
}

pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginBody>,
) -> ActixResult<impl Responder> {
    Ok(api_result(
        state.users.login(&body.email, &body.password).await,
        Area::Auth,
    ))
}

pub async fn refresh(
    state: web::Data<AppState>,
    body: web::Json<RefreshBody>,
) -> ActixResult<impl Responder> {
    Ok(api_result(
        state.users.refresh(&body.refresh_token).await,
        Area::Auth,
    ))
}

/// 不论邮箱是否存在都返回相同结果
pub async fn request_password_reset(
    state: web::Data<AppState>,
    body: web::Json<PasswordResetBody>,
) -> ActixResult<impl Responder> {
    if let Err(e) = state.users.request_password_reset(&body.email).await {
        return Ok(error_from_rewardhub(&e, Area::Auth));
    }
    Ok(success_response(MessageResponse {
        message: "If the account exists, a reset link has been sent".to_string(),
    }))
}

pub async fn confirm_password_reset(
    state: web::Data<AppState>,
    body: web::Json<PasswordResetConfirmBody>,
) -> ActixResult<impl Responder> {
    let result = state
        .users
        .confirm_password_reset(&body.token, &body.new_password)
        .await;
    if result.is_ok() {
        info!("Password reset confirmed");
    }
    Ok(api_result(
        result.map(|_| MessageResponse {
            message: "Password has been reset".to_string(),
        }),
        Area::Auth,
    ))
}
