use actix_web::{Responder, Result as ActixResult, web};

use crate::api::services::error_code::Area;
use crate::api::services::helpers::api_result;
use crate::api::services::types::{AdminLoginBody, RefreshBody};
use crate::api::state::AppState;

/// POST /admin/v1/auth/login：用配置的 admin_token 换取管理员 JWT
pub async fn admin_login(
    state: web::Data<AppState>,
    body: web::Json<AdminLoginBody>,
) -> ActixResult<impl Responder> {
    Ok(api_result(state.users.admin_login(&body.token).await, Area::Auth))
}

pub async fn admin_refresh(
    state: web::Data<AppState>,
    body: web::Json<RefreshBody>,
) -> ActixResult<impl Responder> {
    Ok(api_result(
        state.users.refresh(&body.refresh_token).await,
        Area::Auth,
    ))
}
