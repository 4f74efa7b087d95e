use actix_web::{Responder, Result as ActixResult, web};

use crate::api::middleware::AuthUser;
use crate::api::services::error_code::Area;
use crate::api::services::helpers::api_result;
use crate::api::services::types::{ChangePasswordBody, MessageResponse, UpdateProfileBody};
use crate::api::state::AppState;
use crate::services::ProfileUpdate;

pub async fn get_me(state: web::Data<AppState>, user: AuthUser) -> ActixResult<impl Responder> {
    Ok(api_result(
        state.users.get_profile(user.user_id).await,
        Area::General,
    ))
}

pub async fn update_me(
    state: web::Data<AppState>,
    user: AuthUser,
    body: web::Json<UpdateProfileBody>,
) -> ActixResult<impl Responder> {
    let body = body.into_inner();
    let update = ProfileUpdate {
        display_name: body.display_name,
        phone: body.phone,
    };
    Ok(api_result(
        state.users.update_profile(user.user_id, update).await,
        Area::General,
    ))
}

pub async fn change_password(
    state: web::Data<AppState>,
    user: AuthUser,
    body: web::Json<ChangePasswordBody>,
) -> ActixResult<impl Responder> {
    let result = state
        .users
        .change_password(user.user_id, &body.current_password, &body.new_password)
        .await
        .map(|_| MessageResponse {
            message: "Password updated".to_string(),
        });
    Ok(api_result(result, Area::Auth))
}
