use actix_web::{Responder, Result as ActixResult, web};

use crate::api::services::error_code::Area;
use crate::api::services::helpers::api_result;
use crate::api::state::AppState;

pub async fn get_stats(state: web::Data<AppState>) -> ActixResult<impl Responder> {
    Ok(api_result(state.storage.admin_stats().await, Area::General))
}
