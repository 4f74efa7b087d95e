use actix_web::{Responder, Result as ActixResult, web};

use crate::api::middleware::AuthUser;
use crate::api::services::error_code::Area;
use crate::api::services::helpers::{api_result, page_params, paginated_result};
use crate::api::services::types::PageQuery;
use crate::api::state::AppState;

pub async fn list_my_surveys(
    state: web::Data<AppState>,
    user: AuthUser,
    query: web::Query<PageQuery>,
) -> ActixResult<impl Responder> {
    let paging = page_params(query.page, query.page_size);
    let result = state
        .surveys
        .list_for_user(user.user_id, paging.0, paging.1)
        .await;
    Ok(paginated_result(result, paging, Area::Survey))
}

pub async fn get_my_survey(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<i64>,
) -> ActixResult<impl Responder> {
    Ok(api_result(
        state.surveys.get(path.into_inner(), Some(user.user_id)).await,
        Area::Survey,
    ))
}
