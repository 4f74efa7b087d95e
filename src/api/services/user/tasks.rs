use actix_web::{Responder, Result as ActixResult, web};

use crate::api::middleware::AuthUser;
use crate::api::services::error_code::Area;
use crate::api::services::helpers::{
    api_result, created_response, error_from_rewardhub, page_params, paginated_result,
};
use crate::api::services::types::TaskListQuery;
use crate::api::state::AppState;
use crate::services::SubmitSurveyRequest;

/// GET /tasks：开放中的任务，带提交数和当前用户是否已提交
pub async fn list_tasks(
    state: web::Data<AppState>,
    user: AuthUser,
    query: web::Query<TaskListQuery>,
) -> ActixResult<impl Responder> {
    let query = query.into_inner();
    let paging = page_params(query.page, query.page_size);
    let result = state
        .tasks
        .list_open_for_user(user.user_id, query.category, query.search, paging.0, paging.1)
        .await;
    Ok(paginated_result(result, paging, Area::Task))
}

pub async fn get_task(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<i64>,
) -> ActixResult<impl Responder> {
    Ok(api_result(
        state.tasks.get_for_user(user.user_id, path.into_inner()).await,
        Area::Task,
    ))
}

/// POST /tasks/{id}/surveys
pub async fn submit_survey(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<i64>,
    body: web::Json<SubmitSurveyRequest>,
) -> ActixResult<impl Responder> {
    let result = state
        .surveys
        .submit(user.user_id, path.into_inner(), body.into_inner())
        .await;
    Ok(match result {
        Ok(survey) => created_response(survey),
        Err(e) => error_from_rewardhub(&e, Area::Survey),
    })
}
