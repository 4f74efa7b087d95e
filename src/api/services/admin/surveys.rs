//! 问卷审核

use actix_web::{Responder, Result as ActixResult, web};

use crate::api::middleware::AdminUser;
use crate::api::services::error_code::Area;
use crate::api::services::helpers::{api_result, page_params, paginated_result};
use crate::api::services::types::{RejectBody, SurveyListQuery};
use crate::api::state::AppState;
use crate::storage::SurveyFilter;

pub async fn list_surveys(
    state: web::Data<AppState>,
    query: web::Query<SurveyListQuery>,
) -> ActixResult<impl Responder> {
    let query = query.into_inner();
    let paging = page_params(query.page, query.page_size);
    let filter = SurveyFilter {
        status: query.status,
        task_id: query.task_id,
        user_id: query.user_id,
    };
    Ok(paginated_result(
        state.surveys.list(filter, paging.0, paging.1).await,
        paging,
        Area::Survey,
    ))
}

pub async fn get_survey(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> ActixResult<impl Responder> {
    Ok(api_result(
        state.surveys.get(path.into_inner(), None).await,
        Area::Survey,
    ))
}

/// 通过并入账；重复通过返回 SurveyAlreadyReviewed
pub async fn approve_survey(
    state: web::Data<AppState>,
    admin: AdminUser,
    path: web::Path<i64>,
) -> ActixResult<impl Responder> {
    Ok(api_result(
        state
            .surveys
            .approve(path.into_inner(), &admin.subject)
            .await,
        Area::Survey,
    ))
}

pub async fn reject_survey(
    state: web::Data<AppState>,
    admin: AdminUser,
    path: web::Path<i64>,
    body: web::Json<RejectBody>,
) -> ActixResult<impl Responder> {
    Ok(api_result(
        state
            .surveys
            .reject(path.into_inner(), &admin.subject, &body.reason)
            .await,
        Area::Survey,
    ))
}
