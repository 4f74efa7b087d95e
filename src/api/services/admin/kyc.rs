use actix_web::{Responder, Result as ActixResult, web};

use crate::api::services::error_code::Area;
use crate::api::services::helpers::{api_result, page_params, paginated_result};
use crate::api::services::types::{KycListQuery, RejectBody};
use crate::api::state::AppState;

pub async fn list_kyc(
    state: web::Data<AppState>,
    query: web::Query<KycListQuery>,
) -> ActixResult<impl Responder> {
    let paging = page_params(query.page, query.page_size);
    Ok(paginated_result(
        state.kyc.list(query.status, paging.0, paging.1).await,
        paging,
        Area::Kyc,
    ))
}

pub async fn approve_kyc(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> ActixResult<impl Responder> {
    Ok(api_result(state.kyc.approve(path.into_inner()).await, Area::Kyc))
}

pub async fn reject_kyc(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<RejectBody>,
) -> ActixResult<impl Responder> {
    Ok(api_result(
        state.kyc.reject(path.into_inner(), &body.reason).await,
        Area::Kyc,
    ))
}
