use actix_web::{Responder, Result as ActixResult, web};

use crate::api::services::error_code::Area;
use crate::api::services::helpers::{
    api_result, created_response, error_from_rewardhub, page_params, paginated_result,
};
use crate::api::services::types::{AdjustBalanceBody, UserListQuery};
use crate::api::state::AppState;

pub async fn list_users(
    state: web::Data<AppState>,
    query: web::Query<UserListQuery>,
) -> ActixResult<impl Responder> {
    let query = query.into_inner();
    let paging = page_params(query.page, query.page_size);
    Ok(paginated_result(
        state.users.list_users(paging.0, paging.1, query.search).await,
        paging,
        Area::General,
    ))
}

/// 用户详情，附带余额与 KYC 状态
pub async fn get_user(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> ActixResult<impl Responder> {
    Ok(api_result(
        state.users.user_detail(path.into_inner()).await,
        Area::General,
    ))
}

pub async fn adjust_balance(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<AdjustBalanceBody>,
) -> ActixResult<impl Responder> {
    let body = body.into_inner();
    let result = state
        .wallet
        .adjust(path.into_inner(), body.kind, body.amount, &body.note)
        .await;
    Ok(match result {
        Ok(tx) => created_response(tx),
        Err(e) => error_from_rewardhub(&e, Area::Wallet),
    })
}
