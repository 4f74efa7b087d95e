use actix_web::{Responder, Result as ActixResult, web};

use crate::api::middleware::AuthUser;
use crate::api::services::error_code::Area;
use crate::api::services::helpers::{
    api_result, created_response, error_from_rewardhub, page_params, paginated_result,
};
use crate::api::services::types::{PageQuery, WithdrawalBody};
use crate::api::state::AppState;
use crate::services::WithdrawalRequest;

pub async fn wallet_summary(
    state: web::Data<AppState>,
    user: AuthUser,
) -> ActixResult<impl Responder> {
    Ok(api_result(state.wallet.summary(user.user_id).await, Area::Wallet))
}

pub async fn wallet_transactions(
    state: web::Data<AppState>,
    user: AuthUser,
    query: web::Query<PageQuery>,
) -> ActixResult<impl Responder> {
    let paging = page_params(query.page, query.page_size);
    let result = state
        .wallet
        .transactions(user.user_id, paging.0, paging.1)
        .await;
    Ok(paginated_result(result, paging, Area::Wallet))
}

pub async fn list_my_withdrawals(
    state: web::Data<AppState>,
    user: AuthUser,
    query: web::Query<PageQuery>,
) -> ActixResult<impl Responder> {
    let paging = page_params(query.page, query.page_size);
    let result = state
        .wallet
        .list_for_user(user.user_id, paging.0, paging.1)
        .await;
    Ok(paginated_result(result, paging, Area::Withdrawal))
}

pub async fn request_withdrawal(
    state: web::Data<AppState>,
    user: AuthUser,
    body: web::Json<WithdrawalBody>,
) -> ActixResult<impl Responder> {
    let body = body.into_inner();
    let result = state
        .wallet
        .request_withdrawal(
            user.user_id,
            WithdrawalRequest {
                amount: body.amount,
                method: body.method,
                account_details: body.account_details,
            },
        )
        .await;
    Ok(match result {
        Ok(withdrawal) => created_response(withdrawal),
        Err(e) => error_from_rewardhub(&e, Area::Withdrawal),
    })
}
