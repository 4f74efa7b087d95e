//! 提现处理

use actix_web::{Responder, Result as ActixResult, web};

use crate::api::services::error_code::Area;
use crate::api::services::helpers::{api_result, page_params, paginated_result};
use crate::api::services::types::{ApproveWithdrawalBody, RejectBody, WithdrawalListQuery};
use crate::api::state::AppState;
use crate::storage::WithdrawalFilter;

pub async fn list_withdrawals(
    state: web::Data<AppState>,
    query: web::Query<WithdrawalListQuery>,
) -> ActixResult<impl Responder> {
    let paging = page_params(query.page, query.page_size);
    let filter = WithdrawalFilter {
        status: query.status,
        user_id: query.user_id,
    };
    Ok(paginated_result(
        state.wallet.list_withdrawals(filter, paging.0, paging.1).await,
        paging,
        Area::Withdrawal,
    ))
}

/// 标记为已打款；body 可省略
pub async fn approve_withdrawal(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: Option<web::Json<ApproveWithdrawalBody>>,
) -> ActixResult<impl Responder> {
    let payout_reference = body.and_then(|b| b.into_inner().payout_reference);
    Ok(api_result(
        state
            .wallet
            .approve_withdrawal(path.into_inner(), payout_reference)
            .await,
        Area::Withdrawal,
    ))
}

/// 拒绝并退款
pub async fn reject_withdrawal(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<RejectBody>,
) -> ActixResult<impl Responder> {
    Ok(api_result(
        state
            .wallet
            .reject_withdrawal(path.into_inner(), &body.reason)
            .await,
        Area::Withdrawal,
    ))
}
