use actix_web::{Responder, Result as ActixResult, web};

use crate::api::middleware::AuthUser;
use crate::api::services::error_code::Area;
use crate::api::services::helpers::api_result;
use crate::api::services::types::KycBody;
use crate::api::state::AppState;
use crate::services::KycSubmission;

pub async fn get_kyc(state: web::Data<AppState>, user: AuthUser) -> ActixResult<impl Responder> {
    Ok(api_result(state.kyc.get(user.user_id).await, Area::Kyc))
}

/// PUT /kyc：首次提交或被拒后重新提交
pub async fn submit_kyc(
    state: web::Data<AppState>,
    user: AuthUser,
    body: web::Json<KycBody>,
) -> ActixResult<impl Responder> {
    let body = body.into_inner();
    let submission = KycSubmission {
        full_name: body.full_name,
        date_of_birth: body.date_of_birth,
        document_type: body.document_type,
        document_number: body.document_number,
        document_urls: body.document_urls,
        address: body.address,
    };
    Ok(api_result(
        state.kyc.submit(user.user_id, submission).await,
        Area::Kyc,
    ))
}
