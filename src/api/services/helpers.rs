//! API 帮助函数

use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use serde::Serialize;
use tracing::{error, info};

use crate::api::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::errors::RewardHubError;
use crate::storage::Page;

use super::error_code::{Area, ErrorCode};
use super::types::{ApiResponse, PaginatedResponse, PaginationInfo};

/// 构建 JSON 响应
pub fn json_response<T: Serialize>(
    status: StatusCode,
    code: ErrorCode,
    message: impl Into<String>,
    data: Option<T>,
) -> HttpResponse {
    HttpResponse::build(status)
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(ApiResponse {
            code,
            message: message.into(),
            data,
        })
}

/// 构建成功响应
pub fn success_response<T: Serialize>(data: T) -> HttpResponse {
    json_response(StatusCode::OK, ErrorCode::Success, "OK", Some(data))
}

pub fn created_response<T: Serialize>(data: T) -> HttpResponse {
    json_response(StatusCode::CREATED, ErrorCode::Success, "Created", Some(data))
}

/// 构建错误响应
pub fn error_response(status: StatusCode, error_code: ErrorCode, message: &str) -> HttpResponse {
    json_response::<()>(status, error_code, message, None)
}

/// 从 RewardHubError 构建错误响应（自动映射 HTTP 状态码和 ErrorCode）
///
/// 内部错误只记录日志，不把细节返回给客户端。
pub fn error_from_rewardhub(err: &RewardHubError, area: Area) -> HttpResponse {
    let status =
        StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let code = ErrorCode::for_error(err, area);

    if err.is_internal() {
        error!("{} ({:?}): {}", err.error_type(), area, err.message());
        error_response(status, code, "Internal server error")
    } else {
        info!("{:?} request rejected: {}", area, err);
        error_response(status, code, err.message())
    }
}

/// 统一 Result → HttpResponse 转换
pub fn api_result<T: Serialize>(result: Result<T, RewardHubError>, area: Area) -> HttpResponse {
    match result {
        Ok(data) => success_response(data),
        Err(e) => error_from_rewardhub(&e, area),
    }
}

/// 分页 Result → HttpResponse
pub fn paginated_result<T: Serialize>(
    result: Result<Page<T>, RewardHubError>,
    (page, page_size): (u64, u64),
    area: Area,
) -> HttpResponse {
    match result {
        Ok((data, total)) => HttpResponse::Ok()
            .append_header(("Content-Type", "application/json; charset=utf-8"))
            .json(PaginatedResponse {
                code: ErrorCode::Success,
                message: "OK".to_string(),
                data,
                pagination: PaginationInfo::new(page, page_size, total),
            }),
        Err(e) => error_from_rewardhub(&e, area),
    }
}

/// 页码从 1 开始；page_size 限制在 1..=100
pub fn page_params(page: Option<u64>, page_size: Option<u64>) -> (u64, u64) {
    (
        page.unwrap_or(1).max(1),
        page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
    )
}
