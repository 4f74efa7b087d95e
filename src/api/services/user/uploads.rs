//! 图片 / 证件上传
//!
//! `POST /api/v1/uploads` 接收 multipart 字段 `file`，
//! 文件通过公开的 `GET /uploads/{name}` 读取。

use actix_multipart::Multipart;
use actix_web::http::StatusCode;
use actix_web::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use actix_web::{HttpResponse, Responder, Result as ActixResult, web};
use futures_util::StreamExt;
use tracing::{error, info};

use crate::api::middleware::AuthUser;
use crate::api::services::error_code::{Area, ErrorCode};
use crate::api::services::helpers::{created_response, error_from_rewardhub, error_response};
use crate::api::state::AppState;
use crate::errors::RewardHubError;

pub async fn upload_file(
    state: web::Data<AppState>,
    user: AuthUser,
    mut payload: Multipart,
) -> ActixResult<impl Responder> {
    let limit = state.media.max_file_size();
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(item) = payload.next().await {
        let mut field = match item {
            Ok(f) => f,
            Err(e) => {
                error!("Failed to parse multipart field: {}", e);
                return Ok(error_response(
                    StatusCode::BAD_REQUEST,
                    ErrorCode::InvalidMultipartData,
                    "Invalid multipart data",
                ));
            }
        };

        if field.name() != Some("file") {
            continue;
        }

        let content_type = field
            .content_type()
            .map(|m| m.essence_str().to_string())
            .unwrap_or_default();
        // 先检查类型，避免读取不支持的文件
        if let Err(e) = state.media.check_content_type(&content_type) {
            return Ok(error_from_rewardhub(&e, Area::Upload));
        }

        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            match chunk {
                Ok(bytes) => {
                    if data.len() + bytes.len() > limit {
                        return Ok(error_response(
                            StatusCode::PAYLOAD_TOO_LARGE,
                            ErrorCode::FileTooLarge,
                            &format!("File exceeds the {} byte limit", limit),
                        ));
                    }
                    data.extend_from_slice(&bytes);
                }
                Err(e) => {
                    error!("Failed to read upload chunk: {}", e);
                    return Ok(error_response(
                        StatusCode::BAD_REQUEST,
                        ErrorCode::InvalidMultipartData,
                        "Failed to read uploaded file",
                    ));
                }
            }
        }
        upload = Some((content_type, data));
    }

    let Some((content_type, data)) = upload else {
        return Ok(error_from_rewardhub(
            &RewardHubError::validation("Missing multipart field 'file'"),
            Area::Upload,
        ));
    };

    Ok(match state.media.save(&content_type, &data).await {
        Ok(stored) => {
            info!("User {} uploaded {}", user.user_id, stored.url);
            created_response(stored)
        }
        Err(e) => error_from_rewardhub(&e, Area::Upload),
    })
}

/// GET /uploads/{name}
pub async fn serve_upload(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> ActixResult<impl Responder> {
    let name = path.into_inner();
    let (file, content_type) = match state.media.locate(&name).await {
        Ok(found) => found,
        Err(e) => return Ok(error_from_rewardhub(&e, Area::Upload)),
    };

    Ok(match tokio::fs::read(&file).await {
        Ok(bytes) => HttpResponse::Ok()
            .insert_header((CONTENT_TYPE, content_type))
            .insert_header((CACHE_CONTROL, "public, max-age=86400, immutable"))
            .body(bytes),
        Err(e) => error_from_rewardhub(&RewardHubError::from(e), Area::Upload),
    })
}
