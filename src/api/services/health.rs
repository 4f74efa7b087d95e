use actix_web::{HttpResponse, Responder, web};
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{error, info, trace};

use crate::api::state::AppState;

use super::error_code::ErrorCode;
use super::types::ApiResponse;

const STORAGE_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Serialize, Debug)]
pub struct HealthStorageCheck {
    pub status: &'static str,
    pub backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub uptime: u64,
    pub storage: HealthStorageCheck,
    pub response_time_ms: u64,
}

/// Health Service
///
/// 直接调用 storage，不经过业务 service。
pub struct HealthService;

impl HealthService {
    async fn check_storage(state: &AppState) -> HealthStorageCheck {
        let backend = state.storage.backend_name().to_string();
        match tokio::time::timeout(STORAGE_CHECK_TIMEOUT, state.storage.ping()).await {
            Ok(Ok(())) => HealthStorageCheck {
                status: "healthy",
                backend,
                error: None,
            },
            Ok(Err(e)) => {
                error!("Storage health check failed: {}", e);
                HealthStorageCheck {
                    status: "unhealthy",
                    backend,
                    error: Some(e.message().to_string()),
                }
            }
            Err(_) => {
                error!("Storage health check timeout");
                HealthStorageCheck {
                    status: "unhealthy",
                    backend,
                    error: Some("timeout".to_string()),
                }
            }
        }
    }

    pub async fn health_check(state: web::Data<AppState>) -> impl Responder {
        let start_time = Instant::now();
        trace!("Received health check request");

        let storage = Self::check_storage(&state).await;
        let is_healthy = storage.error.is_none();
        let now = chrono::Utc::now();

        let body = ApiResponse {
            code: if is_healthy {
                ErrorCode::Success
            } else {
                ErrorCode::ServiceUnavailable
            },
            message: if is_healthy { "OK" } else { "Service Unavailable" }.to_string(),
            data: Some(HealthResponse {
                status: if is_healthy { "healthy" } else { "unhealthy" },
                timestamp: now.to_rfc3339(),
                uptime: (now - state.started_at).num_seconds().max(0) as u64,
                storage,
                response_time_ms: start_time.elapsed().as_millis() as u64,
            }),
        };

        info!(
            "Health check completed in {:?}, healthy: {}",
            start_time.elapsed(),
            is_healthy
        );

        let mut builder = if is_healthy {
            HttpResponse::Ok()
        } else {
            HttpResponse::ServiceUnavailable()
        };
        builder.json(body)
    }

    /// 就绪检查：数据库可用才返回 200
    pub async fn readiness_check(state: web::Data<AppState>) -> impl Responder {
        trace!("Received readiness check request");
        match tokio::time::timeout(STORAGE_CHECK_TIMEOUT, state.storage.ping()).await {
            Ok(Ok(())) => HttpResponse::Ok()
                .append_header(("Content-Type", "text/plain"))
                .body("OK"),
            _ => HttpResponse::ServiceUnavailable()
                .append_header(("Content-Type", "text/plain"))
                .body("NOT READY"),
        }
    }

    pub async fn liveness_check() -> impl Responder {
        trace!("Received liveness check request");
        HttpResponse::NoContent().finish()
    }
}

/// Health 路由配置
pub fn health_routes() -> actix_web::Scope {
    web::scope("/health")
        .route("", web::get().to(HealthService::health_check))
        .route("", web::head().to(HealthService::health_check))
        .route("/ready", web::get().to(HealthService::readiness_check))
        .route("/ready", web::head().to(HealthService::readiness_check))
        .route("/live", web::get().to(HealthService::liveness_check))
        .route("/live", web::head().to(HealthService::liveness_check))
}
