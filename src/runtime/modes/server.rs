//! Server mode
//!
//! Builds the actix-web application and runs it until Ctrl+C.

use actix_cors::Cors;
use actix_web::{
    App, HttpRequest, HttpServer,
    error::{InternalError, JsonPayloadError, QueryPayloadError},
    http::{Method, StatusCode, header},
    middleware::Compress,
    web,
};
use anyhow::Result;
use tracing::warn;

use crate::api::constants::{ADMIN_PREFIX, API_PREFIX, UPLOADS_PATH};
use crate::api::middleware::{JwtAuth, RequestIdMiddleware, TimingMiddleware};
use crate::api::services::{
    ErrorCode, admin_routes, error_response, health_routes, serve_upload, user_routes,
};
use crate::config::{ApiConfig, StaticConfig};
use crate::runtime::lifetime;

/// JSON body 上限
const JSON_LIMIT: usize = 256 * 1024;

fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let message = format!("Invalid JSON body: {}", err);
    let response = error_response(StatusCode::BAD_REQUEST, ErrorCode::BadRequest, &message);
    InternalError::from_response(err, response).into()
}

fn query_error(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let message = format!("Invalid query string: {}", err);
    let response = error_response(StatusCode::BAD_REQUEST, ErrorCode::BadRequest, &message);
    InternalError::from_response(err, response).into()
}

/// Build CORS middleware from `api.cors_allowed_origins`
///
/// 空列表时只允许同源；`*` 表示任意来源（不携带凭据）。
pub fn build_cors(api: &ApiConfig) -> Cors {
    let origins = &api.cors_allowed_origins;
    if origins.is_empty() {
        return Cors::default();
    }

    let mut cors = Cors::default()
        .allowed_methods(vec![
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allowed_header("x-request-id")
        .expose_headers(vec!["x-request-id"])
        .max_age(3600);

    if origins.iter().any(|o| o == "*") {
        cors = cors.allow_any_origin();
    } else {
        for origin in origins {
            cors = cors.allowed_origin(origin);
        }
    }
    cors
}

/// 注册全部路由；server 与集成测试共用
pub fn configure_app(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .limit(JSON_LIMIT)
            .error_handler(json_error),
    )
    .app_data(web::QueryConfig::default().error_handler(query_error))
    .service(health_routes())
    .route(
        &format!("{}/{{name}}", UPLOADS_PATH),
        web::get().to(serve_upload),
    )
    .service(
        web::scope(ADMIN_PREFIX)
            .wrap(JwtAuth::admin())
            .configure(admin_routes),
    )
    .service(
        web::scope(API_PREFIX)
            .wrap(JwtAuth::user())
            .configure(user_routes),
    );
}

/// Run the HTTP server
///
/// **Note**: Logging system must be initialized before calling this function
pub async fn run_server(config: &StaticConfig) -> Result<()> {
    let startup = lifetime::startup::prepare_server_startup(config)
        .await
        .map_err(|e| {
            tracing::error!("Server startup failed: {}", e);
            e
        })?;

    let state = startup.state.clone();
    let api_config = config.api.clone();
    let cpu_count = config.server.cpu_count.clamp(1, 32);
    warn!("Using {} CPU cores for the server", cpu_count);

    if api_config.cors_allowed_origins.iter().any(|o| o == "*") {
        warn!("CORS allows any origin");
    }

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TimingMiddleware)
            .wrap(RequestIdMiddleware)
            .wrap(build_cors(&api_config))
            .wrap(Compress::default())
            .app_data(state.clone())
            .configure(configure_app)
    })
    .keep_alive(std::time::Duration::from_secs(30))
    .client_request_timeout(std::time::Duration::from_secs(10))
    .workers(cpu_count);

    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    warn!("Starting server at http://{}", bind_address);
    let server = server.bind(&bind_address)?.run();

    tokio::select! {
        res = server => {
            res?;
        }
        _ = lifetime::shutdown::listen_for_shutdown(startup.storage.clone()) => {
            warn!("Graceful shutdown completed");
        }
    }

    Ok(())
}
