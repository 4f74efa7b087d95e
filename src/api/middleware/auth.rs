//! Bearer JWT authentication
//!
//! `JwtAuth::user()` guards `/api/v1`, `JwtAuth::admin()` guards `/admin/v1`.
//! Validated claims are stored in request extensions and read back by the
//! [`AuthUser`] / [`AdminUser`] extractors.

use actix_service::{Service, Transform};
use actix_web::{
    Error, FromRequest, HttpMessage, HttpRequest, HttpResponse,
    body::EitherBody,
    dev::{Payload, ServiceRequest, ServiceResponse},
    http::{Method, StatusCode, header::CONTENT_TYPE},
    web,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use tracing::{debug, info, trace};

use crate::api::constants::{ADMIN_PREFIX, API_PREFIX};
use crate::api::jwt::{Claims, Role};
use crate::api::services::{ErrorCode, error_response};
use crate::api::state::AppState;

/// 认证中间件工厂
#[derive(Clone)]
pub struct JwtAuth {
    role: Role,
    /// 该前缀下的路径无需 token（登录、注册等）
    public_prefix: String,
}

impl JwtAuth {
    pub fn user() -> Self {
        Self {
            role: Role::User,
            public_prefix: format!("{}/auth/", API_PREFIX),
        }
    }

    pub fn admin() -> Self {
        Self {
            role: Role::Admin,
            public_prefix: format!("{}/auth/", ADMIN_PREFIX),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthMiddleware {
            service: Rc::new(service),
            role: self.role,
            public_prefix: Rc::from(self.public_prefix.as_str()),
        }))
    }
}

pub struct JwtAuthMiddleware<S> {
    service: Rc<S>,
    role: Role,
    public_prefix: Rc<str>,
}

impl<S, B> JwtAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    /// Handle OPTIONS requests for CORS preflight
    fn handle_options_request(req: ServiceRequest) -> ServiceResponse<EitherBody<B>> {
        req.into_response(
            HttpResponse::NoContent()
                .insert_header((CONTENT_TYPE, "text/plain; charset=utf-8"))
                .finish()
                .map_into_right_body(),
        )
    }

    /// 管理员 token 未配置时整个管理接口返回 404
    fn handle_admin_disabled(req: ServiceRequest) -> ServiceResponse<EitherBody<B>> {
        debug!("Admin token not configured - returning 404");
        req.into_response(
            HttpResponse::NotFound()
                .insert_header((CONTENT_TYPE, "text/plain; charset=utf-8"))
                .body("Not Found")
                .map_into_right_body(),
        )
    }

    fn handle_unauthorized(req: ServiceRequest, message: &str) -> ServiceResponse<EitherBody<B>> {
        info!("Authentication failed for {}: {}", req.path(), message);
        req.into_response(
            error_response(StatusCode::UNAUTHORIZED, ErrorCode::Unauthorized, message)
                .map_into_right_body(),
        )
    }

    fn handle_forbidden(req: ServiceRequest) -> ServiceResponse<EitherBody<B>> {
        info!("Role mismatch for {}", req.path());
        req.into_response(
            error_response(
                StatusCode::FORBIDDEN,
                ErrorCode::Forbidden,
                "Insufficient permissions",
            )
            .map_into_right_body(),
        )
    }

    /// 从 Authorization header 提取 Bearer token
    fn extract_bearer_token(req: &ServiceRequest) -> Option<String> {
        req.headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.strip_prefix("Bearer "))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        let role = self.role;
        let public_prefix = self.public_prefix.clone();

        Box::pin(async move {
            let Some(state) = req.app_data::<web::Data<AppState>>().cloned() else {
                return Ok(req.into_response(
                    HttpResponse::InternalServerError()
                        .finish()
                        .map_into_right_body(),
                ));
            };

            if role == Role::Admin && !state.users.admin_enabled() {
                return Ok(Self::handle_admin_disabled(req));
            }

            if req.method() == Method::OPTIONS {
                return Ok(Self::handle_options_request(req));
            }

            if req.path().starts_with(public_prefix.as_ref()) {
                trace!("Public endpoint {} - bypassing authentication", req.path());
                return Ok(srv.call(req).await?.map_into_left_body());
            }

            let Some(token) = Self::extract_bearer_token(&req) else {
                return Ok(Self::handle_unauthorized(req, "Missing bearer token"));
            };

            let claims = match state.jwt.validate_access_token(&token) {
                Ok(claims) => claims,
                Err(e) => {
                    debug!("Bearer token validation failed: {}", e);
                    return Ok(Self::handle_unauthorized(req, "Invalid or expired token"));
                }
            };
            if claims.role != role {
                return Ok(Self::handle_forbidden(req));
            }

            trace!("Authenticated {} {}", claims.role, claims.sub);
            req.extensions_mut().insert(claims);
            Ok(srv.call(req).await?.map_into_left_body())
        })
    }
}

fn claims_from(req: &HttpRequest) -> Option<Claims> {
    req.extensions().get::<Claims>().cloned()
}

/// 已认证的普通用户
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: i64,
}

impl FromRequest for AuthUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let result = claims_from(req)
            .and_then(|c| c.user_id())
            .map(|user_id| AuthUser { user_id })
            .ok_or_else(|| actix_web::error::ErrorUnauthorized("Unauthorized"));
        ready(result)
    }
}

/// 已认证的管理员
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub subject: String,
}

impl FromRequest for AdminUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let result = claims_from(req)
            .filter(|c| c.role == Role::Admin)
            .map(|c| AdminUser { subject: c.sub })
            .ok_or_else(|| actix_web::error::ErrorUnauthorized("Unauthorized"));
        ready(result)
    }
}
