//! 用户端路由

use actix_web::web;

use super::{account, auth, kyc, surveys, tasks, uploads, wallet};
use crate::api::services::rate_limit::login_rate_limiter;

/// 挂在 `/api/v1` 下的全部用户端路由
pub fn user_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/register", web::post().to(auth::register))
            .service(
                web::resource("/login")
                    .wrap(login_rate_limiter())
                    .route(web::post().to(auth::login)),
            )
            .route("/refresh", web::post().to(auth::refresh))
            .service(
                web::resource("/password-reset")
                    .wrap(login_rate_limiter())
                    .route(web::post().to(auth::request_password_reset)),
            )
            .route(
                "/password-reset/confirm",
                web::post().to(auth::confirm_password_reset),
            ),
    )
    .route("/me", web::get().to(account::get_me))
    .route("/me", web::put().to(account::update_me))
    .route("/me/password", web::put().to(account::change_password))
    .route("/tasks", web::get().to(tasks::list_tasks))
    .route("/tasks/{id}", web::get().to(tasks::get_task))
    .route("/tasks/{id}/surveys", web::post().to(tasks::submit_survey))
    .route("/surveys", web::get().to(surveys::list_my_surveys))
    .route("/surveys/{id}", web::get().to(surveys::get_my_survey))
    .route("/wallet", web::get().to(wallet::wallet_summary))
    .route("/wallet/transactions", web::get().to(wallet::wallet_transactions))
    .route("/withdrawals", web::get().to(wallet::list_my_withdrawals))
    .route("/withdrawals", web::post().to(wallet::request_withdrawal))
    .route("/kyc", web::get().to(kyc::get_kyc))
    .route("/kyc", web::put().to(kyc::submit_kyc))
    .route("/uploads", web::post().to(uploads::upload_file));
}
