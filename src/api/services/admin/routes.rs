//! 管理端路由

use actix_web::web;

use super::{auth, export, kyc, stats, surveys, tasks, users, withdrawals};
use crate::api::services::rate_limit::login_rate_limiter;

/// 挂在 `/admin/v1` 下的全部管理端路由
pub fn admin_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(login_rate_limiter())
                    .route(web::post().to(auth::admin_login)),
            )
            .route("/refresh", web::post().to(auth::admin_refresh)),
    )
    .route("/tasks", web::get().to(tasks::list_tasks))
    .route("/tasks", web::post().to(tasks::create_task))
    .route("/tasks/{id}", web::get().to(tasks::get_task))
    .route("/tasks/{id}", web::put().to(tasks::update_task))
    .route("/tasks/{id}/status", web::put().to(tasks::set_task_status))
    .route("/surveys", web::get().to(surveys::list_surveys))
    .route("/surveys/{id}", web::get().to(surveys::get_survey))
    .route("/surveys/{id}/approve", web::post().to(surveys::approve_survey))
    .route("/surveys/{id}/reject", web::post().to(surveys::reject_survey))
    .route("/kyc", web::get().to(kyc::list_kyc))
    .route("/kyc/{user_id}/approve", web::post().to(kyc::approve_kyc))
    .route("/kyc/{user_id}/reject", web::post().to(kyc::reject_kyc))
    .route("/withdrawals", web::get().to(withdrawals::list_withdrawals))
    .route(
        "/withdrawals/{id}/approve",
        web::post().to(withdrawals::approve_withdrawal),
    )
    .route(
        "/withdrawals/{id}/reject",
        web::post().to(withdrawals::reject_withdrawal),
    )
    .route("/users", web::get().to(users::list_users))
    .route("/users/{id}", web::get().to(users::get_user))
    .route("/users/{id}/adjust", web::post().to(users::adjust_balance))
    .route(
        "/transactions/export",
        web::get().to(export::export_transactions),
    )
    .route("/stats", web::get().to(stats::get_stats));
}
