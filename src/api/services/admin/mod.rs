//! Admin API handlers
//!
//! 所有路由（`/auth/*` 除外）都需要管理员 JWT；
//! 未配置 admin_token 时整个前缀返回 404。

pub mod auth;
pub mod export;
pub mod kyc;
pub mod routes;
pub mod stats;
pub mod surveys;
pub mod tasks;
pub mod users;
pub mod withdrawals;

pub use routes::admin_routes;
