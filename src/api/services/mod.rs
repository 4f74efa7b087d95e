pub mod admin;
pub mod error_code;
pub mod health;
pub mod helpers;
pub mod rate_limit;
pub mod types;
pub mod user;

pub use admin::admin_routes;
pub use error_code::{Area, ErrorCode};
pub use health::{HealthService, health_routes};
pub use helpers::{
    api_result, created_response, error_from_rewardhub, error_response, page_params,
    paginated_result, success_response,
};
pub use rate_limit::login_rate_limiter;
pub use types::*;
pub use user::{serve_upload, user_routes};
