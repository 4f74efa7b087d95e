//! HTTP API：路由、中间件、JWT 与共享状态

pub mod constants;
pub mod jwt;
pub mod middleware;
pub mod services;
pub mod state;

pub use state::AppState;
