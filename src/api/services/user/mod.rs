//! User-facing API handlers

pub mod account;
pub mod auth;
pub mod kyc;
pub mod routes;
pub mod surveys;
pub mod tasks;
pub mod uploads;
pub mod wallet;

pub use routes::user_routes;
pub use uploads::serve_upload;
