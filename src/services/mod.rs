//! Service layer for business logic
//!
//! Shared between the HTTP API and the CLI. Services validate input,
//! enforce business rules and delegate persistence to `SeaOrmStorage`.

mod kyc_service;
mod media_service;
mod survey_service;
mod task_service;
mod user_service;
pub mod validation;
mod wallet_service;

pub use kyc_service::*;
pub use media_service::*;
pub use survey_service::*;
pub use task_service::*;
pub use user_service::*;
pub use wallet_service::*;
