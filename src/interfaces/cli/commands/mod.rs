//! CLI command implementations

mod config_gen;
mod reset_password;
mod review;
mod stats;

pub use config_gen::config_generate;
pub use reset_password::reset_password;
pub use review::{approve_kyc, approve_survey, reject_kyc, reject_survey};
pub use stats::print_stats;
