//! Mode routing
//!
//! - Server mode (HTTP server)
//! - CLI mode (operator commands)

pub mod cli;
pub mod server;

pub use cli::run_cli;
pub use server::{configure_app, run_server};
