//! System-level modules
//!
//! - Logging initialization
//! - Panic hook (crash.log)

pub mod logging;
pub mod panic_handler;
