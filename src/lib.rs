//! RewardHub - review & survey rewards marketplace backend
//!
//! Users complete review/survey tasks posted by companies, earn rewards
//! into an append-only wallet ledger and withdraw once KYC is approved.
//!
//! # Architecture
//! - `storage`: SeaORM data-access layer (SQLite / MySQL / PostgreSQL)
//! - `services`: Business rules on top of storage
//! - `api`: HTTP handlers, middleware, JWT
//! - `interfaces`: Operator CLI
//! - `config`: Configuration management
//! - `runtime`: Application lifecycle and execution modes
//! - `system`: Logging and panic handling

pub mod api;
pub mod cli;
pub mod config;
pub mod errors;
pub mod interfaces;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod system;
pub mod utils;
