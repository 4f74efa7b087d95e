//! CLI interface module
//!
//! 运维命令直接连接数据库执行，不经过 HTTP。

pub mod commands;

use std::fmt;
use std::sync::Arc;

use crate::api::AppState;
use crate::cli::{Commands, ConfigCommands, ReviewCommands};
use crate::config::get_config;
use crate::storage::StorageFactory;

#[derive(Debug)]
pub enum CliError {
    StorageError(String),
    InputError(String),
    CommandError(String),
}

impl CliError {
    pub fn format_simple(&self) -> String {
        match self {
            CliError::StorageError(msg) => format!("Storage error: {}", msg),
            CliError::InputError(msg) => format!("Input error: {}", msg),
            CliError::CommandError(msg) => format!("Command error: {}", msg),
        }
    }

    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        match self {
            CliError::StorageError(msg) => {
                format!("{} {}", "Storage error:".red().bold(), msg.white())
            }
            CliError::InputError(msg) => {
                format!("{} {}", "Input error:".yellow().bold(), msg.white())
            }
            CliError::CommandError(msg) => {
                format!("{} {}", "Command error:".red().bold(), msg.white())
            }
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for CliError {}

impl From<crate::errors::RewardHubError> for CliError {
    fn from(err: crate::errors::RewardHubError) -> Self {
        if err.is_internal() {
            CliError::StorageError(err.format_simple())
        } else {
            CliError::CommandError(err.format_simple())
        }
    }
}

/// 连接数据库并组装与 HTTP 服务相同的业务层
async fn open_state() -> Result<AppState, CliError> {
    let storage = StorageFactory::create()
        .await
        .map_err(|e| CliError::StorageError(e.to_string()))?;
    Ok(AppState::new(Arc::clone(&storage), &get_config()))
}

/// Run a CLI command from clap-parsed input
///
/// `Serve` 由 main 处理，不会进入这里。
pub async fn run_cli_command(cmd: Commands) -> Result<(), CliError> {
    // config generate 不需要数据库
    if let Commands::Config {
        action: ConfigCommands::Generate { output_path, force },
    } = cmd
    {
        return commands::config_generate(output_path, force).await;
    }

    let state = open_state().await?;
    let result = match cmd {
        Commands::ResetPassword {
            email,
            password,
            stdin,
        } => commands::reset_password(&state, &email, password, stdin).await,
        Commands::Stats => commands::print_stats(&state).await,
        Commands::Survey { action } => match action {
            ReviewCommands::Approve { id } => commands::approve_survey(&state, id).await,
            ReviewCommands::Reject { id, reason } => {
                commands::reject_survey(&state, id, &reason).await
            }
        },
        Commands::Kyc { action } => match action {
            ReviewCommands::Approve { id } => commands::approve_kyc(&state, id).await,
            ReviewCommands::Reject { id, reason } => {
                commands::reject_kyc(&state, id, &reason).await
            }
        },
        Commands::Serve | Commands::Config { .. } => {
            Err(CliError::CommandError("Unexpected command".to_string()))
        }
    };

    if let Err(e) = state.storage.close().await {
        tracing::warn!("Failed to close database: {}", e);
    }
    result
}
