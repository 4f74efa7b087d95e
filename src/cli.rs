//! Command-line interface definitions using clap

use clap::{Parser, Subcommand};

/// RewardHub - review & survey rewards marketplace backend
#[derive(Parser, Debug)]
#[command(name = "rewardhub")]
#[command(version)]
#[command(about = "Review & survey rewards marketplace backend", long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, short = 'c', global = true, default_value = crate::config::DEFAULT_CONFIG_PATH)]
    pub config: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },

    /// Set a user's password
    ResetPassword {
        /// Account e-mail
        #[arg(long)]
        email: String,

        /// New password (not recommended, visible in shell history)
        #[arg(long, conflicts_with = "stdin")]
        password: Option<String>,

        /// Read password from stdin (for scripting)
        #[arg(long)]
        stdin: bool,
    },

    /// Print marketplace statistics
    Stats,

    /// Review survey submissions
    Survey {
        #[command(subcommand)]
        action: ReviewCommands,
    },

    /// Review KYC submissions (by user id)
    Kyc {
        #[command(subcommand)]
        action: ReviewCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Generate {
        /// Output path (default: config.example.toml)
        output_path: Option<String>,

        /// Force overwrite without confirmation
        #[arg(long)]
        force: bool,
    },
}

/// approve / reject，survey 与 kyc 共用
#[derive(Subcommand, Debug)]
pub enum ReviewCommands {
    Approve {
        id: i64,
    },
    Reject {
        id: i64,

        #[arg(long)]
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["rewardhub"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.config, "config.toml");
    }

    #[test]
    fn test_parse_review_reject() {
        let cli =
            Cli::try_parse_from(["rewardhub", "survey", "reject", "12", "--reason", "blurry"])
                .unwrap();
        match cli.command {
            Some(Commands::Survey {
                action: ReviewCommands::Reject { id, reason },
            }) => {
                assert_eq!(id, 12);
                assert_eq!(reason, "blurry");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_reset_password_flags_conflict() {
        let result = Cli::try_parse_from([
            "rewardhub",
            "reset-password",
            "--email",
            "a@b.co",
            "--password",
            "x",
            "--stdin",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_config_flag() {
        let cli = Cli::try_parse_from(["rewardhub", "stats", "--config", "/etc/rh.toml"]).unwrap();
        assert_eq!(cli.config, "/etc/rh.toml");
        assert!(matches!(cli.command, Some(Commands::Stats)));
    }
}
