use clap::Parser;
use rewardhub::cli::{Cli, Commands};
use rewardhub::config::{LoggingConfig, get_config, init_config_from};
use rewardhub::runtime::modes;
use rewardhub::system::logging::init_logging;
use rewardhub::system::panic_handler::{RunMode, install_panic_hook};

#[actix_web::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_config_from(&cli.config);
    let config = get_config();

    match cli.command {
        None | Some(Commands::Serve) => {
            install_panic_hook(RunMode::Server);
            let _guard = match init_logging(&config.logging) {
                Ok(guard) => guard,
                Err(e) => {
                    eprintln!("{}", e.format_colored());
                    std::process::exit(1);
                }
            };

            if let Err(e) = modes::run_server(&config).await {
                tracing::error!("Server exited with error: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(cmd) => {
            install_panic_hook(RunMode::Cli);
            // CLI 只输出警告以上级别，避免干扰命令结果
            let quiet = LoggingConfig {
                level: "warn".to_string(),
                file: None,
                ..config.logging.clone()
            };
            let _guard = init_logging(&quiet).ok();

            if let Err(e) = modes::run_cli(cmd).await {
                eprintln!("{}", e.format_colored());
                std::process::exit(1);
            }
        }
    }
}
