//! Herizon CLI binary entry point.

use clap::Parser;
use herizon_session::cli::{AuthCommands, Cli, Commands};
use herizon_session::config::ClientConfig;
use herizon_session::error::HerizonError;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_env("HERIZON_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e.user_message());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), HerizonError> {
    let mut config = ClientConfig::load()?;
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }

    match cli.command {
        Commands::Auth(auth_args) => match auth_args.command {
            AuthCommands::Login(args) => herizon_session::cli::auth::handle_login(&config, args).await,
            AuthCommands::Status => herizon_session::cli::auth::handle_status(&config).await,
            AuthCommands::Check => herizon_session::cli::auth::handle_check(&config).await,
            AuthCommands::Refresh => herizon_session::cli::auth::handle_refresh(&config).await,
            AuthCommands::Logout => herizon_session::cli::auth::handle_logout(&config).await,
            AuthCommands::ConfigStatus => herizon_session::cli::auth::handle_config_status(&config).await,
        },
    }
}
