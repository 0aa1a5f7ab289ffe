//! CLI entry point for the Herizon session client.

pub mod auth;

use clap::{Parser, Subcommand};

/// Herizon session CLI
#[derive(Parser, Debug)]
#[command(name = "herizon", version, about = "Herizon session and login tooling")]
pub struct Cli {
    /// Override the API base URL
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Session management
    Auth(AuthArgs),
}

/// Arguments for the `auth` subcommand group.
#[derive(Parser, Debug)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommands,
}

/// Auth subcommands.
#[derive(Subcommand, Debug)]
pub enum AuthCommands {
    /// Exchange a platform login code for a session
    Login(LoginArgs),
    /// Show the locally stored session
    Status,
    /// Validate the stored session against the server, refreshing if due
    Check,
    /// Replace the stored token with a fresh one
    Refresh,
    /// Remove the local session
    Logout,
    /// Show the server's platform-login configuration status
    ConfigStatus,
}

/// Arguments for `herizon auth login`.
#[derive(Parser, Debug)]
pub struct LoginArgs {
    /// One-time login code issued by the platform
    #[arg(long)]
    pub code: String,

    #[arg(long)]
    pub nickname: Option<String>,

    #[arg(long)]
    pub avatar: Option<String>,
}

impl Cli {
    /// Parse CLI arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parse_auth_login_with_code() {
        let cli = Cli::try_parse_from(["herizon", "auth", "login", "--code", "081abc"]).unwrap();
        match cli.command {
            Commands::Auth(auth) => match auth.command {
                AuthCommands::Login(args) => {
                    assert_eq!(args.code, "081abc");
                    assert!(args.nickname.is_none());
                }
                other => panic!("expected Login, got {other:?}"),
            },
        }
    }

    #[test]
    fn parse_auth_config_status_with_base_url() {
        let cli = Cli::try_parse_from([
            "herizon",
            "auth",
            "config-status",
            "--base-url",
            "https://api.test/api",
        ])
        .unwrap();
        assert_eq!(cli.base_url.as_deref(), Some("https://api.test/api"));
        let Commands::Auth(auth) = cli.command;
        assert!(matches!(auth.command, AuthCommands::ConfigStatus));
    }

    #[test]
    fn parse_missing_subcommand_is_error() {
        assert!(Cli::try_parse_from(["herizon"]).is_err());
    }

    #[test]
    fn parse_auth_login_missing_code_is_error() {
        assert!(Cli::try_parse_from(["herizon", "auth", "login"]).is_err());
    }
}
