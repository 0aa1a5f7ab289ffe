//! CLI auth command handlers.

use crate::api::ApiClient;
use crate::auth::{Credential, HostCapabilities, HttpAuthClient, ProfileHints, SessionManager, SessionState};
use crate::config::ClientConfig;
use crate::error::HerizonError;

use super::LoginArgs;

fn manager(config: &ClientConfig) -> Result<SessionManager, HerizonError> {
    SessionManager::from_config(config, HostCapabilities::Browser)
}

/// Handle `herizon auth login --code <code>`.
pub async fn handle_login(config: &ClientConfig, args: LoginArgs) -> Result<(), HerizonError> {
    let manager = manager(config)?;
    let credential = Credential::new(args.code).with_hints(ProfileHints {
        nickname: args.nickname,
        avatar: args.avatar,
    });

    let result = manager.login(credential).await?;
    let profile = &result.session.profile;
    println!(
        "Logged in as {} ({})",
        profile.display_name().unwrap_or("unnamed user"),
        result.session.role().description()
    );
    if result.is_new_user {
        println!("New account created.");
    }
    Ok(())
}

/// Handle `herizon auth status`.
pub async fn handle_status(config: &ClientConfig) -> Result<(), HerizonError> {
    let manager = manager(config)?;
    match manager.state() {
        SessionState::LoggedOut => println!("Not logged in"),
        SessionState::LoggedIn(session) => {
            let info = manager.display_info();
            println!("Logged in: {} ({})", info.nickname, info.role_desc);
            match session.expires_at {
                Some(expires_at) if expires_at > chrono::Utc::now() => {
                    println!("Token expires {}", expires_at.format("%Y-%m-%d %H:%M"))
                }
                Some(_) => println!("Token expired; run `herizon auth check` to refresh"),
                None => println!("Token expiry unknown"),
            }
        }
    }
    Ok(())
}

/// Handle `herizon auth check`.
pub async fn handle_check(config: &ClientConfig) -> Result<(), HerizonError> {
    let profile = manager(config)?.check_status().await?;
    println!(
        "Session valid: {} ({})",
        profile.display_name().unwrap_or("unnamed user"),
        profile.role.description()
    );
    Ok(())
}

/// Handle `herizon auth refresh`.
pub async fn handle_refresh(config: &ClientConfig) -> Result<(), HerizonError> {
    let session = manager(config)?.refresh().await?;
    match session.expires_at {
        Some(expires_at) => println!("Token refreshed, expires {}", expires_at.format("%Y-%m-%d %H:%M")),
        None => println!("Token refreshed"),
    }
    Ok(())
}

/// Handle `herizon auth logout`.
pub async fn handle_logout(config: &ClientConfig) -> Result<(), HerizonError> {
    manager(config)?.logout();
    println!("Logged out");
    Ok(())
}

/// Handle `herizon auth config-status`.
pub async fn handle_config_status(config: &ClientConfig) -> Result<(), HerizonError> {
    let client = HttpAuthClient::new(ApiClient::new(config)?);
    println!("{}", client.config_status().await?);
    Ok(())
}
