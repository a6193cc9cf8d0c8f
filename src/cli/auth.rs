use std::sync::Arc;

use anyhow::anyhow;
use clap::Subcommand;

use crate::api::{ApiClient, ApiError, ApiErrorKind, ApiResult};

#[derive(Debug, Subcommand)]
pub enum AuthCommand {
    /// Log in and store the session token locally
    Login {
        #[arg(long)]
        username: String,
        /// Read from ALTAI_ADMIN_PASSWORD when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Drop the stored session
    Logout,
    /// Show the account behind the current session
    Me,
}

pub async fn run(client: &Arc<ApiClient>, command: AuthCommand) -> ApiResult<()> {
    match command {
        AuthCommand::Login { username, password } => {
            let password = match password {
                Some(password) => password,
                None => std::env::var("ALTAI_ADMIN_PASSWORD").map_err(|_| {
                    ApiError::new(
                        ApiErrorKind::Validation,
                        anyhow!("pass --password or set ALTAI_ADMIN_PASSWORD"),
                    )
                })?,
            };
            let session = client.login(&username, &password).await?;
            println!("Logged in, session valid until {}", session.expires_at);
        }
        AuthCommand::Logout => {
            client.logout()?;
            println!("Session dropped");
        }
        AuthCommand::Me => {
            let info = client.me().await?;
            println!("{} (id {})", info.username, info.id);
            println!("Active: {}", info.is_active);
            println!("Registered: {}", info.created_at);
            if let Some(last_login) = info.last_login {
                println!("Last login: {}", last_login);
            }
        }
    }
    Ok(())
}
