use anyhow::Result;
use std::path::PathBuf;

use crate::services::{Services, load_config};

/// Revokes the session behind `token` and clears local workspace state.
pub async fn run(config_path: Option<PathBuf>, token: &str) -> Result<()> {
    let services = Services::new(load_config(config_path)?)?;

    let Some(session) = services.gateway.user_for_token(token).await? else {
        println!("Token is not active; nothing to sign out");
        return Ok(());
    };
    services.gateway.restore_session(session).await;

    services.login_controller(None)?.sign_out().await;
    println!("✅ Signed out");
    Ok(())
}
