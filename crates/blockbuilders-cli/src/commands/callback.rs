use anyhow::{Context, Result};
use blockbuilders_application::OAuthCallbackHandler;
use blockbuilders_core::Url;
use blockbuilders_core::gateway::SessionGateway;
use std::path::PathBuf;

use crate::services::{Services, load_config};

/// Completes an OAuth sign-in from the callback URL the provider redirected to.
pub async fn run(config_path: Option<PathBuf>, callback_url: &str) -> Result<()> {
    let url = Url::parse(callback_url)
        .with_context(|| format!("Invalid callback URL: {}", callback_url))?;

    let services = Services::new(load_config(config_path)?)?;
    let handler = OAuthCallbackHandler::new(services.gateway.clone(), services.api.clone());
    let outcome = handler.handle(&url).await;

    match services.gateway.get_current_session().await {
        Some(session) => println!(
            "✅ Signed in as {}",
            session.user.email.as_deref().unwrap_or(&session.user.id)
        ),
        None => println!("⚠️  No session was established"),
    }
    println!("↪ {} {}", outcome.status, outcome.location);
    Ok(())
}
