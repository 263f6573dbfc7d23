use anyhow::Result;
use blockbuilders_application::LoginOutcome;
use blockbuilders_core::gateway::OAuthProvider;
use std::path::PathBuf;

use crate::services::{Services, load_config};

pub async fn run(
    config_path: Option<PathBuf>,
    provider: &str,
    consent: bool,
    next: Option<String>,
) -> Result<()> {
    let Some(provider) = OAuthProvider::parse(provider) else {
        let known: Vec<_> = OAuthProvider::ALL.iter().map(|p| p.as_str()).collect();
        anyhow::bail!("Unknown provider '{}'. Expected one of: {}", provider, known.join(", "));
    };

    let services = Services::new(load_config(config_path)?)?;
    let controller = services.login_controller(next.as_deref())?;
    controller.set_consent(consent);

    match controller.oauth_sign_in(provider).await {
        LoginOutcome::ConsentMissing | LoginOutcome::Failed => {
            let message = controller.state().error.unwrap_or_default();
            anyhow::bail!("{}", message);
        }
        LoginOutcome::Redirecting => {
            println!("After approving, run: blockbuilders callback '<redirected URL>'");
            Ok(())
        }
        _ => Ok(()),
    }
}
