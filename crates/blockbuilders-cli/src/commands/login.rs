use anyhow::Result;
use blockbuilders_application::{AuthMode, LoginOutcome};
use std::path::PathBuf;

use crate::services::{Services, load_config};

pub struct LoginArgs {
    pub email: String,
    pub password: String,
    pub signup: bool,
    pub consent: bool,
    pub next: Option<String>,
}

pub async fn run(config_path: Option<PathBuf>, args: LoginArgs) -> Result<()> {
    let services = Services::new(load_config(config_path)?)?;
    let controller = services.login_controller(args.next.as_deref())?;

    controller.set_mode(if args.signup {
        AuthMode::SignUp
    } else {
        AuthMode::SignIn
    });
    controller.set_email(args.email);
    controller.set_password(args.password);
    controller.set_consent(args.consent);

    println!("🔐 {}...", controller.view().action_label);
    let outcome = controller.submit().await;
    let state = controller.state();

    match outcome {
        LoginOutcome::Navigated(_) => {
            let workspace = services.store.snapshot();
            if let Some(seed) = workspace.seed() {
                println!(
                    "✅ Workspace ready: {} ({}), {} blocks, {} edges",
                    seed.name,
                    seed.version_label,
                    workspace.nodes().len(),
                    workspace.edges().len()
                );
                for callout in seed.ordered_callouts() {
                    println!("  💡 {}: {}", callout.title, callout.description);
                }
            }
        }
        LoginOutcome::VerificationPending => {
            if let Some(status) = state.status_message {
                println!("📧 {}", status);
            }
        }
        LoginOutcome::Busy | LoginOutcome::Redirecting => {}
        LoginOutcome::ConsentMissing | LoginOutcome::Failed => {
            let message = state.error.unwrap_or_default();
            anyhow::bail!("{}", message);
        }
    }

    Ok(())
}
