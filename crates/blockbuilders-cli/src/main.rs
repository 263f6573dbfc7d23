use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

mod commands;
mod services;

const LOG_ENV: &str = "BLOCKBUILDERS_LOG";

#[derive(Parser)]
#[command(name = "blockbuilders")]
#[command(about = "BlockBuilders CLI - consent-gated sign-in and demo workspace onboarding", long_about = None)]
struct Cli {
    /// Path to config.toml (defaults to BLOCKBUILDERS_CONFIG, then the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in (or sign up) with email and password, then onboard
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// Create an account instead of signing in
        #[arg(long)]
        signup: bool,
        /// Acknowledge the simulation-only policy
        #[arg(long)]
        accept_simulation_policy: bool,
        /// Post-login destination
        #[arg(long)]
        next: Option<String>,
    },
    /// Start an OAuth sign-in and print the provider URL
    Oauth {
        /// Provider identifier (google, github)
        #[arg(long)]
        provider: String,
        #[arg(long)]
        accept_simulation_policy: bool,
        #[arg(long)]
        next: Option<String>,
    },
    /// Complete an OAuth sign-in from the provider's callback URL
    Callback {
        /// Full callback URL, e.g. http://localhost:3000/api/auth/callback?code=...
        url: String,
    },
    /// Sign out the session behind an access token
    Logout {
        #[arg(long)]
        token: String,
    },
    /// Evaluate the edge gate for a path and query
    Gate {
        /// Site-relative path, e.g. /dashboard?tab=runs
        path: String,
        /// Access token to present in the session cookie
        #[arg(long)]
        token: Option<String>,
    },
    /// Print the effective configuration
    Config,
}

fn init_tracing() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .with_env_var(LOG_ENV)
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Login {
            email,
            password,
            signup,
            accept_simulation_policy,
            next,
        } => {
            commands::login::run(
                cli.config,
                commands::login::LoginArgs {
                    email,
                    password,
                    signup,
                    consent: accept_simulation_policy,
                    next,
                },
            )
            .await?
        }
        Commands::Oauth {
            provider,
            accept_simulation_policy,
            next,
        } => commands::oauth::run(cli.config, &provider, accept_simulation_policy, next).await?,
        Commands::Callback { url } => commands::callback::run(cli.config, &url).await?,
        Commands::Logout { token } => commands::logout::run(cli.config, &token).await?,
        Commands::Gate { path, token } => commands::gate::run(cli.config, &path, token).await?,
        Commands::Config => commands::config::show(cli.config)?,
    }

    Ok(())
}
