//! Wires configuration into concrete gateways and use cases.

use anyhow::{Context, Result};
use blockbuilders_application::{
    LoginController, LoginDependencies, LoginEnvironment, OnboardingOrchestrator, WorkspaceStore,
};
use blockbuilders_core::Url;
use blockbuilders_core::config::AppConfig;
use blockbuilders_core::gateway::Navigator;
use blockbuilders_core::routes::{LoginQuery, resolve_next};
use blockbuilders_infrastructure::paths::BlockbuildersPaths;
use blockbuilders_infrastructure::{ConfigService, RestApiClient, SupabaseSessionGateway};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Prints navigation instead of moving a browser.
pub struct ConsoleNavigator;

impl Navigator for ConsoleNavigator {
    fn push(&self, path: &str) {
        println!("→ Navigate to {}", path);
    }

    fn redirect(&self, url: &Url) {
        println!("→ Open in your browser:\n  {}", url);
    }
}

pub fn load_config(path: Option<PathBuf>) -> Result<AppConfig> {
    let service = match path {
        Some(path) => ConfigService::new(Some(path)),
        None => ConfigService::from_env(),
    };
    service.get_config()
}

pub struct Services {
    pub config: AppConfig,
    pub gateway: Arc<SupabaseSessionGateway>,
    pub api: Arc<RestApiClient>,
    pub store: WorkspaceStore,
}

impl Services {
    pub fn new(config: AppConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.request_timeout_secs);
        let auth_url = config.auth_url().context("Invalid auth provider URL")?;
        let api_base = config.api_base().context("Invalid API base URL")?;
        tracing::debug!("[Cli] API base {}, auth provider {}", api_base, auth_url);

        let mut gateway = SupabaseSessionGateway::new(
            auth_url,
            config.auth.anon_key.clone(),
            Arc::new(ConsoleNavigator),
        )
        .with_timeout(timeout)
        .with_cookie_name(config.cookie.name.clone());
        // `oauth` and `callback` run as separate processes.
        match BlockbuildersPaths::oauth_verifier_file() {
            Ok(path) => gateway = gateway.with_verifier_file(path),
            Err(err) => tracing::warn!("[Cli] OAuth verifier cannot be persisted: {}", err),
        }
        let api = RestApiClient::new(api_base).with_timeout(timeout);

        Ok(Self {
            config,
            gateway: Arc::new(gateway),
            api: Arc::new(api),
            store: WorkspaceStore::new(),
        })
    }

    pub fn login_controller(&self, next: Option<&str>) -> Result<LoginController> {
        let onboarding = OnboardingOrchestrator::new(self.api.clone(), self.gateway.clone());
        let query = LoginQuery {
            next: resolve_next(next),
            consent_error: false,
        };
        let env = LoginEnvironment {
            app_origin: self.config.app_origin().context("Invalid app origin")?,
            auth_redirect_base: Some(
                self.config
                    .auth_redirect_base()
                    .context("Invalid auth redirect base")?,
            ),
        };

        Ok(LoginController::new(
            LoginDependencies {
                gateway: self.gateway.clone(),
                onboarding: Arc::new(onboarding),
                store: self.store.clone(),
                navigator: Arc::new(ConsoleNavigator),
            },
            query,
            env,
        ))
    }
}
