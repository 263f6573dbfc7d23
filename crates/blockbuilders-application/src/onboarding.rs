//! Onboarding use case: consent acknowledgement, server-side consent
//! assertion and demo workspace provisioning.

use async_trait::async_trait;
use blockbuilders_core::api::AuthApi;
use blockbuilders_core::error::{OnboardingError, Result};
use blockbuilders_core::gateway::SessionGateway;
use blockbuilders_core::workspace::StrategySeed;
use std::sync::Arc;

/// Parameters of a single onboarding attempt.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct OnboardingRequest {
    /// Persist consent before checking it.
    pub acknowledge_consent: bool,
    /// Token to use; the active session's token when `None`.
    pub access_token: Option<String>,
}

impl OnboardingRequest {
    pub fn acknowledging(access_token: Option<String>) -> Self {
        Self {
            acknowledge_consent: true,
            access_token,
        }
    }
}

impl std::fmt::Debug for OnboardingRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnboardingRequest")
            .field("acknowledge_consent", &self.acknowledge_consent)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Completes onboarding and yields the seeded workspace.
#[async_trait]
pub trait OnboardingService: Send + Sync {
    async fn complete_onboarding(&self, request: OnboardingRequest) -> Result<StrategySeed>;
}

/// Sequences the onboarding calls, short-circuiting on the first failure.
///
/// Does not touch the workspace store; the caller loads the returned seed.
pub struct OnboardingOrchestrator {
    api: Arc<dyn AuthApi>,
    gateway: Arc<dyn SessionGateway>,
}

impl OnboardingOrchestrator {
    pub fn new(api: Arc<dyn AuthApi>, gateway: Arc<dyn SessionGateway>) -> Self {
        Self { api, gateway }
    }

    async fn resolve_token(&self, supplied: Option<String>) -> Result<String> {
        if let Some(token) = supplied.filter(|t| !t.is_empty()) {
            return Ok(token);
        }
        self.gateway
            .get_access_token()
            .await
            .filter(|t| !t.is_empty())
            .ok_or(OnboardingError::TokenUnavailable)
    }

    async fn run(&self, request: OnboardingRequest) -> Result<StrategySeed> {
        let token = self.resolve_token(request.access_token).await?;

        if request.acknowledge_consent {
            self.api.acknowledge_consent(&token).await?;
        }

        // The server is authoritative, even right after acknowledging.
        let profile = self.api.fetch_auth_session(&token).await?;
        if !profile.app_metadata.is_acknowledged() {
            return Err(OnboardingError::ConsentRequired);
        }

        let strategy = self.api.create_strategy(&token).await?;
        let seed = self
            .api
            .create_strategy_version(&token, &strategy.strategy_id)
            .await?;

        tracing::info!(
            "[Onboarding] Provisioned strategy {} version {} for user {}",
            seed.strategy_id,
            seed.version_id,
            profile.id
        );
        Ok(seed)
    }
}

#[async_trait]
impl OnboardingService for OnboardingOrchestrator {
    async fn complete_onboarding(&self, request: OnboardingRequest) -> Result<StrategySeed> {
        self.run(request).await.inspect_err(|err| match err {
            OnboardingError::ConsentRequired => {
                tracing::warn!("[Onboarding] Server reports consent not acknowledged")
            }
            other => tracing::error!("[Onboarding] Onboarding failed: {}", other),
        })
    }
}
