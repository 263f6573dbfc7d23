//! RestApiClient - typed client for the BlockBuilders REST API.
//!
//! Every response is re-validated before it leaves this module; nothing
//! downstream trusts the shape of external JSON.

use async_trait::async_trait;
use blockbuilders_core::api::{AuthApi, AuthProfile, AuthSessionResponse, ConsentRequest};
use blockbuilders_core::error::OnboardingError;
use blockbuilders_core::validation::parse_validated;
use blockbuilders_core::workspace::StrategySeed;
use reqwest::{Client, Response, Url};
use serde_json::Value;
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the onboarding endpoints under `{API_BASE}`.
#[derive(Clone)]
pub struct RestApiClient {
    client: Client,
    base_url: Url,
    timeout: Duration,
}

impl RestApiClient {
    /// Creates a new client for the given API base URL.
    pub fn new(base_url: Url) -> Self {
        Self {
            client: Client::new(),
            base_url,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Sets the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Appends percent-encoded path segments to the base URL.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url, OnboardingError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| OnboardingError::transport("API base URL cannot carry a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn post(&self, url: Url, access_token: &str, body: Option<&ConsentRequest>) -> Result<Response, OnboardingError> {
        let mut request = self
            .client
            .post(url.clone())
            .bearer_auth(access_token)
            .header("Content-Type", "application/json")
            .timeout(self.timeout);

        if let Some(body) = body {
            request = request.json(body);
        }

        request.send().await.map_err(|e| {
            tracing::warn!("[ApiClient] POST {} failed: {}", url.path(), e);
            OnboardingError::transport(e.to_string())
        })
    }

    async fn read_json(response: Response, what: &str) -> Result<Value, String> {
        response
            .json::<Value>()
            .await
            .map_err(|e| format!("{} body is not JSON: {}", what, e))
    }

    async fn provision(&self, url: Url, access_token: &str, what: &str) -> Result<StrategySeed, OnboardingError> {
        let response = self.post(url, access_token, None).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(OnboardingError::provisioning(format!(
                "Failed to {}: {}",
                what,
                status.as_u16()
            )));
        }

        let body = Self::read_json(response, what)
            .await
            .map_err(OnboardingError::provisioning)?;
        seed_from_value(&body, what)
    }
}

/// Validates a provisioning response against the seed schema.
pub(crate) fn seed_from_value(body: &Value, what: &str) -> Result<StrategySeed, OnboardingError> {
    parse_validated::<StrategySeed>(body)
        .map_err(|e| OnboardingError::provisioning(format!("Invalid {} payload: {}", what, e.reason)))
}

/// Validates a `GET /auth/session` response.
pub(crate) fn profile_from_value(body: Value) -> Result<AuthProfile, OnboardingError> {
    let response: AuthSessionResponse = serde_json::from_value(body)
        .map_err(|e| OnboardingError::invalid_session(e.to_string()))?;
    AuthProfile::try_from(response).map_err(|e| OnboardingError::invalid_session(e.reason))
}

#[async_trait]
impl AuthApi for RestApiClient {
    async fn acknowledge_consent(&self, access_token: &str) -> Result<(), OnboardingError> {
        let url = self.endpoint(&["auth", "consent"])?;
        let body = ConsentRequest { acknowledged: true };

        let response = self.post(url, access_token, Some(&body)).await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::warn!(
                "[ApiClient] Consent persistence rejected ({}): {}",
                status,
                detail
            );
            return Err(OnboardingError::ConsentPersist {
                status: status.as_u16(),
            });
        }

        tracing::debug!("[ApiClient] Consent acknowledged");
        Ok(())
    }

    async fn fetch_auth_session(&self, access_token: &str) -> Result<AuthProfile, OnboardingError> {
        let url = self.endpoint(&["auth", "session"])?;

        let response = self
            .client
            .get(url)
            .bearer_auth(access_token)
            .header("Content-Type", "application/json")
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("[ApiClient] GET /auth/session failed: {}", e);
                OnboardingError::transport(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(OnboardingError::invalid_session(format!(
                "Failed to fetch session: {}",
                status.as_u16()
            )));
        }

        let body = Self::read_json(response, "session")
            .await
            .map_err(OnboardingError::invalid_session)?;
        profile_from_value(body)
    }

    async fn create_strategy(&self, access_token: &str) -> Result<StrategySeed, OnboardingError> {
        let url = self.endpoint(&["strategies"])?;
        self.provision(url, access_token, "create strategy").await
    }

    async fn create_strategy_version(
        &self,
        access_token: &str,
        strategy_id: &str,
    ) -> Result<StrategySeed, OnboardingError> {
        let url = self.endpoint(&["strategies", strategy_id, "versions"])?;
        self.provision(url, access_token, "seed strategy version").await
    }
}
