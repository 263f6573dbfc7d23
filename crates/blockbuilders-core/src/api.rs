//! Contract of the BlockBuilders REST API consumed during onboarding.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::consent::AppMetadata;
use crate::error::{OnboardingError, ValidationError};
use crate::validation::Validate;
use crate::workspace::StrategySeed;

/// Body of `POST /auth/consent`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsentRequest {
    pub acknowledged: bool,
}

/// Raw `GET /auth/session` payload before metadata validation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSessionResponse {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub app_metadata: Value,
}

/// Server's view of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthProfile {
    pub id: String,
    pub email: String,
    pub app_metadata: AppMetadata,
}

impl TryFrom<AuthSessionResponse> for AuthProfile {
    type Error = ValidationError;

    fn try_from(response: AuthSessionResponse) -> Result<Self, Self::Error> {
        if !response.email.contains('@') {
            return Err(ValidationError::new("email is not an address"));
        }
        let app_metadata = AppMetadata::parse(&response.app_metadata)?;
        Ok(Self {
            id: response.id,
            email: response.email,
            app_metadata,
        })
    }
}

impl Validate for AuthProfile {
    fn validate(&self) -> Result<(), ValidationError> {
        self.app_metadata.validate()
    }
}

/// Remote endpoints used by the onboarding orchestrator.
///
/// Every call is authorized with the user's bearer token. Implementations
/// validate responses before returning them.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// `POST {API_BASE}/auth/consent`
    async fn acknowledge_consent(&self, access_token: &str) -> Result<(), OnboardingError>;

    /// `GET {API_BASE}/auth/session`
    async fn fetch_auth_session(&self, access_token: &str) -> Result<AuthProfile, OnboardingError>;

    /// `POST {API_BASE}/strategies`
    async fn create_strategy(&self, access_token: &str) -> Result<StrategySeed, OnboardingError>;

    /// `POST {API_BASE}/strategies/{strategy_id}/versions`
    async fn create_strategy_version(
        &self,
        access_token: &str,
        strategy_id: &str,
    ) -> Result<StrategySeed, OnboardingError>;
}
