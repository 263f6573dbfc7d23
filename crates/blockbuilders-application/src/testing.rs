//! Hand-written doubles shared by the unit tests of this crate.

use async_trait::async_trait;
use blockbuilders_core::Url;
use blockbuilders_core::api::{AuthApi, AuthProfile};
use blockbuilders_core::consent::{AppMetadata, SimulationConsent};
use blockbuilders_core::error::{AuthError, OnboardingError, Result};
use blockbuilders_core::gateway::{Navigator, OAuthProvider, SessionGateway};
use blockbuilders_core::session::{Session, SessionUser};
use blockbuilders_core::workspace::StrategySeed;
use serde_json::json;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use crate::onboarding::{OnboardingRequest, OnboardingService};

pub fn seed(strategy_id: &str, version_id: &str) -> StrategySeed {
    StrategySeed {
        strategy_id: strategy_id.to_string(),
        name: "Quickstart Momentum".to_string(),
        version_id: version_id.to_string(),
        version_label: "v1".to_string(),
        blocks: Vec::new(),
        edges: Vec::new(),
        callouts: Vec::new(),
    }
}

pub fn session(token: &str, acknowledged: bool) -> Session {
    let app_metadata = if acknowledged {
        json!({
            "consents": {
                "simulationOnly": {
                    "acknowledged": true,
                    "acknowledgedAt": "2024-05-01T12:00:00Z"
                }
            }
        })
    } else {
        json!({})
    };
    Session::new(
        token,
        SessionUser {
            id: "user-1".to_string(),
            email: Some("demo@blockbuilders.tech".to_string()),
            app_metadata,
        },
    )
}

/// Scripted gateway recording every call as a short string.
pub struct MockGateway {
    pub calls: Mutex<Vec<String>>,
    pub sign_in: Mutex<std::result::Result<Session, AuthError>>,
    pub sign_up: Mutex<std::result::Result<Option<Session>, AuthError>>,
    pub oauth: Mutex<std::result::Result<(), AuthError>>,
    pub exchange: Mutex<std::result::Result<Session, AuthError>>,
    pub current: Mutex<Option<Session>>,
    pub redirect_urls: Mutex<Vec<(OAuthProvider, Url)>>,
    /// When set, sign-in waits for a notification before answering.
    pub hold: Option<Arc<Notify>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            sign_in: Mutex::new(Ok(session("tok", false))),
            sign_up: Mutex::new(Ok(Some(session("tok", false)))),
            oauth: Mutex::new(Ok(())),
            exchange: Mutex::new(Ok(session("oauth-tok", false))),
            current: Mutex::new(None),
            redirect_urls: Mutex::new(Vec::new()),
            hold: None,
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }
}

#[async_trait]
impl SessionGateway for MockGateway {
    async fn sign_in_with_password(
        &self,
        email: &str,
        _password: &str,
    ) -> std::result::Result<Session, AuthError> {
        self.record(format!("sign_in:{}", email));
        if let Some(hold) = &self.hold {
            hold.notified().await;
        }
        self.sign_in.lock().unwrap().clone()
    }

    async fn sign_up_with_password(
        &self,
        email: &str,
        _password: &str,
        redirect_origin: &Url,
    ) -> std::result::Result<Option<Session>, AuthError> {
        self.record(format!("sign_up:{}:{}", email, redirect_origin));
        self.sign_up.lock().unwrap().clone()
    }

    async fn begin_oauth_redirect(
        &self,
        provider: OAuthProvider,
        redirect_url: &Url,
    ) -> std::result::Result<(), AuthError> {
        self.record(format!("oauth:{}", provider));
        self.redirect_urls
            .lock()
            .unwrap()
            .push((provider, redirect_url.clone()));
        self.oauth.lock().unwrap().clone()
    }

    async fn exchange_code_for_session(
        &self,
        code: &str,
    ) -> std::result::Result<Session, AuthError> {
        self.record(format!("exchange:{}", code));
        self.exchange.lock().unwrap().clone()
    }

    async fn get_current_session(&self) -> Option<Session> {
        self.current.lock().unwrap().clone()
    }

    async fn sign_out(&self) {
        self.record("sign_out");
    }
}

/// Onboarding double returning a fixed outcome.
pub struct MockOnboarding {
    pub requests: Mutex<Vec<OnboardingRequest>>,
    pub outcome: Mutex<Result<StrategySeed>>,
}

impl MockOnboarding {
    pub fn succeeding(seed: StrategySeed) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            outcome: Mutex::new(Ok(seed)),
        }
    }

    pub fn failing(error: OnboardingError) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            outcome: Mutex::new(Err(error)),
        }
    }

    pub fn requests(&self) -> Vec<OnboardingRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl OnboardingService for MockOnboarding {
    async fn complete_onboarding(&self, request: OnboardingRequest) -> Result<StrategySeed> {
        self.requests.lock().unwrap().push(request);
        self.outcome.lock().unwrap().clone()
    }
}

/// Consent API double for the callback handler.
#[derive(Default)]
pub struct MockConsentApi {
    pub acknowledged_tokens: Mutex<Vec<String>>,
    pub consent_status: Option<u16>,
}

#[async_trait]
impl AuthApi for MockConsentApi {
    async fn acknowledge_consent(&self, access_token: &str) -> Result<()> {
        self.acknowledged_tokens
            .lock()
            .unwrap()
            .push(access_token.to_string());
        match self.consent_status {
            Some(status) => Err(OnboardingError::ConsentPersist { status }),
            None => Ok(()),
        }
    }

    async fn fetch_auth_session(&self, _access_token: &str) -> Result<AuthProfile> {
        Ok(AuthProfile {
            id: "user-1".to_string(),
            email: "demo@blockbuilders.tech".to_string(),
            app_metadata: AppMetadata::with_consent(SimulationConsent::acknowledged_now()),
        })
    }

    async fn create_strategy(&self, _access_token: &str) -> Result<StrategySeed> {
        Ok(seed("strategy-1", "draft"))
    }

    async fn create_strategy_version(
        &self,
        _access_token: &str,
        strategy_id: &str,
    ) -> Result<StrategySeed> {
        Ok(seed(strategy_id, "v1"))
    }
}

#[derive(Default)]
pub struct RecordingNavigator {
    pub pushes: Mutex<Vec<String>>,
    pub redirects: Mutex<Vec<Url>>,
}

impl RecordingNavigator {
    pub fn pushes(&self) -> Vec<String> {
        self.pushes.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn push(&self, path: &str) {
        self.pushes.lock().unwrap().push(path.to_string());
    }

    fn redirect(&self, url: &Url) {
        self.redirects.lock().unwrap().push(url.clone());
    }
}
