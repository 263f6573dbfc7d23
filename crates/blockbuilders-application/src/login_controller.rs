//! Consent-aware login controller.
//!
//! Holds the login form state and drives the two entry actions: password
//! submit and OAuth sign-in. Both pass the same consent checkpoint before
//! any network call, and `pending` serializes them.

use blockbuilders_core::Url;
use blockbuilders_core::gateway::{Navigator, OAuthProvider, SessionGateway};
use blockbuilders_core::routes::{ConsentIntent, LOGIN_ROUTE, LoginQuery};
use std::sync::{Arc, Mutex, PoisonError};

use crate::onboarding::{OnboardingRequest, OnboardingService};
use crate::workspace_store::WorkspaceStore;

pub const CONSENT_REQUIRED_MESSAGE: &str =
    "You must acknowledge the simulation-only policy before continuing.";
pub const VERIFY_EMAIL_MESSAGE: &str =
    "Account created. Check your email to verify your address, then sign in to continue.";
pub const CONSENT_NOTICE: &str =
    "You must acknowledge the simulation-only policy before accessing the platform.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    #[default]
    SignIn,
    SignUp,
}

impl AuthMode {
    pub fn action_label(&self) -> &'static str {
        match self {
            AuthMode::SignIn => "Sign In",
            AuthMode::SignUp => "Create Account",
        }
    }
}

/// Form state. Transient; dropped with the controller.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct LoginState {
    pub mode: AuthMode,
    pub email: String,
    pub password: String,
    pub consent: bool,
    pub error: Option<String>,
    pub status_message: Option<String>,
    /// An auth or onboarding call is in flight
    pub pending: bool,
}

impl std::fmt::Debug for LoginState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginState")
            .field("mode", &self.mode)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("consent", &self.consent)
            .field("error", &self.error)
            .field("status_message", &self.status_message)
            .field("pending", &self.pending)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthButton {
    pub provider: OAuthProvider,
    pub label: &'static str,
    pub disabled: bool,
}

/// Everything the login surface renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginView {
    pub mode: AuthMode,
    pub email: String,
    pub consent: bool,
    pub error: Option<String>,
    pub status_message: Option<String>,
    pub pending: bool,
    pub action_label: &'static str,
    pub consent_notice: Option<&'static str>,
    pub submit_disabled: bool,
    pub oauth_providers: Vec<OAuthButton>,
}

/// What an entry action ended with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Another action was already in flight; nothing happened.
    Busy,
    /// Consent was not acknowledged; no network call was made.
    ConsentMissing,
    /// The action failed; `error` holds the user-facing message.
    Failed,
    /// Sign-up succeeded but the email must be verified first.
    VerificationPending,
    /// Onboarding completed and the user was sent to this path.
    Navigated(String),
    /// The user agent is on its way to the provider's consent screen.
    Redirecting,
}

/// Origins the controller needs to build redirect URLs.
#[derive(Debug, Clone)]
pub struct LoginEnvironment {
    /// Origin of the login page (email verification links return here)
    pub app_origin: Url,
    /// Base for the OAuth callback; `app_origin` when `None`
    pub auth_redirect_base: Option<Url>,
}

/// Collaborators of the controller.
#[derive(Clone)]
pub struct LoginDependencies {
    pub gateway: Arc<dyn SessionGateway>,
    pub onboarding: Arc<dyn OnboardingService>,
    pub store: WorkspaceStore,
    pub navigator: Arc<dyn Navigator>,
}

pub struct LoginController {
    state: Arc<Mutex<LoginState>>,
    deps: LoginDependencies,
    query: LoginQuery,
    env: LoginEnvironment,
}

/// Clears `pending` when an action ends, including when its future is dropped.
struct PendingGuard {
    state: Arc<Mutex<LoginState>>,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.pending = false;
    }
}

impl LoginController {
    pub fn new(deps: LoginDependencies, query: LoginQuery, env: LoginEnvironment) -> Self {
        Self {
            state: Arc::new(Mutex::new(LoginState::default())),
            deps,
            query,
            env,
        }
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut LoginState) -> R) -> R {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    pub fn state(&self) -> LoginState {
        self.with_state(|state| state.clone())
    }

    /// Resolved post-auth redirect target.
    pub fn next_path(&self) -> &str {
        &self.query.next
    }

    pub fn view(&self) -> LoginView {
        let state = self.state();
        let disabled = state.pending || !state.consent;
        LoginView {
            mode: state.mode,
            email: state.email,
            consent: state.consent,
            error: state.error,
            status_message: state.status_message,
            pending: state.pending,
            action_label: state.mode.action_label(),
            consent_notice: self.query.consent_error.then_some(CONSENT_NOTICE),
            submit_disabled: disabled,
            oauth_providers: OAuthProvider::ALL
                .into_iter()
                .map(|provider| OAuthButton {
                    provider,
                    label: provider.label(),
                    disabled,
                })
                .collect(),
        }
    }

    pub fn set_mode(&self, mode: AuthMode) {
        self.with_state(|state| {
            if !state.pending {
                state.mode = mode;
            }
        });
    }

    pub fn set_email(&self, email: impl Into<String>) {
        let email = email.into();
        self.with_state(|state| {
            if !state.pending {
                state.email = email;
            }
        });
    }

    pub fn set_password(&self, password: impl Into<String>) {
        let password = password.into();
        self.with_state(|state| {
            if !state.pending {
                state.password = password;
            }
        });
    }

    /// The consent checkbox stays live while an action is pending.
    pub fn set_consent(&self, consent: bool) {
        self.with_state(|state| state.consent = consent);
    }

    /// Consent checkpoint shared by both entry actions. On success the
    /// action is marked pending and a guard is returned.
    fn begin(&self, clear_status: bool) -> Result<PendingGuard, LoginOutcome> {
        self.with_state(|state| {
            if state.pending {
                return Err(LoginOutcome::Busy);
            }
            if !state.consent {
                state.error = Some(CONSENT_REQUIRED_MESSAGE.to_string());
                return Err(LoginOutcome::ConsentMissing);
            }
            state.error = None;
            if clear_status {
                state.status_message = None;
            }
            state.pending = true;
            Ok(())
        })?;

        Ok(PendingGuard {
            state: Arc::clone(&self.state),
        })
    }

    fn fail(&self, message: impl Into<String>) -> LoginOutcome {
        let message = message.into();
        self.with_state(|state| state.error = Some(message));
        LoginOutcome::Failed
    }

    /// Submits the email/password form in the current mode.
    pub async fn submit(&self) -> LoginOutcome {
        let _guard = match self.begin(true) {
            Ok(guard) => guard,
            Err(outcome) => return outcome,
        };

        let (mode, email, password) =
            self.with_state(|state| (state.mode, state.email.clone(), state.password.clone()));

        let session = match mode {
            AuthMode::SignIn => self
                .deps
                .gateway
                .sign_in_with_password(&email, &password)
                .await
                .map(Some),
            AuthMode::SignUp => {
                self.deps
                    .gateway
                    .sign_up_with_password(&email, &password, &self.env.app_origin)
                    .await
            }
        };

        let session = match session {
            Ok(Some(session)) => session,
            Ok(None) => {
                self.with_state(|state| {
                    state.mode = AuthMode::SignIn;
                    state.status_message = Some(VERIFY_EMAIL_MESSAGE.to_string());
                });
                return LoginOutcome::VerificationPending;
            }
            Err(err) => {
                tracing::info!("[LoginController] Authentication rejected: {}", err);
                return self.fail(err.message);
            }
        };

        let request = OnboardingRequest::acknowledging(session.access_token.clone());
        let seed = match self.deps.onboarding.complete_onboarding(request).await {
            Ok(seed) => seed,
            Err(err) => {
                tracing::error!("[LoginController] Onboarding failed: {}", err);
                return self.fail(err.user_message());
            }
        };

        self.deps.store.load_workspace(seed);
        self.deps.navigator.push(&self.query.next);
        LoginOutcome::Navigated(self.query.next.clone())
    }

    /// Starts an OAuth sign-in, carrying the consent intent through the
    /// callback URL.
    pub async fn oauth_sign_in(&self, provider: OAuthProvider) -> LoginOutcome {
        let _guard = match self.begin(false) {
            Ok(guard) => guard,
            Err(outcome) => return outcome,
        };

        let redirect_base = self
            .env
            .auth_redirect_base
            .as_ref()
            .unwrap_or(&self.env.app_origin);
        let callback = match ConsentIntent::acknowledged(self.query.next.clone())
            .callback_url(redirect_base)
        {
            Ok(url) => url,
            Err(err) => {
                tracing::error!("[LoginController] Cannot build OAuth callback: {}", err);
                return self.fail(err.reason);
            }
        };

        match self
            .deps
            .gateway
            .begin_oauth_redirect(provider, &callback)
            .await
        {
            Ok(()) => LoginOutcome::Redirecting,
            Err(err) => {
                tracing::error!("[LoginController] OAuth redirect failed: {}", err);
                self.fail(err.message)
            }
        }
    }

    /// Ends the session, drops the demo workspace and returns to login.
    pub async fn sign_out(&self) {
        self.deps.gateway.sign_out().await;
        self.deps.store.reset();
        self.with_state(|state| {
            state.password.clear();
            state.error = None;
            state.status_message = None;
        });
        tracing::info!("[LoginController] Signed out");
        self.deps.navigator.push(LOGIN_ROUTE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockGateway, MockOnboarding, RecordingNavigator, seed};
    use blockbuilders_core::error::{AuthError, GENERIC_RECOVERY_MESSAGE, OnboardingError};
    use tokio::sync::Notify;

    struct Fixture {
        controller: LoginController,
        gateway: Arc<MockGateway>,
        onboarding: Arc<MockOnboarding>,
        navigator: Arc<RecordingNavigator>,
        store: WorkspaceStore,
    }

    fn fixture_with(gateway: MockGateway, onboarding: MockOnboarding, query: LoginQuery) -> Fixture {
        let gateway = Arc::new(gateway);
        let onboarding = Arc::new(onboarding);
        let navigator = Arc::new(RecordingNavigator::default());
        let store = WorkspaceStore::new();
        let controller = LoginController::new(
            LoginDependencies {
                gateway: gateway.clone(),
                onboarding: onboarding.clone(),
                store: store.clone(),
                navigator: navigator.clone(),
            },
            query,
            LoginEnvironment {
                app_origin: Url::parse("http://localhost:3000").unwrap(),
                auth_redirect_base: None,
            },
        );
        Fixture {
            controller,
            gateway,
            onboarding,
            navigator,
            store,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(
            MockGateway::new(),
            MockOnboarding::succeeding(seed("strategy-1", "v1")),
            LoginQuery::default(),
        )
    }

    fn fill_form(controller: &LoginController) {
        controller.set_email("demo@blockbuilders.tech");
        controller.set_password("hunter22");
    }

    #[tokio::test]
    async fn test_sign_out_clears_workspace_and_returns_to_login() {
        let f = fixture();
        fill_form(&f.controller);
        f.controller.set_consent(true);
        f.controller.submit().await;
        assert!(!f.store.snapshot().is_empty());

        f.controller.sign_out().await;

        assert_eq!(
            f.gateway.calls(),
            vec!["sign_in:demo@blockbuilders.tech", "sign_out"]
        );
        assert!(f.store.snapshot().is_empty());
        assert!(f.controller.state().password.is_empty());
        assert_eq!(f.navigator.pushes(), vec!["/dashboard", "/login"]);
    }

    #[tokio::test]
    async fn test_submit_without_consent_makes_no_call() {
        let f = fixture();
        fill_form(&f.controller);

        let outcome = f.controller.submit().await;

        assert_eq!(outcome, LoginOutcome::ConsentMissing);
        assert!(f.gateway.calls().is_empty());
        assert_eq!(
            f.controller.state().error.as_deref(),
            Some("You must acknowledge the simulation-only policy before continuing.")
        );
        assert!(!f.controller.state().pending);
    }

    #[tokio::test]
    async fn test_oauth_without_consent_makes_no_call() {
        let f = fixture();

        let outcome = f.controller.oauth_sign_in(OAuthProvider::Google).await;

        assert_eq!(outcome, LoginOutcome::ConsentMissing);
        assert!(f.gateway.calls().is_empty());
        assert_eq!(
            f.controller.state().error.as_deref(),
            Some(CONSENT_REQUIRED_MESSAGE)
        );
    }

    #[test]
    fn test_toggling_consent_only_enables_controls() {
        let f = fixture();
        fill_form(&f.controller);

        let before = f.controller.view();
        assert!(before.submit_disabled);
        assert!(before.oauth_providers.iter().all(|p| p.disabled));

        f.controller.set_consent(true);
        let after = f.controller.view();

        assert!(!after.submit_disabled);
        assert!(after.oauth_providers.iter().all(|p| !p.disabled));
        assert_eq!(
            LoginView {
                consent: false,
                submit_disabled: true,
                oauth_providers: before.oauth_providers.clone(),
                ..after
            },
            before
        );
    }

    #[test]
    fn test_view_projections() {
        let f = fixture_with(
            MockGateway::new(),
            MockOnboarding::succeeding(seed("strategy-1", "v1")),
            LoginQuery {
                next: "/dashboard".to_string(),
                consent_error: true,
            },
        );

        let view = f.controller.view();
        assert_eq!(view.action_label, "Sign In");
        assert_eq!(view.consent_notice, Some(CONSENT_NOTICE));
        let labels: Vec<_> = view.oauth_providers.iter().map(|p| p.label).collect();
        assert_eq!(labels, vec!["Continue with Google", "Continue with GitHub"]);

        f.controller.set_mode(AuthMode::SignUp);
        assert_eq!(f.controller.view().action_label, "Create Account");
        assert_eq!(fixture().controller.view().consent_notice, None);
    }

    #[tokio::test]
    async fn test_sign_in_loads_workspace_then_navigates_once() {
        let f = fixture();
        fill_form(&f.controller);
        f.controller.set_consent(true);

        let outcome = f.controller.submit().await;

        assert_eq!(outcome, LoginOutcome::Navigated("/dashboard".to_string()));
        assert_eq!(f.gateway.calls(), vec!["sign_in:demo@blockbuilders.tech"]);
        assert_eq!(
            f.onboarding.requests(),
            vec![OnboardingRequest::acknowledging(Some("tok".to_string()))]
        );
        assert_eq!(
            f.store.snapshot().seed(),
            Some(&seed("strategy-1", "v1"))
        );
        assert_eq!(f.navigator.pushes(), vec!["/dashboard"]);

        let state = f.controller.state();
        assert!(!state.pending);
        assert_eq!(state.error, None);
    }

    #[tokio::test]
    async fn test_navigates_to_requested_next() {
        let f = fixture_with(
            MockGateway::new(),
            MockOnboarding::succeeding(seed("strategy-1", "v1")),
            LoginQuery {
                next: "/dashboard/strategies".to_string(),
                consent_error: false,
            },
        );
        f.controller.set_consent(true);

        f.controller.submit().await;

        assert_eq!(f.navigator.pushes(), vec!["/dashboard/strategies"]);
    }

    #[tokio::test]
    async fn test_provider_error_is_shown_verbatim() {
        let gateway = MockGateway::new();
        *gateway.sign_in.lock().unwrap() = Err(AuthError::with_status("Invalid login credentials", 400));
        let f = fixture_with(
            gateway,
            MockOnboarding::succeeding(seed("strategy-1", "v1")),
            LoginQuery::default(),
        );
        f.controller.set_consent(true);

        let outcome = f.controller.submit().await;

        assert_eq!(outcome, LoginOutcome::Failed);
        assert_eq!(
            f.controller.state().error.as_deref(),
            Some("Invalid login credentials")
        );
        assert!(f.onboarding.requests().is_empty());
        assert!(f.navigator.pushes().is_empty());
    }

    #[tokio::test]
    async fn test_sign_up_without_session_asks_for_verification() {
        let gateway = MockGateway::new();
        *gateway.sign_up.lock().unwrap() = Ok(None);
        let f = fixture_with(
            gateway,
            MockOnboarding::succeeding(seed("strategy-1", "v1")),
            LoginQuery::default(),
        );
        fill_form(&f.controller);
        f.controller.set_mode(AuthMode::SignUp);
        f.controller.set_consent(true);

        let outcome = f.controller.submit().await;

        assert_eq!(outcome, LoginOutcome::VerificationPending);
        assert!(f.onboarding.requests().is_empty());
        let state = f.controller.state();
        assert_eq!(state.mode, AuthMode::SignIn);
        assert_eq!(
            state.status_message.as_deref(),
            Some("Account created. Check your email to verify your address, then sign in to continue.")
        );
        assert_eq!(
            f.gateway.calls(),
            vec!["sign_up:demo@blockbuilders.tech:http://localhost:3000/"]
        );
    }

    #[tokio::test]
    async fn test_onboarding_failure_shows_generic_message() {
        let f = fixture_with(
            MockGateway::new(),
            MockOnboarding::failing(OnboardingError::provisioning("schema mismatch at blocks[2]")),
            LoginQuery::default(),
        );
        f.controller.set_consent(true);

        let outcome = f.controller.submit().await;

        assert_eq!(outcome, LoginOutcome::Failed);
        assert_eq!(
            f.controller.state().error.as_deref(),
            Some(GENERIC_RECOVERY_MESSAGE)
        );
        assert!(f.store.snapshot().is_empty());
        assert!(f.navigator.pushes().is_empty());
    }

    #[tokio::test]
    async fn test_submit_clears_previous_messages() {
        let f = fixture();
        f.controller.submit().await;
        assert!(f.controller.state().error.is_some());

        f.controller.set_consent(true);
        f.controller.submit().await;

        let state = f.controller.state();
        assert_eq!(state.error, None);
        assert_eq!(state.status_message, None);
    }

    #[tokio::test]
    async fn test_oauth_callback_carries_consent_and_next() {
        let f = fixture();
        f.controller.set_consent(true);

        let outcome = f.controller.oauth_sign_in(OAuthProvider::Google).await;

        assert_eq!(outcome, LoginOutcome::Redirecting);
        let redirects = f.gateway.redirect_urls.lock().unwrap().clone();
        assert_eq!(redirects.len(), 1);
        let (provider, url) = &redirects[0];
        assert_eq!(provider.as_str(), "google");
        assert_eq!(url.path(), "/api/auth/callback");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("next".to_string(), "/dashboard".to_string()),
                ("consent".to_string(), "true".to_string()),
            ]
        );
        assert!(f.navigator.pushes().is_empty());
        assert!(!f.controller.state().pending);
    }

    #[tokio::test]
    async fn test_oauth_failure_surfaces_provider_message() {
        let gateway = MockGateway::new();
        *gateway.oauth.lock().unwrap() = Err(AuthError::new("Provider is not enabled"));
        let f = fixture_with(
            gateway,
            MockOnboarding::succeeding(seed("strategy-1", "v1")),
            LoginQuery::default(),
        );
        f.controller.set_consent(true);

        let outcome = f.controller.oauth_sign_in(OAuthProvider::Github).await;

        assert_eq!(outcome, LoginOutcome::Failed);
        assert_eq!(
            f.controller.state().error.as_deref(),
            Some("Provider is not enabled")
        );
        assert!(f.navigator.pushes().is_empty());
    }

    #[tokio::test]
    async fn test_pending_gates_inputs_and_duplicate_actions() {
        let hold = Arc::new(Notify::new());
        let mut gateway = MockGateway::new();
        gateway.hold = Some(hold.clone());
        let f = fixture_with(
            gateway,
            MockOnboarding::succeeding(seed("strategy-1", "v1")),
            LoginQuery::default(),
        );
        fill_form(&f.controller);
        f.controller.set_consent(true);

        let (first, _) = tokio::join!(f.controller.submit(), async {
            assert!(f.controller.state().pending);
            assert!(f.controller.view().submit_disabled);

            assert_eq!(f.controller.submit().await, LoginOutcome::Busy);
            assert_eq!(
                f.controller.oauth_sign_in(OAuthProvider::Google).await,
                LoginOutcome::Busy
            );

            f.controller.set_email("other@example.com");
            f.controller.set_mode(AuthMode::SignUp);
            f.controller.set_consent(false);
            f.controller.set_consent(true);

            hold.notify_one();
        });

        assert!(matches!(first, LoginOutcome::Navigated(_)));
        let state = f.controller.state();
        assert!(!state.pending);
        assert_eq!(state.email, "demo@blockbuilders.tech");
        assert_eq!(state.mode, AuthMode::SignIn);
        assert_eq!(f.gateway.calls().len(), 1);
        assert_eq!(f.navigator.pushes().len(), 1);
    }

    #[test]
    fn test_state_debug_redacts_password() {
        let f = fixture();
        f.controller.set_password("hunter22");
        assert!(!format!("{:?}", f.controller.state()).contains("hunter22"));
    }
}
