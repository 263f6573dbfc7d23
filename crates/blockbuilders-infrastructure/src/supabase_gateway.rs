//! SupabaseSessionGateway - hosted auth provider over its GoTrue REST API.
//!
//! Keeps the active session in process memory. OAuth uses PKCE; the verifier
//! stays in this process until the callback exchanges the code, and is also
//! written to a verifier file when one is configured so that a later process
//! can complete the exchange.

use async_trait::async_trait;
use blockbuilders_core::error::AuthError;
use blockbuilders_core::gateway::{GateRequest, Navigator, OAuthProvider, SessionGateway, SessionLookup};
use blockbuilders_core::session::{Session, SessionUser};
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

use crate::pkce::{CHALLENGE_METHOD, PkcePair};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Serialize)]
struct PasswordCredentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct PkceExchange<'a> {
    auth_code: &'a str,
    code_verifier: &'a str,
}

/// Token endpoint response. Sign-up answers with a bare user object when
/// email confirmation is pending, so every field is optional.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    user: Option<SessionUser>,
}

/// Gateway to the hosted auth provider.
pub struct SupabaseSessionGateway {
    client: Client,
    auth_url: Url,
    anon_key: String,
    timeout: Duration,
    navigator: Arc<dyn Navigator>,
    session: RwLock<Option<Session>>,
    pkce: Mutex<Option<PkcePair>>,
    /// Cookie carrying the access token on incoming requests
    cookie_name: String,
    /// Where a pending PKCE verifier survives between processes
    verifier_file: Option<PathBuf>,
}

impl SupabaseSessionGateway {
    pub fn new(auth_url: Url, anon_key: impl Into<String>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            client: Client::new(),
            auth_url,
            anon_key: anon_key.into(),
            timeout: DEFAULT_TIMEOUT,
            navigator,
            session: RwLock::new(None),
            pkce: Mutex::new(None),
            cookie_name: "bb-auth-token".to_string(),
            verifier_file: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }

    pub fn with_verifier_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.verifier_file = Some(path.into());
        self
    }

    /// Adopts a session obtained elsewhere, e.g. one resolved from a token.
    pub async fn restore_session(&self, session: Session) {
        self.store_session(session).await;
    }

    fn endpoint(&self, path: &str) -> Result<Url, AuthError> {
        let mut url = self.auth_url.clone();
        url.path_segments_mut()
            .map_err(|_| AuthError::new("Auth URL cannot carry a path"))?
            .pop_if_empty()
            .extend(["auth", "v1", path]);
        Ok(url)
    }

    /// Builds the provider's authorize URL for a PKCE OAuth flow.
    pub fn authorize_url(
        &self,
        provider: OAuthProvider,
        redirect_url: &Url,
        challenge: &str,
    ) -> Result<Url, AuthError> {
        let mut url = self.endpoint("authorize")?;
        url.query_pairs_mut()
            .append_pair("provider", provider.as_str())
            .append_pair("redirect_to", redirect_url.as_str())
            .append_pair("code_challenge", challenge)
            .append_pair("code_challenge_method", CHALLENGE_METHOD);
        Ok(url)
    }

    fn request(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.anon_key)
            .header("Content-Type", "application/json")
            .timeout(self.timeout)
    }

    async fn send(&self, builder: RequestBuilder, what: &str) -> Result<Value, AuthError> {
        let response = self.request(builder).send().await.map_err(|e| {
            tracing::warn!("[AuthGateway] {} request failed: {}", what, e);
            AuthError::new(format!("Unable to reach the authentication service: {}", e))
        })?;

        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);

        if !status.is_success() {
            let message = provider_error_message(&body, status);
            tracing::debug!("[AuthGateway] {} rejected ({}): {}", what, status, message);
            return Err(AuthError::with_status(message, status.as_u16()));
        }
        Ok(body)
    }

    async fn store_session(&self, session: Session) -> Session {
        let mut guard = self.session.write().await;
        *guard = Some(session.clone());
        session
    }

    async fn save_verifier(&self, pair: &PkcePair) -> Result<(), AuthError> {
        let Some(path) = &self.verifier_file else {
            return Ok(());
        };
        let write = async {
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(path, &pair.verifier).await
        };
        write.await.map_err(|e| {
            tracing::warn!("[AuthGateway] Failed to write {}: {}", path.display(), e);
            AuthError::new(format!("Unable to store the OAuth verifier: {}", e))
        })
    }

    /// Takes the pending verifier, preferring this process's copy. The
    /// verifier file is consumed either way.
    async fn take_verifier(&self) -> Option<String> {
        let in_memory = self.pkce.lock().await.take().map(|pair| pair.verifier);
        let Some(path) = &self.verifier_file else {
            return in_memory;
        };

        let stored = tokio::fs::read_to_string(path)
            .await
            .ok()
            .map(|content| content.trim().to_string())
            .filter(|verifier| !verifier.is_empty());
        if let Err(err) = tokio::fs::remove_file(path).await
            && err.kind() != ErrorKind::NotFound
        {
            tracing::warn!("[AuthGateway] Failed to remove {}: {}", path.display(), err);
        }

        in_memory.or(stored)
    }

    /// Resolves the user behind an access token (`GET /auth/v1/user`).
    ///
    /// Returns `Ok(None)` when the provider rejects the token.
    pub async fn user_for_token(&self, access_token: &str) -> Result<Option<Session>, AuthError> {
        let url = self.endpoint("user")?;
        let builder = self.client.get(url).bearer_auth(access_token);

        match self.send(builder, "user lookup").await {
            Ok(body) => {
                let user: SessionUser = serde_json::from_value(body)
                    .map_err(|e| AuthError::new(format!("Invalid user payload: {}", e)))?;
                Ok(Some(Session::new(access_token, user)))
            }
            Err(err)
                if matches!(
                    err.status.and_then(|s| StatusCode::from_u16(s).ok()),
                    Some(StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
                ) =>
            {
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}

/// Extracts the human-readable message from a provider error body.
pub(crate) fn provider_error_message(body: &Value, status: StatusCode) -> String {
    ["error_description", "msg", "message", "error"]
        .iter()
        .find_map(|key| body.get(key).and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| {
            format!(
                "Authentication request failed ({})",
                status.canonical_reason().unwrap_or("unknown status")
            )
        })
}

/// Interprets a token/sign-up response. `Ok(None)` means no session yet.
pub(crate) fn session_from_token_response(body: Value) -> Result<Option<Session>, AuthError> {
    let parsed: TokenResponse = serde_json::from_value(body)
        .map_err(|e| AuthError::new(format!("Invalid authentication response: {}", e)))?;

    match (parsed.access_token, parsed.user) {
        (Some(token), Some(user)) => Ok(Some(Session::new(token, user))),
        (Some(_), None) => Err(AuthError::new("Authentication response is missing the user")),
        (None, _) => Ok(None),
    }
}

#[async_trait]
impl SessionGateway for SupabaseSessionGateway {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let mut url = self.endpoint("token")?;
        url.query_pairs_mut().append_pair("grant_type", "password");

        let builder = self
            .client
            .post(url)
            .json(&PasswordCredentials { email, password });
        let body = self.send(builder, "password sign-in").await?;

        let session = session_from_token_response(body)?
            .ok_or_else(|| AuthError::new("Authentication response did not include a session"))?;
        tracing::info!("[AuthGateway] Signed in user {}", session.user.id);
        Ok(self.store_session(session).await)
    }

    async fn sign_up_with_password(
        &self,
        email: &str,
        password: &str,
        redirect_origin: &Url,
    ) -> Result<Option<Session>, AuthError> {
        let mut url = self.endpoint("signup")?;
        url.query_pairs_mut()
            .append_pair("redirect_to", redirect_origin.as_str());

        let builder = self
            .client
            .post(url)
            .json(&PasswordCredentials { email, password });
        let body = self.send(builder, "sign-up").await?;

        match session_from_token_response(body)? {
            Some(session) => {
                tracing::info!("[AuthGateway] Signed up user {}", session.user.id);
                Ok(Some(self.store_session(session).await))
            }
            None => {
                tracing::info!("[AuthGateway] Sign-up pending email verification");
                Ok(None)
            }
        }
    }

    async fn begin_oauth_redirect(
        &self,
        provider: OAuthProvider,
        redirect_url: &Url,
    ) -> Result<(), AuthError> {
        let pair = PkcePair::generate();
        let authorize = self.authorize_url(provider, redirect_url, &pair.challenge)?;

        self.save_verifier(&pair).await?;
        *self.pkce.lock().await = Some(pair);

        tracing::info!("[AuthGateway] Redirecting to {} consent screen", provider);
        self.navigator.redirect(&authorize);
        Ok(())
    }

    async fn exchange_code_for_session(&self, code: &str) -> Result<Session, AuthError> {
        let verifier = self
            .take_verifier()
            .await
            .ok_or_else(|| AuthError::new("No OAuth sign-in is in progress"))?;

        let mut url = self.endpoint("token")?;
        url.query_pairs_mut().append_pair("grant_type", "pkce");

        let builder = self.client.post(url).json(&PkceExchange {
            auth_code: code,
            code_verifier: &verifier,
        });
        let body = self.send(builder, "code exchange").await?;

        let session = session_from_token_response(body)?
            .ok_or_else(|| AuthError::new("Code exchange did not include a session"))?;
        tracing::info!("[AuthGateway] OAuth session established for {}", session.user.id);
        Ok(self.store_session(session).await)
    }

    async fn get_current_session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    async fn sign_out(&self) {
        let previous = self.session.write().await.take();

        // Best-effort server-side revocation.
        if let Some(token) = previous.and_then(|s| s.access_token)
            && let Ok(url) = self.endpoint("logout")
        {
            let builder = self.client.post(url).bearer_auth(token);
            if let Err(err) = self.send(builder, "sign-out").await {
                tracing::warn!("[AuthGateway] Remote sign-out failed: {}", err);
            }
        }
    }
}

#[async_trait]
impl SessionLookup for SupabaseSessionGateway {
    async fn lookup(&self, request: &GateRequest) -> Result<Option<Session>, AuthError> {
        match request.cookie(&self.cookie_name) {
            Some(token) if !token.is_empty() => self.user_for_token(token).await,
            _ => Ok(None),
        }
    }
}
