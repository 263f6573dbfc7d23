//! Seams between the onboarding flow and the outside world.

use async_trait::async_trait;
use reqwest::Url;
use std::fmt;

use crate::error::AuthError;
use crate::session::Session;

/// OAuth identity providers offered on the login surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OAuthProvider {
    Google,
    Github,
}

impl OAuthProvider {
    pub const ALL: [OAuthProvider; 2] = [OAuthProvider::Google, OAuthProvider::Github];

    /// Identifier understood by the auth provider.
    pub fn as_str(&self) -> &'static str {
        match self {
            OAuthProvider::Google => "google",
            OAuthProvider::Github => "github",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OAuthProvider::Google => "Continue with Google",
            OAuthProvider::Github => "Continue with GitHub",
        }
    }

    pub fn parse(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == id)
    }
}

impl fmt::Display for OAuthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Thin abstraction over the hosted authentication provider.
#[async_trait]
pub trait SessionGateway: Send + Sync {
    async fn sign_in_with_password(&self, email: &str, password: &str)
    -> Result<Session, AuthError>;

    /// `Ok(None)` means the account exists but email verification is pending.
    async fn sign_up_with_password(
        &self,
        email: &str,
        password: &str,
        redirect_origin: &Url,
    ) -> Result<Option<Session>, AuthError>;

    /// Sends the user agent to the provider's consent screen. The session
    /// only materializes later through [`SessionGateway::exchange_code_for_session`].
    async fn begin_oauth_redirect(
        &self,
        provider: OAuthProvider,
        redirect_url: &Url,
    ) -> Result<(), AuthError>;

    /// Completes an OAuth round trip started by `begin_oauth_redirect`.
    async fn exchange_code_for_session(&self, code: &str) -> Result<Session, AuthError>;

    /// Non-throwing lookup of the active session.
    async fn get_current_session(&self) -> Option<Session>;

    /// Access token of the active session; lookup problems yield `None`.
    async fn get_access_token(&self) -> Option<String> {
        self.get_current_session()
            .await
            .and_then(|session| session.access_token)
    }

    async fn sign_out(&self);
}

/// Moves the user agent to another location.
pub trait Navigator: Send + Sync {
    /// In-app navigation to a site-relative path.
    fn push(&self, path: &str);

    /// Full redirect to an external URL (OAuth consent screens).
    fn redirect(&self, url: &Url);
}

/// Incoming request as seen by the edge gate.
#[derive(Debug, Clone)]
pub struct GateRequest {
    pub url: Url,
    /// Raw `Cookie` header, if any.
    pub cookie_header: Option<String>,
}

impl GateRequest {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            cookie_header: None,
        }
    }

    pub fn with_cookies(mut self, header: impl Into<String>) -> Self {
        self.cookie_header = Some(header.into());
        self
    }

    /// Value of the named cookie.
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookie_header.as_deref()?.split(';').find_map(|pair| {
            let (key, value) = pair.trim().split_once('=')?;
            (key == name).then_some(value)
        })
    }
}

/// Resolves the session attached to an incoming request.
#[async_trait]
pub trait SessionLookup: Send + Sync {
    async fn lookup(&self, request: &GateRequest) -> Result<Option<Session>, AuthError>;
}
