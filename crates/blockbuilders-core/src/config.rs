use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::validation::Validate;

const ONE_HOUR_IN_SECONDS: u64 = 60 * 60;

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SameSite {
    #[default]
    Lax,
    Strict,
    None,
}

/// Session cookie policy shared by every surface that reads the session.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct CookieOptions {
    pub name: String,
    pub lifetime_secs: u64,
    pub domain: Option<String>,
    pub path: String,
    pub same_site: SameSite,
    pub secure: bool,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            name: "bb-auth-token".to_string(),
            lifetime_secs: ONE_HOUR_IN_SECONDS,
            domain: None,
            path: "/".to_string(),
            same_site: SameSite::Lax,
            secure: cfg!(not(debug_assertions)),
        }
    }
}

/// Hosted auth provider endpoint and public key.
#[derive(Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct AuthProviderConfig {
    pub url: String,
    pub anon_key: String,
}

impl Default for AuthProviderConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:54321".to_string(),
            anon_key: String::new(),
        }
    }
}

impl std::fmt::Debug for AuthProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthProviderConfig")
            .field("url", &self.url)
            .field("anon_key", &"<redacted>")
            .finish()
    }
}

/// Root configuration (`config.toml`).
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    /// `{API_BASE}` of the BlockBuilders REST API
    pub api_base_url: String,
    /// Origin used for OAuth callbacks; the app origin when unset
    pub auth_redirect_base_url: Option<String>,
    /// Public origin of the web app
    pub app_origin: String,
    pub request_timeout_secs: u64,
    pub auth: AuthProviderConfig,
    pub cookie: CookieOptions,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".to_string(),
            auth_redirect_base_url: None,
            app_origin: "http://localhost:3000".to_string(),
            request_timeout_secs: 30,
            auth: AuthProviderConfig::default(),
            cookie: CookieOptions::default(),
        }
    }
}

fn parse_http_url(field: &str, raw: &str) -> Result<Url, ValidationError> {
    let url = Url::parse(raw)
        .map_err(|e| ValidationError::new(format!("{} is not a valid URL: {}", field, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ValidationError::new(format!(
            "{} must use http or https, got '{}'",
            field, other
        ))),
    }
}

impl AppConfig {
    pub fn api_base(&self) -> Result<Url, ValidationError> {
        parse_http_url("api_base_url", &self.api_base_url)
    }

    pub fn auth_url(&self) -> Result<Url, ValidationError> {
        parse_http_url("auth.url", &self.auth.url)
    }

    pub fn app_origin(&self) -> Result<Url, ValidationError> {
        parse_http_url("app_origin", &self.app_origin)
    }

    /// `{AUTH_REDIRECT_BASE}`, falling back to the app origin.
    pub fn auth_redirect_base(&self) -> Result<Url, ValidationError> {
        match &self.auth_redirect_base_url {
            Some(raw) => parse_http_url("auth_redirect_base_url", raw),
            None => self.app_origin(),
        }
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        self.api_base()?;
        self.auth_url()?;
        self.app_origin()?;
        self.auth_redirect_base()?;
        if self.request_timeout_secs == 0 {
            return Err(ValidationError::new("request_timeout_secs must be positive"));
        }
        if self.cookie.name.is_empty() {
            return Err(ValidationError::new("cookie.name must not be empty"));
        }
        Ok(())
    }
}
