//! Route names, redirect targets and the OAuth consent intent.

use reqwest::Url;

use crate::error::ValidationError;

/// The single canonical login route.
pub const LOGIN_ROUTE: &str = "/login";
pub const DEFAULT_REDIRECT_PATH: &str = "/dashboard";
pub const OAUTH_CALLBACK_PATH: &str = "/api/auth/callback";
/// Route prefixes that require an authenticated, consenting session.
pub const PROTECTED_PATH_PREFIXES: &[&str] = &["/dashboard"];

pub const NEXT_PARAM: &str = "next";
pub const CONSENT_PARAM: &str = "consent";
pub const ERROR_PARAM: &str = "error";
pub const CONSENT_ERROR_VALUE: &str = "consent";

/// True for a protected prefix itself and anything below it.
pub fn is_protected_path(path: &str) -> bool {
    PROTECTED_PATH_PREFIXES.iter().any(|prefix| {
        path == *prefix
            || path
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.starts_with('/'))
    })
}

/// Resolves the post-auth redirect target.
///
/// Only site-relative paths are honored; anything else falls back to
/// [`DEFAULT_REDIRECT_PATH`]. URL parsers drop tabs and newlines, so
/// `/\t/host` would otherwise resolve to `//host`.
pub fn resolve_next(next: Option<&str>) -> String {
    match next {
        Some(path) if is_site_relative(path) => path.to_string(),
        _ => DEFAULT_REDIRECT_PATH.to_string(),
    }
}

fn is_site_relative(path: &str) -> bool {
    path.starts_with('/')
        && !path.starts_with("//")
        && !path
            .chars()
            .any(|c| c == '\\' || c.is_control() || c.is_whitespace())
}

/// Why the edge gate bounced a request to the login route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginRedirectReason {
    Unauthenticated,
    ConsentRequired,
}

/// Builds the login redirect for a request, preserving the original
/// destination in `next`.
pub fn login_redirect(request_url: &Url, reason: LoginRedirectReason) -> Url {
    let mut redirect = request_url.clone();
    redirect.set_path(LOGIN_ROUTE);
    redirect.set_query(None);
    redirect.set_fragment(None);

    let original = match request_url.query() {
        Some(query) => format!("{}?{}", request_url.path(), query),
        None => request_url.path().to_string(),
    };

    {
        let mut pairs = redirect.query_pairs_mut();
        if reason == LoginRedirectReason::ConsentRequired {
            pairs.append_pair(ERROR_PARAM, CONSENT_ERROR_VALUE);
        }
        pairs.append_pair(NEXT_PARAM, &original);
    }
    redirect
}

/// Query parameters recognised by the login surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginQuery {
    pub next: String,
    /// Set when the visitor was bounced here for missing consent.
    pub consent_error: bool,
}

impl LoginQuery {
    pub fn from_url(url: &Url) -> Self {
        let mut next = None;
        let mut consent_error = false;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                NEXT_PARAM => next = Some(value.into_owned()),
                ERROR_PARAM => consent_error = value == CONSENT_ERROR_VALUE,
                _ => {}
            }
        }
        Self {
            next: resolve_next(next.as_deref()),
            consent_error,
        }
    }
}

impl Default for LoginQuery {
    fn default() -> Self {
        Self {
            next: DEFAULT_REDIRECT_PATH.to_string(),
            consent_error: false,
        }
    }
}

/// Consent intent carried through the OAuth round trip.
///
/// The callback runs in a separate request context, so the intent travels
/// in the callback URL's query string rather than in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsentIntent {
    pub next: String,
    pub consent: bool,
}

impl ConsentIntent {
    pub fn acknowledged(next: impl Into<String>) -> Self {
        Self {
            next: next.into(),
            consent: true,
        }
    }

    /// `{base}/api/auth/callback?next=<path>&consent=true`
    pub fn callback_url(&self, redirect_base: &Url) -> Result<Url, ValidationError> {
        let mut url = redirect_base
            .join(OAUTH_CALLBACK_PATH)
            .map_err(|e| ValidationError::new(format!("invalid redirect base: {}", e)))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair(NEXT_PARAM, &self.next);
            if self.consent {
                pairs.append_pair(CONSENT_PARAM, "true");
            }
        }
        Ok(url)
    }

    /// Reads the intent back from a callback URL.
    pub fn from_url(url: &Url) -> Self {
        let mut next = None;
        let mut consent = false;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                NEXT_PARAM => next = Some(value.into_owned()),
                CONSENT_PARAM => consent = value == "true",
                _ => {}
            }
        }
        Self {
            next: resolve_next(next.as_deref()),
            consent,
        }
    }
}
