//! Error types for the BlockBuilders onboarding flow.
//!
//! Failures are typed at the gateway and orchestrator layers and only turned
//! into user-facing text by the login controller and the edge gate.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message shown for every onboarding failure that is not a consent refusal.
pub const GENERIC_RECOVERY_MESSAGE: &str = "We could not persist your consent. Please try again.";

/// Failure reported by the hosted authentication provider.
///
/// The message is shown to the user verbatim (invalid credentials,
/// rate limits, unconfirmed email and so on).
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{message}")]
pub struct AuthError {
    pub message: String,
    /// HTTP status returned by the provider, when there was a response.
    pub status: Option<u16>,
}

impl AuthError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(message: impl Into<String>, status: u16) -> Self {
        Self {
            message: message.into(),
            status: Some(status),
        }
    }
}

/// External payload did not match the expected shape.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("Validation failed: {reason}")]
pub struct ValidationError {
    pub reason: String,
}

impl ValidationError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for ValidationError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// Failures of the onboarding sequence, in the order the steps can raise them.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OnboardingError {
    /// Neither a supplied token nor an active session token was available.
    #[error("Session token unavailable")]
    TokenUnavailable,

    /// The consent acknowledgement endpoint answered with a non-success status.
    #[error("Failed to persist consent: {status}")]
    ConsentPersist { status: u16 },

    /// The session record returned by the API did not validate.
    #[error("Received invalid session payload from API: {0}")]
    InvalidSessionPayload(String),

    /// The server does not consider simulation-only consent acknowledged.
    #[error("Simulation consent required")]
    ConsentRequired,

    /// Strategy or version provisioning failed or returned an invalid seed.
    #[error("Failed to provision demo workspace: {0}")]
    Provisioning(String),

    /// The request never produced an HTTP response (connect, timeout, body read).
    #[error("Transport error: {0}")]
    Transport(String),
}

impl OnboardingError {
    pub fn invalid_session(reason: impl Into<String>) -> Self {
        Self::InvalidSessionPayload(reason.into())
    }

    pub fn provisioning(reason: impl Into<String>) -> Self {
        Self::Provisioning(reason.into())
    }

    pub fn transport(reason: impl Into<String>) -> Self {
        Self::Transport(reason.into())
    }

    /// Check if the server refused to recognise consent.
    pub fn is_consent_required(&self) -> bool {
        matches!(self, Self::ConsentRequired)
    }

    pub fn is_token_unavailable(&self) -> bool {
        matches!(self, Self::TokenUnavailable)
    }

    /// Text safe to show at the UI boundary.
    ///
    /// Backend detail is never exposed; callers log the full error instead.
    pub fn user_message(&self) -> &'static str {
        GENERIC_RECOVERY_MESSAGE
    }
}

/// A type alias for `Result<T, OnboardingError>`.
pub type Result<T> = std::result::Result<T, OnboardingError>;
