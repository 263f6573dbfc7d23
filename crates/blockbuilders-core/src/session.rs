//! Authentication session as seen by this system.
//!
//! Sessions are created and destroyed by the hosted auth provider; this
//! system only reads them.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::consent::is_consent_acknowledged;

/// User record attached to a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Raw provider metadata; validated on every read.
    #[serde(default)]
    pub app_metadata: Value,
}

/// Result of a successful sign-in, sign-up or OAuth exchange.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Absent while email verification is pending.
    pub access_token: Option<String>,
    pub user: SessionUser,
}

impl Session {
    pub fn new(access_token: impl Into<String>, user: SessionUser) -> Self {
        Self {
            access_token: Some(access_token.into()),
            user,
        }
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    /// Evaluates the consent policy against this session's metadata.
    pub fn consent_acknowledged(&self) -> bool {
        is_consent_acknowledged(&self.user.app_metadata)
    }
}

// Access tokens must never reach logs.
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "<redacted>"),
            )
            .field("user", &self.user)
            .finish()
    }
}
