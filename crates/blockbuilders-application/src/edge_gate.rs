//! Request-time guard for protected routes.

use blockbuilders_core::Url;
use blockbuilders_core::gateway::{GateRequest, SessionLookup};
use blockbuilders_core::routes::{LoginRedirectReason, is_protected_path, login_redirect};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Let the request through unmodified.
    Pass,
    /// Send the user agent to this login URL instead.
    Redirect(Url),
}

/// Re-derives the consent decision from the request's own session,
/// independently of the login controller.
pub struct EdgeGate {
    lookup: Arc<dyn SessionLookup>,
}

impl EdgeGate {
    pub fn new(lookup: Arc<dyn SessionLookup>) -> Self {
        Self { lookup }
    }

    pub async fn evaluate(&self, request: &GateRequest) -> GateDecision {
        // Unprotected paths never reach the session lookup.
        if !is_protected_path(request.url.path()) {
            return GateDecision::Pass;
        }

        let session = match self.lookup.lookup(request).await {
            Ok(session) => session,
            Err(err) => {
                tracing::warn!(
                    "[EdgeGate] Session lookup failed for {}, treating as anonymous: {}",
                    request.url.path(),
                    err
                );
                None
            }
        };

        let reason = match session {
            None => LoginRedirectReason::Unauthenticated,
            Some(session) if !session.consent_acknowledged() => LoginRedirectReason::ConsentRequired,
            Some(_) => return GateDecision::Pass,
        };

        tracing::debug!(
            "[EdgeGate] Redirecting {} to login ({:?})",
            request.url.path(),
            reason
        );
        GateDecision::Redirect(login_redirect(&request.url, reason))
    }
}
