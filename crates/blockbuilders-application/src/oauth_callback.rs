//! Completes the OAuth round trip started by the login controller.
//!
//! The callback runs in its own request context; the only thing it knows
//! about the initiating page is the consent intent in its query string.

use blockbuilders_core::Url;
use blockbuilders_core::api::AuthApi;
use blockbuilders_core::gateway::SessionGateway;
use blockbuilders_core::routes::{ConsentIntent, DEFAULT_REDIRECT_PATH};
use std::sync::Arc;

/// HTTP status used for the post-callback redirect.
pub const SEE_OTHER: u16 = 303;

const CODE_PARAM: &str = "code";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackOutcome {
    pub location: Url,
    pub status: u16,
}

pub struct OAuthCallbackHandler {
    gateway: Arc<dyn SessionGateway>,
    api: Arc<dyn AuthApi>,
}

impl OAuthCallbackHandler {
    pub fn new(gateway: Arc<dyn SessionGateway>, api: Arc<dyn AuthApi>) -> Self {
        Self { gateway, api }
    }

    /// Exchanges the code, persists consent when it was requested, and
    /// always redirects to `next`. Failures are logged, never raised.
    pub async fn handle(&self, request_url: &Url) -> CallbackOutcome {
        let intent = ConsentIntent::from_url(request_url);
        let code = request_url
            .query_pairs()
            .find(|(key, _)| key == CODE_PARAM)
            .map(|(_, value)| value.into_owned())
            .filter(|code| !code.is_empty());

        if let Some(code) = code {
            match self.gateway.exchange_code_for_session(&code).await {
                Ok(session) => {
                    if intent.consent
                        && let Some(token) = session.access_token()
                        && let Err(err) = self.api.acknowledge_consent(token).await
                    {
                        tracing::error!("[OAuthCallback] Failed to persist consent: {}", err);
                    }
                }
                Err(err) => {
                    tracing::error!("[OAuthCallback] Code exchange failed: {}", err);
                }
            }
        } else {
            tracing::warn!("[OAuthCallback] Callback reached without an authorization code");
        }

        CallbackOutcome {
            location: same_origin_location(request_url, &intent.next),
            status: SEE_OTHER,
        }
    }
}

/// Joins `next` onto the callback URL, never leaving its origin.
fn same_origin_location(request_url: &Url, next: &str) -> Url {
    let mut base = request_url.clone();
    base.set_query(None);
    base.set_fragment(None);

    match base.join(next) {
        Ok(location) if location.origin() == request_url.origin() => location,
        Ok(location) => {
            tracing::warn!(
                "[OAuthCallback] Refusing cross-origin redirect to {}",
                location.origin().ascii_serialization()
            );
            base.set_path(DEFAULT_REDIRECT_PATH);
            base
        }
        Err(_) => {
            base.set_path(DEFAULT_REDIRECT_PATH);
            base
        }
    }
}
