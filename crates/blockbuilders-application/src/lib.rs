//! Use cases of the BlockBuilders onboarding flow.
//!
//! Each component receives its collaborators explicitly; nothing here
//! reaches for global state.

pub mod edge_gate;
pub mod login_controller;
pub mod oauth_callback;
pub mod onboarding;
pub mod workspace_store;

#[cfg(test)]
mod testing;

pub use edge_gate::{EdgeGate, GateDecision};
pub use login_controller::{
    AuthMode, LoginController, LoginDependencies, LoginEnvironment, LoginOutcome, LoginState,
    LoginView,
};
pub use oauth_callback::{CallbackOutcome, OAuthCallbackHandler};
pub use onboarding::{OnboardingOrchestrator, OnboardingRequest, OnboardingService};
pub use workspace_store::{HISTORY_LIMIT, WorkspaceState, WorkspaceStore};
