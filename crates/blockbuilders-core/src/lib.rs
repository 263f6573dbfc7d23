//! Domain layer for BlockBuilders onboarding.
//!
//! Types, policies and the traits at the I/O seams. Nothing here performs
//! network or file access.

pub mod api;
pub mod config;
pub mod consent;
pub mod error;
pub mod gateway;
pub mod routes;
pub mod session;
pub mod validation;
pub mod workspace;

pub use reqwest::Url;

pub use api::{AuthApi, AuthProfile};
pub use consent::{is_consent_acknowledged, AppMetadata, SimulationConsent};
pub use error::{AuthError, OnboardingError, ValidationError};
pub use gateway::{GateRequest, Navigator, OAuthProvider, SessionGateway, SessionLookup};
pub use session::{Session, SessionUser};
pub use workspace::StrategySeed;
