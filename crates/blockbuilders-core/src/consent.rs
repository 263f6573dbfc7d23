//! Simulation-only consent policy.
//!
//! User metadata carries the consent record under
//! `consents.simulationOnly`. The record is only ever written by the API's
//! consent endpoint; clients read and re-validate it.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ValidationError;
use crate::validation::{parse_validated, Validate};

/// Acknowledgement state of the simulation-only policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationConsent {
    pub acknowledged: bool,
    pub acknowledged_at: Option<DateTime<FixedOffset>>,
}

impl SimulationConsent {
    /// A consent record acknowledged at `now`.
    pub fn acknowledged_at(now: DateTime<Utc>) -> Self {
        Self {
            acknowledged: true,
            acknowledged_at: Some(now.fixed_offset()),
        }
    }

    pub fn acknowledged_now() -> Self {
        Self::acknowledged_at(Utc::now())
    }

    pub fn pending() -> Self {
        Self {
            acknowledged: false,
            acknowledged_at: None,
        }
    }
}

impl Validate for SimulationConsent {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.acknowledged && self.acknowledged_at.is_none() {
            return Err(ValidationError::new(
                "acknowledged consent must carry an acknowledgedAt timestamp",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Consents {
    pub simulation_only: SimulationConsent,
}

/// The part of the provider's user metadata this system depends on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppMetadata {
    pub consents: Consents,
}

impl AppMetadata {
    /// Validates raw user metadata.
    pub fn parse(value: &Value) -> Result<Self, ValidationError> {
        parse_validated(value)
    }

    pub fn with_consent(consent: SimulationConsent) -> Self {
        Self {
            consents: Consents {
                simulation_only: consent,
            },
        }
    }

    pub fn with_acknowledged_consent(now: DateTime<Utc>) -> Self {
        Self::with_consent(SimulationConsent::acknowledged_at(now))
    }

    pub fn is_acknowledged(&self) -> bool {
        self.consents.simulation_only.acknowledged
    }
}

impl Validate for AppMetadata {
    fn validate(&self) -> Result<(), ValidationError> {
        self.consents.simulation_only.validate()
    }
}

/// Returns true iff `metadata` validates and its simulation-only consent is
/// acknowledged.
///
/// Missing or malformed metadata counts as not acknowledged. This never fails.
/// `acknowledged: true` with a null or missing `acknowledgedAt` is malformed,
/// so it also counts as not acknowledged.
pub fn is_consent_acknowledged(metadata: &Value) -> bool {
    match AppMetadata::parse(metadata) {
        Ok(parsed) => parsed.is_acknowledged(),
        Err(err) => {
            tracing::debug!("[ConsentPolicy] Metadata rejected: {}", err.reason);
            false
        }
    }
}
