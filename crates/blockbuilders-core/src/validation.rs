//! Boundary validation for external JSON.
//!
//! Every payload that crosses into the system (API responses, session
//! metadata) is deserialized and then checked with [`Validate`]. Shape errors
//! and semantic errors both surface as [`ValidationError`].

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ValidationError;

/// Semantic checks that serde cannot express.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

/// Deserializes `value` into `T` and runs its [`Validate`] checks.
pub fn parse_validated<T>(value: &Value) -> Result<T, ValidationError>
where
    T: DeserializeOwned + Validate,
{
    let parsed = T::deserialize(value)?;
    parsed.validate()?;
    Ok(parsed)
}
