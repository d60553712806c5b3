//! External vehicle registry collaborator.
//!
//! # Responsibility
//! - Define the contract core expects from a registry adapter.
//! - Keep login/session/scraping details entirely outside core.
//!
//! # Invariants
//! - Unavailable data is reported as `Ok(None)` or `None` fields, never as
//!   stale or guessed values.

use crate::model::registry::RegistrySnapshot;
use crate::model::vehicle::VehicleId;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Registry adapter failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryError {
    /// Adapter id that produced the error.
    pub source_id: String,
    /// Stable machine-readable code, e.g. `session_expired`.
    pub code: String,
    pub message: String,
    /// Whether the caller may retry the same request.
    pub retryable: bool,
}

impl RegistryError {
    pub fn new(
        source_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
        retryable: bool,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            code: code.into(),
            message: message.into(),
            retryable,
        }
    }
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "registry `{}` failed ({}): {}",
            self.source_id, self.code, self.message
        )
    }
}

impl Error for RegistryError {}

pub type RegistryResult<T> = Result<T, RegistryError>;

/// Source of registry snapshots for vehicles.
pub trait RegistrySource {
    /// Stable adapter id used in logs and errors.
    fn source_id(&self) -> &str;

    /// Fetches the current snapshot for one vehicle.
    ///
    /// Returns `Ok(None)` when the registry has no record for the vehicle.
    fn fetch_snapshot(&self, vehicle_id: &VehicleId) -> RegistryResult<Option<RegistrySnapshot>>;
}
