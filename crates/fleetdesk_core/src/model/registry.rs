//! External registry snapshot.
//!
//! A snapshot is read-only input fetched for one vehicle. It carries no
//! identity of its own and is never persisted as-is.

use serde::{Deserialize, Serialize};

/// Vehicle data returned by the external registry.
///
/// Every field is optional: `None` means "no information", never "clear".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrySnapshot {
    /// Day-month-year string, e.g. `15.06.2025`.
    pub road_worthiness_date: Option<String>,
    /// ISO date, e.g. `2025-06-15`.
    pub insurance_policy_date: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub mileage: Option<u32>,
}
