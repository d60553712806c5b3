//! Reminder use-case service.
//!
//! # Responsibility
//! - Provide vehicle/reminder entry points for callers.
//! - Apply registry snapshots as one serialized read-modify-write.
//! - Hand back the field-level change-set for the audit collaborator.
//!
//! # Invariants
//! - Reconciliation runs inside `VehicleRepository::modify_vehicle`, never
//!   as a separate read followed by a separate write.
//! - A registry that has no data for a vehicle causes no write.

use crate::engine::audit::{diff_vehicles, ChangeSet};
use crate::engine::reconcile::reconcile_with_report;
use crate::model::registry::RegistrySnapshot;
use crate::model::vehicle::{Reminder, ReminderId, ReminderKind, Vehicle, VehicleId};
use crate::registry::{RegistryError, RegistrySource};
use crate::repo::vehicle_repo::{RepoError, VehicleRepository};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Errors from reminder service operations.
#[derive(Debug)]
pub enum ReminderServiceError {
    VehicleNotFound(VehicleId),
    VehicleAlreadyExists(VehicleId),
    Registry(RegistryError),
    Repo(RepoError),
}

impl Display for ReminderServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::VehicleNotFound(id) => write!(f, "vehicle not found: {id}"),
            Self::VehicleAlreadyExists(id) => write!(f, "vehicle already exists: {id}"),
            Self::Registry(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ReminderServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Registry(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RegistryError> for ReminderServiceError {
    fn from(value: RegistryError) -> Self {
        Self::Registry(value)
    }
}

impl From<RepoError> for ReminderServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Result of applying one registry snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotApplied {
    /// Vehicle state after reconciliation, as persisted.
    pub vehicle: Vehicle,
    /// Field-level changes for the audit log. Empty when nothing changed.
    pub changes: ChangeSet,
    /// Kinds that had legacy duplicates; only the first match was updated.
    pub ambiguous: Vec<ReminderKind>,
}

/// Reminder service facade over a vehicle repository.
pub struct ReminderService<R: VehicleRepository> {
    repo: R,
}

impl<R: VehicleRepository> ReminderService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Registers a new vehicle.
    pub fn add_vehicle(&self, vehicle: &Vehicle) -> Result<(), ReminderServiceError> {
        self.repo.create_vehicle(vehicle).map_err(|err| match err {
            RepoError::AlreadyExists(_) => {
                ReminderServiceError::VehicleAlreadyExists(vehicle.id.clone())
            }
            other => other.into(),
        })
    }

    /// Gets one vehicle with its reminders.
    pub fn get_vehicle(&self, id: &VehicleId) -> Result<Vehicle, ReminderServiceError> {
        self.repo
            .get_vehicle(id)?
            .ok_or_else(|| ReminderServiceError::VehicleNotFound(id.clone()))
    }

    pub fn list_vehicles(&self) -> Result<Vec<Vehicle>, ReminderServiceError> {
        Ok(self.repo.list_vehicles()?)
    }

    /// Inserts or replaces one reminder on a vehicle.
    pub fn upsert_reminder(
        &self,
        id: &VehicleId,
        reminder: Reminder,
    ) -> Result<ReminderId, ReminderServiceError> {
        self.repo
            .upsert_reminder(id, reminder)
            .map_err(|err| not_found_as_vehicle(err, id))
    }

    /// Looks up a reminder by display label.
    pub fn find_reminder_by_name(
        &self,
        id: &VehicleId,
        name: &str,
    ) -> Result<Option<Reminder>, ReminderServiceError> {
        self.repo
            .find_reminder_by_name(id, name)
            .map_err(|err| not_found_as_vehicle(err, id))
    }

    /// Removes one reminder. Only explicit user action deletes reminders.
    pub fn remove_reminder(
        &self,
        id: &VehicleId,
        reminder_id: ReminderId,
    ) -> Result<bool, ReminderServiceError> {
        let mut removed = false;
        self.repo
            .modify_vehicle(id, &mut |current| {
                let mut next = current.clone();
                removed = next.remove_reminder(reminder_id);
                next
            })
            .map_err(|err| not_found_as_vehicle(err, id))?;
        Ok(removed)
    }

    /// Merges a registry snapshot into the stored vehicle.
    pub fn apply_snapshot(
        &self,
        id: &VehicleId,
        snapshot: &RegistrySnapshot,
    ) -> Result<SnapshotApplied, ReminderServiceError> {
        let started_at = Instant::now();
        let mut ambiguous = Vec::new();
        let update = self
            .repo
            .modify_vehicle(id, &mut |current| {
                let report = reconcile_with_report(current, snapshot);
                ambiguous = report.ambiguous;
                report.vehicle
            })
            .map_err(|err| not_found_as_vehicle(err, id))?;

        let changes = diff_vehicles(&update.before, &update.after);
        if !ambiguous.is_empty() {
            warn!(
                "event=snapshot_apply module=service status=ambiguous vehicle_id={} kinds={}",
                id,
                ambiguous.len()
            );
        }
        info!(
            "event=snapshot_apply module=service status=ok vehicle_id={} changes={} duration_ms={}",
            id,
            changes.len(),
            started_at.elapsed().as_millis()
        );

        Ok(SnapshotApplied {
            vehicle: update.after,
            changes,
            ambiguous,
        })
    }

    /// Fetches a snapshot from `source` and applies it.
    ///
    /// Returns `Ok(None)` when the registry has no record for the vehicle.
    pub fn sync_from_registry(
        &self,
        source: &dyn RegistrySource,
        id: &VehicleId,
    ) -> Result<Option<SnapshotApplied>, ReminderServiceError> {
        let snapshot = match source.fetch_snapshot(id) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(
                    "event=registry_fetch module=service status=error source={} vehicle_id={} code={} retryable={}",
                    source.source_id(),
                    id,
                    err.code,
                    err.retryable
                );
                return Err(err.into());
            }
        };

        let Some(snapshot) = snapshot else {
            info!(
                "event=registry_fetch module=service status=empty source={} vehicle_id={}",
                source.source_id(),
                id
            );
            return Ok(None);
        };

        self.apply_snapshot(id, &snapshot).map(Some)
    }
}

fn not_found_as_vehicle(err: RepoError, id: &VehicleId) -> ReminderServiceError {
    match err {
        RepoError::NotFound(_) => ReminderServiceError::VehicleNotFound(id.clone()),
        other => ReminderServiceError::Repo(other),
    }
}
