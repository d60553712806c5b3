//! Core reminder and notification logic for FleetDesk.
//! This crate is the single source of truth for reminder, reconciliation
//! and notification invariants.

pub mod config;
pub mod db;
pub mod engine;
pub mod logging;
pub mod model;
pub mod registry;
pub mod repo;
pub mod service;

pub use config::{ConfigError, CoreConfig};
pub use engine::audit::{diff_vehicles, ChangeSet, FieldChange};
pub use engine::derive::{
    derive_candidates, notification_message, priority_for, summarize, UrgencySummary,
};
pub use engine::due_date::{classify, classify_raw, Classification, DueStatus};
pub use engine::feed::{reconcile_feed, select_stale, FeedReconciliation};
pub use engine::reconcile::{
    normalize_registry_date, reconcile, reconcile_with_report, Reconciliation,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::notification::{
    IdentityKey, Notification, NotificationCandidate, NotificationId, Priority,
};
pub use model::registry::RegistrySnapshot;
pub use model::vehicle::{
    Reminder, ReminderId, ReminderKind, Vehicle, VehicleId, VehicleValidationError,
};
pub use registry::{RegistryError, RegistryResult, RegistrySource};
pub use repo::notification_repo::{NotificationRepository, SqliteNotificationRepository};
pub use repo::vehicle_repo::{
    RepoError, RepoResult, SqliteVehicleRepository, VehicleRepository, VehicleUpdate,
};
pub use service::notification_service::{
    GenerationReport, NotificationService, NotificationServiceError,
};
pub use service::reminder_service::{ReminderService, ReminderServiceError, SnapshotApplied};
pub use service::local_today;

/// Minimal health-check API for host integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
