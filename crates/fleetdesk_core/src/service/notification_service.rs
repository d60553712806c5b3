//! Notification use-case service.
//!
//! # Responsibility
//! - Run one generation pass: derive candidates from all vehicles, merge
//!   them with stored rows and persist the new ones.
//! - Expose feed reads, read/dismiss mutations and explicit stale cleanup.
//!
//! # Invariants
//! - Generation never changes read/dismissed flags of existing rows.
//! - Generation is idempotent; a second pass with unchanged data inserts nothing.
//! - Stale rows are only dismissed by `dismiss_stale`, never by generation.

use crate::engine::derive::{derive_candidates, summarize, UrgencySummary};
use crate::engine::feed::{reconcile_feed, select_stale};
use crate::model::notification::{Notification, NotificationId};
use crate::repo::notification_repo::NotificationRepository;
use crate::repo::vehicle_repo::{RepoError, VehicleRepository};
use chrono::{DateTime, NaiveDate, Utc};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Errors from notification service operations.
#[derive(Debug)]
pub enum NotificationServiceError {
    NotificationNotFound(NotificationId),
    Repo(RepoError),
}

impl Display for NotificationServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotificationNotFound(id) => write!(f, "notification not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for NotificationServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::NotificationNotFound(_) => None,
        }
    }
}

impl From<RepoError> for NotificationServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Counters reported by one generation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationReport {
    /// Candidates derived from current reminders.
    pub candidates: usize,
    /// Rows actually written by this pass.
    pub inserted: usize,
    /// Stored rows left untouched.
    pub unchanged: usize,
}

/// Notification service facade over vehicle and notification repositories.
pub struct NotificationService<V: VehicleRepository, N: NotificationRepository> {
    vehicles: V,
    notifications: N,
}

impl<V: VehicleRepository, N: NotificationRepository> NotificationService<V, N> {
    pub fn new(vehicles: V, notifications: N) -> Self {
        Self {
            vehicles,
            notifications,
        }
    }

    /// Derives candidates for `today` and persists the ones not seen before.
    pub fn generate(
        &self,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<GenerationReport, NotificationServiceError> {
        let started_at = Instant::now();
        let vehicles = self.vehicles.list_vehicles()?;
        let candidates = derive_candidates(&vehicles, today);
        let existing = self.notifications.list_all()?;
        let merged = reconcile_feed(&candidates, &existing, now);

        // Insert-or-ignore covers a concurrent pass inserting the same keys.
        let inserted = self.notifications.insert_all(&merged.to_insert)?;

        let report = GenerationReport {
            candidates: candidates.len(),
            inserted,
            unchanged: merged.unchanged.len(),
        };
        info!(
            "event=notifications_generate module=service status=ok vehicles={} candidates={} inserted={} unchanged={} duration_ms={}",
            vehicles.len(),
            report.candidates,
            report.inserted,
            report.unchanged,
            started_at.elapsed().as_millis()
        );
        Ok(report)
    }

    /// Visible (not dismissed) notifications in feed order.
    pub fn visible_feed(&self) -> Result<Vec<Notification>, NotificationServiceError> {
        Ok(self.notifications.list_visible()?)
    }

    pub fn unread_count(&self) -> Result<u32, NotificationServiceError> {
        Ok(self.notifications.unread_count()?)
    }

    pub fn mark_read(&self, id: NotificationId) -> Result<(), NotificationServiceError> {
        self.notifications
            .mark_read(id)
            .map_err(|err| not_found_as_notification(err, id))
    }

    /// Marks every visible notification read. Returns rows changed.
    pub fn mark_all_read(&self) -> Result<usize, NotificationServiceError> {
        Ok(self.notifications.mark_all_read()?)
    }

    pub fn dismiss(&self, id: NotificationId) -> Result<(), NotificationServiceError> {
        self.notifications
            .dismiss(id)
            .map_err(|err| not_found_as_notification(err, id))
    }

    /// Dismisses visible rows whose reminder no longer produces a candidate.
    ///
    /// Explicit cleanup policy; returns the number of rows dismissed.
    pub fn dismiss_stale(&self, today: NaiveDate) -> Result<usize, NotificationServiceError> {
        let vehicles = self.vehicles.list_vehicles()?;
        let candidates = derive_candidates(&vehicles, today);
        let existing = self.notifications.list_visible()?;
        let stale = select_stale(&candidates, &existing);
        for notification in &stale {
            self.notifications.dismiss(notification.id)?;
        }
        info!(
            "event=notifications_cleanup module=service status=ok dismissed={}",
            stale.len()
        );
        Ok(stale.len())
    }

    /// Dashboard urgency counts.
    pub fn summary(&self, today: NaiveDate) -> Result<UrgencySummary, NotificationServiceError> {
        let vehicles = self.vehicles.list_vehicles()?;
        Ok(summarize(&vehicles, today))
    }
}

fn not_found_as_notification(err: RepoError, id: NotificationId) -> NotificationServiceError {
    match err {
        RepoError::NotFound(_) => NotificationServiceError::NotificationNotFound(id),
        other => NotificationServiceError::Repo(other),
    }
}
