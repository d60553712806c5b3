//! Notification candidates and persisted notifications.
//!
//! # Responsibility
//! - Define the ephemeral candidate shape produced by the deriver.
//! - Define the persisted notification row with read/dismissed flags.
//!
//! # Invariants
//! - `IdentityKey` is a pure function of (vehicle, kind, due date).
//! - A dismissed notification is never un-dismissed by core code.

use crate::engine::due_date::DueStatus;
use crate::model::vehicle::{normalize_label, ReminderKind, VehicleId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of a persisted notification row.
pub type NotificationId = Uuid;

/// Feed priority derived from urgency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Normal,
    Low,
}

impl Priority {
    /// Sort rank; lower is more urgent.
    pub fn rank(self) -> u8 {
        match self {
            Self::High => 0,
            Self::Normal => 1,
            Self::Low => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Normal => "normal",
            Self::Low => "low",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "high" => Some(Self::High),
            "normal" => Some(Self::Normal),
            "low" => Some(Self::Low),
            _ => None,
        }
    }
}

/// Deduplication key of one due-date instance of one reminder on one vehicle.
///
/// Format: `{vehicle_id}|{kind_key}|{YYYY-MM-DD}` where `kind_key` is the
/// kind tag, or `custom:{normalized name}` for user-defined reminders.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityKey(String);

impl IdentityKey {
    pub fn new(vehicle_id: &VehicleId, kind: ReminderKind, name: &str, due_date: NaiveDate) -> Self {
        let kind_key = match kind {
            ReminderKind::Custom => format!("custom:{}", normalize_label(name)),
            other => other.as_str().to_string(),
        };
        Self(format!(
            "{}|{}|{}",
            vehicle_id.as_str(),
            kind_key,
            due_date.format("%Y-%m-%d")
        ))
    }

    /// Wraps a key loaded from storage.
    pub fn from_stored(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for IdentityKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Transient notification recomputed on every generation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationCandidate {
    pub vehicle_id: VehicleId,
    pub reminder_kind: ReminderKind,
    pub reminder_name: String,
    pub due_date: NaiveDate,
    /// Negative when overdue.
    pub days_until_due: i64,
    pub status: DueStatus,
    pub priority: Priority,
    pub identity_key: IdentityKey,
}

/// Persisted notification row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub vehicle_id: VehicleId,
    pub reminder_kind: ReminderKind,
    pub reminder_name: String,
    pub due_date: NaiveDate,
    /// Days until due at creation time.
    pub days_until_due: i64,
    pub status: DueStatus,
    pub priority: Priority,
    pub identity_key: IdentityKey,
    pub message: String,
    pub is_read: bool,
    pub is_dismissed: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Builds an unread, visible notification from a candidate.
    pub fn from_candidate(
        candidate: &NotificationCandidate,
        message: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            vehicle_id: candidate.vehicle_id.clone(),
            reminder_kind: candidate.reminder_kind,
            reminder_name: candidate.reminder_name.clone(),
            due_date: candidate.due_date,
            days_until_due: candidate.days_until_due,
            status: candidate.status,
            priority: candidate.priority,
            identity_key: candidate.identity_key.clone(),
            message: message.into(),
            is_read: false,
            is_dismissed: false,
            created_at,
        }
    }

    /// Whether the row is still shown in the feed.
    pub fn is_visible(&self) -> bool {
        !self.is_dismissed
    }

    pub fn mark_read(&mut self) {
        self.is_read = true;
    }

    /// Hides the row from the feed. Dismissal also implies read.
    pub fn dismiss(&mut self) {
        self.is_dismissed = true;
        self.is_read = true;
    }
}
