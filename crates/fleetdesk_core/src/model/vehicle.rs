//! Vehicle and reminder domain model.
//!
//! # Responsibility
//! - Define the vehicle record and its ordered reminder list.
//! - Provide reminder lookup and upsert helpers used by the reminder store.
//!
//! # Invariants
//! - `VehicleId` is trimmed and never empty.
//! - At most one reminder per registry-owned kind is created by upsert.
//! - Custom reminders are matched by `ReminderId` only, never by name.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for reminders inside one vehicle's list.
pub type ReminderId = Uuid;

/// Validation errors for vehicle/reminder invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VehicleValidationError {
    /// Vehicle id is blank after trim.
    EmptyVehicleId,
    /// Reminder id is the nil UUID.
    NilReminderId,
    /// Two reminders share the same id.
    DuplicateReminderId(ReminderId),
    /// A `Custom` reminder carries the label of a registry-owned kind.
    RegistryLabelOnCustom(ReminderId),
}

impl Display for VehicleValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyVehicleId => write!(f, "vehicle id must not be blank"),
            Self::NilReminderId => write!(f, "reminder id must not be nil"),
            Self::DuplicateReminderId(id) => write!(f, "duplicate reminder id: {id}"),
            Self::RegistryLabelOnCustom(id) => {
                write!(f, "custom reminder {id} uses a registry-owned label")
            }
        }
    }
}

impl Error for VehicleValidationError {}

/// Plate or fleet identifier of a vehicle.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VehicleId(String);

impl VehicleId {
    /// Builds a vehicle id from user or registry input.
    ///
    /// Surrounding whitespace is trimmed; blank input is rejected.
    pub fn parse(value: impl AsRef<str>) -> Result<Self, VehicleValidationError> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            return Err(VehicleValidationError::EmptyVehicleId);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for VehicleId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for VehicleId {
    type Error = VehicleValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<VehicleId> for String {
    fn from(value: VehicleId) -> Self {
        value.0
    }
}

/// Tagged reminder kind.
///
/// Matching during registry reconciliation uses this tag; the display
/// label on [`Reminder::name`] is never a matching key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderKind {
    /// Insurance policy renewal. Supplied by the registry.
    Insurance,
    /// Roadworthiness certificate expiry. Supplied by the registry.
    RoadWorthiness,
    /// Periodic service. Entered by users only.
    Service,
    /// Arbitrary user-defined label.
    Custom,
}

impl ReminderKind {
    /// Kinds the external registry can supply dates for.
    pub const REGISTRY_OWNED: [ReminderKind; 2] =
        [ReminderKind::RoadWorthiness, ReminderKind::Insurance];

    /// Whether the registry reconciler owns the date of this kind.
    pub fn is_registry_owned(self) -> bool {
        matches!(self, Self::Insurance | Self::RoadWorthiness)
    }

    /// Canonical display label for well-known kinds.
    pub fn default_label(self) -> Option<&'static str> {
        match self {
            Self::Insurance => Some("Insurance Renewal"),
            Self::RoadWorthiness => Some("Road Worthiness Certificate"),
            Self::Service => Some("Service Due"),
            Self::Custom => None,
        }
    }

    /// Maps a free-text label to a kind.
    ///
    /// Recognizes canonical labels and the short forms found in older data.
    /// Anything else is `Custom`.
    pub fn from_label(label: &str) -> Self {
        let normalized = normalize_label(label);
        match normalized.as_str() {
            "insurance renewal" | "insurance" | "insurance policy" => Self::Insurance,
            "road worthiness certificate"
            | "roadworthiness certificate"
            | "road worthiness"
            | "roadworthiness"
            | "rwc" => Self::RoadWorthiness,
            "service due" | "service" | "next service" => Self::Service,
            _ => Self::Custom,
        }
    }

    /// Stable storage tag.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Insurance => "insurance",
            Self::RoadWorthiness => "road_worthiness",
            Self::Service => "service",
            Self::Custom => "custom",
        }
    }

    /// Parses a storage tag written by [`ReminderKind::as_str`].
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "insurance" => Some(Self::Insurance),
            "road_worthiness" => Some(Self::RoadWorthiness),
            "service" => Some(Self::Service),
            "custom" => Some(Self::Custom),
            _ => None,
        }
    }
}

/// Lowercases and collapses whitespace in a label.
pub fn normalize_label(label: &str) -> String {
    label
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// One due-date obligation attached to a vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    /// Explicit identity, used to address user-defined reminders.
    pub id: ReminderId,
    /// Tagged kind used for matching.
    pub kind: ReminderKind,
    /// Display label as shown to users.
    pub name: String,
    /// Due date as entered. Canonical form is `YYYY-MM-DD`.
    pub date: String,
    pub enabled: bool,
    /// Free-text notes. Never touched by registry reconciliation.
    pub notes: Option<String>,
}

impl Reminder {
    /// Creates an enabled reminder, inferring its kind from `name`.
    pub fn new(name: impl Into<String>, date: impl Into<String>) -> Self {
        let name = name.into();
        let kind = ReminderKind::from_label(&name);
        Self {
            id: Uuid::new_v4(),
            kind,
            name,
            date: date.into(),
            enabled: true,
            notes: None,
        }
    }

    /// Creates an enabled reminder of a well-known kind with its canonical label.
    pub fn for_kind(kind: ReminderKind, date: impl Into<String>) -> Self {
        let name = kind.default_label().unwrap_or("Reminder").to_string();
        Self {
            id: Uuid::new_v4(),
            kind,
            name,
            date: date.into(),
            enabled: true,
            notes: None,
        }
    }

    /// Parsed due date, or `None` when the stored value is blank or malformed.
    pub fn due_date(&self) -> Option<chrono::NaiveDate> {
        crate::engine::due_date::parse_due_date(&self.date)
    }
}

/// Vehicle record with descriptive fields and reminders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: VehicleId,
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub mileage: Option<u32>,
    /// Ordered reminder list. Order is preserved across reconciliation.
    pub reminders: Vec<Reminder>,
}

impl Vehicle {
    /// Creates a vehicle with no descriptive fields and no reminders.
    pub fn new(id: VehicleId) -> Self {
        Self {
            id,
            make: None,
            model: None,
            year: None,
            mileage: None,
            reminders: Vec::new(),
        }
    }

    /// Validates reminder identity invariants.
    ///
    /// A `Custom` reminder labelled like a registry-owned kind is rejected,
    /// since the reconciler would never match it and would append a twin.
    pub fn validate(&self) -> Result<(), VehicleValidationError> {
        let mut seen = std::collections::HashSet::new();
        for reminder in &self.reminders {
            if reminder.id.is_nil() {
                return Err(VehicleValidationError::NilReminderId);
            }
            if !seen.insert(reminder.id) {
                return Err(VehicleValidationError::DuplicateReminderId(reminder.id));
            }
            if reminder.kind == ReminderKind::Custom
                && ReminderKind::from_label(&reminder.name).is_registry_owned()
            {
                return Err(VehicleValidationError::RegistryLabelOnCustom(reminder.id));
            }
        }
        Ok(())
    }

    /// First reminder of `kind` in list order.
    pub fn find_reminder(&self, kind: ReminderKind) -> Option<&Reminder> {
        self.reminders.iter().find(|reminder| reminder.kind == kind)
    }

    /// First reminder whose label matches `name`, ignoring case and spacing.
    pub fn find_reminder_by_name(&self, name: &str) -> Option<&Reminder> {
        let wanted = normalize_label(name);
        self.reminders
            .iter()
            .find(|reminder| normalize_label(&reminder.name) == wanted)
    }

    /// Looks up one reminder by explicit id.
    pub fn reminder(&self, id: ReminderId) -> Option<&Reminder> {
        self.reminders.iter().find(|reminder| reminder.id == id)
    }

    /// Number of reminders of `kind`.
    pub fn count_kind(&self, kind: ReminderKind) -> usize {
        self.reminders
            .iter()
            .filter(|reminder| reminder.kind == kind)
            .count()
    }

    /// Inserts or replaces one reminder.
    ///
    /// A `Custom` reminder whose label names a well-known kind is promoted
    /// to that kind first. Match order:
    /// 1. same `id` → replaced in place, unless the reminder was renamed into
    ///    a registry-owned kind another reminder already holds; then that
    ///    reminder is replaced (keeping its id) and the renamed one removed;
    /// 2. registry-owned kind → first reminder of that kind replaced in place,
    ///    keeping its id;
    /// 3. otherwise appended.
    ///
    /// Returns the id of the stored reminder.
    pub fn upsert_reminder(&mut self, mut reminder: Reminder) -> ReminderId {
        if reminder.kind == ReminderKind::Custom {
            reminder.kind = ReminderKind::from_label(&reminder.name);
        }

        let incoming = reminder.id;
        let by_id = self.reminders.iter().position(|r| r.id == incoming);
        let kind_owner = if reminder.kind.is_registry_owned() {
            self.reminders.iter().position(|r| r.kind == reminder.kind)
        } else {
            None
        };

        match (by_id, kind_owner) {
            (Some(slot), Some(owner))
                if owner != slot && self.reminders[slot].kind != reminder.kind =>
            {
                let id = self.reminders[owner].id;
                self.reminders[owner] = Reminder { id, ..reminder };
                self.reminders.remove(slot);
                id
            }
            (Some(slot), _) => {
                self.reminders[slot] = reminder;
                incoming
            }
            (None, Some(owner)) => {
                let id = self.reminders[owner].id;
                self.reminders[owner] = Reminder { id, ..reminder };
                id
            }
            (None, None) => {
                self.reminders.push(reminder);
                incoming
            }
        }
    }

    /// Removes one reminder by id. Returns whether anything was removed.
    pub fn remove_reminder(&mut self, id: ReminderId) -> bool {
        let before = self.reminders.len();
        self.reminders.retain(|reminder| reminder.id != id);
        self.reminders.len() != before
    }
}
