//! Field-level change-set between two vehicle states.
//!
//! Reminders are compared by `ReminderId`, so a reminder whose fields are
//! untouched never shows up, regardless of its position.

use crate::model::vehicle::{Reminder, Vehicle};
use serde::{Deserialize, Serialize};

/// One changed field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    /// Dotted field path, e.g. `make` or `reminders[<id>].date`.
    pub field: String,
    pub before: Option<String>,
    pub after: Option<String>,
}

/// Ordered list of field changes for the audit collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    pub changes: Vec<FieldChange>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Whether `field` appears in the change-set.
    pub fn touches(&self, field: &str) -> bool {
        self.changes.iter().any(|change| change.field == field)
    }

    fn push<T: ToString>(&mut self, field: String, before: Option<T>, after: Option<T>) {
        self.changes.push(FieldChange {
            field,
            before: before.map(|v| v.to_string()),
            after: after.map(|v| v.to_string()),
        });
    }

    fn compare<T: PartialEq + ToString>(&mut self, field: String, before: Option<T>, after: Option<T>) {
        if before != after {
            self.push(field, before, after);
        }
    }
}

/// Diffs two states of the same vehicle.
pub fn diff_vehicles(before: &Vehicle, after: &Vehicle) -> ChangeSet {
    let mut set = ChangeSet::default();
    set.compare("make".to_string(), before.make.as_deref(), after.make.as_deref());
    set.compare("model".to_string(), before.model.as_deref(), after.model.as_deref());
    set.compare("year".to_string(), before.year, after.year);
    set.compare("mileage".to_string(), before.mileage, after.mileage);

    for old in &before.reminders {
        match after.reminder(old.id) {
            Some(new) => diff_reminder(&mut set, old, new),
            None => set.push(format!("reminders[{}]", old.id), Some(&old.name), None),
        }
    }
    for new in &after.reminders {
        if before.reminder(new.id).is_none() {
            set.push(format!("reminders[{}]", new.id), None, Some(&new.name));
        }
    }

    set
}

fn diff_reminder(set: &mut ChangeSet, old: &Reminder, new: &Reminder) {
    let prefix = format!("reminders[{}]", old.id);
    set.compare(format!("{prefix}.name"), Some(&old.name), Some(&new.name));
    set.compare(format!("{prefix}.kind"), Some(old.kind.as_str()), Some(new.kind.as_str()));
    set.compare(format!("{prefix}.date"), Some(&old.date), Some(&new.date));
    set.compare(format!("{prefix}.enabled"), Some(old.enabled), Some(new.enabled));
    set.compare(format!("{prefix}.notes"), old.notes.as_deref(), new.notes.as_deref());
}

#[cfg(test)]
mod tests {
    use super::diff_vehicles;
    use crate::engine::reconcile::reconcile;
    use crate::model::registry::RegistrySnapshot;
    use crate::model::vehicle::{Reminder, Vehicle, VehicleId};

    #[test]
    fn identical_states_produce_no_changes() {
        let mut vehicle = Vehicle::new(VehicleId::parse("ABC-123").unwrap());
        vehicle.make = Some("Toyota".to_string());
        vehicle.reminders.push(Reminder::new("Insurance Renewal", "2024-01-10"));
        assert!(diff_vehicles(&vehicle, &vehicle.clone()).is_empty());
    }

    #[test]
    fn reconcile_diff_lists_only_touched_fields() {
        let mut vehicle = Vehicle::new(VehicleId::parse("ABC-123").unwrap());
        vehicle.make = Some("Toyota".to_string());
        let mut insurance = Reminder::new("Insurance Renewal", "2024-01-10");
        insurance.notes = Some("broker: ACME".to_string());
        let insurance_id = insurance.id;
        vehicle.reminders.push(insurance);

        let snapshot = RegistrySnapshot {
            insurance_policy_date: Some("2025-01-10".to_string()),
            road_worthiness_date: Some("15.06.2025".to_string()),
            mileage: Some(120_000),
            ..RegistrySnapshot::default()
        };
        let after = reconcile(&vehicle, &snapshot);
        let changes = diff_vehicles(&vehicle, &after);

        assert!(changes.touches("mileage"));
        assert!(!changes.touches("make"));
        assert!(changes.touches(&format!("reminders[{insurance_id}].date")));
        assert!(!changes.touches(&format!("reminders[{insurance_id}].notes")));
        assert_eq!(changes.len(), 3);
        let added = changes.changes.last().unwrap();
        assert_eq!(added.before, None);
        assert_eq!(added.after.as_deref(), Some("Road Worthiness Certificate"));
    }
}
