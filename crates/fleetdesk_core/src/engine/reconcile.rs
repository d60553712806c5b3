//! Registry reconciler.
//!
//! # Responsibility
//! - Merge one registry snapshot into one vehicle's reminder list.
//! - Apply the fill-missing policy to descriptive vehicle fields.
//!
//! # Invariants
//! - Match-or-insert by `ReminderKind`; never creates a second reminder of a
//!   registry-owned kind.
//! - A matched reminder only gets `date` and `enabled` rewritten.
//! - `None`, blank or unparseable snapshot values never clear anything.
//! - `reconcile(reconcile(v, s), s) == reconcile(v, s)`.

use crate::engine::due_date::{format_canonical, parse_due_date};
use crate::model::registry::RegistrySnapshot;
use crate::model::vehicle::{Reminder, ReminderKind, Vehicle};
use chrono::NaiveDate;
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;

static DAY_MONTH_YEAR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2})([./-])(\d{1,2})([./-])(\d{4})$").expect("valid dmy date regex")
});

/// Result of one reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub vehicle: Vehicle,
    /// Kinds written by this pass (updated or appended).
    pub written: Vec<ReminderKind>,
    /// Kinds that already had more than one reminder before the pass.
    ///
    /// Only the first match in list order was updated.
    pub ambiguous: Vec<ReminderKind>,
}

/// Merges `snapshot` into `vehicle` and returns the updated vehicle.
pub fn reconcile(vehicle: &Vehicle, snapshot: &RegistrySnapshot) -> Vehicle {
    reconcile_with_report(vehicle, snapshot).vehicle
}

/// Merges `snapshot` into `vehicle` and reports what was touched.
pub fn reconcile_with_report(vehicle: &Vehicle, snapshot: &RegistrySnapshot) -> Reconciliation {
    let mut updated = vehicle.clone();
    let mut written = Vec::new();
    let mut ambiguous = Vec::new();

    for kind in ReminderKind::REGISTRY_OWNED {
        let Some(date) = snapshot_date(snapshot, kind) else {
            continue;
        };

        if updated.count_kind(kind) > 1 {
            warn!(
                "event=registry_reconcile module=engine status=ambiguous vehicle_id={} kind={} matches={}",
                updated.id,
                kind.as_str(),
                updated.count_kind(kind)
            );
            ambiguous.push(kind);
        }

        apply_registry_date(&mut updated, kind, date);
        written.push(kind);
    }

    merge_descriptive_fields(&mut updated, snapshot);

    debug!(
        "event=registry_reconcile module=engine status=ok vehicle_id={} written={} ambiguous={}",
        updated.id,
        written.len(),
        ambiguous.len()
    );

    Reconciliation {
        vehicle: updated,
        written,
        ambiguous,
    }
}

/// Converts a registry date to a calendar date.
///
/// The registry mixes formats: roadworthiness comes as day-month-year
/// (`15.06.2025`, `15/06/2025`, `15-06-2025`, one separator throughout),
/// insurance usually as ISO (`2025-06-15`, optionally with a `T` or space
/// separated time part, same rules as stored reminder dates). Returns `None`
/// for blank or unrecognized input and for impossible dates.
pub fn normalize_registry_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(date) = parse_due_date(trimmed) {
        return Some(date);
    }

    let caps = DAY_MONTH_YEAR_RE.captures(trimmed)?;
    if caps.get(2)?.as_str() != caps.get(4)?.as_str() {
        return None;
    }
    let day = caps.get(1)?.as_str().parse::<u32>().ok()?;
    let month = caps.get(3)?.as_str().parse::<u32>().ok()?;
    let year = caps.get(5)?.as_str().parse::<i32>().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn snapshot_date(snapshot: &RegistrySnapshot, kind: ReminderKind) -> Option<NaiveDate> {
    let raw = match kind {
        ReminderKind::RoadWorthiness => snapshot.road_worthiness_date.as_deref(),
        ReminderKind::Insurance => snapshot.insurance_policy_date.as_deref(),
        ReminderKind::Service | ReminderKind::Custom => None,
    }?;

    let parsed = normalize_registry_date(raw);
    if parsed.is_none() && !raw.trim().is_empty() {
        warn!(
            "event=registry_reconcile module=engine status=skipped kind={} reason=unparseable_date",
            kind.as_str()
        );
    }
    parsed
}

fn apply_registry_date(vehicle: &mut Vehicle, kind: ReminderKind, date: NaiveDate) {
    let canonical = format_canonical(date);
    match vehicle.reminders.iter_mut().find(|r| r.kind == kind) {
        Some(existing) => {
            existing.date = canonical;
            existing.enabled = true;
        }
        None => vehicle.reminders.push(Reminder::for_kind(kind, canonical)),
    }
}

fn merge_descriptive_fields(vehicle: &mut Vehicle, snapshot: &RegistrySnapshot) {
    if let Some(make) = non_blank(snapshot.make.as_deref()) {
        vehicle.make = Some(make);
    }
    if let Some(model) = non_blank(snapshot.model.as_deref()) {
        vehicle.model = Some(model);
    }
    if let Some(year) = snapshot.year {
        vehicle.year = Some(year);
    }
    if let Some(mileage) = snapshot.mileage {
        vehicle.mileage = Some(mileage);
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
