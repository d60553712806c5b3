//! Notification deriver and dashboard urgency summary.
//!
//! # Invariants
//! - Only enabled reminders classified `Expired`/`ExpiringSoon` become candidates.
//! - Priority bands: expired or `<= 7` days high, `<= 14` normal, else low.
//! - The summary counts use the same windows, so
//!   `expired + due_within_week` equals the number of high candidates.
//! - Output order is deterministic for a given input and day.

use crate::engine::due_date::{classify, DueStatus, EXPIRING_SOON_WINDOW_DAYS};
use crate::model::notification::{IdentityKey, NotificationCandidate, Priority};
use crate::model::vehicle::Vehicle;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Last day offset (inclusive) that gets high priority.
pub const HIGH_PRIORITY_WINDOW_DAYS: i64 = 7;
/// Last day offset (inclusive) that gets normal priority.
pub const NORMAL_PRIORITY_WINDOW_DAYS: i64 = 14;

/// Derives ranked notification candidates from all vehicles' reminders.
pub fn derive_candidates(vehicles: &[Vehicle], today: NaiveDate) -> Vec<NotificationCandidate> {
    let mut candidates = Vec::new();

    for vehicle in vehicles {
        for reminder in vehicle.reminders.iter().filter(|r| r.enabled) {
            let Some(due_date) = reminder.due_date() else {
                continue;
            };
            let classification = classify(Some(due_date), today);
            let Some(days) = classification.days_until_due else {
                continue;
            };
            let Some(priority) = priority_for(classification.status, days) else {
                continue;
            };

            candidates.push(NotificationCandidate {
                vehicle_id: vehicle.id.clone(),
                reminder_kind: reminder.kind,
                reminder_name: reminder.name.clone(),
                due_date,
                days_until_due: days,
                status: classification.status,
                priority,
                identity_key: IdentityKey::new(&vehicle.id, reminder.kind, &reminder.name, due_date),
            });
        }
    }

    candidates.sort_by(|a, b| {
        a.priority
            .rank()
            .cmp(&b.priority.rank())
            .then(a.days_until_due.cmp(&b.days_until_due))
            .then_with(|| a.identity_key.cmp(&b.identity_key))
    });
    candidates
}

/// Maps an urgency band and day count to a feed priority.
///
/// Returns `None` for bands that never notify.
pub fn priority_for(status: DueStatus, days_until_due: i64) -> Option<Priority> {
    match status {
        DueStatus::Expired => Some(Priority::High),
        DueStatus::ExpiringSoon if days_until_due <= HIGH_PRIORITY_WINDOW_DAYS => {
            Some(Priority::High)
        }
        DueStatus::ExpiringSoon if days_until_due <= NORMAL_PRIORITY_WINDOW_DAYS => {
            Some(Priority::Normal)
        }
        DueStatus::ExpiringSoon => Some(Priority::Low),
        DueStatus::Valid | DueStatus::Unknown => None,
    }
}

/// Dashboard urgency counts over enabled reminders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrgencySummary {
    pub expired: usize,
    /// Due in `0..=7` days.
    pub due_within_week: usize,
    /// Due in `8..=30` days.
    pub due_within_month: usize,
    pub valid: usize,
    pub unknown: usize,
}

impl UrgencySummary {
    /// Reminders that need attention now: expired or due within a week.
    pub fn urgent(&self) -> usize {
        self.expired + self.due_within_week
    }
}

/// Counts enabled reminders per dashboard band.
pub fn summarize(vehicles: &[Vehicle], today: NaiveDate) -> UrgencySummary {
    let mut summary = UrgencySummary::default();
    for reminder in vehicles
        .iter()
        .flat_map(|vehicle| vehicle.reminders.iter())
        .filter(|reminder| reminder.enabled)
    {
        let classification = classify(reminder.due_date(), today);
        match (classification.status, classification.days_until_due) {
            (DueStatus::Expired, _) => summary.expired += 1,
            (DueStatus::ExpiringSoon, Some(days)) if days <= HIGH_PRIORITY_WINDOW_DAYS => {
                summary.due_within_week += 1
            }
            (DueStatus::ExpiringSoon, Some(days)) if days <= EXPIRING_SOON_WINDOW_DAYS => {
                summary.due_within_month += 1
            }
            (DueStatus::Valid, _) => summary.valid += 1,
            _ => summary.unknown += 1,
        }
    }
    summary
}

/// Human-readable feed message for one candidate.
pub fn notification_message(candidate: &NotificationCandidate) -> String {
    let days = candidate.days_until_due;
    let when = match days {
        d if d < -1 => format!("overdue by {} days", -d),
        -1 => "overdue by 1 day".to_string(),
        0 => "due today".to_string(),
        1 => "due tomorrow".to_string(),
        d => format!("due in {d} days"),
    };
    format!(
        "{} for {} is {} ({})",
        candidate.reminder_name,
        candidate.vehicle_id,
        when,
        candidate.due_date.format("%Y-%m-%d")
    )
}

#[cfg(test)]
mod tests {
    use super::{derive_candidates, notification_message, priority_for, summarize};
    use crate::engine::due_date::DueStatus;
    use crate::model::notification::Priority;
    use crate::model::vehicle::{Reminder, Vehicle, VehicleId};
    use chrono::NaiveDate;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn vehicle_with(id: &str, reminders: Vec<Reminder>) -> Vehicle {
        let mut vehicle = Vehicle::new(VehicleId::parse(id).unwrap());
        vehicle.reminders = reminders;
        vehicle
    }

    #[test]
    fn priority_band_edges() {
        assert_eq!(priority_for(DueStatus::Expired, -400), Some(Priority::High));
        assert_eq!(priority_for(DueStatus::ExpiringSoon, 0), Some(Priority::High));
        assert_eq!(priority_for(DueStatus::ExpiringSoon, 7), Some(Priority::High));
        assert_eq!(priority_for(DueStatus::ExpiringSoon, 8), Some(Priority::Normal));
        assert_eq!(priority_for(DueStatus::ExpiringSoon, 14), Some(Priority::Normal));
        assert_eq!(priority_for(DueStatus::ExpiringSoon, 15), Some(Priority::Low));
        assert_eq!(priority_for(DueStatus::ExpiringSoon, 30), Some(Priority::Low));
        assert_eq!(priority_for(DueStatus::Valid, 31), None);
        assert_eq!(priority_for(DueStatus::Unknown, 0), None);
    }

    #[test]
    fn june_first_scenario_priorities() {
        let vehicle = vehicle_with(
            "ABC-123",
            vec![
                Reminder::new("Insurance Renewal", "2025-05-20"),
                Reminder::new("Road Worthiness Certificate", "2025-06-05"),
                Reminder::new("Service Due", "2025-06-20"),
            ],
        );

        let candidates = derive_candidates(&[vehicle], today());
        assert_eq!(candidates.len(), 3);

        assert_eq!(candidates[0].days_until_due, -12);
        assert_eq!(candidates[0].status, DueStatus::Expired);
        assert_eq!(candidates[0].priority, Priority::High);

        assert_eq!(candidates[1].days_until_due, 4);
        assert_eq!(candidates[1].status, DueStatus::ExpiringSoon);
        assert_eq!(candidates[1].priority, Priority::High);

        assert_eq!(candidates[2].days_until_due, 19);
        assert_eq!(candidates[2].priority, Priority::Low);
    }

    #[test]
    fn disabled_valid_and_unknown_reminders_never_notify() {
        let mut disabled = Reminder::new("Insurance Renewal", "2025-05-20");
        disabled.enabled = false;
        let vehicle = vehicle_with(
            "ABC-123",
            vec![
                disabled,
                Reminder::new("Service Due", "2025-09-01"),
                Reminder::new("Tyres", "next spring"),
                Reminder::new("Wipers", ""),
            ],
        );

        assert!(derive_candidates(&[vehicle], today()).is_empty());
    }

    #[test]
    fn identity_key_is_stable_as_days_advance() {
        let vehicle = vehicle_with("ABC-123", vec![Reminder::new("Insurance Renewal", "2025-06-20")]);
        let early = derive_candidates(std::slice::from_ref(&vehicle), today());
        let later = derive_candidates(&[vehicle], NaiveDate::from_ymd_opt(2025, 6, 18).unwrap());

        assert_eq!(early[0].identity_key, later[0].identity_key);
        assert_ne!(early[0].days_until_due, later[0].days_until_due);
        assert_ne!(early[0].priority, later[0].priority);
    }

    #[test]
    fn summary_urgent_count_matches_high_priority_candidates() {
        let vehicles = vec![
            vehicle_with(
                "ABC-123",
                vec![
                    Reminder::new("Insurance Renewal", "2025-05-20"),
                    Reminder::new("Road Worthiness Certificate", "2025-06-08"),
                    Reminder::new("Service Due", "2025-06-09"),
                ],
            ),
            vehicle_with(
                "XYZ-9",
                vec![
                    Reminder::new("Insurance Renewal", "2025-06-01"),
                    Reminder::new("Road Worthiness Certificate", "2025-07-01"),
                    Reminder::new("Service Due", "2025-07-02"),
                    Reminder::new("Tyres", "tbd"),
                ],
            ),
        ];

        let summary = summarize(&vehicles, today());
        assert_eq!(summary.expired, 1);
        assert_eq!(summary.due_within_week, 2);
        assert_eq!(summary.due_within_month, 2);
        assert_eq!(summary.valid, 1);
        assert_eq!(summary.unknown, 1);

        let high = derive_candidates(&vehicles, today())
            .iter()
            .filter(|candidate| candidate.priority == Priority::High)
            .count();
        assert_eq!(summary.urgent(), high);
    }

    #[test]
    fn message_describes_overdue_and_upcoming() {
        let vehicle = vehicle_with(
            "ABC-123",
            vec![
                Reminder::new("Insurance Renewal", "2025-05-20"),
                Reminder::new("Service Due", "2025-06-01"),
            ],
        );
        let candidates = derive_candidates(&[vehicle], today());
        assert_eq!(
            notification_message(&candidates[0]),
            "Insurance Renewal for ABC-123 is overdue by 12 days (2025-05-20)"
        );
        assert_eq!(
            notification_message(&candidates[1]),
            "Service Due for ABC-123 is due today (2025-06-01)"
        );
    }
}
