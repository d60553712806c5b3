//! Notification feed aggregator.
//!
//! # Responsibility
//! - Decide which derived candidates become new notification rows.
//! - Expose stale-row selection as a separate, explicitly invoked policy.
//!
//! # Invariants
//! - A candidate is inserted only when no existing row, dismissed or not,
//!   shares its identity key.
//! - Existing rows are returned unchanged; flags are never touched here.
//! - Absence from the candidate set never removes a row.
//! - Re-running with the rows it produced yields no inserts.

use crate::engine::derive::notification_message;
use crate::model::notification::{IdentityKey, Notification, NotificationCandidate};
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// Outcome of merging candidates into the stored feed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FeedReconciliation {
    /// New rows to persist, in candidate order.
    pub to_insert: Vec<Notification>,
    /// Existing rows, untouched.
    pub unchanged: Vec<Notification>,
}

impl FeedReconciliation {
    pub fn is_noop(&self) -> bool {
        self.to_insert.is_empty()
    }
}

/// Merges `candidates` against `existing` notification rows.
pub fn reconcile_feed(
    candidates: &[NotificationCandidate],
    existing: &[Notification],
    now: DateTime<Utc>,
) -> FeedReconciliation {
    let mut known: HashSet<&IdentityKey> = existing.iter().map(|n| &n.identity_key).collect();
    let mut to_insert = Vec::new();

    for candidate in candidates {
        if !known.insert(&candidate.identity_key) {
            continue;
        }
        to_insert.push(Notification::from_candidate(
            candidate,
            notification_message(candidate),
            now,
        ));
    }

    FeedReconciliation {
        to_insert,
        unchanged: existing.to_vec(),
    }
}

/// Visible rows whose identity key is no longer among `candidates`.
///
/// Used only by explicit cleanup; generation passes never call it.
pub fn select_stale<'a>(
    candidates: &[NotificationCandidate],
    existing: &'a [Notification],
) -> Vec<&'a Notification> {
    let current: HashSet<&IdentityKey> = candidates.iter().map(|c| &c.identity_key).collect();
    existing
        .iter()
        .filter(|notification| notification.is_visible())
        .filter(|notification| !current.contains(&notification.identity_key))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{reconcile_feed, select_stale};
    use crate::engine::derive::derive_candidates;
    use crate::model::notification::{Notification, NotificationCandidate};
    use crate::model::vehicle::{Reminder, Vehicle, VehicleId};
    use chrono::{NaiveDate, TimeZone, Utc};

    fn candidates() -> Vec<NotificationCandidate> {
        let mut vehicle = Vehicle::new(VehicleId::parse("ABC-123").unwrap());
        vehicle.reminders = vec![
            Reminder::new("Insurance Renewal", "2025-05-20"),
            Reminder::new("Road Worthiness Certificate", "2025-06-05"),
        ];
        derive_candidates(&[vehicle], NaiveDate::from_ymd_opt(2025, 6, 1).unwrap())
    }

    fn now() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn first_pass_inserts_all_and_second_pass_is_noop() {
        let candidates = candidates();
        let first = reconcile_feed(&candidates, &[], now());
        assert_eq!(first.to_insert.len(), 2);
        assert!(first.to_insert.iter().all(|n| !n.is_read && !n.is_dismissed));

        let second = reconcile_feed(&candidates, &first.to_insert, now());
        assert!(second.is_noop());
        assert_eq!(second.unchanged, first.to_insert);
    }

    #[test]
    fn dismissed_rows_are_never_resurrected() {
        let candidates = candidates();
        let mut stored = reconcile_feed(&candidates, &[], now()).to_insert;
        stored[0].dismiss();

        let pass = reconcile_feed(&candidates, &stored, now());
        assert!(pass.to_insert.is_empty());
        assert!(pass.unchanged[0].is_dismissed);
    }

    #[test]
    fn read_flags_survive_regeneration() {
        let candidates = candidates();
        let mut stored = reconcile_feed(&candidates, &[], now()).to_insert;
        stored[1].mark_read();

        let pass = reconcile_feed(&candidates, &stored, now());
        assert!(pass.unchanged[1].is_read);
        assert!(!pass.unchanged[1].is_dismissed);
    }

    #[test]
    fn duplicate_candidates_insert_once() {
        let mut candidates = candidates();
        candidates.push(candidates[0].clone());
        let pass = reconcile_feed(&candidates, &[], now());
        assert_eq!(pass.to_insert.len(), 2);
    }

    #[test]
    fn rows_missing_from_candidates_are_kept_but_reported_stale() {
        let all = candidates();
        let stored: Vec<Notification> = reconcile_feed(&all, &[], now()).to_insert;

        let remaining = vec![all[0].clone()];
        let pass = reconcile_feed(&remaining, &stored, now());
        assert!(pass.to_insert.is_empty());
        assert_eq!(pass.unchanged.len(), 2);

        let stale = select_stale(&remaining, &stored);
        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].identity_key, all[1].identity_key);
    }
}
