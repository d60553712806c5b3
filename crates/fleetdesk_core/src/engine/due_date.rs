//! Due-date classifier.
//!
//! # Invariants
//! - Comparison is at calendar-day granularity; time of day is ignored.
//! - `days < 0` is expired, `0..=30` expiring soon, `> 30` valid.
//! - Absent or malformed input classifies as `Unknown` with no day count.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Last day offset (inclusive) that still counts as expiring soon.
pub const EXPIRING_SOON_WINDOW_DAYS: i64 = 30;

static ISO_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})(?:[T ].*)?$").expect("valid iso date regex")
});

/// Urgency band of a due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DueStatus {
    Expired,
    ExpiringSoon,
    Valid,
    Unknown,
}

impl DueStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Expired => "expired",
            Self::ExpiringSoon => "expiring_soon",
            Self::Valid => "valid",
            Self::Unknown => "unknown",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "expired" => Some(Self::Expired),
            "expiring_soon" => Some(Self::ExpiringSoon),
            "valid" => Some(Self::Valid),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }

    /// Whether reminders in this band produce notification candidates.
    pub fn is_actionable(self) -> bool {
        matches!(self, Self::Expired | Self::ExpiringSoon)
    }
}

/// Classification result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    /// Signed calendar days from today; `None` when the date is unknown.
    pub days_until_due: Option<i64>,
    pub status: DueStatus,
}

impl Classification {
    pub const UNKNOWN: Classification = Classification {
        days_until_due: None,
        status: DueStatus::Unknown,
    };
}

/// Classifies an optional due date relative to `today`.
pub fn classify(date: Option<NaiveDate>, today: NaiveDate) -> Classification {
    let Some(date) = date else {
        return Classification::UNKNOWN;
    };

    let days = date.signed_duration_since(today).num_days();
    let status = if days < 0 {
        DueStatus::Expired
    } else if days <= EXPIRING_SOON_WINDOW_DAYS {
        DueStatus::ExpiringSoon
    } else {
        DueStatus::Valid
    };

    Classification {
        days_until_due: Some(days),
        status,
    }
}

/// Classifies a raw stored date string.
pub fn classify_raw(raw: &str, today: NaiveDate) -> Classification {
    classify(parse_due_date(raw), today)
}

/// Parses a stored reminder date.
///
/// Accepts `YYYY-MM-DD`, optionally followed by a `T`/space separated time
/// part which is discarded. Returns `None` for anything else, including
/// impossible calendar dates.
pub fn parse_due_date(raw: &str) -> Option<NaiveDate> {
    let caps = ISO_DATE_RE.captures(raw.trim())?;
    let year = caps.get(1)?.as_str().parse::<i32>().ok()?;
    let month = caps.get(2)?.as_str().parse::<u32>().ok()?;
    let day = caps.get(3)?.as_str().parse::<u32>().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Canonical storage form of a date.
pub fn format_canonical(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::{classify, classify_raw, parse_due_date, DueStatus};
    use chrono::{Days, NaiveDate};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    #[test]
    fn today_is_expiring_soon_with_zero_days() {
        let result = classify(Some(today()), today());
        assert_eq!(result.days_until_due, Some(0));
        assert_eq!(result.status, DueStatus::ExpiringSoon);
    }

    #[test]
    fn yesterday_is_expired() {
        let result = classify(today().checked_sub_days(Days::new(1)), today());
        assert_eq!(result.days_until_due, Some(-1));
        assert_eq!(result.status, DueStatus::Expired);
    }

    #[test]
    fn thirty_day_boundary_is_inclusive() {
        let at_edge = classify(today().checked_add_days(Days::new(30)), today());
        assert_eq!(at_edge.status, DueStatus::ExpiringSoon);

        let past_edge = classify(today().checked_add_days(Days::new(31)), today());
        assert_eq!(past_edge.days_until_due, Some(31));
        assert_eq!(past_edge.status, DueStatus::Valid);
    }

    #[test]
    fn missing_and_malformed_dates_are_unknown() {
        assert_eq!(classify(None, today()).status, DueStatus::Unknown);
        for raw in ["", "   ", "soon", "2025-13-01", "2025-02-30", "15.06.2025"] {
            let result = classify_raw(raw, today());
            assert_eq!(result.status, DueStatus::Unknown, "input `{raw}`");
            assert_eq!(result.days_until_due, None);
        }
    }

    #[test]
    fn only_expired_and_expiring_soon_are_actionable() {
        assert!(DueStatus::Expired.is_actionable());
        assert!(DueStatus::ExpiringSoon.is_actionable());
        assert!(!DueStatus::Valid.is_actionable());
        assert!(!DueStatus::Unknown.is_actionable());
        assert_eq!(DueStatus::parse("expiring_soon"), Some(DueStatus::ExpiringSoon));
    }

    #[test]
    fn time_of_day_suffix_is_ignored() {
        assert_eq!(
            parse_due_date("2025-06-01T23:59:59Z"),
            NaiveDate::from_ymd_opt(2025, 6, 1)
        );
        let result = classify_raw(" 2025-06-01 08:30 ", today());
        assert_eq!(result.days_until_due, Some(0));
    }
}
