//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate engine functions and repository calls into use-case APIs.
//! - Keep CLI/host layers decoupled from storage details.
//!
//! Services receive "today" from the caller; `local_today` is the default
//! for hosts that have no injected clock.

pub mod notification_service;
pub mod reminder_service;

/// Current calendar date in the host's local time zone.
pub fn local_today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}
