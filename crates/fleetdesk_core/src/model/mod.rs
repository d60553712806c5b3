//! Domain model for vehicles, reminders and notifications.
//!
//! # Responsibility
//! - Define canonical data structures used by the reminder engine.
//! - Keep display labels separate from the tagged kinds used for matching.
//!
//! # Invariants
//! - Every vehicle is identified by a stable, trimmed, non-empty `VehicleId`.
//! - Reminder dates are kept as entered; parsing happens at classification.
//! - Notification identity never depends on the current date.

pub mod notification;
pub mod registry;
pub mod vehicle;
