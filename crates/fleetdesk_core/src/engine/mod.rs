//! Pure reminder engine.
//!
//! # Responsibility
//! - Classify due dates into urgency bands.
//! - Reconcile registry snapshots into reminder lists.
//! - Derive notification candidates and merge them into the stored feed.
//! - Produce field-level change-sets for audit consumers.
//!
//! # Invariants
//! - Every function here is synchronous and free of I/O.
//! - Malformed dates degrade to `Unknown`/no-op; nothing here returns an error.
//! - "Today" is always passed in by the caller.

pub mod audit;
pub mod derive;
pub mod due_date;
pub mod feed;
pub mod reconcile;
