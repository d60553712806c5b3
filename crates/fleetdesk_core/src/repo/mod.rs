//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the reminder store and notification persistence contracts.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository writes validate vehicles before persistence.
//! - Repository APIs return semantic errors (`NotFound`, `AlreadyExists`) in
//!   addition to DB transport errors.

pub mod notification_repo;
pub mod vehicle_repo;
