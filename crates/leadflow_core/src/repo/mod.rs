//! Repository layer abstractions and SQLite persistence.
//!
//! # Responsibility
//! - Define the entity-store contract consumed by lifecycle services.
//! - Keep SQL details out of service orchestration.
//!
//! # Invariants
//! - Lead writes call `Lead::validate()` before SQL mutations.
//! - A lead save and the events it carries commit in one transaction.
//! - Saves are optimistic: a stale `version` is a conflict, never an overwrite.

pub mod event_repo;
pub mod lead_repo;
pub mod team_repo;
