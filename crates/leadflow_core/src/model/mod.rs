//! Domain model for the lead lifecycle.
//!
//! # Responsibility
//! - Define the lead aggregate, its immutable event records and the owning team.
//! - Define the closed taxonomies (statuses, event types, external outcomes).
//!
//! # Invariants
//! - Every status, event type and outcome is a member of a closed enum; raw
//!   strings are only accepted through the `parse` helpers.
//! - Leads are never hard deleted; terminal statuses end their lifecycle.

pub mod event;
pub mod lead;
pub mod outcome;
pub mod team;
