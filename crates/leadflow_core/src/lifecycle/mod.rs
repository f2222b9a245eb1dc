//! Lead lifecycle state machine.
//!
//! # Responsibility
//! - Own the static transition table (single source of truth for legality).
//! - Guard record-update status mutations through the status validator.
//! - Dispatch named lifecycle capabilities per current status.
//!
//! # Invariants
//! - Self transitions are always legal.
//! - `dead` and `converted` are terminal.
//! - Unknown raw statuses have no legal successors (fail closed).

pub mod actions;
pub mod transitions;
pub mod validator;
