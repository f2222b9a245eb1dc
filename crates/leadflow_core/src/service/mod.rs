//! Lifecycle use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into outcome and record-level use-cases.
//! - Keep transport layers (JSON API, CLI) decoupled from storage details.
//!
//! # Invariants
//! - Every mutation runs load -> mutate in memory -> validate -> persist.
//! - Collaborators (clock, config, observer) are injected, never global.

pub mod env;
pub mod error;
pub mod escalation;
pub mod lead_service;
pub mod notify;
pub mod outcome_service;
pub mod side_effects;
