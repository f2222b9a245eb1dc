//! Core lead lifecycle engine for leadflow.
//! This crate is the single source of truth for lead status invariants.

pub mod api;
pub mod clock;
pub mod config;
pub mod db;
pub mod lifecycle;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use api::LeadApi;
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ConfigError, LifecycleConfig};
pub use lifecycle::actions::{plan_action, ActionPlan, LeadAction, LifecycleError};
pub use lifecycle::transitions::{allowed_next_states, can_transition, can_transition_raw};
pub use lifecycle::validator::{validate_status_change, StatusTransitionError};
pub use logging::{default_log_level, init_logging, init_logging_with, logging_status, LogSettings};
pub use model::event::{EventId, LeadEvent, LeadEventType};
pub use model::lead::{Lead, LeadId, LeadStatus, LeadValidationError};
pub use model::outcome::{
    CallOutcome, KickstartFollowUpOutcome, KickstartOutcome, MessageOutcome, Outcome,
};
pub use model::team::{Team, TeamId, TeamValidationError};
pub use repo::lead_repo::{
    LeadFilter, LeadListQuery, LeadRepository, RepoError, RepoResult, SqliteLeadRepository,
};
pub use service::env::LifecycleEnv;
pub use service::error::{ErrorKind, LeadError, LeadResult, ValidationError};
pub use service::lead_service::{LeadService, LeadUpdate};
pub use service::notify::{LeadObserver, NoopObserver, ObserverError, SaveOptions};
pub use service::outcome_service::{
    LeadOutcomeService, LogCallRequest, LogKickstartFollowUpRequest, LogKickstartRequest,
    LogMessageOutcomeRequest, OutcomeReceipt,
};
