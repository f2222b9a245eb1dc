//! Lead aggregate model.
//!
//! # Responsibility
//! - Define the canonical lead record mutated by the lifecycle engine.
//! - Define the closed status set shared by the transition table and storage.
//!
//! # Invariants
//! - `status` is always one of [`LeadStatus::ALL`].
//! - `call_count` never decreases.
//! - `follow_up_action` is empty when no follow-up is pending.
//! - `version` increases by one on every durable save.

use crate::model::team::TeamId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of a lead.
pub type LeadId = Uuid;

/// Closed status set of the lead lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    New,
    Assigned,
    CallAgain,
    Invited,
    MessageToBeSent,
    MessageSent,
    AppointmentBooked,
    AppointmentCancelled,
    StillThinking,
    BecameClient,
    Disqualified,
    Dead,
    Converted,
}

impl LeadStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [LeadStatus; 13] = [
        LeadStatus::New,
        LeadStatus::Assigned,
        LeadStatus::CallAgain,
        LeadStatus::Invited,
        LeadStatus::MessageToBeSent,
        LeadStatus::MessageSent,
        LeadStatus::AppointmentBooked,
        LeadStatus::AppointmentCancelled,
        LeadStatus::StillThinking,
        LeadStatus::BecameClient,
        LeadStatus::Disqualified,
        LeadStatus::Dead,
        LeadStatus::Converted,
    ];

    /// Storage and wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Assigned => "assigned",
            Self::CallAgain => "call_again",
            Self::Invited => "invited",
            Self::MessageToBeSent => "message_to_be_sent",
            Self::MessageSent => "message_sent",
            Self::AppointmentBooked => "appointment_booked",
            Self::AppointmentCancelled => "appointment_cancelled",
            Self::StillThinking => "still_thinking",
            Self::BecameClient => "became_client",
            Self::Disqualified => "disqualified",
            Self::Dead => "dead",
            Self::Converted => "converted",
        }
    }

    /// Parses a raw status value.
    ///
    /// Matching is case-insensitive because older external payloads used
    /// capitalized terminal states (`Dead`, `Converted`).
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
    }

    /// Terminal statuses have no legal successors.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Dead | Self::Converted)
    }
}

impl Display for LeadStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation errors for lead records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeadValidationError {
    /// Both first and last name are blank.
    MissingName,
    /// `external_ref` is present but blank.
    BlankExternalRef,
    /// Follow-up action must be a single line.
    MultilineFollowUpAction,
}

impl Display for LeadValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingName => write!(f, "lead requires a first or last name"),
            Self::BlankExternalRef => write!(f, "external_ref must not be blank when set"),
            Self::MultilineFollowUpAction => {
                write!(f, "follow_up_action must be a single line")
            }
        }
    }
}

impl Error for LeadValidationError {}

/// Canonical lead record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    pub id: LeadId,
    pub first_name: String,
    pub last_name: String,
    /// Identifier of this lead in the external CRM, unique when present.
    pub external_ref: Option<String>,
    pub status: LeadStatus,
    pub call_count: u32,
    /// Pending reminder line, e.g. `Opnieuw bellen: 11/03/2026 10:00`.
    pub follow_up_action: String,
    /// Coach notes, newest first, separated by blank lines.
    pub notes: String,
    pub team_id: Option<TeamId>,
    /// Optimistic concurrency token, managed by the repository.
    pub version: i64,
}

impl Lead {
    /// Creates a fresh lead in status `new` with a generated id.
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), first_name, last_name)
    }

    /// Creates a fresh lead with a caller-provided id.
    ///
    /// Used by intake paths where identity already exists externally.
    pub fn with_id(
        id: LeadId,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            id,
            first_name: first_name.into(),
            last_name: last_name.into(),
            external_ref: None,
            status: LeadStatus::New,
            call_count: 0,
            follow_up_action: String::new(),
            notes: String::new(),
            team_id: None,
            version: 0,
        }
    }

    /// Validates record-level invariants before persistence.
    pub fn validate(&self) -> Result<(), LeadValidationError> {
        if self.first_name.trim().is_empty() && self.last_name.trim().is_empty() {
            return Err(LeadValidationError::MissingName);
        }
        if matches!(self.external_ref.as_deref(), Some(value) if value.trim().is_empty()) {
            return Err(LeadValidationError::BlankExternalRef);
        }
        if self.follow_up_action.contains(['\n', '\r']) {
            return Err(LeadValidationError::MultilineFollowUpAction);
        }
        Ok(())
    }

    pub fn has_pending_follow_up(&self) -> bool {
        !self.follow_up_action.is_empty()
    }
}
