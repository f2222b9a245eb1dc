//! Lead event (audit trail) model.
//!
//! # Invariants
//! - Events are immutable once recorded; storage rejects updates and deletes.
//! - `event_date` is always stored in UTC.

use crate::model::lead::{LeadId, LeadStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of a lead event.
pub type EventId = Uuid;

/// Closed set of things that can happen to a lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadEventType {
    Called,
    Invited,
    CallAgain,
    NoAnswer,
    WrongNumber,
    NotInterested,
    MessageToBeSent,
    MessageSent,
    AppointmentBooked,
    Attended,
    NoShow,
    BecameClient,
    NotConverted,
    StillThinking,
    AppointmentCancelled,
    AppointmentRescheduled,
    BecameCoach,
}

impl LeadEventType {
    pub const ALL: [LeadEventType; 17] = [
        LeadEventType::Called,
        LeadEventType::Invited,
        LeadEventType::CallAgain,
        LeadEventType::NoAnswer,
        LeadEventType::WrongNumber,
        LeadEventType::NotInterested,
        LeadEventType::MessageToBeSent,
        LeadEventType::MessageSent,
        LeadEventType::AppointmentBooked,
        LeadEventType::Attended,
        LeadEventType::NoShow,
        LeadEventType::BecameClient,
        LeadEventType::NotConverted,
        LeadEventType::StillThinking,
        LeadEventType::AppointmentCancelled,
        LeadEventType::AppointmentRescheduled,
        LeadEventType::BecameCoach,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Called => "called",
            Self::Invited => "invited",
            Self::CallAgain => "call_again",
            Self::NoAnswer => "no_answer",
            Self::WrongNumber => "wrong_number",
            Self::NotInterested => "not_interested",
            Self::MessageToBeSent => "message_to_be_sent",
            Self::MessageSent => "message_sent",
            Self::AppointmentBooked => "appointment_booked",
            Self::Attended => "attended",
            Self::NoShow => "no_show",
            Self::BecameClient => "became_client",
            Self::NotConverted => "not_converted",
            Self::StillThinking => "still_thinking",
            Self::AppointmentCancelled => "appointment_cancelled",
            Self::AppointmentRescheduled => "appointment_rescheduled",
            Self::BecameCoach => "became_coach",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|event_type| event_type.as_str() == value)
    }

    /// Human readable label used in timelines.
    pub fn label(self) -> &'static str {
        match self {
            Self::Called => "Called",
            Self::Invited => "Invited",
            Self::CallAgain => "Call Again",
            Self::NoAnswer => "No Answer",
            Self::WrongNumber => "Wrong Number",
            Self::NotInterested => "Not Interested",
            Self::MessageToBeSent => "Message To Be Sent",
            Self::MessageSent => "Message Sent",
            Self::AppointmentBooked => "Appointment Booked",
            Self::Attended => "Attended",
            Self::NoShow => "No Show",
            Self::BecameClient => "Became Client",
            Self::NotConverted => "Not Converted",
            Self::StillThinking => "Still thinking",
            Self::AppointmentCancelled => "Appointment Cancelled",
            Self::AppointmentRescheduled => "Appointment Rescheduled",
            Self::BecameCoach => "Became Coach",
        }
    }

    /// Status a lead moves to when this event is recorded.
    ///
    /// `None` means the event is status-neutral. `NoAnswer` maps to
    /// `CallAgain` here; the call processor may escalate it instead.
    pub fn resulting_status(self) -> Option<LeadStatus> {
        match self {
            Self::NoAnswer | Self::CallAgain => Some(LeadStatus::CallAgain),
            Self::WrongNumber => Some(LeadStatus::Dead),
            Self::NotInterested | Self::NotConverted => Some(LeadStatus::Disqualified),
            Self::Invited => Some(LeadStatus::Invited),
            Self::AppointmentBooked => Some(LeadStatus::AppointmentBooked),
            Self::AppointmentCancelled => Some(LeadStatus::AppointmentCancelled),
            Self::BecameClient => Some(LeadStatus::BecameClient),
            Self::StillThinking => Some(LeadStatus::StillThinking),
            Self::NoShow | Self::MessageToBeSent => Some(LeadStatus::MessageToBeSent),
            Self::MessageSent => Some(LeadStatus::MessageSent),
            Self::Called | Self::Attended | Self::AppointmentRescheduled | Self::BecameCoach => {
                None
            }
        }
    }

    /// Event recorded when a lead is moved to `status` directly.
    ///
    /// `None` for statuses the taxonomy has no marker for (`new`,
    /// `assigned`, `converted`).
    pub fn marking(status: LeadStatus) -> Option<Self> {
        match status {
            LeadStatus::CallAgain => Some(Self::CallAgain),
            LeadStatus::Invited => Some(Self::Invited),
            LeadStatus::MessageToBeSent => Some(Self::MessageToBeSent),
            LeadStatus::MessageSent => Some(Self::MessageSent),
            LeadStatus::AppointmentBooked => Some(Self::AppointmentBooked),
            LeadStatus::AppointmentCancelled => Some(Self::AppointmentCancelled),
            LeadStatus::StillThinking => Some(Self::StillThinking),
            LeadStatus::BecameClient => Some(Self::BecameClient),
            LeadStatus::Disqualified => Some(Self::NotInterested),
            LeadStatus::Dead => Some(Self::WrongNumber),
            LeadStatus::New | LeadStatus::Assigned | LeadStatus::Converted => None,
        }
    }
}

impl Display for LeadEventType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable audit record linked to one lead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadEvent {
    pub id: EventId,
    pub lead_id: LeadId,
    pub event_type: LeadEventType,
    /// When the event happened, normalized to UTC.
    pub event_date: DateTime<Utc>,
    pub note: Option<String>,
}

impl LeadEvent {
    pub fn new(lead_id: LeadId, event_type: LeadEventType, event_date: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            lead_id,
            event_type,
            event_date,
            note: None,
        }
    }

    pub fn with_note(mut self, note: Option<String>) -> Self {
        self.note = note.filter(|value| !value.trim().is_empty());
        self
    }
}
