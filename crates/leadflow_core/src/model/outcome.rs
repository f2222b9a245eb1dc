//! Externally supplied outcome codes.
//!
//! # Responsibility
//! - Define the closed outcome sets accepted from the UI and CRM webhooks.
//! - Map each outcome to the ordered list of events it records.
//!
//! # Invariants
//! - Event order matters: composite outcomes record the contact marker
//!   (`called`, `attended`) before the result event.

use crate::model::event::LeadEventType;
use serde::{Deserialize, Serialize};

/// Shared contract of every outcome taxonomy.
pub trait Outcome: Copy + Sized {
    /// Name used in validation messages, e.g. `call`.
    const KIND: &'static str;

    fn parse(value: &str) -> Option<Self>;
    fn as_str(self) -> &'static str;
    /// Events recorded for this outcome, in order.
    fn events(self) -> &'static [LeadEventType];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallOutcome {
    Called,
    Invited,
    CallAgain,
    NoAnswer,
    WrongNumber,
    NotInterested,
}

impl Outcome for CallOutcome {
    const KIND: &'static str = "call";

    fn parse(value: &str) -> Option<Self> {
        match value {
            "called" => Some(Self::Called),
            "invited" => Some(Self::Invited),
            "call_again" => Some(Self::CallAgain),
            "no_answer" => Some(Self::NoAnswer),
            "wrong_number" => Some(Self::WrongNumber),
            "not_interested" => Some(Self::NotInterested),
            _ => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Called => "called",
            Self::Invited => "invited",
            Self::CallAgain => "call_again",
            Self::NoAnswer => "no_answer",
            Self::WrongNumber => "wrong_number",
            Self::NotInterested => "not_interested",
        }
    }

    fn events(self) -> &'static [LeadEventType] {
        use LeadEventType as E;
        match self {
            Self::Called => &[E::Called],
            Self::Invited => &[E::Called, E::Invited],
            Self::CallAgain => &[E::Called, E::CallAgain],
            Self::NoAnswer => &[E::Called, E::NoAnswer],
            Self::WrongNumber => &[E::Called, E::WrongNumber],
            Self::NotInterested => &[E::Called, E::NotInterested],
        }
    }
}

impl CallOutcome {
    /// Outcomes that keep the lead in the call-retry loop.
    pub fn keeps_calling(self) -> bool {
        matches!(self, Self::CallAgain | Self::NoAnswer)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KickstartOutcome {
    BecameClient,
    NoShow,
    NotConverted,
    StillThinking,
}

impl Outcome for KickstartOutcome {
    const KIND: &'static str = "kickstart";

    fn parse(value: &str) -> Option<Self> {
        match value {
            "became_client" => Some(Self::BecameClient),
            "no_show" => Some(Self::NoShow),
            "not_converted" => Some(Self::NotConverted),
            "still_thinking" => Some(Self::StillThinking),
            _ => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::BecameClient => "became_client",
            Self::NoShow => "no_show",
            Self::NotConverted => "not_converted",
            Self::StillThinking => "still_thinking",
        }
    }

    fn events(self) -> &'static [LeadEventType] {
        use LeadEventType as E;
        match self {
            Self::BecameClient => &[E::Attended, E::BecameClient],
            Self::NoShow => &[E::NoShow],
            Self::NotConverted => &[E::Attended, E::NotConverted],
            Self::StillThinking => &[E::Attended, E::StillThinking],
        }
    }
}

/// Outcome of the follow-up call after a `still_thinking` kickstart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KickstartFollowUpOutcome {
    BecameClient,
    NotConverted,
}

impl Outcome for KickstartFollowUpOutcome {
    const KIND: &'static str = "kickstart follow-up";

    fn parse(value: &str) -> Option<Self> {
        match value {
            "became_client" => Some(Self::BecameClient),
            "not_converted" => Some(Self::NotConverted),
            _ => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::BecameClient => "became_client",
            Self::NotConverted => "not_converted",
        }
    }

    fn events(self) -> &'static [LeadEventType] {
        match self {
            Self::BecameClient => &[LeadEventType::BecameClient],
            Self::NotConverted => &[LeadEventType::NotConverted],
        }
    }
}

/// Outcome reported after a message was sent to the lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageOutcome {
    NotInterested,
    CallAgain,
}

impl Outcome for MessageOutcome {
    const KIND: &'static str = "message sent";

    fn parse(value: &str) -> Option<Self> {
        match value {
            "not_interested" => Some(Self::NotInterested),
            "call_again" => Some(Self::CallAgain),
            _ => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::NotInterested => "not_interested",
            Self::CallAgain => "call_again",
        }
    }

    fn events(self) -> &'static [LeadEventType] {
        match self {
            Self::NotInterested => &[LeadEventType::NotInterested],
            Self::CallAgain => &[LeadEventType::CallAgain],
        }
    }
}
