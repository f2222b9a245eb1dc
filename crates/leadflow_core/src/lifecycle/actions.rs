//! Named lifecycle capabilities dispatched on the current status.
//!
//! # Responsibility
//! - Resolve `(status, action)` into a concrete plan: target status, audit
//!   event, note and counter side effect.
//! - Reject every combination not handled explicitly.
//!
//! # Invariants
//! - Every plan returned by [`plan_action`] is legal in the transition table.
//! - Unhandled combinations fail with [`LifecycleError::NotAllowed`].

use crate::model::event::LeadEventType;
use crate::model::lead::LeadStatus;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Capability requested on a lead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum LeadAction {
    Assign,
    MoveToCallAgain,
    MoveToMessageQueue,
    MarkMessageSent,
    Invite,
    BookAppointment,
    HandleCancellation,
    MoveToStillThinking,
    StartProgram,
    Convert,
    Disqualify { reason: String },
    Kill { reason: String },
    Resurrect { target: LeadStatus },
}

impl LeadAction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Assign => "assign",
            Self::MoveToCallAgain => "move_to_call_again",
            Self::MoveToMessageQueue => "move_to_message_queue",
            Self::MarkMessageSent => "mark_message_sent",
            Self::Invite => "invite",
            Self::BookAppointment => "book_appointment",
            Self::HandleCancellation => "handle_cancellation",
            Self::MoveToStillThinking => "move_to_still_thinking",
            Self::StartProgram => "start_program",
            Self::Convert => "convert",
            Self::Disqualify { .. } => "disqualify",
            Self::Kill { .. } => "kill",
            Self::Resurrect { .. } => "resurrect",
        }
    }
}

/// Resolved effect of one lifecycle action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionPlan {
    pub next_status: LeadStatus,
    /// `None` only for assignment and conversion, which have no audit marker
    /// in the event taxonomy.
    pub event: Option<LeadEventType>,
    pub note: Option<String>,
    pub increments_call_count: bool,
}

impl ActionPlan {
    fn to(next_status: LeadStatus, event: Option<LeadEventType>, note: impl Into<String>) -> Self {
        Self {
            next_status,
            event,
            note: Some(note.into()),
            increments_call_count: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    /// The action has no handler for the current status.
    NotAllowed {
        action: &'static str,
        status: LeadStatus,
    },
}

impl Display for LifecycleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAllowed { action, status } => {
                write!(f, "action '{action}' is not allowed from status '{status}'")
            }
        }
    }
}

impl Error for LifecycleError {}

/// Resolves `action` against the lead's current `status`.
pub fn plan_action(status: LeadStatus, action: &LeadAction) -> Result<ActionPlan, LifecycleError> {
    use LeadEventType as E;
    use LeadStatus as S;

    let plan = match (status, action) {
        (S::New, LeadAction::Assign) => {
            ActionPlan::to(S::Assigned, None, "Lead toegewezen aan team.")
        }

        (S::Assigned, LeadAction::MoveToCallAgain) => ActionPlan {
            increments_call_count: true,
            ..ActionPlan::to(S::CallAgain, Some(E::NoAnswer), "Geen antwoord.")
        },
        (S::MessageSent | S::AppointmentCancelled, LeadAction::MoveToCallAgain) => {
            ActionPlan::to(S::CallAgain, Some(E::CallAgain), "Lead opnieuw te bellen.")
        }

        (S::CallAgain | S::AppointmentBooked, LeadAction::MoveToMessageQueue) => ActionPlan::to(
            S::MessageToBeSent,
            Some(E::MessageToBeSent),
            "Lead doorgezet naar berichtenwachtrij.",
        ),

        (S::MessageToBeSent, LeadAction::MarkMessageSent) => {
            ActionPlan::to(S::MessageSent, Some(E::MessageSent), "Bericht verzonden.")
        }

        (S::Assigned | S::CallAgain | S::MessageSent, LeadAction::Invite) => ActionPlan::to(
            S::Invited,
            Some(E::Invited),
            "Lead uitgenodigd voor Kickstart/IOM.",
        ),

        (S::Invited, LeadAction::BookAppointment) => ActionPlan::to(
            S::AppointmentBooked,
            Some(E::AppointmentBooked),
            "Kickstart ingepland.",
        ),
        (S::AppointmentCancelled, LeadAction::BookAppointment) => ActionPlan::to(
            S::AppointmentBooked,
            Some(E::AppointmentRescheduled),
            "Kickstart verplaatst.",
        ),

        (S::AppointmentBooked, LeadAction::HandleCancellation) => ActionPlan::to(
            S::AppointmentCancelled,
            Some(E::AppointmentCancelled),
            "Kickstart geannuleerd.",
        ),

        (S::AppointmentBooked, LeadAction::MoveToStillThinking) => ActionPlan::to(
            S::StillThinking,
            Some(E::StillThinking),
            "Lead twijfelt na Kickstart.",
        ),

        (S::AppointmentBooked | S::StillThinking, LeadAction::StartProgram) => ActionPlan::to(
            S::BecameClient,
            Some(E::BecameClient),
            "Lead gestart met programma.",
        ),

        (S::BecameClient, LeadAction::Convert) => {
            ActionPlan::to(S::Converted, None, "Lead omgezet naar klant.")
        }

        (
            S::Assigned | S::CallAgain | S::MessageSent | S::AppointmentCancelled,
            LeadAction::Disqualify { reason },
        ) => ActionPlan::to(
            S::Disqualified,
            Some(E::NotInterested),
            format!("Lead vervallen: {reason}"),
        ),
        (S::AppointmentBooked | S::StillThinking, LeadAction::Disqualify { reason }) => {
            ActionPlan::to(
                S::Disqualified,
                Some(E::NotConverted),
                format!("Lead vervallen: {reason}"),
            )
        }

        (S::Assigned, LeadAction::Kill { reason }) => ActionPlan::to(
            S::Dead,
            Some(E::WrongNumber),
            format!("Lead afgesloten: {reason}"),
        ),

        (S::Disqualified, LeadAction::Resurrect { target: S::CallAgain }) => {
            ActionPlan::to(S::CallAgain, Some(E::CallAgain), "Lead heropend.")
        }
        (S::Disqualified, LeadAction::Resurrect { target: S::BecameClient }) => {
            ActionPlan::to(S::BecameClient, Some(E::BecameClient), "Lead heropend.")
        }

        (status, action) => {
            return Err(LifecycleError::NotAllowed {
                action: action.name(),
                status,
            })
        }
    };

    Ok(plan)
}
