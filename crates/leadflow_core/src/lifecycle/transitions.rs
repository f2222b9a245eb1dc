//! Static transition table.

use crate::model::lead::LeadStatus;

/// Returns the statuses reachable from `from` in one step.
///
/// The self transition is implied and not listed.
pub fn allowed_next_states(from: LeadStatus) -> &'static [LeadStatus] {
    use LeadStatus as S;
    match from {
        S::New => &[S::Assigned],
        S::Assigned => &[S::CallAgain, S::Invited, S::Disqualified, S::Dead],
        S::CallAgain => &[S::Invited, S::MessageToBeSent, S::Disqualified],
        S::MessageToBeSent => &[S::MessageSent],
        S::MessageSent => &[S::CallAgain, S::Invited, S::Disqualified],
        S::Invited => &[S::AppointmentBooked],
        S::AppointmentBooked => &[
            S::AppointmentCancelled,
            S::BecameClient,
            S::StillThinking,
            S::MessageToBeSent,
            S::Disqualified,
        ],
        S::AppointmentCancelled => &[S::CallAgain, S::Disqualified, S::AppointmentBooked],
        S::StillThinking => &[S::BecameClient, S::Disqualified],
        S::BecameClient => &[S::Converted],
        S::Disqualified => &[S::BecameClient, S::CallAgain],
        S::Dead | S::Converted => &[],
    }
}

/// Returns whether `from -> to` is a legal status change.
pub fn can_transition(from: LeadStatus, to: LeadStatus) -> bool {
    from == to || allowed_next_states(from).contains(&to)
}

/// String-level variant used where statuses arrive as raw text.
///
/// Identical strings are always legal. An unknown `from` has no successors
/// and an unknown `to` is never reachable.
pub fn can_transition_raw(from: &str, to: &str) -> bool {
    if from == to {
        return true;
    }
    match (LeadStatus::parse(from), LeadStatus::parse(to)) {
        (Some(from), Some(to)) => can_transition(from, to),
        _ => false,
    }
}

/// Raw-text variant of [`allowed_next_states`]; unknown input yields nothing.
pub fn allowed_next_states_raw(from: &str) -> &'static [LeadStatus] {
    match LeadStatus::parse(from) {
        Some(status) => allowed_next_states(status),
        None => &[],
    }
}
