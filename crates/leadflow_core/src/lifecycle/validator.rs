//! Status validator for the record-update path.
//!
//! Runs before a lead write that changes `status`; a rejected change must not
//! reach storage.

use crate::lifecycle::transitions::{allowed_next_states, can_transition};
use crate::model::lead::LeadStatus;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Rejected status change with diagnostics for the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusTransitionError {
    pub from: LeadStatus,
    pub to: LeadStatus,
    pub allowed: Vec<LeadStatus>,
}

impl Display for StatusTransitionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let allowed = if self.allowed.is_empty() {
            "none".to_string()
        } else {
            self.allowed
                .iter()
                .map(|status| status.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        };
        write!(
            f,
            "invalid status transition from '{}' to '{}'; allowed transitions: {allowed}",
            self.from, self.to
        )
    }
}

impl Error for StatusTransitionError {}

/// Checks a status change on an existing record.
///
/// `previous` is `None` for records that were never persisted; those are not
/// subject to the transition table.
pub fn validate_status_change(
    previous: Option<LeadStatus>,
    next: LeadStatus,
) -> Result<(), StatusTransitionError> {
    let Some(from) = previous else {
        return Ok(());
    };
    if can_transition(from, next) {
        return Ok(());
    }
    Err(StatusTransitionError {
        from,
        to: next,
        allowed: allowed_next_states(from).to_vec(),
    })
}
