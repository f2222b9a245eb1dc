//! Max-attempts escalation for unanswered calls.
//!
//! A `no_answer` keeps the lead in `call_again` until its call count reaches
//! the ceiling; from then on it is routed to `message_to_be_sent`.

use crate::model::lead::LeadStatus;
use crate::model::team::Team;

/// Attempt ceiling for a lead owned by `team`.
///
/// Leads without a (resolvable) team use `default`.
pub fn max_call_attempts(team: Option<&Team>, default: u32) -> u32 {
    team.map_or(default, |team| team.effective_max_call_attempts(default))
}

/// Status after a `no_answer`, given the already incremented `call_count`.
pub fn status_after_no_answer(call_count: u32, ceiling: u32) -> LeadStatus {
    if call_count >= ceiling {
        LeadStatus::MessageToBeSent
    } else {
        LeadStatus::CallAgain
    }
}

#[cfg(test)]
mod tests {
    use super::{max_call_attempts, status_after_no_answer};
    use crate::model::lead::LeadStatus;
    use crate::model::team::Team;

    #[test]
    fn ceiling_prefers_team_setting() {
        let mut team = Team::new("Gent");
        assert_eq!(max_call_attempts(Some(&team), 3), 3);
        team.max_call_attempts = Some(5);
        assert_eq!(max_call_attempts(Some(&team), 3), 5);
        assert_eq!(max_call_attempts(None, 4), 4);
    }

    #[test]
    fn escalates_at_the_ceiling() {
        assert_eq!(status_after_no_answer(1, 3), LeadStatus::CallAgain);
        assert_eq!(status_after_no_answer(2, 3), LeadStatus::CallAgain);
        assert_eq!(status_after_no_answer(3, 3), LeadStatus::MessageToBeSent);
        assert_eq!(status_after_no_answer(7, 3), LeadStatus::MessageToBeSent);
    }
}
