//! Team (coach) collaborator model.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type TeamId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeamValidationError {
    BlankName,
    /// A ceiling of zero would escalate before the first call.
    ZeroCallAttempts,
}

impl Display for TeamValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName => write!(f, "team name must not be blank"),
            Self::ZeroCallAttempts => write!(f, "team max_call_attempts must be at least 1"),
        }
    }
}

impl Error for TeamValidationError {}

/// Owning team of a lead. Read-only from the lifecycle engine's perspective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    /// Call attempts before a `no_answer` escalates; `None` uses the default.
    pub max_call_attempts: Option<u32>,
}

impl Team {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            max_call_attempts: None,
        }
    }

    pub fn validate(&self) -> Result<(), TeamValidationError> {
        if self.name.trim().is_empty() {
            return Err(TeamValidationError::BlankName);
        }
        if self.max_call_attempts == Some(0) {
            return Err(TeamValidationError::ZeroCallAttempts);
        }
        Ok(())
    }

    /// Resolves the attempt ceiling, falling back to `default` when unset.
    pub fn effective_max_call_attempts(&self, default: u32) -> u32 {
        self.max_call_attempts.unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::{Team, TeamValidationError};

    #[test]
    fn validate_rejects_blank_names_and_zero_ceilings() {
        assert_eq!(Team::new("  ").validate(), Err(TeamValidationError::BlankName));

        let mut team = Team::new("Gent");
        team.max_call_attempts = Some(0);
        assert_eq!(team.validate(), Err(TeamValidationError::ZeroCallAttempts));

        team.max_call_attempts = Some(1);
        assert_eq!(team.validate(), Ok(()));
        assert_eq!(team.effective_max_call_attempts(3), 1);
    }
}
