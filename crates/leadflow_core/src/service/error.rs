//! Service-level error taxonomy.
//!
//! # Responsibility
//! - Describe user-correctable payload problems (`ValidationError`).
//! - Fold repository, validator and dispatch failures into one `LeadError`
//!   with a stable [`ErrorKind`] classification for transport layers.
//!
//! # Invariants
//! - `ValidationError` and not-found errors are raised before any mutation.
//! - `ErrorKind::Internal` messages are never shown to callers verbatim.

use crate::lifecycle::actions::LifecycleError;
use crate::lifecycle::validator::StatusTransitionError;
use crate::model::lead::LeadId;
use crate::model::team::TeamId;
use crate::repo::lead_repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Caller-correctable input problem. No mutation happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    MissingLeadId,
    InvalidLeadId(String),
    InvalidOutcome {
        kind: &'static str,
        value: String,
    },
    /// A field required by the chosen branch is absent.
    MissingField(&'static str),
    InvalidDateTime {
        field: &'static str,
        value: String,
    },
    /// Occurrence timestamps may not lie in the future.
    DateInFuture(&'static str),
    /// Follow-up timestamps must lie strictly in the future.
    DateNotInFuture(&'static str),
    InvalidPayload(String),
}

impl ValidationError {
    /// Payload field the error refers to, when there is one.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::MissingLeadId | Self::InvalidLeadId(_) => Some("id"),
            Self::InvalidOutcome { .. } => Some("outcome"),
            Self::MissingField(field)
            | Self::InvalidDateTime { field, .. }
            | Self::DateInFuture(field)
            | Self::DateNotInFuture(field) => Some(*field),
            Self::InvalidPayload(_) => None,
        }
    }
}

/// Dutch label shown to coaches for date-time fields.
fn field_label(field: &str) -> &str {
    match field {
        "callAgainDateTime" => "Datum/tijd opnieuw bellen",
        "callDateTime" => "Gesprek datum/tijd",
        "kickstartDateTime" => "Kickstartdatum/tijd",
        "followUpDateTime" => "Opvolgdatum/tijd",
        "eventDate" => "Datum/tijd gebeurtenis",
        other => other,
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingLeadId => write!(f, "Lead ID is required."),
            Self::InvalidLeadId(value) => write!(f, "Lead ID `{value}` is not a valid identifier."),
            Self::InvalidOutcome { kind, value } => write!(f, "Invalid {kind} outcome: {value}"),
            Self::MissingField(field) => write!(f, "{} is verplicht.", field_label(field)),
            Self::InvalidDateTime { field, value } => {
                write!(f, "{} is ongeldig: `{value}`.", field_label(field))
            }
            Self::DateInFuture(field) => {
                write!(f, "{} mag niet in de toekomst zijn.", field_label(field))
            }
            Self::DateNotInFuture(field) => {
                write!(f, "{} moet in de toekomst zijn.", field_label(field))
            }
            Self::InvalidPayload(message) => write!(f, "Invalid payload: {message}"),
        }
    }
}

impl Error for ValidationError {}

/// Transport-neutral error class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BadRequest,
    NotFound,
    Forbidden,
    Conflict,
    Internal,
}

impl ErrorKind {
    /// HTTP-equivalent status code.
    pub fn status_code(self) -> u16 {
        match self {
            Self::BadRequest => 400,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::Conflict => 409,
            Self::Internal => 500,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::BadRequest => "bad_request",
            Self::NotFound => "not_found",
            Self::Forbidden => "forbidden",
            Self::Conflict => "conflict",
            Self::Internal => "internal",
        }
    }
}

/// Umbrella error for lifecycle use-cases.
#[derive(Debug)]
pub enum LeadError {
    Validation(ValidationError),
    LeadNotFound(LeadId),
    TeamNotFound(TeamId),
    /// Record-update path rejected by the status validator.
    IllegalTransition(StatusTransitionError),
    /// Lifecycle action has no handler for the current status.
    ActionNotAllowed(LifecycleError),
    Conflict {
        lead_id: LeadId,
        expected_version: i64,
    },
    Repo(RepoError),
}

impl LeadError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::IllegalTransition(_) => ErrorKind::BadRequest,
            Self::LeadNotFound(_) | Self::TeamNotFound(_) => ErrorKind::NotFound,
            Self::ActionNotAllowed(_) => ErrorKind::Forbidden,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::Repo(RepoError::Validation(_) | RepoError::InvalidTeam(_)) => {
                ErrorKind::BadRequest
            }
            Self::Repo(RepoError::DuplicateExternalRef(_)) => ErrorKind::Conflict,
            Self::Repo(_) => ErrorKind::Internal,
        }
    }

    /// Message safe to hand to an external caller.
    pub fn public_message(&self) -> String {
        match self.kind() {
            ErrorKind::Internal => "internal error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl Display for LeadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::LeadNotFound(id) => write!(f, "Lead not found: {id}"),
            Self::TeamNotFound(id) => write!(f, "Team not found: {id}"),
            Self::IllegalTransition(err) => write!(f, "{err}"),
            Self::ActionNotAllowed(err) => write!(f, "{err}"),
            Self::Conflict {
                lead_id,
                expected_version,
            } => write!(
                f,
                "Lead {lead_id} was changed by another request (expected version {expected_version}); reload and retry"
            ),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for LeadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::IllegalTransition(err) => Some(err),
            Self::ActionNotAllowed(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for LeadError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StatusTransitionError> for LeadError {
    fn from(value: StatusTransitionError) -> Self {
        Self::IllegalTransition(value)
    }
}

impl From<LifecycleError> for LeadError {
    fn from(value: LifecycleError) -> Self {
        Self::ActionNotAllowed(value)
    }
}

impl From<RepoError> for LeadError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::LeadNotFound(id),
            RepoError::TeamNotFound(id) => Self::TeamNotFound(id),
            RepoError::VersionConflict {
                lead_id,
                expected_version,
            } => Self::Conflict {
                lead_id,
                expected_version,
            },
            other => Self::Repo(other),
        }
    }
}

pub type LeadResult<T> = Result<T, LeadError>;

#[cfg(test)]
mod tests {
    use super::{ErrorKind, LeadError, ValidationError};
    use crate::db::DbError;
    use crate::repo::lead_repo::RepoError;
    use uuid::Uuid;

    #[test]
    fn date_messages_use_coach_facing_labels() {
        assert_eq!(
            ValidationError::DateNotInFuture("callAgainDateTime").to_string(),
            "Datum/tijd opnieuw bellen moet in de toekomst zijn."
        );
        assert_eq!(
            ValidationError::MissingField("callAgainDateTime").to_string(),
            "Datum/tijd opnieuw bellen is verplicht."
        );
    }

    #[test]
    fn repo_errors_fold_into_service_kinds() {
        let id = Uuid::new_v4();
        assert_eq!(LeadError::from(RepoError::NotFound(id)).kind(), ErrorKind::NotFound);
        assert_eq!(
            LeadError::from(RepoError::VersionConflict {
                lead_id: id,
                expected_version: 2
            })
            .kind(),
            ErrorKind::Conflict
        );
        let internal = LeadError::from(RepoError::Db(DbError::Sqlite(
            rusqlite::Error::InvalidQuery,
        )));
        assert_eq!(internal.kind(), ErrorKind::Internal);
        assert_eq!(internal.public_message(), "internal error");
    }
}
