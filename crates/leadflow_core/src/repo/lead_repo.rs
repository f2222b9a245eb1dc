//! Lead repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide load/save/filter APIs over `leads`, `lead_events` and `teams`.
//! - Link a lead to its team and to the events it records.
//!
//! # Invariants
//! - Write paths call `Lead::validate()` before SQL mutations.
//! - `save_lead` bumps `version` by one and fails with `VersionConflict` when
//!   the stored version differs from the caller's copy.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::{missing_lifecycle_table, DbError};
use crate::model::event::LeadEvent;
use crate::model::lead::{Lead, LeadId, LeadStatus, LeadValidationError};
use crate::model::team::{Team, TeamId, TeamValidationError};
use crate::repo::event_repo::{self, parse_uuid};
use crate::repo::team_repo;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const LEAD_SELECT_SQL: &str = "SELECT
    id,
    first_name,
    last_name,
    external_ref,
    status,
    call_count,
    follow_up_action,
    notes,
    team_id,
    version
FROM leads";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for lead persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(LeadValidationError),
    InvalidTeam(TeamValidationError),
    Db(DbError),
    NotFound(LeadId),
    TeamNotFound(TeamId),
    DuplicateExternalRef(String),
    /// Another writer saved the lead after it was loaded.
    VersionConflict {
        lead_id: LeadId,
        expected_version: i64,
    },
    InvalidData(String),
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::InvalidTeam(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "lead not found: {id}"),
            Self::TeamNotFound(id) => write!(f, "team not found: {id}"),
            Self::DuplicateExternalRef(value) => {
                write!(f, "a lead with external_ref `{value}` already exists")
            }
            Self::VersionConflict {
                lead_id,
                expected_version,
            } => write!(
                f,
                "lead {lead_id} was modified concurrently (expected version {expected_version})"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted lead data: {message}"),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::InvalidTeam(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<LeadValidationError> for RepoError {
    fn from(value: LeadValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<TeamValidationError> for RepoError {
    fn from(value: TeamValidationError) -> Self {
        Self::InvalidTeam(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Single-lead lookup predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeadFilter {
    Id(LeadId),
    /// Identifier assigned by the external CRM.
    ExternalRef(String),
}

/// Query options for listing leads.
#[derive(Debug, Clone, Default)]
pub struct LeadListQuery {
    pub status: Option<LeadStatus>,
    pub team_id: Option<TeamId>,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Entity-store contract consumed by the lifecycle services.
pub trait LeadRepository {
    fn create_lead(&self, lead: &Lead) -> RepoResult<LeadId>;
    fn get_lead(&self, id: LeadId) -> RepoResult<Option<Lead>>;
    fn find_lead(&self, filter: &LeadFilter) -> RepoResult<Option<Lead>>;
    fn list_leads(&self, query: &LeadListQuery) -> RepoResult<Vec<Lead>>;
    /// Persists lead fields and appends `events` atomically.
    ///
    /// Returns the stored lead with its new `version`.
    fn save_lead(&self, lead: &Lead, events: &[LeadEvent]) -> RepoResult<Lead>;
    /// Lists one lead's events, oldest first.
    fn list_events(&self, lead_id: LeadId) -> RepoResult<Vec<LeadEvent>>;
    fn create_team(&self, team: &Team) -> RepoResult<TeamId>;
    fn get_team(&self, id: TeamId) -> RepoResult<Option<Team>>;
    fn find_team_by_name(&self, name: &str) -> RepoResult<Option<Team>>;
}

/// SQLite-backed lead repository.
pub struct SqliteLeadRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLeadRepository<'conn> {
    /// Wraps a migrated connection without checking the schema.
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Wraps a connection after checking the lifecycle tables exist.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        match missing_lifecycle_table(conn)? {
            Some(table) => Err(RepoError::MissingRequiredTable(table)),
            None => Ok(Self { conn }),
        }
    }
}

impl LeadRepository for SqliteLeadRepository<'_> {
    fn create_lead(&self, lead: &Lead) -> RepoResult<LeadId> {
        lead.validate()?;

        if let Some(external_ref) = lead.external_ref.as_deref() {
            if self
                .find_lead(&LeadFilter::ExternalRef(external_ref.to_string()))?
                .is_some()
            {
                return Err(RepoError::DuplicateExternalRef(external_ref.to_string()));
            }
        }
        if let Some(team_id) = lead.team_id {
            if !team_repo::team_exists(self.conn, team_id)? {
                return Err(RepoError::TeamNotFound(team_id));
            }
        }

        self.conn.execute(
            "INSERT INTO leads (
                id,
                first_name,
                last_name,
                external_ref,
                status,
                call_count,
                follow_up_action,
                notes,
                team_id,
                version
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 0);",
            params![
                lead.id.to_string(),
                lead.first_name.as_str(),
                lead.last_name.as_str(),
                lead.external_ref.as_deref(),
                lead.status.as_str(),
                lead.call_count,
                lead.follow_up_action.as_str(),
                lead.notes.as_str(),
                lead.team_id.map(|id| id.to_string()),
            ],
        )?;

        Ok(lead.id)
    }

    fn get_lead(&self, id: LeadId) -> RepoResult<Option<Lead>> {
        self.find_lead(&LeadFilter::Id(id))
    }

    fn find_lead(&self, filter: &LeadFilter) -> RepoResult<Option<Lead>> {
        let (clause, value) = match filter {
            LeadFilter::Id(id) => ("id = ?1", id.to_string()),
            LeadFilter::ExternalRef(external_ref) => ("external_ref = ?1", external_ref.clone()),
        };
        let mut stmt = self
            .conn
            .prepare(&format!("{LEAD_SELECT_SQL} WHERE {clause};"))?;
        let mut rows = stmt.query([value])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_lead_row(row)?));
        }
        Ok(None)
    }

    fn list_leads(&self, query: &LeadListQuery) -> RepoResult<Vec<Lead>> {
        let mut sql = format!("{LEAD_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(status) = query.status {
            sql.push_str(" AND status = ?");
            bind_values.push(Value::Text(status.as_str().to_string()));
        }
        if let Some(team_id) = query.team_id {
            sql.push_str(" AND team_id = ?");
            bind_values.push(Value::Text(team_id.to_string()));
        }

        sql.push_str(" ORDER BY updated_at DESC, id ASC");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if query.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
        } else if query.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut leads = Vec::new();
        while let Some(row) = rows.next()? {
            leads.push(parse_lead_row(row)?);
        }
        Ok(leads)
    }

    fn save_lead(&self, lead: &Lead, events: &[LeadEvent]) -> RepoResult<Lead> {
        lead.validate()?;

        let tx = self.conn.unchecked_transaction()?;

        if let Some(team_id) = lead.team_id {
            if !team_repo::team_exists(&tx, team_id)? {
                return Err(RepoError::TeamNotFound(team_id));
            }
        }

        let changed = tx.execute(
            "UPDATE leads
             SET
                first_name = ?1,
                last_name = ?2,
                external_ref = ?3,
                status = ?4,
                call_count = ?5,
                follow_up_action = ?6,
                notes = ?7,
                team_id = ?8,
                version = version + 1,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?9
               AND version = ?10;",
            params![
                lead.first_name.as_str(),
                lead.last_name.as_str(),
                lead.external_ref.as_deref(),
                lead.status.as_str(),
                lead.call_count,
                lead.follow_up_action.as_str(),
                lead.notes.as_str(),
                lead.team_id.map(|id| id.to_string()),
                lead.id.to_string(),
                lead.version,
            ],
        )?;

        if changed == 0 {
            let exists: i64 = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM leads WHERE id = ?1);",
                [lead.id.to_string()],
                |row| row.get(0),
            )?;
            return Err(if exists == 1 {
                RepoError::VersionConflict {
                    lead_id: lead.id,
                    expected_version: lead.version,
                }
            } else {
                RepoError::NotFound(lead.id)
            });
        }

        event_repo::record_events(&tx, lead.id, events)?;
        tx.commit()?;

        let mut stored = lead.clone();
        stored.version += 1;
        Ok(stored)
    }

    fn list_events(&self, lead_id: LeadId) -> RepoResult<Vec<LeadEvent>> {
        event_repo::list_events(self.conn, lead_id)
    }

    fn create_team(&self, team: &Team) -> RepoResult<TeamId> {
        team_repo::insert_team(self.conn, team)
    }

    fn get_team(&self, id: TeamId) -> RepoResult<Option<Team>> {
        team_repo::select_team(self.conn, id)
    }

    fn find_team_by_name(&self, name: &str) -> RepoResult<Option<Team>> {
        team_repo::select_team_by_name(self.conn, name)
    }
}

fn parse_lead_row(row: &Row<'_>) -> RepoResult<Lead> {
    let id_text: String = row.get("id")?;
    let status_text: String = row.get("status")?;
    let status = LeadStatus::parse(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid status `{status_text}` in leads.status"))
    })?;
    let team_id = match row.get::<_, Option<String>>("team_id")? {
        Some(value) => Some(parse_uuid(&value, "leads.team_id")?),
        None => None,
    };

    Ok(Lead {
        id: parse_uuid(&id_text, "leads.id")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        external_ref: row.get("external_ref")?,
        status,
        call_count: row.get("call_count")?,
        follow_up_action: row.get("follow_up_action")?,
        notes: row.get("notes")?,
        team_id,
        version: row.get("version")?,
    })
}
