//! Team persistence helpers shared by the lead repository.

use crate::model::team::{Team, TeamId};
use crate::repo::event_repo::parse_uuid;
use crate::repo::lead_repo::RepoResult;
use rusqlite::{params, Connection, Row};

const TEAM_SELECT_SQL: &str = "SELECT id, name, max_call_attempts FROM teams";

pub(crate) fn insert_team(conn: &Connection, team: &Team) -> RepoResult<TeamId> {
    team.validate()?;
    conn.execute(
        "INSERT INTO teams (id, name, max_call_attempts) VALUES (?1, ?2, ?3);",
        params![team.id.to_string(), team.name.trim(), team.max_call_attempts],
    )?;
    Ok(team.id)
}

pub(crate) fn select_team(conn: &Connection, id: TeamId) -> RepoResult<Option<Team>> {
    let mut stmt = conn.prepare(&format!("{TEAM_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    match rows.next()? {
        Some(row) => Ok(Some(parse_team_row(row)?)),
        None => Ok(None),
    }
}

pub(crate) fn select_team_by_name(conn: &Connection, name: &str) -> RepoResult<Option<Team>> {
    let mut stmt = conn.prepare(&format!(
        "{TEAM_SELECT_SQL} WHERE name = ?1 COLLATE NOCASE;"
    ))?;
    let mut rows = stmt.query([name.trim()])?;
    match rows.next()? {
        Some(row) => Ok(Some(parse_team_row(row)?)),
        None => Ok(None),
    }
}

pub(crate) fn team_exists(conn: &Connection, id: TeamId) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM teams WHERE id = ?1);",
        [id.to_string()],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn parse_team_row(row: &Row<'_>) -> RepoResult<Team> {
    let id_text: String = row.get("id")?;
    Ok(Team {
        id: parse_uuid(&id_text, "teams.id")?,
        name: row.get("name")?,
        max_call_attempts: row.get("max_call_attempts")?,
    })
}
