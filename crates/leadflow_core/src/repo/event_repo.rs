//! Lead event recorder.
//!
//! # Responsibility
//! - Append immutable event rows linked to their lead.
//! - Read a lead's event history in chronological order.
//!
//! # Invariants
//! - Rows are insert-only; migration triggers abort any UPDATE or DELETE.
//! - `event_date` is stored as UTC `YYYY-MM-DD HH:MM:SS`.
//! - `seq` is per-lead and strictly increasing, so events sharing a
//!   timestamp keep their recording order.

use crate::model::event::{LeadEvent, LeadEventType};
use crate::model::lead::LeadId;
use crate::repo::lead_repo::{RepoError, RepoResult};
use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::{params, Connection};
use uuid::Uuid;

const EVENT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Appends `events` for `lead_id` on an open connection or transaction.
pub(crate) fn record_events(
    conn: &Connection,
    lead_id: LeadId,
    events: &[LeadEvent],
) -> RepoResult<()> {
    let lead_text = lead_id.to_string();
    for event in events {
        if event.lead_id != lead_id {
            return Err(RepoError::InvalidData(format!(
                "event {} belongs to lead {}, not {}",
                event.id, event.lead_id, lead_id
            )));
        }
        conn.execute(
            "INSERT INTO lead_events (id, lead_id, event_type, event_date, note, seq)
             VALUES (
                ?1, ?2, ?3, ?4, ?5,
                (SELECT COALESCE(MAX(seq), 0) + 1 FROM lead_events WHERE lead_id = ?2)
             );",
            params![
                event.id.to_string(),
                lead_text.as_str(),
                event.event_type.as_str(),
                format_event_date(event.event_date),
                event.note.as_deref(),
            ],
        )?;
    }
    Ok(())
}

/// Lists events of one lead, oldest first.
pub(crate) fn list_events(conn: &Connection, lead_id: LeadId) -> RepoResult<Vec<LeadEvent>> {
    let mut stmt = conn.prepare(
        "SELECT id, lead_id, event_type, event_date, note
         FROM lead_events
         WHERE lead_id = ?1
         ORDER BY event_date ASC, seq ASC;",
    )?;
    let mut rows = stmt.query([lead_id.to_string()])?;
    let mut events = Vec::new();
    while let Some(row) = rows.next()? {
        let id_text: String = row.get("id")?;
        let lead_text: String = row.get("lead_id")?;
        let type_text: String = row.get("event_type")?;
        let date_text: String = row.get("event_date")?;

        events.push(LeadEvent {
            id: parse_uuid(&id_text, "lead_events.id")?,
            lead_id: parse_uuid(&lead_text, "lead_events.lead_id")?,
            event_type: LeadEventType::parse(&type_text).ok_or_else(|| {
                RepoError::InvalidData(format!(
                    "invalid event type `{type_text}` in lead_events.event_type"
                ))
            })?,
            event_date: parse_event_date(&date_text)?,
            note: row.get("note")?,
        });
    }
    Ok(events)
}

fn format_event_date(value: DateTime<Utc>) -> String {
    value.format(EVENT_DATE_FORMAT).to_string()
}

fn parse_event_date(value: &str) -> RepoResult<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, EVENT_DATE_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| {
            RepoError::InvalidData(format!(
                "invalid event date `{value}` in lead_events.event_date"
            ))
        })
}

pub(crate) fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}
