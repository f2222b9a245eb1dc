//! JSON operation surface for UI and webhook callers.
//!
//! # Responsibility
//! - Parse loosely-typed camelCase payloads into typed service requests.
//! - Route operation names to lifecycle services.
//! - Render results and failures as stable JSON envelopes.
//!
//! # Invariants
//! - `dispatch` never panics and always returns an object with `success`.
//! - Internal failures are logged with detail and returned without it.
//! - Naive date-times are read in the organization time zone.

use crate::clock::parse_local_datetime;
use crate::lifecycle::actions::LeadAction;
use crate::model::event::{LeadEvent, LeadEventType};
use crate::model::lead::{LeadId, LeadStatus};
use crate::model::outcome::Outcome;
use crate::model::team::TeamId;
use crate::repo::lead_repo::{RepoError, SqliteLeadRepository};
use crate::service::env::LifecycleEnv;
use crate::service::error::{ErrorKind, LeadError, LeadResult, ValidationError};
use crate::service::lead_service::{LeadService, LeadUpdate};
use crate::service::notify::SaveOptions;
use crate::service::outcome_service::{
    LeadOutcomeService, LogCallRequest, LogKickstartFollowUpRequest, LogKickstartRequest,
    LogMessageOutcomeRequest, OutcomeReceipt,
};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use log::{error, warn};
use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

/// Operation names accepted by [`LeadApi::dispatch`].
pub const OPERATIONS: [&str; 10] = [
    "logCall",
    "logKickstart",
    "logKickstartFollowUp",
    "logMessageSent",
    "logMessageOutcome",
    "logEvent",
    "updateStatus",
    "applyAction",
    "assignTeam",
    "getLead",
];

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LogCallPayload {
    id: Option<String>,
    outcome: Option<String>,
    call_date_time: Option<String>,
    call_again_date_time: Option<String>,
    coach_note: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LogKickstartPayload {
    id: Option<String>,
    outcome: Option<String>,
    kickstart_date_time: Option<String>,
    call_again_date_time: Option<String>,
    coach_note: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LogKickstartFollowUpPayload {
    id: Option<String>,
    outcome: Option<String>,
    follow_up_date_time: Option<String>,
    /// Older clients send the follow-up moment under this name; errors still
    /// name `followUpDateTime`.
    kickstart_date_time: Option<String>,
    coach_note: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LogMessageOutcomePayload {
    id: Option<String>,
    outcome: Option<String>,
    call_again_date_time: Option<String>,
    coach_note: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LogEventPayload {
    id: Option<String>,
    event_type: Option<String>,
    event_date: Option<String>,
    note: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateStatusPayload {
    id: Option<String>,
    status: Option<String>,
    follow_up_action: Option<String>,
    expected_version: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssignTeamPayload {
    id: Option<String>,
    team_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LeadRefPayload {
    id: Option<String>,
}

/// JSON facade over one SQLite connection.
pub struct LeadApi<'conn> {
    conn: &'conn Connection,
    env: LifecycleEnv,
    save_options: SaveOptions,
}

impl<'conn> LeadApi<'conn> {
    /// Binds the API to a migrated connection.
    ///
    /// # Errors
    /// - `MissingRequiredTable` when the lifecycle schema is absent.
    pub fn new(conn: &'conn Connection, env: LifecycleEnv) -> Result<Self, RepoError> {
        SqliteLeadRepository::try_new(conn)?;
        Ok(Self {
            conn,
            env,
            save_options: SaveOptions::default(),
        })
    }

    pub fn with_save_options(mut self, options: SaveOptions) -> Self {
        self.save_options = options;
        self
    }

    /// Runs `operation` with `payload` and returns the JSON envelope.
    pub fn dispatch(&self, operation: &str, payload: &Value) -> Value {
        let result = match operation {
            "logCall" => self.log_call(payload),
            "logKickstart" => self.log_kickstart(payload),
            "logKickstartFollowUp" => self.log_kickstart_follow_up(payload),
            "logMessageSent" => self.log_message_sent(payload),
            "logMessageOutcome" => self.log_message_outcome(payload),
            "logEvent" => self.log_event(payload),
            "updateStatus" => self.update_status(payload),
            "applyAction" => self.apply_action(payload),
            "assignTeam" => self.assign_team(payload),
            "getLead" => self.get_lead(payload),
            other => Err(ValidationError::InvalidPayload(format!(
                "unknown operation `{other}`"
            ))
            .into()),
        };

        match result {
            Ok(value) => value,
            Err(err) => error_envelope(operation, &err),
        }
    }

    pub fn log_call(&self, payload: &Value) -> LeadResult<Value> {
        let payload: LogCallPayload = parse_payload(payload)?;
        let tz = self.timezone();
        let request = LogCallRequest {
            lead_id: parse_lead_id(payload.id.as_deref())?,
            outcome: parse_outcome(payload.outcome.as_deref())?,
            call_at: parse_datetime(payload.call_date_time.as_deref(), "callDateTime", tz)?,
            call_again_at: parse_datetime(
                payload.call_again_date_time.as_deref(),
                "callAgainDateTime",
                tz,
            )?,
            coach_note: payload.coach_note,
        };
        let receipt = self.outcome_service().log_call(&request)?;
        Ok(outcome_envelope(&receipt))
    }

    pub fn log_kickstart(&self, payload: &Value) -> LeadResult<Value> {
        let payload: LogKickstartPayload = parse_payload(payload)?;
        let tz = self.timezone();
        let request = LogKickstartRequest {
            lead_id: parse_lead_id(payload.id.as_deref())?,
            outcome: parse_outcome(payload.outcome.as_deref())?,
            kickstart_at: parse_datetime(
                payload.kickstart_date_time.as_deref(),
                "kickstartDateTime",
                tz,
            )?,
            call_again_at: parse_datetime(
                payload.call_again_date_time.as_deref(),
                "callAgainDateTime",
                tz,
            )?,
            coach_note: payload.coach_note,
        };
        let receipt = self.outcome_service().log_kickstart(&request)?;
        Ok(outcome_envelope(&receipt))
    }

    pub fn log_kickstart_follow_up(&self, payload: &Value) -> LeadResult<Value> {
        let payload: LogKickstartFollowUpPayload = parse_payload(payload)?;
        let tz = self.timezone();
        let raw_follow_up = non_blank(payload.follow_up_date_time.as_deref())
            .or(payload.kickstart_date_time.as_deref());
        let follow_up_at = parse_datetime(raw_follow_up, "followUpDateTime", tz)?;
        let request = LogKickstartFollowUpRequest {
            lead_id: parse_lead_id(payload.id.as_deref())?,
            outcome: parse_outcome(payload.outcome.as_deref())?,
            follow_up_at,
            coach_note: payload.coach_note,
        };
        let receipt = self.outcome_service().log_kickstart_follow_up(&request)?;
        Ok(outcome_envelope(&receipt))
    }

    pub fn log_message_sent(&self, payload: &Value) -> LeadResult<Value> {
        let payload: LeadRefPayload = parse_payload(payload)?;
        let lead_id = parse_lead_id(payload.id.as_deref())?;
        let receipt = self.outcome_service().log_message_sent(lead_id)?;
        Ok(single_event_envelope(&receipt))
    }

    pub fn log_message_outcome(&self, payload: &Value) -> LeadResult<Value> {
        let payload: LogMessageOutcomePayload = parse_payload(payload)?;
        let request = LogMessageOutcomeRequest {
            lead_id: parse_lead_id(payload.id.as_deref())?,
            outcome: parse_outcome(payload.outcome.as_deref())?,
            call_again_at: parse_datetime(
                payload.call_again_date_time.as_deref(),
                "callAgainDateTime",
                self.timezone(),
            )?,
            coach_note: payload.coach_note,
        };
        let receipt = self.outcome_service().log_message_outcome(&request)?;
        Ok(outcome_envelope(&receipt))
    }

    pub fn log_event(&self, payload: &Value) -> LeadResult<Value> {
        let payload: LogEventPayload = parse_payload(payload)?;
        let lead_id = parse_lead_id(payload.id.as_deref())?;
        let raw_type = non_blank(payload.event_type.as_deref())
            .ok_or(ValidationError::MissingField("eventType"))?;
        let event_type = LeadEventType::parse(raw_type).ok_or_else(|| {
            ValidationError::InvalidPayload(format!("unknown event type `{raw_type}`"))
        })?;
        let event_date = parse_datetime(payload.event_date.as_deref(), "eventDate", self.timezone())?;
        let receipt =
            self.outcome_service()
                .log_event(lead_id, event_type, event_date, payload.note)?;
        Ok(single_event_envelope(&receipt))
    }

    pub fn update_status(&self, payload: &Value) -> LeadResult<Value> {
        let payload: UpdateStatusPayload = parse_payload(payload)?;
        let lead_id = parse_lead_id(payload.id.as_deref())?;
        let raw_status =
            non_blank(payload.status.as_deref()).ok_or(ValidationError::MissingField("status"))?;
        let status = LeadStatus::parse(raw_status).ok_or_else(|| {
            ValidationError::InvalidPayload(format!("unknown status `{raw_status}`"))
        })?;
        let update = LeadUpdate {
            status: Some(status),
            follow_up_action: payload.follow_up_action,
            expected_version: payload.expected_version,
            ..LeadUpdate::default()
        };
        let lead = self.lead_service().update_lead(lead_id, &update)?;
        Ok(json!({
            "success": true,
            "leadStatus": lead.status,
            "followUpAction": lead.follow_up_action,
            "version": lead.version,
        }))
    }

    pub fn apply_action(&self, payload: &Value) -> LeadResult<Value> {
        let reference: LeadRefPayload = parse_payload(payload)?;
        let lead_id = parse_lead_id(reference.id.as_deref())?;
        let action: LeadAction = parse_payload(payload)?;
        let receipt = self.lead_service().apply_action(lead_id, &action)?;
        Ok(outcome_envelope(&receipt))
    }

    pub fn assign_team(&self, payload: &Value) -> LeadResult<Value> {
        let payload: AssignTeamPayload = parse_payload(payload)?;
        let lead_id = parse_lead_id(payload.id.as_deref())?;
        let team_id = match non_blank(payload.team_id.as_deref()) {
            Some(raw) => Some(parse_team_id(raw)?),
            None => None,
        };
        let lead = self.lead_service().assign_team(lead_id, team_id)?;
        Ok(json!({
            "success": true,
            "leadStatus": lead.status,
            "teamId": lead.team_id,
        }))
    }

    pub fn get_lead(&self, payload: &Value) -> LeadResult<Value> {
        let payload: LeadRefPayload = parse_payload(payload)?;
        let lead_id = parse_lead_id(payload.id.as_deref())?;
        let service = self.lead_service();
        let lead = service.get_lead(lead_id)?;
        let events = service.list_events(lead_id)?;
        Ok(json!({
            "success": true,
            "lead": lead,
            "events": events.iter().map(event_view).collect::<Vec<_>>(),
        }))
    }

    fn timezone(&self) -> Tz {
        self.env.config.timezone
    }

    fn outcome_service(&self) -> LeadOutcomeService<SqliteLeadRepository<'conn>> {
        LeadOutcomeService::new(SqliteLeadRepository::new(self.conn), self.env.clone())
            .with_save_options(self.save_options)
    }

    fn lead_service(&self) -> LeadService<SqliteLeadRepository<'conn>> {
        LeadService::new(SqliteLeadRepository::new(self.conn), self.env.clone())
            .with_save_options(self.save_options)
    }
}

/// Timeline entry: the stored event plus its human label.
pub fn event_view(event: &LeadEvent) -> Value {
    json!({
        "id": event.id,
        "lead_id": event.lead_id,
        "event_type": event.event_type,
        "label": event.event_type.label(),
        "event_date": event.event_date,
        "note": event.note,
    })
}

fn outcome_envelope(receipt: &OutcomeReceipt) -> Value {
    json!({
        "success": true,
        "eventIds": receipt.event_ids,
        "leadStatus": receipt.lead_status,
        "followUpAction": receipt.follow_up_action,
        "callCount": receipt.call_count,
    })
}

fn single_event_envelope(receipt: &OutcomeReceipt) -> Value {
    let (event_id, event_type) = match receipt.first_event() {
        Some((id, event_type)) => (Some(id), Some(event_type)),
        None => (None, None),
    };
    json!({
        "success": true,
        "eventId": event_id,
        "eventType": event_type,
        "leadStatus": receipt.lead_status,
    })
}

fn error_envelope(operation: &str, err: &LeadError) -> Value {
    let kind = err.kind();
    if kind == ErrorKind::Internal {
        error!(
            "event=api_call module=api status=error op={} error_kind={} error={}",
            operation,
            kind.as_str(),
            crate::logging::sanitize_for_log(&err.to_string())
        );
    } else {
        warn!(
            "event=api_call module=api status=rejected op={} error_kind={}",
            operation,
            kind.as_str()
        );
    }

    let mut envelope = json!({
        "success": false,
        "error": err.public_message(),
        "code": kind.status_code(),
        "kind": kind.as_str(),
    });
    if let LeadError::Validation(validation) = err {
        if let Some(field) = validation.field() {
            envelope["field"] = Value::from(field);
        }
    }
    envelope
}

fn parse_payload<T: DeserializeOwned>(payload: &Value) -> Result<T, ValidationError> {
    if !payload.is_object() {
        return Err(ValidationError::InvalidPayload(
            "payload must be a JSON object".to_string(),
        ));
    }
    T::deserialize(payload).map_err(|err| ValidationError::InvalidPayload(err.to_string()))
}

fn parse_lead_id(raw: Option<&str>) -> Result<LeadId, ValidationError> {
    let raw = non_blank(raw).ok_or(ValidationError::MissingLeadId)?;
    Uuid::parse_str(raw).map_err(|_| ValidationError::InvalidLeadId(raw.to_string()))
}

fn parse_team_id(raw: &str) -> Result<TeamId, ValidationError> {
    Uuid::parse_str(raw)
        .map_err(|_| ValidationError::InvalidPayload(format!("invalid teamId `{raw}`")))
}

fn parse_outcome<O: Outcome>(raw: Option<&str>) -> Result<O, ValidationError> {
    let raw = raw.map(str::trim).unwrap_or_default();
    O::parse(raw).ok_or_else(|| ValidationError::InvalidOutcome {
        kind: O::KIND,
        value: raw.to_string(),
    })
}

fn parse_datetime(
    raw: Option<&str>,
    field: &'static str,
    tz: Tz,
) -> Result<Option<DateTime<Utc>>, ValidationError> {
    match non_blank(raw) {
        Some(value) => parse_local_datetime(value, tz)
            .map(Some)
            .ok_or_else(|| ValidationError::InvalidDateTime {
                field,
                value: value.to_string(),
            }),
        None => Ok(None),
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|text| !text.is_empty())
}
