//! Outcome processors for calls, kickstarts and messages.
//!
//! # Responsibility
//! - Validate outcome requests against the clock before touching storage.
//! - Map each outcome to its ordered events and derive the lead status.
//! - Apply follow-up, call counter and coach-note side effects.
//!
//! # Invariants
//! - Validation and not-found failures leave the lead untouched.
//! - Lead fields and recorded events are persisted in one save.
//! - Occurrence timestamps are never in the future; follow-up timestamps are
//!   strictly in the future.

use crate::model::event::{EventId, LeadEventType};
use crate::model::lead::{LeadId, LeadStatus};
use crate::model::outcome::{
    CallOutcome, KickstartFollowUpOutcome, KickstartOutcome, MessageOutcome, Outcome,
};
use crate::repo::lead_repo::LeadRepository;
use crate::service::env::{commit_draft, load_lead, CommittedLead, LifecycleEnv};
use crate::service::error::{LeadResult, ValidationError};
use crate::service::escalation::{max_call_attempts, status_after_no_answer};
use crate::service::notify::SaveOptions;
use crate::service::side_effects::LeadDraft;
use chrono::{DateTime, Utc};
use log::info;
use serde::Serialize;

const PHONE_NOTE_SOURCE: &str = "Telefoon";
const KICKSTART_NOTE_SOURCE: &str = "Kickstart";
const KICKSTART_FOLLOW_UP_NOTE_SOURCE: &str = "KS - Opvolging";
const MESSAGE_NOTE_SOURCE: &str = "Bericht";

/// Logged phone call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogCallRequest {
    pub lead_id: LeadId,
    pub outcome: CallOutcome,
    /// When the call happened; defaults to now.
    pub call_at: Option<DateTime<Utc>>,
    /// Requested call-back moment for `call_again`/`no_answer`.
    pub call_again_at: Option<DateTime<Utc>>,
    pub coach_note: Option<String>,
}

impl LogCallRequest {
    pub fn new(lead_id: LeadId, outcome: CallOutcome) -> Self {
        Self {
            lead_id,
            outcome,
            call_at: None,
            call_again_at: None,
            coach_note: None,
        }
    }
}

/// Logged kickstart appointment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogKickstartRequest {
    pub lead_id: LeadId,
    pub outcome: KickstartOutcome,
    pub kickstart_at: Option<DateTime<Utc>>,
    /// Mandatory for `still_thinking`.
    pub call_again_at: Option<DateTime<Utc>>,
    pub coach_note: Option<String>,
}

impl LogKickstartRequest {
    pub fn new(lead_id: LeadId, outcome: KickstartOutcome) -> Self {
        Self {
            lead_id,
            outcome,
            kickstart_at: None,
            call_again_at: None,
            coach_note: None,
        }
    }
}

/// Logged follow-up contact after a hesitant kickstart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogKickstartFollowUpRequest {
    pub lead_id: LeadId,
    pub outcome: KickstartFollowUpOutcome,
    pub follow_up_at: Option<DateTime<Utc>>,
    pub coach_note: Option<String>,
}

impl LogKickstartFollowUpRequest {
    pub fn new(lead_id: LeadId, outcome: KickstartFollowUpOutcome) -> Self {
        Self {
            lead_id,
            outcome,
            follow_up_at: None,
            coach_note: None,
        }
    }
}

/// Logged reaction to a sent message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogMessageOutcomeRequest {
    pub lead_id: LeadId,
    pub outcome: MessageOutcome,
    pub call_again_at: Option<DateTime<Utc>>,
    pub coach_note: Option<String>,
}

impl LogMessageOutcomeRequest {
    pub fn new(lead_id: LeadId, outcome: MessageOutcome) -> Self {
        Self {
            lead_id,
            outcome,
            call_again_at: None,
            coach_note: None,
        }
    }
}

/// What a processor recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeReceipt {
    pub lead_id: LeadId,
    pub event_ids: Vec<EventId>,
    pub event_types: Vec<LeadEventType>,
    pub lead_status: LeadStatus,
    pub follow_up_action: String,
    pub call_count: u32,
    pub version: i64,
}

impl OutcomeReceipt {
    pub(crate) fn from_committed(committed: CommittedLead) -> Self {
        Self {
            lead_id: committed.lead.id,
            event_ids: committed.events.iter().map(|event| event.id).collect(),
            event_types: committed
                .events
                .iter()
                .map(|event| event.event_type)
                .collect(),
            lead_status: committed.lead.status,
            follow_up_action: committed.lead.follow_up_action,
            call_count: committed.lead.call_count,
            version: committed.lead.version,
        }
    }

    pub fn first_event(&self) -> Option<(EventId, LeadEventType)> {
        self.event_ids
            .first()
            .copied()
            .zip(self.event_types.first().copied())
    }
}

/// Processor facade over a lead repository.
pub struct LeadOutcomeService<R: LeadRepository> {
    repo: R,
    env: LifecycleEnv,
    save_options: SaveOptions,
}

impl<R: LeadRepository> LeadOutcomeService<R> {
    pub fn new(repo: R, env: LifecycleEnv) -> Self {
        Self {
            repo,
            env,
            save_options: SaveOptions::default(),
        }
    }

    /// Applies `options` to every save made by this service.
    pub fn with_save_options(mut self, options: SaveOptions) -> Self {
        self.save_options = options;
        self
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Records a phone call.
    ///
    /// Increments `call_count` before deriving the status, so a `no_answer`
    /// escalates on the attempt that reaches the ceiling.
    pub fn log_call(&self, request: &LogCallRequest) -> LeadResult<OutcomeReceipt> {
        let now = self.env.clock.now();
        ensure_not_future(request.call_at, now, "callDateTime")?;
        if request.outcome.keeps_calling() {
            ensure_future(request.call_again_at, now, "callAgainDateTime")?;
        }
        info!(
            "event=log_call module=service status=start lead_id={} outcome={}",
            request.lead_id,
            request.outcome.as_str()
        );

        let mut draft = LeadDraft::new(load_lead(&self.repo, request.lead_id)?);
        let effects = self.env.side_effects();
        let occurred_at = request.call_at.unwrap_or(now);

        effects.increment_call_count(draft.lead_mut());
        self.record_events(&mut draft, request.outcome, occurred_at)?;

        if request.outcome.keeps_calling() && draft.lead().status == LeadStatus::CallAgain {
            effects.ensure_call_again_follow_up(draft.lead_mut(), request.call_again_at);
        } else {
            effects.clear_follow_up_action(draft.lead_mut());
        }
        if let Some(note) = non_blank(request.coach_note.as_deref()) {
            effects.add_coach_note(draft.lead_mut(), PHONE_NOTE_SOURCE, note, Some(occurred_at));
        }

        self.commit(draft, "log_call")
    }

    /// Records the result of a kickstart appointment.
    pub fn log_kickstart(&self, request: &LogKickstartRequest) -> LeadResult<OutcomeReceipt> {
        let now = self.env.clock.now();
        ensure_not_future(request.kickstart_at, now, "kickstartDateTime")?;
        let follow_up_at = if request.outcome == KickstartOutcome::StillThinking {
            let at = request
                .call_again_at
                .ok_or(ValidationError::MissingField("callAgainDateTime"))?;
            ensure_future(Some(at), now, "callAgainDateTime")?;
            Some(at)
        } else {
            None
        };
        info!(
            "event=log_kickstart module=service status=start lead_id={} outcome={}",
            request.lead_id,
            request.outcome.as_str()
        );

        let mut draft = LeadDraft::new(load_lead(&self.repo, request.lead_id)?);
        let effects = self.env.side_effects();
        let occurred_at = request.kickstart_at.unwrap_or(now);

        self.record_events(&mut draft, request.outcome, occurred_at)?;

        match follow_up_at {
            Some(at) => {
                effects.set_follow_up_at(draft.lead_mut(), at, &self.env.config.still_thinking_label)
            }
            None => effects.clear_follow_up_action(draft.lead_mut()),
        }
        if let Some(note) = non_blank(request.coach_note.as_deref()) {
            effects.add_coach_note(
                draft.lead_mut(),
                KICKSTART_NOTE_SOURCE,
                note,
                Some(occurred_at),
            );
        }

        self.commit(draft, "log_kickstart")
    }

    /// Records the decision taken after a `still_thinking` kickstart.
    pub fn log_kickstart_follow_up(
        &self,
        request: &LogKickstartFollowUpRequest,
    ) -> LeadResult<OutcomeReceipt> {
        let now = self.env.clock.now();
        ensure_not_future(request.follow_up_at, now, "followUpDateTime")?;
        info!(
            "event=log_kickstart_follow_up module=service status=start lead_id={} outcome={}",
            request.lead_id,
            request.outcome.as_str()
        );

        let mut draft = LeadDraft::new(load_lead(&self.repo, request.lead_id)?);
        let effects = self.env.side_effects();
        let occurred_at = request.follow_up_at.unwrap_or(now);

        self.record_events(&mut draft, request.outcome, occurred_at)?;
        if let Some(note) = non_blank(request.coach_note.as_deref()) {
            effects.add_coach_note(
                draft.lead_mut(),
                KICKSTART_FOLLOW_UP_NOTE_SOURCE,
                note,
                Some(occurred_at),
            );
        }
        effects.clear_follow_up_action(draft.lead_mut());

        self.commit(draft, "log_kickstart_follow_up")
    }

    /// Records that the queued message went out.
    pub fn log_message_sent(&self, lead_id: LeadId) -> LeadResult<OutcomeReceipt> {
        self.log_event(lead_id, LeadEventType::MessageSent, None, None)
    }

    /// Records how the lead reacted to a sent message.
    pub fn log_message_outcome(
        &self,
        request: &LogMessageOutcomeRequest,
    ) -> LeadResult<OutcomeReceipt> {
        let now = self.env.clock.now();
        if request.outcome == MessageOutcome::CallAgain {
            ensure_future(request.call_again_at, now, "callAgainDateTime")?;
        }
        info!(
            "event=log_message_outcome module=service status=start lead_id={} outcome={}",
            request.lead_id,
            request.outcome.as_str()
        );

        let mut draft = LeadDraft::new(load_lead(&self.repo, request.lead_id)?);
        let effects = self.env.side_effects();

        self.record_events(&mut draft, request.outcome, now)?;

        if request.outcome == MessageOutcome::CallAgain {
            effects.ensure_call_again_follow_up(draft.lead_mut(), request.call_again_at);
        } else {
            effects.clear_follow_up_action(draft.lead_mut());
        }
        if let Some(note) = non_blank(request.coach_note.as_deref()) {
            effects.add_coach_note(draft.lead_mut(), MESSAGE_NOTE_SOURCE, note, Some(now));
        }

        self.commit(draft, "log_message_outcome")
    }

    /// Records one event and applies its status mapping.
    ///
    /// Used for CRM notifications such as `appointment_booked`. The event date
    /// defaults to now.
    pub fn log_event(
        &self,
        lead_id: LeadId,
        event_type: LeadEventType,
        event_date: Option<DateTime<Utc>>,
        note: Option<String>,
    ) -> LeadResult<OutcomeReceipt> {
        info!(
            "event=log_event module=service status=start lead_id={} event_type={}",
            lead_id, event_type
        );
        let mut draft = LeadDraft::new(load_lead(&self.repo, lead_id)?);
        let at = event_date.unwrap_or_else(|| self.env.clock.now());
        self.record_event(&mut draft, event_type, note, at)?;
        self.commit(draft, "log_event")
    }

    fn record_events<O: Outcome>(
        &self,
        draft: &mut LeadDraft,
        outcome: O,
        at: DateTime<Utc>,
    ) -> LeadResult<()> {
        for event_type in outcome.events() {
            self.record_event(draft, *event_type, None, at)?;
        }
        Ok(())
    }

    fn record_event(
        &self,
        draft: &mut LeadDraft,
        event_type: LeadEventType,
        note: Option<String>,
        at: DateTime<Utc>,
    ) -> LeadResult<()> {
        self.env
            .side_effects()
            .log_event_at(draft, event_type, note, at);

        let next_status = if event_type == LeadEventType::NoAnswer {
            Some(status_after_no_answer(
                draft.lead().call_count,
                self.call_ceiling(draft)?,
            ))
        } else {
            event_type.resulting_status()
        };
        if let Some(status) = next_status {
            draft.lead_mut().status = status;
        }
        Ok(())
    }

    fn call_ceiling(&self, draft: &LeadDraft) -> LeadResult<u32> {
        let team = match draft.lead().team_id {
            Some(team_id) => self.repo.get_team(team_id)?,
            None => None,
        };
        Ok(max_call_attempts(
            team.as_ref(),
            self.env.config.default_max_call_attempts,
        ))
    }

    fn commit(&self, draft: LeadDraft, operation: &'static str) -> LeadResult<OutcomeReceipt> {
        commit_draft(&self.repo, &self.env, draft, self.save_options, operation)
            .map(OutcomeReceipt::from_committed)
    }
}

fn ensure_not_future(
    value: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    field: &'static str,
) -> Result<(), ValidationError> {
    match value {
        Some(at) if at > now => Err(ValidationError::DateInFuture(field)),
        _ => Ok(()),
    }
}

fn ensure_future(
    value: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    field: &'static str,
) -> Result<(), ValidationError> {
    match value {
        Some(at) if at <= now => Err(ValidationError::DateNotInFuture(field)),
        _ => Ok(()),
    }
}

/// Drops whitespace-only notes; anything else is kept as typed.
fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|text| !text.trim().is_empty())
}
