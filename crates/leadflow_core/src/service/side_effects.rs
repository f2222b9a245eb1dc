//! In-memory lead mutations shared by every outcome processor.
//!
//! # Responsibility
//! - Stage lead field changes and new events on a [`LeadDraft`].
//! - Render follow-up lines and coach-note headers in the organization zone.
//!
//! # Invariants
//! - Nothing here touches storage; the caller persists the draft once.
//! - Staged events always belong to the draft's lead.
//! - `call_count` only grows.

use crate::clock::{add_local_days, format_local, parse_local_datetime, Clock};
use crate::config::LifecycleConfig;
use crate::model::event::{EventId, LeadEvent, LeadEventType};
use crate::model::lead::{Lead, LeadStatus};
use crate::service::error::ValidationError;
use chrono::{DateTime, Duration, Utc};

/// Lead under mutation plus the events it will record on save.
#[derive(Debug, Clone)]
pub struct LeadDraft {
    lead: Lead,
    loaded_status: LeadStatus,
    events: Vec<LeadEvent>,
}

impl LeadDraft {
    pub fn new(lead: Lead) -> Self {
        Self {
            loaded_status: lead.status,
            lead,
            events: Vec::new(),
        }
    }

    pub fn lead(&self) -> &Lead {
        &self.lead
    }

    pub fn lead_mut(&mut self) -> &mut Lead {
        &mut self.lead
    }

    /// Status the lead had when it was loaded.
    pub fn loaded_status(&self) -> LeadStatus {
        self.loaded_status
    }

    pub fn events(&self) -> &[LeadEvent] {
        &self.events
    }

    pub fn event_ids(&self) -> Vec<EventId> {
        self.events.iter().map(|event| event.id).collect()
    }

    pub fn into_parts(self) -> (Lead, Vec<LeadEvent>) {
        (self.lead, self.events)
    }
}

/// Side-effect helpers bound to one clock and organization config.
pub struct SideEffectEngine<'a> {
    clock: &'a dyn Clock,
    config: &'a LifecycleConfig,
}

impl<'a> SideEffectEngine<'a> {
    pub fn new(clock: &'a dyn Clock, config: &'a LifecycleConfig) -> Self {
        Self { clock, config }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn increment_call_count(&self, lead: &mut Lead) {
        lead.call_count = lead.call_count.saturating_add(1);
    }

    /// Parses `when_local` and sets `"<label>: dd/mm/yyyy HH:MM"`.
    ///
    /// # Errors
    /// - `InvalidDateTime` naming `field` when `when_local` cannot be read.
    pub fn add_follow_up_action(
        &self,
        lead: &mut Lead,
        when_local: &str,
        label: &str,
        field: &'static str,
    ) -> Result<(), ValidationError> {
        let when = parse_local_datetime(when_local, self.config.timezone).ok_or_else(|| {
            ValidationError::InvalidDateTime {
                field,
                value: when_local.to_string(),
            }
        })?;
        self.set_follow_up_at(lead, when, label);
        Ok(())
    }

    pub fn set_follow_up_at(&self, lead: &mut Lead, when: DateTime<Utc>, label: &str) {
        lead.follow_up_action = format!("{label}: {}", format_local(when, self.config.timezone));
    }

    pub fn clear_follow_up_action(&self, lead: &mut Lead) {
        lead.follow_up_action.clear();
    }

    /// Now plus one calendar day in the organization zone.
    pub fn default_follow_up_at(&self) -> DateTime<Utc> {
        let now = self.now();
        add_local_days(now, self.config.timezone, 1).unwrap_or(now + Duration::days(1))
    }

    /// Guarantees a call-again follow-up on a lead in the retry loop.
    ///
    /// An explicit date always wins. Without one, a pending follow-up is kept
    /// and an empty one gets the default.
    pub fn ensure_call_again_follow_up(&self, lead: &mut Lead, explicit: Option<DateTime<Utc>>) {
        match explicit {
            Some(when) => self.set_follow_up_at(lead, when, &self.config.call_again_label),
            None if lead.has_pending_follow_up() => {}
            None => {
                let when = self.default_follow_up_at();
                self.set_follow_up_at(lead, when, &self.config.call_again_label);
            }
        }
    }

    /// Stages an event, reading `event_date_local` in the organization zone.
    ///
    /// # Errors
    /// - `InvalidDateTime` when `event_date_local` is present but unreadable.
    pub fn log_event(
        &self,
        draft: &mut LeadDraft,
        event_type: LeadEventType,
        note: Option<String>,
        event_date_local: Option<&str>,
    ) -> Result<EventId, ValidationError> {
        let at = match event_date_local {
            Some(raw) => parse_local_datetime(raw, self.config.timezone).ok_or_else(|| {
                ValidationError::InvalidDateTime {
                    field: "eventDate",
                    value: raw.to_string(),
                }
            })?,
            None => self.now(),
        };
        Ok(self.log_event_at(draft, event_type, note, at))
    }

    pub fn log_event_at(
        &self,
        draft: &mut LeadDraft,
        event_type: LeadEventType,
        note: Option<String>,
        at: DateTime<Utc>,
    ) -> EventId {
        let event = LeadEvent::new(draft.lead.id, event_type, at).with_note(note);
        let id = event.id;
        draft.events.push(event);
        id
    }

    /// Prepends `[dd/mm/yyyy HH:MM] (source): text` above existing notes.
    pub fn add_coach_note(
        &self,
        lead: &mut Lead,
        source: &str,
        text: &str,
        at: Option<DateTime<Utc>>,
    ) {
        let stamp = format_local(at.unwrap_or_else(|| self.now()), self.config.timezone);
        lead.notes = prepend_note(&lead.notes, &compose_coach_note(&stamp, source, text));
    }
}

/// Header plus the note text exactly as the coach wrote it.
pub fn compose_coach_note(stamp: &str, source: &str, text: &str) -> String {
    format!("[{stamp}] ({source}): {text}")
}

fn prepend_note(existing: &str, line: &str) -> String {
    if existing.is_empty() {
        line.to_string()
    } else {
        format!("{line}\n\n{existing}")
    }
}
