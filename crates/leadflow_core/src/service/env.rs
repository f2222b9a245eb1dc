//! Injected collaborators and the shared load/commit path.
//!
//! # Responsibility
//! - Bundle clock, organization config and post-save observer.
//! - Load a lead for mutation and persist a finished draft in one step.
//!
//! # Invariants
//! - A draft is persisted in one repository call (lead + events atomically).
//! - The observer runs only after a durable save and cannot fail it.

use crate::clock::{Clock, SystemClock};
use crate::config::LifecycleConfig;
use crate::lifecycle::transitions::can_transition;
use crate::model::event::LeadEvent;
use crate::model::lead::{Lead, LeadId};
use crate::repo::lead_repo::LeadRepository;
use crate::service::error::{LeadError, LeadResult};
use crate::service::notify::{LeadObserver, NoopObserver, SaveOptions};
use crate::service::side_effects::{LeadDraft, SideEffectEngine};
use log::{info, warn};
use std::sync::Arc;
use std::time::Instant;

/// Collaborators shared by the lifecycle services.
#[derive(Clone)]
pub struct LifecycleEnv {
    pub clock: Arc<dyn Clock>,
    pub config: LifecycleConfig,
    pub observer: Arc<dyn LeadObserver>,
}

impl Default for LifecycleEnv {
    fn default() -> Self {
        Self::new(LifecycleConfig::default())
    }
}

impl LifecycleEnv {
    /// System clock and no observer.
    pub fn new(config: LifecycleConfig) -> Self {
        Self {
            clock: Arc::new(SystemClock),
            config,
            observer: Arc::new(NoopObserver),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn LeadObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn side_effects(&self) -> SideEffectEngine<'_> {
        SideEffectEngine::new(self.clock.as_ref(), &self.config)
    }
}

/// Result of a committed draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedLead {
    /// Stored lead with its new version.
    pub lead: Lead,
    pub events: Vec<LeadEvent>,
}

pub(crate) fn load_lead<R: LeadRepository>(repo: &R, lead_id: LeadId) -> LeadResult<Lead> {
    repo.get_lead(lead_id)?
        .ok_or(LeadError::LeadNotFound(lead_id))
}

/// Persists `draft` and notifies the observer.
pub(crate) fn commit_draft<R: LeadRepository>(
    repo: &R,
    env: &LifecycleEnv,
    draft: LeadDraft,
    options: SaveOptions,
    operation: &'static str,
) -> LeadResult<CommittedLead> {
    let started_at = Instant::now();
    let from = draft.loaded_status();
    let (lead, events) = draft.into_parts();

    if from != lead.status && !can_transition(from, lead.status) {
        warn!(
            "event=transition_outside_table module=service op={} lead_id={} from={} to={}",
            operation, lead.id, from, lead.status
        );
    }

    let stored = match repo.save_lead(&lead, &events) {
        Ok(stored) => stored,
        Err(err) => {
            let err = LeadError::from(err);
            warn!(
                "event=lead_save module=service status=error op={} lead_id={} error_kind={} duration_ms={}",
                operation,
                lead.id,
                err.kind().as_str(),
                started_at.elapsed().as_millis()
            );
            return Err(err);
        }
    };

    info!(
        "event=lead_save module=service status=ok op={} lead_id={} from={} to={} events={} version={} duration_ms={}",
        operation,
        stored.id,
        from,
        stored.status,
        events.len(),
        stored.version,
        started_at.elapsed().as_millis()
    );

    if !options.skip_hooks {
        if let Err(err) = env.observer.lead_saved(&stored, &events) {
            warn!(
                "event=observer_notify module=service status=error op={} lead_id={} error={}",
                operation,
                stored.id,
                crate::logging::sanitize_for_log(&err.to_string())
            );
        }
    }

    Ok(CommittedLead {
        lead: stored,
        events,
    })
}
