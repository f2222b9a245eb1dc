//! Lead record use-cases outside the outcome processors.
//!
//! # Responsibility
//! - Create, read and list leads and teams.
//! - Apply direct record updates behind the status validator.
//! - Link teams and run named lifecycle actions.
//!
//! # Invariants
//! - A status change on an existing lead is checked against the transition
//!   table before anything is written.
//! - Lifecycle actions never produce a transition outside the table.
//! - Status changes are audited by an event, except moves into `assigned`
//!   and `converted`, which have no marker in the event taxonomy.

use crate::lifecycle::actions::{plan_action, LeadAction};
use crate::lifecycle::validator::validate_status_change;
use crate::model::event::{LeadEvent, LeadEventType};
use crate::model::lead::{Lead, LeadId, LeadStatus};
use crate::model::team::{Team, TeamId};
use crate::repo::lead_repo::{LeadFilter, LeadListQuery, LeadRepository};
use crate::service::env::{commit_draft, load_lead, LifecycleEnv};
use crate::service::error::{LeadError, LeadResult};
use crate::service::notify::SaveOptions;
use crate::service::outcome_service::OutcomeReceipt;
use crate::service::side_effects::LeadDraft;
use log::info;

/// Partial record update. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeadUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub status: Option<LeadStatus>,
    pub follow_up_action: Option<String>,
    /// Reject the update when the stored version differs.
    pub expected_version: Option<i64>,
}

/// Record-level facade over a lead repository.
pub struct LeadService<R: LeadRepository> {
    repo: R,
    env: LifecycleEnv,
    save_options: SaveOptions,
}

impl<R: LeadRepository> LeadService<R> {
    pub fn new(repo: R, env: LifecycleEnv) -> Self {
        Self {
            repo,
            env,
            save_options: SaveOptions::default(),
        }
    }

    pub fn with_save_options(mut self, options: SaveOptions) -> Self {
        self.save_options = options;
        self
    }

    /// Stores a new lead and returns the persisted record.
    pub fn create_lead(&self, lead: &Lead) -> LeadResult<Lead> {
        validate_status_change(None, lead.status)?;
        if let Some(team_id) = lead.team_id {
            self.require_team(team_id)?;
        }
        let lead_id = self.repo.create_lead(lead)?;
        info!(
            "event=lead_create module=service status=ok lead_id={} lead_status={}",
            lead_id, lead.status
        );
        load_lead(&self.repo, lead_id)
    }

    pub fn get_lead(&self, lead_id: LeadId) -> LeadResult<Lead> {
        load_lead(&self.repo, lead_id)
    }

    pub fn find_by_external_ref(&self, external_ref: &str) -> LeadResult<Option<Lead>> {
        Ok(self
            .repo
            .find_lead(&LeadFilter::ExternalRef(external_ref.trim().to_string()))?)
    }

    pub fn list_leads(&self, query: &LeadListQuery) -> LeadResult<Vec<Lead>> {
        Ok(self.repo.list_leads(query)?)
    }

    /// Lists the lead's events, oldest first.
    pub fn list_events(&self, lead_id: LeadId) -> LeadResult<Vec<LeadEvent>> {
        load_lead(&self.repo, lead_id)?;
        Ok(self.repo.list_events(lead_id)?)
    }

    pub fn create_team(&self, team: &Team) -> LeadResult<Team> {
        let team_id = self.repo.create_team(team)?;
        self.require_team(team_id)
    }

    pub fn find_team_by_name(&self, name: &str) -> LeadResult<Option<Team>> {
        Ok(self.repo.find_team_by_name(name)?)
    }

    /// Applies a direct record update.
    ///
    /// A status change records the event that marks the new status, when the
    /// taxonomy has one.
    ///
    /// # Errors
    /// - `IllegalTransition` when the status change is not in the table.
    /// - `Conflict` when `expected_version` is stale.
    pub fn update_lead(&self, lead_id: LeadId, update: &LeadUpdate) -> LeadResult<Lead> {
        let lead = load_lead(&self.repo, lead_id)?;
        if let Some(expected_version) = update.expected_version {
            if expected_version != lead.version {
                return Err(LeadError::Conflict {
                    lead_id,
                    expected_version,
                });
            }
        }
        if let Some(next) = update.status {
            if next != lead.status {
                validate_status_change(Some(lead.status), next)?;
            }
        }

        let mut draft = LeadDraft::new(lead);
        let target = draft.lead_mut();
        if let Some(first_name) = &update.first_name {
            target.first_name = first_name.clone();
        }
        if let Some(last_name) = &update.last_name {
            target.last_name = last_name.clone();
        }
        if let Some(follow_up_action) = &update.follow_up_action {
            target.follow_up_action = follow_up_action.trim().to_string();
        }
        if let Some(next) = update.status.filter(|next| *next != draft.loaded_status()) {
            let from = draft.loaded_status();
            draft.lead_mut().status = next;
            if let Some(event_type) = LeadEventType::marking(next) {
                let effects = self.env.side_effects();
                let now = effects.now();
                let note = format!("Status handmatig gewijzigd van {from} naar {next}.");
                effects.log_event_at(&mut draft, event_type, Some(note), now);
            }
        }

        commit_draft(&self.repo, &self.env, draft, self.save_options, "update_lead")
            .map(|committed| committed.lead)
    }

    /// Links (`Some`) or unlinks (`None`) the owning team.
    ///
    /// Linking a team to a `new` lead assigns it.
    pub fn assign_team(&self, lead_id: LeadId, team_id: Option<TeamId>) -> LeadResult<Lead> {
        if let Some(team_id) = team_id {
            self.require_team(team_id)?;
        }
        let mut draft = LeadDraft::new(load_lead(&self.repo, lead_id)?);
        draft.lead_mut().team_id = team_id;
        if team_id.is_some() && draft.lead().status == LeadStatus::New {
            let plan = plan_action(LeadStatus::New, &LeadAction::Assign)?;
            draft.lead_mut().status = plan.next_status;
        }

        commit_draft(&self.repo, &self.env, draft, self.save_options, "assign_team")
            .map(|committed| committed.lead)
    }

    /// Runs a named lifecycle action from the lead's current status.
    ///
    /// # Errors
    /// - `ActionNotAllowed` when the status has no handler for `action`.
    pub fn apply_action(&self, lead_id: LeadId, action: &LeadAction) -> LeadResult<OutcomeReceipt> {
        let mut draft = LeadDraft::new(load_lead(&self.repo, lead_id)?);
        let plan = plan_action(draft.lead().status, action)?;
        info!(
            "event=apply_action module=service status=start lead_id={} action={} from={} to={}",
            lead_id,
            action.name(),
            draft.lead().status,
            plan.next_status
        );

        let effects = self.env.side_effects();
        if plan.increments_call_count {
            effects.increment_call_count(draft.lead_mut());
        }
        if let Some(event_type) = plan.event {
            let now = effects.now();
            effects.log_event_at(&mut draft, event_type, plan.note.clone(), now);
        }
        draft.lead_mut().status = plan.next_status;

        match plan.next_status {
            LeadStatus::CallAgain => effects.ensure_call_again_follow_up(draft.lead_mut(), None),
            LeadStatus::BecameClient
            | LeadStatus::Converted
            | LeadStatus::Disqualified
            | LeadStatus::Dead => effects.clear_follow_up_action(draft.lead_mut()),
            _ => {}
        }

        commit_draft(&self.repo, &self.env, draft, self.save_options, "apply_action")
            .map(OutcomeReceipt::from_committed)
    }

    fn require_team(&self, team_id: TeamId) -> LeadResult<Team> {
        self.repo
            .get_team(team_id)?
            .ok_or(LeadError::TeamNotFound(team_id))
    }
}
