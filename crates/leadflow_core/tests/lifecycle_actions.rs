use chrono::{TimeZone, Utc};
use leadflow_core::db::open_db_in_memory;
use leadflow_core::{
    CallOutcome, ErrorKind, FixedClock, Lead, LeadAction, LeadError, LeadEvent, LeadEventType,
    LeadObserver, LeadOutcomeService, LeadService, LeadStatus, LifecycleEnv, LogCallRequest,
    ObserverError, SaveOptions, SqliteLeadRepository, Team,
};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

fn env() -> LifecycleEnv {
    LifecycleEnv::default().with_clock(Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).unwrap(),
    )))
}

fn lead_service(conn: &Connection, env: LifecycleEnv) -> LeadService<SqliteLeadRepository<'_>> {
    LeadService::new(SqliteLeadRepository::try_new(conn).unwrap(), env)
}

#[derive(Default)]
struct RecordingObserver {
    saved: Mutex<Vec<(LeadStatus, usize)>>,
}

impl LeadObserver for RecordingObserver {
    fn lead_saved(&self, lead: &Lead, events: &[LeadEvent]) -> Result<(), ObserverError> {
        self.saved.lock().unwrap().push((lead.status, events.len()));
        Ok(())
    }
}

struct FailingObserver;

impl LeadObserver for FailingObserver {
    fn lead_saved(&self, _lead: &Lead, _events: &[LeadEvent]) -> Result<(), ObserverError> {
        Err("webhook unreachable".into())
    }
}

#[test]
fn happy_path_from_new_to_converted() {
    let conn = open_db_in_memory().unwrap();
    let service = lead_service(&conn, env());
    let team = service.create_team(&Team::new("Gent")).unwrap();
    let lead = service.create_lead(&Lead::new("Ann", "Peeters")).unwrap();

    let lead = service.assign_team(lead.id, Some(team.id)).unwrap();
    assert_eq!(lead.status, LeadStatus::Assigned);
    assert_eq!(lead.team_id, Some(team.id));

    let steps = [
        (LeadAction::Invite, LeadStatus::Invited),
        (LeadAction::BookAppointment, LeadStatus::AppointmentBooked),
        (LeadAction::StartProgram, LeadStatus::BecameClient),
        (LeadAction::Convert, LeadStatus::Converted),
    ];
    for (action, expected) in steps {
        let receipt = service.apply_action(lead.id, &action).unwrap();
        assert_eq!(receipt.lead_status, expected, "{}", action.name());
    }

    let events: Vec<LeadEventType> = service
        .list_events(lead.id)
        .unwrap()
        .into_iter()
        .map(|event| event.event_type)
        .collect();
    assert_eq!(
        events,
        vec![
            LeadEventType::Invited,
            LeadEventType::AppointmentBooked,
            LeadEventType::BecameClient,
        ]
    );
}

#[test]
fn actions_outside_the_current_state_are_forbidden() {
    let conn = open_db_in_memory().unwrap();
    let service = lead_service(&conn, env());
    let lead = service.create_lead(&Lead::new("Ann", "Peeters")).unwrap();

    let err = service
        .apply_action(lead.id, &LeadAction::Invite)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
    assert!(matches!(err, LeadError::ActionNotAllowed(_)));
    assert_eq!(
        err.to_string(),
        "action 'invite' is not allowed from status 'new'"
    );
    assert_eq!(service.get_lead(lead.id).unwrap().version, 0);
}

#[test]
fn no_answer_action_counts_the_call_and_schedules_a_retry() {
    let conn = open_db_in_memory().unwrap();
    let service = lead_service(&conn, env());
    let mut lead = Lead::new("Ann", "Peeters");
    lead.status = LeadStatus::Assigned;
    let lead = service.create_lead(&lead).unwrap();

    let receipt = service
        .apply_action(lead.id, &LeadAction::MoveToCallAgain)
        .unwrap();
    assert_eq!(receipt.lead_status, LeadStatus::CallAgain);
    assert_eq!(receipt.call_count, 1);
    assert_eq!(receipt.follow_up_action, "Opnieuw bellen: 11/03/2026 10:00");
    assert_eq!(receipt.event_types, vec![LeadEventType::NoAnswer]);
}

#[test]
fn disqualify_records_the_reason_and_resurrect_reopens() {
    let conn = open_db_in_memory().unwrap();
    let service = lead_service(&conn, env());
    let mut lead = Lead::new("Ann", "Peeters");
    lead.status = LeadStatus::CallAgain;
    lead.follow_up_action = "Opnieuw bellen: 11/03/2026 10:00".to_string();
    let lead = service.create_lead(&lead).unwrap();

    let receipt = service
        .apply_action(
            lead.id,
            &LeadAction::Disqualify {
                reason: "te duur".to_string(),
            },
        )
        .unwrap();
    assert_eq!(receipt.lead_status, LeadStatus::Disqualified);
    assert!(receipt.follow_up_action.is_empty());

    let events = service.list_events(lead.id).unwrap();
    assert_eq!(events[0].event_type, LeadEventType::NotInterested);
    assert_eq!(events[0].note.as_deref(), Some("Lead vervallen: te duur"));

    let receipt = service
        .apply_action(
            lead.id,
            &LeadAction::Resurrect {
                target: LeadStatus::CallAgain,
            },
        )
        .unwrap();
    assert_eq!(receipt.lead_status, LeadStatus::CallAgain);
    assert!(!receipt.follow_up_action.is_empty());
}

#[test]
fn unlinking_a_team_keeps_the_status() {
    let conn = open_db_in_memory().unwrap();
    let service = lead_service(&conn, env());
    let team = service.create_team(&Team::new("Gent")).unwrap();
    let lead = service.create_lead(&Lead::new("Ann", "Peeters")).unwrap();
    service.assign_team(lead.id, Some(team.id)).unwrap();

    let lead = service.assign_team(lead.id, None).unwrap();
    assert_eq!(lead.team_id, None);
    assert_eq!(lead.status, LeadStatus::Assigned);

    let err = service
        .assign_team(lead.id, Some(uuid::Uuid::new_v4()))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn observer_sees_durable_saves_unless_hooks_are_skipped() {
    let conn = open_db_in_memory().unwrap();
    let observer = Arc::new(RecordingObserver::default());
    let env = env().with_observer(observer.clone());
    let mut lead = Lead::new("Ann", "Peeters");
    lead.status = LeadStatus::Assigned;
    let lead = lead_service(&conn, env.clone()).create_lead(&lead).unwrap();

    let outcomes = LeadOutcomeService::new(SqliteLeadRepository::new(&conn), env.clone());
    outcomes
        .log_call(&LogCallRequest::new(lead.id, CallOutcome::Invited))
        .unwrap();
    assert_eq!(
        *observer.saved.lock().unwrap(),
        vec![(LeadStatus::Invited, 2)]
    );

    let quiet = LeadOutcomeService::new(SqliteLeadRepository::new(&conn), env)
        .with_save_options(SaveOptions { skip_hooks: true });
    quiet
        .log_event(lead.id, LeadEventType::AppointmentBooked, None, None)
        .unwrap();
    assert_eq!(observer.saved.lock().unwrap().len(), 1);
}

#[test]
fn failing_observer_does_not_undo_the_save() {
    let conn = open_db_in_memory().unwrap();
    let env = env().with_observer(Arc::new(FailingObserver));
    let mut lead = Lead::new("Ann", "Peeters");
    lead.status = LeadStatus::MessageToBeSent;
    let lead = lead_service(&conn, env.clone()).create_lead(&lead).unwrap();

    let outcomes = LeadOutcomeService::new(SqliteLeadRepository::new(&conn), env);
    let receipt = outcomes.log_message_sent(lead.id).unwrap();
    assert_eq!(receipt.lead_status, LeadStatus::MessageSent);
    assert_eq!(receipt.version, 1);
}

#[test]
fn zero_attempt_team_is_a_bad_request() {
    let conn = open_db_in_memory().unwrap();
    let service = lead_service(&conn, env());
    let mut team = Team::new("Brugge");
    team.max_call_attempts = Some(0);

    let err = service.create_team(&team).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadRequest);
    assert_eq!(err.public_message(), "team max_call_attempts must be at least 1");
    assert_eq!(service.find_team_by_name("Brugge").unwrap(), None);
}
