use leadflow_core::db::open_db_in_memory;
use leadflow_core::{
    allowed_next_states, can_transition, can_transition_raw, validate_status_change, ErrorKind,
    Lead, LeadError, LeadEventType, LeadService, LeadStatus, LeadUpdate, LifecycleEnv,
    SqliteLeadRepository,
};

#[test]
fn self_transitions_are_always_legal() {
    for status in LeadStatus::ALL {
        assert!(can_transition(status, status), "{status}");
    }
}

#[test]
fn terminal_states_have_no_successors() {
    assert!(allowed_next_states(LeadStatus::Dead).is_empty());
    assert!(allowed_next_states(LeadStatus::Converted).is_empty());
    for to in LeadStatus::ALL {
        if to != LeadStatus::Dead {
            assert!(!can_transition(LeadStatus::Dead, to), "dead -> {to}");
        }
    }
}

#[test]
fn validator_agrees_with_the_table_for_every_pair() {
    for from in LeadStatus::ALL {
        for to in LeadStatus::ALL {
            let legal = can_transition(from, to);
            assert_eq!(
                validate_status_change(Some(from), to).is_ok(),
                legal,
                "{from} -> {to}"
            );
        }
    }
}

#[test]
fn raw_lookup_fails_closed_on_unknown_states() {
    assert!(can_transition_raw("new", "assigned"));
    assert!(can_transition_raw("Dead", "dead"));
    assert!(!can_transition_raw("archived", "new"));
    assert!(!can_transition_raw("new", "archived"));
}

#[test]
fn sample_pairs_match_the_lifecycle() {
    assert!(can_transition(LeadStatus::Assigned, LeadStatus::CallAgain));
    assert!(can_transition(LeadStatus::CallAgain, LeadStatus::MessageToBeSent));
    assert!(can_transition(LeadStatus::StillThinking, LeadStatus::BecameClient));
    assert!(can_transition(LeadStatus::Disqualified, LeadStatus::CallAgain));
    assert!(!can_transition(LeadStatus::New, LeadStatus::Invited));
    assert!(!can_transition(LeadStatus::BecameClient, LeadStatus::CallAgain));
}

#[test]
fn update_lead_rejects_illegal_status_before_writing() {
    let conn = open_db_in_memory().unwrap();
    let service = LeadService::new(
        SqliteLeadRepository::try_new(&conn).unwrap(),
        LifecycleEnv::default(),
    );
    let lead = service.create_lead(&Lead::new("Ann", "Peeters")).unwrap();

    let update = LeadUpdate {
        status: Some(LeadStatus::Invited),
        ..LeadUpdate::default()
    };
    let err = service.update_lead(lead.id, &update).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadRequest);
    match &err {
        LeadError::IllegalTransition(details) => {
            assert_eq!(details.from, LeadStatus::New);
            assert_eq!(details.to, LeadStatus::Invited);
            assert_eq!(details.allowed, vec![LeadStatus::Assigned]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(
        err.to_string(),
        "invalid status transition from 'new' to 'invited'; allowed transitions: assigned"
    );

    let stored = service.get_lead(lead.id).unwrap();
    assert_eq!(stored.status, LeadStatus::New);
    assert_eq!(stored.version, 0);
}

#[test]
fn update_lead_applies_legal_changes_and_detects_stale_versions() {
    let conn = open_db_in_memory().unwrap();
    let service = LeadService::new(
        SqliteLeadRepository::try_new(&conn).unwrap(),
        LifecycleEnv::default(),
    );
    let lead = service.create_lead(&Lead::new("Ann", "Peeters")).unwrap();

    let updated = service
        .update_lead(
            lead.id,
            &LeadUpdate {
                status: Some(LeadStatus::Assigned),
                follow_up_action: Some("Bellen na 18u".to_string()),
                expected_version: Some(0),
                ..LeadUpdate::default()
            },
        )
        .unwrap();
    assert_eq!(updated.status, LeadStatus::Assigned);
    assert_eq!(updated.follow_up_action, "Bellen na 18u");
    assert_eq!(updated.version, 1);

    let err = service
        .update_lead(
            lead.id,
            &LeadUpdate {
                first_name: Some("Anna".to_string()),
                expected_version: Some(0),
                ..LeadUpdate::default()
            },
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[test]
fn unchanged_status_passes_even_from_terminal_states() {
    let conn = open_db_in_memory().unwrap();
    let service = LeadService::new(
        SqliteLeadRepository::try_new(&conn).unwrap(),
        LifecycleEnv::default(),
    );
    let mut lead = Lead::new("Ann", "Peeters");
    lead.status = LeadStatus::Converted;
    let lead = service.create_lead(&lead).unwrap();

    let updated = service
        .update_lead(
            lead.id,
            &LeadUpdate {
                status: Some(LeadStatus::Converted),
                last_name: Some("Peeters-Maes".to_string()),
                ..LeadUpdate::default()
            },
        )
        .unwrap();
    assert_eq!(updated.last_name, "Peeters-Maes");
}

#[test]
fn direct_status_change_records_the_marking_event() {
    let conn = open_db_in_memory().unwrap();
    let service = LeadService::new(
        SqliteLeadRepository::try_new(&conn).unwrap(),
        LifecycleEnv::default(),
    );
    let mut lead = Lead::new("Ann", "Peeters");
    lead.status = LeadStatus::Assigned;
    let lead = service.create_lead(&lead).unwrap();

    let updated = service
        .update_lead(
            lead.id,
            &LeadUpdate {
                status: Some(LeadStatus::CallAgain),
                ..LeadUpdate::default()
            },
        )
        .unwrap();
    assert_eq!(updated.status, LeadStatus::CallAgain);

    let events = service.list_events(lead.id).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, LeadEventType::CallAgain);
    assert_eq!(
        events[0].note.as_deref(),
        Some("Status handmatig gewijzigd van assigned naar call_again.")
    );

    service
        .update_lead(
            lead.id,
            &LeadUpdate {
                status: Some(LeadStatus::Disqualified),
                ..LeadUpdate::default()
            },
        )
        .unwrap();
    let events = service.list_events(lead.id).unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[1].event_type, LeadEventType::NotInterested);
}

#[test]
fn updates_without_a_status_change_record_nothing() {
    let conn = open_db_in_memory().unwrap();
    let service = LeadService::new(
        SqliteLeadRepository::try_new(&conn).unwrap(),
        LifecycleEnv::default(),
    );
    let lead = service.create_lead(&Lead::new("Ann", "Peeters")).unwrap();

    service
        .update_lead(
            lead.id,
            &LeadUpdate {
                status: Some(LeadStatus::New),
                first_name: Some("Anna".to_string()),
                ..LeadUpdate::default()
            },
        )
        .unwrap();
    service
        .update_lead(
            lead.id,
            &LeadUpdate {
                status: Some(LeadStatus::Assigned),
                ..LeadUpdate::default()
            },
        )
        .unwrap();

    assert!(service.list_events(lead.id).unwrap().is_empty());
    assert_eq!(service.get_lead(lead.id).unwrap().status, LeadStatus::Assigned);
}
