use chrono::{DateTime, Duration, TimeZone, Utc};
use leadflow_core::db::open_db_in_memory;
use leadflow_core::{
    FixedClock, KickstartFollowUpOutcome, KickstartOutcome, Lead, LeadError, LeadEventType,
    LeadId, LeadOutcomeService, LeadRepository, LeadStatus, LifecycleEnv,
    LogKickstartFollowUpRequest, LogKickstartRequest, LogMessageOutcomeRequest, MessageOutcome,
    SqliteLeadRepository, ValidationError,
};
use rusqlite::Connection;
use std::sync::Arc;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).unwrap()
}

fn service(conn: &Connection) -> LeadOutcomeService<SqliteLeadRepository<'_>> {
    let env = LifecycleEnv::default().with_clock(Arc::new(FixedClock::new(now())));
    LeadOutcomeService::new(SqliteLeadRepository::try_new(conn).unwrap(), env)
}

fn lead_in(conn: &Connection, status: LeadStatus, follow_up_action: &str) -> LeadId {
    let mut lead = Lead::new("Bert", "Janssens");
    lead.status = status;
    lead.follow_up_action = follow_up_action.to_string();
    SqliteLeadRepository::new(conn).create_lead(&lead).unwrap()
}

#[test]
fn still_thinking_requires_a_call_again_date() {
    let conn = open_db_in_memory().unwrap();
    let lead_id = lead_in(&conn, LeadStatus::AppointmentBooked, "");
    let service = service(&conn);

    let request = LogKickstartRequest::new(lead_id, KickstartOutcome::StillThinking);
    let err = service.log_kickstart(&request).unwrap_err();
    assert!(matches!(
        err,
        LeadError::Validation(ValidationError::MissingField("callAgainDateTime"))
    ));
    assert_eq!(
        err.to_string(),
        "Datum/tijd opnieuw bellen is verplicht."
    );

    let lead = service.repo().get_lead(lead_id).unwrap().unwrap();
    assert_eq!(lead.status, LeadStatus::AppointmentBooked);
    assert!(service.repo().list_events(lead_id).unwrap().is_empty());
}

#[test]
fn still_thinking_sets_the_hesitation_follow_up() {
    let conn = open_db_in_memory().unwrap();
    let lead_id = lead_in(&conn, LeadStatus::AppointmentBooked, "");
    let service = service(&conn);

    let mut request = LogKickstartRequest::new(lead_id, KickstartOutcome::StillThinking);
    request.call_again_at = Some(Utc.with_ymd_and_hms(2026, 3, 17, 18, 0, 0).unwrap());
    request.coach_note = Some("Wil eerst met partner overleggen".to_string());
    let receipt = service.log_kickstart(&request).unwrap();

    assert_eq!(receipt.lead_status, LeadStatus::StillThinking);
    assert_eq!(
        receipt.follow_up_action,
        "KS twijfel - Opvolging: 17/03/2026 19:00"
    );
    assert_eq!(
        receipt.event_types,
        vec![LeadEventType::Attended, LeadEventType::StillThinking]
    );
    assert_eq!(receipt.call_count, 0);

    let lead = service.repo().get_lead(lead_id).unwrap().unwrap();
    assert_eq!(
        lead.notes,
        "[10/03/2026 10:00] (Kickstart): Wil eerst met partner overleggen"
    );
}

#[test]
fn past_still_thinking_date_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let lead_id = lead_in(&conn, LeadStatus::AppointmentBooked, "");
    let service = service(&conn);

    let mut request = LogKickstartRequest::new(lead_id, KickstartOutcome::StillThinking);
    request.call_again_at = Some(now());
    let err = service.log_kickstart(&request).unwrap_err();
    assert!(matches!(
        err,
        LeadError::Validation(ValidationError::DateNotInFuture("callAgainDateTime"))
    ));
}

#[test]
fn no_show_routes_to_the_message_queue() {
    let conn = open_db_in_memory().unwrap();
    let lead_id = lead_in(&conn, LeadStatus::AppointmentBooked, "Herinnering sturen");
    let service = service(&conn);

    let receipt = service
        .log_kickstart(&LogKickstartRequest::new(lead_id, KickstartOutcome::NoShow))
        .unwrap();
    assert_eq!(receipt.lead_status, LeadStatus::MessageToBeSent);
    assert_eq!(receipt.event_types, vec![LeadEventType::NoShow]);
    assert!(receipt.follow_up_action.is_empty());
}

#[test]
fn kickstart_dates_in_the_future_are_rejected() {
    let conn = open_db_in_memory().unwrap();
    let lead_id = lead_in(&conn, LeadStatus::AppointmentBooked, "");
    let service = service(&conn);

    let mut request = LogKickstartRequest::new(lead_id, KickstartOutcome::BecameClient);
    request.kickstart_at = Some(now() + Duration::days(1));
    let err = service.log_kickstart(&request).unwrap_err();
    assert!(matches!(
        err,
        LeadError::Validation(ValidationError::DateInFuture("kickstartDateTime"))
    ));
}

#[test]
fn follow_up_decision_closes_the_hesitation() {
    let conn = open_db_in_memory().unwrap();
    let lead_id = lead_in(
        &conn,
        LeadStatus::StillThinking,
        "KS twijfel - Opvolging: 12/03/2026 19:00",
    );
    let service = service(&conn);

    let mut request =
        LogKickstartFollowUpRequest::new(lead_id, KickstartFollowUpOutcome::BecameClient);
    request.follow_up_at = Some(Utc.with_ymd_and_hms(2026, 3, 9, 17, 0, 0).unwrap());
    request.coach_note = Some("Start volgende week".to_string());
    let receipt = service.log_kickstart_follow_up(&request).unwrap();

    assert_eq!(receipt.lead_status, LeadStatus::BecameClient);
    assert_eq!(receipt.event_types, vec![LeadEventType::BecameClient]);
    assert!(receipt.follow_up_action.is_empty());

    let lead = service.repo().get_lead(lead_id).unwrap().unwrap();
    assert_eq!(
        lead.notes,
        "[09/03/2026 18:00] (KS - Opvolging): Start volgende week"
    );
}

#[test]
fn not_converted_follow_up_disqualifies() {
    let conn = open_db_in_memory().unwrap();
    let lead_id = lead_in(&conn, LeadStatus::StillThinking, "");
    let service = service(&conn);

    let receipt = service
        .log_kickstart_follow_up(&LogKickstartFollowUpRequest::new(
            lead_id,
            KickstartFollowUpOutcome::NotConverted,
        ))
        .unwrap();
    assert_eq!(receipt.lead_status, LeadStatus::Disqualified);
}

#[test]
fn message_sent_moves_out_of_the_queue() {
    let conn = open_db_in_memory().unwrap();
    let lead_id = lead_in(&conn, LeadStatus::MessageToBeSent, "");
    let service = service(&conn);

    let receipt = service.log_message_sent(lead_id).unwrap();
    assert_eq!(receipt.lead_status, LeadStatus::MessageSent);
    let (_, event_type) = receipt.first_event().unwrap();
    assert_eq!(event_type, LeadEventType::MessageSent);
}

#[test]
fn not_interested_after_message_clears_follow_up() {
    let conn = open_db_in_memory().unwrap();
    let lead_id = lead_in(&conn, LeadStatus::MessageSent, "Opnieuw bellen: 11/03/2026 10:00");
    let service = service(&conn);

    let mut request = LogMessageOutcomeRequest::new(lead_id, MessageOutcome::NotInterested);
    request.coach_note = Some("Reageert niet meer".to_string());
    let receipt = service.log_message_outcome(&request).unwrap();

    assert_eq!(receipt.lead_status, LeadStatus::Disqualified);
    assert!(receipt.follow_up_action.is_empty());
    assert_eq!(receipt.event_types, vec![LeadEventType::NotInterested]);

    let lead = service.repo().get_lead(lead_id).unwrap().unwrap();
    assert_eq!(lead.notes, "[10/03/2026 10:00] (Bericht): Reageert niet meer");
}

#[test]
fn call_again_after_message_gets_a_default_follow_up() {
    let conn = open_db_in_memory().unwrap();
    let lead_id = lead_in(&conn, LeadStatus::MessageSent, "");
    let service = service(&conn);

    let receipt = service
        .log_message_outcome(&LogMessageOutcomeRequest::new(
            lead_id,
            MessageOutcome::CallAgain,
        ))
        .unwrap();
    assert_eq!(receipt.lead_status, LeadStatus::CallAgain);
    assert_eq!(receipt.follow_up_action, "Opnieuw bellen: 11/03/2026 10:00");
}

#[test]
fn external_booking_event_applies_the_status_map() {
    let conn = open_db_in_memory().unwrap();
    let lead_id = lead_in(&conn, LeadStatus::Invited, "");
    let service = service(&conn);

    let booked_at = Utc.with_ymd_and_hms(2026, 3, 9, 12, 0, 0).unwrap();
    let receipt = service
        .log_event(lead_id, LeadEventType::AppointmentBooked, Some(booked_at), None)
        .unwrap();
    assert_eq!(receipt.lead_status, LeadStatus::AppointmentBooked);

    let events = service.repo().list_events(lead_id).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_date, booked_at);

    let receipt = service
        .log_event(lead_id, LeadEventType::AppointmentCancelled, None, None)
        .unwrap();
    assert_eq!(receipt.lead_status, LeadStatus::AppointmentCancelled);
}
