//! Screen-level tests over the in-memory store: live mirroring,
//! validation policy, scoping, ordering and teardown.

mod common;

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use common::{test_session, wait_for, MemoryStore, RecordingAlerts};
use medilink_rust::auth::SessionHandle;
use medilink_rust::error::Error;
use medilink_rust::live::AdapterState;
use medilink_rust::models::{AppointmentStatus, DaySchedule, WeekSchedule};
use medilink_rust::screens::{AppointmentScreen, ChatScreen, PrescriptionScreen, ReminderScreen};
use medilink_rust::store::DocumentStore;

fn alerts() -> Arc<RecordingAlerts> {
    Arc::new(RecordingAlerts::default())
}

#[tokio::test]
async fn booking_writes_owned_pending_appointment_and_clears_form() {
    let store = MemoryStore::new();
    let alerts = alerts();
    let mut screen = AppointmentScreen::new(
        Arc::new(store.clone()),
        test_session("u1"),
        alerts.clone(),
        "d1",
    );

    screen.open().await.unwrap();
    let mut updates = screen.updates();

    screen.date = "2025-03-10".to_string();
    screen.time = "09:30".to_string();
    screen.submit().await.unwrap();

    assert!(screen.date.is_empty());
    assert!(screen.time.is_empty());
    assert_eq!(alerts.messages(), vec!["Appointment created"]);

    wait_for(&mut updates, || screen.appointments().len() == 1).await;
    let booked = &screen.appointments()[0];
    assert_eq!(booked.user_id, "u1");
    assert_eq!(booked.doctor_id, "d1");
    assert_eq!(booked.date, "2025-03-10");
    assert_eq!(booked.time, "09:30");
    assert_eq!(booked.status, AppointmentStatus::Pending);
    assert_eq!(screen.state(), AdapterState::Live);
}

#[tokio::test]
async fn blank_booking_alerts_and_writes_nothing() {
    let store = MemoryStore::new();
    let alerts = alerts();
    let mut screen = AppointmentScreen::new(
        Arc::new(store.clone()),
        test_session("u1"),
        alerts.clone(),
        "d1",
    );
    screen.open().await.unwrap();

    screen.date = "  ".to_string();
    screen.time = String::new();
    let err = screen.submit().await;
    assert!(matches!(err, Err(Error::Validation(_))));

    assert_eq!(alerts.messages(), vec!["Please enter a date and a time."]);
    assert!(store.docs("appointments").is_empty());
}

#[tokio::test]
async fn appointments_arrive_newest_first() {
    let store = MemoryStore::new();
    store.seed(
        "appointments",
        json!({
            "doctor_id": "d1", "user_id": "u1", "date": "2025-01-05",
            "time": "10:00", "status": "pending",
            "created_at": "2025-01-01T10:00:00Z",
        }),
    );
    store.seed(
        "appointments",
        json!({
            "doctor_id": "d1", "user_id": "u1", "date": "2025-02-12",
            "time": "11:00", "status": "confirmed",
            "created_at": "2025-02-01T10:00:00Z",
        }),
    );

    let mut screen =
        AppointmentScreen::new(Arc::new(store), test_session("u1"), alerts(), "d1");
    screen.open().await.unwrap();
    let mut updates = screen.updates();

    wait_for(&mut updates, || screen.appointments().len() == 2).await;
    let listed = screen.appointments();
    assert_eq!(listed[0].date, "2025-02-12");
    assert_eq!(listed[1].date, "2025-01-05");
}

#[tokio::test]
async fn doctor_side_status_change_arrives_through_the_live_query() {
    let store = MemoryStore::new();
    let id = store.seed(
        "appointments",
        json!({
            "doctor_id": "d1", "user_id": "u1", "date": "2025-03-10",
            "time": "09:30", "status": "pending",
            "created_at": "2025-03-01T10:00:00Z",
        }),
    );

    let mut screen = AppointmentScreen::new(
        Arc::new(store.clone()),
        test_session("u1"),
        alerts(),
        "d1",
    );
    screen.open().await.unwrap();
    let mut updates = screen.updates();
    wait_for(&mut updates, || screen.appointments().len() == 1).await;

    store.update(
        "appointments",
        &id,
        json!({
            "doctor_id": "d1", "user_id": "u1", "date": "2025-03-10",
            "time": "09:30", "status": "confirmed",
            "created_at": "2025-03-01T10:00:00Z",
        }),
    );

    wait_for(&mut updates, || {
        screen
            .appointments()
            .first()
            .map(|a| a.status == AppointmentStatus::Confirmed)
            .unwrap_or(false)
    })
    .await;
}

#[tokio::test]
async fn subscription_is_scoped_to_the_signed_in_user_and_doctor() {
    let store = MemoryStore::new();
    store.seed(
        "appointments",
        json!({
            "doctor_id": "d1", "user_id": "u1", "date": "2025-03-10",
            "time": "09:30", "status": "pending",
            "created_at": "2025-03-01T10:00:00Z",
        }),
    );
    store.seed(
        "appointments",
        json!({
            "doctor_id": "d1", "user_id": "u2", "date": "2025-03-11",
            "time": "10:30", "status": "pending",
            "created_at": "2025-03-02T10:00:00Z",
        }),
    );
    store.seed(
        "appointments",
        json!({
            "doctor_id": "d2", "user_id": "u1", "date": "2025-03-12",
            "time": "11:30", "status": "pending",
            "created_at": "2025-03-03T10:00:00Z",
        }),
    );

    let mut screen =
        AppointmentScreen::new(Arc::new(store), test_session("u1"), alerts(), "d1");
    screen.open().await.unwrap();
    let mut updates = screen.updates();

    wait_for(&mut updates, || !screen.appointments().is_empty()).await;
    let listed = screen.appointments();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].date, "2025-03-10");
}

#[tokio::test]
async fn doctor_schedule_document_overrides_the_default_week() {
    let store = MemoryStore::new();
    store.seed(
        "doctor_schedule",
        json!({
            "doctor_id": "d1",
            "working_hours": {
                "monday": { "start": "10:00", "end": "14:00" },
                "tuesday": { "start": "10:00", "end": "14:00" },
                "wednesday": { "start": "", "end": "" },
                "thursday": { "start": "10:00", "end": "14:00" },
                "friday": { "start": "10:00", "end": "12:00" },
                "saturday": { "start": "", "end": "" },
                "sunday": { "start": "", "end": "" },
            },
        }),
    );

    let mut screen =
        AppointmentScreen::new(Arc::new(store), test_session("u1"), alerts(), "d1");
    screen.open().await.unwrap();

    let week = screen.availability();
    assert_eq!(
        week.monday,
        DaySchedule {
            start: "10:00".to_string(),
            end: "14:00".to_string(),
        }
    );
    assert_eq!(
        week.friday,
        DaySchedule {
            start: "10:00".to_string(),
            end: "12:00".to_string(),
        }
    );
    assert_eq!(week.wednesday, DaySchedule::default());
    assert_ne!(*week, WeekSchedule::default());
}

#[tokio::test]
async fn missing_schedule_document_keeps_the_default_week() {
    let store = MemoryStore::new();
    // Another doctor's schedule must not leak in.
    store.seed(
        "doctor_schedule",
        json!({
            "doctor_id": "d2",
            "working_hours": {
                "monday": { "start": "10:00", "end": "14:00" },
                "tuesday": { "start": "10:00", "end": "14:00" },
                "wednesday": { "start": "10:00", "end": "14:00" },
                "thursday": { "start": "10:00", "end": "14:00" },
                "friday": { "start": "10:00", "end": "14:00" },
                "saturday": { "start": "", "end": "" },
                "sunday": { "start": "", "end": "" },
            },
        }),
    );

    let mut screen =
        AppointmentScreen::new(Arc::new(store), test_session("u1"), alerts(), "d1");
    screen.open().await.unwrap();

    assert_eq!(*screen.availability(), WeekSchedule::default());
}

#[tokio::test]
async fn opening_without_a_session_fails() {
    let store = MemoryStore::new();
    let mut screen = AppointmentScreen::new(
        Arc::new(store),
        SessionHandle::new(),
        alerts(),
        "d1",
    );
    let err = screen.open().await;
    assert!(matches!(err, Err(Error::Auth(_))));
    assert_eq!(screen.state(), AdapterState::Unsubscribed);
}

#[tokio::test]
async fn closed_screen_stops_following_backend_changes() {
    let store = MemoryStore::new();
    let screen = ChatScreen::new(
        Arc::new(store.clone()),
        test_session("u1"),
        alerts(),
        "d1",
    );
    screen.open().await.unwrap();
    let mut updates = screen.updates();
    wait_for(&mut updates, || screen.state() == AdapterState::Live).await;

    screen.close();
    assert_eq!(screen.state(), AdapterState::Unsubscribed);

    store
        .insert(
            "messages",
            json!({
                "doctor_id": "d1", "user_id": "u1", "message": "late",
                "read": false, "sent_at": "2025-03-01T10:00:00Z",
            }),
        )
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(screen.messages().is_empty());
    assert_eq!(store.open_subscriptions(), 0);
}

#[tokio::test]
async fn conversation_arrives_oldest_first() {
    let store = MemoryStore::new();
    store.seed(
        "messages",
        json!({
            "doctor_id": "d1", "user_id": "u1", "message": "And now?",
            "read": false, "sent_at": "2025-03-01T10:05:00Z",
        }),
    );
    store.seed(
        "messages",
        json!({
            "doctor_id": "d1", "user_id": "u1", "message": "Bonjour docteur",
            "read": true, "sent_at": "2025-03-01T10:00:00Z",
        }),
    );

    let screen = ChatScreen::new(Arc::new(store), test_session("u1"), alerts(), "d1");
    screen.open().await.unwrap();
    let mut updates = screen.updates();

    wait_for(&mut updates, || screen.messages().len() == 2).await;
    let listed = screen.messages();
    assert_eq!(listed[0].message, "Bonjour docteur");
    assert_eq!(listed[1].message, "And now?");
}

#[tokio::test]
async fn blank_chat_draft_is_silently_ignored() {
    let store = MemoryStore::new();
    let alerts = alerts();
    let mut screen = ChatScreen::new(
        Arc::new(store.clone()),
        test_session("u1"),
        alerts.clone(),
        "d1",
    );
    screen.open().await.unwrap();

    screen.draft = "   ".to_string();
    screen.send().await.unwrap();

    assert_eq!(alerts.count(), 0);
    assert!(store.docs("messages").is_empty());
}

#[tokio::test]
async fn sent_message_is_stamped_and_input_cleared() {
    let store = MemoryStore::new();
    let mut screen = ChatScreen::new(
        Arc::new(store.clone()),
        test_session("u1"),
        alerts(),
        "d1",
    );
    screen.open().await.unwrap();
    let mut updates = screen.updates();

    screen.draft = "Bonjour docteur".to_string();
    screen.send().await.unwrap();
    assert!(screen.draft.is_empty());

    wait_for(&mut updates, || screen.messages().len() == 1).await;
    let sent = &screen.messages()[0];
    assert_eq!(sent.user_id, "u1");
    assert_eq!(sent.doctor_id, "d1");
    assert!(!sent.read);
    assert!(ChatScreen::is_own_message(sent, "u1"));
    assert!(!ChatScreen::is_own_message(sent, "d1"));
}

#[tokio::test]
async fn deleting_a_prescription_removes_only_that_entry() {
    let store = MemoryStore::new();
    let first = store.seed(
        "prescriptions",
        json!({
            "user_id": "u1", "title": "Amoxicilline", "description": "3x/jour",
            "start_date": "2025-01-01T00:00:00Z", "end_date": "2025-01-10T00:00:00Z",
        }),
    );
    store.seed(
        "prescriptions",
        json!({
            "user_id": "u1", "title": "Doliprane", "description": "si douleur",
            "start_date": "2025-02-01T00:00:00Z", "end_date": "2025-02-10T00:00:00Z",
        }),
    );

    let screen = PrescriptionScreen::new(Arc::new(store), test_session("u1"), alerts());
    screen.open().await.unwrap();
    let mut updates = screen.updates();
    wait_for(&mut updates, || screen.prescriptions().len() == 2).await;

    screen.delete(&first).await.unwrap();
    wait_for(&mut updates, || screen.prescriptions().len() == 1).await;
    assert_eq!(screen.prescriptions()[0].title, "Doliprane");
}

#[tokio::test]
async fn incomplete_prescription_form_alerts_and_writes_nothing() {
    let store = MemoryStore::new();
    let alerts = alerts();
    let mut screen = PrescriptionScreen::new(
        Arc::new(store.clone()),
        test_session("u1"),
        alerts.clone(),
    );
    screen.open().await.unwrap();

    screen.title = "Amoxicilline".to_string();
    // description and dates left empty
    let err = screen.submit().await;
    assert!(matches!(err, Err(Error::Validation(_))));

    assert_eq!(alerts.messages(), vec!["Please fill all fields"]);
    assert!(store.docs("prescriptions").is_empty());
}

#[tokio::test]
async fn rejected_write_alerts_and_leaves_the_list_unchanged() {
    let store = MemoryStore::new();
    let alerts = alerts();
    let mut screen = ReminderScreen::new(
        Arc::new(store.clone()),
        test_session("u1"),
        alerts.clone(),
    );
    screen.open().await.unwrap();
    let mut updates = screen.updates();
    wait_for(&mut updates, || screen.state() == AdapterState::Live).await;

    store.fail_writes(true);
    screen.title = "Vitamine D".to_string();
    screen.start_date = Some(chrono::Utc::now());
    screen.end_date = Some(chrono::Utc::now());
    let err = screen.submit().await;
    assert!(matches!(err, Err(Error::Store(_))));

    assert_eq!(alerts.messages(), vec!["Store error: insert rejected"]);
    assert!(screen.reminders().is_empty());
    assert!(store.docs("rappels").is_empty());
}

#[tokio::test]
async fn reminder_with_blank_description_is_accepted() {
    let store = MemoryStore::new();
    let mut screen = ReminderScreen::new(
        Arc::new(store.clone()),
        test_session("u1"),
        alerts(),
    );
    screen.open().await.unwrap();
    let mut updates = screen.updates();

    screen.title = "Vitamine D".to_string();
    screen.start_date = Some(chrono::Utc::now());
    screen.end_date = Some(chrono::Utc::now());
    screen.submit().await.unwrap();

    assert!(screen.title.is_empty());
    wait_for(&mut updates, || screen.reminders().len() == 1).await;
    assert_eq!(screen.reminders()[0].title, "Vitamine D");
    assert!(screen.reminders()[0].description.is_empty());
}

#[tokio::test]
async fn reopening_replaces_the_previous_subscription() {
    let store = MemoryStore::new();
    let mut screen = AppointmentScreen::new(
        Arc::new(store.clone()),
        test_session("u1"),
        alerts(),
        "d1",
    );

    screen.open().await.unwrap();
    screen.open().await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(store.open_subscriptions(), 1);
}
