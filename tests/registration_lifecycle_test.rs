//! Registration lifecycle integration tests
//!
//! Run against `TEST_DATABASE_URL` or a throwaway Postgres container;
//! skipped when neither is available.

mod helpers;

use assert_matches::assert_matches;
use serial_test::serial;
use eventhub::models::event::EventStatus;
use eventhub::models::registration::{CreateRegistrationRequest, PaymentStatus, RegistrationStatus};
use eventhub::services::ProcessPaymentRequest;
use eventhub::EventHubError;
use helpers::*;

fn request(event_id: uuid::Uuid, ticket_type: &str, quantity: i32) -> CreateRegistrationRequest {
    CreateRegistrationRequest {
        event_id,
        ticket_type: ticket_type.to_string(),
        quantity,
    }
}

#[tokio::test]
#[serial]
async fn test_initial_status_follows_event_policy() {
    let Some(db) = TestDatabase::new().await else { return };
    let services = TestServices::new(db.service());
    let organizer = create_organizer(&services.db).await;
    let attendee = create_participant(&services.db).await;

    let approval = published_event(&services, &organizer, event_request(false, &[("General", 2500, 10)], None, true)).await;
    let open = published_event(&services, &organizer, event_request(true, &[("Free", 0, 10)], None, false)).await;

    let pending = services.registrations
        .register(attendee.id, request(approval.event.id, "General", 2))
        .await
        .unwrap();
    assert_eq!(pending.status, RegistrationStatus::Pending);
    assert_eq!(pending.payment_status, PaymentStatus::Unpaid);
    assert_eq!(pending.total_price_cents, 5000);

    let confirmed = services.registrations
        .register(attendee.id, request(open.event.id, "Free", 1))
        .await
        .unwrap();
    assert_eq!(confirmed.status, RegistrationStatus::Confirmed);
    assert_eq!(confirmed.payment_status, PaymentStatus::NotRequired);
}

#[tokio::test]
#[serial]
async fn test_register_rejections() {
    let Some(db) = TestDatabase::new().await else { return };
    let services = TestServices::new(db.service());
    let organizer = create_organizer(&services.db).await;
    let attendee = create_participant(&services.db).await;

    let event = published_event(&services, &organizer, event_request(false, &[("General", 1000, 3)], None, true)).await;

    // Self-registration
    let result = services.registrations.register(organizer.id, request(event.event.id, "General", 1)).await;
    assert_matches!(result, Err(EventHubError::Forbidden(_)));

    // Unknown ticket type
    let result = services.registrations.register(attendee.id, request(event.event.id, "VIP", 1)).await;
    assert_matches!(result, Err(EventHubError::TicketTypeNotFound { .. }));

    // Blank ticket type and non-positive quantity
    let result = services.registrations.register(attendee.id, request(event.event.id, "   ", 1)).await;
    assert_matches!(result, Err(EventHubError::InvalidInput(_)));
    let result = services.registrations.register(attendee.id, request(event.event.id, "General", 0)).await;
    assert_matches!(result, Err(EventHubError::InvalidInput(_)));

    // More than is left
    let result = services.registrations.register(attendee.id, request(event.event.id, "General", 4)).await;
    assert_matches!(result, Err(EventHubError::Conflict(_)));

    // Unknown event
    let result = services.registrations.register(attendee.id, request(uuid::Uuid::new_v4(), "General", 1)).await;
    assert_matches!(result, Err(EventHubError::EventNotFound { .. }));

    // Second active registration
    services.registrations.register(attendee.id, request(event.event.id, "General", 1)).await.unwrap();
    let result = services.registrations.register(attendee.id, request(event.event.id, "General", 1)).await;
    assert_matches!(result, Err(EventHubError::Conflict(_)));
}

#[tokio::test]
#[serial]
async fn test_draft_events_are_not_registrable() {
    let Some(db) = TestDatabase::new().await else { return };
    let services = TestServices::new(db.service());
    let organizer = create_organizer(&services.db).await;
    let attendee = create_participant(&services.db).await;

    let draft = services.events
        .create(&organizer, event_request(false, &[("General", 1000, 5)], None, false))
        .await
        .unwrap();
    assert_eq!(draft.event.status, EventStatus::Draft);

    let result = services.registrations.register(attendee.id, request(draft.event.id, "General", 1)).await;
    assert_matches!(result, Err(EventHubError::EventNotFound { .. }));
}

#[tokio::test]
#[serial]
async fn test_publish_guard() {
    let Some(db) = TestDatabase::new().await else { return };
    let services = TestServices::new(db.service());
    let organizer = create_organizer(&services.db).await;
    let other = create_organizer(&services.db).await;

    let draft = services.events
        .create(&organizer, event_request(true, &[("Free", 0, 5)], None, false))
        .await
        .unwrap();

    let result = services.events.publish(other.id, draft.event.id).await;
    assert_matches!(result, Err(EventHubError::Forbidden(_)));

    let published = services.events.publish(organizer.id, draft.event.id).await.unwrap();
    assert_eq!(published.event.status, EventStatus::Published);

    let result = services.events.publish(organizer.id, draft.event.id).await;
    assert_matches!(result, Err(EventHubError::InvalidStateTransition { .. }));

    // Participants cannot create events at all
    let participant = create_participant(&services.db).await;
    let result = services.events.create(&participant, event_request(true, &[("Free", 0, 5)], None, false)).await;
    assert_matches!(result, Err(EventHubError::Forbidden(_)));
}

#[tokio::test]
#[serial]
async fn test_transitions_respect_actor() {
    let Some(db) = TestDatabase::new().await else { return };
    let services = TestServices::new(db.service());
    let organizer = create_organizer(&services.db).await;
    let attendee = create_participant(&services.db).await;
    let stranger = create_participant(&services.db).await;

    let event = published_event(&services, &organizer, event_request(false, &[("General", 1000, 5)], None, true)).await;
    let registration = services.registrations
        .register(attendee.id, request(event.event.id, "General", 1))
        .await
        .unwrap();

    // Only the organizer confirms
    let result = services.registrations
        .update_status(attendee.id, registration.id, RegistrationStatus::Confirmed)
        .await;
    assert_matches!(result, Err(EventHubError::Forbidden(_)));

    let result = services.registrations
        .update_status(stranger.id, registration.id, RegistrationStatus::Cancelled)
        .await;
    assert_matches!(result, Err(EventHubError::Forbidden(_)));

    let confirmed = services.registrations
        .update_status(organizer.id, registration.id, RegistrationStatus::Confirmed)
        .await
        .unwrap();
    assert_eq!(confirmed.status, RegistrationStatus::Confirmed);

    // Confirmed registrations are withdrawn by the attendee, not the organizer
    let result = services.registrations
        .update_status(organizer.id, registration.id, RegistrationStatus::Cancelled)
        .await;
    assert_matches!(result, Err(EventHubError::Forbidden(_)));

    let result = services.registrations
        .update_status(organizer.id, registration.id, RegistrationStatus::Pending)
        .await;
    assert_matches!(result, Err(EventHubError::InvalidStateTransition { .. }));

    // The cancel endpoint belongs to the attendee
    let result = services.registrations.cancel(organizer.id, registration.id).await;
    assert_matches!(result, Err(EventHubError::Forbidden(_)));

    let cancelled = services.registrations.cancel(attendee.id, registration.id).await.unwrap();
    assert_eq!(cancelled.status, RegistrationStatus::Cancelled);
}

#[tokio::test]
#[serial]
async fn test_cancelled_is_terminal_and_releases_inventory() {
    let Some(db) = TestDatabase::new().await else { return };
    let services = TestServices::new(db.service());
    let organizer = create_organizer(&services.db).await;
    let attendee = create_participant(&services.db).await;

    let event = published_event(&services, &organizer, event_request(false, &[("General", 1000, 4)], Some(10), true)).await;
    let registration = services.registrations
        .register(attendee.id, request(event.event.id, "General", 3))
        .await
        .unwrap();

    let tickets = services.db.events.get_tickets(event.event.id).await.unwrap();
    assert_eq!(tickets[0].available_quantity, 1);
    let stored = services.db.events.find_by_id(event.event.id).await.unwrap().unwrap();
    assert_eq!(stored.registered_count, 3);

    // Organizer rejection of a pending registration
    services.registrations
        .update_status(organizer.id, registration.id, RegistrationStatus::Cancelled)
        .await
        .unwrap();

    let tickets = services.db.events.get_tickets(event.event.id).await.unwrap();
    assert_eq!(tickets[0].available_quantity, 4);
    let stored = services.db.events.find_by_id(event.event.id).await.unwrap().unwrap();
    assert_eq!(stored.registered_count, 0);

    for to in RegistrationStatus::ALL {
        for actor in [organizer.id, attendee.id] {
            let result = services.registrations.update_status(actor, registration.id, to).await;
            assert_matches!(result, Err(EventHubError::InvalidStateTransition { .. }));
        }
    }
    let result = services.registrations.cancel(attendee.id, registration.id).await;
    assert_matches!(result, Err(EventHubError::InvalidStateTransition { .. }));

    // Inventory is not released twice
    let tickets = services.db.events.get_tickets(event.event.id).await.unwrap();
    assert_eq!(tickets[0].available_quantity, 4);

    // Re-registration is a new record
    let again = services.registrations
        .register(attendee.id, request(event.event.id, "General", 1))
        .await
        .unwrap();
    assert_ne!(again.id, registration.id);
    assert_eq!(again.status, RegistrationStatus::Pending);
}

#[tokio::test]
#[serial]
async fn test_event_capacity_is_enforced() {
    let Some(db) = TestDatabase::new().await else { return };
    let services = TestServices::new(db.service());
    let organizer = create_organizer(&services.db).await;
    let first = create_participant(&services.db).await;
    let second = create_participant(&services.db).await;

    let event = published_event(&services, &organizer, event_request(true, &[("Free", 0, 50)], Some(2), false)).await;

    services.registrations.register(first.id, request(event.event.id, "Free", 2)).await.unwrap();
    let result = services.registrations.register(second.id, request(event.event.id, "Free", 1)).await;
    assert_matches!(result, Err(EventHubError::Conflict(_)));

    // The failed attempt must not have reserved tickets
    let tickets = services.db.events.get_tickets(event.event.id).await.unwrap();
    assert_eq!(tickets[0].available_quantity, 48);
}

#[tokio::test]
#[serial]
async fn test_last_ticket_race_admits_one() {
    let Some(db) = TestDatabase::new().await else { return };
    let services = TestServices::new(db.service());
    let organizer = create_organizer(&services.db).await;
    let a = create_participant(&services.db).await;
    let b = create_participant(&services.db).await;

    let event = published_event(&services, &organizer, event_request(false, &[("General", 1500, 1)], None, true)).await;
    let event_id = event.event.id;

    let (first, second) = tokio::join!(
        services.registrations.register(a.id, request(event_id, "General", 1)),
        services.registrations.register(b.id, request(event_id, "General", 1)),
    );

    let outcomes = [first, second];
    let successes = outcomes.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);
    assert!(outcomes.iter().any(|r| matches!(r, Err(EventHubError::Conflict(_)))));

    let winner = outcomes.iter().find_map(|r| r.as_ref().ok()).unwrap();
    assert_eq!(winner.status, RegistrationStatus::Pending);

    let tickets = services.db.events.get_tickets(event_id).await.unwrap();
    assert_eq!(tickets[0].available_quantity, 0);
}

#[tokio::test]
#[serial]
async fn test_paid_flow_and_status_query() {
    let Some(db) = TestDatabase::new().await else { return };
    let services = TestServices::new(db.service());
    let organizer = create_organizer(&services.db).await;
    let attendee = create_participant(&services.db).await;

    let event = published_event(&services, &organizer, event_request(false, &[("General", 2000, 5)], None, true)).await;
    let registration = services.registrations
        .register(attendee.id, request(event.event.id, "General", 1))
        .await
        .unwrap();

    let pay = || ProcessPaymentRequest {
        registration_id: registration.id,
        payment_details: payment_details(),
    };

    // Not yet confirmed
    let result = services.payments.process(attendee.id, pay()).await;
    assert_matches!(result, Err(EventHubError::InvalidState(_)));

    services.registrations
        .update_status(organizer.id, registration.id, RegistrationStatus::Confirmed)
        .await
        .unwrap();
    let check = services.registrations.check(event.event.id, attendee.id).await.unwrap();
    assert!(!check.payment_settled);

    // Someone else's registration
    let result = services.payments.process(organizer.id, pay()).await;
    assert_matches!(result, Err(EventHubError::Forbidden(_)));

    // Malformed card
    let mut bad = pay();
    bad.payment_details.card_number = "1234".to_string();
    let result = services.payments.process(attendee.id, bad).await;
    assert_matches!(result, Err(EventHubError::InvalidInput(_)));

    let receipt = services.payments.process(attendee.id, pay()).await.unwrap();
    assert_eq!(receipt.amount_cents, 2000);
    assert_eq!(receipt.registration.payment_status, PaymentStatus::Paid);
    assert!(receipt.registration.paid_at.is_some());

    let result = services.payments.process(attendee.id, pay()).await;
    assert_matches!(result, Err(EventHubError::Conflict(_)));

    let check = services.registrations.check(event.event.id, attendee.id).await.unwrap();
    assert!(check.is_registered);
    assert_eq!(check.status, Some(RegistrationStatus::Confirmed));
    assert_eq!(check.payment_status, Some(PaymentStatus::Paid));
    assert!(check.payment_settled);
    assert_eq!(check.registration_id, Some(registration.id));

    // Withdrawal keeps the payment on record
    let cancelled = services.registrations.cancel(attendee.id, registration.id).await.unwrap();
    assert_eq!(cancelled.status, RegistrationStatus::Cancelled);
    assert_eq!(cancelled.payment_status, PaymentStatus::Paid);

    let check = services.registrations.check(event.event.id, attendee.id).await.unwrap();
    assert!(!check.is_registered);
}

#[tokio::test]
#[serial]
async fn test_free_registration_needs_no_payment() {
    let Some(db) = TestDatabase::new().await else { return };
    let services = TestServices::new(db.service());
    let organizer = create_organizer(&services.db).await;
    let attendee = create_participant(&services.db).await;

    let event = published_event(&services, &organizer, event_request(true, &[("Free", 0, 5)], None, false)).await;
    let registration = services.registrations
        .register(attendee.id, request(event.event.id, "Free", 1))
        .await
        .unwrap();
    assert!(registration.payment_status.is_settled());
    assert!(!registration.awaiting_payment());
    let check = services.registrations.check(event.event.id, attendee.id).await.unwrap();
    assert!(check.payment_settled);

    let result = services.payments
        .process(attendee.id, ProcessPaymentRequest {
            registration_id: registration.id,
            payment_details: payment_details(),
        })
        .await;
    assert_matches!(result, Err(EventHubError::InvalidState(_)));
}

#[tokio::test]
#[serial]
async fn test_listings_and_notifications() {
    let Some(db) = TestDatabase::new().await else { return };
    let services = TestServices::new(db.service());
    let organizer = create_organizer(&services.db).await;
    let attendee = create_participant(&services.db).await;

    let event = published_event(&services, &organizer, event_request(false, &[("General", 1000, 5)], None, true)).await;
    let registration = services.registrations
        .register(attendee.id, request(event.event.id, "General", 1))
        .await
        .unwrap();

    let mine = services.registrations.my_registrations(attendee.id).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].registration.id, registration.id);
    assert_eq!(mine[0].event_title, event.event.title);

    let result = services.registrations.event_registrations(attendee.id, event.event.id).await;
    assert_matches!(result, Err(EventHubError::Forbidden(_)));
    let listed = services.registrations.event_registrations(organizer.id, event.event.id).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].attendee_email, attendee.email);

    // Organizer hears about the new registration
    assert_eq!(services.notifications.unread_count(organizer.id).await.unwrap(), 1);

    services.registrations
        .update_status(organizer.id, registration.id, RegistrationStatus::Confirmed)
        .await
        .unwrap();

    let inbox = services.notifications.list(attendee.id, true, None, None).await.unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].registration_id, Some(registration.id));

    // Recipients only read their own notifications
    let result = services.notifications.mark_read(organizer.id, inbox[0].id).await;
    assert_matches!(result, Err(EventHubError::NotificationNotFound { .. }));

    let read = services.notifications.mark_read(attendee.id, inbox[0].id).await.unwrap();
    assert!(read.is_read);
    assert_eq!(services.notifications.unread_count(attendee.id).await.unwrap(), 0);

    assert_eq!(services.notifications.mark_all_read(organizer.id).await.unwrap(), 1);
}

#[tokio::test]
#[serial]
async fn test_event_deletion_cancels_registrations() {
    let Some(db) = TestDatabase::new().await else { return };
    let services = TestServices::new(db.service());
    let organizer = create_organizer(&services.db).await;
    let attendee = create_participant(&services.db).await;
    let admin = create_admin(&services.db).await;

    let event = published_event(&services, &organizer, event_request(true, &[("Free", 0, 5)], None, false)).await;
    services.registrations
        .register(attendee.id, request(event.event.id, "Free", 1))
        .await
        .unwrap();

    let result = services.events.delete(&attendee, event.event.id).await;
    assert_matches!(result, Err(EventHubError::Forbidden(_)));

    services.events.delete(&admin, event.event.id).await.unwrap();

    let result = services.events.get(Some(organizer.id), event.event.id).await;
    assert_matches!(result, Err(EventHubError::EventNotFound { .. }));

    assert!(services.registrations.my_registrations(attendee.id).await.unwrap().is_empty());
    let inbox = services.notifications.list(attendee.id, true, None, None).await.unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].event_id, None);
    assert_eq!(inbox[0].registration_id, None);
}

#[tokio::test]
#[serial]
async fn test_failed_event_deletion_changes_nothing() {
    let Some(db) = TestDatabase::new().await else { return };
    let services = TestServices::new(db.service());
    let organizer = create_organizer(&services.db).await;
    let attendee = create_participant(&services.db).await;

    let event = published_event(&services, &organizer, event_request(false, &[("General", 1000, 5)], None, false)).await;
    let registration = services.registrations
        .register(attendee.id, request(event.event.id, "General", 2))
        .await
        .unwrap();

    // Make the final DELETE fail after the registrations were cancelled
    let name = format!("reject_delete_{}", uuid::Uuid::new_v4().simple());
    sqlx::query(&format!(
        "CREATE FUNCTION {name}() RETURNS trigger LANGUAGE plpgsql AS $$ BEGIN RAISE EXCEPTION 'delete rejected'; END $$"
    ))
    .execute(&db.pool)
    .await
    .unwrap();
    sqlx::query(&format!(
        "CREATE TRIGGER {name} BEFORE DELETE ON events FOR EACH ROW WHEN (OLD.id = '{}') EXECUTE FUNCTION {name}()",
        event.event.id
    ))
    .execute(&db.pool)
    .await
    .unwrap();

    let result = services.events.delete(&organizer, event.event.id).await;

    sqlx::query(&format!("DROP TRIGGER {name} ON events")).execute(&db.pool).await.unwrap();
    sqlx::query(&format!("DROP FUNCTION {name}()")).execute(&db.pool).await.unwrap();

    assert_matches!(result, Err(EventHubError::Database(_)));

    let stored = services.db.registrations.find_by_id(registration.id).await.unwrap().unwrap();
    assert_eq!(stored.status, RegistrationStatus::Confirmed);
    let tickets = services.db.events.get_tickets(event.event.id).await.unwrap();
    assert_eq!(tickets[0].available_quantity, 3);
    let check = services.registrations.check(event.event.id, attendee.id).await.unwrap();
    assert!(check.is_registered);
    assert_eq!(services.notifications.unread_count(attendee.id).await.unwrap(), 0);

    // Once the store cooperates the same call goes through
    services.events.delete(&organizer, event.event.id).await.unwrap();
    assert!(services.db.registrations.find_by_id(registration.id).await.unwrap().is_none());
    assert_eq!(services.notifications.unread_count(attendee.id).await.unwrap(), 1);
}
