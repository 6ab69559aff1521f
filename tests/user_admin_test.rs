//! Admin account management against the database
//!
//! Run against `TEST_DATABASE_URL` or a throwaway Postgres container;
//! skipped when neither is available.

mod helpers;

use assert_matches::assert_matches;
use serial_test::serial;
use eventhub::models::registration::{CreateRegistrationRequest, RegistrationStatus};
use eventhub::models::user::UserRole;
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
async fn test_roles_round_trip() {
    let Some(db) = TestDatabase::new().await else { return };
    let services = TestServices::new(db.service());
    let admin = create_admin(&services.db).await;
    let organizer = create_organizer(&services.db).await;

    assert!(admin.has_role(UserRole::Admin));
    let stored = services.users.get_user(organizer.id).await.unwrap();
    assert!(stored.has_role(UserRole::Organizer));
    assert!(stored.has_role(UserRole::Participant));

    let updated = services.users
        .set_roles(&admin, organizer.id, vec![UserRole::Participant])
        .await
        .unwrap();
    assert!(!updated.has_role(UserRole::Organizer));

    let listed = services.users.list_users(&admin, None, Some(100)).await.unwrap();
    assert!(listed.iter().any(|u| u.id == organizer.id && u.roles == vec![UserRole::Participant]));
}

#[tokio::test]
#[serial]
async fn test_deleting_attendee_frees_their_tickets() {
    let Some(db) = TestDatabase::new().await else { return };
    let services = TestServices::new(db.service());
    let organizer = create_organizer(&services.db).await;
    let admin = create_admin(&services.db).await;
    let attendee = create_participant(&services.db).await;

    let event = published_event(&services, &organizer, event_request(false, &[("General", 1000, 2)], Some(2), false)).await;
    let held = services.registrations
        .register(attendee.id, request(event.event.id, "General", 2))
        .await
        .unwrap();
    assert_eq!(held.status, RegistrationStatus::Confirmed);

    services.users.delete_user(&admin, attendee.id).await.unwrap();

    let result = services.users.get_user(attendee.id).await;
    assert_matches!(result, Err(EventHubError::UserNotFound { .. }));
    assert!(services.db.registrations.find_by_id(held.id).await.unwrap().is_none());

    let tickets = services.db.events.get_tickets(event.event.id).await.unwrap();
    assert_eq!(tickets[0].available_quantity, 2);
    let stored = services.db.events.find_by_id(event.event.id).await.unwrap().unwrap();
    assert_eq!(stored.registered_count, 0);

    let newcomer = create_participant(&services.db).await;
    let registration = services.registrations
        .register(newcomer.id, request(event.event.id, "General", 2))
        .await
        .unwrap();
    assert_eq!(registration.quantity, 2);
}

#[tokio::test]
#[serial]
async fn test_deleting_attendee_leaves_cancelled_inventory_alone() {
    let Some(db) = TestDatabase::new().await else { return };
    let services = TestServices::new(db.service());
    let organizer = create_organizer(&services.db).await;
    let admin = create_admin(&services.db).await;
    let attendee = create_participant(&services.db).await;

    let event = published_event(&services, &organizer, event_request(false, &[("General", 1000, 3)], None, false)).await;
    let first = services.registrations
        .register(attendee.id, request(event.event.id, "General", 1))
        .await
        .unwrap();
    services.registrations.cancel(attendee.id, first.id).await.unwrap();
    services.registrations
        .register(attendee.id, request(event.event.id, "General", 2))
        .await
        .unwrap();

    services.users.delete_user(&admin, attendee.id).await.unwrap();

    // Only the active registration gives tickets back
    let tickets = services.db.events.get_tickets(event.event.id).await.unwrap();
    assert_eq!(tickets[0].available_quantity, 3);
    let stored = services.db.events.find_by_id(event.event.id).await.unwrap().unwrap();
    assert_eq!(stored.registered_count, 0);
}

#[tokio::test]
#[serial]
async fn test_delete_user_guards() {
    let Some(db) = TestDatabase::new().await else { return };
    let services = TestServices::new(db.service());
    let admin = create_admin(&services.db).await;
    let attendee = create_participant(&services.db).await;

    let result = services.users.delete_user(&attendee, admin.id).await;
    assert_matches!(result, Err(EventHubError::Forbidden(_)));

    let result = services.users.delete_user(&admin, admin.id).await;
    assert_matches!(result, Err(EventHubError::Conflict(_)));

    let missing = uuid::Uuid::new_v4();
    let result = services.users.delete_user(&admin, missing).await;
    assert_matches!(result, Err(EventHubError::UserNotFound { .. }));
}
