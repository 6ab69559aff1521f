//! Test data helpers for creating users, events and services

use std::sync::Arc;
use std::time::Duration;
use chrono::Utc;
use uuid::Uuid;
use eventhub::config::Settings;
use eventhub::database::DatabaseService;
use eventhub::models::event::{CreateEventRequest, EventCategory, EventDetails, TicketInput};
use eventhub::models::user::{CreateUserRequest, User, UserRole, UserStatus};
use eventhub::services::{
    EventService, NotificationService, PaymentDetails, PaymentService, RegistrationService,
    SimulatedGateway, UserService,
};

/// Settings tuned for tests: no payment delay, notifications on
pub fn test_settings() -> Settings {
    let mut settings = Settings::default();
    settings.payments.simulated_delay_ms = 1;
    settings.features.notifications = true;
    settings.features.rate_limiting = false;
    settings.registration.default_requires_approval = false;
    settings
}

/// The services the lifecycle depends on, built without Redis
#[derive(Clone)]
pub struct TestServices {
    pub db: DatabaseService,
    pub events: EventService,
    pub registrations: RegistrationService,
    pub payments: PaymentService,
    pub notifications: NotificationService,
    pub users: UserService,
}

impl TestServices {
    pub fn new(db: DatabaseService) -> Self {
        let settings = test_settings();
        let notifications = NotificationService::new(db.notifications.clone(), &settings);
        let gateway = Arc::new(SimulatedGateway::new(Duration::from_millis(1)));

        Self {
            events: EventService::new(db.clone(), notifications.clone(), &settings),
            registrations: RegistrationService::new(db.clone(), notifications.clone()),
            payments: PaymentService::new(db.clone(), gateway, notifications.clone()),
            users: UserService::new(db.clone()),
            notifications,
            db,
        }
    }
}

/// Insert a user with the given roles and a unique email
pub async fn create_user(db: &DatabaseService, roles: Vec<UserRole>) -> User {
    let unique = Uuid::new_v4().simple().to_string();
    db.users
        .create(CreateUserRequest {
            email: format!("user-{unique}@example.com"),
            password_hash: "not-a-real-hash".to_string(),
            first_name: "Test".to_string(),
            last_name: unique[..8].to_string(),
            organizer_profile: roles.contains(&UserRole::Organizer).then(Default::default),
            participant_profile: Some(Default::default()),
            roles,
            status: UserStatus::Active,
        })
        .await
        .expect("create test user")
}

pub async fn create_organizer(db: &DatabaseService) -> User {
    create_user(db, vec![UserRole::Participant, UserRole::Organizer]).await
}

pub async fn create_participant(db: &DatabaseService) -> User {
    create_user(db, vec![UserRole::Participant]).await
}

pub async fn create_admin(db: &DatabaseService) -> User {
    create_user(db, vec![UserRole::Participant, UserRole::Admin]).await
}

/// A ticket tier: (name, price in cents, quantity)
pub type Tier<'a> = (&'a str, i64, i32);

pub fn event_request(is_free: bool, tiers: &[Tier<'_>], capacity: Option<i32>, requires_approval: bool) -> CreateEventRequest {
    let starts_at = Utc::now() + chrono::Duration::days(14);
    CreateEventRequest {
        title: "Integration Test Conference".to_string(),
        description: Some("Talks and workshops".to_string()),
        category: EventCategory::Conference,
        starts_at,
        ends_at: starts_at + chrono::Duration::hours(8),
        doors_open_at: Some(starts_at - chrono::Duration::minutes(30)),
        location: Some("Main Hall".to_string()),
        capacity,
        is_free,
        requires_approval: Some(requires_approval),
        visibility: None,
        tickets: tiers
            .iter()
            .map(|(name, price_cents, quantity)| TicketInput {
                ticket_type: name.to_string(),
                price_cents: *price_cents,
                currency: "EUR".to_string(),
                available_quantity: *quantity,
            })
            .collect(),
    }
}

/// Create and publish an event owned by `organizer`
pub async fn published_event(services: &TestServices, organizer: &User, request: CreateEventRequest) -> EventDetails {
    let draft = services.events.create(organizer, request).await.expect("create event");
    services
        .events
        .publish(organizer.id, draft.event.id)
        .await
        .expect("publish event")
}

pub fn payment_details() -> PaymentDetails {
    PaymentDetails {
        card_number: "4242 4242 4242 4242".to_string(),
        card_holder: "Test Attendee".to_string(),
        expiry: "12/30".to_string(),
        cvc: "123".to_string(),
    }
}
