//! Event model

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "event_category", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventCategory {
    Conference,
    Workshop,
    Meetup,
    Concert,
    Sports,
    Festival,
    Networking,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "event_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventStatus {
    Draft,
    Published,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Draft => "DRAFT",
            EventStatus::Published => "PUBLISHED",
        }
    }
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "event_visibility", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventVisibility {
    Public,
    Private,
}

/// Where an event sits relative to now; computed at read time, never stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventTiming {
    Upcoming,
    Ongoing,
    Past,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    pub organizer_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category: EventCategory,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub doors_open_at: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub capacity: Option<i32>,
    pub registered_count: i32,
    pub is_free: bool,
    pub requires_approval: bool,
    pub status: EventStatus,
    pub visibility: EventVisibility,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.organizer_id == user_id
    }

    pub fn is_published(&self) -> bool {
        self.status == EventStatus::Published
    }

    pub fn timing_at(&self, now: DateTime<Utc>) -> EventTiming {
        if now < self.starts_at {
            EventTiming::Upcoming
        } else if now <= self.ends_at {
            EventTiming::Ongoing
        } else {
            EventTiming::Past
        }
    }

    /// Remaining overall capacity, `None` when the event is uncapped
    pub fn remaining_capacity(&self) -> Option<i32> {
        self.capacity.map(|cap| (cap - self.registered_count).max(0))
    }
}

/// A named price/quantity tier within an event's pricing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TicketType {
    pub event_id: Uuid,
    pub ticket_type: String,
    pub price_cents: i64,
    pub currency: String,
    pub available_quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pricing {
    pub is_free: bool,
    pub tickets: Vec<TicketType>,
}

impl Pricing {
    pub fn ticket(&self, ticket_type: &str) -> Option<&TicketType> {
        self.tickets.iter().find(|t| t.ticket_type == ticket_type)
    }
}

/// Event together with its pricing, as served to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDetails {
    #[serde(flatten)]
    pub event: Event,
    pub pricing: Pricing,
    pub timing: EventTiming,
}

impl EventDetails {
    pub fn new(event: Event, tickets: Vec<TicketType>) -> Self {
        let timing = event.timing_at(Utc::now());
        let pricing = Pricing {
            is_free: event.is_free,
            tickets,
        };
        Self { event, pricing, timing }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TicketInput {
    #[validate(length(min = 1, max = 100))]
    pub ticket_type: String,
    #[validate(range(min = 0))]
    pub price_cents: i64,
    #[validate(custom(function = "validate_currency"))]
    pub currency: String,
    #[validate(range(min = 0))]
    pub available_quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_create_event"))]
pub struct CreateEventRequest {
    #[validate(length(min = 3, max = 200))]
    pub title: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    pub category: EventCategory,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub doors_open_at: Option<DateTime<Utc>>,
    #[validate(length(max = 500))]
    pub location: Option<String>,
    #[validate(range(min = 1))]
    pub capacity: Option<i32>,
    #[serde(default)]
    pub is_free: bool,
    pub requires_approval: Option<bool>,
    pub visibility: Option<EventVisibility>,
    #[validate(nested)]
    #[serde(default)]
    pub tickets: Vec<TicketInput>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventRequest {
    #[validate(length(min = 3, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    pub category: Option<EventCategory>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub doors_open_at: Option<DateTime<Utc>>,
    #[validate(length(max = 500))]
    pub location: Option<String>,
    #[validate(range(min = 1))]
    pub capacity: Option<i32>,
    pub requires_approval: Option<bool>,
    pub visibility: Option<EventVisibility>,
}

/// Query string of `GET /api/events`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventListQuery {
    pub category: Option<EventCategory>,
    #[serde(default)]
    pub upcoming: bool,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

fn validate_currency(currency: &str) -> Result<(), ValidationError> {
    if crate::utils::helpers::is_valid_currency(currency) {
        Ok(())
    } else {
        Err(ValidationError::new("currency"))
    }
}

fn validate_create_event(request: &CreateEventRequest) -> Result<(), ValidationError> {
    validate_schedule(request.starts_at, request.ends_at, request.doors_open_at)?;

    // Registrations always name a ticket type, free events included
    if request.tickets.is_empty() {
        return Err(ValidationError::new("events need at least one ticket type"));
    }

    if request.is_free && request.tickets.iter().any(|t| t.price_cents != 0) {
        return Err(ValidationError::new("free events cannot have priced tickets"));
    }

    let mut names: Vec<&str> = request.tickets.iter().map(|t| t.ticket_type.as_str()).collect();
    names.sort_unstable();
    if names.windows(2).any(|w| w[0] == w[1]) {
        return Err(ValidationError::new("ticket types must be unique"));
    }

    Ok(())
}

/// Dates must be ordered: doors open <= start < end
pub fn validate_schedule(
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    doors_open_at: Option<DateTime<Utc>>,
) -> Result<(), ValidationError> {
    if ends_at <= starts_at {
        return Err(ValidationError::new("event must end after it starts"));
    }

    if doors_open_at.is_some_and(|doors| doors > starts_at) {
        return Err(ValidationError::new("doors must open before the event starts"));
    }

    Ok(())
}
