//! Event repository implementation

use sqlx::PgPool;
use chrono::{DateTime, Utc};
use uuid::Uuid;
use crate::models::event::{
    Event, EventCategory, EventStatus, EventVisibility, TicketType, CreateEventRequest,
    UpdateEventRequest,
};
use crate::utils::errors::EventHubError;

const EVENT_COLUMNS: &str = "id, organizer_id, title, description, category, starts_at, ends_at, \
    doors_open_at, location, capacity, registered_count, is_free, requires_approval, status, \
    visibility, created_at, updated_at";

#[derive(Clone)]
#[derive(Debug)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new event in DRAFT together with its ticket types
    pub async fn create(
        &self,
        organizer_id: Uuid,
        request: CreateEventRequest,
        requires_approval: bool,
    ) -> Result<(Event, Vec<TicketType>), EventHubError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let event = sqlx::query_as::<_, Event>(&format!(
            r#"
            INSERT INTO events (id, organizer_id, title, description, category, starts_at, ends_at,
                                doors_open_at, location, capacity, registered_count, is_free,
                                requires_approval, status, visibility, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 0, $11, $12, $13, $14, $15, $16)
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(organizer_id)
        .bind(request.title)
        .bind(request.description)
        .bind(request.category)
        .bind(request.starts_at)
        .bind(request.ends_at)
        .bind(request.doors_open_at)
        .bind(request.location)
        .bind(request.capacity)
        .bind(request.is_free)
        .bind(requires_approval)
        .bind(EventStatus::Draft)
        .bind(request.visibility.unwrap_or(EventVisibility::Public))
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        let mut tickets = Vec::with_capacity(request.tickets.len());
        for ticket in request.tickets {
            let ticket = sqlx::query_as::<_, TicketType>(
                r#"
                INSERT INTO event_tickets (event_id, ticket_type, price_cents, currency, available_quantity)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING event_id, ticket_type, price_cents, currency, available_quantity
                "#
            )
            .bind(event.id)
            .bind(ticket.ticket_type)
            .bind(ticket.price_cents)
            .bind(ticket.currency)
            .bind(ticket.available_quantity)
            .fetch_one(&mut *tx)
            .await?;
            tickets.push(ticket);
        }

        tx.commit().await?;
        Ok((event, tickets))
    }

    /// Find event by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Event>, EventHubError> {
        let event = sqlx::query_as::<_, Event>(&format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(event)
    }

    /// Ticket types of one event
    pub async fn get_tickets(&self, event_id: Uuid) -> Result<Vec<TicketType>, EventHubError> {
        let tickets = sqlx::query_as::<_, TicketType>(
            "SELECT event_id, ticket_type, price_cents, currency, available_quantity FROM event_tickets WHERE event_id = $1 ORDER BY price_cents ASC, ticket_type ASC"
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tickets)
    }

    /// Ticket types of many events in one round trip
    pub async fn get_tickets_for(&self, event_ids: &[Uuid]) -> Result<Vec<TicketType>, EventHubError> {
        let tickets = sqlx::query_as::<_, TicketType>(
            "SELECT event_id, ticket_type, price_cents, currency, available_quantity FROM event_tickets WHERE event_id = ANY($1) ORDER BY price_cents ASC, ticket_type ASC"
        )
        .bind(event_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(tickets)
    }

    /// Update event; absent fields keep their current value
    ///
    /// The capacity guard is part of the statement so a concurrent registration
    /// cannot slip under a shrinking cap.
    pub async fn update(&self, id: Uuid, request: UpdateEventRequest) -> Result<Option<Event>, EventHubError> {
        let event = sqlx::query_as::<_, Event>(&format!(
            r#"
            UPDATE events
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                category = COALESCE($4, category),
                starts_at = COALESCE($5, starts_at),
                ends_at = COALESCE($6, ends_at),
                doors_open_at = COALESCE($7, doors_open_at),
                location = COALESCE($8, location),
                capacity = COALESCE($9, capacity),
                requires_approval = COALESCE($10, requires_approval),
                visibility = COALESCE($11, visibility),
                updated_at = $12
            WHERE id = $1
              AND ($9::INTEGER IS NULL OR registered_count <= $9)
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(request.title)
        .bind(request.description)
        .bind(request.category)
        .bind(request.starts_at)
        .bind(request.ends_at)
        .bind(request.doors_open_at)
        .bind(request.location)
        .bind(request.capacity)
        .bind(request.requires_approval)
        .bind(request.visibility)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(event)
    }

    /// Move an event from one status to another; `None` when it was not in `from`
    pub async fn transition_status(
        &self,
        id: Uuid,
        from: EventStatus,
        to: EventStatus,
    ) -> Result<Option<Event>, EventHubError> {
        let event = sqlx::query_as::<_, Event>(&format!(
            "UPDATE events SET status = $3, updated_at = $4 WHERE id = $1 AND status = $2 RETURNING {EVENT_COLUMNS}"
        ))
        .bind(id)
        .bind(from)
        .bind(to)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(event)
    }

    /// Published public events, optionally filtered
    pub async fn list_published(
        &self,
        category: Option<EventCategory>,
        starting_after: Option<DateTime<Utc>>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Event>, EventHubError> {
        let events = sqlx::query_as::<_, Event>(&format!(
            r#"
            SELECT {EVENT_COLUMNS} FROM events
            WHERE status = 'PUBLISHED' AND visibility = 'PUBLIC'
              AND ($1::event_category IS NULL OR category = $1)
              AND ($2::TIMESTAMPTZ IS NULL OR starts_at > $2)
            ORDER BY starts_at ASC
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(category)
        .bind(starting_after)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    /// Get events created by organizer
    pub async fn get_organizer_events(&self, organizer_id: Uuid) -> Result<Vec<Event>, EventHubError> {
        let events = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE organizer_id = $1 ORDER BY starts_at ASC"
        ))
        .bind(organizer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    /// Bookmark an event; saving twice is a no-op
    pub async fn save_event(&self, user_id: Uuid, event_id: Uuid) -> Result<(), EventHubError> {
        sqlx::query(
            "INSERT INTO saved_events (user_id, event_id, created_at) VALUES ($1, $2, $3) ON CONFLICT DO NOTHING"
        )
        .bind(user_id)
        .bind(event_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Remove a bookmark; returns whether one existed
    pub async fn unsave_event(&self, user_id: Uuid, event_id: Uuid) -> Result<bool, EventHubError> {
        let result = sqlx::query("DELETE FROM saved_events WHERE user_id = $1 AND event_id = $2")
            .bind(user_id)
            .bind(event_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Events a user bookmarked, most recently saved first
    pub async fn get_saved_events(&self, user_id: Uuid) -> Result<Vec<Event>, EventHubError> {
        let events = sqlx::query_as::<_, Event>(
            r#"
            SELECT e.id, e.organizer_id, e.title, e.description, e.category, e.starts_at, e.ends_at,
                   e.doors_open_at, e.location, e.capacity, e.registered_count, e.is_free,
                   e.requires_approval, e.status, e.visibility, e.created_at, e.updated_at
            FROM events e
            INNER JOIN saved_events s ON e.id = s.event_id
            WHERE s.user_id = $1 AND (e.status = 'PUBLISHED' OR e.organizer_id = $1)
            ORDER BY s.created_at DESC
            "#
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    /// Count total events
    pub async fn count(&self) -> Result<i64, EventHubError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM events")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }
}
