//! Event service implementation
//!
//! Organizer-side CRUD, the DRAFT to PUBLISHED guard, public browsing and
//! saved events.

use std::collections::HashMap;
use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;
use crate::config::settings::Settings;
use crate::database::DatabaseService;
use crate::models::event::{
    Event, EventDetails, EventStatus, TicketType, CreateEventRequest, UpdateEventRequest,
    EventListQuery, validate_schedule,
};
use crate::models::user::{User, UserRole};
use crate::services::lifecycle;
use crate::services::notification::NotificationService;
use crate::utils::errors::{EventHubError, Result};
use crate::utils::helpers::page_to_limit_offset;
use crate::utils::logging::log_event_action;

#[derive(Clone, Debug)]
pub struct EventService {
    db: DatabaseService,
    notifications: NotificationService,
    default_requires_approval: bool,
}

impl EventService {
    pub fn new(db: DatabaseService, notifications: NotificationService, settings: &Settings) -> Self {
        Self {
            db,
            notifications,
            default_requires_approval: settings.registration.default_requires_approval,
        }
    }

    /// Create a DRAFT event owned by `organizer`
    pub async fn create(&self, organizer: &User, request: CreateEventRequest) -> Result<EventDetails> {
        if !organizer.has_role(UserRole::Organizer) {
            return Err(EventHubError::Forbidden("Only organizers can create events".to_string()));
        }
        request.validate()?;

        let requires_approval = request.requires_approval.unwrap_or(self.default_requires_approval);
        let (event, tickets) = self.db.events.create(organizer.id, request, requires_approval).await?;

        log_event_action(event.id, "created", organizer.id, Some(&event.title));
        Ok(EventDetails::new(event, tickets))
    }

    /// Update an event owned by `actor_id`
    pub async fn update(&self, actor_id: Uuid, event_id: Uuid, request: UpdateEventRequest) -> Result<EventDetails> {
        request.validate()?;
        let event = self.owned_event(actor_id, event_id).await?;

        let starts_at = request.starts_at.unwrap_or(event.starts_at);
        let ends_at = request.ends_at.unwrap_or(event.ends_at);
        let doors_open_at = request.doors_open_at.or(event.doors_open_at);
        validate_schedule(starts_at, ends_at, doors_open_at)
            .map_err(|e| EventHubError::InvalidInput(e.code.to_string()))?;

        if let Some(capacity) = request.capacity {
            if capacity < event.registered_count {
                return Err(capacity_conflict(capacity, event.registered_count));
            }
        }

        let capacity = request.capacity;
        let Some(updated) = self.db.events.update(event_id, request).await? else {
            // Registrations raced past the new cap between the read and the write.
            let fresh = self.get_event(event_id).await?;
            return Err(capacity_conflict(capacity.unwrap_or_default(), fresh.registered_count));
        };

        log_event_action(event_id, "updated", actor_id, None);
        self.details(updated).await
    }

    /// DRAFT -> PUBLISHED, owner only
    pub async fn publish(&self, actor_id: Uuid, event_id: Uuid) -> Result<EventDetails> {
        let event = self.get_event(event_id).await?;
        lifecycle::check_publish(&event, actor_id)?;

        let published = self.db.events
            .transition_status(event_id, EventStatus::Draft, EventStatus::Published)
            .await?
            .ok_or_else(|| EventHubError::InvalidStateTransition {
                from: EventStatus::Published.to_string(),
                to: EventStatus::Published.to_string(),
            })?;

        log_event_action(event_id, "published", actor_id, None);
        info!(event_id = %event_id, "Event published");
        self.details(published).await
    }

    /// Delete an event; active attendees are told before the row goes away
    pub async fn delete(&self, actor: &User, event_id: Uuid) -> Result<()> {
        let event = self.get_event(event_id).await?;
        if !event.is_owned_by(actor.id) && !actor.is_admin() {
            return Err(EventHubError::Forbidden(
                "Only the event organizer or an administrator can delete this event".to_string(),
            ));
        }

        let cancelled = self.db.registrations.cancel_all_and_delete_event(event_id).await?
            .ok_or(EventHubError::EventNotFound { event_id })?;
        for registration in &cancelled {
            self.notifications.event_cancelled(&event, registration).await;
        }

        log_event_action(event_id, "deleted", actor.id, Some(&format!("{} registrations cancelled", cancelled.len())));
        Ok(())
    }

    /// Published public events
    pub async fn browse(&self, query: EventListQuery) -> Result<Vec<EventDetails>> {
        let (limit, offset) = page_to_limit_offset(query.page, query.per_page);
        let starting_after = query.upcoming.then(Utc::now);
        debug!(category = ?query.category, upcoming = query.upcoming, limit = limit, offset = offset, "Browsing events");

        let events = self.db.events.list_published(query.category, starting_after, limit, offset).await?;
        self.details_many(events).await
    }

    /// Event detail; drafts are only visible to their owner
    pub async fn get(&self, viewer_id: Option<Uuid>, event_id: Uuid) -> Result<EventDetails> {
        let event = self.get_event(event_id).await?;
        let visible = event.is_published() || viewer_id.is_some_and(|id| event.is_owned_by(id));
        if !visible {
            return Err(EventHubError::EventNotFound { event_id });
        }

        self.details(event).await
    }

    /// Events created by `organizer_id`, drafts included
    pub async fn mine(&self, organizer_id: Uuid) -> Result<Vec<EventDetails>> {
        let events = self.db.events.get_organizer_events(organizer_id).await?;
        self.details_many(events).await
    }

    pub async fn save(&self, user_id: Uuid, event_id: Uuid) -> Result<()> {
        self.get(Some(user_id), event_id).await?;
        self.db.events.save_event(user_id, event_id).await
    }

    pub async fn unsave(&self, user_id: Uuid, event_id: Uuid) -> Result<()> {
        if !self.db.events.unsave_event(user_id, event_id).await? {
            return Err(EventHubError::EventNotFound { event_id });
        }
        Ok(())
    }

    pub async fn saved(&self, user_id: Uuid) -> Result<Vec<EventDetails>> {
        let events = self.db.events.get_saved_events(user_id).await?;
        self.details_many(events).await
    }

    async fn get_event(&self, event_id: Uuid) -> Result<Event> {
        self.db.events.find_by_id(event_id).await?
            .ok_or(EventHubError::EventNotFound { event_id })
    }

    async fn owned_event(&self, actor_id: Uuid, event_id: Uuid) -> Result<Event> {
        let event = self.get_event(event_id).await?;
        if !event.is_owned_by(actor_id) {
            return Err(EventHubError::Forbidden("Only the event organizer can modify this event".to_string()));
        }
        Ok(event)
    }

    async fn details(&self, event: Event) -> Result<EventDetails> {
        let tickets = self.db.events.get_tickets(event.id).await?;
        Ok(EventDetails::new(event, tickets))
    }

    async fn details_many(&self, events: Vec<Event>) -> Result<Vec<EventDetails>> {
        let ids: Vec<Uuid> = events.iter().map(|e| e.id).collect();
        let mut by_event: HashMap<Uuid, Vec<TicketType>> = HashMap::new();
        for ticket in self.db.events.get_tickets_for(&ids).await? {
            by_event.entry(ticket.event_id).or_default().push(ticket);
        }

        Ok(events
            .into_iter()
            .map(|event| {
                let tickets = by_event.remove(&event.id).unwrap_or_default();
                EventDetails::new(event, tickets)
            })
            .collect())
    }
}

fn capacity_conflict(capacity: i32, registered: i32) -> EventHubError {
    EventHubError::Conflict(format!(
        "Capacity {capacity} is below the {registered} places already registered"
    ))
}
