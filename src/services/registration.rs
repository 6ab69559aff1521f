//! Registration service implementation
//!
//! Creates registrations against published events, drives the
//! PENDING/CONFIRMED/CANCELLED lifecycle and answers status queries.

use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;
use crate::database::DatabaseService;
use crate::models::event::Event;
use crate::models::registration::{
    Registration, RegistrationStatus, RegistrationSummary, RegistrationCheck,
    CreateRegistrationRequest, NewRegistration,
};
use crate::services::lifecycle::{self, Party};
use crate::services::notification::NotificationService;
use crate::utils::errors::{EventHubError, Result};
use crate::utils::logging::log_registration_action;

#[derive(Clone, Debug)]
pub struct RegistrationService {
    db: DatabaseService,
    notifications: NotificationService,
}

impl RegistrationService {
    pub fn new(db: DatabaseService, notifications: NotificationService) -> Self {
        Self { db, notifications }
    }

    /// Register `attendee_id` for an event
    pub async fn register(&self, attendee_id: Uuid, request: CreateRegistrationRequest) -> Result<Registration> {
        request.validate()?;
        let ticket_type = request.ticket_type.trim().to_string();
        if ticket_type.is_empty() {
            return Err(EventHubError::InvalidInput("ticket type is required".to_string()));
        }

        debug!(event_id = %request.event_id, attendee_id = %attendee_id, ticket_type = %ticket_type, quantity = request.quantity, "Creating registration");

        let event = self.published_event(request.event_id).await?;
        if event.is_owned_by(attendee_id) {
            return Err(EventHubError::Forbidden(
                "Organizers cannot register for their own events".to_string(),
            ));
        }

        let tickets = self.db.events.get_tickets(event.id).await?;
        let ticket = tickets
            .iter()
            .find(|t| t.ticket_type == ticket_type)
            .ok_or_else(|| EventHubError::TicketTypeNotFound { ticket_type: ticket_type.clone() })?;

        if request.quantity > ticket.available_quantity {
            return Err(EventHubError::Conflict(format!(
                "Only {} '{}' tickets left",
                ticket.available_quantity, ticket.ticket_type
            )));
        }

        if event.remaining_capacity().is_some_and(|left| request.quantity > left) {
            return Err(EventHubError::Conflict("Event is at full capacity".to_string()));
        }

        if self.db.registrations.find_active(event.id, attendee_id).await?.is_some() {
            return Err(EventHubError::Conflict(
                "You already have an active registration for this event".to_string(),
            ));
        }

        let new = NewRegistration {
            event_id: event.id,
            attendee_id,
            ticket_type,
            quantity: request.quantity,
            total_price_cents: ticket.price_cents * i64::from(request.quantity),
            currency: ticket.currency.clone(),
            status: lifecycle::initial_status(event.requires_approval),
            payment_status: lifecycle::initial_payment_status(event.is_free),
        };

        let registration = self.db.registrations.create_with_reservation(new).await?;

        log_registration_action(registration.id, "created", attendee_id, Some(registration.status.as_str()));
        info!(registration_id = %registration.id, event_id = %event.id, status = %registration.status, "Registration created");

        self.notifications.registration_created(&event, &registration).await;
        Ok(registration)
    }

    /// Move a registration to `to` on behalf of `actor_id`
    pub async fn update_status(
        &self,
        actor_id: Uuid,
        registration_id: Uuid,
        to: RegistrationStatus,
    ) -> Result<Registration> {
        let current = self.get(registration_id).await?;
        let event = self.event_of(&current).await?;
        let party = lifecycle::party_of(actor_id, event.organizer_id, current.attendee_id)?;
        lifecycle::check_transition(current.status, to, party)?;

        let updated = if to == RegistrationStatus::Cancelled {
            self.db.registrations.cancel_and_release(registration_id, current.status).await?
        } else {
            self.db.registrations.transition_status(registration_id, current.status, to).await?
        };

        let Some(updated) = updated else {
            // Someone else moved it first; judge the request against what is stored now.
            let fresh = self.get(registration_id).await?;
            return Err(match lifecycle::check_transition(fresh.status, to, party) {
                Err(e) => e,
                Ok(()) => lifecycle::invalid_transition(fresh.status, to),
            });
        };

        log_registration_action(
            registration_id,
            "status_changed",
            actor_id,
            Some(&format!("{} -> {}", current.status, updated.status)),
        );

        match (to, party) {
            (RegistrationStatus::Confirmed, _) => {
                self.notifications.registration_confirmed(&event, &updated).await;
            }
            (RegistrationStatus::Cancelled, Party::Organizer) => {
                self.notifications.registration_cancelled(updated.attendee_id, &event, &updated).await;
            }
            (RegistrationStatus::Cancelled, Party::Attendee) => {
                self.notifications.registration_cancelled(event.organizer_id, &event, &updated).await;
            }
            _ => {}
        }

        Ok(updated)
    }

    /// Attendee-side cancellation
    pub async fn cancel(&self, actor_id: Uuid, registration_id: Uuid) -> Result<Registration> {
        let registration = self.get(registration_id).await?;
        if registration.attendee_id != actor_id {
            return Err(EventHubError::Forbidden(
                "Only the attendee can cancel this registration".to_string(),
            ));
        }

        self.update_status(actor_id, registration_id, RegistrationStatus::Cancelled).await
    }

    /// Current registration of `attendee_id` for an event, if any
    pub async fn check(&self, event_id: Uuid, attendee_id: Uuid) -> Result<RegistrationCheck> {
        let check = match self.db.registrations.find_active(event_id, attendee_id).await? {
            Some(registration) => RegistrationCheck::from_registration(registration),
            None => RegistrationCheck::not_registered(),
        };

        Ok(check)
    }

    pub async fn my_registrations(&self, attendee_id: Uuid) -> Result<Vec<RegistrationSummary>> {
        self.db.registrations.get_attendee_registrations(attendee_id).await
    }

    /// Registrations of an event, visible to its organizer only
    pub async fn event_registrations(&self, actor_id: Uuid, event_id: Uuid) -> Result<Vec<RegistrationSummary>> {
        let event = self.db.events.find_by_id(event_id).await?
            .ok_or(EventHubError::EventNotFound { event_id })?;

        if !event.is_owned_by(actor_id) {
            return Err(EventHubError::Forbidden(
                "Only the event organizer can view its registrations".to_string(),
            ));
        }

        self.db.registrations.get_event_registrations(event_id).await
    }

    pub async fn get(&self, registration_id: Uuid) -> Result<Registration> {
        self.db.registrations.find_by_id(registration_id).await?
            .ok_or(EventHubError::RegistrationNotFound { registration_id })
    }

    pub(crate) async fn event_of(&self, registration: &Registration) -> Result<Event> {
        self.db.events.find_by_id(registration.event_id).await?
            .ok_or(EventHubError::EventNotFound { event_id: registration.event_id })
    }

    /// Drafts are invisible to participants
    async fn published_event(&self, event_id: Uuid) -> Result<Event> {
        self.db.events.find_by_id(event_id).await?
            .filter(Event::is_published)
            .ok_or(EventHubError::EventNotFound { event_id })
    }
}
