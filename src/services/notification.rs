//! Notification service implementation
//!
//! Notifications are stored rows the SPA polls for. Producing one is best
//! effort: a failed insert is logged and never fails the operation that
//! triggered it.

use tracing::{debug, warn};
use uuid::Uuid;
use crate::config::settings::Settings;
use crate::database::repositories::NotificationRepository;
use crate::models::event::Event;
use crate::models::notification::{Notification, NotificationKind, CreateNotificationRequest};
use crate::models::registration::Registration;
use crate::utils::errors::{EventHubError, Result};
use crate::utils::helpers::{format_money, page_to_limit_offset, truncate_text};

const TITLE_LIMIT: usize = 80;

fn title(event: &Event) -> String {
    truncate_text(&event.title, TITLE_LIMIT)
}

#[derive(Clone, Debug)]
pub struct NotificationService {
    repository: NotificationRepository,
    enabled: bool,
}

impl NotificationService {
    pub fn new(repository: NotificationRepository, settings: &Settings) -> Self {
        Self {
            repository,
            enabled: settings.features.notifications,
        }
    }

    /// Store a notification, logging instead of failing
    pub async fn notify(&self, request: CreateNotificationRequest) {
        if !self.enabled {
            debug!(recipient_id = %request.recipient_id, kind = ?request.kind, "Notifications disabled, skipping");
            return;
        }

        let recipient_id = request.recipient_id;
        let kind = request.kind;
        if let Err(e) = self.repository.create(request).await {
            warn!(recipient_id = %recipient_id, kind = ?kind, error = %e, "Failed to store notification");
        }
    }

    /// Tell the organizer someone registered
    pub async fn registration_created(&self, event: &Event, registration: &Registration) {
        let message = format!(
            "New registration for \"{}\": {} x {} ({})",
            title(event),
            registration.quantity,
            registration.ticket_type,
            registration.status,
        );
        self.notify(Self::request(event.organizer_id, NotificationKind::RegistrationCreated, message, event, registration))
            .await;
    }

    /// Tell the attendee their registration was confirmed
    pub async fn registration_confirmed(&self, event: &Event, registration: &Registration) {
        let message = format!("Your registration for \"{}\" was confirmed", title(event));
        self.notify(Self::request(registration.attendee_id, NotificationKind::RegistrationConfirmed, message, event, registration))
            .await;
    }

    /// Tell `recipient_id` a registration was cancelled
    pub async fn registration_cancelled(&self, recipient_id: Uuid, event: &Event, registration: &Registration) {
        let message = format!("A registration for \"{}\" was cancelled", title(event));
        self.notify(Self::request(recipient_id, NotificationKind::RegistrationCancelled, message, event, registration))
            .await;
    }

    /// Tell the organizer a payment came in
    pub async fn payment_received(&self, event: &Event, registration: &Registration) {
        let message = format!(
            "Payment of {} received for \"{}\"",
            format_money(registration.total_price_cents, &registration.currency),
            title(event),
        );
        self.notify(Self::request(event.organizer_id, NotificationKind::PaymentReceived, message, event, registration))
            .await;
    }

    /// Tell an attendee the event they registered for was removed
    pub async fn event_cancelled(&self, event: &Event, registration: &Registration) {
        let message = format!("\"{}\" was cancelled by the organizer", title(event));
        // Sent after the event and its registrations are gone, so nothing to link
        self.notify(CreateNotificationRequest {
            recipient_id: registration.attendee_id,
            kind: NotificationKind::EventCancelled,
            message,
            event_id: None,
            registration_id: None,
        })
        .await;
    }

    /// Notifications of a user, newest first
    pub async fn list(
        &self,
        user_id: Uuid,
        unread_only: bool,
        page: Option<i64>,
        per_page: Option<i64>,
    ) -> Result<Vec<Notification>> {
        let (limit, offset) = page_to_limit_offset(page, per_page);
        self.repository.list_for_recipient(user_id, unread_only, limit, offset).await
    }

    pub async fn unread_count(&self, user_id: Uuid) -> Result<i64> {
        self.repository.unread_count(user_id).await
    }

    pub async fn mark_read(&self, user_id: Uuid, notification_id: Uuid) -> Result<Notification> {
        self.repository
            .mark_read(notification_id, user_id)
            .await?
            .ok_or(EventHubError::NotificationNotFound { notification_id })
    }

    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64> {
        let updated = self.repository.mark_all_read(user_id).await?;
        debug!(user_id = %user_id, updated = updated, "Marked notifications read");
        Ok(updated)
    }

    fn request(
        recipient_id: Uuid,
        kind: NotificationKind,
        message: String,
        event: &Event,
        registration: &Registration,
    ) -> CreateNotificationRequest {
        CreateNotificationRequest {
            recipient_id,
            kind,
            message,
            event_id: Some(event.id),
            registration_id: Some(registration.id),
        }
    }
}
