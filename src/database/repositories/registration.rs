//! Registration repository implementation
//!
//! Ticket inventory (`event_tickets.available_quantity`) and event capacity
//! (`events.registered_count`) are only ever changed here, inside the same
//! transaction that creates or cancels the registration holding them, and
//! always through conditional updates so concurrent requests cannot oversell.

use std::time::Instant;
use sqlx::{PgConnection, PgPool};
use chrono::Utc;
use uuid::Uuid;
use crate::models::registration::{
    Registration, RegistrationStatus, PaymentStatus, RegistrationSummary, NewRegistration,
};
use crate::utils::errors::EventHubError;
use crate::utils::logging::log_database_operation;

const REGISTRATION_COLUMNS: &str = "id, event_id, attendee_id, ticket_type, quantity, \
    total_price_cents, currency, status, payment_status, paid_at, created_at, updated_at";

const SUMMARY_SELECT: &str = r#"
    SELECT r.id, r.event_id, r.attendee_id, r.ticket_type, r.quantity, r.total_price_cents,
           r.currency, r.status, r.payment_status, r.paid_at, r.created_at, r.updated_at,
           e.title AS event_title, e.starts_at AS event_starts_at,
           TRIM(u.first_name || ' ' || u.last_name) AS attendee_name, u.email AS attendee_email
    FROM registrations r
    INNER JOIN events e ON e.id = r.event_id
    INNER JOIN users u ON u.id = r.attendee_id
"#;

#[derive(Clone)]
#[derive(Debug)]
pub struct RegistrationRepository {
    pool: PgPool,
}

impl RegistrationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Reserve inventory and insert the registration in one transaction
    ///
    /// Fails with `Conflict` when the ticket type has fewer than `quantity`
    /// units left, when the event capacity would be exceeded, or when the
    /// attendee already holds an active registration for the event.
    pub async fn create_with_reservation(&self, new: NewRegistration) -> Result<Registration, EventHubError> {
        let started = Instant::now();
        let result = self.reserve_and_insert(new).await;
        log_database_operation(
            "create_with_reservation",
            "registrations",
            started.elapsed().as_millis() as u64,
            !matches!(result, Err(EventHubError::Database(_))),
        );
        result
    }

    async fn reserve_and_insert(&self, new: NewRegistration) -> Result<Registration, EventHubError> {
        let mut tx = self.pool.begin().await?;

        let reserved = sqlx::query(
            r#"
            UPDATE event_tickets
            SET available_quantity = available_quantity - $3
            WHERE event_id = $1 AND ticket_type = $2 AND available_quantity >= $3
            "#
        )
        .bind(new.event_id)
        .bind(&new.ticket_type)
        .bind(new.quantity)
        .execute(&mut *tx)
        .await?;

        if reserved.rows_affected() == 0 {
            return Err(EventHubError::Conflict(format!(
                "Not enough '{}' tickets left for {} attendee(s)",
                new.ticket_type, new.quantity
            )));
        }

        let admitted = sqlx::query(
            r#"
            UPDATE events
            SET registered_count = registered_count + $2
            WHERE id = $1 AND (capacity IS NULL OR registered_count + $2 <= capacity)
            "#
        )
        .bind(new.event_id)
        .bind(new.quantity)
        .execute(&mut *tx)
        .await?;

        if admitted.rows_affected() == 0 {
            return Err(EventHubError::Conflict("Event is at full capacity".to_string()));
        }

        let now = Utc::now();
        let registration = sqlx::query_as::<_, Registration>(&format!(
            r#"
            INSERT INTO registrations (id, event_id, attendee_id, ticket_type, quantity, total_price_cents,
                                       currency, status, payment_status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {REGISTRATION_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(new.event_id)
        .bind(new.attendee_id)
        .bind(&new.ticket_type)
        .bind(new.quantity)
        .bind(new.total_price_cents)
        .bind(&new.currency)
        .bind(new.status)
        .bind(new.payment_status)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                EventHubError::Conflict("You already have an active registration for this event".to_string())
            }
            other => EventHubError::Database(other),
        })?;

        tx.commit().await?;
        Ok(registration)
    }

    /// Find registration by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Registration>, EventHubError> {
        let registration = sqlx::query_as::<_, Registration>(&format!(
            "SELECT {REGISTRATION_COLUMNS} FROM registrations WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(registration)
    }

    /// Most recent non-cancelled registration of an attendee for an event
    pub async fn find_active(&self, event_id: Uuid, attendee_id: Uuid) -> Result<Option<Registration>, EventHubError> {
        let registration = sqlx::query_as::<_, Registration>(&format!(
            r#"
            SELECT {REGISTRATION_COLUMNS} FROM registrations
            WHERE event_id = $1 AND attendee_id = $2 AND status <> 'CANCELLED'
            ORDER BY created_at DESC
            LIMIT 1
            "#
        ))
        .bind(event_id)
        .bind(attendee_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(registration)
    }

    /// Compare-and-set a status change that does not touch inventory
    ///
    /// Returns `None` when the registration was no longer in `from`.
    pub async fn transition_status(
        &self,
        id: Uuid,
        from: RegistrationStatus,
        to: RegistrationStatus,
    ) -> Result<Option<Registration>, EventHubError> {
        let mut conn = self.pool.acquire().await?;
        Self::set_status(&mut conn, id, from, to).await
    }

    /// Cancel a registration and return its inventory in one transaction
    ///
    /// Returns `None` when the registration was no longer in `from`.
    pub async fn cancel_and_release(
        &self,
        id: Uuid,
        from: RegistrationStatus,
    ) -> Result<Option<Registration>, EventHubError> {
        let mut tx = self.pool.begin().await?;

        let Some(registration) = Self::set_status(&mut tx, id, from, RegistrationStatus::Cancelled).await? else {
            return Ok(None);
        };

        Self::release_inventory(&mut tx, &registration).await?;

        tx.commit().await?;
        Ok(Some(registration))
    }

    /// Cancel the active registrations of an event and delete the event, atomically
    ///
    /// Locks follow `cancel_and_release` (registrations, tickets, event) and
    /// the ticket locks keep new registrations out until the delete commits.
    /// Returns the cancelled registrations, or `None` when the event no
    /// longer exists.
    pub async fn cancel_all_and_delete_event(&self, event_id: Uuid) -> Result<Option<Vec<Registration>>, EventHubError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT id FROM registrations WHERE event_id = $1 AND status <> $2 FOR UPDATE")
            .bind(event_id)
            .bind(RegistrationStatus::Cancelled)
            .fetch_all(&mut *tx)
            .await?;

        sqlx::query("SELECT ticket_type FROM event_tickets WHERE event_id = $1 FOR UPDATE")
            .bind(event_id)
            .fetch_all(&mut *tx)
            .await?;

        let locked: Option<Uuid> = sqlx::query_scalar("SELECT id FROM events WHERE id = $1 FOR UPDATE")
            .bind(event_id)
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            return Ok(None);
        }

        let cancelled = sqlx::query_as::<_, Registration>(&format!(
            r#"
            UPDATE registrations SET status = $2, updated_at = $3
            WHERE event_id = $1 AND status <> $2
            RETURNING {REGISTRATION_COLUMNS}
            "#
        ))
        .bind(event_id)
        .bind(RegistrationStatus::Cancelled)
        .bind(Utc::now())
        .fetch_all(&mut *tx)
        .await?;

        // Tickets and registrations cascade
        sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(event_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(cancelled))
    }

    /// Cancel an attendee's active registrations, return their inventory and
    /// delete the user, atomically
    ///
    /// Returns the cancelled registrations, or `None` when the user does not
    /// exist.
    pub async fn cancel_all_and_delete_attendee(&self, attendee_id: Uuid) -> Result<Option<Vec<Registration>>, EventHubError> {
        let mut tx = self.pool.begin().await?;

        let active = sqlx::query_as::<_, Registration>(&format!(
            r#"
            SELECT {REGISTRATION_COLUMNS} FROM registrations
            WHERE attendee_id = $1 AND status <> $2
            ORDER BY event_id
            FOR UPDATE
            "#
        ))
        .bind(attendee_id)
        .bind(RegistrationStatus::Cancelled)
        .fetch_all(&mut *tx)
        .await?;

        let mut cancelled = Vec::with_capacity(active.len());
        for registration in active {
            if let Some(registration) = Self::set_status(&mut tx, registration.id, registration.status, RegistrationStatus::Cancelled).await? {
                Self::release_inventory(&mut tx, &registration).await?;
                cancelled.push(registration);
            }
        }

        let deleted = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(attendee_id)
            .execute(&mut *tx)
            .await?;
        if deleted.rows_affected() == 0 {
            return Ok(None);
        }

        tx.commit().await?;
        Ok(Some(cancelled))
    }

    /// Claim a CONFIRMED + UNPAID registration for a payment attempt
    ///
    /// Moves it to PROCESSING so no second attempt can reach the gateway.
    /// Returns `None` when the registration is not (or no longer) awaiting
    /// payment.
    pub async fn claim_payment(&self, id: Uuid) -> Result<Option<Registration>, EventHubError> {
        let registration = sqlx::query_as::<_, Registration>(&format!(
            r#"
            UPDATE registrations
            SET payment_status = $2, updated_at = $3
            WHERE id = $1 AND status = $4 AND payment_status = $5
            RETURNING {REGISTRATION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(PaymentStatus::Processing)
        .bind(Utc::now())
        .bind(RegistrationStatus::Confirmed)
        .bind(PaymentStatus::Unpaid)
        .fetch_optional(&self.pool)
        .await?;

        Ok(registration)
    }

    /// Record the charge of a claimed registration
    ///
    /// The registration may have been cancelled while the gateway was
    /// charging; the payment is recorded regardless.
    pub async fn mark_paid(&self, id: Uuid) -> Result<Option<Registration>, EventHubError> {
        let now = Utc::now();
        let registration = sqlx::query_as::<_, Registration>(&format!(
            r#"
            UPDATE registrations
            SET payment_status = $2, paid_at = $3, updated_at = $3
            WHERE id = $1 AND payment_status = $4
            RETURNING {REGISTRATION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(PaymentStatus::Paid)
        .bind(now)
        .bind(PaymentStatus::Processing)
        .fetch_optional(&self.pool)
        .await?;

        Ok(registration)
    }

    /// Hand a claimed registration back after a failed charge
    pub async fn release_payment_claim(&self, id: Uuid) -> Result<(), EventHubError> {
        sqlx::query(
            "UPDATE registrations SET payment_status = $2, updated_at = $3 WHERE id = $1 AND payment_status = $4"
        )
        .bind(id)
        .bind(PaymentStatus::Unpaid)
        .bind(Utc::now())
        .bind(PaymentStatus::Processing)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Registrations of an attendee, newest first
    pub async fn get_attendee_registrations(&self, attendee_id: Uuid) -> Result<Vec<RegistrationSummary>, EventHubError> {
        let registrations = sqlx::query_as::<_, RegistrationSummary>(&format!(
            "{SUMMARY_SELECT} WHERE r.attendee_id = $1 ORDER BY r.created_at DESC"
        ))
        .bind(attendee_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(registrations)
    }

    /// Registrations of an event, oldest first
    pub async fn get_event_registrations(&self, event_id: Uuid) -> Result<Vec<RegistrationSummary>, EventHubError> {
        let registrations = sqlx::query_as::<_, RegistrationSummary>(&format!(
            "{SUMMARY_SELECT} WHERE r.event_id = $1 ORDER BY r.created_at ASC"
        ))
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(registrations)
    }

    /// Count total registrations
    pub async fn count(&self) -> Result<i64, EventHubError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM registrations")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }

    async fn set_status(
        conn: &mut PgConnection,
        id: Uuid,
        from: RegistrationStatus,
        to: RegistrationStatus,
    ) -> Result<Option<Registration>, EventHubError> {
        let registration = sqlx::query_as::<_, Registration>(&format!(
            r#"
            UPDATE registrations SET status = $3, updated_at = $4
            WHERE id = $1 AND status = $2
            RETURNING {REGISTRATION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(from)
        .bind(to)
        .bind(Utc::now())
        .fetch_optional(&mut *conn)
        .await?;

        Ok(registration)
    }

    /// Put a cancelled registration's tickets and seats back
    async fn release_inventory(conn: &mut PgConnection, registration: &Registration) -> Result<(), EventHubError> {
        sqlx::query(
            "UPDATE event_tickets SET available_quantity = available_quantity + $3 WHERE event_id = $1 AND ticket_type = $2"
        )
        .bind(registration.event_id)
        .bind(&registration.ticket_type)
        .bind(registration.quantity)
        .execute(&mut *conn)
        .await?;

        sqlx::query(
            "UPDATE events SET registered_count = GREATEST(registered_count - $2, 0) WHERE id = $1"
        )
        .bind(registration.event_id)
        .bind(registration.quantity)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }
}
