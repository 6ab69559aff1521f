//! Registration model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Lifecycle status of a registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "registration_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegistrationStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl RegistrationStatus {
    pub const ALL: [RegistrationStatus; 3] = [
        RegistrationStatus::Pending,
        RegistrationStatus::Confirmed,
        RegistrationStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationStatus::Pending => "PENDING",
            RegistrationStatus::Confirmed => "CONFIRMED",
            RegistrationStatus::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment axis of a registration, orthogonal to [`RegistrationStatus`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Unpaid,
    /// Claimed by a payment attempt while the gateway is charging
    Processing,
    Paid,
    /// Free event: payment is trivially satisfied
    NotRequired,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "UNPAID",
            PaymentStatus::Processing => "PROCESSING",
            PaymentStatus::Paid => "PAID",
            PaymentStatus::NotRequired => "NOT_REQUIRED",
        }
    }

    /// Whether this status blocks anything that waits on payment
    pub fn is_settled(&self) -> bool {
        matches!(self, PaymentStatus::Paid | PaymentStatus::NotRequired)
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub id: Uuid,
    pub event_id: Uuid,
    pub attendee_id: Uuid,
    pub ticket_type: String,
    pub quantity: i32,
    pub total_price_cents: i64,
    pub currency: String,
    pub status: RegistrationStatus,
    pub payment_status: PaymentStatus,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Registration {
    /// CONFIRMED and still waiting for a payment
    pub fn awaiting_payment(&self) -> bool {
        self.status == RegistrationStatus::Confirmed && self.payment_status == PaymentStatus::Unpaid
    }
}

/// Registration joined with the event summary, for attendee and organizer listings
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub registration: Registration,
    pub event_title: String,
    pub event_starts_at: DateTime<Utc>,
    pub attendee_name: String,
    pub attendee_email: String,
}

/// Body of `POST /api/registrations/register`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRegistrationRequest {
    pub event_id: Uuid,
    #[validate(length(min = 1, max = 100, message = "ticket type is required"))]
    pub ticket_type: String,
    #[validate(range(min = 1, max = 100, message = "quantity must be between 1 and 100"))]
    pub quantity: i32,
}

/// Everything the repository needs to insert a registration
#[derive(Debug, Clone)]
pub struct NewRegistration {
    pub event_id: Uuid,
    pub attendee_id: Uuid,
    pub ticket_type: String,
    pub quantity: i32,
    pub total_price_cents: i64,
    pub currency: String,
    pub status: RegistrationStatus,
    pub payment_status: PaymentStatus,
}

/// Body of `PUT /api/registrations/update-status/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRegistrationStatusRequest {
    pub status: RegistrationStatus,
}

/// Read-side projection answering "is this user registered, and in what state"
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationCheck {
    pub is_registered: bool,
    pub status: Option<RegistrationStatus>,
    pub payment_status: Option<PaymentStatus>,
    /// Nothing left to pay; always true for free events
    pub payment_settled: bool,
    pub registration_id: Option<Uuid>,
    pub data: Option<Registration>,
}

impl RegistrationCheck {
    pub fn not_registered() -> Self {
        Self {
            is_registered: false,
            status: None,
            payment_status: None,
            payment_settled: false,
            registration_id: None,
            data: None,
        }
    }

    pub fn from_registration(registration: Registration) -> Self {
        Self {
            is_registered: true,
            status: Some(registration.status),
            payment_status: Some(registration.payment_status),
            payment_settled: registration.payment_status.is_settled(),
            registration_id: Some(registration.id),
            data: Some(registration),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serialization_matches_wire_format() {
        assert_eq!(serde_json::to_string(&RegistrationStatus::Pending).unwrap(), "\"PENDING\"");
        assert_eq!(serde_json::to_string(&PaymentStatus::NotRequired).unwrap(), "\"NOT_REQUIRED\"");
        let parsed: UpdateRegistrationStatusRequest =
            serde_json::from_str(r#"{"status":"CONFIRMED"}"#).unwrap();
        assert_eq!(parsed.status, RegistrationStatus::Confirmed);
    }

    #[test]
    fn test_create_request_validation() {
        let request = CreateRegistrationRequest {
            event_id: Uuid::new_v4(),
            ticket_type: "General".to_string(),
            quantity: 0,
        };
        assert!(request.validate().is_err());

        let request = CreateRegistrationRequest { quantity: 2, ..request };
        assert!(request.validate().is_ok());

        let request = CreateRegistrationRequest { ticket_type: String::new(), ..request };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_not_registered_projection() {
        let check = RegistrationCheck::not_registered();
        assert!(!check.is_registered);
        assert!(check.registration_id.is_none());
        let json = serde_json::to_value(&check).unwrap();
        assert_eq!(json["isRegistered"], false);
    }

    #[test]
    fn test_payment_settled() {
        assert!(!PaymentStatus::Unpaid.is_settled());
        assert!(!PaymentStatus::Processing.is_settled());
        assert!(PaymentStatus::Paid.is_settled());
        assert!(PaymentStatus::NotRequired.is_settled());
    }
}
