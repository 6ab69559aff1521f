//! Simulated payment processing
//!
//! Card details are checked for shape only and are never stored or logged.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;
use validator::{Validate, ValidationError};
use crate::database::DatabaseService;
use crate::models::registration::Registration;
use crate::services::lifecycle;
use crate::services::notification::NotificationService;
use crate::utils::errors::{EventHubError, Result};
use crate::utils::helpers::{is_valid_card_expiry, is_valid_card_number};
use crate::utils::logging::log_payment;

/// Body of `POST /api/payments/process`
#[derive(Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProcessPaymentRequest {
    pub registration_id: Uuid,
    #[validate(nested)]
    pub payment_details: PaymentDetails,
}

#[derive(Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetails {
    #[validate(custom(function = "validate_card_number"))]
    pub card_number: String,
    #[validate(length(min = 1, max = 200, message = "card holder is required"))]
    pub card_holder: String,
    #[validate(custom(function = "validate_expiry"))]
    pub expiry: String,
    #[validate(custom(function = "validate_cvc"))]
    pub cvc: String,
}

impl std::fmt::Debug for PaymentDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentDetails").finish_non_exhaustive()
    }
}

impl std::fmt::Debug for ProcessPaymentRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessPaymentRequest")
            .field("registration_id", &self.registration_id)
            .finish_non_exhaustive()
    }
}

fn validate_card_number(number: &str) -> std::result::Result<(), ValidationError> {
    if is_valid_card_number(number) {
        Ok(())
    } else {
        Err(ValidationError::new("card_number"))
    }
}

fn validate_expiry(expiry: &str) -> std::result::Result<(), ValidationError> {
    if is_valid_card_expiry(expiry) {
        Ok(())
    } else {
        Err(ValidationError::new("expiry"))
    }
}

fn validate_cvc(cvc: &str) -> std::result::Result<(), ValidationError> {
    if (3..=4).contains(&cvc.len()) && cvc.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::new("cvc"))
    }
}

/// What the gateway reports back for an approved charge
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GatewayCharge {
    pub transaction_id: String,
    pub processed_at: DateTime<Utc>,
}

/// Result of `POST /api/payments/process`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceipt {
    pub transaction_id: String,
    pub amount_cents: i64,
    pub currency: String,
    pub registration: Registration,
}

/// A payment processor
pub trait PaymentGateway: Send + Sync + std::fmt::Debug {
    /// Charge `amount_cents` in `currency`
    fn charge(
        &self,
        amount_cents: i64,
        currency: &str,
        details: &PaymentDetails,
    ) -> Pin<Box<dyn Future<Output = Result<GatewayCharge>> + Send>>;
}

/// Gateway that waits a configured delay and approves everything
#[derive(Debug, Clone)]
pub struct SimulatedGateway {
    delay: Duration,
}

impl SimulatedGateway {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl PaymentGateway for SimulatedGateway {
    fn charge(
        &self,
        _amount_cents: i64,
        _currency: &str,
        _details: &PaymentDetails,
    ) -> Pin<Box<dyn Future<Output = Result<GatewayCharge>> + Send>> {
        let delay = self.delay;
        Box::pin(async move {
            tokio::time::sleep(delay).await;
            Ok(GatewayCharge {
                transaction_id: format!("sim_{}", Uuid::new_v4().simple()),
                processed_at: Utc::now(),
            })
        })
    }
}

#[derive(Clone, Debug)]
pub struct PaymentService {
    db: DatabaseService,
    gateway: Arc<dyn PaymentGateway>,
    notifications: NotificationService,
}

impl PaymentService {
    pub fn new(db: DatabaseService, gateway: Arc<dyn PaymentGateway>, notifications: NotificationService) -> Self {
        Self { db, gateway, notifications }
    }

    /// Pay for a confirmed registration on behalf of its attendee
    pub async fn process(&self, actor_id: Uuid, request: ProcessPaymentRequest) -> Result<PaymentReceipt> {
        let registration_id = request.registration_id;
        let registration = self.db.registrations.find_by_id(registration_id).await?
            .ok_or(EventHubError::RegistrationNotFound { registration_id })?;

        lifecycle::check_payable(&registration, actor_id)?;
        request.validate()?;

        let Some(claimed) = self.db.registrations.claim_payment(registration_id).await? else {
            // A concurrent attempt claimed it first, or it was cancelled meanwhile.
            let fresh = self.db.registrations.find_by_id(registration_id).await?
                .ok_or(EventHubError::RegistrationNotFound { registration_id })?;
            lifecycle::check_payable(&fresh, actor_id)?;
            return Err(EventHubError::Conflict(
                "Registration is no longer awaiting payment".to_string(),
            ));
        };

        let charge = match self
            .gateway
            .charge(claimed.total_price_cents, &claimed.currency, &request.payment_details)
            .await
        {
            Ok(charge) => charge,
            Err(e) => {
                log_payment(registration_id, claimed.total_price_cents, &claimed.currency, false);
                self.db.registrations.release_payment_claim(registration_id).await?;
                return Err(e);
            }
        };

        let Some(paid) = self.db.registrations.mark_paid(registration_id).await? else {
            warn!(registration_id = %registration_id, transaction_id = %charge.transaction_id, "Charged registration lost its payment claim");
            return Err(EventHubError::Internal(format!(
                "payment claim for registration {registration_id} disappeared"
            )));
        };

        log_payment(registration_id, paid.total_price_cents, &paid.currency, true);
        info!(registration_id = %registration_id, transaction_id = %charge.transaction_id, "Payment processed");

        if let Some(event) = self.db.events.find_by_id(paid.event_id).await? {
            self.notifications.payment_received(&event, &paid).await;
        }

        Ok(PaymentReceipt {
            transaction_id: charge.transaction_id,
            amount_cents: paid.total_price_cents,
            currency: paid.currency.clone(),
            registration: paid,
        })
    }
}
