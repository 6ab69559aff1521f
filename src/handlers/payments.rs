//! Payment handler

use axum::extract::State;
use crate::handlers::{ok, ApiJson, ApiResult, AppState};
use crate::middleware::CurrentUser;
use crate::services::payment::{ProcessPaymentRequest, PaymentReceipt};

/// `POST /api/payments/process`
pub async fn process(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(request): ApiJson<ProcessPaymentRequest>,
) -> ApiResult<PaymentReceipt> {
    ok(state.services.payment_service.process(user.id, request).await?)
}
