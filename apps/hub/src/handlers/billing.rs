// [apps/hub/src/handlers/billing.rs]
/*!
 * APARATO: ADAPTADORES DE FACTURACION (ESTRATO L4)
 * RESPONSABILIDAD: CREACION DE INTENCIONES Y CONFIRMACION DE PAGOS DE ENERGIA
 */

use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::errors::ApiError;
use crate::middleware::AuthenticatedIdentity;
use crate::orchestration::billing::{confirm_purchase, create_intent};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateIntentRequest {
    pub pack_code: String,
}

#[derive(Debug, Serialize)]
pub struct CreateIntentResponse {
    pub intent_id: String,
    pub pack_code: String,
    pub price_cents: u32,
    pub currency: &'static str,
}

pub async fn create_billing_intent(
    State(state): State<AppState>,
    Extension(AuthenticatedIdentity(claims)): Extension<AuthenticatedIdentity>,
    Json(payload): Json<CreateIntentRequest>,
) -> Result<Json<CreateIntentResponse>, ApiError> {
    let intent = create_intent(&state, &claims.sub, &payload.pack_code).await?;
    Ok(Json(CreateIntentResponse {
        intent_id: intent.intent_id,
        pack_code: intent.pack_code,
        price_cents: intent.price_cents,
        currency: intent.currency,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ConfirmPaymentRequest {
    pub pack_code: String,
    pub intent_id: String,
}

#[derive(Debug, Serialize)]
pub struct ConfirmPaymentResponse {
    pub purchase_id: String,
    pub energy_added: f64,
    pub bonus_applied: bool,
    pub current_energy: f64,
}

pub async fn confirm_payment(
    State(state): State<AppState>,
    Extension(AuthenticatedIdentity(claims)): Extension<AuthenticatedIdentity>,
    Json(payload): Json<ConfirmPaymentRequest>,
) -> Result<Json<ConfirmPaymentResponse>, ApiError> {
    let result = confirm_purchase(&state, &claims.sub, &payload.pack_code, &payload.intent_id).await?;
    Ok(Json(ConfirmPaymentResponse {
        purchase_id: result.purchase_id,
        energy_added: result.energy_added,
        bonus_applied: result.bonus_applied,
        current_energy: result.current_energy,
    }))
}

pub async fn history(
    State(state): State<AppState>,
    Extension(AuthenticatedIdentity(claims)): Extension<AuthenticatedIdentity>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<luna_domain_models::Event>>, ApiError> {
    if user_id != claims.sub {
        return Err(ApiError::forbidden("No puede consultar el historial de facturacion de otro usuario"));
    }
    let purchased = state.events.query_events(&user_id, 100, Some(luna_domain_models::event_types::ENERGY_PURCHASED), None).await?;
    let intents = state.events.query_events(&user_id, 100, Some(luna_domain_models::event_types::BILLING_INTENT_CREATED), None).await?;
    let mut combined = purchased;
    combined.extend(intents);
    combined.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(Json(combined))
}
