// [apps/hub/src/handlers/energy.rs]
/*!
 * APARATO: ADAPTADORES DE CONTABILIDAD DE ENERGIA (ESTRATO L4)
 * RESPONSABILIDAD: SALDO, PRECHEQUEO, CONSUMO Y REEMBOLSO MEDIDOS
 */

use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::errors::ApiError;
use crate::middleware::AuthenticatedIdentity;
use crate::orchestration::energy::{check_refund_eligibility, consume_metered_action, refund_action};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CanPerformRequest {
    pub action: String,
}

pub async fn can_perform(
    State(state): State<AppState>,
    Extension(AuthenticatedIdentity(claims)): Extension<AuthenticatedIdentity>,
    Json(payload): Json<CanPerformRequest>,
) -> Result<Json<luna_domain_energy::PrecheckResult>, ApiError> {
    Ok(Json(state.ledger.can_perform(&claims.sub, &payload.action).await.map_err(ApiError::from)?))
}

pub async fn balance(
    State(state): State<AppState>,
    Extension(AuthenticatedIdentity(claims)): Extension<AuthenticatedIdentity>,
) -> Result<Json<luna_domain_energy::BalanceSnapshot>, ApiError> {
    Ok(Json(state.ledger.check_balance(&claims.sub).await?))
}

#[derive(Debug, Deserialize)]
pub struct ConsumeRequest {
    pub action: String,
    pub app_source: String,
    #[serde(default)]
    pub context: Value,
}

#[derive(Debug, Serialize)]
pub struct ConsumeResponse {
    pub transaction_id: String,
    pub consumed: f64,
    pub remaining: f64,
    pub event_id: Uuid,
    pub unlimited: bool,
}

impl From<luna_domain_energy::ConsumeResult> for ConsumeResponse {
    fn from(result: luna_domain_energy::ConsumeResult) -> Self {
        Self {
            transaction_id: result.transaction_id,
            consumed: result.consumed,
            remaining: result.remaining,
            event_id: result.event_id,
            unlimited: result.unlimited,
        }
    }
}

pub async fn consume(
    State(state): State<AppState>,
    Extension(AuthenticatedIdentity(claims)): Extension<AuthenticatedIdentity>,
    Json(payload): Json<ConsumeRequest>,
) -> Result<Json<ConsumeResponse>, ApiError> {
    let result = consume_metered_action(&state, &claims.sub, &payload.action, &payload.app_source, payload.context).await?;
    Ok(Json(result.into()))
}

#[derive(Debug, Deserialize)]
pub struct RefundRequest {
    pub original_event_id: Uuid,
    pub reason: String,
    #[serde(default)]
    pub context: Value,
}

#[derive(Debug, Serialize)]
pub struct RefundResponse {
    pub transaction_id: String,
    pub refunded: f64,
    pub new_balance: f64,
}

impl From<luna_domain_energy::RefundResult> for RefundResponse {
    fn from(result: luna_domain_energy::RefundResult) -> Self {
        Self { transaction_id: result.transaction_id, refunded: result.refunded, new_balance: result.new_balance }
    }
}

pub async fn refund(
    State(state): State<AppState>,
    Extension(AuthenticatedIdentity(claims)): Extension<AuthenticatedIdentity>,
    Json(payload): Json<RefundRequest>,
) -> Result<Json<RefundResponse>, ApiError> {
    let result = refund_action(&state, &claims.sub, payload.original_event_id, &payload.reason, payload.context).await?;
    Ok(Json(result.into()))
}

#[derive(Debug, Serialize)]
pub struct RefundEligibilityResponse {
    pub eligible: bool,
}

pub async fn refund_eligibility(
    State(state): State<AppState>,
    Extension(AuthenticatedIdentity(claims)): Extension<AuthenticatedIdentity>,
    Path((user_id, event_id)): Path<(String, Uuid)>,
) -> Result<Json<RefundEligibilityResponse>, ApiError> {
    if user_id != claims.sub {
        return Err(ApiError::forbidden("No puede consultar la elegibilidad de reembolso de otro usuario"));
    }
    let eligible = check_refund_eligibility(&state, &user_id, event_id).await?;
    Ok(Json(RefundEligibilityResponse { eligible }))
}
