// [apps/hub/src/handlers/narrative.rs]
/*!
 * APARATO: ADAPTADORES DE NARRATIVA (ESTRATO L4)
 * RESPONSABILIDAD: INGESTA DE EVENTOS Y RECONSTRUCCION DE CONTEXTO
 */

use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::errors::ApiError;
use crate::middleware::AuthenticatedIdentity;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct NarrativeEventRequest {
    pub event_type: String,
    pub app_source: String,
    #[serde(default)]
    pub event_data: Value,
    #[serde(default)]
    pub metadata: Value,
}

#[derive(Debug, serde::Serialize)]
pub struct NarrativeEventResponse {
    pub event_id: Uuid,
}

pub async fn record_event(
    State(state): State<AppState>,
    Extension(AuthenticatedIdentity(claims)): Extension<AuthenticatedIdentity>,
    Json(payload): Json<NarrativeEventRequest>,
) -> Result<Json<NarrativeEventResponse>, ApiError> {
    let event_id = state
        .events
        .append_event(&claims.sub, &payload.event_type, &payload.app_source, payload.event_data, payload.metadata)
        .await?;
    state.narrative.invalidate(&claims.sub).await;
    Ok(Json(NarrativeEventResponse { event_id }))
}

pub async fn context(
    State(state): State<AppState>,
    Extension(AuthenticatedIdentity(claims)): Extension<AuthenticatedIdentity>,
    Path(user_id): Path<String>,
) -> Result<Json<luna_domain_narrative::ContextPacket>, ApiError> {
    if user_id != claims.sub {
        return Err(ApiError::forbidden("No puede consultar el contexto narrativo de otro usuario"));
    }
    Ok(Json(state.narrative.generate_context_packet(&user_id).await?))
}
