// [apps/hub/src/handlers/monitoring.rs]
/*!
 * APARATO: ADAPTADORES DE OBSERVABILIDAD (ESTRATO L4)
 * RESPONSABILIDAD: SALUD, DISPONIBILIDAD Y METRICAS DE LIMITACION DE TASA
 */

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use serde_json::json;
use tracing::warn;

use crate::state::AppState;

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}

pub async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    let database_ready = state.store.get_connection().is_ok();
    if !database_ready {
        warn!("⚠️ [READINESS]: Database connection pool unavailable.");
        return (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "status": "not_ready", "database": false })));
    }
    (StatusCode::OK, Json(json!({ "status": "ready", "database": true })))
}

#[derive(Debug, Serialize)]
pub struct MetricsResponse {
    pub total_requests: u64,
    pub allowed: u64,
    pub limited: u64,
    pub cache_errors: u64,
    pub success_rate_pct: f64,
    pub block_rate_pct: f64,
}

pub async fn metrics(State(state): State<AppState>) -> Json<MetricsResponse> {
    let snapshot = state.limiter.get_metrics();
    Json(MetricsResponse {
        total_requests: snapshot.total_requests,
        allowed: snapshot.allowed,
        limited: snapshot.limited,
        cache_errors: snapshot.cache_errors,
        success_rate_pct: snapshot.success_rate_pct(),
        block_rate_pct: snapshot.block_rate_pct(),
    })
}
