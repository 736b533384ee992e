// [apps/hub/src/middleware.rs]
/*!
 * APARATO: GUARDIAS PERIMETRALES DEL HUB (ESTRATO L4)
 * RESPONSABILIDAD: SALUD, AUTENTICACION JWT Y LIMITACION DE TASA
 *
 * Tres guardias componibles via `middleware::from_fn_with_state`:
 * salud (bloquea en mantenimiento), autenticacion (JWT real contra
 * `TokenService`), y limitacion de tasa (delega en `RateLimiter`).
 */

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use luna_domain_ratelimit::{RateLimitResult, RateLimitScope};
use luna_domain_tokens::Claims;
use std::net::SocketAddr;
use tracing::{debug, warn};
use uuid::Uuid;

/// Nombre de la cookie HTTPOnly que transporta el mismo JWT que el
/// encabezado `Authorization: Bearer`, usada por `/auth/secure-session`.
pub const SESSION_COOKIE_NAME: &str = "phoenix_session";

use crate::errors::ApiError;
use crate::state::AppState;

/// Identidad autenticada inyectada en las extensiones de la peticion.
#[derive(Debug, Clone)]
pub struct AuthenticatedIdentity(pub Claims);

/// Correlacion de trazabilidad propagada a traves de toda la peticion.
#[derive(Debug, Clone)]
pub struct RequestCorrelation {
    pub request_id: String,
    pub correlation_id: String,
}

pub async fn health_guard(State(state): State<AppState>, req: Request, next: Next) -> Response {
    if let Err(reason) = state.is_operational() {
        warn!("⛔ [ACCESS_DENIED]: Hub bajo mantenimiento: {}", reason);
        return ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "MAINTENANCE_ACTIVE",
            "maintenance_error",
            reason,
        )
        .into_response();
    }
    next.run(req).await
}

/// Inyecta un par `X-Request-ID`/`X-Correlation-ID` en cada peticion entrante.
pub async fn correlation_guard(mut req: Request, next: Next) -> Response {
    let request_id = req
        .headers()
        .get("x-request-id")
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let correlation_id = req
        .headers()
        .get("x-correlation-id")
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| request_id.clone());

    req.extensions_mut().insert(RequestCorrelation { request_id, correlation_id });
    next.run(req).await
}

/// Extrae el JWT del encabezado `Authorization: Bearer` o, en su ausencia,
/// de la cookie HTTPOnly `phoenix_session` emitida por `secure-session`.
fn extract_bearer_token(req: &Request) -> Option<String> {
    if let Some(header_value) = req.headers().get(header::AUTHORIZATION).and_then(|h| h.to_str().ok()) {
        if let Some(token) = header_value.strip_prefix("Bearer ") {
            return Some(token.to_string());
        }
    }
    req.headers().get(header::COOKIE).and_then(|h| h.to_str().ok()).and_then(|raw| {
        raw.split(';').map(str::trim).find_map(|pair| pair.strip_prefix(&format!("{SESSION_COOKIE_NAME}=")).map(str::to_string))
    })
}

/// Exige un JWT valido y firmado por el Hub, via encabezado Bearer o cookie.
pub async fn auth_guard(State(state): State<AppState>, mut req: Request, next: Next) -> Result<Response, ApiError> {
    let token_raw = extract_bearer_token(&req).ok_or_else(|| ApiError::unauthorized("Falta el token de autenticacion"))?;

    let claims = state.tokens.verify_access_token(&token_raw)?;
    debug!("👤 [AUTH]: Sujeto {} autenticado via JWT.", claims.sub);
    req.extensions_mut().insert(AuthenticatedIdentity(claims));
    Ok(next.run(req).await)
}

/// Aplica el limitador de tasa general por IP a toda peticion de la API y
/// anota la respuesta con los encabezados `X-RateLimit-*`/`Retry-After`.
pub async fn rate_limit_guard(
    State(state): State<AppState>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identifier = remote.ip().to_string();
    let decision = state.limiter.check_rate_limit(RateLimitScope::IpGeneral, &identifier).await?;

    if decision.result != RateLimitResult::Allowed {
        warn!("⛔ [RATE_LIMIT]: {} bloqueado en IpGeneral", identifier);
        let mut response = ApiError::rate_limited(decision.message.unwrap_or_else(|| "Demasiadas solicitudes".to_string())).into_response();
        annotate_rate_limit_headers(response.headers_mut(), &decision);
        return Ok(response);
    }

    let mut response = next.run(req).await;
    annotate_rate_limit_headers(response.headers_mut(), &decision);
    Ok(response)
}

fn annotate_rate_limit_headers(headers: &mut axum::http::HeaderMap, decision: &luna_domain_ratelimit::RateLimitDecision) {
    let remaining = decision.limit.saturating_sub(decision.current_count);
    let reset_seconds = (decision.reset_at - chrono::Utc::now()).num_seconds().max(0);

    if let Ok(value) = HeaderValue::from_str(&decision.limit.to_string()) {
        headers.insert("x-ratelimit-limit", value);
    }
    if let Ok(value) = HeaderValue::from_str(&remaining.to_string()) {
        headers.insert("x-ratelimit-remaining", value);
    }
    if let Ok(value) = HeaderValue::from_str(&reset_seconds.to_string()) {
        headers.insert("x-ratelimit-reset", value);
    }
    if let Ok(value) = HeaderValue::from_str(&decision.window_seconds.to_string()) {
        headers.insert("x-ratelimit-window", value);
    }
    if decision.result != RateLimitResult::Allowed {
        if let Ok(value) = HeaderValue::from_str(&reset_seconds.to_string()) {
            headers.insert(header::RETRY_AFTER, value);
        }
    }
}
