// [apps/hub/src/handlers/auth.rs]
/*!
 * APARATO: ADAPTADORES DE IDENTIDAD Y SESION (ESTRATO L4)
 * RESPONSABILIDAD: REGISTRO, LOGIN, ROTACION, DELEGACION A ESPECIALISTAS
 */

use axum::extract::{ConnectInfo, Path, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use luna_domain_ratelimit::RateLimitScope;
use luna_domain_tokens::{DelegationContext, LunaContext, SpecialistName};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use uuid::Uuid;

use crate::errors::ApiError;
use crate::middleware::{AuthenticatedIdentity, SESSION_COOKIE_NAME};
use crate::state::AppState;

/// Construye el `Set-Cookie` HTTPOnly que transporta el token de acceso.
fn build_session_cookie(access_token: &str, secure: bool, max_age_seconds: i64) -> HeaderValue {
    let secure_attr = if secure { "; Secure" } else { "" };
    let raw = format!("{SESSION_COOKIE_NAME}={access_token}; HttpOnly; Path=/; SameSite=Lax; Max-Age={max_age_seconds}{secure_attr}");
    HeaderValue::from_str(&raw).unwrap_or_else(|_| HeaderValue::from_static(""))
}

/// Construye el `Set-Cookie` que expira inmediatamente la sesion asegurada.
fn clear_session_cookie(secure: bool) -> HeaderValue {
    let secure_attr = if secure { "; Secure" } else { "" };
    let raw = format!("{SESSION_COOKIE_NAME}=; HttpOnly; Path=/; SameSite=Lax; Max-Age=0{secure_attr}");
    HeaderValue::from_str(&raw).unwrap_or_else(|_| HeaderValue::from_static(""))
}

fn client_ip(headers: &HeaderMap, remote: SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .map(str::to_string)
        .unwrap_or_else(|| remote.ip().to_string())
}

fn user_agent(headers: &HeaderMap) -> String {
    headers.get(header::USER_AGENT).and_then(|h| h.to_str().ok()).unwrap_or_default().to_string()
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user_id: String,
    pub access_token: String,
    pub refresh_token: String,
    pub session_id: Uuid,
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

pub async fn register(
    State(state): State<AppState>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    state.limiter.check_rate_limit(RateLimitScope::AuthRegister, &client_ip(&headers, remote)).await?;

    if state.users.find_by_email(&payload.email).await?.is_some() {
        return Err(ApiError::conflict("Ya existe una cuenta con este correo"));
    }

    let user_id = Uuid::new_v4().to_string();
    let password_hash = state.tokens.hash_password(&payload.password)?;
    state.users.create_user(&user_id, &payload.email, &password_hash).await?;

    let issued = state
        .tokens
        .login(&user_id, &client_ip(&headers, remote), &user_agent(&headers), LunaContext::default(), default_scope())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            user_id,
            access_token: issued.access_token,
            refresh_token: issued.refresh_token,
            session_id: issued.session_id,
            expires_at: issued.expires_at,
        }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub async fn login(
    State(state): State<AppState>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let ip = client_ip(&headers, remote);
    state.limiter.check_rate_limit(RateLimitScope::AuthLogin, &ip).await?;

    let user = state
        .users
        .find_by_email(&payload.email)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Credenciales invalidas"))?;

    if !user.active || !state.tokens.verify_password(&payload.password, &user.password_hash) {
        return Err(ApiError::unauthorized("Credenciales invalidas"));
    }

    let issued = state.tokens.login(&user.user_id, &ip, &user_agent(&headers), LunaContext::default(), default_scope()).await?;

    Ok(Json(SessionResponse {
        user_id: user.user_id,
        access_token: issued.access_token,
        refresh_token: issued.refresh_token,
        session_id: issued.session_id,
        expires_at: issued.expires_at,
    }))
}

/// Alias endurecido de login: exige ademas un `device_label` explicito y se
/// registra bajo el mismo ambito de limitacion que el login estandar. Lo
/// consumen los clientes que necesitan anclar la sesion a un dispositivo
/// nombrado (apps moviles con biometria local).
#[derive(Debug, Deserialize)]
pub struct SecureSessionRequest {
    pub email: String,
    pub password: String,
}

pub async fn secure_session(
    State(state): State<AppState>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(payload): Json<SecureSessionRequest>,
) -> Result<Response, ApiError> {
    let cookie_secure = state.cookie_secure;
    let session = login(
        State(state),
        ConnectInfo(remote),
        headers,
        Json(LoginRequest { email: payload.email, password: payload.password }),
    )
    .await?;

    let body = session.0;
    let max_age_seconds = (body.expires_at - chrono::Utc::now()).num_seconds().max(0);
    let cookie = build_session_cookie(&body.access_token, cookie_secure, max_age_seconds);

    let mut response = Json(body).into_response();
    response.headers_mut().insert(header::SET_COOKIE, cookie);
    Ok(response)
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

pub async fn refresh(
    State(state): State<AppState>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let issued = state
        .tokens
        .rotate(&payload.refresh_token, &client_ip(&headers, remote), &user_agent(&headers), LunaContext::default(), default_scope())
        .await?;
    let claims = state.tokens.verify_access_token(&issued.access_token)?;

    Ok(Json(SessionResponse {
        user_id: claims.sub,
        access_token: issued.access_token,
        refresh_token: issued.refresh_token,
        session_id: issued.session_id,
        expires_at: issued.expires_at,
    }))
}

pub async fn logout_secure(
    State(state): State<AppState>,
    Extension(AuthenticatedIdentity(claims)): Extension<AuthenticatedIdentity>,
) -> Result<Response, ApiError> {
    let session_id: Uuid = claims.session_id.parse().map_err(|_| ApiError::internal("session_id del token no es un UUID valido"))?;
    state.tokens.revoke_session(session_id, &claims.sub).await?;

    let mut response = StatusCode::NO_CONTENT.into_response();
    response.headers_mut().insert(header::SET_COOKIE, clear_session_cookie(state.cookie_secure));
    Ok(response)
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user_id: String,
    pub luna_context: LunaContext,
    pub microservice_scope: Vec<String>,
}

pub async fn me(Extension(AuthenticatedIdentity(claims)): Extension<AuthenticatedIdentity>) -> Json<MeResponse> {
    Json(MeResponse { user_id: claims.sub, luna_context: claims.luna_context, microservice_scope: claims.microservice_scope })
}

#[derive(Debug, Serialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub device_label: String,
    pub ip: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub last_seen: chrono::DateTime<chrono::Utc>,
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

impl From<luna_domain_tokens::SessionRecord> for SessionSummary {
    fn from(record: luna_domain_tokens::SessionRecord) -> Self {
        Self {
            id: record.id,
            device_label: record.device_label,
            ip: record.ip,
            created_at: record.created_at,
            last_seen: record.last_seen,
            expires_at: record.expires_at,
        }
    }
}

pub async fn list_sessions(
    State(state): State<AppState>,
    Extension(AuthenticatedIdentity(claims)): Extension<AuthenticatedIdentity>,
) -> Result<Json<Vec<SessionSummary>>, ApiError> {
    let sessions = state.tokens.get_user_sessions(&claims.sub).await?;
    Ok(Json(sessions.into_iter().map(SessionSummary::from).collect()))
}

#[derive(Debug, Deserialize)]
pub struct RevokeSessionPath {
    pub session_id: Uuid,
}

pub async fn revoke_session(
    State(state): State<AppState>,
    Extension(AuthenticatedIdentity(claims)): Extension<AuthenticatedIdentity>,
    Path(path): Path<RevokeSessionPath>,
) -> Result<StatusCode, ApiError> {
    state.tokens.revoke_session(path.session_id, &claims.sub).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
pub struct RevokeAllResponse {
    pub sessions_revoked: u32,
}

pub async fn logout_all(
    State(state): State<AppState>,
    Extension(AuthenticatedIdentity(claims)): Extension<AuthenticatedIdentity>,
) -> Result<Json<RevokeAllResponse>, ApiError> {
    let current_session_id: Option<Uuid> = claims.session_id.parse().ok();
    let sessions_revoked = state.tokens.revoke_all_sessions(&claims.sub, current_session_id).await?;
    Ok(Json(RevokeAllResponse { sessions_revoked }))
}

#[derive(Debug, Deserialize)]
pub struct DelegateSpecialistRequest {
    pub specialist: String,
    pub requested_permissions: Vec<String>,
    pub target_module: String,
    pub reason: String,
    pub requested_duration_minutes: i64,
}

#[derive(Debug, Serialize)]
pub struct DelegateSpecialistResponse {
    pub specialist_token: String,
}

pub async fn delegate_specialist(
    State(state): State<AppState>,
    Extension(AuthenticatedIdentity(claims)): Extension<AuthenticatedIdentity>,
    Json(payload): Json<DelegateSpecialistRequest>,
) -> Result<Json<DelegateSpecialistResponse>, ApiError> {
    let specialist = SpecialistName::from_str(&payload.specialist)
        .ok_or_else(|| ApiError::bad_request("UNKNOWN_SPECIALIST", format!("Especialista desconocido: {}", payload.specialist)))?;

    let delegation_context = DelegationContext { target_module: payload.target_module, reason: payload.reason };
    let specialist_token = state.tokens.delegate_specialist(
        &claims,
        specialist,
        payload.requested_permissions,
        delegation_context,
        payload.requested_duration_minutes,
    )?;

    state
        .events
        .append_event(
            &claims.sub,
            luna_domain_models::event_types::SPECIALIST_TOKEN_DELEGATED,
            "luna-hub",
            serde_json::json!({ "specialist": specialist.as_str() }),
            serde_json::json!({}),
        )
        .await?;

    Ok(Json(DelegateSpecialistResponse { specialist_token }))
}

#[derive(Debug, Deserialize)]
pub struct ValidateSpecialistRequest {
    pub token: String,
    pub required_permission: String,
}

#[derive(Debug, Serialize)]
pub struct ValidateSpecialistResponse {
    pub valid: bool,
    pub user_id: String,
    pub specialist: Option<String>,
}

pub async fn validate_specialist(
    State(state): State<AppState>,
    Json(payload): Json<ValidateSpecialistRequest>,
) -> Result<Json<ValidateSpecialistResponse>, ApiError> {
    let claims = state.tokens.validate_specialist_token(&payload.token, &payload.required_permission)?;
    Ok(Json(ValidateSpecialistResponse { valid: true, user_id: claims.sub, specialist: claims.specialist_name }))
}

fn default_scope() -> Vec<String> {
    vec!["luna-aube".to_string(), "luna-cv".to_string(), "luna-letters".to_string(), "luna-rise".to_string()]
}
