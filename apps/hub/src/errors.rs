// [apps/hub/src/errors.rs]
/*!
 * APARATO: SOBRE DE ERROR HTTP SOBERANO (ESTRATO L4)
 * RESPONSABILIDAD: TRADUCCION DE ERRORES DE DOMINIO A RESPUESTAS JSON
 *
 * Todo error que cruza la frontera HTTP adopta el mismo sobre:
 * `{ error: { code, message, type }, details, timestamp }`. Los
 * handlers nunca construyen JSON de error a mano, solo devuelven
 * `ApiError` y dejan que `IntoResponse` haga el resto.
 */

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use luna_domain_energy::EnergyError;
use luna_domain_narrative::NarrativeError;
use luna_domain_ratelimit::RateLimitError;
use luna_domain_tokens::TokenError;
use luna_infra_storage::StorageError;
use serde_json::{json, Value};

/// Error unificado que cualquier handler del Hub puede devolver.
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    error_type: &'static str,
    message: String,
    details: Option<Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, error_type: &'static str, message: impl Into<String>) -> Self {
        Self { status, code, error_type, message: message.into(), details: None }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, "validation_error", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "auth_error", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, "FORBIDDEN", "auth_error", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", "not_found", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, "CONFLICT", "conflict", message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED", "rate_limit_error", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", "internal_error", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let envelope = json!({
            "error": {
                "code": self.code,
                "message": self.message,
                "type": self.error_type,
            },
            "details": self.details.unwrap_or(Value::Null),
            "timestamp": Utc::now().to_rfc3339(),
        });
        (self.status, Json(envelope)).into_response()
    }
}

impl From<EnergyError> for ApiError {
    fn from(error: EnergyError) -> Self {
        match error {
            EnergyError::UnknownAction(name) => ApiError::bad_request("UNKNOWN_ACTION", format!("Accion desconocida: {name}")),
            EnergyError::UnknownPack(code) => ApiError::bad_request("UNKNOWN_PACK", format!("Paquete desconocido: {code}")),
            EnergyError::InsufficientEnergy { required, current, deficit, suggested_pack } => {
                ApiError::new(StatusCode::PAYMENT_REQUIRED, "INSUFFICIENT_ENERGY", "business_error", "Energia insuficiente para esta accion")
                    .with_details(json!({ "required": required, "current": current, "deficit": deficit, "suggested_pack": suggested_pack }))
            }
            EnergyError::PurchaseForbidden => ApiError::forbidden("La suscripcion ilimitada no admite compras adicionales"),
            EnergyError::ConcurrencyExhausted { attempts } => {
                ApiError::conflict(format!("No se pudo serializar la operacion tras {attempts} intentos"))
            }
            EnergyError::StoreUnavailable(detail) => ApiError::internal(format!("El ledger de energia no esta disponible: {detail}")),
        }
    }
}

impl From<RateLimitError> for ApiError {
    fn from(error: RateLimitError) -> Self {
        match error {
            RateLimitError::CacheUnavailable(detail) => ApiError::internal(format!("Cache de limitacion no disponible: {detail}")),
            RateLimitError::BlockPersistence(detail) => ApiError::internal(format!("Persistencia de bloqueos fallo: {detail}")),
            RateLimitError::AuditFailure(detail) => ApiError::internal(format!("Auditoria de limitacion fallo: {detail}")),
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(error: TokenError) -> Self {
        match error {
            TokenError::InvalidToken => ApiError::unauthorized("Token invalido o expirado"),
            TokenError::RevokedToken => ApiError::unauthorized("El token ha sido revocado"),
            TokenError::ReuseDetected => ApiError::unauthorized("Reutilizacion de token de refresco detectada, sesiones revocadas"),
            TokenError::SpecialistNotAllowed(name) => ApiError::forbidden(format!("Especialista no permitido: {name}")),
            TokenError::PermissionsNotSubset => ApiError::forbidden("Los permisos solicitados exceden el alcance del token padre"),
            TokenError::DurationExceeded => ApiError::bad_request("DURATION_EXCEEDED", "La duracion solicitada excede el maximo del especialista"),
            TokenError::SubDelegationForbidden => ApiError::forbidden("Un token de especialista no puede delegar a su vez"),
            TokenError::SigningFailure(detail) => ApiError::internal(format!("Fallo al firmar el token: {detail}")),
            TokenError::PasswordHashFailure(detail) => ApiError::internal(format!("Fallo al procesar la contrasena: {detail}")),
            TokenError::StoreUnavailable(detail) => ApiError::internal(format!("El almacen de sesiones no esta disponible: {detail}")),
            TokenError::SessionNotFound => ApiError::not_found("Sesion no encontrada"),
        }
    }
}

impl From<NarrativeError> for ApiError {
    fn from(error: NarrativeError) -> Self {
        match error {
            NarrativeError::EventSourceUnavailable(detail) => ApiError::internal(format!("La fuente de eventos no esta disponible: {detail}")),
            NarrativeError::CacheUnavailable(detail) => ApiError::internal(format!("La cache narrativa no esta disponible: {detail}")),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::NotFound => ApiError::not_found("Recurso no encontrado"),
            StorageError::InvalidInput(detail) => ApiError::bad_request("INVALID_INPUT", detail),
            other => ApiError::internal(format!("Fallo de persistencia: {other}")),
        }
    }
}
