// [libs/domain/tokens/src/errors.rs]
/*!
 * APARATO: TOKEN SERVICE FAULTS (ESTRATO L2)
 */

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TokenError {
    /// Catch-all deliberado: un token expirado, mal formado o firmado con
    /// otro algoritmo colapsan todos en este mismo variante hacia el
    /// llamador externo, para no filtrar el motivo exacto del rechazo.
    #[error("[L2_TOKEN_FAULT] token invalido")]
    InvalidToken,

    #[error("[L2_TOKEN_FAULT] refresh token ya revocado o inexistente")]
    RevokedToken,

    #[error("[L2_TOKEN_FAULT] reuso de refresh token detectado; cadena de sesion revocada")]
    ReuseDetected,

    #[error("[L2_TOKEN_FAULT] especialista '{0}' no esta en la lista de permitidos")]
    SpecialistNotAllowed(String),

    #[error("[L2_TOKEN_FAULT] permisos solicitados exceden el scope del token padre")]
    PermissionsNotSubset,

    #[error("[L2_TOKEN_FAULT] duracion solicitada excede la politica del especialista")]
    DurationExceeded,

    #[error("[L2_TOKEN_FAULT] un token hijo no puede sub-delegar")]
    SubDelegationForbidden,

    #[error("[L2_TOKEN_FAULT] fallo de firmado/codificacion: {0}")]
    SigningFailure(String),

    #[error("[L2_TOKEN_FAULT] fallo de hashing de contraseña: {0}")]
    PasswordHashFailure(String),

    #[error("[L2_TOKEN_FAULT] almacen de sesiones no disponible: {0}")]
    StoreUnavailable(String),

    #[error("[L2_TOKEN_FAULT] sesion no encontrada")]
    SessionNotFound,
}
