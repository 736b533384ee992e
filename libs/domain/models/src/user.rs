// [libs/domain/models/src/user.rs]
/*!
 * APARATO: USER ENTITY (ESTRATO L2 - DOMINIO COMPARTIDO)
 * RESPONSABILIDAD: IDENTIDAD NOMINAL Y VALIDACION DE FORMATO DE IDENTIFICADOR
 */

use serde::{Deserialize, Serialize};

use crate::plan::Plan;

/// Longitud maxima de un identificador de usuario aceptado por el Hub.
pub const MAX_USER_ID_LEN: usize = 50;

/// Usuario soberano del Hub: el plan es la fuente autoritativa de gating
/// de metering, nunca inferida a partir de los eventos narrativos.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub user_id: String,
    pub email: String,
    pub password_hash: String,
    pub plan: Plan,
    pub active: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Valida que `candidate` respete la forma de identificador aceptada: no
/// vacio, maximo 50 caracteres, y compuesto solo de alfanumericos, `-` y
/// `_` (forma UUID-like, sin exigir que sea un UUID valido bit a bit).
pub fn validate_user_id(candidate: &str) -> Result<(), String> {
    if candidate.is_empty() {
        return Err("user_id no puede estar vacio".to_string());
    }
    if candidate.len() > MAX_USER_ID_LEN {
        return Err(format!("user_id excede el limite de {MAX_USER_ID_LEN} caracteres"));
    }
    if !candidate.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        return Err("user_id solo admite alfanumericos, '-' y '_'".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_uuid_like_identifiers() {
        assert!(validate_user_id("b6f1b7b2-9c3a-4e2a-8f1a-1a2b3c4d5e6f").is_ok());
    }

    #[test]
    fn rejects_empty_and_oversized_and_symbols() {
        assert!(validate_user_id("").is_err());
        assert!(validate_user_id(&"a".repeat(51)).is_err());
        assert!(validate_user_id("user;drop table").is_err());
    }
}
