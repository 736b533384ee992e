// [libs/domain/tokens/src/types.rs]
/*!
 * APARATO: TOKEN CLAIM TYPES (ESTRATO L2)
 * RESPONSABILIDAD: FORMA DEL PAYLOAD JWT Y CATALOGO DE ESPECIALISTAS
 */

use serde::{Deserialize, Serialize};

/// Contexto narrativo distribuido embebido en el token de acceso, consumido
/// por las apps satelite sin una consulta adicional al Hub.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LunaContext {
    pub current_module: String,
    pub specialist_permissions: Vec<String>,
    pub narrative_chapter: u32,
    pub user_journey_step: String,
    pub preferred_tone: String,
    pub conversation_count: u32,
}

/// Contexto de la delegacion: por que y hacia que modulo se emitio el
/// token hijo, util para auditoria posterior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelegationContext {
    pub target_module: String,
    pub reason: String,
}

/// Payload JWT unificado. Los campos de delegacion son `None` en un token
/// de acceso raiz y `Some` en un token hijo emitido a un especialista.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
    pub session_id: String,
    pub luna_context: LunaContext,
    pub microservice_scope: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialist_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialist_permissions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delegation_context: Option<DelegationContext>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_jti: Option<String>,
}

impl Claims {
    pub fn is_specialist_token(&self) -> bool {
        self.specialist_name.is_some()
    }
}

/// Especialistas habilitados para recibir delegacion, con la duracion
/// maxima de sesion que el Hub autoriza para cada uno.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpecialistName {
    LunaAube,
    LunaCv,
    LunaLetters,
    LunaRise,
}

impl SpecialistName {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpecialistName::LunaAube => "luna-aube",
            SpecialistName::LunaCv => "luna-cv",
            SpecialistName::LunaLetters => "luna-letters",
            SpecialistName::LunaRise => "luna-rise",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "luna-aube" => Some(SpecialistName::LunaAube),
            "luna-cv" => Some(SpecialistName::LunaCv),
            "luna-letters" => Some(SpecialistName::LunaLetters),
            "luna-rise" => Some(SpecialistName::LunaRise),
            _ => None,
        }
    }

    /// Duracion maxima, en minutos, de un token hijo delegado a este
    /// especialista. Un hijo nunca puede exceder ademas el `exp` del padre.
    pub fn max_session_duration_minutes(&self) -> i64 {
        match self {
            SpecialistName::LunaAube => 10,
            SpecialistName::LunaCv => 15,
            SpecialistName::LunaLetters => 15,
            SpecialistName::LunaRise => 10,
        }
    }
}
