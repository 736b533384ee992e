// [libs/domain/ratelimit/src/types.rs]
/*!
 * APARATO: RATE LIMIT VALUE TYPES (ESTRATO L2)
 * RESPONSABILIDAD: TAXONOMIA DE AMBITOS, ESTRATEGIAS Y REGLAS ESTATICAS
 */

use serde::{Deserialize, Serialize};

/// Ambito protegido. Cada ambito mapea a exactamente una `RateLimitRule`
/// en la tabla estatica `RULES`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateLimitScope {
    AuthLogin,
    AuthRegister,
    PasswordReset,
    ApiGeneral,
    ApiEnergy,
    ApiCvGeneration,
    ApiLetterGeneration,
    ApiLunaChat,
    AdminOperations,
    GlobalDdos,
    IpGeneral,
    UserGeneral,
}

impl RateLimitScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            RateLimitScope::AuthLogin => "auth_login",
            RateLimitScope::AuthRegister => "auth_register",
            RateLimitScope::PasswordReset => "password_reset",
            RateLimitScope::ApiGeneral => "api_general",
            RateLimitScope::ApiEnergy => "api_energy",
            RateLimitScope::ApiCvGeneration => "api_cv_generation",
            RateLimitScope::ApiLetterGeneration => "api_letter_generation",
            RateLimitScope::ApiLunaChat => "api_luna_chat",
            RateLimitScope::AdminOperations => "admin_operations",
            RateLimitScope::GlobalDdos => "global_ddos",
            RateLimitScope::IpGeneral => "ip_general",
            RateLimitScope::UserGeneral => "user_general",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateLimitStrategy {
    FixedWindow,
    SlidingWindow,
    TokenBucket,
}

impl RateLimitStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RateLimitStrategy::FixedWindow => "fixed_window",
            RateLimitStrategy::SlidingWindow => "sliding_window",
            RateLimitStrategy::TokenBucket => "token_bucket",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateLimitResult {
    Allowed,
    Limited,
    Blocked,
}

/// Regla nominal de un ambito: estrategia, cupo por ventana, y duracion
/// del bloqueo impuesto tras agotar el cupo.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitRule {
    pub scope: RateLimitScope,
    pub strategy: RateLimitStrategy,
    pub requests_per_window: u32,
    pub window_seconds: u32,
    pub burst_size: Option<u32>,
    pub block_duration_seconds: u32,
    pub enabled: bool,
    pub priority: u8,
}

/// Tabla estatica de reglas, calcada de los valores nominales de produccion.
/// Un ambito ausente o `enabled = false` se resuelve siempre como `Allowed`.
pub const RULES: &[RateLimitRule] = &[
    RateLimitRule {
        scope: RateLimitScope::AuthLogin,
        strategy: RateLimitStrategy::SlidingWindow,
        requests_per_window: 5,
        window_seconds: 900,
        burst_size: None,
        block_duration_seconds: 1800,
        enabled: true,
        priority: 1,
    },
    RateLimitRule {
        scope: RateLimitScope::AuthRegister,
        strategy: RateLimitStrategy::FixedWindow,
        requests_per_window: 3,
        window_seconds: 3600,
        burst_size: None,
        block_duration_seconds: 7200,
        enabled: true,
        priority: 1,
    },
    RateLimitRule {
        scope: RateLimitScope::PasswordReset,
        strategy: RateLimitStrategy::SlidingWindow,
        requests_per_window: 3,
        window_seconds: 3600,
        burst_size: None,
        block_duration_seconds: 3600,
        enabled: true,
        priority: 1,
    },
    RateLimitRule {
        scope: RateLimitScope::ApiGeneral,
        strategy: RateLimitStrategy::TokenBucket,
        requests_per_window: 100,
        window_seconds: 60,
        burst_size: Some(20),
        block_duration_seconds: 300,
        enabled: true,
        priority: 2,
    },
    RateLimitRule {
        scope: RateLimitScope::ApiEnergy,
        strategy: RateLimitStrategy::SlidingWindow,
        requests_per_window: 50,
        window_seconds: 60,
        burst_size: None,
        block_duration_seconds: 300,
        enabled: true,
        priority: 2,
    },
    RateLimitRule {
        scope: RateLimitScope::ApiCvGeneration,
        strategy: RateLimitStrategy::FixedWindow,
        requests_per_window: 10,
        window_seconds: 3600,
        burst_size: None,
        block_duration_seconds: 1800,
        enabled: true,
        priority: 1,
    },
    RateLimitRule {
        scope: RateLimitScope::ApiLunaChat,
        strategy: RateLimitStrategy::TokenBucket,
        requests_per_window: 30,
        window_seconds: 60,
        burst_size: Some(5),
        block_duration_seconds: 300,
        enabled: true,
        priority: 2,
    },
    RateLimitRule {
        scope: RateLimitScope::GlobalDdos,
        strategy: RateLimitStrategy::SlidingWindow,
        requests_per_window: 1000,
        window_seconds: 60,
        burst_size: None,
        block_duration_seconds: 600,
        enabled: true,
        priority: 0,
    },
    // IP_GENERAL no figuraba en la tabla nominal original pero sobrevive en
    // el sistema de origen; se conserva como salvaguarda generica por IP.
    RateLimitRule {
        scope: RateLimitScope::IpGeneral,
        strategy: RateLimitStrategy::TokenBucket,
        requests_per_window: 500,
        window_seconds: 60,
        burst_size: Some(50),
        block_duration_seconds: 300,
        enabled: true,
        priority: 2,
    },
];

pub fn lookup_rule(scope: RateLimitScope) -> Option<&'static RateLimitRule> {
    RULES.iter().find(|rule| rule.scope == scope && rule.enabled)
}
