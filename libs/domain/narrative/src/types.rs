// [libs/domain/narrative/src/types.rs]
/*!
 * APARATO: CONTEXT PACKET TYPES (ESTRATO L2)
 * RESPONSABILIDAD: FORMA DEL CONTEXTO NARRATIVO RECONSTRUIDO
 *
 * El Context Packet es la unica salida del analizador: una fotografia
 * estructurada, de confianza declarada, lista para inyectarse en el
 * prompt de Luna. No incluye enriquecimiento NLP semantico del texto
 * libre de los eventos: esa capa permanece fuera de alcance de este
 * puerto, que razona exclusivamente sobre la forma y el tiempo de los
 * eventos, no sobre su contenido en lenguaje natural.
 */

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy)]
pub struct TimeWindow {
    pub short_days: i64,
    pub mid_days: i64,
    pub long_days: i64,
}

impl Default for TimeWindow {
    fn default() -> Self {
        TimeWindow { short_days: 7, mid_days: 14, long_days: 90 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserMeta {
    pub age_days: i64,
    pub plan: String,
    pub first_seen: String,
    pub last_activity_hours: f64,
}

impl UserMeta {
    pub fn unseen() -> Self {
        UserMeta { age_days: 0, plan: "free".to_string(), first_seen: String::new(), last_activity_hours: 999.0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsagePattern {
    pub apps_last_7d: Vec<String>,
    pub last_activity_hours: f64,
    pub events_sample: Vec<String>,
    pub session_count_7d: u32,
    pub avg_session_minutes: f64,
}

impl UsagePattern {
    pub fn empty() -> Self {
        UsagePattern { apps_last_7d: vec![], last_activity_hours: 999.0, events_sample: vec![], session_count_7d: 0, avg_session_minutes: 0.0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProgressMetrics {
    pub ats_mean: Option<f64>,
    pub ats_delta_pct_14d: Option<f64>,
    pub cv_count_total: u32,
    pub letters_count_total: u32,
    pub letters_target: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextPacket {
    pub user: UserMeta,
    pub usage: UsagePattern,
    pub progress: ProgressMetrics,
    pub last_emotion_or_doubt: Option<String>,
    pub confidence: f64,
    pub generated_at: chrono::DateTime<chrono::Utc>,
}

impl ContextPacket {
    pub fn empty_for_new_user() -> Self {
        ContextPacket {
            user: UserMeta::unseen(),
            usage: UsagePattern::empty(),
            progress: ProgressMetrics::default(),
            last_emotion_or_doubt: None,
            confidence: 0.1,
            generated_at: chrono::Utc::now(),
        }
    }
}
