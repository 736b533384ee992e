// [libs/domain/narrative/src/sessionize.rs]
/*!
 * APARATO: SESSIONIZACION DE EVENTOS (ESTRATO L2)
 * RESPONSABILIDAD: AGRUPAR EVENTOS POR PROXIMIDAD TEMPORAL
 */

use chrono::{DateTime, Utc};
use luna_domain_models::Event;

/// Agrupa eventos ya ordenados por cercania temporal: dos eventos
/// consecutivos separados por 30 minutos o menos pertenecen a la misma
/// sesion. El limite de 30 minutos es el mismo usado por el sistema de
/// origen y no es configurable.
const SESSION_GAP_SECONDS: i64 = 1800;

pub fn sessionize_events<'a>(events: &'a [Event]) -> Vec<Vec<&'a Event>> {
    if events.is_empty() {
        return vec![];
    }
    let mut sorted: Vec<&Event> = events.iter().collect();
    sorted.sort_by_key(|e| e.created_at);

    let mut sessions: Vec<Vec<&Event>> = Vec::new();
    let mut current: Vec<&Event> = vec![sorted[0]];

    for window in sorted.windows(2) {
        let prev = window[0];
        let curr = window[1];
        if (curr.created_at - prev.created_at).num_seconds() <= SESSION_GAP_SECONDS {
            current.push(curr);
        } else {
            sessions.push(std::mem::take(&mut current));
            current.push(curr);
        }
    }
    sessions.push(current);
    sessions
}

/// Duracion media de sesion en minutos. Una sesion de un solo evento se
/// estima en 5 minutos; toda sesion observada tiene un piso de 5 minutos.
pub fn average_session_minutes(sessions: &[Vec<&Event>]) -> f64 {
    if sessions.is_empty() {
        return 0.0;
    }
    let durations: Vec<f64> = sessions
        .iter()
        .map(|session| {
            if session.len() < 2 {
                5.0
            } else {
                let first: DateTime<Utc> = session.first().unwrap().created_at;
                let last: DateTime<Utc> = session.last().unwrap().created_at;
                let minutes = (last - first).num_seconds() as f64 / 60.0;
                minutes.max(5.0)
            }
        })
        .collect();
    let mean = durations.iter().sum::<f64>() / durations.len() as f64;
    (mean * 10.0).round() / 10.0
}
