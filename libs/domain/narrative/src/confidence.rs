// [libs/domain/narrative/src/confidence.rs]
/*!
 * APARATO: SCORE DE CONFIANZA (ESTRATO L2)
 * RESPONSABILIDAD: CUANTIFICAR CUANTO CONFIAR EN UN CONTEXT PACKET
 *
 * Promedio simple de cuatro factores independientes, cada uno acotado a
 * [0, 1]. Ninguno domina: un usuario con pocos eventos pero actividad
 * reciente y diversidad de apps aun puede alcanzar confianza moderada.
 */

pub fn calculate_confidence(event_count: usize, last_activity_hours: f64, apps_used: usize, ats_mean_present: bool) -> f64 {
    let event_confidence = (event_count as f64 / 20.0).min(1.0);
    let activity_confidence = (1.0 - (last_activity_hours / 168.0)).max(0.2);
    let diversity_confidence = (apps_used as f64 / 3.0).min(1.0);
    let ats_confidence = if ats_mean_present { 0.8 } else { 0.3 };

    let total = (event_confidence + activity_confidence + diversity_confidence + ats_confidence) / 4.0;
    (total * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saturates_at_one_past_twenty_events() {
        assert_eq!(calculate_confidence(20, 0.0, 3, true), calculate_confidence(100, 0.0, 3, true));
    }

    #[test]
    fn floors_activity_confidence_at_point_two() {
        let confidence = calculate_confidence(0, 10_000.0, 0, false);
        assert!(confidence >= 0.2 * 1.0 / 4.0 + 0.3 / 4.0);
    }
}
