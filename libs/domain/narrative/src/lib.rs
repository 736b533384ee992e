// [libs/domain/narrative/src/lib.rs]
/*!
 * =================================================================
 * APARATO: NARRATIVE DOMAIN (ESTRATO L2)
 * CLASIFICACIÓN: DOMAIN LOGIC
 * RESPONSABILIDAD: RECONSTRUCCION DEL CONTEXTO NARRATIVO DEL USUARIO
 * =================================================================
 */

pub mod analyzer;
pub mod confidence;
pub mod errors;
pub mod ports;
pub mod sessionize;
pub mod types;

pub use analyzer::NarrativeAnalyzer;
pub use confidence::calculate_confidence;
pub use errors::NarrativeError;
pub use ports::{ContextCache, EnergyPlanProbe, EventSource};
pub use sessionize::{average_session_minutes, sessionize_events};
pub use types::{ContextPacket, ProgressMetrics, TimeWindow, UsagePattern, UserMeta};

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{Duration as ChronoDuration, Utc};
    use luna_domain_models::Event;
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};
    use uuid::Uuid;

    #[derive(Default)]
    struct FixedEvents {
        rows: Mutex<Vec<Event>>,
    }

    #[async_trait]
    impl EventSource for FixedEvents {
        async fn fetch_user_events(&self, user_id: &str, _limit: u32) -> Result<Vec<Event>, NarrativeError> {
            Ok(self.rows.lock().unwrap().iter().filter(|e| e.user_id == user_id).cloned().collect())
        }
    }

    struct NeverUnlimited;

    #[async_trait]
    impl EnergyPlanProbe for NeverUnlimited {
        async fn is_unlimited_user(&self, _user_id: &str) -> Result<bool, NarrativeError> {
            Ok(false)
        }
    }

    struct NoCache;

    #[async_trait]
    impl ContextCache for NoCache {
        async fn get(&self, _user_id: &str) -> Option<ContextPacket> {
            None
        }
        async fn put(&self, _user_id: &str, _packet: &ContextPacket) {}
        async fn invalidate(&self, _user_id: &str) {}
    }

    fn make_event(user_id: &str, event_type: &str, app_source: &str, data: Value, hours_ago: i64) -> Event {
        Event {
            event_id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            event_type: event_type.to_string(),
            app_source: app_source.to_string(),
            event_data: data,
            metadata: json!({}),
            created_at: Utc::now() - ChronoDuration::hours(hours_ago),
        }
    }

    #[tokio::test]
    async fn absent_history_yields_the_empty_low_confidence_packet() {
        let analyzer = NarrativeAnalyzer::new(Arc::new(FixedEvents::default()), Arc::new(NeverUnlimited), Some(Arc::new(NoCache)));
        let packet = analyzer.generate_context_packet("ghost").await.unwrap();
        assert_eq!(packet.confidence, 0.1);
        assert_eq!(packet.user.plan, "free");
    }

    #[tokio::test]
    async fn detects_cv_app_usage_and_ats_progress() {
        let events = FixedEvents::default();
        {
            let mut rows = events.rows.lock().unwrap();
            rows.push(make_event("u1", "cv_generated", "cv", json!({"ats_score": 60.0}), 48));
            rows.push(make_event("u1", "cv_generated", "cv", json!({"ats_score": 70.0}), 24));
            rows.push(make_event("u1", "cv_generated", "cv", json!({"ats_score": 80.0}), 1));
        }
        let analyzer = NarrativeAnalyzer::new(Arc::new(events), Arc::new(NeverUnlimited), Some(Arc::new(NoCache)));
        let packet = analyzer.generate_context_packet("u1").await.unwrap();

        assert!(packet.usage.apps_last_7d.contains(&"cv".to_string()));
        assert_eq!(packet.progress.ats_mean, Some(70.0));
        assert!(packet.progress.ats_delta_pct_14d.is_some());
    }

    #[tokio::test]
    async fn unlimited_plan_probe_short_circuits_event_scanning() {
        let events = FixedEvents::default();
        events.rows.lock().unwrap().push(make_event("u2", "letter_generated", "letters", json!({}), 1));

        struct AlwaysUnlimited;
        #[async_trait]
        impl EnergyPlanProbe for AlwaysUnlimited {
            async fn is_unlimited_user(&self, _user_id: &str) -> Result<bool, NarrativeError> {
                Ok(true)
            }
        }

        let analyzer = NarrativeAnalyzer::new(Arc::new(events), Arc::new(AlwaysUnlimited), Some(Arc::new(NoCache)));
        let packet = analyzer.generate_context_packet("u2").await.unwrap();
        assert_eq!(packet.user.plan, "unlimited");
    }
}
