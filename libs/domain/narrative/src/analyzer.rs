// [libs/domain/narrative/src/analyzer.rs]
/*!
 * APARATO: NARRATIVE ANALYZER (ESTRATO L2 - NUCLEO DE RECONSTRUCCION)
 * RESPONSABILIDAD: TRANSFORMAR EL REGISTRO DE EVENTOS EN UN CONTEXT PACKET
 *
 * Responsabilidades:
 * 1. Leer el registro de eventos (fuente unica de verdad).
 * 2. Analizar en tres ventanas temporales (7d / 14d / 90d).
 * 3. Generar un Context Packet estructurado.
 * 4. Servir el resultado desde cache de 5 minutos cuando sea posible.
 */

use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use luna_domain_models::Event;

use crate::errors::NarrativeError;
use crate::ports::{ContextCache, EnergyPlanProbe, EventSource};
use crate::sessionize::{average_session_minutes, sessionize_events};
use crate::types::{ContextPacket, ProgressMetrics, TimeWindow, UsagePattern, UserMeta};

pub struct NarrativeAnalyzer<S: EventSource, P: EnergyPlanProbe, C: ContextCache> {
    events: Arc<S>,
    plan_probe: Arc<P>,
    cache: Option<Arc<C>>,
    windows: TimeWindow,
}

impl<S: EventSource, P: EnergyPlanProbe, C: ContextCache> NarrativeAnalyzer<S, P, C> {
    pub fn new(events: Arc<S>, plan_probe: Arc<P>, cache: Option<Arc<C>>) -> Self {
        Self { events, plan_probe, cache, windows: TimeWindow::default() }
    }

    pub async fn generate_context_packet(&self, user_id: &str) -> Result<ContextPacket, NarrativeError> {
        if let Some(cache) = &self.cache {
            if let Some(cached) = cache.get(user_id).await {
                return Ok(cached);
            }
        }

        let limit = (self.windows.long_days * 5).min(500).max(0) as u32;
        let all_events = self.events.fetch_user_events(user_id, limit).await?;

        let cutoff = Utc::now() - ChronoDuration::days(self.windows.long_days);
        let relevant: Vec<Event> = all_events.into_iter().filter(|e| e.created_at >= cutoff).collect();

        let packet = if relevant.is_empty() {
            ContextPacket::empty_for_new_user()
        } else {
            self.build_packet(user_id, &relevant).await
        };

        if let Some(cache) = &self.cache {
            cache.put(user_id, &packet).await;
        }

        Ok(packet)
    }

    pub async fn invalidate(&self, user_id: &str) {
        if let Some(cache) = &self.cache {
            cache.invalidate(user_id).await;
        }
    }

    async fn build_packet(&self, user_id: &str, events: &[Event]) -> ContextPacket {
        let user = self.analyze_user_meta(user_id, events).await;
        let usage = self.analyze_usage_pattern(events);
        let progress = Self::analyze_progress_metrics(events);
        let last_emotion_or_doubt = Self::extract_last_emotion_or_doubt(events);
        let confidence = crate::confidence::calculate_confidence(
            events.len(),
            usage.last_activity_hours,
            usage.apps_last_7d.len(),
            progress.ats_mean.is_some(),
        );

        ContextPacket { user, usage, progress, last_emotion_or_doubt, confidence, generated_at: Utc::now() }
    }

    async fn analyze_user_meta(&self, user_id: &str, events: &[Event]) -> UserMeta {
        let first = events.iter().min_by_key(|e| e.created_at).unwrap();
        let last = events.iter().max_by_key(|e| e.created_at).unwrap();
        let now = Utc::now();
        let age_days = (now - first.created_at).num_days();
        let last_activity_hours = (now - last.created_at).num_seconds() as f64 / 3600.0;

        let plan = self.detect_plan_robust(user_id, events).await;

        UserMeta {
            age_days,
            plan,
            first_seen: first.created_at.to_rfc3339(),
            last_activity_hours: (last_activity_hours * 10.0).round() / 10.0,
        }
    }

    /// Deteccion de plan en tres capas decrecientes de confianza: consulta
    /// directa al Ledger, luego escaneo de eventos de compra/suscripcion,
    /// y por ultimo una heuristica conservadora sobre volumen de actividad.
    async fn detect_plan_robust(&self, user_id: &str, events: &[Event]) -> String {
        if let Ok(true) = self.plan_probe.is_unlimited_user(user_id).await {
            return "unlimited".to_string();
        }

        let mut plan = "free".to_string();
        for event in events {
            let event_type = event.event_type.as_str();
            if matches!(event_type, "energy_purchase" | "subscription_activated" | "EnergyActionPerformed") {
                let pack_type = event
                    .event_data
                    .get("pack_type")
                    .or_else(|| event.event_data.get("subscription_type"))
                    .and_then(|v| v.as_str());
                match pack_type {
                    Some("luna_unlimited") => {
                        plan = "unlimited".to_string();
                        break;
                    }
                    Some("petit_dej_luna") | Some("repas_luna") => plan = "premium".to_string(),
                    _ => {}
                }
            }
            if event_type == "EnergyActionPerformed" {
                let unlimited_flag = event.event_data.get("unlimited").and_then(|v| v.as_bool()).unwrap_or(false);
                let zero_cost = event.event_data.get("energy_cost").and_then(|v| v.as_f64()).map(|c| c == 0.0).unwrap_or(false);
                if unlimited_flag || zero_cost {
                    plan = "unlimited".to_string();
                    break;
                }
            }
        }

        if plan == "free" && events.len() > 50 {
            let actions_count = events.iter().filter(|e| e.event_type.to_lowercase().contains("action")).count();
            if actions_count > 20 {
                plan = "premium".to_string();
            }
        }

        plan
    }

    fn analyze_usage_pattern(&self, events: &[Event]) -> UsagePattern {
        let now = Utc::now();
        let week_ago = now - ChronoDuration::days(7);
        let mut recent: Vec<&Event> = events.iter().filter(|e| e.created_at >= week_ago).collect();
        recent.sort_by_key(|e| std::cmp::Reverse(e.created_at));

        let mut apps_used = std::collections::BTreeSet::new();
        let mut event_types = Vec::new();

        for event in &recent {
            let event_type = event.event_type.as_str();
            if event_type.starts_with("cv_") || event_type.contains("mirror_match") {
                apps_used.insert("cv".to_string());
            } else if event_type.starts_with("letter_") || event_type.contains("lettre") {
                apps_used.insert("letters".to_string());
            } else if !event.app_source.is_empty() {
                apps_used.insert(event.app_source.clone());
            }
            event_types.push(event_type.to_string());
        }

        let last_activity_hours = recent
            .first()
            .map(|e| (now - e.created_at).num_seconds() as f64 / 3600.0)
            .unwrap_or(999.0);

        let recent_owned: Vec<Event> = recent.iter().map(|e| (*e).clone()).collect();
        let sessions = sessionize_events(&recent_owned);
        let avg_session_minutes = average_session_minutes(&sessions);

        let mut unique_types: Vec<String> = event_types.into_iter().collect::<std::collections::BTreeSet<_>>().into_iter().collect();
        unique_types.truncate(5);

        UsagePattern {
            apps_last_7d: apps_used.into_iter().collect(),
            last_activity_hours: (last_activity_hours * 10.0).round() / 10.0,
            events_sample: unique_types,
            session_count_7d: sessions.len() as u32,
            avg_session_minutes,
        }
    }

    fn analyze_progress_metrics(events: &[Event]) -> ProgressMetrics {
        let cv_events: Vec<&Event> = events.iter().filter(|e| e.event_type.starts_with("cv_")).collect();
        let ats_scores: Vec<f64> = cv_events
            .iter()
            .filter_map(|e| e.event_data.get("ats_score").and_then(|v| v.as_f64()))
            .filter(|score| (0.0..=100.0).contains(score))
            .collect();

        let mut ats_mean = None;
        let mut ats_delta_pct_14d = None;

        if !ats_scores.is_empty() {
            let mean = ats_scores.iter().sum::<f64>() / ats_scores.len() as f64;
            ats_mean = Some((mean * 10.0).round() / 10.0);

            if ats_scores.len() >= 3 {
                let mid = ats_scores.len() / 2;
                let recent = &ats_scores[ats_scores.len() - mid..];
                let old = &ats_scores[..mid];
                if !old.is_empty() {
                    let recent_avg = recent.iter().sum::<f64>() / recent.len() as f64;
                    let old_avg = old.iter().sum::<f64>() / old.len() as f64;
                    if old_avg != 0.0 {
                        ats_delta_pct_14d = Some((((recent_avg - old_avg) / old_avg) * 1000.0).round() / 10.0);
                    }
                }
            }
        }

        let cv_count_total = events.iter().filter(|e| e.event_type.to_lowercase().contains("cv_generated")).count() as u32;
        let letters_count_total = events.iter().filter(|e| e.event_type.to_lowercase().contains("letter")).count() as u32;

        let tech_keywords = ["tech", "developpeur", "ingenieur", "software", "data", "cloud"];
        let mut letters_target = None;
        for event in events.iter().filter(|e| e.event_type.to_lowercase().contains("letter")).rev() {
            let company = event.event_data.get("company_name").and_then(|v| v.as_str()).unwrap_or("");
            let position = event.event_data.get("position_title").and_then(|v| v.as_str()).unwrap_or("");
            let haystack = format!("{company} {position}").to_lowercase();
            if tech_keywords.iter().any(|kw| haystack.contains(kw)) {
                letters_target = Some("secteur_tech".to_string());
                break;
            }
        }

        ProgressMetrics { ats_mean, ats_delta_pct_14d, cv_count_total, letters_count_total, letters_target }
    }

    fn extract_last_emotion_or_doubt(events: &[Event]) -> Option<String> {
        const DOUBT_PATTERNS: &[(&str, &[&str])] = &[
            ("reseautage", &["reseau", "networking", "relationnel", "contacts"]),
            ("quantification", &["quantifier", "chiffres", "mesure", "impact"]),
            ("reconversion", &["reconversion", "changement", "transition", "pivot"]),
            ("experience", &["experience", "junior", "manque", "debutant"]),
        ];

        for event in events.iter().rev() {
            let event_type = event.event_type.to_lowercase();
            if event_type.contains("session_zero") || event_type.contains("onboarding") {
                let notes = event.event_data.get("notes").and_then(|v| v.as_str()).unwrap_or("");
                let feedback = event.event_data.get("feedback").and_then(|v| v.as_str()).unwrap_or("");
                let text = format!("{notes}{feedback}").to_lowercase();

                for (doubt, keywords) in DOUBT_PATTERNS {
                    if keywords.iter().any(|kw| text.contains(kw)) {
                        return Some(doubt.to_string());
                    }
                }
            }
        }
        None
    }
}
