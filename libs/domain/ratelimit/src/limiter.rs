// [libs/domain/ratelimit/src/limiter.rs]
/*!
 * APARATO: RATE LIMITER (ESTRATO L2 - NUCLEO DE DECISION)
 * RESPONSABILIDAD: DECIDIR ALLOWED/LIMITED/BLOCKED PARA UN (SCOPE, IDENTIFICADOR)
 *
 * Orden de evaluacion por solicitud:
 *   1. si el ambito no tiene regla habilitada -> ALLOWED.
 *   2. si existe un registro de bloqueo vigente -> BLOCKED.
 *   3. despachar a la estrategia (ventana fija / deslizante / cubo de fichas).
 *   4. si la estrategia deniega, levantar (o renovar) el bloqueo y auditar.
 *   5. si el backend de cache falla, degradar a un conteo aproximado sobre
 *      el registro de eventos antes de abrir la compuerta a ciegas.
 */

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration as ChronoDuration, Utc};

use crate::errors::RateLimitError;
use crate::hashing::{cache_key, fixed_window_bucket_key, identifier_hash};
use crate::ports::{BlockRecord, BlockRecordStore, EventCounter, RateLimitAuditSink, RateLimitCache};
use crate::types::{lookup_rule, RateLimitResult, RateLimitRule, RateLimitScope, RateLimitStrategy};

#[derive(Debug, Clone)]
pub struct RateLimitDecision {
    pub result: RateLimitResult,
    pub scope: RateLimitScope,
    pub strategy: Option<RateLimitStrategy>,
    pub current_count: u32,
    pub limit: u32,
    pub window_seconds: u32,
    pub reset_at: DateTime<Utc>,
    pub blocked_until: Option<DateTime<Utc>>,
    pub block_duration_seconds: Option<u32>,
    pub message: Option<String>,
    /// `true` cuando la decision proviene de la degradacion de respaldo
    /// (cache no disponible), no de la estrategia nominal.
    pub degraded: bool,
}

#[derive(Debug, Default)]
pub struct RateLimitMetricsSnapshot {
    pub total_requests: u64,
    pub allowed: u64,
    pub limited: u64,
    pub cache_errors: u64,
}

impl RateLimitMetricsSnapshot {
    pub fn success_rate_pct(&self) -> f64 {
        if self.total_requests == 0 {
            100.0
        } else {
            (self.allowed as f64 / self.total_requests as f64) * 100.0
        }
    }

    pub fn block_rate_pct(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            (self.limited as f64 / self.total_requests as f64) * 100.0
        }
    }
}

#[derive(Default)]
struct Metrics {
    total_requests: AtomicU64,
    allowed: AtomicU64,
    limited: AtomicU64,
    cache_errors: AtomicU64,
}

pub struct RateLimiter<C: RateLimitCache, B: BlockRecordStore, A: RateLimitAuditSink, E: EventCounter> {
    cache: Arc<C>,
    blocks: Arc<B>,
    audit: Arc<A>,
    fallback: Arc<E>,
    metrics: Metrics,
}

impl<C: RateLimitCache, B: BlockRecordStore, A: RateLimitAuditSink, E: EventCounter> RateLimiter<C, B, A, E> {
    pub fn new(cache: Arc<C>, blocks: Arc<B>, audit: Arc<A>, fallback: Arc<E>) -> Self {
        Self { cache, blocks, audit, fallback, metrics: Metrics::default() }
    }

    pub async fn check_rate_limit(&self, scope: RateLimitScope, identifier: &str) -> Result<RateLimitDecision, RateLimitError> {
        self.metrics.total_requests.fetch_add(1, Ordering::Relaxed);

        let rule = match lookup_rule(scope) {
            Some(rule) => rule,
            None => {
                self.metrics.allowed.fetch_add(1, Ordering::Relaxed);
                return Ok(self.allowed_decision(scope, None, 0, u32::MAX, 0, None));
            }
        };

        let id_hash = identifier_hash(identifier, scope);

        if let Some(block) = self.blocks.get_block(scope, &id_hash).await? {
            if block.blocked_until > Utc::now() {
                self.metrics.limited.fetch_add(1, Ordering::Relaxed);
                return Ok(RateLimitDecision {
                    result: RateLimitResult::Blocked,
                    scope,
                    strategy: Some(rule.strategy),
                    current_count: rule.requests_per_window,
                    limit: rule.requests_per_window,
                    window_seconds: rule.window_seconds,
                    reset_at: block.blocked_until,
                    blocked_until: Some(block.blocked_until),
                    block_duration_seconds: Some(rule.block_duration_seconds),
                    message: Some("identifier currently blocked".to_string()),
                    degraded: false,
                });
            }
        }

        let outcome = match self.dispatch_strategy(rule, &id_hash, identifier).await {
            Ok(outcome) => outcome,
            Err(_cache_error) => {
                self.metrics.cache_errors.fetch_add(1, Ordering::Relaxed);
                return self.degrade_via_fallback(rule, identifier).await;
            }
        };

        self.audit.record_attempt(scope, identifier, rule.strategy).await?;

        if outcome.allowed {
            self.metrics.allowed.fetch_add(1, Ordering::Relaxed);
            Ok(self.allowed_decision(
                scope,
                Some(rule.strategy),
                outcome.current_count,
                outcome.limit,
                rule.window_seconds,
                None,
            ))
        } else {
            self.metrics.limited.fetch_add(1, Ordering::Relaxed);
            let blocked_until = Utc::now() + ChronoDuration::seconds(rule.block_duration_seconds as i64);
            self.blocks
                .upsert_block(&BlockRecord {
                    scope,
                    identifier_hash: id_hash,
                    blocked_until,
                    block_duration_seconds: rule.block_duration_seconds,
                })
                .await?;
            self.audit.record_limited(scope, identifier, blocked_until).await?;
            Ok(RateLimitDecision {
                result: RateLimitResult::Limited,
                scope,
                strategy: Some(rule.strategy),
                current_count: outcome.current_count,
                limit: outcome.limit,
                window_seconds: rule.window_seconds,
                reset_at: blocked_until,
                blocked_until: Some(blocked_until),
                block_duration_seconds: Some(rule.block_duration_seconds),
                message: Some("rate limit exceeded".to_string()),
                degraded: false,
            })
        }
    }

    async fn dispatch_strategy(
        &self,
        rule: &RateLimitRule,
        id_hash: &str,
        identifier: &str,
    ) -> Result<crate::ports::StrategyOutcome, RateLimitError> {
        let now_millis = Utc::now().timestamp_millis();
        let key = cache_key(id_hash, rule.scope, rule.strategy);

        match rule.strategy {
            RateLimitStrategy::SlidingWindow => {
                self.cache
                    .eval_sliding_window(&key, rule.window_seconds, rule.requests_per_window, now_millis, identifier)
                    .await
            }
            RateLimitStrategy::TokenBucket => {
                let capacity = rule.burst_size.unwrap_or(rule.requests_per_window);
                self.cache
                    .eval_token_bucket(&key, capacity, rule.requests_per_window, rule.window_seconds, now_millis, 1)
                    .await
            }
            RateLimitStrategy::FixedWindow => {
                let bucketed_key = fixed_window_bucket_key(&key, rule.window_seconds, Utc::now().timestamp());
                let current = self.cache.incr_fixed_window(&bucketed_key, rule.window_seconds).await?;
                Ok(crate::ports::StrategyOutcome {
                    allowed: current <= rule.requests_per_window,
                    current_count: current,
                    limit: rule.requests_per_window,
                })
            }
        }
    }

    async fn degrade_via_fallback(&self, rule: &RateLimitRule, identifier: &str) -> Result<RateLimitDecision, RateLimitError> {
        let since = Utc::now() - ChronoDuration::seconds(rule.window_seconds as i64);
        match self.fallback.count_recent_attempts(rule.scope, identifier, since, 500).await {
            Ok(count) if count >= rule.requests_per_window => {
                self.metrics.limited.fetch_add(1, Ordering::Relaxed);
                Ok(RateLimitDecision {
                    result: RateLimitResult::Limited,
                    scope: rule.scope,
                    strategy: Some(rule.strategy),
                    current_count: count,
                    limit: rule.requests_per_window,
                    window_seconds: rule.window_seconds,
                    reset_at: Utc::now() + ChronoDuration::seconds(rule.window_seconds as i64),
                    blocked_until: None,
                    block_duration_seconds: None,
                    message: Some("rate_check_degraded".to_string()),
                    degraded: true,
                })
            }
            Ok(count) => {
                self.metrics.allowed.fetch_add(1, Ordering::Relaxed);
                Ok(RateLimitDecision {
                    result: RateLimitResult::Allowed,
                    scope: rule.scope,
                    strategy: Some(rule.strategy),
                    current_count: count,
                    limit: rule.requests_per_window,
                    window_seconds: rule.window_seconds,
                    reset_at: Utc::now() + ChronoDuration::seconds(rule.window_seconds as i64),
                    blocked_until: None,
                    block_duration_seconds: None,
                    message: Some("rate_check_degraded".to_string()),
                    degraded: true,
                })
            }
            Err(_) => {
                self.metrics.allowed.fetch_add(1, Ordering::Relaxed);
                Ok(self.allowed_decision(rule.scope, Some(rule.strategy), 0, rule.requests_per_window, rule.window_seconds, Some("rate_check_failed".to_string())))
            }
        }
    }

    fn allowed_decision(
        &self,
        scope: RateLimitScope,
        strategy: Option<RateLimitStrategy>,
        current_count: u32,
        limit: u32,
        window_seconds: u32,
        message: Option<String>,
    ) -> RateLimitDecision {
        RateLimitDecision {
            result: RateLimitResult::Allowed,
            scope,
            strategy,
            current_count,
            limit,
            window_seconds,
            reset_at: Utc::now() + ChronoDuration::seconds(window_seconds as i64),
            blocked_until: None,
            block_duration_seconds: None,
            message,
            degraded: false,
        }
    }

    pub async fn reset_rate_limit(&self, scope: RateLimitScope, identifier: &str) -> Result<(), RateLimitError> {
        let id_hash = identifier_hash(identifier, scope);
        if let Some(rule) = lookup_rule(scope) {
            let key = cache_key(&id_hash, scope, rule.strategy);
            self.cache.delete(&key).await?;
        }
        self.blocks.delete_block(scope, &id_hash).await
    }

    pub async fn get_rate_limit_status(&self, scope: RateLimitScope, identifier: &str) -> Result<RateLimitDecision, RateLimitError> {
        let rule = match lookup_rule(scope) {
            Some(rule) => rule,
            None => return Ok(self.allowed_decision(scope, None, 0, u32::MAX, 0, None)),
        };
        let id_hash = identifier_hash(identifier, scope);

        if let Some(block) = self.blocks.get_block(scope, &id_hash).await? {
            if block.blocked_until > Utc::now() {
                return Ok(RateLimitDecision {
                    result: RateLimitResult::Blocked,
                    scope,
                    strategy: Some(rule.strategy),
                    current_count: rule.requests_per_window,
                    limit: rule.requests_per_window,
                    window_seconds: rule.window_seconds,
                    reset_at: block.blocked_until,
                    blocked_until: Some(block.blocked_until),
                    block_duration_seconds: Some(rule.block_duration_seconds),
                    message: None,
                    degraded: false,
                });
            }
        }

        let key = cache_key(&id_hash, scope, rule.strategy);
        let current = self.cache.peek_count(&key).await?.unwrap_or(0);
        Ok(self.allowed_decision(scope, Some(rule.strategy), current, rule.requests_per_window, rule.window_seconds, None))
    }

    pub async fn cleanup_expired_blocks(&self) -> Result<u64, RateLimitError> {
        self.blocks.delete_expired(Utc::now()).await
    }

    pub fn get_metrics(&self) -> RateLimitMetricsSnapshot {
        RateLimitMetricsSnapshot {
            total_requests: self.metrics.total_requests.load(Ordering::Relaxed),
            allowed: self.metrics.allowed.load(Ordering::Relaxed),
            limited: self.metrics.limited.load(Ordering::Relaxed),
            cache_errors: self.metrics.cache_errors.load(Ordering::Relaxed),
        }
    }
}
