// [libs/infra/cache/src/lib.rs]
/*!
 * APARATO: LIBRERIA DE CACHE DISTRIBUIDO (ESTRATO L1)
 * RESPONSABILIDAD: ADAPTADOR REDIS PARA SCRIPTING ATOMICO Y LECTURA ACELERADA
 *
 * El limitador de tasa exige atomicidad real: sus dos scripts Lua
 * (`eval_sliding_window`/`eval_token_bucket`) se despachan directamente
 * contra Redis sin degradacion local, porque el propio `RateLimiter` de
 * dominio ya sabe degradar hacia un `EventCounter` cuando este adaptador
 * devuelve error. El Ledger de energia y el Analizador Narrativo, en
 * cambio, solo necesitan un read-through acelerado: ahi si se cae a
 * `FallbackMemoryCache` en vez de propagar el fallo de Redis.
 */

pub mod config;
pub mod errors;
pub mod fallback;

use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::{Config as PoolConfig, Pool, Runtime};
use redis::AsyncCommands;
use tracing::{instrument, warn};

pub use config::CacheConfig;
pub use errors::CacheError;
pub use fallback::FallbackMemoryCache;

use luna_domain_energy::EnergyCache;
use luna_domain_narrative::{ContextCache, ContextPacket};
use luna_domain_ratelimit::{RateLimitCache, RateLimitError, StrategyOutcome, SLIDING_WINDOW_SCRIPT, TOKEN_BUCKET_SCRIPT};

/// Adaptador Redis con scripting atomico para el limitador de tasa, y
/// read-through con degradacion a memoria local para energia y narrativa.
pub struct RedisCacheAdapter {
    pool: Pool,
    config: CacheConfig,
    fallback: FallbackMemoryCache,
    sliding_window_script: redis::Script,
    token_bucket_script: redis::Script,
}

impl RedisCacheAdapter {
    pub fn connect(redis_url: &str, config: CacheConfig) -> Result<Self, CacheError> {
        let pool = PoolConfig::from_url(redis_url)
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| CacheError::Connection(e.to_string()))?;
        let fallback = FallbackMemoryCache::new(config.fallback_max_entries);
        Ok(Self {
            pool,
            config,
            fallback,
            sliding_window_script: redis::Script::new(SLIDING_WINDOW_SCRIPT),
            token_bucket_script: redis::Script::new(TOKEN_BUCKET_SCRIPT),
        })
    }

    async fn connection(&self) -> Result<deadpool_redis::Connection, CacheError> {
        self.pool.get().await.map_err(|e| CacheError::Connection(e.to_string()))
    }

    #[instrument(skip(self))]
    pub async fn get_bytes(&self, key_type: &str, identifier: &str) -> Option<Vec<u8>> {
        let key = self.config.build_key(key_type, identifier);
        match self.connection().await {
            Ok(mut conn) => match conn.get::<_, Option<Vec<u8>>>(&key).await {
                Ok(value) => value,
                Err(e) => {
                    warn!("⚠️ [CACHE_DEGRADED]: lectura Redis fallida para {}: {}, cayendo a memoria local", key, e);
                    self.fallback.get(&key).await
                }
            },
            Err(_) => self.fallback.get(&key).await,
        }
    }

    #[instrument(skip(self, value))]
    pub async fn set_bytes(&self, key_type: &str, identifier: &str, value: Vec<u8>, ttl_seconds: u64) {
        let key = self.config.build_key(key_type, identifier);
        match self.connection().await {
            Ok(mut conn) => {
                let result: Result<(), redis::RedisError> = conn.set_ex(&key, &value, ttl_seconds).await;
                if let Err(e) = result {
                    warn!("⚠️ [CACHE_DEGRADED]: escritura Redis fallida para {}: {}, cayendo a memoria local", key, e);
                    self.fallback.set(&key, value, Duration::from_secs(ttl_seconds)).await;
                }
            }
            Err(_) => self.fallback.set(&key, value, Duration::from_secs(ttl_seconds)).await,
        }
    }

    pub async fn delete_key(&self, key_type: &str, identifier: &str) {
        let key = self.config.build_key(key_type, identifier);
        if let Ok(mut conn) = self.connection().await {
            let _: Result<(), redis::RedisError> = conn.del(&key).await;
        }
        self.fallback.delete(&key).await;
    }
}

#[async_trait]
impl RateLimitCache for RedisCacheAdapter {
    #[instrument(skip(self))]
    async fn eval_sliding_window(
        &self,
        key: &str,
        window_seconds: u32,
        limit: u32,
        now_epoch_millis: i64,
        identifier: &str,
    ) -> Result<StrategyOutcome, RateLimitError> {
        let mut conn = self.connection().await.map_err(|e| RateLimitError::CacheUnavailable(e.to_string()))?;
        let now_seconds = now_epoch_millis as f64 / 1000.0;
        let raw: Vec<i64> = self
            .sliding_window_script
            .key(key)
            .arg(window_seconds)
            .arg(limit)
            .arg(now_seconds)
            .arg(identifier)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| RateLimitError::CacheUnavailable(e.to_string()))?;
        decode_outcome(&raw)
    }

    #[instrument(skip(self))]
    async fn eval_token_bucket(
        &self,
        key: &str,
        capacity: u32,
        refill_rate: u32,
        window_seconds: u32,
        now_epoch_millis: i64,
        requested_tokens: u32,
    ) -> Result<StrategyOutcome, RateLimitError> {
        let mut conn = self.connection().await.map_err(|e| RateLimitError::CacheUnavailable(e.to_string()))?;
        let now_seconds = now_epoch_millis as f64 / 1000.0;
        let raw: Vec<i64> = self
            .token_bucket_script
            .key(key)
            .arg(capacity)
            .arg(refill_rate)
            .arg(window_seconds)
            .arg(now_seconds)
            .arg(requested_tokens)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| RateLimitError::CacheUnavailable(e.to_string()))?;
        decode_outcome(&raw)
    }

    async fn incr_fixed_window(&self, key: &str, ttl_seconds: u32) -> Result<u32, RateLimitError> {
        let mut conn = self.connection().await.map_err(|e| RateLimitError::CacheUnavailable(e.to_string()))?;
        let current: i64 = conn.incr(key, 1).await.map_err(|e| RateLimitError::CacheUnavailable(e.to_string()))?;
        if current == 1 {
            let _: Result<(), redis::RedisError> = conn.expire(key, ttl_seconds as i64).await;
        }
        Ok(current.max(0) as u32)
    }

    async fn peek_count(&self, key: &str) -> Result<Option<u32>, RateLimitError> {
        let mut conn = self.connection().await.map_err(|e| RateLimitError::CacheUnavailable(e.to_string()))?;
        let current: Option<i64> = conn.get(key).await.map_err(|e| RateLimitError::CacheUnavailable(e.to_string()))?;
        Ok(current.map(|value| value.max(0) as u32))
    }

    async fn delete(&self, key: &str) -> Result<(), RateLimitError> {
        let mut conn = self.connection().await.map_err(|e| RateLimitError::CacheUnavailable(e.to_string()))?;
        let _: i64 = conn.del(key).await.map_err(|e| RateLimitError::CacheUnavailable(e.to_string()))?;
        Ok(())
    }
}

fn decode_outcome(raw: &[i64]) -> Result<StrategyOutcome, RateLimitError> {
    match raw {
        [allowed, current_count, limit] => Ok(StrategyOutcome {
            allowed: *allowed != 0,
            current_count: (*current_count).max(0) as u32,
            limit: (*limit).max(0) as u32,
        }),
        _ => Err(RateLimitError::CacheUnavailable("respuesta de script Lua con forma inesperada".to_string())),
    }
}

#[async_trait]
impl EnergyCache for RedisCacheAdapter {
    async fn invalidate_user_energy(&self, user_id: &str) {
        self.delete_key("user_energy", user_id).await;
    }
}

#[async_trait]
impl ContextCache for RedisCacheAdapter {
    async fn get(&self, user_id: &str) -> Option<ContextPacket> {
        let bytes = self.get_bytes("narrative_context", user_id).await?;
        serde_json::from_slice(&bytes).ok()
    }

    async fn put(&self, user_id: &str, packet: &ContextPacket) {
        if let Ok(bytes) = serde_json::to_vec(packet) {
            self.set_bytes("narrative_context", user_id, bytes, self.config.narrative_context_ttl_seconds).await;
        }
    }

    async fn invalidate(&self, user_id: &str) {
        self.delete_key("narrative_context", user_id).await;
    }
}
