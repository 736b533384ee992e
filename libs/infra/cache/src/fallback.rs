// [libs/infra/cache/src/fallback.rs]
/*!
 * APARATO: FALLBACK DE CACHE LOCAL (ESTRATO L1)
 * RESPONSABILIDAD: DEGRADACION CONTROLADA CUANDO REDIS NO RESPONDE
 *
 * Respaldo en proceso, acotado en tamaño, con expiracion por entrada.
 * No sustituye a Redis entre replicas del Hub: es una ultima linea de
 * defensa para que una caida del cluster de cache no tumbe el read-through
 * del Ledger de energia ni el Context Packet narrativo.
 */

use std::sync::Arc;
use std::time::{Duration, Instant};

use moka::future::Cache;
use moka::Expiry;

#[derive(Clone)]
struct StoredValue {
    bytes: Arc<Vec<u8>>,
    ttl: Duration,
}

struct PerEntryExpiry;

impl Expiry<String, StoredValue> for PerEntryExpiry {
    fn expire_after_create(&self, _key: &String, value: &StoredValue, _created_at: Instant) -> Option<Duration> {
        Some(value.ttl)
    }
}

pub struct FallbackMemoryCache {
    inner: Cache<String, StoredValue>,
}

impl FallbackMemoryCache {
    pub fn new(max_entries: u64) -> Self {
        let inner = Cache::builder().max_capacity(max_entries).expire_after(PerEntryExpiry).build();
        FallbackMemoryCache { inner }
    }

    pub async fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.inner.get(key).await.map(|stored| stored.bytes.as_ref().clone())
    }

    pub async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) {
        self.inner.insert(key.to_string(), StoredValue { bytes: Arc::new(value), ttl }).await;
    }

    pub async fn delete(&self, key: &str) {
        self.inner.remove(key).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stores_and_returns_a_value_within_ttl() {
        let cache = FallbackMemoryCache::new(10);
        cache.set("k1", b"hello".to_vec(), Duration::from_secs(60)).await;
        assert_eq!(cache.get("k1").await, Some(b"hello".to_vec()));
    }

    #[tokio::test]
    async fn delete_removes_the_entry() {
        let cache = FallbackMemoryCache::new(10);
        cache.set("k2", b"v".to_vec(), Duration::from_secs(60)).await;
        cache.delete("k2").await;
        assert_eq!(cache.get("k2").await, None);
    }
}
