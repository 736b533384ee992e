// [libs/infra/cache/src/config.rs]
/*!
 * APARATO: CACHE CONFIGURATION (ESTRATO L1)
 * RESPONSABILIDAD: ESPACIO DE NOMBRES Y TTL POR TIPO DE DATO
 *
 * Cada clave se construye como `{key_prefix}:{version}:{key_type}:{id}`,
 * calcado del esquema de namespacing del sistema de origen, para que
 * multiples despliegues puedan compartir el mismo cluster Redis sin
 * colisionar y para poder invalidar por version en un despliegue mayor.
 */

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub key_prefix: String,
    pub version: String,
    pub user_energy_ttl_seconds: u64,
    pub transactions_ttl_seconds: u64,
    pub user_stats_ttl_seconds: u64,
    pub leaderboard_ttl_seconds: u64,
    pub narrative_context_ttl_seconds: u64,
    pub fallback_max_entries: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            key_prefix: "luna:prod".to_string(),
            version: "v1".to_string(),
            user_energy_ttl_seconds: 300,
            transactions_ttl_seconds: 600,
            user_stats_ttl_seconds: 900,
            leaderboard_ttl_seconds: 1800,
            narrative_context_ttl_seconds: 300,
            fallback_max_entries: 1000,
        }
    }
}

impl CacheConfig {
    pub fn build_key(&self, key_type: &str, identifier: &str) -> String {
        format!("{}:{}:{}:{}", self.key_prefix, self.version, key_type, identifier)
    }
}
