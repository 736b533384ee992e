// [libs/domain/ratelimit/src/hashing.rs]
/*!
 * APARATO: IDENTIFICADOR ANONIMIZADO (ESTRATO L2)
 * RESPONSABILIDAD: DERIVAR UNA CLAVE DE CACHE ESTABLE Y NO REVERSIBLE
 */

use sha2::{Digest, Sha256};

use crate::types::RateLimitScope;

/// `sha256(f"{scope}:{identifier}")[:16]`, preservado bit a bit del
/// sistema de origen para que las claves de cache sigan siendo deterministas
/// entre despliegues.
pub fn identifier_hash(identifier: &str, scope: RateLimitScope) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{}:{}", scope.as_str(), identifier).as_bytes());
    let digest = hasher.finalize();
    hex::encode(digest)[..16].to_string()
}

/// `ratelimit:{strategy}:{scope}:{identifier_hash}`. La ventana fija añade
/// ademas el indice del bucket de ventana vigente.
pub fn cache_key(identifier_hash: &str, scope: RateLimitScope, strategy: crate::types::RateLimitStrategy) -> String {
    format!("ratelimit:{}:{}:{}", strategy.as_str(), scope.as_str(), identifier_hash)
}

pub fn fixed_window_bucket_key(base_key: &str, window_seconds: u32, now_epoch: i64) -> String {
    let bucket_index = now_epoch / window_seconds as i64;
    format!("{}:{}", base_key, bucket_index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_stable_and_truncated_to_sixteen_chars() {
        let a = identifier_hash("user-42", RateLimitScope::AuthLogin);
        let b = identifier_hash("user-42", RateLimitScope::AuthLogin);
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
    }

    #[test]
    fn hash_differs_across_scopes_for_same_identifier() {
        let a = identifier_hash("user-42", RateLimitScope::AuthLogin);
        let b = identifier_hash("user-42", RateLimitScope::ApiEnergy);
        assert_ne!(a, b);
    }
}
