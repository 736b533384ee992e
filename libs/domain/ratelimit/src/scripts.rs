// [libs/domain/ratelimit/src/scripts.rs]
/*!
 * APARATO: LUA SCRIPTS PARA EJECUCION ATOMICA EN CACHE (ESTRATO L2)
 * RESPONSABILIDAD: OPERACIONES DE ESTRATEGIA QUE DEBEN SER ATOMICAS
 *
 * Estos scripts se ejecutan server-side en el backend de cache (Redis u
 * otro motor compatible con scripting Lua) para evitar condiciones de
 * carrera entre la lectura del contador y su incremento. El puerto
 * `RateLimitCache::eval_sliding_window`/`eval_token_bucket` es quien los
 * despacha; el dominio nunca ve el texto del script directamente salvo
 * para construirlo una sola vez en el adaptador de infraestructura.
 */

/// KEYS[1] = clave de conjunto ordenado
/// ARGV[1] = ventana en segundos
/// ARGV[2] = limite de solicitudes
/// ARGV[3] = timestamp actual (epoch, float)
/// ARGV[4] = identificador de la solicitud (para desambiguar el miembro)
///
/// Devuelve {allowed: 0|1, current_count, limit}
pub const SLIDING_WINDOW_SCRIPT: &str = r#"
local key = KEYS[1]
local window = tonumber(ARGV[1])
local limit = tonumber(ARGV[2])
local now = tonumber(ARGV[3])
local identifier = ARGV[4]

redis.call('ZREMRANGEBYSCORE', key, '-inf', now - window)
local current = redis.call('ZCARD', key)

if current < limit then
    redis.call('ZADD', key, now, identifier .. ':' .. now)
    redis.call('EXPIRE', key, math.ceil(window))
    return {1, current + 1, limit}
else
    return {0, current, limit}
end
"#;

/// KEYS[1] = clave del hash del cubo
/// ARGV[1] = capacidad del cubo
/// ARGV[2] = tasa de relleno (fichas por ventana)
/// ARGV[3] = duracion de la ventana en segundos
/// ARGV[4] = timestamp actual (epoch, float)
/// ARGV[5] = fichas solicitadas (default 1)
///
/// Devuelve {allowed: 0|1, tokens_restantes, capacidad}
pub const TOKEN_BUCKET_SCRIPT: &str = r#"
local key = KEYS[1]
local capacity = tonumber(ARGV[1])
local refill_rate = tonumber(ARGV[2])
local window_seconds = tonumber(ARGV[3])
local now = tonumber(ARGV[4])
local requested_tokens = tonumber(ARGV[5]) or 1

local bucket = redis.call('HMGET', key, 'tokens', 'last_refill')
local tokens = tonumber(bucket[1]) or capacity
local last_refill = tonumber(bucket[2]) or now

local time_elapsed = math.max(0, now - last_refill)
local tokens_to_add = math.floor(time_elapsed * refill_rate / window_seconds)
tokens = math.min(capacity, tokens + tokens_to_add)

if tokens >= requested_tokens then
    tokens = tokens - requested_tokens
    redis.call('HMSET', key, 'tokens', tokens, 'last_refill', now)
    redis.call('EXPIRE', key, window_seconds * 2)
    return {1, tokens, capacity}
else
    redis.call('HMSET', key, 'tokens', tokens, 'last_refill', now)
    redis.call('EXPIRE', key, window_seconds * 2)
    return {0, tokens, capacity}
end
"#;
