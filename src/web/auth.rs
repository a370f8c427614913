// Auth middleware — per-request API key validation.
//
// Keys are random 256-bit values, shown to the caller exactly once at
// creation. The database stores only the SHA-256 hash, so a leaked
// database doesn't leak usable keys.
//
// Auth check (this middleware):
//   extract X-API-Key header → hash → look up active key → touch last_used
//
// Outside production, CALLSCAN_MASTER_API_KEY may be set as a bootstrap
// key so the first real key can be created through the API.

use axum::extract::{Request, State};
use axum::http::{HeaderName, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use rand::RngCore;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use super::{api_error, AppState, AuthOwner};

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

pub fn api_key_header_name() -> HeaderName {
    HeaderName::from_static(API_KEY_HEADER)
}

/// Generate a new API key: 32 random bytes, hex-encoded.
pub fn generate_api_key() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Generate a key id for display and management (not secret).
pub fn generate_key_id() -> String {
    let mut bytes = [0u8; 8];
    rand::rng().fill_bytes(&mut bytes);
    format!("key-{}", hex::encode(bytes))
}

/// The stored form of a key: SHA-256, hex-encoded.
pub fn hash_api_key(key: &str) -> String {
    hex::encode(Sha256::digest(key.as_bytes()))
}

/// Axum middleware: reject requests without a valid API key with 403.
pub async fn require_api_key(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let Some(provided) = provided else {
        return api_error(StatusCode::FORBIDDEN, "API key missing");
    };

    // Bootstrap path: the master key is only honored outside production.
    if state.config.master_key_enabled()
        && constant_time_eq(&provided, &state.config.master_api_key)
    {
        info!("Access granted using master API key");
        request.extensions_mut().insert(AuthOwner("master".to_string()));
        return next.run(request).await;
    }

    let hash = hash_api_key(&provided);
    match state.db.authenticate_api_key(&hash).await {
        Ok(Some(key)) => {
            request.extensions_mut().insert(AuthOwner(key.owner_name));
            next.run(request).await
        }
        Ok(None) => {
            let prefix: String = provided.chars().take(8).collect();
            warn!(prefix = %prefix, "Invalid API key attempt");
            api_error(StatusCode::FORBIDDEN, "Invalid or inactive API key")
        }
        Err(e) => {
            tracing::error!(error = %e, "DB error during API key lookup");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Authentication failed")
        }
    }
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_keys_are_unique_and_hex() {
        let a = generate_api_key();
        let b = generate_api_key();
        assert_ne!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_hash_is_stable_and_distinct() {
        let key = generate_api_key();
        assert_eq!(hash_api_key(&key), hash_api_key(&key));
        assert_ne!(hash_api_key(&key), hash_api_key("other"));
        assert_eq!(hash_api_key(&key).len(), 64);
    }

    #[test]
    fn test_key_id_shape() {
        let id = generate_key_id();
        assert!(id.starts_with("key-"));
        assert_eq!(id.len(), 4 + 16);
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq("abc", "abc"));
        assert!(!constant_time_eq("abc", "abd"));
        assert!(!constant_time_eq("abc", "abcd"));
    }
}
