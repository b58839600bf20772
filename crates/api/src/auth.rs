//! Bearer-token authentication and password hashing.
//!
//! Sessions are opaque UUID tokens stored server-side; the `Principal`
//! extractor resolves `Authorization: Bearer <token>` against the session
//! store and hands the domain an explicit caller identity.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use domain::storage::UserStore;
use domain::{CommerceStore, Principal};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::AppState;
use crate::error::ApiError;

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Hashes a password with a fresh random salt. Format: `salt$digest`, both
/// hex.
pub fn hash_password(password: &str) -> String {
    let salt: [u8; 16] = rand::random();
    let salt_hex = hex_encode(&salt);
    let digest = Sha256::new()
        .chain_update(salt_hex.as_bytes())
        .chain_update(password.as_bytes())
        .finalize();
    format!("{salt_hex}${}", hex_encode(&digest))
}

/// Checks a password against a stored `salt$digest` hash.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt_hex, digest_hex)) = stored.split_once('$') else {
        return false;
    };
    let digest = Sha256::new()
        .chain_update(salt_hex.as_bytes())
        .chain_update(password.as_bytes())
        .finalize();
    hex_encode(&digest) == digest_hex
}

/// Rejects non-admin callers.
pub fn require_admin(principal: &Principal) -> Result<(), ApiError> {
    if principal.is_admin() {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Admin access required.".to_string()))
    }
}

fn bearer_token(parts: &Parts) -> Result<Uuid, ApiError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Not authenticated.".to_string()))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::Unauthorized("Expected a bearer token.".to_string()))?;

    Uuid::parse_str(token.trim())
        .map_err(|_| ApiError::Unauthorized("Malformed session token.".to_string()))
}

impl<S: CommerceStore> FromRequestParts<AppState<S>> for Principal {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<S>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;

        let user_id = state
            .store
            .get_session(token)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("Session expired or unknown.".to_string()))?;

        let user = state
            .store
            .get_user(user_id)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("Session expired or unknown.".to_string()))?;

        Ok(Principal {
            user_id: user.id,
            role: user.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_roundtrip() {
        let stored = hash_password("hunter2");
        assert!(verify_password("hunter2", &stored));
        assert!(!verify_password("hunter3", &stored));
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let a = hash_password("hunter2");
        let b = hash_password("hunter2");
        assert_ne!(a, b);
        assert!(verify_password("hunter2", &a));
        assert!(verify_password("hunter2", &b));
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!verify_password("anything", "no-separator"));
        assert!(!verify_password("anything", ""));
    }
}
