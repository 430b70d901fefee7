//! Bearer-token sessions and the identity-bridge secret.
//!
//! A token is 32 random bytes, URL-safe base64 encoded, and handed to the
//! client once. Only its SHA-256 hex digest is stored.

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Utc;
use folio_core::{
  assets::ObjectStore,
  store::FolioStore,
  user::Role,
};
use rand_core::{OsRng, RngCore};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

/// Header the identity-provider bridge uses to present its shared secret.
pub const IDENTITY_SECRET_HEADER: &str = "x-identity-secret";

const TOKEN_BYTES: usize = 32;

/// Generate a fresh bearer token.
pub fn mint_token() -> String {
  let mut bytes = [0u8; TOKEN_BYTES];
  OsRng.fill_bytes(&mut bytes);
  URL_SAFE_NO_PAD.encode(bytes)
}

/// The digest under which a token is stored.
pub fn hash_token(token: &str) -> String { hex::encode(Sha256::digest(token.as_bytes())) }

/// Check the bridge secret in `headers` against the configured argon2 hash.
pub fn verify_identity_secret(headers: &HeaderMap, secret_hash: &str) -> Result<(), ApiError> {
  let secret = headers
    .get(IDENTITY_SECRET_HEADER)
    .and_then(|v| v.to_str().ok())
    .ok_or(ApiError::Unauthorized)?;

  let parsed = PasswordHash::new(secret_hash).map_err(|e| {
    tracing::error!(error = %e, "configured identity secret hash is not a valid PHC string");
    ApiError::Unauthorized
  })?;

  Argon2::default()
    .verify_password(secret.as_bytes(), &parsed)
    .map_err(|_| ApiError::Unauthorized)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
  headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(str::trim)
    .filter(|t| !t.is_empty())
}

/// An authenticated caller. Extracting it rejects the request with 401 when
/// the bearer token is missing, unknown or expired.
#[derive(Debug, Clone)]
pub struct Session {
  pub user_id:    Uuid,
  pub role:       Role,
  pub token_hash: String,
}

impl Session {
  pub fn is_admin(&self) -> bool { self.role == Role::Admin }

  pub fn require_admin(&self) -> Result<(), ApiError> {
    if self.is_admin() {
      Ok(())
    } else {
      Err(ApiError::Forbidden("admin role required".into()))
    }
  }
}

impl<S, O> FromRequestParts<AppState<S, O>> for Session
where
  S: FolioStore + 'static,
  O: ObjectStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S, O>,
  ) -> Result<Self, Self::Rejection> {
    let token = bearer_token(&parts.headers).ok_or(ApiError::Unauthorized)?;
    let token_hash = hash_token(token);

    let record = state
      .store
      .find_session(token_hash.clone())
      .await
      .map_err(ApiError::from_store)?
      .ok_or(ApiError::Unauthorized)?;

    if record.is_expired(Utc::now()) {
      return Err(ApiError::Unauthorized);
    }

    Ok(Session { user_id: record.user_id, role: record.role, token_hash })
  }
}

#[cfg(test)]
mod tests {
  use argon2::{PasswordHasher, password_hash::SaltString};
  use axum::http::HeaderValue;

  use super::*;

  #[test]
  fn tokens_are_unique_and_url_safe() {
    let a = mint_token();
    let b = mint_token();
    assert_ne!(a, b);
    assert_eq!(a.len(), 43);
    assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
  }

  #[test]
  fn token_hash_is_hex_sha256() {
    let h = hash_token("abc");
    assert_eq!(h, "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad");
  }

  #[test]
  fn bearer_token_parsing() {
    let mut headers = HeaderMap::new();
    assert_eq!(bearer_token(&headers), None);

    headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
    assert_eq!(bearer_token(&headers), None);

    headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer tok"));
    assert_eq!(bearer_token(&headers), Some("tok"));
  }

  #[test]
  fn identity_secret_verification() {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(b"bridge-secret", &salt)
      .unwrap()
      .to_string();

    let mut headers = HeaderMap::new();
    assert!(verify_identity_secret(&headers, &hash).is_err());

    headers.insert(IDENTITY_SECRET_HEADER, HeaderValue::from_static("wrong"));
    assert!(verify_identity_secret(&headers, &hash).is_err());

    headers.insert(IDENTITY_SECRET_HEADER, HeaderValue::from_static("bridge-secret"));
    assert!(verify_identity_secret(&headers, &hash).is_ok());
    assert!(verify_identity_secret(&headers, "not a phc string").is_err());
  }
}
