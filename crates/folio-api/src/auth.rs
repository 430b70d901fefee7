//! Handlers for `/auth` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/auth/login`  | Identity bridge only; requires `x-identity-secret` |
//! | `POST` | `/auth/logout` | Revokes the presented bearer token |

use axum::{extract::State, http::HeaderMap};
use chrono::{DateTime, Utc};
use folio_core::{
  assets::ObjectStore,
  store::FolioStore,
  user::{Identity, SessionRecord, User},
};
use serde::Serialize;

use crate::{
  AppState,
  envelope::{ApiResult, Envelope},
  error::ApiError,
  extract::ApiJson,
  session::{Session, hash_token, mint_token, verify_identity_secret},
};

#[derive(Debug, Serialize)]
pub struct LoginResponse {
  /// Returned once; the server keeps only its digest.
  pub token:      String,
  pub expires_at: DateTime<Utc>,
  pub user:       User,
}

/// `POST /auth/login`, body: `{"email":…,"name":…,"picture":…}`
///
/// Provisions the user on first sign-in and mints a session.
pub async fn login<S, O>(
  State(state): State<AppState<S, O>>,
  headers: HeaderMap,
  ApiJson(identity): ApiJson<Identity>,
) -> ApiResult<LoginResponse>
where
  S: FolioStore + 'static,
  O: ObjectStore + 'static,
{
  verify_identity_secret(&headers, &state.config.identity_secret_hash)?;

  let user = state
    .store
    .provision(identity, state.config.provisioning.clone())
    .await
    .map_err(ApiError::from_store)?;

  let token = mint_token();
  let now = Utc::now();
  let record = SessionRecord {
    token_hash: hash_token(&token),
    user_id:    user.id,
    role:       user.role,
    created_at: now,
    expires_at: now + state.config.session_ttl,
  };
  let expires_at = record.expires_at;
  state
    .store
    .create_session(record)
    .await
    .map_err(ApiError::from_store)?;

  tracing::info!(user_id = %user.id, "session created");
  Ok(Envelope::ok(LoginResponse { token, expires_at, user }))
}

/// `POST /auth/logout`
pub async fn logout<S, O>(
  State(state): State<AppState<S, O>>,
  session: Session,
) -> ApiResult<bool>
where
  S: FolioStore + 'static,
  O: ObjectStore + 'static,
{
  let removed = state
    .store
    .delete_session(session.token_hash)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Envelope::ok(removed))
}
