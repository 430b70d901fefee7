//! Handlers for `/users` endpoints.

use axum::extract::State;
use folio_core::{assets::ObjectStore, store::FolioStore, user::UserTree};

use crate::{
  AppState,
  envelope::{ApiResult, Envelope},
  error::ApiError,
  session::Session,
};

/// `GET /users/me`: the caller with their portfolio and membership.
pub async fn me<S, O>(
  State(state): State<AppState<S, O>>,
  session: Session,
) -> ApiResult<UserTree>
where
  S: FolioStore + 'static,
  O: ObjectStore + 'static,
{
  let tree = state
    .store
    .user_tree(session.user_id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("user {} not found", session.user_id)))?;
  Ok(Envelope::ok(tree))
}
