//! Liveness and readiness probes.

use axum::{Json, extract::State};
use folio_core::{assets::ObjectStore, store::FolioStore};

use crate::{
  AppState,
  envelope::{ApiResult, Envelope},
  error::ApiError,
};

/// `GET /ping`
pub async fn ping() -> Json<Envelope<&'static str>> { Envelope::ok("pong") }

/// `GET /health`: round-trips the store.
pub async fn health<S, O>(State(state): State<AppState<S, O>>) -> ApiResult<&'static str>
where
  S: FolioStore + 'static,
  O: ObjectStore + 'static,
{
  state.store.ping().await.map_err(ApiError::from_store)?;
  Ok(Envelope::ok("ok"))
}
