//! Handler for `PATCH /portfolios`: reconcile the caller's stored portfolio
//! against the submitted tree.

use axum::extract::State;
use folio_core::{
  assets::ObjectStore,
  store::FolioStore,
  tree::{PortfolioSubmission, ReconcileOutcome},
};

use crate::{
  AppState,
  envelope::{ApiResult, Envelope},
  error::ApiError,
  extract::ApiJson,
  session::Session,
};

/// `PATCH /portfolios`
///
/// Assets of removed photos are handed to the janitor only once the store
/// has committed.
pub async fn reconcile<S, O>(
  State(state): State<AppState<S, O>>,
  session: Session,
  ApiJson(submission): ApiJson<PortfolioSubmission>,
) -> ApiResult<ReconcileOutcome>
where
  S: FolioStore + 'static,
  O: ObjectStore + 'static,
{
  let outcome = state
    .store
    .reconcile(session.user_id, submission)
    .await
    .map_err(ApiError::from_store)?;

  state.janitor.release(outcome.released_assets.clone());

  tracing::info!(
    user_id = %session.user_id,
    created_folders = outcome.created_folders.len(),
    deleted_folders = outcome.deleted_folders.len(),
    released_assets = outcome.released_assets.len(),
    "portfolio reconciled"
  );
  Ok(Envelope::ok(outcome))
}
