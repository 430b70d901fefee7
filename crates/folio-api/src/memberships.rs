//! Handlers for `/memberships` endpoints.
//!
//! | Method   | Path                | Notes |
//! |----------|---------------------|-------|
//! | `GET`    | `/memberships`      | `?user_id&plan_id&status&sort&order&page&size`; non-admins see only their own |
//! | `POST`   | `/memberships`      | Admin |
//! | `GET`    | `/memberships/{id}` | 404 if not found or not visible |
//! | `PUT`    | `/memberships/{id}` | Admin; sparse body |
//! | `DELETE` | `/memberships/{id}` | Admin |

use axum::{extract::State, http::StatusCode};
use folio_core::{
  assets::ObjectStore,
  membership::{Membership, MembershipPatch, MembershipQuery, NewMembership},
  page::Page,
  store::FolioStore,
};
use uuid::Uuid;

use crate::{
  AppState,
  envelope::{ApiResult, Envelope},
  error::{ApiError, Result},
  extract::{ApiJson, ApiPath, ApiQuery},
  session::Session,
};

fn not_found(id: Uuid) -> ApiError { ApiError::NotFound(format!("membership {id} not found")) }

/// `GET /memberships`
pub async fn list<S, O>(
  State(state): State<AppState<S, O>>,
  session: Session,
  ApiQuery(mut query): ApiQuery<MembershipQuery>,
) -> ApiResult<Page<Membership>>
where
  S: FolioStore + 'static,
  O: ObjectStore + 'static,
{
  if !session.is_admin() {
    query.user_id = Some(session.user_id);
  }
  let page = state
    .store
    .list_memberships(query)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Envelope::ok(page))
}

/// `GET /memberships/{id}`
pub async fn get_one<S, O>(
  State(state): State<AppState<S, O>>,
  session: Session,
  ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Membership>
where
  S: FolioStore + 'static,
  O: ObjectStore + 'static,
{
  let membership = state
    .store
    .get_membership(id)
    .await
    .map_err(ApiError::from_store)?
    .filter(|m| session.is_admin() || m.user_id == session.user_id)
    .ok_or_else(|| not_found(id))?;
  Ok(Envelope::ok(membership))
}

/// `POST /memberships`
pub async fn create<S, O>(
  State(state): State<AppState<S, O>>,
  session: Session,
  ApiJson(input): ApiJson<NewMembership>,
) -> Result<(StatusCode, axum::Json<Envelope<Membership>>)>
where
  S: FolioStore + 'static,
  O: ObjectStore + 'static,
{
  session.require_admin()?;
  let membership = state
    .store
    .create_membership(input)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Envelope::ok(membership)))
}

/// `PUT /memberships/{id}`
pub async fn update<S, O>(
  State(state): State<AppState<S, O>>,
  session: Session,
  ApiPath(id): ApiPath<Uuid>,
  ApiJson(patch): ApiJson<MembershipPatch>,
) -> ApiResult<Membership>
where
  S: FolioStore + 'static,
  O: ObjectStore + 'static,
{
  session.require_admin()?;
  let membership = state
    .store
    .update_membership(id, patch)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| not_found(id))?;
  Ok(Envelope::ok(membership))
}

/// `DELETE /memberships/{id}`
pub async fn delete<S, O>(
  State(state): State<AppState<S, O>>,
  session: Session,
  ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Uuid>
where
  S: FolioStore + 'static,
  O: ObjectStore + 'static,
{
  session.require_admin()?;
  let removed = state
    .store
    .delete_membership(id)
    .await
    .map_err(ApiError::from_store)?;
  if !removed {
    return Err(not_found(id));
  }
  Ok(Envelope::ok(id))
}
