//! Handlers for `/membership-plans` endpoints. Every route requires the
//! admin role.
//!
//! | Method   | Path                     | Notes |
//! |----------|--------------------------|-------|
//! | `GET`    | `/membership-plans`      | `?keyword&sort&order&page&size` |
//! | `POST`   | `/membership-plans`      | |
//! | `GET`    | `/membership-plans/{id}` | 404 if not found |
//! | `PUT`    | `/membership-plans/{id}` | Sparse body |
//! | `DELETE` | `/membership-plans/{id}` | |

use axum::{extract::State, http::StatusCode};
use folio_core::{
  assets::ObjectStore,
  membership::{MembershipPlan, NewPlan, PlanPatch, PlanQuery},
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

fn not_found(id: Uuid) -> ApiError { ApiError::NotFound(format!("membership plan {id} not found")) }

/// `GET /membership-plans`
pub async fn list<S, O>(
  State(state): State<AppState<S, O>>,
  session: Session,
  ApiQuery(query): ApiQuery<PlanQuery>,
) -> ApiResult<Page<MembershipPlan>>
where
  S: FolioStore + 'static,
  O: ObjectStore + 'static,
{
  session.require_admin()?;
  let page = state.store.list_plans(query).await.map_err(ApiError::from_store)?;
  Ok(Envelope::ok(page))
}

/// `GET /membership-plans/{id}`
pub async fn get_one<S, O>(
  State(state): State<AppState<S, O>>,
  session: Session,
  ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<MembershipPlan>
where
  S: FolioStore + 'static,
  O: ObjectStore + 'static,
{
  session.require_admin()?;
  let plan = state
    .store
    .get_plan(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| not_found(id))?;
  Ok(Envelope::ok(plan))
}

/// `POST /membership-plans`
pub async fn create<S, O>(
  State(state): State<AppState<S, O>>,
  session: Session,
  ApiJson(input): ApiJson<NewPlan>,
) -> Result<(StatusCode, axum::Json<Envelope<MembershipPlan>>)>
where
  S: FolioStore + 'static,
  O: ObjectStore + 'static,
{
  session.require_admin()?;
  let plan = state.store.create_plan(input).await.map_err(ApiError::from_store)?;
  tracing::info!(plan_id = %plan.id, name = %plan.name, "membership plan created");
  Ok((StatusCode::CREATED, Envelope::ok(plan)))
}

/// `PUT /membership-plans/{id}`
pub async fn update<S, O>(
  State(state): State<AppState<S, O>>,
  session: Session,
  ApiPath(id): ApiPath<Uuid>,
  ApiJson(patch): ApiJson<PlanPatch>,
) -> ApiResult<MembershipPlan>
where
  S: FolioStore + 'static,
  O: ObjectStore + 'static,
{
  session.require_admin()?;
  let plan = state
    .store
    .update_plan(id, patch)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| not_found(id))?;
  Ok(Envelope::ok(plan))
}

/// `DELETE /membership-plans/{id}`
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
  if !state.store.delete_plan(id).await.map_err(ApiError::from_store)? {
    return Err(not_found(id));
  }
  Ok(Envelope::ok(id))
}
