//! Handlers for `/photos` endpoints.
//!
//! | Method   | Path      | Notes |
//! |----------|-----------|-------|
//! | `POST`   | `/photos` | Multipart: `file`, `folder_id`, optional `alt`, `caption` |
//! | `DELETE` | `/photos` | Body: `{"public_ids":[…]}` |

use axum::{
  extract::{Multipart, State, multipart::MultipartRejection},
  http::StatusCode,
};
use folio_core::{
  Error as CoreError,
  assets::ObjectStore,
  portfolio::{NewPhoto, Photo},
  store::FolioStore,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  AppState,
  envelope::{ApiResult, Envelope},
  error::{ApiError, Result},
  extract::ApiJson,
  session::Session,
};

// ─── Upload ──────────────────────────────────────────────────────────────────

#[derive(Default)]
struct UploadForm {
  file:      Option<Vec<u8>>,
  folder_id: Option<String>,
  alt:       String,
  caption:   String,
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm> {
  let mut form = UploadForm::default();
  while let Some(field) = multipart.next_field().await? {
    let name = field.name().unwrap_or_default().to_owned();
    match name.as_str() {
      "file" => form.file = Some(field.bytes().await?.to_vec()),
      "folder_id" => form.folder_id = Some(field.text().await?),
      "alt" => form.alt = field.text().await?,
      "caption" => form.caption = field.text().await?,
      _ => {}
    }
  }
  Ok(form)
}

/// `POST /photos`
///
/// The image is re-encoded before it reaches the object store. If the row
/// cannot be written the uploaded asset is released again.
pub async fn upload<S, O>(
  State(state): State<AppState<S, O>>,
  session: Session,
  multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, axum::Json<Envelope<Photo>>)>
where
  S: FolioStore + 'static,
  O: ObjectStore + 'static,
{
  let form = read_form(multipart?).await?;

  let folder_id = form
    .folder_id
    .as_deref()
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .ok_or_else(|| ApiError::BadRequest("folder_id is required".into()))?;
  let folder_id = Uuid::parse_str(folder_id)
    .map_err(|_| ApiError::BadRequest(format!("invalid folder_id: {folder_id:?}")))?;
  let bytes = form
    .file
    .filter(|b| !b.is_empty())
    .ok_or_else(|| ApiError::BadRequest("file is required".into()))?;

  let folder = state
    .store
    .find_folder(session.user_id, folder_id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or(CoreError::FolderNotOwned(folder_id))?;

  let compressed = folio_assets::compress_in_background(bytes)
    .await
    .map_err(|e| match e {
      folio_assets::Error::Image(e) => ApiError::BadRequest(format!("unsupported image: {e}")),
      other => ApiError::Internal(Box::new(other)),
    })?;

  let destination = format!(
    "{}/portfolios/{}",
    state.config.upload_base_path.trim_matches('/'),
    session.user_id
  );
  let asset = state
    .objects
    .upload(compressed, destination)
    .await
    .map_err(|e| ApiError::Internal(Box::new(e)))?;

  let photo = state
    .store
    .insert_photo(NewPhoto {
      folder_id: folder.id,
      src:       asset.url,
      alt:       form.alt,
      caption:   form.caption,
      asset_id:  asset.asset_id.clone(),
    })
    .await;

  match photo {
    Ok(photo) => {
      tracing::info!(
        user_id = %session.user_id,
        folder_id = %folder.id,
        asset_id = %photo.asset_id,
        "photo uploaded"
      );
      Ok((StatusCode::CREATED, Envelope::ok(photo)))
    }
    Err(e) => {
      state.janitor.release(vec![asset.asset_id]);
      Err(ApiError::from_store(e))
    }
  }
}

// ─── Bulk remove ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RemoveBody {
  pub public_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct Removed {
  pub public_ids: Vec<String>,
}

/// `DELETE /photos`. Only the caller's photos are touched.
pub async fn remove<S, O>(
  State(state): State<AppState<S, O>>,
  session: Session,
  ApiJson(body): ApiJson<RemoveBody>,
) -> ApiResult<Removed>
where
  S: FolioStore + 'static,
  O: ObjectStore + 'static,
{
  let removed = state
    .store
    .delete_photos(session.user_id, body.public_ids)
    .await
    .map_err(ApiError::from_store)?;

  state.janitor.release(removed.clone());
  Ok(Envelope::ok(Removed { public_ids: removed }))
}
