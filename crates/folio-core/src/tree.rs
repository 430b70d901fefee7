//! The client-submitted portfolio tree and the outcome of reconciling it.
//!
//! Clients submit their whole denormalised view (portfolio → profile →
//! folders → photos) plus two deletion manifests. Every scalar field is
//! presence-aware: see [`crate::patch`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  patch::{apply, blank_id, nullable},
  portfolio::{Folder, FolderLayout, Photo, Portfolio, Profile},
};

// ─── Submission ──────────────────────────────────────────────────────────────

/// Body of `PATCH /api/v1/portfolios`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PortfolioSubmission {
  #[serde(flatten)]
  pub portfolio:       PortfolioPatch,
  #[serde(default, rename = "profiles", alias = "profile")]
  pub profile:         ProfilePatch,
  #[serde(default)]
  pub folders:         Vec<FolderSubmission>,
  /// Asset ids of photos to remove.
  #[serde(default)]
  pub deleted_photos:  Vec<String>,
  #[serde(default)]
  pub deleted_folders: Vec<Uuid>,
}

impl PortfolioSubmission {
  /// Asset ids the submission places in folders that survive this request.
  pub fn retained_assets(&self) -> Vec<&str> {
    self
      .folders
      .iter()
      .filter(|f| f.patch.id.is_none_or(|id| !self.deleted_folders.contains(&id)))
      .flat_map(|f| f.photos.iter())
      .map(|p| p.asset_id.as_str())
      .filter(|a| !a.is_empty())
      .collect()
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PortfolioPatch {
  #[serde(default, deserialize_with = "blank_id")]
  pub id:              Option<Uuid>,
  pub title:           Option<String>,
  pub columns:         Option<u32>,
  pub gap:             Option<u32>,
  pub rounded_corners: Option<bool>,
  pub show_captions:   Option<bool>,
}

impl PortfolioPatch {
  /// Apply present fields to `target`. Returns whether anything changed.
  pub fn apply_to(&self, target: &mut Portfolio) -> bool {
    let mut touched = apply(&mut target.title, &self.title);
    touched |= apply(&mut target.columns, &self.columns);
    touched |= apply(&mut target.gap, &self.gap);
    touched |= apply(&mut target.rounded_corners, &self.rounded_corners);
    touched |= apply(&mut target.show_captions, &self.show_captions);
    touched
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfilePatch {
  #[serde(default, deserialize_with = "blank_id")]
  pub id:        Option<Uuid>,
  pub name:      Option<String>,
  pub title:     Option<String>,
  pub bio:       Option<String>,
  pub email:     Option<String>,
  pub instagram: Option<String>,
  pub website:   Option<String>,
}

impl ProfilePatch {
  pub fn apply_to(&self, target: &mut Profile) -> bool {
    let mut touched = apply(&mut target.name, &self.name);
    touched |= apply(&mut target.title, &self.title);
    touched |= apply(&mut target.bio, &self.bio);
    touched |= apply(&mut target.email, &self.email);
    touched |= apply(&mut target.instagram, &self.instagram);
    touched |= apply(&mut target.website, &self.website);
    touched
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FolderSubmission {
  #[serde(flatten)]
  pub patch:  FolderPatch,
  /// Desired order of the folder's photos.
  #[serde(default)]
  pub photos: Vec<PhotoSubmission>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FolderPatch {
  #[serde(default, deserialize_with = "blank_id")]
  pub id:              Option<Uuid>,
  pub name:            Option<String>,
  pub description:     Option<String>,
  #[serde(default, deserialize_with = "nullable")]
  pub cover_photo_id:  Option<Option<Uuid>>,
  #[serde(default, deserialize_with = "nullable")]
  pub columns:         Option<Option<u32>>,
  #[serde(default, deserialize_with = "nullable")]
  pub gap:             Option<Option<u32>>,
  #[serde(default, deserialize_with = "nullable")]
  pub show_captions:   Option<Option<bool>>,
  #[serde(default, deserialize_with = "nullable")]
  pub rounded_corners: Option<Option<bool>>,
}

impl FolderPatch {
  pub fn apply_to(&self, target: &mut Folder) -> bool {
    let mut touched = apply(&mut target.name, &self.name);
    touched |= apply(&mut target.description, &self.description);
    touched |= apply(&mut target.cover_photo_id, &self.cover_photo_id);
    touched |= apply(&mut target.layout.columns, &self.columns);
    touched |= apply(&mut target.layout.gap, &self.gap);
    touched |= apply(&mut target.layout.show_captions, &self.show_captions);
    touched |= apply(&mut target.layout.rounded_corners, &self.rounded_corners);
    touched
  }

  /// Build a folder that does not exist yet. A name is required; the id is
  /// kept when the client generated one.
  pub fn to_new_folder(&self, portfolio_id: Uuid, now: DateTime<Utc>) -> Result<Folder> {
    let name = self
      .name
      .as_deref()
      .map(str::trim)
      .filter(|n| !n.is_empty())
      .ok_or_else(|| Error::Validation("a new folder needs a name".into()))?;

    Ok(Folder {
      id: self.id.unwrap_or_else(Uuid::now_v7),
      portfolio_id,
      name: name.to_owned(),
      description: self.description.clone().unwrap_or_default(),
      cover_photo_id: self.cover_photo_id.flatten(),
      layout: FolderLayout {
        columns:         self.columns.flatten(),
        gap:             self.gap.flatten(),
        show_captions:   self.show_captions.flatten(),
        rounded_corners: self.rounded_corners.flatten(),
      },
      created_at: now,
      updated_at: now,
    })
  }
}

/// A photo as positioned by the client. Only `public_id` identifies it; the
/// submitted `src` is never trusted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PhotoSubmission {
  #[serde(default, rename = "public_id")]
  pub asset_id: String,
  pub alt:      Option<String>,
  pub caption:  Option<String>,
}

impl PhotoSubmission {
  /// Move `target` to `folder_id` at `position`, applying any text edits.
  pub fn place(&self, target: &mut Photo, folder_id: Uuid, position: u32) {
    target.folder_id = folder_id;
    target.sort_index = position;
    apply(&mut target.alt, &self.alt);
    apply(&mut target.caption, &self.caption);
  }
}

// ─── Outcome ─────────────────────────────────────────────────────────────────

/// What a committed reconciliation changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileOutcome {
  pub created_folders:  Vec<Uuid>,
  pub updated_folders:  usize,
  pub reordered_photos: usize,
  pub deleted_folders:  Vec<Uuid>,
  /// Asset ids whose rows were removed; to be released from the object store
  /// once the transaction has committed.
  pub released_assets:  Vec<String>,
}
