//! Portfolio, profile, folder and photo types.
//!
//! A user owns exactly one portfolio. The portfolio carries the gallery-wide
//! layout; folders may override any layout setting individually.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Portfolio ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Portfolio {
  pub id:              Uuid,
  pub user_id:         Uuid,
  pub title:           String,
  pub columns:         u32,
  pub gap:             u32,
  pub rounded_corners: bool,
  pub show_captions:   bool,
  pub created_at:      DateTime<Utc>,
  pub updated_at:      DateTime<Utc>,
}

/// Public-facing identity and contact details shown on a portfolio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
  pub id:           Uuid,
  pub portfolio_id: Uuid,
  pub name:         String,
  pub title:        String,
  pub bio:          String,
  pub email:        String,
  pub instagram:    String,
  pub website:      String,
}

// ─── Folders ─────────────────────────────────────────────────────────────────

/// Per-folder layout overrides. `None` inherits the portfolio setting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderLayout {
  pub columns:         Option<u32>,
  pub gap:             Option<u32>,
  pub show_captions:   Option<bool>,
  pub rounded_corners: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
  pub id:             Uuid,
  pub portfolio_id:   Uuid,
  pub name:           String,
  pub description:    String,
  /// The photo shown as the folder thumbnail.
  pub cover_photo_id: Option<Uuid>,
  #[serde(flatten)]
  pub layout:         FolderLayout,
  pub created_at:     DateTime<Utc>,
  pub updated_at:     DateTime<Utc>,
}

// ─── Photos ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
  pub id:         Uuid,
  pub folder_id:  Uuid,
  /// Public address of the stored image.
  pub src:        String,
  pub alt:        String,
  pub caption:    String,
  /// Object-store identifier; the durable join key for an uploaded image.
  #[serde(rename = "public_id")]
  pub asset_id:   String,
  /// Zero-based rendering position within the folder.
  pub sort_index: u32,
  pub created_at: DateTime<Utc>,
}

/// Input for persisting a freshly uploaded photo.
#[derive(Debug, Clone)]
pub struct NewPhoto {
  pub folder_id: Uuid,
  pub src:       String,
  pub alt:       String,
  pub caption:   String,
  pub asset_id:  String,
}

// ─── Read models ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct FolderView {
  #[serde(flatten)]
  pub folder: Folder,
  /// Ordered by `sort_index`.
  pub photos: Vec<Photo>,
}

/// The full nested portfolio as rendered by clients.
#[derive(Debug, Clone, Serialize)]
pub struct PortfolioView {
  #[serde(flatten)]
  pub portfolio: Portfolio,
  #[serde(rename = "profiles")]
  pub profile:   Option<Profile>,
  pub folders:   Vec<FolderView>,
}
