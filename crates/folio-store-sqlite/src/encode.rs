//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, UUIDs as hyphenated lowercase
//! strings, decimals as their canonical string and string lists as compact
//! JSON. Integers and booleans use SQLite's native integer storage.

use chrono::{DateTime, Utc};
use folio_core::{
  membership::{Membership, MembershipPlan},
  portfolio::{Folder, FolderLayout, Photo, Portfolio, Profile},
  user::{SessionRecord, User},
};
use rusqlite::Row;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn decode_decimal(s: &str) -> Result<Decimal> { Ok(s.parse::<Decimal>()?) }

pub fn encode_list(items: &[String]) -> Result<String> { Ok(serde_json::to_string(items)?) }

pub fn decode_list(s: &str) -> Result<Vec<String>> { Ok(serde_json::from_str(s)?) }

// ─── Column lists ────────────────────────────────────────────────────────────
//
// Each `Raw*::from_row` reads columns in exactly this order.

pub const USER_COLUMNS: &str = "id, email, name, picture, role, created_at, updated_at";

pub const PORTFOLIO_COLUMNS: &str =
  "id, user_id, title, columns, gap, rounded_corners, show_captions, created_at, updated_at";

pub const PROFILE_COLUMNS: &str =
  "id, portfolio_id, name, title, bio, email, instagram, website";

pub const FOLDER_COLUMNS: &str = "id, portfolio_id, name, description, cover_photo_id, \
   columns, gap, show_captions, rounded_corners, created_at, updated_at";

pub const PHOTO_COLUMNS: &str =
  "id, folder_id, src, alt, caption, asset_id, sort_index, created_at";

pub const MEMBERSHIP_COLUMNS: &str = "id, user_id, plan_id, status, start_date, end_date, \
   external_subscription_id, external_subscription_interval, created_at, updated_at";

pub const PLAN_COLUMNS: &str = "id, name, price, billing_cycle, features, is_popular, \
   max_folders, custom_domain, advanced_analytics, external_product_id, created_at, updated_at";

pub const SESSION_COLUMNS: &str = "token_hash, user_id, role, created_at, expires_at";

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `users` row.
pub struct RawUser {
  pub id:         String,
  pub email:      String,
  pub name:       String,
  pub picture:    String,
  pub role:       String,
  pub created_at: String,
  pub updated_at: String,
}

impl RawUser {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      email:      row.get(1)?,
      name:       row.get(2)?,
      picture:    row.get(3)?,
      role:       row.get(4)?,
      created_at: row.get(5)?,
      updated_at: row.get(6)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      id:         decode_uuid(&self.id)?,
      email:      self.email,
      name:       self.name,
      picture:    self.picture,
      role:       self.role.parse()?,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

pub struct RawPortfolio {
  pub id:              String,
  pub user_id:         String,
  pub title:           String,
  pub columns:         u32,
  pub gap:             u32,
  pub rounded_corners: bool,
  pub show_captions:   bool,
  pub created_at:      String,
  pub updated_at:      String,
}

impl RawPortfolio {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:              row.get(0)?,
      user_id:         row.get(1)?,
      title:           row.get(2)?,
      columns:         row.get(3)?,
      gap:             row.get(4)?,
      rounded_corners: row.get(5)?,
      show_captions:   row.get(6)?,
      created_at:      row.get(7)?,
      updated_at:      row.get(8)?,
    })
  }

  pub fn into_portfolio(self) -> Result<Portfolio> {
    Ok(Portfolio {
      id:              decode_uuid(&self.id)?,
      user_id:         decode_uuid(&self.user_id)?,
      title:           self.title,
      columns:         self.columns,
      gap:             self.gap,
      rounded_corners: self.rounded_corners,
      show_captions:   self.show_captions,
      created_at:      decode_dt(&self.created_at)?,
      updated_at:      decode_dt(&self.updated_at)?,
    })
  }
}

pub struct RawProfile {
  pub id:           String,
  pub portfolio_id: String,
  pub name:         String,
  pub title:        String,
  pub bio:          String,
  pub email:        String,
  pub instagram:    String,
  pub website:      String,
}

impl RawProfile {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:           row.get(0)?,
      portfolio_id: row.get(1)?,
      name:         row.get(2)?,
      title:        row.get(3)?,
      bio:          row.get(4)?,
      email:        row.get(5)?,
      instagram:    row.get(6)?,
      website:      row.get(7)?,
    })
  }

  pub fn into_profile(self) -> Result<Profile> {
    Ok(Profile {
      id:           decode_uuid(&self.id)?,
      portfolio_id: decode_uuid(&self.portfolio_id)?,
      name:         self.name,
      title:        self.title,
      bio:          self.bio,
      email:        self.email,
      instagram:    self.instagram,
      website:      self.website,
    })
  }
}

pub struct RawFolder {
  pub id:              String,
  pub portfolio_id:    String,
  pub name:            String,
  pub description:     String,
  pub cover_photo_id:  Option<String>,
  pub columns:         Option<u32>,
  pub gap:             Option<u32>,
  pub show_captions:   Option<bool>,
  pub rounded_corners: Option<bool>,
  pub created_at:      String,
  pub updated_at:      String,
}

impl RawFolder {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:              row.get(0)?,
      portfolio_id:    row.get(1)?,
      name:            row.get(2)?,
      description:     row.get(3)?,
      cover_photo_id:  row.get(4)?,
      columns:         row.get(5)?,
      gap:             row.get(6)?,
      show_captions:   row.get(7)?,
      rounded_corners: row.get(8)?,
      created_at:      row.get(9)?,
      updated_at:      row.get(10)?,
    })
  }

  pub fn into_folder(self) -> Result<Folder> {
    Ok(Folder {
      id:             decode_uuid(&self.id)?,
      portfolio_id:   decode_uuid(&self.portfolio_id)?,
      name:           self.name,
      description:    self.description,
      cover_photo_id: self.cover_photo_id.as_deref().map(decode_uuid).transpose()?,
      layout:         FolderLayout {
        columns:         self.columns,
        gap:             self.gap,
        show_captions:   self.show_captions,
        rounded_corners: self.rounded_corners,
      },
      created_at:     decode_dt(&self.created_at)?,
      updated_at:     decode_dt(&self.updated_at)?,
    })
  }
}

pub struct RawPhoto {
  pub id:         String,
  pub folder_id:  String,
  pub src:        String,
  pub alt:        String,
  pub caption:    String,
  pub asset_id:   String,
  pub sort_index: u32,
  pub created_at: String,
}

impl RawPhoto {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      folder_id:  row.get(1)?,
      src:        row.get(2)?,
      alt:        row.get(3)?,
      caption:    row.get(4)?,
      asset_id:   row.get(5)?,
      sort_index: row.get(6)?,
      created_at: row.get(7)?,
    })
  }

  pub fn into_photo(self) -> Result<Photo> {
    Ok(Photo {
      id:         decode_uuid(&self.id)?,
      folder_id:  decode_uuid(&self.folder_id)?,
      src:        self.src,
      alt:        self.alt,
      caption:    self.caption,
      asset_id:   self.asset_id,
      sort_index: self.sort_index,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub struct RawMembership {
  pub id:                             String,
  pub user_id:                        String,
  pub plan_id:                        String,
  pub status:                         String,
  pub start_date:                     String,
  pub end_date:                       Option<String>,
  pub external_subscription_id:       String,
  pub external_subscription_interval: String,
  pub created_at:                     String,
  pub updated_at:                     String,
}

impl RawMembership {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                             row.get(0)?,
      user_id:                        row.get(1)?,
      plan_id:                        row.get(2)?,
      status:                         row.get(3)?,
      start_date:                     row.get(4)?,
      end_date:                       row.get(5)?,
      external_subscription_id:       row.get(6)?,
      external_subscription_interval: row.get(7)?,
      created_at:                     row.get(8)?,
      updated_at:                     row.get(9)?,
    })
  }

  pub fn into_membership(self) -> Result<Membership> {
    Ok(Membership {
      id:                             decode_uuid(&self.id)?,
      user_id:                        decode_uuid(&self.user_id)?,
      plan_id:                        decode_uuid(&self.plan_id)?,
      status:                         self.status.parse()?,
      start_date:                     decode_dt(&self.start_date)?,
      end_date:                       self.end_date.as_deref().map(decode_dt).transpose()?,
      external_subscription_id:       self.external_subscription_id,
      external_subscription_interval: self.external_subscription_interval,
      created_at:                     decode_dt(&self.created_at)?,
      updated_at:                     decode_dt(&self.updated_at)?,
    })
  }
}

pub struct RawPlan {
  pub id:                  String,
  pub name:                String,
  pub price:               String,
  pub billing_cycle:       String,
  pub features:            String,
  pub is_popular:          bool,
  pub max_folders:         u32,
  pub custom_domain:       bool,
  pub advanced_analytics:  bool,
  pub external_product_id: String,
  pub created_at:          String,
  pub updated_at:          String,
}

impl RawPlan {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                  row.get(0)?,
      name:                row.get(1)?,
      price:               row.get(2)?,
      billing_cycle:       row.get(3)?,
      features:            row.get(4)?,
      is_popular:          row.get(5)?,
      max_folders:         row.get(6)?,
      custom_domain:       row.get(7)?,
      advanced_analytics:  row.get(8)?,
      external_product_id: row.get(9)?,
      created_at:          row.get(10)?,
      updated_at:          row.get(11)?,
    })
  }

  pub fn into_plan(self) -> Result<MembershipPlan> {
    Ok(MembershipPlan {
      id:                  decode_uuid(&self.id)?,
      name:                self.name,
      price:               decode_decimal(&self.price)?,
      billing_cycle:       self.billing_cycle.parse()?,
      features:            decode_list(&self.features)?,
      is_popular:          self.is_popular,
      max_folders:         self.max_folders,
      custom_domain:       self.custom_domain,
      advanced_analytics:  self.advanced_analytics,
      external_product_id: self.external_product_id,
      created_at:          decode_dt(&self.created_at)?,
      updated_at:          decode_dt(&self.updated_at)?,
    })
  }
}

pub struct RawSession {
  pub token_hash: String,
  pub user_id:    String,
  pub role:       String,
  pub created_at: String,
  pub expires_at: String,
}

impl RawSession {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      token_hash: row.get(0)?,
      user_id:    row.get(1)?,
      role:       row.get(2)?,
      created_at: row.get(3)?,
      expires_at: row.get(4)?,
    })
  }

  pub fn into_session(self) -> Result<SessionRecord> {
    Ok(SessionRecord {
      token_hash: self.token_hash,
      user_id:    decode_uuid(&self.user_id)?,
      role:       self.role.parse()?,
      created_at: decode_dt(&self.created_at)?,
      expires_at: decode_dt(&self.expires_at)?,
    })
  }
}
