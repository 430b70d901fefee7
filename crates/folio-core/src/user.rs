//! Users, verified identities and sessions.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  membership::Membership,
  portfolio::PortfolioView,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Admin,
  User,
}

impl Role {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Admin => "admin",
      Self::User => "user",
    }
  }
}

impl FromStr for Role {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "admin" => Ok(Self::Admin),
      "user" => Ok(Self::User),
      other => Err(Error::UnknownVariant { kind: "role", value: other.to_owned() }),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub id:         Uuid,
  pub email:      String,
  pub name:       String,
  pub picture:    String,
  pub role:       Role,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// An identity asserted by the external identity provider. Users are matched
/// on `email`.
#[derive(Debug, Clone, Deserialize)]
pub struct Identity {
  pub email:   String,
  pub name:    String,
  #[serde(default)]
  pub picture: String,
}

impl Identity {
  pub fn validate(&self) -> Result<()> {
    let email = self.email.trim();
    if email.is_empty() || !email.contains('@') {
      return Err(Error::Validation(format!("invalid email: {:?}", self.email)));
    }
    if self.name.trim().is_empty() {
      return Err(Error::Validation("name is required".into()));
    }
    Ok(())
  }
}

// ─── Sessions ────────────────────────────────────────────────────────────────

/// A stored session. The bearer token itself is never persisted; only its
/// SHA-256 digest is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
  pub token_hash: String,
  pub user_id:    Uuid,
  pub role:       Role,
  pub created_at: DateTime<Utc>,
  pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
  pub fn is_expired(&self, now: DateTime<Utc>) -> bool { self.expires_at <= now }
}

// ─── Read model ──────────────────────────────────────────────────────────────

/// A user together with everything they own, as returned by `/users/me`.
#[derive(Debug, Clone, Serialize)]
pub struct UserTree {
  #[serde(flatten)]
  pub user:       User,
  pub portfolio:  Option<PortfolioView>,
  /// The most recent active membership, if any.
  pub membership: Option<Membership>,
}
