//! Error types for `folio-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("user not found: {0}")]
  UserNotFound(Uuid),

  #[error("no portfolio exists for user {0}")]
  PortfolioMissing(Uuid),

  #[error("portfolio {0} does not belong to the caller")]
  PortfolioNotOwned(Uuid),

  #[error("profile {0} does not belong to the caller's portfolio")]
  ProfileNotOwned(Uuid),

  #[error("folder {0} does not belong to the caller's portfolio")]
  FolderNotOwned(Uuid),

  #[error("membership not found: {0}")]
  MembershipNotFound(Uuid),

  #[error("membership plan not found: {0}")]
  PlanNotFound(Uuid),

  #[error("folder limit of {limit} reached for the current plan")]
  FolderQuotaExceeded { limit: u32 },

  #[error("invalid input: {0}")]
  Validation(String),

  #[error("unknown {kind} value: {value:?}")]
  UnknownVariant { kind: &'static str, value: String },

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

/// Coarse classification used by the HTTP layer to pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  NotFound,
  Forbidden,
  Invalid,
  Internal,
}

impl Error {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::UserNotFound(_)
      | Self::PortfolioMissing(_)
      | Self::MembershipNotFound(_)
      | Self::PlanNotFound(_) => ErrorKind::NotFound,
      Self::PortfolioNotOwned(_)
      | Self::ProfileNotOwned(_)
      | Self::FolderNotOwned(_)
      | Self::FolderQuotaExceeded { .. } => ErrorKind::Forbidden,
      Self::Validation(_) => ErrorKind::Invalid,
      Self::UnknownVariant { .. } | Self::Serialization(_) => ErrorKind::Internal,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
