//! Error types for `folio-assets`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid asset destination: {0:?}")]
  InvalidDestination(String),

  #[error("invalid asset id: {0:?}")]
  InvalidAssetId(String),

  #[error("unsupported or corrupt image: {0}")]
  Image(#[from] image::ImageError),

  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),

  #[error("image task failed: {0}")]
  Task(#[from] tokio::task::JoinError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
