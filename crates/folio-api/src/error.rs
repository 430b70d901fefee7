//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  extract::{
    multipart::{MultipartError, MultipartRejection},
    rejection::{JsonRejection, PathRejection, QueryRejection},
  },
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use folio_core::{ErrorKind, store::StoreError};
use thiserror::Error;

use crate::envelope::Envelope;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unauthorized")]
  Unauthorized,

  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("payload too large")]
  PayloadTooLarge,

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("internal error: {0}")]
  Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Classify a backend error. Domain errors keep their meaning; anything
  /// else is a persistence failure.
  pub fn from_store<E: StoreError>(e: E) -> Self {
    match e.domain() {
      Some(domain) => Self::from_domain(domain),
      None => Self::Store(Box::new(e)),
    }
  }

  fn from_domain(e: &folio_core::Error) -> Self {
    match e.kind() {
      ErrorKind::NotFound => Self::NotFound(e.to_string()),
      ErrorKind::Forbidden => Self::Forbidden(e.to_string()),
      ErrorKind::Invalid => Self::BadRequest(e.to_string()),
      ErrorKind::Internal => Self::Internal(e.to_string().into()),
    }
  }

  fn from_rejection(status: StatusCode, text: String) -> Self {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
      Self::PayloadTooLarge
    } else {
      Self::BadRequest(text)
    }
  }

  fn status(&self) -> StatusCode {
    match self {
      Self::Unauthorized => StatusCode::UNAUTHORIZED,
      Self::Forbidden(_) => StatusCode::FORBIDDEN,
      Self::NotFound(_) => StatusCode::NOT_FOUND,
      Self::BadRequest(_) => StatusCode::BAD_REQUEST,
      Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
      Self::Store(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl From<folio_core::Error> for ApiError {
  fn from(e: folio_core::Error) -> Self { Self::from_domain(&e) }
}

impl From<JsonRejection> for ApiError {
  fn from(r: JsonRejection) -> Self { Self::from_rejection(r.status(), r.body_text()) }
}

impl From<QueryRejection> for ApiError {
  fn from(r: QueryRejection) -> Self { Self::from_rejection(r.status(), r.body_text()) }
}

impl From<PathRejection> for ApiError {
  fn from(r: PathRejection) -> Self { Self::from_rejection(r.status(), r.body_text()) }
}

impl From<MultipartRejection> for ApiError {
  fn from(r: MultipartRejection) -> Self { Self::from_rejection(r.status(), r.body_text()) }
}

impl From<MultipartError> for ApiError {
  fn from(e: MultipartError) -> Self { Self::from_rejection(e.status(), e.body_text()) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let message = match &self {
      Self::Unauthorized => "unauthorized".to_owned(),
      Self::PayloadTooLarge => "payload too large".to_owned(),
      Self::Forbidden(m) | Self::NotFound(m) | Self::BadRequest(m) => m.clone(),
      Self::Store(_) | Self::Internal(_) => {
        tracing::error!(error = %self, "request failed");
        "internal server error".to_owned()
      }
    };

    let mut res = (status, Envelope::<()>::error(message)).into_response();
    if status == StatusCode::UNAUTHORIZED {
      res
        .headers_mut()
        .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
    }
    res
  }
}

pub type Result<T, E = ApiError> = std::result::Result<T, E>;
