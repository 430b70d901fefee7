//! The `{success, data, message}` body shared by every `/api/v1` response.

use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Envelope<T> {
  pub success: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub data:    Option<T>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub message: Option<String>,
}

impl<T: Serialize> Envelope<T> {
  pub fn ok(data: T) -> Json<Self> {
    Json(Self { success: true, data: Some(data), message: None })
  }
}

impl Envelope<()> {
  pub fn error(message: impl Into<String>) -> Json<Self> {
    Json(Self { success: false, data: None, message: Some(message.into()) })
  }
}

/// Handler result carrying an enveloped JSON body.
pub type ApiResult<T> = crate::error::Result<Json<Envelope<T>>>;
