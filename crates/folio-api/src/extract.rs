//! Extractor wrappers whose rejections use the API error envelope.

use axum::{
  Json,
  extract::{FromRequest, FromRequestParts, Path, Query},
};

use crate::error::ApiError;

#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);
