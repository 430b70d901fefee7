//! The `ObjectStore` trait: where uploaded image binaries live.

use std::future::Future;

use serde::Serialize;

/// The address and identifier an object store assigns to an upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredAsset {
  /// Publicly reachable URL of the asset.
  pub url:      String,
  /// Opaque identifier used to address the asset later.
  #[serde(rename = "public_id")]
  pub asset_id: String,
}

/// Abstraction over a binary asset store.
///
/// Deletion outcomes are informational only: the relational state never waits
/// on, or rolls back because of, an asset deletion.
pub trait ObjectStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Store `bytes` under the logical `destination` prefix.
  fn upload(
    &self,
    bytes: Vec<u8>,
    destination: String,
  ) -> impl Future<Output = Result<StoredAsset, Self::Error>> + Send + '_;

  /// Remove every listed asset. Unknown ids are not an error.
  fn delete_by_asset_ids(
    &self,
    asset_ids: Vec<String>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
