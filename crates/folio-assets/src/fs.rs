//! [`FsObjectStore`]: an [`ObjectStore`] backed by a local directory.
//!
//! An asset id is `<destination>/<uuid>`; the file lives at
//! `<root>/<asset id>.jpg` and is served at `<base_url>/<asset id>.jpg`.

use std::{io::ErrorKind, path::PathBuf};

use folio_core::assets::{ObjectStore, StoredAsset};
use uuid::Uuid;

use crate::{Error, Result};

const EXTENSION: &str = "jpg";

#[derive(Debug, Clone)]
pub struct FsObjectStore {
  root:     PathBuf,
  base_url: String,
}

impl FsObjectStore {
  pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
    let base_url = base_url.into().trim_end_matches('/').to_owned();
    Self { root: root.into(), base_url }
  }

  fn path_for(&self, asset_id: &str) -> PathBuf {
    self.root.join(format!("{asset_id}.{EXTENSION}"))
  }

  fn url_for(&self, asset_id: &str) -> String {
    format!("{}/{asset_id}.{EXTENSION}", self.base_url)
  }
}

/// A relative path made only of plain segments, so it cannot leave the root.
fn is_safe_key(key: &str) -> bool {
  !key.is_empty()
    && !key.contains('\\')
    && key.split('/').all(|seg| {
      !seg.is_empty() && seg != "." && seg != ".." && !seg.contains(':')
    })
}

impl ObjectStore for FsObjectStore {
  type Error = Error;

  async fn upload(&self, bytes: Vec<u8>, destination: String) -> Result<StoredAsset> {
    let destination = destination.trim_matches('/');
    if !is_safe_key(destination) {
      return Err(Error::InvalidDestination(destination.to_owned()));
    }

    let asset_id = format!("{destination}/{}", Uuid::now_v7());
    let path = self.path_for(&asset_id);
    if let Some(parent) = path.parent() {
      tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&path, &bytes).await?;

    tracing::debug!(%asset_id, bytes = bytes.len(), "stored asset");
    Ok(StoredAsset { url: self.url_for(&asset_id), asset_id })
  }

  async fn delete_by_asset_ids(&self, asset_ids: Vec<String>) -> Result<()> {
    let mut first_error = None;
    for asset_id in asset_ids {
      if !is_safe_key(&asset_id) {
        first_error.get_or_insert(Error::InvalidAssetId(asset_id));
        continue;
      }
      match tokio::fs::remove_file(self.path_for(&asset_id)).await {
        Ok(()) => tracing::debug!(%asset_id, "deleted asset"),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => {
          first_error.get_or_insert(Error::Io(e));
        }
      }
    }
    first_error.map_or(Ok(()), Err)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn store(dir: &tempfile::TempDir) -> FsObjectStore {
    FsObjectStore::new(dir.path(), "http://localhost:3400/assets/")
  }

  #[tokio::test]
  async fn upload_writes_under_destination() {
    let dir = tempfile::tempdir().unwrap();
    let s = store(&dir);

    let asset = s
      .upload(b"jpeg bytes".to_vec(), "folio/portfolios/u1".into())
      .await
      .unwrap();
    assert!(asset.asset_id.starts_with("folio/portfolios/u1/"));
    assert_eq!(
      asset.url,
      format!("http://localhost:3400/assets/{}.jpg", asset.asset_id)
    );

    let on_disk = std::fs::read(dir.path().join(format!("{}.jpg", asset.asset_id))).unwrap();
    assert_eq!(on_disk, b"jpeg bytes");
  }

  #[tokio::test]
  async fn upload_rejects_escaping_destinations() {
    let dir = tempfile::tempdir().unwrap();
    let s = store(&dir);

    for bad in ["", "../outside", "a/../../b", "a//b", "c:\\temp"] {
      let err = s.upload(vec![1], bad.into()).await.unwrap_err();
      assert!(matches!(err, Error::InvalidDestination(_)), "{bad:?}");
    }
  }

  #[tokio::test]
  async fn delete_removes_files_and_ignores_unknown_ids() {
    let dir = tempfile::tempdir().unwrap();
    let s = store(&dir);
    let asset = s.upload(vec![1, 2, 3], "p".into()).await.unwrap();
    let path = dir.path().join(format!("{}.jpg", asset.asset_id));
    assert!(path.exists());

    s.delete_by_asset_ids(vec![asset.asset_id.clone(), "p/never-existed".into()])
      .await
      .unwrap();
    assert!(!path.exists());
  }

  #[tokio::test]
  async fn delete_reports_invalid_ids_but_processes_the_rest() {
    let dir = tempfile::tempdir().unwrap();
    let s = store(&dir);
    let asset = s.upload(vec![1], "p".into()).await.unwrap();

    let err = s
      .delete_by_asset_ids(vec!["../escape".into(), asset.asset_id.clone()])
      .await
      .unwrap_err();
    assert!(matches!(err, Error::InvalidAssetId(_)));
    assert!(!dir.path().join(format!("{}.jpg", asset.asset_id)).exists());
  }
}
