//! [`AssetJanitor`]: best-effort release of assets whose rows are gone.
//!
//! Callers hand over asset ids only after the transaction that deleted the
//! rows has committed. Deletion runs on a background task; its outcome is
//! logged and never reported back.

use std::sync::Arc;

use folio_core::assets::ObjectStore;
use tokio::{sync::mpsc, task::JoinHandle};

/// Handle to the janitor task. Cloning shares the same task; the task exits
/// once every handle has been dropped and the queue is drained.
#[derive(Debug, Clone)]
pub struct AssetJanitor {
  tx: mpsc::UnboundedSender<Vec<String>>,
}

impl AssetJanitor {
  /// Start the janitor task on the current runtime.
  pub fn spawn<O>(objects: Arc<O>) -> (Self, JoinHandle<()>)
  where
    O: ObjectStore + 'static,
  {
    let (tx, mut rx) = mpsc::unbounded_channel::<Vec<String>>();

    let handle = tokio::spawn(async move {
      while let Some(asset_ids) = rx.recv().await {
        let count = asset_ids.len();
        match objects.delete_by_asset_ids(asset_ids.clone()).await {
          Ok(()) => tracing::debug!(count, "released assets"),
          Err(e) => tracing::warn!(?asset_ids, error = %e, "failed to release assets"),
        }
      }
      tracing::debug!("asset janitor stopped");
    });

    (Self { tx }, handle)
  }

  /// Queue `asset_ids` for deletion. Never blocks.
  pub fn release(&self, asset_ids: Vec<String>) {
    if asset_ids.is_empty() {
      return;
    }
    if let Err(mpsc::error::SendError(asset_ids)) = self.tx.send(asset_ids) {
      tracing::warn!(?asset_ids, "asset janitor is not running; assets left in place");
    }
  }
}

#[cfg(test)]
mod tests {
  use std::{io, sync::Mutex};

  use folio_core::assets::StoredAsset;

  use super::*;

  #[derive(Default)]
  struct Recording {
    seen:    Mutex<Vec<String>>,
    fail_on: Option<&'static str>,
  }

  impl ObjectStore for Recording {
    type Error = io::Error;

    async fn upload(&self, _bytes: Vec<u8>, _destination: String) -> io::Result<StoredAsset> {
      Err(io::Error::other("not used"))
    }

    async fn delete_by_asset_ids(&self, asset_ids: Vec<String>) -> io::Result<()> {
      let fail = self.fail_on.is_some_and(|f| asset_ids.iter().any(|a| a == f));
      self.seen.lock().unwrap().extend(asset_ids);
      if fail {
        return Err(io::Error::other("object store unavailable"));
      }
      Ok(())
    }
  }

  #[tokio::test]
  async fn delivers_released_ids() {
    let objects = Arc::new(Recording::default());
    let (janitor, handle) = AssetJanitor::spawn(objects.clone());

    janitor.release(vec!["a".into(), "b".into()]);
    janitor.release(vec![]);
    janitor.clone().release(vec!["c".into()]);
    drop(janitor);
    handle.await.unwrap();

    assert_eq!(*objects.seen.lock().unwrap(), ["a", "b", "c"]);
  }

  #[tokio::test]
  async fn survives_a_failing_object_store() {
    let objects = Arc::new(Recording { fail_on: Some("bad"), ..Default::default() });
    let (janitor, handle) = AssetJanitor::spawn(objects.clone());

    janitor.release(vec!["bad".into()]);
    janitor.release(vec!["good".into()]);
    drop(janitor);
    handle.await.unwrap();

    assert_eq!(*objects.seen.lock().unwrap(), ["bad", "good"]);
  }
}
