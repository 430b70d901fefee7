//! Wiring for the Folio HTTP server.
//!
//! The binary in `main.rs` loads a [`ServerConfig`], opens the stores and
//! hands them to [`app`].

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use axum::Router;
use chrono::Utc;
use folio_api::{ApiConfig, AppState};
use folio_core::{assets::ObjectStore, provision::ProvisioningDefaults, store::FolioStore};
use serde::Deserialize;
use tokio::task::JoinHandle;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use uuid::Uuid;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` layered
/// under `FOLIO_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                   String,
  #[serde(default = "default_port")]
  pub port:                   u16,
  pub store_path:             PathBuf,
  /// Directory uploaded images are written to and served from.
  pub asset_root:             PathBuf,
  /// Public URL under which `asset_root` is reachable, e.g.
  /// `http://localhost:3400/assets`.
  pub asset_base_url:         String,
  #[serde(default = "default_upload_base_path")]
  pub upload_base_path:       String,
  pub free_plan_id:           Uuid,
  /// Argon2 PHC hash of the identity-bridge secret.
  pub identity_secret_hash:   String,
  #[serde(default = "default_session_ttl_hours")]
  pub session_ttl_hours:      u32,
  #[serde(default = "default_max_upload_bytes")]
  pub max_upload_bytes:       usize,
  #[serde(default = "default_session_purge_secs")]
  pub session_purge_secs:     u64,
}

fn default_host() -> String { "127.0.0.1".into() }
fn default_port() -> u16 { 3400 }
fn default_upload_base_path() -> String { "folio".into() }
fn default_session_ttl_hours() -> u32 { 24 * 7 }
fn default_max_upload_bytes() -> usize { folio_api::DEFAULT_MAX_UPLOAD_BYTES }
fn default_session_purge_secs() -> u64 { 60 * 60 }

impl ServerConfig {
  pub fn api_config(&self) -> ApiConfig {
    ApiConfig {
      upload_base_path:     self.upload_base_path.clone(),
      identity_secret_hash: self.identity_secret_hash.clone(),
      session_ttl:          chrono::Duration::hours(i64::from(self.session_ttl_hours)),
      provisioning:         ProvisioningDefaults { free_plan_id: self.free_plan_id },
      max_upload_bytes:     self.max_upload_bytes,
    }
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Application ──────────────────────────────────────────────────────────────

/// The API router plus static asset serving, CORS and request tracing.
pub fn app<S, O>(state: AppState<S, O>, asset_root: &Path) -> Router
where
  S: FolioStore + 'static,
  O: ObjectStore + 'static,
{
  folio_api::router(state)
    .nest_service("/assets", ServeDir::new(asset_root))
    .layer(CorsLayer::permissive())
    .layer(TraceLayer::new_for_http())
}

/// Periodically delete expired sessions from `store`.
pub fn spawn_session_purger<S>(store: Arc<S>, every: Duration) -> JoinHandle<()>
where
  S: FolioStore + 'static,
{
  tokio::spawn(async move {
    let mut ticker = tokio::time::interval(every);
    loop {
      ticker.tick().await;
      match store.purge_expired_sessions(Utc::now()).await {
        Ok(0) => {}
        Ok(purged) => tracing::info!(purged, "purged expired sessions"),
        Err(e) => tracing::warn!(error = %e, "failed to purge expired sessions"),
      }
    }
  })
}

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use folio_assets::{AssetJanitor, FsObjectStore};
  use folio_core::user::{Identity, Role, SessionRecord};
  use folio_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  use super::*;

  const MINIMAL: &str = r#"
    store_path           = "~/folio.db"
    asset_root           = "/var/lib/folio/assets"
    asset_base_url       = "http://localhost:3400/assets"
    free_plan_id         = "0190f1c2-7a3e-7c41-9a55-3f0d2c9e8b11"
    identity_secret_hash = "$argon2id$v=19$m=19456,t=2,p=1$c2FsdHNhbHQ$aGFzaA"
  "#;

  fn parse(toml: &str) -> ServerConfig {
    config::Config::builder()
      .add_source(config::File::from_str(toml, config::FileFormat::Toml))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap()
  }

  #[test]
  fn config_defaults() {
    let cfg = parse(MINIMAL);
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.port, 3400);
    assert_eq!(cfg.upload_base_path, "folio");
    assert_eq!(cfg.session_ttl_hours, 168);

    let api = cfg.api_config();
    assert_eq!(api.session_ttl, chrono::Duration::days(7));
    assert_eq!(api.provisioning.free_plan_id, cfg.free_plan_id);
    assert_eq!(api.max_upload_bytes, folio_api::DEFAULT_MAX_UPLOAD_BYTES);
  }

  #[test]
  fn tilde_expands_to_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(expand_tilde(Path::new("~/folio.db")), PathBuf::from(home).join("folio.db"));
    assert_eq!(expand_tilde(Path::new("/tmp/folio.db")), PathBuf::from("/tmp/folio.db"));
  }

  #[tokio::test]
  async fn serves_api_and_assets() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("folio")).unwrap();
    std::fs::write(dir.path().join("folio/hill.jpg"), b"jpeg").unwrap();

    let mut cfg = parse(MINIMAL);
    cfg.asset_root = dir.path().to_path_buf();

    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let objects = Arc::new(FsObjectStore::new(&cfg.asset_root, cfg.asset_base_url.clone()));
    let (janitor, _handle) = AssetJanitor::spawn(objects.clone());
    let state = AppState { store, objects, janitor, config: Arc::new(cfg.api_config()) };
    let app = app(state, &cfg.asset_root);

    let resp = app
      .clone()
      .oneshot(
        Request::builder()
          .uri("/ping")
          .header(header::ORIGIN, "http://example.com")
          .body(Body::empty())
          .unwrap(),
      )
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");

    let resp = app
      .oneshot(Request::builder().uri("/assets/folio/hill.jpg").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"jpeg");
  }

  #[tokio::test]
  async fn purger_removes_expired_sessions() {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let user = store
      .provision(
        Identity {
          email:   "ada@example.com".into(),
          name:    "Ada".into(),
          picture: String::new(),
        },
        ProvisioningDefaults { free_plan_id: Uuid::now_v7() },
      )
      .await
      .unwrap();

    let now = Utc::now();
    store
      .create_session(SessionRecord {
        token_hash: "stale".into(),
        user_id:    user.id,
        role:       Role::User,
        created_at: now - chrono::Duration::hours(2),
        expires_at: now - chrono::Duration::hours(1),
      })
      .await
      .unwrap();

    let handle = spawn_session_purger(store.clone(), Duration::from_millis(10));
    for _ in 0..100 {
      if store.find_session("stale".into()).await.unwrap().is_none() {
        break;
      }
      tokio::time::sleep(Duration::from_millis(10)).await;
    }
    handle.abort();

    assert!(store.find_session("stale".into()).await.unwrap().is_none());
  }
}
