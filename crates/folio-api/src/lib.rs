//! JSON REST API for Folio.
//!
//! Exposes an axum [`Router`] backed by any [`FolioStore`] and
//! [`ObjectStore`]. TLS, static asset serving and request tracing are the
//! caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = folio_api::router(state).layer(TraceLayer::new_for_http());
//! ```

pub mod auth;
pub mod envelope;
pub mod error;
pub mod extract;
pub mod health;
pub mod memberships;
pub mod photos;
pub mod plans;
pub mod portfolios;
pub mod session;
pub mod users;

use std::sync::Arc;

use axum::{
  Router,
  extract::DefaultBodyLimit,
  routing::{get, patch, post},
};
use folio_assets::AssetJanitor;
use folio_core::{assets::ObjectStore, provision::ProvisioningDefaults, store::FolioStore};

pub use error::ApiError;

/// Largest request body accepted when none is configured.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Runtime settings the handlers need.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  /// Prefix under which uploads are stored, e.g. `folio`.
  pub upload_base_path:     String,
  /// Argon2 PHC hash of the identity-bridge secret.
  pub identity_secret_hash: String,
  pub session_ttl:          chrono::Duration,
  pub provisioning:         ProvisioningDefaults,
  pub max_upload_bytes:     usize,
}

/// Shared handler state.
pub struct AppState<S, O> {
  pub store:   Arc<S>,
  pub objects: Arc<O>,
  pub janitor: AssetJanitor,
  pub config:  Arc<ApiConfig>,
}

// Derived `Clone` would require `S: Clone` and `O: Clone`.
impl<S, O> Clone for AppState<S, O> {
  fn clone(&self) -> Self {
    Self {
      store:   self.store.clone(),
      objects: self.objects.clone(),
      janitor: self.janitor.clone(),
      config:  self.config.clone(),
    }
  }
}

/// Build the fully-materialised router.
///
/// Probes live at the root; everything else under `/api/v1`.
pub fn router<S, O>(state: AppState<S, O>) -> Router<()>
where
  S: FolioStore + 'static,
  O: ObjectStore + 'static,
{
  let body_limit = state.config.max_upload_bytes;

  let api = Router::new()
    // Auth
    .route("/auth/login", post(auth::login::<S, O>))
    .route("/auth/logout", post(auth::logout::<S, O>))
    // Users
    .route("/users/me", get(users::me::<S, O>))
    // Portfolio tree
    .route("/portfolios", patch(portfolios::reconcile::<S, O>))
    // Photos
    .route("/photos", post(photos::upload::<S, O>).delete(photos::remove::<S, O>))
    // Memberships
    .route(
      "/memberships",
      get(memberships::list::<S, O>).post(memberships::create::<S, O>),
    )
    .route(
      "/memberships/{id}",
      get(memberships::get_one::<S, O>)
        .put(memberships::update::<S, O>)
        .delete(memberships::delete::<S, O>),
    )
    // Plans
    .route("/membership-plans", get(plans::list::<S, O>).post(plans::create::<S, O>))
    .route(
      "/membership-plans/{id}",
      get(plans::get_one::<S, O>)
        .put(plans::update::<S, O>)
        .delete(plans::delete::<S, O>),
    );

  Router::new()
    .route("/ping", get(health::ping))
    .route("/health", get(health::health::<S, O>))
    .nest("/api/v1", api)
    .layer(DefaultBodyLimit::max(body_limit))
    .with_state(state)
}

#[cfg(test)]
mod tests;
