//! The `FolioStore` trait.
//!
//! Implemented by storage backends (e.g. `folio-store-sqlite`). The HTTP layer
//! depends on this abstraction, not on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  membership::{
    Membership, MembershipPatch, MembershipPlan, MembershipQuery, NewMembership,
    NewPlan, PlanPatch, PlanQuery,
  },
  page::Page,
  portfolio::{Folder, NewPhoto, Photo},
  provision::ProvisioningDefaults,
  tree::{PortfolioSubmission, ReconcileOutcome},
  user::{Identity, SessionRecord, User, UserTree},
};

/// Backend errors expose the domain error they wrap, if any, so callers can
/// tell a rejected request from a failed database.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn domain(&self) -> Option<&crate::Error>;
}

/// Abstraction over a Folio storage backend.
///
/// Every method that writes more than one row does so atomically: either all
/// of its changes are committed or none are.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait FolioStore: Send + Sync {
  type Error: StoreError;

  /// Round-trip a trivial query; used by health checks.
  fn ping(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Return the user matching `identity.email`, creating the user and their
  /// default membership, portfolio, profile and seed folders if absent.
  fn provision(
    &self,
    identity: Identity,
    defaults: ProvisioningDefaults,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// The user with their nested portfolio and current membership.
  fn user_tree(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<UserTree>, Self::Error>> + Send + '_;

  // ── Portfolio ─────────────────────────────────────────────────────────

  /// Reconcile the owner's stored portfolio against a submitted tree.
  ///
  /// Runs as one transaction. Asset ids of removed photos are returned in the
  /// outcome rather than released here; releasing them is the caller's job
  /// once this call has returned successfully.
  fn reconcile(
    &self,
    owner: Uuid,
    submission: PortfolioSubmission,
  ) -> impl Future<Output = Result<ReconcileOutcome, Self::Error>> + Send + '_;

  /// A folder of the owner's portfolio, or `None` if it belongs to anyone
  /// else or does not exist.
  fn find_folder(
    &self,
    owner: Uuid,
    folder_id: Uuid,
  ) -> impl Future<Output = Result<Option<Folder>, Self::Error>> + Send + '_;

  /// Persist a freshly uploaded photo at the end of its folder.
  fn insert_photo(
    &self,
    photo: NewPhoto,
  ) -> impl Future<Output = Result<Photo, Self::Error>> + Send + '_;

  fn find_photos_by_asset_ids(
    &self,
    asset_ids: Vec<String>,
  ) -> impl Future<Output = Result<Vec<Photo>, Self::Error>> + Send + '_;

  /// Delete the owner's photos with the given asset ids; returns the asset
  /// ids that were actually removed.
  fn delete_photos(
    &self,
    owner: Uuid,
    asset_ids: Vec<String>,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + '_;

  // ── Memberships ───────────────────────────────────────────────────────

  fn list_memberships(
    &self,
    query: MembershipQuery,
  ) -> impl Future<Output = Result<Page<Membership>, Self::Error>> + Send + '_;

  fn get_membership(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Membership>, Self::Error>> + Send + '_;

  fn create_membership(
    &self,
    input: NewMembership,
  ) -> impl Future<Output = Result<Membership, Self::Error>> + Send + '_;

  /// Returns `None` if no membership has this id.
  fn update_membership(
    &self,
    id: Uuid,
    patch: MembershipPatch,
  ) -> impl Future<Output = Result<Option<Membership>, Self::Error>> + Send + '_;

  /// Returns whether a row was removed.
  fn delete_membership(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Plans ─────────────────────────────────────────────────────────────

  fn list_plans(
    &self,
    query: PlanQuery,
  ) -> impl Future<Output = Result<Page<MembershipPlan>, Self::Error>> + Send + '_;

  fn get_plan(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<MembershipPlan>, Self::Error>> + Send + '_;

  fn create_plan(
    &self,
    input: NewPlan,
  ) -> impl Future<Output = Result<MembershipPlan, Self::Error>> + Send + '_;

  fn update_plan(
    &self,
    id: Uuid,
    patch: PlanPatch,
  ) -> impl Future<Output = Result<Option<MembershipPlan>, Self::Error>> + Send + '_;

  fn delete_plan(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Sessions ──────────────────────────────────────────────────────────

  fn create_session(
    &self,
    session: SessionRecord,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn find_session(
    &self,
    token_hash: String,
  ) -> impl Future<Output = Result<Option<SessionRecord>, Self::Error>> + Send + '_;

  fn delete_session(
    &self,
    token_hash: String,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Remove sessions that expired at or before `now`; returns how many.
  fn purge_expired_sessions(
    &self,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;
}
