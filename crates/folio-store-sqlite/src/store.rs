//! [`SqliteStore`]: the SQLite implementation of [`FolioStore`].

use std::{collections::HashMap, path::Path};

use chrono::{DateTime, Utc};
use folio_core::{
  Error as CoreError,
  membership::{
    Membership, MembershipPatch, MembershipPlan, MembershipQuery, NewMembership,
    NewPlan, PlanPatch, PlanQuery,
  },
  page::Page,
  portfolio::{Folder, FolderView, NewPhoto, Photo, PortfolioView},
  provision::{NewAccount, ProvisioningDefaults},
  store::FolioStore,
  tree::{PortfolioSubmission, ReconcileOutcome},
  user::{Identity, SessionRecord, User, UserTree},
};
use rusqlite::Connection;
use uuid::Uuid;

use crate::{Result, reconcile, schema::SCHEMA, sql};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Folio store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run `f` on the connection thread.
  async fn with_conn<R, F>(&self, f: F) -> Result<R>
  where
    F: FnOnce(&Connection) -> Result<R> + Send + 'static,
    R: Send + 'static,
  {
    self.conn.call(move |conn| Ok(f(conn))).await?
  }

  /// Run `f` inside one transaction, committing only if it succeeds.
  async fn with_tx<R, F>(&self, f: F) -> Result<R>
  where
    F: FnOnce(&Connection) -> Result<R> + Send + 'static,
    R: Send + 'static,
  {
    self.conn.call(move |conn| Ok(transact(conn, f))).await?
  }

  /// Execute raw SQL; lets tests install failure triggers.
  #[cfg(test)]
  pub(crate) async fn exec_raw(&self, sql: &'static str) -> Result<()> {
    self
      .with_conn(move |conn| {
        conn.execute_batch(sql)?;
        Ok(())
      })
      .await
  }
}

/// Dropping an uncommitted transaction rolls it back.
fn transact<R>(
  conn: &mut Connection,
  f: impl FnOnce(&Connection) -> Result<R>,
) -> Result<R> {
  let tx = conn.transaction()?;
  let out = f(&tx)?;
  tx.commit()?;
  Ok(out)
}

/// Assemble the nested portfolio for `user_id`, if one exists.
fn load_portfolio_view(conn: &Connection, user_id: Uuid) -> Result<Option<PortfolioView>> {
  let Some(portfolio) = sql::portfolio_for_user(conn, user_id)? else {
    return Ok(None);
  };
  let profile = sql::profile_for_portfolio(conn, portfolio.id)?;
  let folders = sql::folders_for_portfolio(conn, portfolio.id)?;

  let folder_ids: Vec<Uuid> = folders.iter().map(|f| f.id).collect();
  let mut photos: HashMap<Uuid, Vec<Photo>> = HashMap::new();
  for photo in sql::photos_in_folders(conn, &folder_ids)? {
    photos.entry(photo.folder_id).or_default().push(photo);
  }

  let folders = folders
    .into_iter()
    .map(|folder| {
      let photos = photos.remove(&folder.id).unwrap_or_default();
      FolderView { folder, photos }
    })
    .collect();

  Ok(Some(PortfolioView { portfolio, profile, folders }))
}

// ─── FolioStore impl ─────────────────────────────────────────────────────────

impl FolioStore for SqliteStore {
  type Error = crate::Error;

  async fn ping(&self) -> Result<()> {
    self
      .with_conn(|conn| {
        conn.query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(())
      })
      .await
  }

  // ── Users ─────────────────────────────────────────────────────────────

  async fn provision(
    &self,
    identity: Identity,
    defaults: ProvisioningDefaults,
  ) -> Result<User> {
    identity.validate()?;
    let account = NewAccount::build(&identity, &defaults, Utc::now());

    let (user, created) = self
      .with_tx(move |conn| {
        if let Some(existing) = sql::find_user_by_email(conn, &account.user.email)? {
          return Ok((existing, false));
        }
        sql::insert_user(conn, &account.user)?;
        sql::insert_membership(conn, &account.membership)?;
        sql::insert_portfolio(conn, &account.portfolio)?;
        sql::insert_profile(conn, &account.profile)?;
        for folder in &account.folders {
          sql::insert_folder(conn, folder)?;
        }
        Ok((account.user, true))
      })
      .await?;

    if created {
      tracing::info!(user_id = %user.id, email = %user.email, "provisioned new user");
    }
    Ok(user)
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    self.with_conn(move |conn| sql::find_user(conn, id)).await
  }

  async fn user_tree(&self, id: Uuid) -> Result<Option<UserTree>> {
    self
      .with_conn(move |conn| {
        let Some(user) = sql::find_user(conn, id)? else {
          return Ok(None);
        };
        let portfolio = load_portfolio_view(conn, id)?;
        let membership = sql::active_membership(conn, id)?;
        Ok(Some(UserTree { user, portfolio, membership }))
      })
      .await
  }

  // ── Portfolio ─────────────────────────────────────────────────────────

  async fn reconcile(
    &self,
    owner: Uuid,
    submission: PortfolioSubmission,
  ) -> Result<ReconcileOutcome> {
    let now = Utc::now();
    self
      .with_tx(move |conn| reconcile::apply(conn, owner, &submission, now))
      .await
  }

  async fn find_folder(&self, owner: Uuid, folder_id: Uuid) -> Result<Option<Folder>> {
    self
      .with_conn(move |conn| {
        let Some(portfolio) = sql::portfolio_for_user(conn, owner)? else {
          return Ok(None);
        };
        sql::find_folder(conn, portfolio.id, folder_id)
      })
      .await
  }

  async fn insert_photo(&self, input: NewPhoto) -> Result<Photo> {
    let now = Utc::now();
    self
      .with_tx(move |conn| {
        let photo = Photo {
          id:         Uuid::now_v7(),
          folder_id:  input.folder_id,
          src:        input.src,
          alt:        input.alt,
          caption:    input.caption,
          asset_id:   input.asset_id,
          sort_index: sql::next_sort_index(conn, input.folder_id)?,
          created_at: now,
        };
        sql::insert_photo(conn, &photo)?;
        Ok(photo)
      })
      .await
  }

  async fn find_photos_by_asset_ids(&self, asset_ids: Vec<String>) -> Result<Vec<Photo>> {
    self
      .with_conn(move |conn| sql::photos_by_assets(conn, &asset_ids))
      .await
  }

  async fn delete_photos(&self, owner: Uuid, asset_ids: Vec<String>) -> Result<Vec<String>> {
    self
      .with_tx(move |conn| {
        let portfolio = sql::portfolio_for_user(conn, owner)?
          .ok_or(CoreError::PortfolioMissing(owner))?;
        let photos = sql::portfolio_photos_by_assets(conn, portfolio.id, &asset_ids)?;
        let ids: Vec<Uuid> = photos.iter().map(|p| p.id).collect();
        sql::clear_covers(conn, &ids)?;
        sql::delete_photos(conn, &ids)?;
        Ok(photos.into_iter().map(|p| p.asset_id).collect())
      })
      .await
  }

  // ── Memberships ───────────────────────────────────────────────────────

  async fn list_memberships(&self, query: MembershipQuery) -> Result<Page<Membership>> {
    self
      .with_conn(move |conn| sql::list_memberships(conn, &query))
      .await
  }

  async fn get_membership(&self, id: Uuid) -> Result<Option<Membership>> {
    self.with_conn(move |conn| sql::find_membership(conn, id)).await
  }

  async fn create_membership(&self, input: NewMembership) -> Result<Membership> {
    let membership = input.into_membership(Utc::now())?;
    self
      .with_tx(move |conn| {
        if sql::find_user(conn, membership.user_id)?.is_none() {
          return Err(CoreError::UserNotFound(membership.user_id).into());
        }
        sql::insert_membership(conn, &membership)?;
        Ok(membership)
      })
      .await
  }

  async fn update_membership(
    &self,
    id: Uuid,
    patch: MembershipPatch,
  ) -> Result<Option<Membership>> {
    let now = Utc::now();
    self
      .with_tx(move |conn| {
        let Some(mut membership) = sql::find_membership(conn, id)? else {
          return Ok(None);
        };
        if patch.apply_to(&mut membership) {
          if membership.end_date.is_some_and(|end| end < membership.start_date) {
            return Err(CoreError::Validation("end_date precedes start_date".into()).into());
          }
          membership.updated_at = now;
          sql::update_membership(conn, &membership)?;
        }
        Ok(Some(membership))
      })
      .await
  }

  async fn delete_membership(&self, id: Uuid) -> Result<bool> {
    self.with_conn(move |conn| sql::delete_membership(conn, id)).await
  }

  // ── Plans ─────────────────────────────────────────────────────────────

  async fn list_plans(&self, query: PlanQuery) -> Result<Page<MembershipPlan>> {
    self.with_conn(move |conn| sql::list_plans(conn, &query)).await
  }

  async fn get_plan(&self, id: Uuid) -> Result<Option<MembershipPlan>> {
    self.with_conn(move |conn| sql::find_plan(conn, id)).await
  }

  async fn create_plan(&self, input: NewPlan) -> Result<MembershipPlan> {
    let plan = input.into_plan(Utc::now())?;
    self
      .with_conn(move |conn| {
        sql::insert_plan(conn, &plan)?;
        Ok(plan)
      })
      .await
  }

  async fn update_plan(&self, id: Uuid, patch: PlanPatch) -> Result<Option<MembershipPlan>> {
    let now = Utc::now();
    self
      .with_tx(move |conn| {
        let Some(mut plan) = sql::find_plan(conn, id)? else {
          return Ok(None);
        };
        if patch.apply_to(&mut plan)? {
          plan.updated_at = now;
          sql::update_plan(conn, &plan)?;
        }
        Ok(Some(plan))
      })
      .await
  }

  async fn delete_plan(&self, id: Uuid) -> Result<bool> {
    self.with_conn(move |conn| sql::delete_plan(conn, id)).await
  }

  // ── Sessions ──────────────────────────────────────────────────────────

  async fn create_session(&self, session: SessionRecord) -> Result<()> {
    self
      .with_conn(move |conn| sql::insert_session(conn, &session))
      .await
  }

  async fn find_session(&self, token_hash: String) -> Result<Option<SessionRecord>> {
    self
      .with_conn(move |conn| sql::find_session(conn, &token_hash))
      .await
  }

  async fn delete_session(&self, token_hash: String) -> Result<bool> {
    self
      .with_conn(move |conn| sql::delete_session(conn, &token_hash))
      .await
  }

  async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64> {
    let purged = self
      .with_conn(move |conn| sql::purge_sessions(conn, now))
      .await?;
    if purged > 0 {
      tracing::debug!(purged, "removed expired sessions");
    }
    Ok(purged)
  }
}
