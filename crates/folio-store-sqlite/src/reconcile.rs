//! Reconciliation of a stored portfolio against a client-submitted tree.
//!
//! [`apply`] must run inside a transaction: it writes across five tables and
//! relies on the caller to roll everything back when it returns an error.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use folio_core::{
  Error as CoreError,
  portfolio::Photo,
  tree::{FolderSubmission, PortfolioSubmission, ReconcileOutcome},
};
use rusqlite::Connection;
use uuid::Uuid;

use crate::{Result, sql};

pub fn apply(
  conn: &Connection,
  owner: Uuid,
  submission: &PortfolioSubmission,
  now: DateTime<Utc>,
) -> Result<ReconcileOutcome> {
  let mut outcome = ReconcileOutcome::default();

  // Retained photos may be moved out of a folder deleted below; the foreign
  // key is only checked again at commit.
  conn.execute_batch("PRAGMA defer_foreign_keys = ON")?;

  // ── Portfolio header ──────────────────────────────────────────────────

  let mut portfolio =
    sql::portfolio_for_user(conn, owner)?.ok_or(CoreError::PortfolioMissing(owner))?;
  if let Some(id) = submission.portfolio.id {
    if id != portfolio.id {
      return Err(CoreError::PortfolioNotOwned(id).into());
    }
  }
  if submission.portfolio.apply_to(&mut portfolio) {
    portfolio.updated_at = now;
    sql::update_portfolio(conn, &portfolio)?;
  }

  // ── Profile ───────────────────────────────────────────────────────────

  let profile = match submission.profile.id {
    Some(id) => Some(
      sql::find_profile(conn, id)?
        .filter(|p| p.portfolio_id == portfolio.id)
        .ok_or(CoreError::ProfileNotOwned(id))?,
    ),
    None => sql::profile_for_portfolio(conn, portfolio.id)?,
  };
  if let Some(mut profile) = profile {
    if submission.profile.apply_to(&mut profile) {
      sql::update_profile(conn, &profile)?;
    }
  }

  // Every photo the submission positions, loaded while its current folder
  // still exists.
  let placed: Vec<String> = submission
    .folders
    .iter()
    .flat_map(|f| f.photos.iter())
    .map(|p| p.asset_id.clone())
    .filter(|a| !a.is_empty())
    .collect();
  let mut photos: HashMap<String, Photo> =
    sql::portfolio_photos_by_assets(conn, portfolio.id, &placed)?
      .into_iter()
      .map(|p| (p.asset_id.clone(), p))
      .collect();

  // ── Explicit deletions ────────────────────────────────────────────────

  let retained: HashSet<&str> = submission.retained_assets().into_iter().collect();
  let doomed_folders =
    sql::owned_folder_ids(conn, portfolio.id, &submission.deleted_folders)?;

  let mut doomed: Vec<Photo> =
    sql::portfolio_photos_by_assets(conn, portfolio.id, &submission.deleted_photos)?;
  doomed.extend(
    sql::photos_in_folders(conn, &doomed_folders)?
      .into_iter()
      .filter(|p| !retained.contains(p.asset_id.as_str())),
  );
  let mut seen = HashSet::new();
  doomed.retain(|p| seen.insert(p.id));

  let doomed_ids: Vec<Uuid> = doomed.iter().map(|p| p.id).collect();
  sql::clear_covers(conn, &doomed_ids)?;
  sql::delete_photos(conn, &doomed_ids)?;
  sql::delete_folders(conn, &doomed_folders)?;

  let mut renumber: Vec<Uuid> = doomed.iter().map(|p| p.folder_id).collect();
  for photo in doomed {
    photos.remove(&photo.asset_id);
    outcome.released_assets.push(photo.asset_id);
  }
  outcome.deleted_folders = doomed_folders;

  // ── Folders ───────────────────────────────────────────────────────────

  let mut existing: HashMap<Uuid, _> = sql::folders_for_portfolio(conn, portfolio.id)?
    .into_iter()
    .map(|f| (f.id, f))
    .collect();

  let submitted: Vec<_> = submission
    .folders
    .iter()
    .filter(|f| f.patch.id.is_none_or(|id| !submission.deleted_folders.contains(&id)))
    .collect();

  // A client id repeated within one submission creates one folder.
  let mut pending: HashSet<Uuid> = HashSet::new();
  let creating = submitted
    .iter()
    .filter(|f| f.patch.id.is_none_or(|id| !existing.contains_key(&id)))
    .filter(|f| f.patch.id.is_none_or(|id| pending.insert(id)))
    .count();
  if creating > 0 {
    if let Some(limit) = sql::folder_quota(conn, owner)? {
      if existing.len() + creating > limit as usize {
        return Err(CoreError::FolderQuotaExceeded { limit }.into());
      }
    }
  }

  let mut layout: Vec<(Uuid, &FolderSubmission)> = Vec::with_capacity(submitted.len());
  for entry in submitted {
    let folder_id = match entry.patch.id.and_then(|id| existing.get_mut(&id)) {
      Some(folder) => {
        if entry.patch.apply_to(folder) {
          folder.updated_at = now;
          sql::update_folder(conn, folder)?;
          outcome.updated_folders += 1;
        }
        folder.id
      }
      None => {
        let folder = entry.patch.to_new_folder(portfolio.id, now)?;
        sql::insert_folder(conn, &folder)?;
        outcome.created_folders.push(folder.id);
        let id = folder.id;
        existing.insert(id, folder);
        id
      }
    };
    layout.push((folder_id, entry));
  }

  // ── Photos ────────────────────────────────────────────────────────────

  // A photo listed under several folders lands in the last one.
  let mut target: HashMap<&str, Uuid> = HashMap::new();
  for (folder_id, entry) in &layout {
    for placement in &entry.photos {
      if photos.contains_key(&placement.asset_id) {
        target.insert(placement.asset_id.as_str(), *folder_id);
      }
    }
  }

  // Every surviving folder that gains, loses or reorders photos is renumbered.
  renumber.extend(layout.iter().map(|(id, _)| *id));
  renumber.extend(photos.values().map(|p| p.folder_id));
  renumber.sort_unstable();
  renumber.dedup();
  renumber.retain(|id| existing.contains_key(id));

  let mut stored: HashMap<Uuid, Vec<Photo>> = HashMap::new();
  for photo in sql::photos_in_folders(conn, &renumber)? {
    stored.entry(photo.folder_id).or_default().push(photo);
  }

  for folder_id in renumber {
    let mut position = 0u32;

    // Submitted photos first, in submitted order; repeats are ignored.
    let mut listed: HashSet<&str> = HashSet::new();
    let placements = layout
      .iter()
      .filter(|(id, _)| *id == folder_id)
      .flat_map(|(_, entry)| entry.photos.iter());
    for placement in placements {
      let asset_id = placement.asset_id.as_str();
      if target.get(asset_id) != Some(&folder_id) || !listed.insert(asset_id) {
        continue;
      }
      let Some(photo) = photos.get_mut(asset_id) else {
        continue;
      };
      let before = photo.clone();
      placement.place(photo, folder_id, position);
      position += 1;
      if *photo != before {
        sql::update_photo(conn, photo)?;
        outcome.reordered_photos += 1;
      }
    }

    // Then whatever the submission left in place, in its previous order.
    for mut photo in stored.remove(&folder_id).unwrap_or_default() {
      if target.contains_key(photo.asset_id.as_str()) {
        continue;
      }
      if photo.sort_index != position {
        photo.sort_index = position;
        sql::update_photo(conn, &photo)?;
        outcome.reordered_photos += 1;
      }
      position += 1;
    }
  }

  tracing::debug!(
    portfolio_id = %portfolio.id,
    created = outcome.created_folders.len(),
    updated = outcome.updated_folders,
    reordered = outcome.reordered_photos,
    released = outcome.released_assets.len(),
    "reconciled portfolio"
  );

  Ok(outcome)
}
