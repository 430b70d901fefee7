//! Synchronous row-level queries.
//!
//! Every function takes a plain `&Connection` so it can run either directly on
//! the store's connection or inside a transaction (which derefs to one).

use chrono::{DateTime, Utc};
use folio_core::{
  membership::{Membership, MembershipPlan, MembershipQuery, PlanQuery},
  page::Page,
  portfolio::{Folder, Photo, Portfolio, Profile},
  user::{SessionRecord, User},
};
use rusqlite::{Connection, OptionalExtension as _, params, params_from_iter, types::Value};
use uuid::Uuid;

use crate::{
  Result,
  encode::{
    FOLDER_COLUMNS, MEMBERSHIP_COLUMNS, PHOTO_COLUMNS, PLAN_COLUMNS,
    PORTFOLIO_COLUMNS, PROFILE_COLUMNS, RawFolder, RawMembership, RawPhoto,
    RawPlan, RawPortfolio, RawProfile, RawSession, RawUser, SESSION_COLUMNS,
    USER_COLUMNS, encode_dt, encode_list, encode_uuid,
  },
};

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// `?first, ?first+1, …` for `count` positional parameters.
fn placeholders(first: usize, count: usize) -> String {
  (first..first + count)
    .map(|i| format!("?{i}"))
    .collect::<Vec<_>>()
    .join(", ")
}

fn uuid_values(ids: &[Uuid]) -> Vec<Value> {
  ids.iter().map(|id| Value::Text(encode_uuid(*id))).collect()
}

fn text_values(items: &[String]) -> Vec<Value> {
  items.iter().cloned().map(Value::Text).collect()
}

/// Escape `%`, `_` and `\` for use inside a `LIKE … ESCAPE '\'` pattern.
fn like_pattern(keyword: &str) -> String {
  let escaped = keyword
    .replace('\\', "\\\\")
    .replace('%', "\\%")
    .replace('_', "\\_");
  format!("%{escaped}%")
}

// ─── Users ───────────────────────────────────────────────────────────────────

pub fn find_user(conn: &Connection, id: Uuid) -> Result<Option<User>> {
  let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
  conn
    .query_row(&sql, params![encode_uuid(id)], RawUser::from_row)
    .optional()?
    .map(RawUser::into_user)
    .transpose()
}

pub fn find_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>> {
  let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1");
  conn
    .query_row(&sql, params![email], RawUser::from_row)
    .optional()?
    .map(RawUser::into_user)
    .transpose()
}

pub fn insert_user(conn: &Connection, user: &User) -> Result<()> {
  conn.execute(
    "INSERT INTO users (id, email, name, picture, role, created_at, updated_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    params![
      encode_uuid(user.id),
      user.email,
      user.name,
      user.picture,
      user.role.as_str(),
      encode_dt(user.created_at),
      encode_dt(user.updated_at),
    ],
  )?;
  Ok(())
}

// ─── Portfolios & profiles ───────────────────────────────────────────────────

pub fn portfolio_for_user(conn: &Connection, user_id: Uuid) -> Result<Option<Portfolio>> {
  let sql = format!("SELECT {PORTFOLIO_COLUMNS} FROM portfolios WHERE user_id = ?1");
  conn
    .query_row(&sql, params![encode_uuid(user_id)], RawPortfolio::from_row)
    .optional()?
    .map(RawPortfolio::into_portfolio)
    .transpose()
}

pub fn insert_portfolio(conn: &Connection, p: &Portfolio) -> Result<()> {
  conn.execute(
    "INSERT INTO portfolios (
       id, user_id, title, columns, gap, rounded_corners, show_captions,
       created_at, updated_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
    params![
      encode_uuid(p.id),
      encode_uuid(p.user_id),
      p.title,
      p.columns,
      p.gap,
      p.rounded_corners,
      p.show_captions,
      encode_dt(p.created_at),
      encode_dt(p.updated_at),
    ],
  )?;
  Ok(())
}

pub fn update_portfolio(conn: &Connection, p: &Portfolio) -> Result<()> {
  conn.execute(
    "UPDATE portfolios
        SET title = ?2, columns = ?3, gap = ?4, rounded_corners = ?5,
            show_captions = ?6, updated_at = ?7
      WHERE id = ?1",
    params![
      encode_uuid(p.id),
      p.title,
      p.columns,
      p.gap,
      p.rounded_corners,
      p.show_captions,
      encode_dt(p.updated_at),
    ],
  )?;
  Ok(())
}

pub fn find_profile(conn: &Connection, id: Uuid) -> Result<Option<Profile>> {
  let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = ?1");
  conn
    .query_row(&sql, params![encode_uuid(id)], RawProfile::from_row)
    .optional()?
    .map(RawProfile::into_profile)
    .transpose()
}

pub fn profile_for_portfolio(conn: &Connection, portfolio_id: Uuid) -> Result<Option<Profile>> {
  let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE portfolio_id = ?1");
  conn
    .query_row(&sql, params![encode_uuid(portfolio_id)], RawProfile::from_row)
    .optional()?
    .map(RawProfile::into_profile)
    .transpose()
}

pub fn insert_profile(conn: &Connection, p: &Profile) -> Result<()> {
  conn.execute(
    "INSERT INTO profiles (id, portfolio_id, name, title, bio, email, instagram, website)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    params![
      encode_uuid(p.id),
      encode_uuid(p.portfolio_id),
      p.name,
      p.title,
      p.bio,
      p.email,
      p.instagram,
      p.website,
    ],
  )?;
  Ok(())
}

pub fn update_profile(conn: &Connection, p: &Profile) -> Result<()> {
  conn.execute(
    "UPDATE profiles
        SET name = ?2, title = ?3, bio = ?4, email = ?5, instagram = ?6, website = ?7
      WHERE id = ?1",
    params![encode_uuid(p.id), p.name, p.title, p.bio, p.email, p.instagram, p.website],
  )?;
  Ok(())
}

// ─── Folders ─────────────────────────────────────────────────────────────────

pub fn folders_for_portfolio(conn: &Connection, portfolio_id: Uuid) -> Result<Vec<Folder>> {
  let sql = format!(
    "SELECT {FOLDER_COLUMNS} FROM folders WHERE portfolio_id = ?1 ORDER BY created_at, id"
  );
  let mut stmt = conn.prepare(&sql)?;
  let raws = stmt
    .query_map(params![encode_uuid(portfolio_id)], RawFolder::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawFolder::into_folder).collect()
}

pub fn find_folder(conn: &Connection, portfolio_id: Uuid, id: Uuid) -> Result<Option<Folder>> {
  let sql = format!("SELECT {FOLDER_COLUMNS} FROM folders WHERE id = ?1 AND portfolio_id = ?2");
  conn
    .query_row(
      &sql,
      params![encode_uuid(id), encode_uuid(portfolio_id)],
      RawFolder::from_row,
    )
    .optional()?
    .map(RawFolder::into_folder)
    .transpose()
}

pub fn insert_folder(conn: &Connection, f: &Folder) -> Result<()> {
  conn.execute(
    "INSERT INTO folders (
       id, portfolio_id, name, description, cover_photo_id,
       columns, gap, show_captions, rounded_corners, created_at, updated_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
    params![
      encode_uuid(f.id),
      encode_uuid(f.portfolio_id),
      f.name,
      f.description,
      f.cover_photo_id.map(encode_uuid),
      f.layout.columns,
      f.layout.gap,
      f.layout.show_captions,
      f.layout.rounded_corners,
      encode_dt(f.created_at),
      encode_dt(f.updated_at),
    ],
  )?;
  Ok(())
}

pub fn update_folder(conn: &Connection, f: &Folder) -> Result<()> {
  conn.execute(
    "UPDATE folders
        SET name = ?2, description = ?3, cover_photo_id = ?4, columns = ?5,
            gap = ?6, show_captions = ?7, rounded_corners = ?8, updated_at = ?9
      WHERE id = ?1",
    params![
      encode_uuid(f.id),
      f.name,
      f.description,
      f.cover_photo_id.map(encode_uuid),
      f.layout.columns,
      f.layout.gap,
      f.layout.show_captions,
      f.layout.rounded_corners,
      encode_dt(f.updated_at),
    ],
  )?;
  Ok(())
}

/// The subset of `ids` that are folders of `portfolio_id`.
pub fn owned_folder_ids(conn: &Connection, portfolio_id: Uuid, ids: &[Uuid]) -> Result<Vec<Uuid>> {
  if ids.is_empty() {
    return Ok(vec![]);
  }
  let sql = format!(
    "SELECT id FROM folders WHERE portfolio_id = ?1 AND id IN ({})",
    placeholders(2, ids.len())
  );
  let mut values = vec![Value::Text(encode_uuid(portfolio_id))];
  values.extend(uuid_values(ids));

  let mut stmt = conn.prepare(&sql)?;
  let raws = stmt
    .query_map(params_from_iter(values), |row| row.get::<_, String>(0))?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.iter().map(|s| crate::encode::decode_uuid(s)).collect()
}

pub fn delete_folders(conn: &Connection, ids: &[Uuid]) -> Result<usize> {
  if ids.is_empty() {
    return Ok(0);
  }
  let sql = format!("DELETE FROM folders WHERE id IN ({})", placeholders(1, ids.len()));
  Ok(conn.execute(&sql, params_from_iter(uuid_values(ids)))?)
}

// ─── Photos ──────────────────────────────────────────────────────────────────

fn query_photos(conn: &Connection, sql: &str, values: Vec<Value>) -> Result<Vec<Photo>> {
  let mut stmt = conn.prepare(sql)?;
  let raws = stmt
    .query_map(params_from_iter(values), RawPhoto::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawPhoto::into_photo).collect()
}

/// Photos with the given asset ids, regardless of owner.
pub fn photos_by_assets(conn: &Connection, asset_ids: &[String]) -> Result<Vec<Photo>> {
  if asset_ids.is_empty() {
    return Ok(vec![]);
  }
  let sql = format!(
    "SELECT {PHOTO_COLUMNS} FROM photos WHERE asset_id IN ({})",
    placeholders(1, asset_ids.len())
  );
  query_photos(conn, &sql, text_values(asset_ids))
}

/// Photos with the given asset ids that live in any folder of `portfolio_id`.
pub fn portfolio_photos_by_assets(
  conn: &Connection,
  portfolio_id: Uuid,
  asset_ids: &[String],
) -> Result<Vec<Photo>> {
  if asset_ids.is_empty() {
    return Ok(vec![]);
  }
  let sql = format!(
    "SELECT {PHOTO_COLUMNS} FROM photos
      WHERE folder_id IN (SELECT id FROM folders WHERE portfolio_id = ?1)
        AND asset_id IN ({})",
    placeholders(2, asset_ids.len())
  );
  let mut values = vec![Value::Text(encode_uuid(portfolio_id))];
  values.extend(text_values(asset_ids));
  query_photos(conn, &sql, values)
}

pub fn photos_in_folders(conn: &Connection, folder_ids: &[Uuid]) -> Result<Vec<Photo>> {
  if folder_ids.is_empty() {
    return Ok(vec![]);
  }
  let sql = format!(
    "SELECT {PHOTO_COLUMNS} FROM photos WHERE folder_id IN ({})
      ORDER BY folder_id, sort_index, created_at",
    placeholders(1, folder_ids.len())
  );
  query_photos(conn, &sql, uuid_values(folder_ids))
}

pub fn next_sort_index(conn: &Connection, folder_id: Uuid) -> Result<u32> {
  Ok(conn.query_row(
    "SELECT COALESCE(MAX(sort_index) + 1, 0) FROM photos WHERE folder_id = ?1",
    params![encode_uuid(folder_id)],
    |row| row.get(0),
  )?)
}

pub fn insert_photo(conn: &Connection, p: &Photo) -> Result<()> {
  conn.execute(
    "INSERT INTO photos (id, folder_id, src, alt, caption, asset_id, sort_index, created_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    params![
      encode_uuid(p.id),
      encode_uuid(p.folder_id),
      p.src,
      p.alt,
      p.caption,
      p.asset_id,
      p.sort_index,
      encode_dt(p.created_at),
    ],
  )?;
  Ok(())
}

pub fn update_photo(conn: &Connection, p: &Photo) -> Result<()> {
  conn.execute(
    "UPDATE photos SET folder_id = ?2, alt = ?3, caption = ?4, sort_index = ?5 WHERE id = ?1",
    params![encode_uuid(p.id), encode_uuid(p.folder_id), p.alt, p.caption, p.sort_index],
  )?;
  Ok(())
}

pub fn delete_photos(conn: &Connection, ids: &[Uuid]) -> Result<usize> {
  if ids.is_empty() {
    return Ok(0);
  }
  let sql = format!("DELETE FROM photos WHERE id IN ({})", placeholders(1, ids.len()));
  Ok(conn.execute(&sql, params_from_iter(uuid_values(ids)))?)
}

/// Unset folder covers that point at any of `photo_ids`.
pub fn clear_covers(conn: &Connection, photo_ids: &[Uuid]) -> Result<usize> {
  if photo_ids.is_empty() {
    return Ok(0);
  }
  let sql = format!(
    "UPDATE folders SET cover_photo_id = NULL WHERE cover_photo_id IN ({})",
    placeholders(1, photo_ids.len())
  );
  Ok(conn.execute(&sql, params_from_iter(uuid_values(photo_ids)))?)
}

// ─── Memberships ─────────────────────────────────────────────────────────────

pub fn find_membership(conn: &Connection, id: Uuid) -> Result<Option<Membership>> {
  let sql = format!("SELECT {MEMBERSHIP_COLUMNS} FROM memberships WHERE id = ?1");
  conn
    .query_row(&sql, params![encode_uuid(id)], RawMembership::from_row)
    .optional()?
    .map(RawMembership::into_membership)
    .transpose()
}

/// The user's most recently started active membership.
pub fn active_membership(conn: &Connection, user_id: Uuid) -> Result<Option<Membership>> {
  let sql = format!(
    "SELECT {MEMBERSHIP_COLUMNS} FROM memberships
      WHERE user_id = ?1 AND status = 'active'
      ORDER BY start_date DESC, id DESC LIMIT 1"
  );
  conn
    .query_row(&sql, params![encode_uuid(user_id)], RawMembership::from_row)
    .optional()?
    .map(RawMembership::into_membership)
    .transpose()
}

pub fn insert_membership(conn: &Connection, m: &Membership) -> Result<()> {
  conn.execute(
    "INSERT INTO memberships (
       id, user_id, plan_id, status, start_date, end_date,
       external_subscription_id, external_subscription_interval, created_at, updated_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
    params![
      encode_uuid(m.id),
      encode_uuid(m.user_id),
      encode_uuid(m.plan_id),
      m.status.as_str(),
      encode_dt(m.start_date),
      m.end_date.map(encode_dt),
      m.external_subscription_id,
      m.external_subscription_interval,
      encode_dt(m.created_at),
      encode_dt(m.updated_at),
    ],
  )?;
  Ok(())
}

pub fn update_membership(conn: &Connection, m: &Membership) -> Result<()> {
  conn.execute(
    "UPDATE memberships
        SET plan_id = ?2, status = ?3, start_date = ?4, end_date = ?5,
            external_subscription_id = ?6, external_subscription_interval = ?7,
            updated_at = ?8
      WHERE id = ?1",
    params![
      encode_uuid(m.id),
      encode_uuid(m.plan_id),
      m.status.as_str(),
      encode_dt(m.start_date),
      m.end_date.map(encode_dt),
      m.external_subscription_id,
      m.external_subscription_interval,
      encode_dt(m.updated_at),
    ],
  )?;
  Ok(())
}

pub fn delete_membership(conn: &Connection, id: Uuid) -> Result<bool> {
  let n = conn.execute("DELETE FROM memberships WHERE id = ?1", params![encode_uuid(id)])?;
  Ok(n > 0)
}

pub fn list_memberships(conn: &Connection, query: &MembershipQuery) -> Result<Page<Membership>> {
  let mut conds: Vec<String> = vec![];
  let mut values: Vec<Value> = vec![];

  if let Some(user_id) = query.user_id {
    values.push(Value::Text(encode_uuid(user_id)));
    conds.push(format!("user_id = ?{}", values.len()));
  }
  if let Some(plan_id) = query.plan_id {
    values.push(Value::Text(encode_uuid(plan_id)));
    conds.push(format!("plan_id = ?{}", values.len()));
  }
  if let Some(status) = query.status {
    values.push(Value::Text(status.as_str().to_owned()));
    conds.push(format!("status = ?{}", values.len()));
  }

  let where_clause = if conds.is_empty() {
    String::new()
  } else {
    format!("WHERE {}", conds.join(" AND "))
  };

  let total: i64 = conn.query_row(
    &format!("SELECT COUNT(*) FROM memberships {where_clause}"),
    params_from_iter(values.clone()),
    |row| row.get(0),
  )?;

  let request = query.page_request();
  let column = query.sort.unwrap_or_default().column();
  let order = query.order.unwrap_or_default().as_sql();
  let sql = format!(
    "SELECT {MEMBERSHIP_COLUMNS} FROM memberships {where_clause}
      ORDER BY {column} {order}, id {order}
      LIMIT {} OFFSET {}",
    request.size(),
    request.offset()
  );

  let mut stmt = conn.prepare(&sql)?;
  let raws = stmt
    .query_map(params_from_iter(values), RawMembership::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  let items = raws
    .into_iter()
    .map(RawMembership::into_membership)
    .collect::<Result<Vec<_>>>()?;

  Ok(Page::new(items, total.max(0) as u64, request))
}

// ─── Plans ───────────────────────────────────────────────────────────────────

pub fn find_plan(conn: &Connection, id: Uuid) -> Result<Option<MembershipPlan>> {
  let sql = format!("SELECT {PLAN_COLUMNS} FROM membership_plans WHERE id = ?1");
  conn
    .query_row(&sql, params![encode_uuid(id)], RawPlan::from_row)
    .optional()?
    .map(RawPlan::into_plan)
    .transpose()
}

pub fn insert_plan(conn: &Connection, p: &MembershipPlan) -> Result<()> {
  conn.execute(
    "INSERT INTO membership_plans (
       id, name, price, billing_cycle, features, is_popular, max_folders,
       custom_domain, advanced_analytics, external_product_id, created_at, updated_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
    params![
      encode_uuid(p.id),
      p.name,
      p.price.to_string(),
      p.billing_cycle.as_str(),
      encode_list(&p.features)?,
      p.is_popular,
      p.max_folders,
      p.custom_domain,
      p.advanced_analytics,
      p.external_product_id,
      encode_dt(p.created_at),
      encode_dt(p.updated_at),
    ],
  )?;
  Ok(())
}

pub fn update_plan(conn: &Connection, p: &MembershipPlan) -> Result<()> {
  conn.execute(
    "UPDATE membership_plans
        SET name = ?2, price = ?3, billing_cycle = ?4, features = ?5, is_popular = ?6,
            max_folders = ?7, custom_domain = ?8, advanced_analytics = ?9,
            external_product_id = ?10, updated_at = ?11
      WHERE id = ?1",
    params![
      encode_uuid(p.id),
      p.name,
      p.price.to_string(),
      p.billing_cycle.as_str(),
      encode_list(&p.features)?,
      p.is_popular,
      p.max_folders,
      p.custom_domain,
      p.advanced_analytics,
      p.external_product_id,
      encode_dt(p.updated_at),
    ],
  )?;
  Ok(())
}

pub fn delete_plan(conn: &Connection, id: Uuid) -> Result<bool> {
  let n = conn.execute("DELETE FROM membership_plans WHERE id = ?1", params![encode_uuid(id)])?;
  Ok(n > 0)
}

pub fn list_plans(conn: &Connection, query: &PlanQuery) -> Result<Page<MembershipPlan>> {
  let keyword = query
    .keyword
    .as_deref()
    .map(str::trim)
    .filter(|k| !k.is_empty())
    .map(like_pattern);

  let (where_clause, values) = match keyword {
    Some(pattern) => ("WHERE name LIKE ?1 ESCAPE '\\'", vec![Value::Text(pattern)]),
    None => ("", vec![]),
  };

  let total: i64 = conn.query_row(
    &format!("SELECT COUNT(*) FROM membership_plans {where_clause}"),
    params_from_iter(values.clone()),
    |row| row.get(0),
  )?;

  let request = query.page_request();
  let column = query.sort.unwrap_or_default().column();
  let order = query.order.unwrap_or_default().as_sql();
  let sql = format!(
    "SELECT {PLAN_COLUMNS} FROM membership_plans {where_clause}
      ORDER BY {column} {order}, id {order}
      LIMIT {} OFFSET {}",
    request.size(),
    request.offset()
  );

  let mut stmt = conn.prepare(&sql)?;
  let raws = stmt
    .query_map(params_from_iter(values), RawPlan::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  let items = raws
    .into_iter()
    .map(RawPlan::into_plan)
    .collect::<Result<Vec<_>>>()?;

  Ok(Page::new(items, total.max(0) as u64, request))
}

/// Folder quota of the user's active plan. `None` when unlimited or when the
/// plan row does not exist.
pub fn folder_quota(conn: &Connection, user_id: Uuid) -> Result<Option<u32>> {
  let quota: Option<u32> = conn
    .query_row(
      "SELECT p.max_folders
         FROM memberships m
         JOIN membership_plans p ON p.id = m.plan_id
        WHERE m.user_id = ?1 AND m.status = 'active'
        ORDER BY m.start_date DESC, m.id DESC
        LIMIT 1",
      params![encode_uuid(user_id)],
      |row| row.get(0),
    )
    .optional()?;
  Ok(quota.filter(|q| *q > 0))
}

// ─── Sessions ────────────────────────────────────────────────────────────────

pub fn insert_session(conn: &Connection, s: &SessionRecord) -> Result<()> {
  conn.execute(
    "INSERT INTO sessions (token_hash, user_id, role, created_at, expires_at)
     VALUES (?1, ?2, ?3, ?4, ?5)",
    params![
      s.token_hash,
      encode_uuid(s.user_id),
      s.role.as_str(),
      encode_dt(s.created_at),
      encode_dt(s.expires_at),
    ],
  )?;
  Ok(())
}

pub fn find_session(conn: &Connection, token_hash: &str) -> Result<Option<SessionRecord>> {
  let sql = format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE token_hash = ?1");
  conn
    .query_row(&sql, params![token_hash], RawSession::from_row)
    .optional()?
    .map(RawSession::into_session)
    .transpose()
}

pub fn delete_session(conn: &Connection, token_hash: &str) -> Result<bool> {
  let n = conn.execute("DELETE FROM sessions WHERE token_hash = ?1", params![token_hash])?;
  Ok(n > 0)
}

/// Timestamps compare correctly as text because every value is written by
/// [`encode_dt`] in UTC.
pub fn purge_sessions(conn: &Connection, now: DateTime<Utc>) -> Result<u64> {
  let n = conn.execute("DELETE FROM sessions WHERE expires_at <= ?1", params![encode_dt(now)])?;
  Ok(n as u64)
}
