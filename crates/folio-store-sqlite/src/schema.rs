//! SQL schema for the Folio SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    id          TEXT PRIMARY KEY,
    email       TEXT NOT NULL UNIQUE,
    name        TEXT NOT NULL,
    picture     TEXT NOT NULL DEFAULT '',
    role        TEXT NOT NULL,             -- 'admin' | 'user'
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS membership_plans (
    id                  TEXT PRIMARY KEY,
    name                TEXT NOT NULL,
    price               TEXT NOT NULL,     -- exact decimal, canonical string
    billing_cycle       TEXT NOT NULL,
    features            TEXT NOT NULL DEFAULT '[]',
    is_popular          INTEGER NOT NULL DEFAULT 0,
    max_folders         INTEGER NOT NULL DEFAULT 0,
    custom_domain       INTEGER NOT NULL DEFAULT 0,
    advanced_analytics  INTEGER NOT NULL DEFAULT 0,
    external_product_id TEXT NOT NULL,
    created_at          TEXT NOT NULL,
    updated_at          TEXT NOT NULL
);

-- plan_id is deliberately not a foreign key: the free plan id comes from
-- configuration and may be provisioned before the plan row exists.
CREATE TABLE IF NOT EXISTS memberships (
    id                             TEXT PRIMARY KEY,
    user_id                        TEXT NOT NULL REFERENCES users(id),
    plan_id                        TEXT NOT NULL,
    status                         TEXT NOT NULL,
    start_date                     TEXT NOT NULL,
    end_date                       TEXT,
    external_subscription_id       TEXT NOT NULL DEFAULT '',
    external_subscription_interval TEXT NOT NULL DEFAULT '',
    created_at                     TEXT NOT NULL,
    updated_at                     TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS portfolios (
    id              TEXT PRIMARY KEY,
    user_id         TEXT NOT NULL UNIQUE REFERENCES users(id),
    title           TEXT NOT NULL,
    columns         INTEGER NOT NULL,
    gap             INTEGER NOT NULL,
    rounded_corners INTEGER NOT NULL,
    show_captions   INTEGER NOT NULL,
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS profiles (
    id           TEXT PRIMARY KEY,
    portfolio_id TEXT NOT NULL UNIQUE REFERENCES portfolios(id),
    name         TEXT NOT NULL DEFAULT '',
    title        TEXT NOT NULL DEFAULT '',
    bio          TEXT NOT NULL DEFAULT '',
    email        TEXT NOT NULL DEFAULT '',
    instagram    TEXT NOT NULL DEFAULT '',
    website      TEXT NOT NULL DEFAULT ''
);

-- Layout columns are nullable: NULL inherits the portfolio setting.
CREATE TABLE IF NOT EXISTS folders (
    id              TEXT PRIMARY KEY,
    portfolio_id    TEXT NOT NULL REFERENCES portfolios(id),
    name            TEXT NOT NULL,
    description     TEXT NOT NULL DEFAULT '',
    cover_photo_id  TEXT,
    columns         INTEGER,
    gap             INTEGER,
    show_captions   INTEGER,
    rounded_corners INTEGER,
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS photos (
    id          TEXT PRIMARY KEY,
    folder_id   TEXT NOT NULL REFERENCES folders(id),
    src         TEXT NOT NULL,
    alt         TEXT NOT NULL DEFAULT '',
    caption     TEXT NOT NULL DEFAULT '',
    asset_id    TEXT NOT NULL UNIQUE,
    sort_index  INTEGER NOT NULL DEFAULT 0,
    created_at  TEXT NOT NULL
);

-- Only the SHA-256 digest of a bearer token is stored.
CREATE TABLE IF NOT EXISTS sessions (
    token_hash  TEXT PRIMARY KEY,
    user_id     TEXT NOT NULL REFERENCES users(id),
    role        TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    expires_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS memberships_user_idx   ON memberships(user_id);
CREATE INDEX IF NOT EXISTS folders_portfolio_idx  ON folders(portfolio_id);
CREATE INDEX IF NOT EXISTS photos_folder_idx      ON photos(folder_id, sort_index);
CREATE INDEX IF NOT EXISTS sessions_expires_idx   ON sessions(expires_at);

PRAGMA user_version = 1;
";
