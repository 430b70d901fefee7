//! SQLite backend for the Folio portfolio store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Multi-row writes (provisioning,
//! reconciliation) each run inside one SQLite transaction.

mod encode;
mod reconcile;
mod schema;
mod sql;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
