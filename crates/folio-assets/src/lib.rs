//! Image assets for Folio.
//!
//! Holds the filesystem [`ObjectStore`](folio_core::assets::ObjectStore)
//! implementation, the lossy re-encoder applied to every upload, and the
//! [`AssetJanitor`] that releases assets whose rows have been deleted.

mod compress;
mod fs;
mod janitor;

pub mod error;

pub use compress::{JPEG_QUALITY, MAX_EDGE, compress, compress_in_background};
pub use error::{Error, Result};
pub use fs::FsObjectStore;
pub use janitor::AssetJanitor;
