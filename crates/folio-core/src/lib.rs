//! Core types and trait definitions for the Folio portfolio backend.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! storage backend, the object store and the HTTP surface all depend on it.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod assets;
pub mod error;
pub mod membership;
pub mod page;
pub mod patch;
pub mod portfolio;
pub mod provision;
pub mod store;
pub mod tree;
pub mod user;

pub use error::{Error, ErrorKind, Result};
