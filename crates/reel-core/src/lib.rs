//! Core types and state machines for the Reel stories viewer.
//!
//! This crate is deliberately free of HTTP, terminal and database
//! dependencies. Storage backends implement [`store::EngagementStore`]; the
//! front-end drives [`feed::Feed`] and [`viewer::StoryViewer`] and supplies an
//! [`preload::ImageFetcher`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod feed;
pub mod memory;
pub mod mock;
pub mod preload;
pub mod session;
pub mod store;
pub mod story;
pub mod ticker;
pub mod user;
pub mod viewer;

pub use error::{Error, Result};

#[cfg(test)]
mod tests;
