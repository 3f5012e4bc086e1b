//! Error types for `reel-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid story id: {0:?}")]
  InvalidStoryId(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
