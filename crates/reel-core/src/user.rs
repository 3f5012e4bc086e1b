//! User — the owner of a set of stories.

use serde::{Deserialize, Serialize};

/// Roster-assigned user identifier.
pub type UserId = u32;

/// A member of the roster. Never changes once created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
  pub id:                  UserId,
  pub name:                String,
  pub profile_picture_url: String,
}

impl User {
  pub fn new(
    id: UserId,
    name: impl Into<String>,
    profile_picture_url: impl Into<String>,
  ) -> Self {
    Self {
      id,
      name: name.into(),
      profile_picture_url: profile_picture_url.into(),
    }
  }
}
