//! Encoding and decoding between the persisted sets and the JSON arrays
//! stored in the `kv` table.
//!
//! Decoding never fails: a missing row is the empty set, a malformed value is
//! logged and treated as the empty set, and unparsable story ids inside an
//! otherwise valid array are skipped.

use std::collections::HashSet;

use reel_core::{story::StoryId, user::UserId};
use tracing::warn;

// ─── Viewed users ────────────────────────────────────────────────────────────

/// Sorted so identical sets always produce identical rows.
pub fn encode_viewed(ids: &HashSet<UserId>) -> serde_json::Result<String> {
  let mut ids: Vec<_> = ids.iter().copied().collect();
  ids.sort_unstable();
  serde_json::to_string(&ids)
}

pub fn decode_viewed(raw: Option<&str>) -> HashSet<UserId> {
  let Some(raw) = raw else {
    return HashSet::new();
  };
  match serde_json::from_str::<Vec<UserId>>(raw) {
    Ok(ids) => ids.into_iter().collect(),
    Err(e) => {
      warn!(error = %e, "malformed viewed set; treating as empty");
      HashSet::new()
    }
  }
}

// ─── Liked stories ───────────────────────────────────────────────────────────

pub fn encode_liked(ids: &HashSet<StoryId>) -> serde_json::Result<String> {
  let mut ids: Vec<_> = ids.iter().copied().collect();
  ids.sort_unstable();
  serde_json::to_string(&ids)
}

pub fn decode_liked(raw: Option<&str>) -> HashSet<StoryId> {
  let Some(raw) = raw else {
    return HashSet::new();
  };
  let entries = match serde_json::from_str::<Vec<String>>(raw) {
    Ok(entries) => entries,
    Err(e) => {
      warn!(error = %e, "malformed liked set; treating as empty");
      return HashSet::new();
    }
  };
  entries
    .into_iter()
    .filter_map(|entry| match entry.parse() {
      Ok(id) => Some(id),
      Err(e) => {
        warn!(error = %e, "skipping malformed liked entry");
        None
      }
    })
    .collect()
}
