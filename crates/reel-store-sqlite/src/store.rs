//! [`SqliteStore`] — the SQLite implementation of [`EngagementStore`].

use std::{collections::HashSet, path::Path};

use rusqlite::{OptionalExtension as _, TransactionBehavior};
use tracing::debug;

use reel_core::{
  store::{EngagementStore, LIKED_KEY, VIEWED_KEY},
  story::StoryId,
  user::UserId,
};

use crate::{
  Error, Result,
  encode::{decode_liked, decode_viewed, encode_liked, encode_viewed},
  schema::SCHEMA,
};

// ─── Row helpers ─────────────────────────────────────────────────────────────

fn read_value(conn: &rusqlite::Connection, key: &str) -> rusqlite::Result<Option<String>> {
  conn
    .query_row(
      "SELECT value FROM kv WHERE key = ?1",
      rusqlite::params![key],
      |r| r.get(0),
    )
    .optional()
}

fn write_value(conn: &rusqlite::Connection, key: &str, value: &str) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO kv (key, value) VALUES (?1, ?2)
     ON CONFLICT(key) DO UPDATE SET value = excluded.value",
    rusqlite::params![key, value],
  )?;
  Ok(())
}

fn encoding_error(e: serde_json::Error) -> tokio_rusqlite::Error {
  tokio_rusqlite::Error::Other(Box::new(e))
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// An engagement store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. All calls
/// are serialised on the connection's thread, and each read-modify-write
/// runs in one immediate transaction, so writers sharing the file wait for
/// the lock instead of failing on upgrade.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Fetch the raw JSON stored under `key`, if any.
  pub(crate) async fn read_raw(&self, key: &'static str) -> Result<Option<String>> {
    let raw = self
      .conn
      .call(move |conn| Ok(read_value(conn, key)?))
      .await?;
    Ok(raw)
  }

  /// Overwrite the raw value under `key`. Bypasses encoding; tests use it to
  /// plant malformed rows.
  #[cfg(test)]
  pub(crate) async fn write_raw(&self, key: &'static str, value: &str) -> Result<()> {
    let value = value.to_owned();
    self
      .conn
      .call(move |conn| Ok(write_value(conn, key, &value)?))
      .await?;
    Ok(())
  }
}

// ─── EngagementStore impl ────────────────────────────────────────────────────

impl EngagementStore for SqliteStore {
  type Error = Error;

  // ── Viewed ────────────────────────────────────────────────────────────────

  async fn mark_viewed(&self, user_id: UserId) -> Result<()> {
    let inserted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut viewed = decode_viewed(read_value(&tx, VIEWED_KEY)?.as_deref());
        let inserted = viewed.insert(user_id);
        if inserted {
          let encoded = encode_viewed(&viewed).map_err(encoding_error)?;
          write_value(&tx, VIEWED_KEY, &encoded)?;
        }
        tx.commit()?;
        Ok(inserted)
      })
      .await?;

    debug!(user_id, inserted, "persisted view");
    Ok(())
  }

  async fn viewed_user_ids(&self) -> Result<HashSet<UserId>> {
    let raw = self.read_raw(VIEWED_KEY).await?;
    Ok(decode_viewed(raw.as_deref()))
  }

  // ── Liked ─────────────────────────────────────────────────────────────────

  async fn toggle_liked(&self, story_id: StoryId) -> Result<bool> {
    let liked = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut liked = decode_liked(read_value(&tx, LIKED_KEY)?.as_deref());
        let now_liked = if liked.remove(&story_id) {
          false
        } else {
          liked.insert(story_id);
          true
        };
        let encoded = encode_liked(&liked).map_err(encoding_error)?;
        write_value(&tx, LIKED_KEY, &encoded)?;
        tx.commit()?;
        Ok(now_liked)
      })
      .await?;

    debug!(%story_id, liked, "persisted like toggle");
    Ok(liked)
  }

  async fn is_liked(&self, story_id: StoryId) -> Result<bool> {
    Ok(self.liked_story_ids().await?.contains(&story_id))
  }

  async fn liked_story_ids(&self) -> Result<HashSet<StoryId>> {
    let raw = self.read_raw(LIKED_KEY).await?;
    Ok(decode_liked(raw.as_deref()))
  }
}
