//! SQLite persistence for events, tags, and user profiles.
//!
//! A pooled, blocking rusqlite connection sits behind async wrappers that
//! run each operation on the blocking thread pool. The schema is applied
//! idempotently at startup; there is no migration framework.

mod events;
mod profiles;
mod tags;

use std::path::Path;

use famcal_core::{FamcalError, FamcalResult};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;

pub use events::{EventPatch, NewEvent};
pub use tags::{NewTag, TagPatch};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS events (
    id               TEXT PRIMARY KEY,
    title            TEXT NOT NULL,
    description      TEXT,
    all_day          INTEGER NOT NULL DEFAULT 0,
    start_at         TEXT NOT NULL,
    end_at           TEXT NOT NULL,
    time_zone        TEXT NOT NULL,
    rrule            TEXT,
    duration_days    INTEGER,
    duration_minutes INTEGER,
    created_by       TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS tags (
    id      TEXT PRIMARY KEY,
    name    TEXT NOT NULL,
    color   TEXT NOT NULL,
    user_id TEXT NOT NULL,
    UNIQUE (user_id, name)
);

CREATE TABLE IF NOT EXISTS event_tags (
    event_id TEXT NOT NULL REFERENCES events (id) ON DELETE CASCADE,
    tag_id   TEXT NOT NULL REFERENCES tags (id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    PRIMARY KEY (event_id, tag_id)
);

CREATE TABLE IF NOT EXISTS user_profiles (
    id                       TEXT PRIMARY KEY,
    user_id                  TEXT NOT NULL UNIQUE,
    email                    TEXT NOT NULL,
    password_expires_at      TEXT NOT NULL,
    password_change_required INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_events_start ON events (start_at);
";

/// Handle to the SQLite database, cheap to clone and share.
#[derive(Clone)]
pub struct Store {
    pool: Pool<SqliteConnectionManager>,
}

impl Store {
    /// Open (or create) the database file and apply the schema.
    pub fn open(path: &Path) -> FamcalResult<Self> {
        let manager = SqliteConnectionManager::file(path)
            .with_init(|conn| conn.pragma_update(None, "foreign_keys", "ON"));
        let pool = Pool::builder()
            .build(manager)
            .map_err(|e| FamcalError::Database(e.to_string()))?;

        let store = Store { pool };
        store.conn()?.execute_batch(SCHEMA).map_err(map_sqlite)?;
        Ok(store)
    }

    fn conn(&self) -> FamcalResult<PooledConnection<SqliteConnectionManager>> {
        self.pool.get().map_err(|e| FamcalError::Database(e.to_string()))
    }
}

pub(crate) fn map_sqlite(err: rusqlite::Error) -> FamcalError {
    FamcalError::Database(err.to_string())
}

pub(crate) fn map_join(err: tokio::task::JoinError) -> FamcalError {
    FamcalError::Database(format!("blocking task failed: {err}"))
}
