//! User profile persistence.

use chrono::{Duration, Utc};
use famcal_core::{FamcalResult, UserProfile};
use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

use super::{map_join, map_sqlite, Store};

impl Store {
    pub async fn get_profile(&self, user_id: &str) -> FamcalResult<Option<UserProfile>> {
        let store = self.clone();
        let user_id = user_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = store.conn()?;
            conn.query_row(
                "SELECT id, user_id, email, password_expires_at, password_change_required
                 FROM user_profiles WHERE user_id = ?1",
                params![user_id],
                map_profile_row,
            )
            .optional()
            .map_err(map_sqlite)
        })
        .await
        .map_err(map_join)?
    }

    /// Idempotent upsert keyed by the external user id. Resets the expiry
    /// window and clears the forced-change flag. Returns the profile and
    /// whether a new row was created.
    pub async fn upsert_profile(
        &self,
        user_id: &str,
        email: &str,
        expiry_days: i64,
    ) -> FamcalResult<(UserProfile, bool)> {
        let store = self.clone();
        let user_id = user_id.to_string();
        let email = email.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = store.conn()?;

            let existing: Option<String> = conn
                .query_row(
                    "SELECT id FROM user_profiles WHERE user_id = ?1",
                    params![user_id],
                    |r| r.get(0),
                )
                .optional()
                .map_err(map_sqlite)?;
            let created = existing.is_none();
            let id = existing.unwrap_or_else(|| Uuid::new_v4().to_string());

            let expires_at = Utc::now() + Duration::days(expiry_days);
            conn.execute(
                "INSERT INTO user_profiles (id, user_id, email, password_expires_at, password_change_required)
                 VALUES (?1, ?2, ?3, ?4, 0)
                 ON CONFLICT (user_id) DO UPDATE SET
                     email = excluded.email,
                     password_expires_at = excluded.password_expires_at,
                     password_change_required = 0",
                params![id, user_id, email, expires_at],
            )
            .map_err(map_sqlite)?;

            Ok((
                UserProfile {
                    id,
                    user_id,
                    email,
                    password_expires_at: expires_at,
                    password_change_required: false,
                },
                created,
            ))
        })
        .await
        .map_err(map_join)?
    }

    /// Force a user into the password-change flow on their next request.
    pub async fn require_password_change(&self, user_id: &str) -> FamcalResult<()> {
        let store = self.clone();
        let user_id = user_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = store.conn()?;
            conn.execute(
                "UPDATE user_profiles SET password_change_required = 1 WHERE user_id = ?1",
                params![user_id],
            )
            .map_err(map_sqlite)?;
            Ok(())
        })
        .await
        .map_err(map_join)?
    }
}

fn map_profile_row(row: &Row<'_>) -> rusqlite::Result<UserProfile> {
    Ok(UserProfile {
        id: row.get(0)?,
        user_id: row.get(1)?,
        email: row.get(2)?,
        password_expires_at: row.get(3)?,
        password_change_required: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::open_temp_store;

    #[tokio::test]
    async fn upsert_creates_then_updates_the_same_row() {
        let (store, _dir) = open_temp_store();

        let (profile, created) = store.upsert_profile("u1", "a@example.com", 15).await.unwrap();
        assert!(created);

        let (again, created) = store.upsert_profile("u1", "b@example.com", 15).await.unwrap();
        assert!(!created);
        assert_eq!(again.id, profile.id);
        assert_eq!(again.email, "b@example.com");
    }

    #[tokio::test]
    async fn upsert_sets_expiry_roughly_n_days_out() {
        let (store, _dir) = open_temp_store();
        let (profile, _) = store.upsert_profile("u1", "a@example.com", 15).await.unwrap();

        let days_out = (profile.password_expires_at - Utc::now()).num_days();
        assert!((14..=15).contains(&days_out));
        assert!(!profile.password_change_required);
    }

    #[tokio::test]
    async fn upsert_clears_a_forced_change_flag() {
        let (store, _dir) = open_temp_store();
        store.upsert_profile("u1", "a@example.com", 15).await.unwrap();
        store.require_password_change("u1").await.unwrap();
        assert!(
            store
                .get_profile("u1")
                .await
                .unwrap()
                .unwrap()
                .password_change_required
        );

        store.upsert_profile("u1", "a@example.com", 15).await.unwrap();
        assert!(
            !store
                .get_profile("u1")
                .await
                .unwrap()
                .unwrap()
                .password_change_required
        );
    }

    #[tokio::test]
    async fn missing_profile_reads_as_none() {
        let (store, _dir) = open_temp_store();
        assert!(store.get_profile("ghost").await.unwrap().is_none());
    }
}
