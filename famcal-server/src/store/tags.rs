//! Tag persistence and default-tag seeding.

use famcal_core::{FamcalError, FamcalResult, Tag};
use rusqlite::{params, OptionalExtension};
use uuid::Uuid;

use super::{map_join, map_sqlite, Store};

/// The canonical category list seeded for every new user. Seeding is
/// idempotent per (user, name); users can recolor or rename afterwards.
const DEFAULT_TAGS: [(&str, &str); 8] = [
    ("Work", "#3b82f6"),
    ("Personal", "#10b981"),
    ("Family", "#f59e0b"),
    ("Health", "#ef4444"),
    ("Education", "#8b5cf6"),
    ("Travel", "#06b6d4"),
    ("Social", "#ec4899"),
    ("Hobby", "#84cc16"),
];

#[derive(Debug, Clone)]
pub struct NewTag {
    pub name: String,
    pub color: String,
    pub user_id: String,
}

#[derive(Debug, Clone, Default)]
pub struct TagPatch {
    pub name: Option<String>,
    pub color: Option<String>,
}

impl Store {
    /// A user's tags, sorted by name.
    pub async fn list_tags(&self, user_id: &str) -> FamcalResult<Vec<Tag>> {
        let store = self.clone();
        let user_id = user_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = store.conn()?;
            let mut stmt = conn
                .prepare(
                    "SELECT id, name, color, user_id FROM tags
                     WHERE user_id = ?1 ORDER BY name ASC",
                )
                .map_err(map_sqlite)?;
            let rows = stmt
                .query_map(params![user_id], map_tag_row)
                .map_err(map_sqlite)?;
            rows.collect::<rusqlite::Result<Vec<_>>>().map_err(map_sqlite)
        })
        .await
        .map_err(map_join)?
    }

    pub async fn create_tag(&self, new: NewTag) -> FamcalResult<Tag> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || {
            let conn = store.conn()?;
            let tag = Tag {
                id: Uuid::new_v4().to_string(),
                name: new.name,
                color: new.color,
                user_id: new.user_id,
            };
            conn.execute(
                "INSERT INTO tags (id, name, color, user_id) VALUES (?1, ?2, ?3, ?4)",
                params![tag.id, tag.name, tag.color, tag.user_id],
            )
            .map_err(|e| match e {
                rusqlite::Error::SqliteFailure(err, _)
                    if err.code == rusqlite::ErrorCode::ConstraintViolation =>
                {
                    FamcalError::Validation(format!("tag '{}' already exists", tag.name))
                }
                other => map_sqlite(other),
            })?;
            Ok(tag)
        })
        .await
        .map_err(map_join)?
    }

    /// Partial rename/recolor, scoped to the owning user.
    pub async fn update_tag(&self, id: &str, user_id: &str, patch: TagPatch) -> FamcalResult<Tag> {
        let store = self.clone();
        let id = id.to_string();
        let user_id = user_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = store.conn()?;
            let updated = conn
                .execute(
                    "UPDATE tags
                     SET name = COALESCE(?1, name), color = COALESCE(?2, color)
                     WHERE id = ?3 AND user_id = ?4",
                    params![patch.name, patch.color, id, user_id],
                )
                .map_err(map_sqlite)?;
            if updated == 0 {
                return Err(FamcalError::NotFound(format!("tag {id}")));
            }

            conn.query_row(
                "SELECT id, name, color, user_id FROM tags WHERE id = ?1",
                params![id],
                map_tag_row,
            )
            .optional()
            .map_err(map_sqlite)?
            .ok_or_else(|| FamcalError::NotFound(format!("tag {id}")))
        })
        .await
        .map_err(map_join)?
    }

    /// Seed the default category list for a new user. Idempotent per
    /// (user, name), so re-running adds nothing.
    pub async fn seed_default_tags(&self, user_id: &str) -> FamcalResult<()> {
        let store = self.clone();
        let user_id = user_id.to_string();
        tokio::task::spawn_blocking(move || {
            let mut conn = store.conn()?;
            let tx = conn.transaction().map_err(map_sqlite)?;
            for (name, color) in DEFAULT_TAGS {
                tx.execute(
                    "INSERT OR IGNORE INTO tags (id, name, color, user_id)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![Uuid::new_v4().to_string(), name, color, user_id],
                )
                .map_err(map_sqlite)?;
            }
            tx.commit().map_err(map_sqlite)?;
            Ok(())
        })
        .await
        .map_err(map_join)?
    }
}

fn map_tag_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Tag> {
    Ok(Tag {
        id: row.get(0)?,
        name: row.get(1)?,
        color: row.get(2)?,
        user_id: row.get(3)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::open_temp_store;

    #[tokio::test]
    async fn tags_list_sorted_by_name_and_scoped_to_owner() {
        let (store, _dir) = open_temp_store();
        for (name, user) in [("Zoo", "u1"), ("Art", "u1"), ("Mine", "u2")] {
            store
                .create_tag(NewTag {
                    name: name.to_string(),
                    color: "#000000".to_string(),
                    user_id: user.to_string(),
                })
                .await
                .unwrap();
        }

        let names: Vec<String> = store
            .list_tags("u1")
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["Art", "Zoo"]);
    }

    #[tokio::test]
    async fn duplicate_tag_name_for_one_owner_is_rejected() {
        let (store, _dir) = open_temp_store();
        let new = NewTag {
            name: "Work".to_string(),
            color: "#111111".to_string(),
            user_id: "u1".to_string(),
        };
        store.create_tag(new.clone()).await.unwrap();
        assert!(matches!(
            store.create_tag(new).await,
            Err(FamcalError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn update_is_partial_and_owner_scoped() {
        let (store, _dir) = open_temp_store();
        let tag = store
            .create_tag(NewTag {
                name: "Work".to_string(),
                color: "#111111".to_string(),
                user_id: "u1".to_string(),
            })
            .await
            .unwrap();

        let updated = store
            .update_tag(
                &tag.id,
                "u1",
                TagPatch {
                    color: Some("#222222".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Work");
        assert_eq!(updated.color, "#222222");

        // Another user cannot touch it.
        assert!(matches!(
            store.update_tag(&tag.id, "u2", TagPatch::default()).await,
            Err(FamcalError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn default_tag_seeding_is_idempotent() {
        let (store, _dir) = open_temp_store();
        store.seed_default_tags("u1").await.unwrap();
        let first = store.list_tags("u1").await.unwrap();
        assert_eq!(first.len(), 8);
        let first_ids: Vec<String> = first.iter().map(|t| t.id.clone()).collect();

        store.seed_default_tags("u1").await.unwrap();
        let second = store.list_tags("u1").await.unwrap();
        let second_ids: Vec<String> = second.iter().map(|t| t.id.clone()).collect();
        assert_eq!(first_ids, second_ids);
    }
}
