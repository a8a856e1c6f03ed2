//! Event persistence.
//!
//! Writes touching both the event row and its tag associations happen in a
//! single transaction, so readers never observe a half-written event or a
//! transiently empty tag set during replacement.

use chrono::{DateTime, Utc};
use famcal_core::{Event, FamcalError, FamcalResult, Tag};
use rusqlite::types::ToSql;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{map_join, map_sqlite, Store};

/// Fields for a new event. Recurrence fields come pre-encoded.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub title: String,
    pub description: Option<String>,
    pub all_day: bool,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub time_zone: String,
    pub rrule: Option<String>,
    pub duration_days: Option<i64>,
    pub duration_minutes: Option<i64>,
    pub created_by: String,
    /// Tag ids to associate, in display order.
    pub tags: Vec<String>,
}

/// Partial update. Outer `None` means "leave unchanged"; for the recurrence
/// fields the inner `Option` distinguishes "set" from "clear".
#[derive(Debug, Clone, Default)]
pub struct EventPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub all_day: Option<bool>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub time_zone: Option<String>,
    pub rrule: Option<Option<String>>,
    pub duration_days: Option<Option<i64>>,
    pub duration_minutes: Option<Option<i64>>,
    /// When present, the full association set is replaced.
    pub tags: Option<Vec<String>>,
}

impl Store {
    /// All events with their ordered tags, sorted by start ascending.
    pub async fn list_events(&self) -> FamcalResult<Vec<Event>> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || {
            let conn = store.conn()?;
            let mut stmt = conn
                .prepare(
                    "SELECT id, title, description, all_day, start_at, end_at, time_zone,
                            rrule, duration_days, duration_minutes, created_by
                     FROM events ORDER BY start_at ASC",
                )
                .map_err(map_sqlite)?;
            let rows = stmt.query_map([], map_event_row).map_err(map_sqlite)?;

            let mut events = Vec::new();
            for row in rows {
                let mut event = row.map_err(map_sqlite)?;
                event.tags = tags_for_event(&conn, &event.id)?;
                events.push(event);
            }
            Ok(events)
        })
        .await
        .map_err(map_join)?
    }

    pub async fn get_event(&self, id: &str) -> FamcalResult<Event> {
        let store = self.clone();
        let id = id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = store.conn()?;
            let event = conn
                .query_row(
                    "SELECT id, title, description, all_day, start_at, end_at, time_zone,
                            rrule, duration_days, duration_minutes, created_by
                     FROM events WHERE id = ?1",
                    params![id],
                    map_event_row,
                )
                .optional()
                .map_err(map_sqlite)?;

            match event {
                Some(mut event) => {
                    event.tags = tags_for_event(&conn, &event.id)?;
                    Ok(event)
                }
                None => Err(FamcalError::NotFound(format!("event {id}"))),
            }
        })
        .await
        .map_err(map_join)?
    }

    /// Persist a new event and its tag links in one transaction.
    pub async fn create_event(&self, new: NewEvent) -> FamcalResult<String> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = store.conn()?;
            let tx = conn.transaction().map_err(map_sqlite)?;

            let id = Uuid::new_v4().to_string();
            tx.execute(
                "INSERT INTO events (id, title, description, all_day, start_at, end_at,
                                     time_zone, rrule, duration_days, duration_minutes, created_by)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    id,
                    new.title,
                    new.description,
                    new.all_day,
                    new.start,
                    new.end,
                    new.time_zone,
                    new.rrule,
                    new.duration_days,
                    new.duration_minutes,
                    new.created_by,
                ],
            )
            .map_err(map_sqlite)?;

            insert_tag_links(&tx, &id, &new.tags)?;
            tx.commit().map_err(map_sqlite)?;
            Ok(id)
        })
        .await
        .map_err(map_join)?
    }

    /// Apply a partial update. Returns `NotFound` when the id is unknown.
    pub async fn update_event(&self, id: &str, patch: EventPatch) -> FamcalResult<()> {
        let store = self.clone();
        let id = id.to_string();
        tokio::task::spawn_blocking(move || {
            let mut conn = store.conn()?;
            let tx = conn.transaction().map_err(map_sqlite)?;

            let exists: Option<i64> = tx
                .query_row("SELECT 1 FROM events WHERE id = ?1", params![id], |r| r.get(0))
                .optional()
                .map_err(map_sqlite)?;
            if exists.is_none() {
                return Err(FamcalError::NotFound(format!("event {id}")));
            }

            let mut sets: Vec<&str> = Vec::new();
            let mut values: Vec<Box<dyn ToSql>> = Vec::new();

            if let Some(title) = patch.title {
                sets.push("title = ?");
                values.push(Box::new(title));
            }
            if let Some(description) = patch.description {
                sets.push("description = ?");
                values.push(Box::new(description));
            }
            if let Some(all_day) = patch.all_day {
                sets.push("all_day = ?");
                values.push(Box::new(all_day));
            }
            if let Some(start) = patch.start {
                sets.push("start_at = ?");
                values.push(Box::new(start));
            }
            if let Some(end) = patch.end {
                sets.push("end_at = ?");
                values.push(Box::new(end));
            }
            if let Some(time_zone) = patch.time_zone {
                sets.push("time_zone = ?");
                values.push(Box::new(time_zone));
            }
            if let Some(rrule) = patch.rrule {
                sets.push("rrule = ?");
                values.push(Box::new(rrule));
            }
            if let Some(days) = patch.duration_days {
                sets.push("duration_days = ?");
                values.push(Box::new(days));
            }
            if let Some(minutes) = patch.duration_minutes {
                sets.push("duration_minutes = ?");
                values.push(Box::new(minutes));
            }

            if !sets.is_empty() {
                let sql = format!("UPDATE events SET {} WHERE id = ?", sets.join(", "));
                values.push(Box::new(id.clone()));
                let bound: Vec<&dyn ToSql> = values.iter().map(|v| v.as_ref()).collect();
                tx.execute(&sql, &bound[..]).map_err(map_sqlite)?;
            }

            if let Some(tags) = patch.tags {
                tx.execute("DELETE FROM event_tags WHERE event_id = ?1", params![id])
                    .map_err(map_sqlite)?;
                insert_tag_links(&tx, &id, &tags)?;
            }

            tx.commit().map_err(map_sqlite)?;
            Ok(())
        })
        .await
        .map_err(map_join)?
    }

    /// Delete an event; tag links go with it via FK cascade.
    pub async fn delete_event(&self, id: &str) -> FamcalResult<()> {
        let store = self.clone();
        let id = id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = store.conn()?;
            let deleted = conn
                .execute("DELETE FROM events WHERE id = ?1", params![id])
                .map_err(map_sqlite)?;
            if deleted == 0 {
                return Err(FamcalError::NotFound(format!("event {id}")));
            }
            Ok(())
        })
        .await
        .map_err(map_join)?
    }
}

fn insert_tag_links(conn: &Connection, event_id: &str, tag_ids: &[String]) -> FamcalResult<()> {
    for (position, tag_id) in tag_ids.iter().enumerate() {
        conn.execute(
            "INSERT INTO event_tags (event_id, tag_id, position) VALUES (?1, ?2, ?3)",
            params![event_id, tag_id, position as i64],
        )
        .map_err(map_sqlite)?;
    }
    Ok(())
}

fn tags_for_event(conn: &Connection, event_id: &str) -> FamcalResult<Vec<Tag>> {
    let mut stmt = conn
        .prepare(
            "SELECT t.id, t.name, t.color, t.user_id
             FROM tags t JOIN event_tags et ON et.tag_id = t.id
             WHERE et.event_id = ?1 ORDER BY et.position ASC",
        )
        .map_err(map_sqlite)?;
    let rows = stmt
        .query_map(params![event_id], |row| {
            Ok(Tag {
                id: row.get(0)?,
                name: row.get(1)?,
                color: row.get(2)?,
                user_id: row.get(3)?,
            })
        })
        .map_err(map_sqlite)?;
    rows.collect::<rusqlite::Result<Vec<_>>>().map_err(map_sqlite)
}

fn map_event_row(row: &Row<'_>) -> rusqlite::Result<Event> {
    Ok(Event {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        all_day: row.get(3)?,
        start: row.get(4)?,
        end: row.get(5)?,
        time_zone: row.get(6)?,
        rrule: row.get(7)?,
        duration_days: row.get(8)?,
        duration_minutes: row.get(9)?,
        created_by: row.get(10)?,
        tags: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tags::NewTag;
    use crate::store::test_support::open_temp_store;
    use chrono::TimeZone;

    fn new_event(title: &str, start_hour: u32) -> NewEvent {
        NewEvent {
            title: title.to_string(),
            description: None,
            all_day: false,
            start: Utc.with_ymd_and_hms(2024, 1, 1, start_hour, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2024, 1, 1, start_hour + 1, 0, 0).unwrap(),
            time_zone: "UTC".to_string(),
            rrule: None,
            duration_days: None,
            duration_minutes: None,
            created_by: "u1".to_string(),
            tags: Vec::new(),
        }
    }

    async fn seed_tag(store: &Store, name: &str) -> String {
        store
            .create_tag(NewTag {
                name: name.to_string(),
                color: "#123456".to_string(),
                user_id: "u1".to_string(),
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn create_and_list_round_trips_with_ordered_tags() {
        let (store, _dir) = open_temp_store();
        let work = seed_tag(&store, "Work").await;
        let family = seed_tag(&store, "Family").await;

        let mut new = new_event("Standup", 9);
        new.tags = vec![family.clone(), work.clone()];
        let id = store.create_event(new).await.unwrap();

        let events = store.list_events().await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, id);
        let tag_ids: Vec<&str> = events[0].tags.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(tag_ids, vec![family.as_str(), work.as_str()]);
    }

    #[tokio::test]
    async fn listing_orders_by_start_ascending() {
        let (store, _dir) = open_temp_store();
        store.create_event(new_event("Later", 15)).await.unwrap();
        store.create_event(new_event("Early", 8)).await.unwrap();
        store.create_event(new_event("Middle", 11)).await.unwrap();

        let titles: Vec<String> = store
            .list_events()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.title)
            .collect();
        assert_eq!(titles, vec!["Early", "Middle", "Later"]);
    }

    #[tokio::test]
    async fn patch_with_empty_tag_list_clears_associations() {
        let (store, _dir) = open_temp_store();
        let tag = seed_tag(&store, "Work").await;

        let mut new = new_event("Review", 10);
        new.tags = vec![tag];
        let id = store.create_event(new).await.unwrap();

        let patch = EventPatch {
            tags: Some(Vec::new()),
            ..Default::default()
        };
        store.update_event(&id, patch).await.unwrap();

        let event = store.get_event(&id).await.unwrap();
        assert!(event.tags.is_empty());
    }

    #[tokio::test]
    async fn patch_leaves_omitted_fields_untouched() {
        let (store, _dir) = open_temp_store();
        let mut new = new_event("Original", 10);
        new.description = Some("keep me".to_string());
        let id = store.create_event(new).await.unwrap();

        let patch = EventPatch {
            title: Some("Renamed".to_string()),
            ..Default::default()
        };
        store.update_event(&id, patch).await.unwrap();

        let event = store.get_event(&id).await.unwrap();
        assert_eq!(event.title, "Renamed");
        assert_eq!(event.description.as_deref(), Some("keep me"));
    }

    #[tokio::test]
    async fn patch_can_clear_recurrence_fields() {
        let (store, _dir) = open_temp_store();
        let mut new = new_event("Weekly", 10);
        new.rrule = Some("FREQ=WEEKLY;INTERVAL=1;DTSTART=20240101T100000".to_string());
        new.duration_minutes = Some(60);
        let id = store.create_event(new).await.unwrap();

        let patch = EventPatch {
            rrule: Some(None),
            duration_minutes: Some(None),
            ..Default::default()
        };
        store.update_event(&id, patch).await.unwrap();

        let event = store.get_event(&id).await.unwrap();
        assert!(event.rrule.is_none());
        assert!(event.duration_minutes.is_none());
    }

    #[tokio::test]
    async fn missing_ids_signal_not_found() {
        let (store, _dir) = open_temp_store();
        assert!(matches!(
            store.delete_event("nope").await,
            Err(FamcalError::NotFound(_))
        ));
        assert!(matches!(
            store.update_event("nope", EventPatch::default()).await,
            Err(FamcalError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn delete_cascades_to_tag_links() {
        let (store, _dir) = open_temp_store();
        let tag = seed_tag(&store, "Work").await;
        let mut new = new_event("Gone soon", 10);
        new.tags = vec![tag];
        let id = store.create_event(new).await.unwrap();

        store.delete_event(&id).await.unwrap();
        assert!(store.list_events().await.unwrap().is_empty());
    }
}
