//! Calendar event types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tag::Tag;

/// A stored calendar event with its tag associations.
///
/// For non-recurring events `start`/`end` are the actual occurrence bounds.
/// When `rrule` is set they only anchor the first occurrence, and exactly
/// one of the duration fields carries the span: `duration_days` for all-day
/// events, `duration_minutes` otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub all_day: bool,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// IANA time zone label the event was created in.
    pub time_zone: String,
    /// Recurrence rule for repeating events.
    pub rrule: Option<String>,
    pub duration_days: Option<i64>,
    pub duration_minutes: Option<i64>,
    pub created_by: String,
    /// Ordered tag associations; the first tag drives display color.
    pub tags: Vec<Tag>,
}

impl Event {
    pub fn is_recurring(&self) -> bool {
        self.rrule.is_some()
    }
}
