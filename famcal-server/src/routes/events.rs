//! Event endpoints: list, create, update, delete.
//!
//! Create and update accept the recurrence configuration from the event
//! form and run the encoder server-side; the stored row carries the
//! resulting RRULE and duration. Timestamps are validated before any write
//! is attempted.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, patch};
use axum::{Json, Router};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use famcal_core::{DisplayEvent, FamcalError, FamcalResult, Recurrence, RecurrenceFreq};
use serde::{Deserialize, Serialize};

use crate::routes::{require_user, ApiError};
use crate::state::AppState;
use crate::store::{EventPatch, NewEvent};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/events", get(list_events).post(create_event))
        .route("/api/events/{id}", patch(update_event).delete(delete_event))
}

#[derive(Serialize)]
struct EventIdResponse {
    id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub all_day: bool,
    #[serde(default)]
    pub time_zone: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub recurrence: Recurrence,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
    #[serde(default)]
    pub all_day: Option<bool>,
    #[serde(default)]
    pub time_zone: Option<String>,
    #[serde(default)]
    pub recurrence: Option<Recurrence>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

/// GET /api/events - all events, start ascending, in display shape
async fn list_events(State(state): State<AppState>) -> Result<Json<Vec<DisplayEvent>>, ApiError> {
    let events = state.store.list_events().await?;
    Ok(Json(events.iter().map(DisplayEvent::from_event).collect()))
}

/// POST /api/events - create an event and its tag associations
async fn create_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateEventRequest>,
) -> Result<Json<EventIdResponse>, ApiError> {
    let (_, user) = require_user(&state, &headers).await?;

    if req.title.trim().is_empty() {
        return Err(FamcalError::Validation("title is required".to_string()).into());
    }

    let tz_label = req
        .time_zone
        .unwrap_or_else(|| state.config.default_time_zone.clone());
    let tz = parse_time_zone(&tz_label)?;
    let start = parse_event_time(&req.start, tz)?;
    let end = parse_event_time(&req.end, tz)?;

    let encoded = req.recurrence.encode(start.local, end.local, req.all_day);

    let id = state
        .store
        .create_event(NewEvent {
            title: req.title,
            description: req.description,
            all_day: req.all_day,
            start: start.utc,
            end: end.utc,
            time_zone: tz_label,
            rrule: encoded.as_ref().map(|e| e.rrule.clone()),
            duration_days: encoded.as_ref().and_then(|e| e.duration_days()),
            duration_minutes: encoded.as_ref().and_then(|e| e.duration_minutes()),
            created_by: req.created_by.unwrap_or(user.id),
            tags: req.tags,
        })
        .await?;

    Ok(Json(EventIdResponse { id }))
}

/// PATCH /api/events/:id - partial update; a supplied tag list replaces
/// the full association set
async fn update_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateEventRequest>,
) -> Result<Json<EventIdResponse>, ApiError> {
    // Fetch up front: 404 beats a validation error for a missing id, and
    // the existing row supplies defaults for zone and all-day handling.
    let existing = state.store.get_event(&id).await?;

    let tz_label = req
        .time_zone
        .clone()
        .unwrap_or_else(|| existing.time_zone.clone());
    let tz = parse_time_zone(&tz_label)?;
    let all_day = req.all_day.unwrap_or(existing.all_day);

    let start = req.start.as_deref().map(|s| parse_event_time(s, tz)).transpose()?;
    let end = req.end.as_deref().map(|s| parse_event_time(s, tz)).transpose()?;

    let mut patch = EventPatch {
        title: req.title,
        description: req.description,
        all_day: req.all_day,
        start: start.as_ref().map(|t| t.utc),
        end: end.as_ref().map(|t| t.utc),
        time_zone: req.time_zone,
        tags: req.tags,
        ..Default::default()
    };

    if let Some(recurrence) = req.recurrence {
        if recurrence.freq == RecurrenceFreq::None {
            patch.rrule = Some(None);
            patch.duration_days = Some(None);
            patch.duration_minutes = Some(None);
        } else {
            // Fall back to the stored anchor for any bound the request
            // leaves out, expressed in the event's local wall clock.
            let local_start = start
                .map(|t| t.local)
                .unwrap_or_else(|| existing.start.with_timezone(&tz).naive_local());
            let local_end = end
                .map(|t| t.local)
                .unwrap_or_else(|| existing.end.with_timezone(&tz).naive_local());

            // Frequency is not "none" here, so encode always succeeds.
            if let Some(encoded) = recurrence.encode(local_start, local_end, all_day) {
                patch.duration_days = Some(encoded.duration_days());
                patch.duration_minutes = Some(encoded.duration_minutes());
                patch.rrule = Some(Some(encoded.rrule));
            }
        }
    }

    state.store.update_event(&id, patch).await?;
    Ok(Json(EventIdResponse { id }))
}

/// DELETE /api/events/:id - remove an event; associations cascade
async fn delete_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.store.delete_event(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn parse_time_zone(label: &str) -> FamcalResult<Tz> {
    label
        .parse()
        .map_err(|_| FamcalError::Validation(format!("unknown time zone '{label}'")))
}

/// A request timestamp resolved both ways: the UTC instant for storage and
/// the event-local wall clock for recurrence encoding.
#[derive(Debug, Clone, Copy)]
struct EventTimestamp {
    utc: DateTime<Utc>,
    local: NaiveDateTime,
}

/// Accepts RFC 3339 (offset-aware) timestamps, naive local date-times with
/// or without seconds, and bare dates (midnight).
fn parse_event_time(raw: &str, tz: Tz) -> FamcalResult<EventTimestamp> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        let utc = dt.with_timezone(&Utc);
        return Ok(EventTimestamp {
            utc,
            local: utc.with_timezone(&tz).naive_local(),
        });
    }

    let local = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| FamcalError::Validation(format!("invalid timestamp '{raw}'")))?;

    let utc = tz
        .from_local_datetime(&local)
        .earliest()
        .ok_or_else(|| {
            FamcalError::Validation(format!("'{raw}' does not exist in time zone {tz}"))
        })?
        .with_timezone(&Utc);

    Ok(EventTimestamp { utc, local })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn naive_timestamps_keep_their_wall_clock_reading() {
        let tz: Tz = "America/New_York".parse().unwrap();
        let parsed = parse_event_time("2024-03-10T09:00", tz).unwrap();
        assert_eq!(parsed.local.to_string(), "2024-03-10 09:00:00");
        // EDT on that date: 09:00 local is 13:00 UTC.
        assert_eq!(parsed.utc.to_rfc3339(), "2024-03-10T13:00:00+00:00");
    }

    #[test]
    fn rfc3339_timestamps_are_converted_into_the_event_zone() {
        let tz: Tz = "Europe/Berlin".parse().unwrap();
        let parsed = parse_event_time("2024-01-01T10:00:00Z", tz).unwrap();
        assert_eq!(parsed.local.to_string(), "2024-01-01 11:00:00");
    }

    #[test]
    fn bare_dates_resolve_to_local_midnight() {
        let tz: Tz = "UTC".parse().unwrap();
        let parsed = parse_event_time("2024-05-01", tz).unwrap();
        assert_eq!(parsed.local.to_string(), "2024-05-01 00:00:00");
    }

    #[test]
    fn garbage_timestamps_are_a_validation_error() {
        let tz: Tz = "UTC".parse().unwrap();
        assert!(matches!(
            parse_event_time("tomorrow-ish", tz),
            Err(FamcalError::Validation(_))
        ));
    }
}
