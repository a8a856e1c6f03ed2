//! Projection of stored events into the calendar-widget wire shape.
//!
//! The widget expects either explicit `start`/`end` timestamps (plain
//! events) or an `rrule` plus `duration` object (recurring events, expanded
//! client-side). Exactly one of the two is emitted per event.

use chrono::SecondsFormat;
use serde::Serialize;

use crate::event::Event;
use crate::recurrence::RecurrenceDuration;

/// Wire shape of a single calendar entry.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayEvent {
    pub id: String,
    pub title: String,
    pub all_day: bool,
    pub extended_props: ExtendedProps,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rrule: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<RecurrenceDuration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,
}

/// Non-rendering metadata carried alongside each entry.
#[derive(Debug, Serialize)]
pub struct ExtendedProps {
    pub description: Option<String>,
    pub timezone: String,
    pub tags: Vec<TagRef>,
}

#[derive(Debug, Serialize)]
pub struct TagRef {
    pub id: String,
    pub name: String,
    pub color: String,
}

impl DisplayEvent {
    pub fn from_event(event: &Event) -> Self {
        let tags: Vec<TagRef> = event
            .tags
            .iter()
            .map(|t| TagRef {
                id: t.id.clone(),
                name: t.name.clone(),
                color: t.color.clone(),
            })
            .collect();

        // First tag is authoritative for display color.
        let color = event.tags.first().map(|t| t.color.clone());

        let mut display = DisplayEvent {
            id: event.id.clone(),
            title: event.title.clone(),
            all_day: event.all_day,
            extended_props: ExtendedProps {
                description: event.description.clone(),
                timezone: event.time_zone.clone(),
                tags,
            },
            rrule: None,
            duration: None,
            start: None,
            end: None,
            background_color: color.clone(),
            border_color: color,
        };

        match &event.rrule {
            Some(rrule) => {
                display.rrule = Some(rrule.clone());
                display.duration = if event.all_day {
                    event.duration_days.map(|days| RecurrenceDuration::Days { days })
                } else {
                    event
                        .duration_minutes
                        .map(|minutes| RecurrenceDuration::Minutes { minutes })
                };
            }
            None => {
                display.start = Some(iso8601(event.start));
                display.end = Some(iso8601(event.end));
            }
        }

        display
    }
}

fn iso8601(dt: chrono::DateTime<chrono::Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}
