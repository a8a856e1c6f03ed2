//! Recurrence-rule encoding for repeating events.
//!
//! Turns the recurrence configuration submitted by the event form into the
//! RRULE string stored on the event row, plus the duration value the
//! calendar widget needs to expand occurrences client-side.
//!
//! Anchor (`DTSTART`) and `UNTIL` clauses are rendered in the event's local
//! wall-clock time, never shifted to UTC. A series anchored at 09:00 local
//! must stay at 09:00 across a daylight-saving boundary; a UTC-shifted
//! anchor would drift by an hour and can move all-day events to the wrong
//! day entirely.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Two-letter iCalendar day codes, Sunday-first to match weekday indices.
const DAY_CODES: [&str; 7] = ["SU", "MO", "TU", "WE", "TH", "FR", "SA"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurrenceFreq {
    #[default]
    None,
    Weekly,
    Monthly,
}

/// Recurrence configuration as submitted by the event form.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Recurrence {
    #[serde(rename = "type")]
    pub freq: RecurrenceFreq,
    /// Repeat every N weeks/months. Values below 1 are clamped to 1.
    pub interval: u32,
    /// Weekday indices, 0 = Sunday .. 6 = Saturday. Weekly only.
    pub by_weekday: Vec<u8>,
    /// Day of month, 1-31. Monthly only.
    pub by_month_day: Option<u8>,
    /// Candidate end date. An unparseable value is dropped from the rule
    /// rather than rejected.
    pub until: Option<String>,
}

impl Default for Recurrence {
    fn default() -> Self {
        Recurrence {
            freq: RecurrenceFreq::None,
            interval: 1,
            by_weekday: Vec::new(),
            by_month_day: None,
            until: None,
        }
    }
}

/// Duration of one occurrence, in the unit matching the all-day flag.
///
/// Serializes to the `{ "days": n }` / `{ "minutes": n }` object the
/// calendar widget pairs with an `rrule`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RecurrenceDuration {
    Days { days: i64 },
    Minutes { minutes: i64 },
}

/// Result of encoding a non-"none" recurrence configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedRecurrence {
    pub rrule: String,
    pub duration: RecurrenceDuration,
}

impl EncodedRecurrence {
    pub fn duration_days(&self) -> Option<i64> {
        match self.duration {
            RecurrenceDuration::Days { days } => Some(days),
            RecurrenceDuration::Minutes { .. } => None,
        }
    }

    pub fn duration_minutes(&self) -> Option<i64> {
        match self.duration {
            RecurrenceDuration::Minutes { minutes } => Some(minutes),
            RecurrenceDuration::Days { .. } => None,
        }
    }
}

impl Recurrence {
    /// Encode this configuration against the event's local wall-clock
    /// start/end. Returns `None` when the frequency is "none": such events
    /// carry no rule and no duration.
    pub fn encode(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
        all_day: bool,
    ) -> Option<EncodedRecurrence> {
        let freq = match self.freq {
            RecurrenceFreq::None => return None,
            RecurrenceFreq::Weekly => "WEEKLY",
            RecurrenceFreq::Monthly => "MONTHLY",
        };

        let mut parts = vec![
            format!("FREQ={freq}"),
            format!("INTERVAL={}", self.interval.max(1)),
            format!("DTSTART={}", format_local(start, all_day)),
        ];

        if self.freq == RecurrenceFreq::Weekly {
            let mut days: Vec<u8> = self
                .by_weekday
                .iter()
                .copied()
                .filter(|d| *d < 7)
                .collect();
            days.sort_unstable();
            days.dedup();
            if !days.is_empty() {
                let codes: Vec<&str> = days.iter().map(|d| DAY_CODES[*d as usize]).collect();
                parts.push(format!("BYDAY={}", codes.join(",")));
            }
        }

        if self.freq == RecurrenceFreq::Monthly {
            if let Some(day) = self.by_month_day.filter(|d| (1..=31).contains(d)) {
                parts.push(format!("BYMONTHDAY={day}"));
            }
        }

        if let Some(until) = self.until.as_deref().and_then(parse_until) {
            parts.push(format!("UNTIL={}", format_local(until, all_day)));
        }

        let duration = if all_day {
            RecurrenceDuration::Days {
                days: span_days(start, end),
            }
        } else {
            RecurrenceDuration::Minutes {
                minutes: (end - start).num_minutes().max(1),
            }
        };

        Some(EncodedRecurrence {
            rrule: parts.join(";"),
            duration,
        })
    }
}

/// Render a local wall-clock timestamp for DTSTART/UNTIL. All-day events
/// use the date-only form.
fn format_local(dt: NaiveDateTime, all_day: bool) -> String {
    if all_day {
        dt.format("%Y%m%d").to_string()
    } else {
        dt.format("%Y%m%dT%H%M%S").to_string()
    }
}

/// Inclusive day span between start and end, rounded up, minimum 1.
fn span_days(start: NaiveDateTime, end: NaiveDateTime) -> i64 {
    let secs = (end - start).num_seconds();
    if secs <= 0 {
        return 1;
    }
    (secs + 86_399) / 86_400
}

/// Lenient end-date parsing: a plain date or a local date-time, with or
/// without seconds. Anything else is treated as "no end date".
fn parse_until(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0);
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    None
}
