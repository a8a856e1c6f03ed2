//! Core types and logic for the famcal calendar backend.
//!
//! This crate is I/O-free. It holds the domain types (events, tags, user
//! profiles), the recurrence-rule encoder, and the projection of stored
//! events into the shape the calendar widget consumes. The HTTP layer and
//! persistence live in `famcal-server`.

pub mod error;
pub mod event;
pub mod profile;
pub mod projection;
pub mod recurrence;
pub mod tag;

pub use error::{FamcalError, FamcalResult};
pub use event::Event;
pub use profile::UserProfile;
pub use projection::DisplayEvent;
pub use recurrence::{EncodedRecurrence, Recurrence, RecurrenceDuration, RecurrenceFreq};
pub use tag::Tag;
