//! Bookings and their lifecycle.
//!
//! A booking is one requester engaging one provider for a service. It only
//! ever changes through `machine::transition`, which checks the event against
//! a single table of allowed (status, event, party) triples, and through
//! `store::BookingStore::commit`, which writes the result only if nobody else
//! committed in between.

pub mod event;
pub mod machine;
pub mod record;
pub mod status;
pub mod store;
mod transition;

use thiserror::Error;

pub use event::{Actor, Command, Event, EventKind, Party};
pub use machine::{transition, valid_events, Policy, Settlement, Transition};
pub use record::{Booking, CompletionReport, MediationRecord, Schedule, ServiceRef};
pub use status::BookingStatus;
pub use store::{BookingStore, StoreError};

pub type BookingId = u32;
pub type ServiceId = u32;

// Durations are expressed in hours, and can be fractional (e.g. 1.5 hours).
// A decimal avoids the usual floating point surprises when comparing them.
pub type Hours = rust_decimal::Decimal;
const HOURS_PRECISION: u32 = 2;

#[derive(Debug, PartialEq, Eq, Clone, Error)]
pub enum TransitionError {
    /// The event isn't allowed in the booking's current status, or not for
    /// this actor.
    #[error("{event} is not allowed for the {party} of a {status} booking")]
    InvalidTransition {
        status: BookingStatus,
        event: EventKind,
        party: Party,
    },

    /// The event itself is malformed.
    #[error("{0}")]
    Validation(String),
}
