use super::{BookingId, Hours};
use crate::ledger::{AccountId, Credits};

use chrono::{DateTime, Utc};
use std::fmt;

/// Who is issuing an event, as established by the authentication layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Actor {
    /// Any signed-in member.
    Member(AccountId),
    /// A member with the admin role, allowed to mediate.
    Admin(AccountId),
    /// The marketplace itself (e.g. escalating a dispute to mediation).
    System,
}

impl Actor {
    pub fn account(&self) -> Option<AccountId> {
        match self {
            Self::Member(id) | Self::Admin(id) => Some(*id),
            Self::System => None,
        }
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Member(id) => write!(f, "member {}", id),
            Self::Admin(id) => write!(f, "admin {}", id),
            Self::System => f.write_str("system"),
        }
    }
}

/// The role an actor plays with regards to one booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Party {
    Requester,
    Provider,
    Mediator,
    System,
    /// Not involved in the booking at all.
    Outsider,
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Requester => "requester",
            Self::Provider => "provider",
            Self::Mediator => "mediator",
            Self::System => "system",
            Self::Outsider => "outsider",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The provider accepts and schedules the request.
    Accept {
        schedule_date: DateTime<Utc>,
        duration: Hours,
    },
    /// The provider turns the request down.
    Reject,
    /// The provider reports the work as done and proposes what it's worth.
    ReportCompletion {
        actual_duration: Hours,
        proposed_credits: Credits,
        notes: String,
    },
    /// The requester agrees with the report. Settles the booking.
    Confirm,
    /// The requester contests the report.
    Dispute { reason: String },
    /// A disputed booking is handed over to a mediator.
    EnterMediation,
    /// The mediator's binding decision. Settles the booking.
    ResolveMediation {
        decision: String,
        final_credits: Credits,
    },
    /// The requester filed a review. Doesn't change the status.
    Review,
}

impl Event {
    // The constructors ensure we can only create durations with a precision of 2 decimal places.
    pub fn accept(schedule_date: DateTime<Utc>, duration: Hours) -> Self {
        Self::Accept {
            schedule_date,
            duration: duration.round_dp(super::HOURS_PRECISION),
        }
    }

    pub fn report_completion(
        actual_duration: Hours,
        proposed_credits: Credits,
        notes: impl Into<String>,
    ) -> Self {
        Self::ReportCompletion {
            actual_duration: actual_duration.round_dp(super::HOURS_PRECISION),
            proposed_credits,
            notes: notes.into(),
        }
    }

    pub fn dispute(reason: impl Into<String>) -> Self {
        Self::Dispute {
            reason: reason.into(),
        }
    }

    pub fn resolve_mediation(decision: impl Into<String>, final_credits: Credits) -> Self {
        Self::ResolveMediation {
            decision: decision.into(),
            final_credits,
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            Self::Accept { .. } => EventKind::Accept,
            Self::Reject => EventKind::Reject,
            Self::ReportCompletion { .. } => EventKind::ReportCompletion,
            Self::Confirm => EventKind::Confirm,
            Self::Dispute { .. } => EventKind::Dispute,
            Self::EnterMediation => EventKind::EnterMediation,
            Self::ResolveMediation { .. } => EventKind::ResolveMediation,
            Self::Review => EventKind::Review,
        }
    }
}

/// An event without its payload, e.g. to list what an actor may do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    Accept,
    Reject,
    ReportCompletion,
    Confirm,
    Dispute,
    EnterMediation,
    ResolveMediation,
    Review,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Accept => "accept",
            Self::Reject => "reject",
            Self::ReportCompletion => "report_completion",
            Self::Confirm => "confirm",
            Self::Dispute => "dispute",
            Self::EnterMediation => "enter_mediation",
            Self::ResolveMediation => "resolve_mediation",
            Self::Review => "review",
        })
    }
}

/// An event issued by an actor against one booking, at a given instant.
///
/// Carrying the instant keeps the state machine pure: guards such as "the
/// schedule date is in the future" compare against `at`, not the wall clock.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub booking_id: BookingId,
    pub actor: Actor,
    pub at: DateTime<Utc>,
    pub event: Event,
}

impl Command {
    pub fn new(booking_id: BookingId, actor: Actor, event: Event) -> Self {
        Self {
            booking_id,
            actor,
            at: Utc::now(),
            event,
        }
    }

    pub fn at(mut self, at: DateTime<Utc>) -> Self {
        self.at = at;
        self
    }
}

#[test]
// Durations are rounded to 2 decimal places. We should be unable to have more precise durations.
fn test_event_hours_precision() {
    use rust_decimal_macros::dec;

    for (raw, want) in vec![
        (dec!(1.0), dec!(1.0)),
        (dec!(0.999), dec!(1.0)),
        (dec!(1.5), dec!(1.5)),
        (dec!(1.234), dec!(1.23)),
        (dec!(1.235), dec!(1.24)),
    ] {
        match Event::report_completion(raw, 1, "") {
            Event::ReportCompletion {
                actual_duration, ..
            } => assert_eq!(want, actual_duration),
            other => panic!("unexpected event {:?}", other),
        }
    }
}
