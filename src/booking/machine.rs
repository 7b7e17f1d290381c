//! The one authoritative description of what may happen to a booking.
//!
//! `transition` is pure: it takes a snapshot and a command, and returns the
//! next snapshot plus the settlement to run (if any). Persisting the result
//! and moving credits is the caller's job.

use super::event::{Actor, Command, Event, EventKind, Party};
use super::{Booking, BookingId, BookingStatus, TransitionError};
use crate::ledger::{AccountId, Credits};

use std::collections::BTreeSet;

struct Rule {
    from: BookingStatus,
    event: EventKind,
    by: &'static [Party],
    to: BookingStatus,
}

const fn rule(
    from: BookingStatus,
    event: EventKind,
    by: &'static [Party],
    to: BookingStatus,
) -> Rule {
    Rule {
        from,
        event,
        by,
        to,
    }
}

// Every (status, event) pair not listed here is invalid. A terminal status
// only ever loops onto itself.
const RULES: [Rule; 9] = {
    use BookingStatus::*;
    use EventKind as E;

    [
        rule(Pending, E::Accept, &[Party::Provider], Scheduled),
        rule(Pending, E::Reject, &[Party::Provider], Rejected),
        rule(Scheduled, E::ReportCompletion, &[Party::Provider], AwaitingRequesterConfirmation),
        rule(AwaitingRequesterConfirmation, E::Confirm, &[Party::Requester], Completed),
        rule(AwaitingRequesterConfirmation, E::Dispute, &[Party::Requester], Disputed),
        // Normally emitted by the marketplace right after a dispute. A
        // mediator can also pick a disputed booking up by hand.
        rule(Disputed, E::EnterMediation, &[Party::System, Party::Mediator], InMediation),
        rule(InMediation, E::ResolveMediation, &[Party::Mediator], MediationResolved),
        rule(Completed, E::Review, &[Party::Requester], Completed),
        rule(MediationResolved, E::Review, &[Party::Requester], MediationResolved),
    ]
};

/// Knobs that tighten the guards. The defaults accept whatever the
/// provider reports, and rely on disputes to correct it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Policy {
    /// When set, a completion report may propose at most this many times
    /// the service's nominal credits.
    pub credit_ceiling_factor: Option<u64>,
}

/// Credits to move for a booking, and the status the booking must still be
/// in when they move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settlement {
    pub booking_id: BookingId,
    pub from: AccountId,
    pub to: AccountId,
    pub amount: Credits,
    pub source: BookingStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub from: BookingStatus,
    pub next: Booking,
    pub settlement: Option<Settlement>,
}

impl Transition {
    pub fn to(&self) -> BookingStatus {
        self.next.status
    }
}

fn target(
    status: BookingStatus,
    event: EventKind,
    party: Party,
) -> Result<BookingStatus, TransitionError> {
    RULES
        .iter()
        .find(|r| r.from == status && r.event == event && r.by.contains(&party))
        .map(|r| r.to)
        .ok_or(TransitionError::InvalidTransition {
            status,
            event,
            party,
        })
}

/// Computes what `command` does to `booking`, without changing anything.
///
/// The status and role are checked first (`InvalidTransition`), then the
/// event's own guards (`ValidationError`).
pub fn transition(
    booking: &Booking,
    command: &Command,
    policy: &Policy,
) -> Result<Transition, TransitionError> {
    let party = booking.party_of(command.actor);
    let to = target(booking.status, command.event.kind(), party)?;

    let mut next = booking.clone();
    let settlement = match &command.event {
        Event::Accept {
            schedule_date,
            duration,
        } => {
            next.accept(*schedule_date, *duration, command.at)?;
            None
        }
        Event::Reject => None,
        Event::ReportCompletion {
            actual_duration,
            proposed_credits,
            notes,
        } => {
            next.report_completion(*actual_duration, *proposed_credits, notes, command.at, policy)?;
            None
        }
        Event::Confirm => Some(next.confirm()),
        Event::Dispute { reason } => {
            next.dispute(reason)?;
            None
        }
        Event::EnterMediation => {
            next.enter_mediation(command.at);
            None
        }
        Event::ResolveMediation {
            decision,
            final_credits,
        } => next.resolve_mediation(decision, *final_credits, command.at)?,
        Event::Review => {
            next.review(party)?;
            None
        }
    };
    next.status = to;

    Ok(Transition {
        from: booking.status,
        next,
        settlement,
    })
}

/// Events `actor` may currently issue against `booking`, derived from the
/// same table `transition` uses. Meant for rendering affordances: guards on
/// the event payload still apply.
pub fn valid_events(booking: &Booking, actor: Actor) -> BTreeSet<EventKind> {
    let party = booking.party_of(actor);

    RULES
        .iter()
        .filter(|r| r.from == booking.status && r.by.contains(&party))
        .map(|r| r.event)
        .filter(|event| *event != EventKind::Review || !booking.reviewed)
        .collect()
}
