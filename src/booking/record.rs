use super::event::{Actor, Party};
use super::{BookingId, BookingStatus, Hours, ServiceId, TransitionError};
use crate::ledger::{AccountId, Credits};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// The service being booked. The nominal credit value is informational: the
/// amount settled is whatever the provider reports (or the mediator decides).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceRef {
    pub id: ServiceId,
    pub nominal_credits: Option<Credits>,
}

impl ServiceRef {
    pub fn new(id: ServiceId) -> Self {
        Self {
            id,
            nominal_credits: None,
        }
    }

    pub fn with_nominal_credits(mut self, credits: Credits) -> Self {
        self.nominal_credits = Some(credits);
        self
    }
}

/// Set when the provider accepts the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Schedule {
    pub date: DateTime<Utc>,
    pub duration: Hours,
}

/// Set once, when the provider reports the work as done.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionReport {
    pub actual_duration: Hours,
    pub proposed_credits: Credits,
    pub notes: String,
    pub reported_at: DateTime<Utc>,
}

/// Owned by the mediation workflow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MediationRecord {
    pub requested_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub decision: Option<String>,
    pub final_credits: Option<Credits>,
    pub credit_transferred: bool,
}

/// One requester engaging one provider for a service.
///
/// Bookings handed out by the store are snapshots: changing one has no effect
/// on the stored booking, which only changes through committed transitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Booking {
    pub id: BookingId,
    pub requester: AccountId,
    pub provider: AccountId,
    pub service: ServiceRef,
    pub status: BookingStatus,
    pub date_requested: DateTime<Utc>,
    pub schedule: Option<Schedule>,
    pub confirmed_by_provider: bool,
    pub confirmed_by_requester: bool,
    pub completion: Option<CompletionReport>,
    pub dispute_reason: Option<String>,
    pub mediation: MediationRecord,
    pub reviewed: bool,

    // Bumped by every committed transition. Used as the concurrency token.
    pub revision: u64,
}

impl Booking {
    pub(crate) fn new(
        id: BookingId,
        requester: AccountId,
        provider: AccountId,
        service: ServiceRef,
        date_requested: DateTime<Utc>,
    ) -> Result<Self, TransitionError> {
        if requester == provider {
            return Err(TransitionError::Validation(
                "a member cannot book their own service".to_string(),
            ));
        }

        Ok(Self {
            id,
            requester,
            provider,
            service,
            status: BookingStatus::Pending,
            date_requested,
            schedule: None,
            confirmed_by_provider: false,
            confirmed_by_requester: false,
            completion: None,
            dispute_reason: None,
            mediation: MediationRecord::default(),
            reviewed: false,
            revision: 0,
        })
    }

    /// The role `actor` plays in this booking. Being a party wins over being
    /// an admin: an admin can't mediate their own booking.
    pub fn party_of(&self, actor: Actor) -> Party {
        match actor {
            Actor::System => Party::System,
            Actor::Member(id) | Actor::Admin(id) if id == self.requester => Party::Requester,
            Actor::Member(id) | Actor::Admin(id) if id == self.provider => Party::Provider,
            Actor::Admin(_) => Party::Mediator,
            Actor::Member(_) => Party::Outsider,
        }
    }

    /// Credits that moved from the requester to the provider, if any.
    pub fn settled_credits(&self) -> Option<Credits> {
        match self.status {
            BookingStatus::Completed => self.completion.as_ref().map(|c| c.proposed_credits),
            BookingStatus::MediationResolved if self.mediation.credit_transferred => {
                self.mediation.final_credits
            }
            _ => None,
        }
    }

    /// Whether the auxiliary fields match what the status says happened,
    /// e.g. a dispute reason is set iff the booking went through `disputed`.
    pub fn is_consistent(&self) -> bool {
        use BookingStatus::*;

        let scheduled = !matches!(self.status, Pending | Rejected);
        let reported = !matches!(self.status, Pending | Rejected | Scheduled);
        let disputed = self.status.has_case();
        let mediated = matches!(self.status, InMediation | MediationResolved);
        let resolved = self.status == MediationResolved;
        let mediation = &self.mediation;

        self.schedule.is_some() == scheduled
            && self.completion.is_some() == reported
            && self.confirmed_by_provider == reported
            && self.confirmed_by_requester == (self.status == Completed)
            && self.dispute_reason.is_some() == disputed
            && mediation.requested_at.is_some() == mediated
            && mediation.resolved_at.is_some() == resolved
            && mediation.decision.is_some() == resolved
            && mediation.final_credits.is_some() == resolved
            && mediation.credit_transferred == (resolved && mediation.final_credits > Some(0))
            && (!self.reviewed || matches!(self.status, Completed | MediationResolved))
    }
}
