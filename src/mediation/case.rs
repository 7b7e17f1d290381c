use crate::booking::{Booking, BookingStatus, CompletionReport, Schedule, ServiceRef};
use crate::ledger::AccountId;

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediationMessage {
    pub sender: AccountId,
    pub is_from_mediator: bool,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Everything a mediator needs to decide on a case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseView {
    pub booking: Booking,
    pub messages: Vec<MediationMessage>,
}

impl CaseView {
    pub fn status(&self) -> BookingStatus {
        self.booking.status
    }

    pub fn service(&self) -> &ServiceRef {
        &self.booking.service
    }

    pub fn schedule(&self) -> Option<&Schedule> {
        self.booking.schedule.as_ref()
    }

    /// What the provider claimed.
    pub fn completion_report(&self) -> Option<&CompletionReport> {
        self.booking.completion.as_ref()
    }

    /// Why the requester contested it.
    pub fn dispute_reason(&self) -> Option<&str> {
        self.booking.dispute_reason.as_deref()
    }
}
