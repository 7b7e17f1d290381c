use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a booking is in its lifecycle.
///
/// ```text
/// pending ──▶ scheduled ──▶ awaiting_requester_confirmation ──▶ completed
///    │                                   │
///    ▼                                   ▼
/// rejected                           disputed ──▶ in_mediation ──▶ mediation_resolved
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Scheduled,
    AwaitingRequesterConfirmation,
    Completed,
    Disputed,
    InMediation,
    MediationResolved,
    Rejected,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 8] = [
        Self::Pending,
        Self::Scheduled,
        Self::AwaitingRequesterConfirmation,
        Self::Completed,
        Self::Disputed,
        Self::InMediation,
        Self::MediationResolved,
        Self::Rejected,
    ];

    /// Terminal bookings never change status again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Rejected | Self::MediationResolved
        )
    }

    /// Whether the booking is (or was) attached to a mediation case.
    pub fn has_case(&self) -> bool {
        matches!(
            self,
            Self::Disputed | Self::InMediation | Self::MediationResolved
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Scheduled => "scheduled",
            Self::AwaitingRequesterConfirmation => "awaiting_requester_confirmation",
            Self::Completed => "completed",
            Self::Disputed => "disputed",
            Self::InMediation => "in_mediation",
            Self::MediationResolved => "mediation_resolved",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
