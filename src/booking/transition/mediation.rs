use crate::booking::{Booking, Settlement, TransitionError};
use crate::ledger::Credits;

use chrono::{DateTime, Utc};

impl Booking {
    pub(in crate::booking) fn enter_mediation(&mut self, now: DateTime<Utc>) {
        self.mediation.requested_at = Some(now);
    }

    /// Records the mediator's decision. Zero final credits is a valid
    /// decision (nothing is owed), in which case nothing needs settling.
    pub(in crate::booking) fn resolve_mediation(
        &mut self,
        decision: &str,
        final_credits: Credits,
        now: DateTime<Utc>,
    ) -> Result<Option<Settlement>, TransitionError> {
        let decision = decision.trim();
        if decision.is_empty() {
            return Err(TransitionError::Validation(
                "a mediation decision can't be empty".to_string(),
            ));
        }

        self.mediation.decision = Some(decision.to_string());
        self.mediation.final_credits = Some(final_credits);
        self.mediation.resolved_at = Some(now);

        // The transition only commits if the transfer succeeds, so this
        // can be set ahead of it.
        self.mediation.credit_transferred = final_credits > 0;

        Ok((final_credits > 0).then(|| Settlement {
            booking_id: self.id,
            from: self.requester,
            to: self.provider,
            amount: final_credits,
            source: self.status,
        }))
    }
}
