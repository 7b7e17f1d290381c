use crate::booking::{Booking, CompletionReport, Hours, Policy, TransitionError};
use crate::ledger::Credits;

use chrono::{DateTime, Utc};

impl Booking {
    // The proposed credits are taken at face value: the requester either
    // confirms them or disputes them. The ceiling is an opt-in sanity check.
    pub(in crate::booking) fn report_completion(
        &mut self,
        actual_duration: Hours,
        proposed_credits: Credits,
        notes: &str,
        now: DateTime<Utc>,
        policy: &Policy,
    ) -> Result<(), TransitionError> {
        if actual_duration <= Hours::ZERO {
            return Err(TransitionError::Validation(
                "the actual duration must be positive".to_string(),
            ));
        }
        if proposed_credits == 0 {
            return Err(TransitionError::Validation(
                "the proposed credits must be positive".to_string(),
            ));
        }
        if let (Some(factor), Some(nominal)) =
            (policy.credit_ceiling_factor, self.service.nominal_credits)
        {
            let ceiling = nominal.saturating_mul(factor);
            if proposed_credits > ceiling {
                return Err(TransitionError::Validation(format!(
                    "{} credits exceeds the ceiling of {} for this service",
                    proposed_credits, ceiling
                )));
            }
        }

        self.confirmed_by_provider = true;
        self.completion = Some(CompletionReport {
            actual_duration,
            proposed_credits,
            notes: notes.to_string(),
            reported_at: now,
        });
        Ok(())
    }
}
