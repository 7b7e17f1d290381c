use crate::booking::{Booking, TransitionError};

impl Booking {
    pub(in crate::booking) fn dispute(&mut self, reason: &str) -> Result<(), TransitionError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(TransitionError::Validation(
                "a dispute needs a reason".to_string(),
            ));
        }

        self.dispute_reason = Some(reason.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod dispute_tests {
    use crate::booking::record::fixtures;
    use crate::booking::{BookingStatus, TransitionError};

    #[test]
    fn test_dispute_ok() {
        let mut booking = fixtures::booking(BookingStatus::AwaitingRequesterConfirmation);

        assert_eq!(Ok(()), booking.dispute("  only half the work was done "));
        assert_eq!(
            Some("only half the work was done".to_string()),
            booking.dispute_reason
        );
        // The provider's report is kept as-is for the mediator.
        assert_eq!(5, booking.completion.unwrap().proposed_credits);
    }

    #[test]
    fn test_dispute_without_reason() {
        for reason in vec!["", "   ", "\n"] {
            let mut booking = fixtures::booking(BookingStatus::AwaitingRequesterConfirmation);

            let got = booking.dispute(reason);
            assert!(matches!(got, Err(TransitionError::Validation(_))));
            assert_eq!(None, booking.dispute_reason);
        }
    }
}
