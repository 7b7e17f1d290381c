use crate::booking::{Booking, Hours, Schedule, TransitionError};

use chrono::{DateTime, Utc};

impl Booking {
    pub(in crate::booking) fn accept(
        &mut self,
        date: DateTime<Utc>,
        duration: Hours,
        now: DateTime<Utc>,
    ) -> Result<(), TransitionError> {
        if date <= now {
            return Err(TransitionError::Validation(
                "the schedule date must be in the future".to_string(),
            ));
        }
        if duration <= Hours::ZERO {
            return Err(TransitionError::Validation(
                "the service duration must be positive".to_string(),
            ));
        }

        self.schedule = Some(Schedule { date, duration });
        Ok(())
    }
}
