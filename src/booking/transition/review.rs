use crate::booking::{Booking, EventKind, Party, TransitionError};

impl Booking {
    pub(in crate::booking) fn review(&mut self, party: Party) -> Result<(), TransitionError> {
        if self.reviewed {
            return Err(TransitionError::InvalidTransition {
                status: self.status,
                event: EventKind::Review,
                party,
            });
        }

        self.reviewed = true;
        Ok(())
    }
}
