use crate::booking::{Booking, Settlement};

impl Booking {
    // Settles on the provider's own report: confirming is the requester
    // agreeing with it.
    pub(in crate::booking) fn confirm(&mut self) -> Settlement {
        let amount = self
            .completion
            .as_ref()
            .map(|report| report.proposed_credits)
            .unwrap_or_default();

        self.confirmed_by_requester = true;
        Settlement {
            booking_id: self.id,
            from: self.requester,
            to: self.provider,
            amount,
            source: self.status,
        }
    }
}
