use crate::booking::{Booking, Settlement};
use crate::error::MarketError;
use crate::ledger::Ledger;

/// Moves the credits of a booking.
///
/// Must run while the booking is locked at the revision the settlement was
/// computed from. `booking` is the locked booking: if it already left the
/// settlement's source status, nothing moves.
pub fn settle(
    ledger: &Ledger,
    booking: &Booking,
    settlement: &Settlement,
) -> Result<(), MarketError> {
    if booking.id != settlement.booking_id || booking.status != settlement.source {
        tracing::warn!(
            booking = booking.id,
            status = %booking.status,
            expected = %settlement.source,
            "booking left the settlement status, skipping"
        );
        return Err(MarketError::InvalidTransition(format!(
            "booking {} is {}, not {}: already settled",
            booking.id, booking.status, settlement.source
        )));
    }

    ledger.transfer(settlement.from, settlement.to, settlement.amount)?;

    tracing::info!(
        booking = booking.id,
        from = settlement.from,
        to = settlement.to,
        amount = settlement.amount,
        "settled booking"
    );
    Ok(())
}
