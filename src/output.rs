use crate::booking::{Booking, BookingId, BookingStatus, ServiceId};
use crate::ledger::{account::Account, AccountId, Credits};

use serde::Serialize;

#[derive(Serialize)]
struct AccountRecord {
    #[serde(rename = "account")]
    account_id: AccountId,

    balance: Credits,

    #[serde(rename = "credited")]
    total_credited: Credits,

    #[serde(rename = "debited")]
    total_debited: Credits,
}

impl AccountRecord {
    fn new(acc: &Account) -> Self {
        let totals = acc.totals();
        Self {
            account_id: acc.id(),
            balance: acc.balance(),
            total_credited: totals.credited(),
            total_debited: totals.debited(),
        }
    }
}

#[derive(Serialize)]
struct BookingRecord {
    #[serde(rename = "booking")]
    booking_id: BookingId,
    requester: AccountId,
    provider: AccountId,
    service: ServiceId,
    status: BookingStatus,

    #[serde(rename = "proposed")]
    proposed_credits: Option<Credits>,

    #[serde(rename = "settled")]
    settled_credits: Option<Credits>,

    reviewed: bool,
}

impl BookingRecord {
    fn new(booking: &Booking) -> Self {
        Self {
            booking_id: booking.id,
            requester: booking.requester,
            provider: booking.provider,
            service: booking.service.id,
            status: booking.status,
            proposed_credits: booking.completion.as_ref().map(|c| c.proposed_credits),
            settled_credits: booking.settled_credits(),
            reviewed: booking.reviewed,
        }
    }
}

// Writes the given accounts to the given stream.
pub fn write_accounts(
    output_stream: impl std::io::Write,
    accounts: &[Account],
) -> Result<(), std::io::Error> {
    let mut writer = csv::Writer::from_writer(output_stream);

    for account in accounts {
        writer.serialize(AccountRecord::new(account))?;
    }

    writer.flush()
}

// Writes a one-line summary of each booking to the given stream.
pub fn write_bookings(
    output_stream: impl std::io::Write,
    bookings: &[Booking],
) -> Result<(), std::io::Error> {
    let mut writer = csv::Writer::from_writer(output_stream);

    for booking in bookings {
        writer.serialize(BookingRecord::new(booking))?;
    }

    writer.flush()
}
