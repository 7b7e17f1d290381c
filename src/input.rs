use crate::booking::{BookingId, Event, ServiceId, ServiceRef};
use crate::ledger::{AccountId, Credits};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::mpsc::{self, Receiver, Sender};

#[derive(Debug, PartialEq)]
pub enum Error {
    Csv(String),    // CSV is malformed
    Format(String), // Data format is incorrect
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err.to_string())
    }
}

impl From<&'static str> for Error {
    fn from(err: &'static str) -> Self {
        Self::Format(err.to_string())
    }
}

/// What one line of the event log asks for.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Credits bought from outside the system.
    Credit(Credits),
    /// Credits cashed out.
    Debit(Credits),
    Request {
        provider: AccountId,
        service: ServiceRef,
    },
    Event {
        booking: BookingId,
        event: Event,
    },
    Message {
        booking: BookingId,
        text: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub at: DateTime<Utc>,
    pub actor: AccountId,
    pub action: Action,
}

// Bad lines are streamed as errors and skipped, rather than aborting the
// whole replay: an event log is append-only, so we can't fix it and try
// again like we would with a hand-written file.
pub fn parse(
    input_stream: (impl std::io::Read + Send + 'static),
) -> (Receiver<LogEntry>, Receiver<Error>) {
    let (entry_tx, entry_rx): (Sender<LogEntry>, Receiver<LogEntry>) = mpsc::channel();
    let (error_tx, error_rx): (Sender<Error>, Receiver<Error>) = mpsc::channel();

    let buffered = std::io::BufReader::new(input_stream);
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(buffered);

    // Moving to a new thread so we can start replaying the log immediately.
    std::thread::spawn(move || {
        for record in reader.deserialize::<EventRecord>() {
            // Sending only fails once the receiving end is gone, i.e. nobody
            // cares about the rest of the log anymore.
            let sent = match convert(record) {
                Ok(entry) => entry_tx.send(entry).is_ok(),
                Err(err) => error_tx.send(err).is_ok(),
            };
            if !sent {
                break;
            }
        }
    });

    (entry_rx, error_rx)
}

// Convert from a csv deserialise result into a log entry result.
fn convert(record: Result<EventRecord, csv::Error>) -> Result<LogEntry, Error> {
    Ok(record?.try_into()?)
}

// EventRecord is the flat shape of a CSV line. Every column but `type`, `at`
// and `actor` is optional, and which ones are required depends on `type`:
// converting into a LogEntry is where that gets checked.
#[derive(Debug, Deserialize)]
pub struct EventRecord {
    #[serde(rename = "type")]
    record_type: EventRecordType,
    at: DateTime<Utc>,
    actor: AccountId,
    booking: Option<BookingId>,
    provider: Option<AccountId>,
    service: Option<ServiceId>,
    date: Option<DateTime<Utc>>,
    hours: Option<Decimal>,
    credits: Option<Credits>,
    text: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum EventRecordType {
    Credit,
    Debit,
    Request,
    Accept,
    Reject,
    Complete,
    Confirm,
    Dispute,
    Escalate,
    Resolve,
    Message,
    Review,
}

impl TryFrom<EventRecord> for LogEntry {
    type Error = &'static str;

    fn try_from(record: EventRecord) -> Result<Self, Self::Error> {
        use EventRecordType as T;

        let booking = match record.record_type {
            T::Credit | T::Debit | T::Request => 0,
            _ => record.booking.ok_or("missing booking")?,
        };
        let text = record.text.unwrap_or_default();

        let action = match record.record_type {
            T::Credit => Action::Credit(record.credits.ok_or("missing credits for credit")?),
            T::Debit => Action::Debit(record.credits.ok_or("missing credits for debit")?),
            T::Request => {
                let service_id = record.service.ok_or("missing service for request")?;
                let mut service = ServiceRef::new(service_id);
                service.nominal_credits = record.credits;
                Action::Request {
                    provider: record.provider.ok_or("missing provider for request")?,
                    service,
                }
            }
            T::Accept => Action::Event {
                booking,
                event: Event::accept(
                    record.date.ok_or("missing date for accept")?,
                    record.hours.ok_or("missing hours for accept")?,
                ),
            },
            T::Reject => Action::Event {
                booking,
                event: Event::Reject,
            },
            T::Complete => Action::Event {
                booking,
                event: Event::report_completion(
                    record.hours.ok_or("missing hours for complete")?,
                    record.credits.ok_or("missing credits for complete")?,
                    text,
                ),
            },
            T::Confirm => Action::Event {
                booking,
                event: Event::Confirm,
            },
            T::Dispute => Action::Event {
                booking,
                event: Event::dispute(text),
            },
            T::Escalate => Action::Event {
                booking,
                event: Event::EnterMediation,
            },
            T::Resolve => Action::Event {
                booking,
                event: Event::resolve_mediation(
                    text,
                    record.credits.ok_or("missing credits for resolve")?,
                ),
            },
            T::Message => Action::Message { booking, text },
            T::Review => Action::Event {
                booking,
                event: Event::Review,
            },
        };

        Ok(Self {
            at: record.at,
            actor: record.actor,
            action,
        })
    }
}
