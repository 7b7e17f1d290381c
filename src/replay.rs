//! Replays a CSV event log through a marketplace.
//!
//! The log is parsed on one thread, applied on another, and errors are
//! reported on their own threads (see `error_handler`). Entries are applied in
//! order, one at a time: the log is the order things happened in.

use crate::booking::Command;
use crate::error::MarketError;
use crate::input::{self, Action, LogEntry};
use crate::marketplace::Marketplace;
use crate::{error_handler, output};

use std::sync::mpsc::{self, Receiver};
use std::thread::JoinHandle;
use thiserror::Error;

/// An entry the marketplace refused.
#[derive(Debug, PartialEq, Error)]
#[error("entry {entry}: {source}")]
pub struct ReplayError {
    /// Position of the entry among the well-formed ones, starting at 1.
    pub entry: usize,
    pub source: MarketError,
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to write balances: {0}")]
    Io(#[from] std::io::Error),

    #[error("the replay thread panicked")]
    Panicked,
}

/// Applies one entry. Roles come from the marketplace's configuration, and
/// the entry's own timestamp is used as the instant the event happened.
pub fn apply(market: &Marketplace, entry: LogEntry) -> Result<(), MarketError> {
    let actor = market.config().actor(entry.actor);

    match entry.action {
        Action::Credit(amount) => market.ledger().credit(entry.actor, amount)?,
        Action::Debit(amount) => market.ledger().debit(entry.actor, amount)?,
        Action::Request { provider, service } => {
            market.request_service_at(entry.actor, provider, service, entry.at)?;
        }
        Action::Event { booking, event } => {
            market.apply(Command::new(booking, actor, event).at(entry.at))?;
        }
        Action::Message { booking, text } => {
            market.post_mediation_message_at(booking, actor, &text, entry.at)?;
        }
    }

    Ok(())
}

pub fn process(
    entries: Receiver<LogEntry>,
    market: Marketplace,
) -> (Receiver<ReplayError>, JoinHandle<Marketplace>) {
    let (tx, rx) = mpsc::channel();

    // We apply all entries in a new thread, to be able to stream errors as
    // we go.
    let handle = std::thread::spawn(move || {
        for (index, entry) in entries.into_iter().enumerate() {
            if let Err(source) = apply(&market, entry) {
                // Only fails if nobody listens to errors anymore.
                let _ = tx.send(ReplayError {
                    entry: index + 1,
                    source,
                });
            }
        }

        tracing::debug!(bookings = market.bookings().len(), "replay done");
        market
    });

    (rx, handle)
}

/// Replays `input` through `market`, then writes every account balance to
/// `output`. Returns the marketplace in its final state.
pub fn run(
    input: (impl std::io::Read + Send + 'static),
    output: impl std::io::Write,
    market: Marketplace,
) -> Result<Marketplace, RunError> {
    let (entries, input_errors) = input::parse(input);
    let (replay_errors, replaying) = process(entries, market);
    let sinks = error_handler::sink(input_errors, replay_errors);

    let market = replaying.join().map_err(|_| RunError::Panicked)?;
    for sink in sinks {
        sink.join().map_err(|_| RunError::Panicked)?;
    }

    output::write_accounts(output, &market.ledger().accounts())?;
    Ok(market)
}
