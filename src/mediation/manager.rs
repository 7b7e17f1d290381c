use super::case::{CaseView, MediationMessage};
use crate::booking::{Actor, Booking, BookingId, BookingStatus, Party};
use crate::error::MarketError;

use chrono::{DateTime, Utc};
use dashmap::DashMap;

/// Keeps the message log of every case, and decides who may read or write it.
///
/// Resolving a case is not done here: it's a booking transition, and goes
/// through the marketplace like every other one.
#[derive(Debug, Default)]
pub struct CaseManager {
    messages: DashMap<BookingId, Vec<MediationMessage>>,
}

impl CaseManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message to the case of `booking`.
    ///
    /// The parties post as themselves, admins post as mediator. Nobody posts
    /// once the case is resolved. The caller must hold the booking lock, so
    /// that the case can't be resolved while the message is appended.
    pub fn post(
        &self,
        booking: &Booking,
        sender: Actor,
        message: &str,
        at: DateTime<Utc>,
    ) -> Result<MediationMessage, MarketError> {
        if !matches!(
            booking.status,
            BookingStatus::Disputed | BookingStatus::InMediation
        ) {
            return Err(MarketError::InvalidTransition(format!(
                "booking {} has no open mediation case ({})",
                booking.id, booking.status
            )));
        }

        let is_from_mediator = match booking.party_of(sender) {
            Party::Requester | Party::Provider => false,
            Party::Mediator => true,
            party => {
                return Err(MarketError::InvalidTransition(format!(
                    "a {} can't post in the mediation case of booking {}",
                    party, booking.id
                )))
            }
        };

        let message = message.trim();
        if message.is_empty() {
            return Err(MarketError::Validation(
                "a mediation message can't be empty".to_string(),
            ));
        }

        let message = MediationMessage {
            // Parties and mediators always have an account.
            sender: sender.account().unwrap_or_default(),
            is_from_mediator,
            message: message.to_string(),
            timestamp: at,
        };
        self.messages
            .entry(booking.id)
            .or_default()
            .push(message.clone());

        tracing::debug!(
            booking = booking.id,
            %sender,
            is_from_mediator,
            "posted mediation message"
        );
        Ok(message)
    }

    /// The messages of a case, in the order they were posted.
    pub fn messages(&self, booking: BookingId) -> Vec<MediationMessage> {
        self.messages
            .get(&booking)
            .map(|messages| messages.clone())
            .unwrap_or_default()
    }

    /// The case of `booking`, as seen by `viewer`. Only the parties and
    /// mediators can see it.
    pub fn view(&self, booking: Booking, viewer: Actor) -> Result<CaseView, MarketError> {
        if !booking.status.has_case() {
            return Err(MarketError::NotFound(booking.id));
        }

        match booking.party_of(viewer) {
            Party::Requester | Party::Provider | Party::Mediator => {}
            party => {
                return Err(MarketError::InvalidTransition(format!(
                    "a {} can't see the mediation case of booking {}",
                    party, booking.id
                )))
            }
        }

        let messages = self.messages(booking.id);
        Ok(CaseView { booking, messages })
    }
}
