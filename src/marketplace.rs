//! The boundary of the booking core.
//!
//! Every inbound event goes through `Marketplace::apply`, which:
//! 1. reads a snapshot of the booking,
//! 2. computes the transition (pure, no side effect),
//! 3. commits it if the booking is still at the revision read, running the
//!    settlement (if any) while the booking is locked,
//! 4. notifies the outside world.
//!
//! Losing a race at step 3 starts over from step 1, so a duplicate event
//! ends up rejected by the state machine rather than applied twice.

use crate::booking::{
    self, Actor, Booking, BookingId, BookingStatus, BookingStore, Command, Event, EventKind,
    Hours, Policy, ServiceRef, Transition,
};
use crate::config::Config;
use crate::error::MarketError;
use crate::ledger::{AccountId, Credits, Ledger};
use crate::mediation::{CaseManager, CaseView, MediationMessage};
use crate::notify::{BookingStateChanged, NoopNotifier, Notifier};
use crate::settlement;

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

pub struct Marketplace {
    config: Config,
    policy: Policy,
    ledger: Ledger,
    bookings: BookingStore,
    cases: CaseManager,
    notifier: Box<dyn Notifier>,
}

impl Default for Marketplace {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl Marketplace {
    pub fn new(config: Config) -> Self {
        Self {
            policy: config.policy(),
            config,
            ledger: Ledger::new(),
            bookings: BookingStore::new(),
            cases: CaseManager::new(),
            notifier: Box::new(NoopNotifier),
        }
    }

    pub fn with_notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Box::new(notifier);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The ledger, for the purchase and cashout flows (`credit`/`debit`) and
    /// for balance reads.
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Display-only balance read. The authoritative check happens during
    /// settlement.
    pub fn balance(&self, account: AccountId) -> Credits {
        self.ledger.balance(account)
    }

    pub fn booking(&self, id: BookingId) -> Result<Booking, MarketError> {
        Ok(self.bookings.get(id)?)
    }

    pub fn bookings(&self) -> Vec<Booking> {
        self.bookings.list()
    }

    /// What `actor` may do next with a booking.
    pub fn valid_events(
        &self,
        id: BookingId,
        actor: Actor,
    ) -> Result<BTreeSet<EventKind>, MarketError> {
        Ok(booking::valid_events(&self.bookings.get(id)?, actor))
    }

    pub fn request_service(
        &self,
        requester: AccountId,
        provider: AccountId,
        service: ServiceRef,
    ) -> Result<Booking, MarketError> {
        self.request_service_at(requester, provider, service, Utc::now())
    }

    pub fn request_service_at(
        &self,
        requester: AccountId,
        provider: AccountId,
        service: ServiceRef,
        at: DateTime<Utc>,
    ) -> Result<Booking, MarketError> {
        let booking = self.bookings.create(requester, provider, service, at)?;
        tracing::info!(
            booking = booking.id,
            requester,
            provider,
            service = booking.service.id,
            "service requested"
        );
        Ok(booking)
    }

    pub fn accept(
        &self,
        id: BookingId,
        actor: Actor,
        schedule_date: DateTime<Utc>,
        duration: Hours,
    ) -> Result<Booking, MarketError> {
        self.apply(Command::new(id, actor, Event::accept(schedule_date, duration)))
    }

    pub fn reject(&self, id: BookingId, actor: Actor) -> Result<Booking, MarketError> {
        self.apply(Command::new(id, actor, Event::Reject))
    }

    pub fn report_completion(
        &self,
        id: BookingId,
        actor: Actor,
        actual_duration: Hours,
        proposed_credits: Credits,
        notes: &str,
    ) -> Result<Booking, MarketError> {
        self.apply(Command::new(
            id,
            actor,
            Event::report_completion(actual_duration, proposed_credits, notes),
        ))
    }

    pub fn confirm(&self, id: BookingId, actor: Actor) -> Result<Booking, MarketError> {
        self.apply(Command::new(id, actor, Event::Confirm))
    }

    pub fn dispute(
        &self,
        id: BookingId,
        actor: Actor,
        reason: &str,
    ) -> Result<Booking, MarketError> {
        self.apply(Command::new(id, actor, Event::dispute(reason)))
    }

    pub fn enter_mediation(&self, id: BookingId, actor: Actor) -> Result<Booking, MarketError> {
        self.apply(Command::new(id, actor, Event::EnterMediation))
    }

    pub fn resolve_mediation(
        &self,
        id: BookingId,
        actor: Actor,
        decision: &str,
        final_credits: Credits,
    ) -> Result<Booking, MarketError> {
        self.apply(Command::new(
            id,
            actor,
            Event::resolve_mediation(decision, final_credits),
        ))
    }

    pub fn mark_reviewed(&self, id: BookingId, actor: Actor) -> Result<Booking, MarketError> {
        self.apply(Command::new(id, actor, Event::Review))
    }

    pub fn post_mediation_message(
        &self,
        id: BookingId,
        actor: Actor,
        message: &str,
    ) -> Result<MediationMessage, MarketError> {
        self.post_mediation_message_at(id, actor, message, Utc::now())
    }

    pub fn post_mediation_message_at(
        &self,
        id: BookingId,
        actor: Actor,
        message: &str,
        at: DateTime<Utc>,
    ) -> Result<MediationMessage, MarketError> {
        self.bookings
            .inspect(id, |booking| self.cases.post(booking, actor, message, at))
    }

    pub fn case_view(&self, id: BookingId, viewer: Actor) -> Result<CaseView, MarketError> {
        self.cases.view(self.bookings.get(id)?, viewer)
    }

    /// Cases waiting for a mediator's decision.
    pub fn open_cases(&self) -> Vec<Booking> {
        self.bookings.with_status(BookingStatus::InMediation)
    }

    /// Applies one event. A dispute is escalated to mediation right away
    /// when `auto_escalate` is set, in which case the escalated booking is
    /// returned.
    pub fn apply(&self, command: Command) -> Result<Booking, MarketError> {
        let booking = self.commit(&command).map_err(|err| {
            tracing::warn!(
                booking = command.booking_id,
                actor = %command.actor,
                event = %command.event.kind(),
                %err,
                "event rejected"
            );
            err
        })?;

        if booking.status != BookingStatus::Disputed || !self.config.auto_escalate {
            return Ok(booking);
        }

        let escalation = Command {
            booking_id: booking.id,
            actor: Actor::System,
            at: command.at,
            event: Event::EnterMediation,
        };
        match self.commit(&escalation) {
            Ok(escalated) => Ok(escalated),
            Err(err) => {
                // The dispute itself is committed: a mediator can still pick
                // the booking up by hand.
                tracing::warn!(booking = booking.id, %err, "dispute not escalated to mediation");
                Ok(booking)
            }
        }
    }

    fn commit(&self, command: &Command) -> Result<Booking, MarketError> {
        let mut retries = 0;

        loop {
            let snapshot = self.bookings.get(command.booking_id)?;
            let transition = booking::transition(&snapshot, command, &self.policy)?;

            match self
                .bookings
                .commit(snapshot.id, snapshot.revision, |current| self.settle(current, &transition))
            {
                Ok(committed) => {
                    self.committed(&transition, command);
                    return Ok(committed);
                }
                Err(MarketError::Conflict(id)) if retries < self.config.max_conflict_retries => {
                    retries += 1;
                    tracing::debug!(booking = id, retries, "lost a race, retrying");
                }
                Err(err) => return Err(err),
            }
        }
    }

    // Runs with the booking locked.
    fn settle(&self, current: &Booking, transition: &Transition) -> Result<Booking, MarketError> {
        if let Some(due) = &transition.settlement {
            settlement::settle(&self.ledger, current, due).map_err(|err| {
                match &err {
                    MarketError::InsufficientFunds { .. } => tracing::warn!(
                        booking = current.id,
                        %err,
                        "settlement refused, booking left as it was"
                    ),
                    MarketError::InvalidTransition(_) => {}
                    _ => tracing::error!(booking = current.id, %err, "settlement failed"),
                }
                err
            })?;
        }

        Ok(transition.next.clone())
    }

    fn committed(&self, transition: &Transition, command: &Command) {
        let next = &transition.next;
        tracing::info!(
            booking = next.id,
            from = %transition.from,
            to = %transition.to(),
            actor = %command.actor,
            event = %command.event.kind(),
            "booking updated"
        );

        if transition.from == transition.to() {
            return;
        }

        let event = BookingStateChanged {
            booking_id: next.id,
            from: transition.from,
            to: transition.to(),
            requester: next.requester,
            provider: next.provider,
            actor: command.actor,
            at: command.at,
        };
        if let Err(err) = self.notifier.notify(&event) {
            tracing::warn!(booking = next.id, %err, "state change not delivered");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Marketplace;
    use crate::booking::{Actor, BookingStatus, EventKind, ServiceRef};
    use crate::config::Config;
    use crate::error::MarketError;
    use crate::notify::ChannelNotifier;

    use chrono::{Duration, Utc};
    use rust_decimal_macros::dec;

    const REQUESTER: u32 = 1;
    const PROVIDER: u32 = 2;
    const ADMIN: u32 = 99;

    // A booking waiting for the requester to confirm 5 credits.
    fn awaiting_confirmation(market: &Marketplace) -> u32 {
        let booking = market
            .request_service(REQUESTER, PROVIDER, ServiceRef::new(1))
            .unwrap();
        market
            .accept(
                booking.id,
                Actor::Member(PROVIDER),
                Utc::now() + Duration::days(1),
                dec!(2),
            )
            .unwrap();
        market
            .report_completion(booking.id, Actor::Member(PROVIDER), dec!(2), 5, "done")
            .unwrap();
        booking.id
    }

    #[test]
    fn test_confirm_settles() {
        let market = Marketplace::default();
        market.ledger().credit(REQUESTER, 10).unwrap();
        let id = awaiting_confirmation(&market);

        let booking = market.confirm(id, Actor::Member(REQUESTER)).unwrap();
        assert_eq!(BookingStatus::Completed, booking.status);
        assert_eq!(5, market.balance(REQUESTER));
        assert_eq!(5, market.balance(PROVIDER));
        assert_eq!(Some(5), booking.settled_credits());
    }

    #[test]
    fn test_confirm_replay_is_rejected() {
        let market = Marketplace::default();
        market.ledger().credit(REQUESTER, 10).unwrap();
        let id = awaiting_confirmation(&market);

        market.confirm(id, Actor::Member(REQUESTER)).unwrap();
        let got = market.confirm(id, Actor::Member(REQUESTER));
        assert!(matches!(got, Err(MarketError::InvalidTransition(_))));
        assert_eq!(5, market.balance(REQUESTER));
    }

    #[test]
    fn test_dispute_escalates() {
        let market = Marketplace::default();
        let id = awaiting_confirmation(&market);

        let booking = market
            .dispute(id, Actor::Member(REQUESTER), "not enough work done")
            .unwrap();
        assert_eq!(BookingStatus::InMediation, booking.status);
        assert!(booking.mediation.requested_at.is_some());
        assert_eq!(1, market.open_cases().len());
    }

    #[test]
    fn test_dispute_without_escalation() {
        let market = Marketplace::new(Config {
            auto_escalate: false,
            ..Config::default()
        });
        let id = awaiting_confirmation(&market);

        let booking = market
            .dispute(id, Actor::Member(REQUESTER), "not enough work done")
            .unwrap();
        assert_eq!(BookingStatus::Disputed, booking.status);
        assert!(market.open_cases().is_empty());

        // Not in mediation yet.
        let got = market.resolve_mediation(id, Actor::Admin(ADMIN), "split", 2);
        assert!(matches!(got, Err(MarketError::InvalidTransition(_))));

        let booking = market.enter_mediation(id, Actor::Admin(ADMIN)).unwrap();
        assert_eq!(BookingStatus::InMediation, booking.status);
    }

    #[test]
    fn test_notifications() {
        let (notifier, rx) = ChannelNotifier::channel();
        let market = Marketplace::default().with_notifier(notifier);
        market.ledger().credit(REQUESTER, 10).unwrap();
        let id = awaiting_confirmation(&market);
        market.confirm(id, Actor::Member(REQUESTER)).unwrap();
        market.mark_reviewed(id, Actor::Member(REQUESTER)).unwrap();

        let changes: Vec<(BookingStatus, BookingStatus)> =
            rx.try_iter().map(|event| (event.from, event.to)).collect();
        assert_eq!(
            vec![
                (BookingStatus::Pending, BookingStatus::Scheduled),
                (
                    BookingStatus::Scheduled,
                    BookingStatus::AwaitingRequesterConfirmation
                ),
                (
                    BookingStatus::AwaitingRequesterConfirmation,
                    BookingStatus::Completed
                ),
            ],
            changes
        );
    }

    #[test]
    // A relay going away must not undo anything.
    fn test_notification_failure_keeps_transition() {
        let (notifier, rx) = ChannelNotifier::channel();
        drop(rx);
        let market = Marketplace::default().with_notifier(notifier);

        let booking = market
            .request_service(REQUESTER, PROVIDER, ServiceRef::new(1))
            .unwrap();
        let got = market.reject(booking.id, Actor::Member(PROVIDER));
        assert_eq!(BookingStatus::Rejected, got.unwrap().status);
    }

    #[test]
    fn test_mark_reviewed() {
        let market = Marketplace::default();
        market.ledger().credit(REQUESTER, 10).unwrap();
        let id = awaiting_confirmation(&market);

        let got = market.mark_reviewed(id, Actor::Member(REQUESTER));
        assert!(matches!(got, Err(MarketError::InvalidTransition(_))));

        market.confirm(id, Actor::Member(REQUESTER)).unwrap();
        assert!(market.mark_reviewed(id, Actor::Member(REQUESTER)).unwrap().reviewed);

        let got = market.mark_reviewed(id, Actor::Member(REQUESTER));
        assert!(matches!(got, Err(MarketError::InvalidTransition(_))));
    }

    #[test]
    fn test_valid_events() {
        let market = Marketplace::default();
        let id = awaiting_confirmation(&market);

        let got = market.valid_events(id, Actor::Member(REQUESTER)).unwrap();
        assert_eq!(
            vec![EventKind::Confirm, EventKind::Dispute],
            got.into_iter().collect::<Vec<_>>()
        );
        assert_eq!(Err(MarketError::NotFound(77)), market.valid_events(77, Actor::System));
    }

    #[test]
    fn test_unknown_booking() {
        let market = Marketplace::default();

        assert_eq!(
            Err(MarketError::NotFound(3)),
            market.confirm(3, Actor::Member(REQUESTER))
        );
        assert_eq!(
            Err(MarketError::NotFound(3)),
            market.post_mediation_message(3, Actor::Member(REQUESTER), "hi")
        );
    }
}
