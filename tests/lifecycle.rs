use timebank::ledger::EntryKind;
use timebank::{Actor, BookingId, BookingStatus, Config, MarketError, Marketplace, ServiceRef};

use chrono::{Duration, Utc};
use rust_decimal_macros::dec;

const REQUESTER: u32 = 1;
const PROVIDER: u32 = 2;
const ADMIN: u32 = 99;

fn requester() -> Actor {
    Actor::Member(REQUESTER)
}

fn provider() -> Actor {
    Actor::Member(PROVIDER)
}

fn market_with_credits(credits: u64, config: Config) -> Marketplace {
    let market = Marketplace::new(config);
    market.ledger().credit(REQUESTER, credits).unwrap();
    market
}

// Requests, accepts, and reports `proposed` credits worth of work.
fn awaiting_confirmation(market: &Marketplace, proposed: u64) -> BookingId {
    let booking = market
        .request_service(REQUESTER, PROVIDER, ServiceRef::new(1))
        .unwrap();
    market
        .accept(booking.id, provider(), Utc::now() + Duration::days(1), dec!(2))
        .unwrap();
    market
        .report_completion(booking.id, provider(), dec!(2), proposed, "all done")
        .unwrap();
    booking.id
}

fn transfers(market: &Marketplace) -> usize {
    market
        .ledger()
        .journal()
        .iter()
        .filter(|entry| matches!(entry.kind, EntryKind::Transfer { .. }))
        .count()
}

#[test]
fn test_happy_path() {
    let market = market_with_credits(10, Config::default());
    let id = awaiting_confirmation(&market, 4);

    let booking = market.confirm(id, requester()).unwrap();

    assert_eq!(BookingStatus::Completed, booking.status);
    assert!(booking.confirmed_by_provider);
    assert!(booking.confirmed_by_requester);
    assert_eq!(6, market.balance(REQUESTER));
    assert_eq!(4, market.balance(PROVIDER));
    assert!(booking.is_consistent());
}

#[test]
fn test_rejection_path() {
    let market = market_with_credits(10, Config::default());
    let booking = market
        .request_service(REQUESTER, PROVIDER, ServiceRef::new(1))
        .unwrap();

    let booking = market.reject(booking.id, provider()).unwrap();
    assert_eq!(BookingStatus::Rejected, booking.status);

    let got = market.accept(booking.id, provider(), Utc::now() + Duration::days(1), dec!(2));
    assert!(matches!(got, Err(MarketError::InvalidTransition(_))));
    assert_eq!(10, market.balance(REQUESTER));
    assert_eq!(0, market.balance(PROVIDER));
}

#[test]
fn test_insufficient_funds() {
    let market = market_with_credits(3, Config::default());
    let id = awaiting_confirmation(&market, 5);

    let got = market.confirm(id, requester());
    assert_eq!(
        Err(MarketError::InsufficientFunds {
            account: REQUESTER,
            available: 3,
            requested: 5
        }),
        got
    );
    assert_eq!(3, market.balance(REQUESTER));
    assert_eq!(0, market.balance(PROVIDER));
    assert_eq!(
        BookingStatus::AwaitingRequesterConfirmation,
        market.booking(id).unwrap().status
    );

    // The booking isn't lost: it can still be disputed.
    let booking = market.dispute(id, requester(), "can't afford that").unwrap();
    assert_eq!(BookingStatus::InMediation, booking.status);
}

#[test]
// The mediator's decision is what gets paid, not the provider's proposal.
fn test_dispute_path() {
    let market = market_with_credits(10, Config {
        auto_escalate: false,
        ..Config::default()
    });
    let id = awaiting_confirmation(&market, 5);

    let booking = market.dispute(id, requester(), "not enough work done").unwrap();
    assert_eq!(BookingStatus::Disputed, booking.status);
    assert_eq!(Some("not enough work done"), booking.dispute_reason.as_deref());

    market.enter_mediation(id, Actor::System).unwrap();
    market
        .post_mediation_message(id, requester(), "only one hour was done")
        .unwrap();
    market
        .post_mediation_message(id, Actor::Admin(ADMIN), "noted")
        .unwrap();

    let booking = market
        .resolve_mediation(id, Actor::Admin(ADMIN), "partial credit", 2)
        .unwrap();
    assert_eq!(BookingStatus::MediationResolved, booking.status);
    assert!(booking.mediation.credit_transferred);
    assert_eq!(8, market.balance(REQUESTER));
    assert_eq!(2, market.balance(PROVIDER));
    assert!(booking.is_consistent());

    // The case is closed: its history stays readable, but nobody can post.
    let case = market.case_view(id, provider()).unwrap();
    assert_eq!(2, case.messages.len());
    assert!(case.messages[1].is_from_mediator);
    let got = market.post_mediation_message(id, requester(), "thanks");
    assert!(matches!(got, Err(MarketError::InvalidTransition(_))));
}

#[test]
// A decision the requester can't cover leaves the case open, so the
// mediator can resolve it again once the credits are there.
fn test_mediation_insufficient_funds() {
    let market = market_with_credits(10, Config::default());
    let id = awaiting_confirmation(&market, 5);
    market.dispute(id, requester(), "not enough work done").unwrap();
    market.ledger().debit(REQUESTER, 9).unwrap();

    let got = market.resolve_mediation(id, Actor::Admin(ADMIN), "partial credit", 2);
    assert_eq!(
        Err(MarketError::InsufficientFunds {
            account: REQUESTER,
            available: 1,
            requested: 2
        }),
        got
    );

    let booking = market.booking(id).unwrap();
    assert_eq!(BookingStatus::InMediation, booking.status);
    assert_eq!(None, booking.mediation.decision);
    assert_eq!(None, booking.mediation.resolved_at);
    assert!(!booking.mediation.credit_transferred);
    assert!(booking.is_consistent());
    assert_eq!(1, market.balance(REQUESTER));
    assert_eq!(0, market.balance(PROVIDER));
    assert_eq!(1, market.open_cases().len());

    market.ledger().credit(REQUESTER, 3).unwrap();
    let booking = market
        .resolve_mediation(id, Actor::Admin(ADMIN), "partial credit", 2)
        .unwrap();
    assert_eq!(BookingStatus::MediationResolved, booking.status);
    assert!(booking.mediation.credit_transferred);
    assert_eq!(2, market.balance(REQUESTER));
    assert_eq!(2, market.balance(PROVIDER));

    let got = market.resolve_mediation(id, Actor::Admin(ADMIN), "partial credit", 2);
    assert!(matches!(got, Err(MarketError::InvalidTransition(_))));
    assert_eq!(1, transfers(&market));
}

#[test]
fn test_mediation_can_award_nothing() {
    let market = market_with_credits(10, Config::default());
    let id = awaiting_confirmation(&market, 5);
    market.dispute(id, requester(), "nobody showed up").unwrap();

    let booking = market
        .resolve_mediation(id, Actor::Admin(ADMIN), "no credit", 0)
        .unwrap();
    assert_eq!(BookingStatus::MediationResolved, booking.status);
    assert!(!booking.mediation.credit_transferred);
    assert_eq!(10, market.balance(REQUESTER));
    assert_eq!(0, transfers(&market));
}

#[test]
fn test_pending_cannot_complete() {
    let market = market_with_credits(10, Config::default());
    let booking = market
        .request_service(REQUESTER, PROVIDER, ServiceRef::new(1))
        .unwrap();

    for got in vec![
        market.confirm(booking.id, requester()),
        market.report_completion(booking.id, provider(), dec!(1), 1, ""),
        market.resolve_mediation(booking.id, Actor::Admin(ADMIN), "early", 1),
    ] {
        assert!(matches!(got, Err(MarketError::InvalidTransition(_))), "{:?}", got);
    }
    assert_eq!(BookingStatus::Pending, market.booking(booking.id).unwrap().status);
}

#[test]
fn test_confirm_twice() {
    let market = market_with_credits(10, Config::default());
    let id = awaiting_confirmation(&market, 4);

    assert!(market.confirm(id, requester()).is_ok());
    let got = market.confirm(id, requester());
    assert!(matches!(got, Err(MarketError::InvalidTransition(_))));
    assert_eq!(1, transfers(&market));
    assert_eq!(6, market.balance(REQUESTER));
}

#[test]
// Duplicate requests racing each other: exactly one of them moves credits.
fn test_concurrent_confirm() {
    for _ in 0..20 {
        let market = market_with_credits(100, Config::default());
        let id = awaiting_confirmation(&market, 4);

        let results: Vec<_> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| market.confirm(id, requester())))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(1, results.iter().filter(|r| r.is_ok()).count());
        for got in results.iter().filter(|r| r.is_err()) {
            assert!(
                matches!(
                    got,
                    Err(MarketError::InvalidTransition(_)) | Err(MarketError::Conflict(_))
                ),
                "{:?}",
                got
            );
        }
        assert_eq!(1, transfers(&market));
        assert_eq!(96, market.balance(REQUESTER));
        assert_eq!(4, market.balance(PROVIDER));
    }
}

#[test]
// Bookings don't wait on each other, and every one of them settles once.
fn test_concurrent_bookings() {
    let market = market_with_credits(1_000, Config::default());
    let ids: Vec<_> = (0..50).map(|_| awaiting_confirmation(&market, 3)).collect();

    std::thread::scope(|scope| {
        for id in &ids {
            let market = &market;
            scope.spawn(move || market.confirm(*id, requester()).unwrap());
        }
    });

    assert_eq!(50, transfers(&market));
    assert_eq!(850, market.balance(REQUESTER));
    assert_eq!(150, market.balance(PROVIDER));
    assert_eq!(1_000, market.ledger().total_supply());
    for booking in market.bookings() {
        assert_eq!(BookingStatus::Completed, booking.status);
        assert!(booking.is_consistent());
    }
}

#[test]
fn test_outsiders_are_refused() {
    let market = market_with_credits(10, Config::default());
    let id = awaiting_confirmation(&market, 4);

    for (actor, want_ok) in vec![
        (Actor::Member(7), false),
        (provider(), false),
        (Actor::Admin(ADMIN), false),
        (requester(), true),
    ] {
        assert_eq!(want_ok, market.confirm(id, actor).is_ok(), "{}", actor);
    }
}
