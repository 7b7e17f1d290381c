//! The hook through which committed transitions reach the outside world
//! (push notifications, socket events, chat).
//!
//! Delivery is fire-and-forget: a failure is logged, never rolled back.

use crate::booking::{Actor, BookingId, BookingStatus};
use crate::ledger::AccountId;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::mpsc::{self, Receiver, Sender};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingStateChanged {
    pub booking_id: BookingId,
    pub from: BookingStatus,
    pub to: BookingStatus,
    pub requester: AccountId,
    pub provider: AccountId,
    pub actor: Actor,
    pub at: DateTime<Utc>,
}

#[derive(Debug, PartialEq, Eq, Error)]
#[error("notification not delivered: {0}")]
pub struct NotifyError(pub String);

pub trait Notifier: Send + Sync {
    fn notify(&self, event: &BookingStateChanged) -> Result<(), NotifyError>;
}

/// Drops every notification.
#[derive(Debug, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _: &BookingStateChanged) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// Streams notifications to a channel, for a relay to pick up.
pub struct ChannelNotifier {
    tx: Mutex<Sender<BookingStateChanged>>,
}

impl ChannelNotifier {
    pub fn channel() -> (Self, Receiver<BookingStateChanged>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx: Mutex::new(tx) }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, event: &BookingStateChanged) -> Result<(), NotifyError> {
        self.tx
            .lock()
            .send(event.clone())
            .map_err(|_| NotifyError("the receiving end is gone".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::{BookingStateChanged, ChannelNotifier, Notifier, NotifyError};
    use crate::booking::{Actor, BookingStatus};

    use chrono::Utc;

    fn event() -> BookingStateChanged {
        BookingStateChanged {
            booking_id: 1,
            from: BookingStatus::Pending,
            to: BookingStatus::Scheduled,
            requester: 1,
            provider: 2,
            actor: Actor::Member(2),
            at: Utc::now(),
        }
    }

    #[test]
    fn test_channel_notifier() {
        let (notifier, rx) = ChannelNotifier::channel();

        notifier.notify(&event()).expect("receiver is alive");
        assert_eq!(event().booking_id, rx.recv().unwrap().booking_id);
    }

    #[test]
    fn test_channel_notifier_disconnected() {
        let (notifier, rx) = ChannelNotifier::channel();
        drop(rx);

        assert_eq!(
            Err(NotifyError("the receiving end is gone".to_string())),
            notifier.notify(&event())
        );
    }
}
