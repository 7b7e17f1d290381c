use super::{Booking, BookingId, BookingStatus, ServiceRef, TransitionError};
use crate::ledger::AccountId;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, PartialEq, Eq, Clone, Error)]
pub enum StoreError {
    #[error("unknown booking {0}")]
    NotFound(BookingId),

    /// Someone else committed a transition since the booking was read.
    #[error(
        "booking {booking} moved to revision {found} ({status}) since revision {expected} was read"
    )]
    Conflict {
        booking: BookingId,
        expected: u64,
        found: u64,
        status: BookingStatus,
    },
}

/// Where bookings live.
///
/// Readers get snapshots. Writers go through `commit`, which only writes if
/// the booking is still at the revision the writer read: that's what
/// linearises transitions on a single booking, while different bookings
/// never wait on each other.
#[derive(Debug, Default)]
pub struct BookingStore {
    bookings: DashMap<BookingId, Arc<Mutex<Booking>>>,
    last_id: AtomicU32,
}

impl BookingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a `pending` booking with a fresh id.
    pub fn create(
        &self,
        requester: AccountId,
        provider: AccountId,
        service: ServiceRef,
        at: DateTime<Utc>,
    ) -> Result<Booking, TransitionError> {
        // Validate before taking an id, so ids stay dense.
        let mut booking = Booking::new(0, requester, provider, service, at)?;
        booking.id = self.last_id.fetch_add(1, Ordering::SeqCst) + 1;

        self.bookings
            .insert(booking.id, Arc::new(Mutex::new(booking.clone())));
        Ok(booking)
    }

    pub fn get(&self, id: BookingId) -> Result<Booking, StoreError> {
        Ok(self.slot(id)?.lock().clone())
    }

    /// Every booking, sorted by id.
    pub fn list(&self) -> Vec<Booking> {
        let slots: Vec<Arc<Mutex<Booking>>> = self
            .bookings
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        let mut bookings: Vec<Booking> = slots.iter().map(|slot| slot.lock().clone()).collect();
        bookings.sort_by_key(|booking| booking.id);
        bookings
    }

    pub fn with_status(&self, status: BookingStatus) -> Vec<Booking> {
        self.list()
            .into_iter()
            .filter(|booking| booking.status == status)
            .collect()
    }

    /// Replaces the booking with what `write` returns, provided it is still at
    /// `revision`. `write` runs while the booking is locked, so whatever it
    /// does (e.g. moving credits) happens at most once per revision; if it
    /// fails, the booking is left untouched.
    pub(crate) fn commit<E, F>(&self, id: BookingId, revision: u64, write: F) -> Result<Booking, E>
    where
        E: From<StoreError>,
        F: FnOnce(&Booking) -> Result<Booking, E>,
    {
        let slot = self.slot(id)?;
        let mut current = slot.lock();

        if current.revision != revision {
            return Err(StoreError::Conflict {
                booking: id,
                expected: revision,
                found: current.revision,
                status: current.status,
            }
            .into());
        }

        let mut next = write(&current)?;
        next.revision = revision + 1;
        *current = next.clone();

        Ok(next)
    }

    /// Runs `read` while the booking is locked: no transition can commit
    /// until it returns.
    pub(crate) fn inspect<T, E, F>(&self, id: BookingId, read: F) -> Result<T, E>
    where
        E: From<StoreError>,
        F: FnOnce(&Booking) -> Result<T, E>,
    {
        let slot = self.slot(id)?;
        let current = slot.lock();
        read(&current)
    }

    fn slot(&self, id: BookingId) -> Result<Arc<Mutex<Booking>>, StoreError> {
        self.bookings
            .get(&id)
            .map(|slot| Arc::clone(slot.value()))
            .ok_or(StoreError::NotFound(id))
    }
}
