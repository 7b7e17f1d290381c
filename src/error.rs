use crate::booking::{BookingId, StoreError, TransitionError};
use crate::ledger::{AccountId, Credits, LedgerError};

use thiserror::Error;

/// Everything the marketplace can refuse to do. All of them leave the
/// booking and the balances exactly as they were.
#[derive(Debug, PartialEq, Eq, Clone, Error)]
pub enum MarketError {
    /// Wrong status or wrong actor for the requested action.
    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    /// Malformed input, e.g. a non-positive duration or an empty reason.
    #[error("validation error: {0}")]
    Validation(String),

    /// The requester can't cover the settlement. The booking is kept as it
    /// was, so it can still be confirmed later, disputed or renegotiated.
    #[error("account {account} holds {available} credits, {requested} needed")]
    InsufficientFunds {
        account: AccountId,
        available: Credits,
        requested: Credits,
    },

    /// Another transition on the same booking committed first. Refetch and retry.
    #[error("booking {0} was modified concurrently")]
    Conflict(BookingId),

    #[error("unknown booking {0}")]
    NotFound(BookingId),

    /// The ledger refused a write it should never have been asked to make.
    #[error("ledger fault: {0}")]
    Ledger(LedgerError),
}

impl From<TransitionError> for MarketError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::InvalidTransition { .. } => Self::InvalidTransition(err.to_string()),
            TransitionError::Validation(msg) => Self::Validation(msg),
        }
    }
}

impl From<StoreError> for MarketError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => Self::NotFound(id),
            StoreError::Conflict { booking, .. } => Self::Conflict(booking),
        }
    }
}

impl From<LedgerError> for MarketError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InsufficientFunds {
                account,
                available,
                requested,
            } => Self::InsufficientFunds {
                account,
                available,
                requested,
            },
            LedgerError::InvalidAmount | LedgerError::SameAccount(_) => {
                Self::Validation(err.to_string())
            }
            LedgerError::Overflow => Self::Ledger(err),
        }
    }
}
