//! Time-credit balances.
//!
//! Ledger: owns every account and is the only thing allowed to move credits.
//! Account: a balance plus the bookkeeping needed to audit it.
//! Balance: lifetime credits and debits, the current amount being the difference.

pub mod account;
pub mod balance;
#[allow(clippy::module_inception)]
pub mod ledger;
pub mod transfer;

use thiserror::Error;

pub use ledger::{Entry, EntryKind, Ledger};

// Using named types doesn't provide any compiler help, but it helps a lot with
// readability: HashMap<AccountId, Account> reads better than HashMap<u32, Account>,
// and changing account ids e.g. from u32 to u64 is trivial.
pub type AccountId = u32;

// Credits are whole units of time. Being unsigned, a balance can never be
// represented as negative.
pub type Credits = u64;

#[derive(Debug, PartialEq, Eq, Clone, Error)]
pub enum LedgerError {
    /// Zero credits can't be moved.
    #[error("amount must be greater than zero")]
    InvalidAmount,

    /// The debited account doesn't hold enough credits.
    #[error("account {account} holds {available} credits, {requested} requested")]
    InsufficientFunds {
        account: AccountId,
        available: Credits,
        requested: Credits,
    },

    /// A transfer needs two distinct accounts.
    #[error("cannot transfer from account {0} to itself")]
    SameAccount(AccountId),

    /// Adding more credits to the balance would overflow.
    #[error("balance overflow")]
    Overflow,
}
