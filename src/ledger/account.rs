use super::{balance::Balance, AccountId, Credits};

/// An account holds the time credits of one member.
///
/// Nothing outside the `ledger` module can change it: callers only ever see
/// it through `Ledger::balance` or a snapshot, and every mutation goes through
/// a journal entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    id: AccountId,
    balance: Balance,
}

impl Account {
    pub(super) fn new(id: AccountId) -> Self {
        Self {
            id,
            balance: Balance::default(),
        }
    }

    pub fn id(&self) -> AccountId {
        self.id
    }

    /// Credits currently held.
    pub fn balance(&self) -> Credits {
        self.balance.amount()
    }

    /// Lifetime credits and debits.
    pub fn totals(&self) -> Balance {
        self.balance
    }

    /// Replaces the balance with one computed (and validated) by the caller.
    /// Splitting validation from application is what lets a transfer check
    /// both sides before touching either.
    pub(super) fn commit(&mut self, balance: Balance) {
        self.balance = balance;
    }
}
