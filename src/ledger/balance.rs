use super::{AccountId, Credits, LedgerError};

/// A balance is a sum of credits (adds time to the balance)
/// and debits (remove time from the balance).
///
/// We only keep the lifetime totals, not every movement: the ledger journal
/// is where individual movements live.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Balance {
    credit: Credits,
    debit: Credits,
}

impl Balance {
    pub const fn new(credit: Credits, debit: Credits) -> Self {
        Self { credit, debit }
    }

    pub fn amount(&self) -> Credits {
        // `debit <= credit` always holds: `subtract` refuses to break it.
        self.credit - self.debit
    }

    pub fn credited(&self) -> Credits {
        self.credit
    }

    pub fn debited(&self) -> Credits {
        self.debit
    }

    /// Returns the balance with `amount` more credits, leaving `self` untouched
    /// so callers can validate both sides of a movement before applying either.
    pub fn add(&self, amount: Credits) -> Result<Self, LedgerError> {
        let credit = self
            .credit
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;

        Ok(Self { credit, ..*self })
    }

    /// Returns the balance with `amount` fewer credits.
    /// `account` is only used to give context to the error.
    pub fn subtract(&self, account: AccountId, amount: Credits) -> Result<Self, LedgerError> {
        if amount > self.amount() {
            return Err(LedgerError::InsufficientFunds {
                account,
                available: self.amount(),
                requested: amount,
            });
        }

        let debit = self
            .debit
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;

        Ok(Self { debit, ..*self })
    }
}
