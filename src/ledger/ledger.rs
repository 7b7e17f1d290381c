use super::account::Account;
use super::{AccountId, Credits, LedgerError};

use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;

/// What a journal entry did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Credits entering the system, e.g. a purchase.
    Credit { account: AccountId },
    /// Credits leaving the system, e.g. a cashout.
    Debit { account: AccountId },
    /// Credits moving between two accounts. Never changes the total supply.
    Transfer { from: AccountId, to: AccountId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    pub seq: u64,
    pub kind: EntryKind,
    pub amount: Credits,
}

/// The ledger owns every account balance.
///
/// Each account sits behind its own mutex, so movements touching different
/// accounts run in parallel while movements sharing an account are serialised.
/// Lock order is always: accounts (lowest id first), then the journal.
#[derive(Debug, Default)]
pub struct Ledger {
    pub(super) accounts: DashMap<AccountId, Arc<Mutex<Account>>>,
    journal: Mutex<Vec<Entry>>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credits currently held by `account`. Unknown accounts hold nothing.
    ///
    /// This is a point-in-time read for display: the authoritative check
    /// happens inside `debit` and `transfer`.
    pub fn balance(&self, account: AccountId) -> Credits {
        match self.existing(account) {
            Some(slot) => slot.lock().balance(),
            None => 0,
        }
    }

    /// Snapshot of an account, if it has ever been touched.
    pub fn account(&self, account: AccountId) -> Option<Account> {
        self.existing(account).map(|slot| slot.lock().clone())
    }

    /// Snapshot of every account, sorted by id.
    pub fn accounts(&self) -> Vec<Account> {
        let slots: Vec<Arc<Mutex<Account>>> = self
            .accounts
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        let mut accounts: Vec<Account> = slots.iter().map(|slot| slot.lock().clone()).collect();
        accounts.sort_by_key(Account::id);
        accounts
    }

    /// Sum of every balance. Only meaningful while no movement is in flight.
    pub fn total_supply(&self) -> Credits {
        self.accounts().iter().map(Account::balance).sum()
    }

    /// Every movement ever applied, in order.
    pub fn journal(&self) -> Vec<Entry> {
        self.journal.lock().clone()
    }

    /// Adds credits coming from outside the system (e.g. a purchase).
    pub fn credit(&self, account: AccountId, amount: Credits) -> Result<(), LedgerError> {
        if amount == 0 {
            return Err(LedgerError::InvalidAmount);
        }

        let slot = self.slot(account);
        let mut acc = slot.lock();
        let balance = acc.totals().add(amount)?;
        let seq = self.record(EntryKind::Credit { account }, amount);
        acc.commit(balance);

        tracing::debug!(account, amount, seq, balance = acc.balance(), "credited account");
        Ok(())
    }

    /// Removes credits leaving the system (e.g. a cashout).
    pub fn debit(&self, account: AccountId, amount: Credits) -> Result<(), LedgerError> {
        if amount == 0 {
            return Err(LedgerError::InvalidAmount);
        }

        let slot = self.existing(account).ok_or(LedgerError::InsufficientFunds {
            account,
            available: 0,
            requested: amount,
        })?;
        let mut acc = slot.lock();
        let balance = acc.totals().subtract(account, amount)?;
        let seq = self.record(EntryKind::Debit { account }, amount);
        acc.commit(balance);

        tracing::debug!(account, amount, seq, balance = acc.balance(), "debited account");
        Ok(())
    }

    pub(super) fn existing(&self, account: AccountId) -> Option<Arc<Mutex<Account>>> {
        // Clone the Arc so the map shard isn't held while we wait on the account lock.
        self.accounts.get(&account).map(|slot| Arc::clone(slot.value()))
    }

    pub(super) fn slot(&self, account: AccountId) -> Arc<Mutex<Account>> {
        Arc::clone(
            self.accounts
                .entry(account)
                .or_insert_with(|| Arc::new(Mutex::new(Account::new(account))))
                .value(),
        )
    }

    // Appends to the journal and returns the entry's sequence number.
    // Callers must already hold the locks of every account involved.
    pub(super) fn record(&self, kind: EntryKind, amount: Credits) -> u64 {
        let mut journal = self.journal.lock();
        let seq = journal.len() as u64 + 1;
        journal.push(Entry { seq, kind, amount });
        seq
    }
}
