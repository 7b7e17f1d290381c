use super::ledger::{EntryKind, Ledger};
use super::{AccountId, Credits, LedgerError};

impl Ledger {
    /// Moves `amount` credits from one account to another, all-or-nothing.
    ///
    /// Both account locks are held for the whole read-modify-write, and both
    /// new balances are computed before either is applied: a failure on
    /// either side leaves both balances exactly as they were.
    pub fn transfer(
        &self,
        from: AccountId,
        to: AccountId,
        amount: Credits,
    ) -> Result<(), LedgerError> {
        if amount == 0 {
            return Err(LedgerError::InvalidAmount);
        }
        if from == to {
            return Err(LedgerError::SameAccount(from));
        }

        let source_slot = self.existing(from).ok_or(LedgerError::InsufficientFunds {
            account: from,
            available: 0,
            requested: amount,
        })?;
        let target_slot = self.slot(to);

        // Always lock the lowest account id first, otherwise two opposite
        // transfers between the same accounts could deadlock.
        let (mut source, mut target) = if from < to {
            let source = source_slot.lock();
            (source, target_slot.lock())
        } else {
            let target = target_slot.lock();
            (source_slot.lock(), target)
        };

        let debited = source.totals().subtract(from, amount)?;
        let credited = target.totals().add(amount).map_err(|err| {
            tracing::error!(from, to, amount, %err, "transfer would overflow the target account");
            err
        })?;

        let seq = self.record(EntryKind::Transfer { from, to }, amount);
        source.commit(debited);
        target.commit(credited);

        tracing::debug!(from, to, amount, seq, "transferred credits");
        Ok(())
    }
}
