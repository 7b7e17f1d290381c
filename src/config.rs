use crate::booking::{Actor, Policy};
use crate::ledger::AccountId;

/// Runtime knobs of the marketplace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// How many times an event is re-read and re-applied after losing a race
    /// with another transition, before `Conflict` is surfaced.
    pub max_conflict_retries: u32,

    /// Whether a dispute is handed over to mediation straight away. When
    /// off, a mediator picks disputed bookings up with `enter_mediation`.
    pub auto_escalate: bool,

    /// See `Policy::credit_ceiling_factor`. Off by default.
    pub credit_ceiling_factor: Option<u64>,

    /// Accounts holding the admin role. Only used where the caller can't tell
    /// us the role itself, e.g. when replaying an event log.
    pub admins: Vec<AccountId>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_conflict_retries: 3,
            auto_escalate: true,
            credit_ceiling_factor: None,
            admins: Vec::new(),
        }
    }
}

impl Config {
    pub fn policy(&self) -> Policy {
        Policy {
            credit_ceiling_factor: self.credit_ceiling_factor,
        }
    }

    pub fn actor(&self, account: AccountId) -> Actor {
        if self.admins.contains(&account) {
            Actor::Admin(account)
        } else {
            Actor::Member(account)
        }
    }
}

#[test]
fn test_config_actor() {
    let config = Config {
        admins: vec![9],
        ..Config::default()
    };

    assert_eq!(Actor::Admin(9), config.actor(9));
    assert_eq!(Actor::Member(1), config.actor(1));
}
