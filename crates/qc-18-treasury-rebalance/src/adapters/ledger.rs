//! # In-Memory Ledger
//!
//! Account balances and managed-entity admin state held in memory.
//! Implements both `AuthorityOracle` and `BalanceOracle`, so a single ledger
//! can back the coordinator in tests and local simulations. A production
//! adapter would answer the same queries from chain state.

use crate::domain::{Address, AdminState, Amount};
use crate::error::OracleError;
use crate::ports::outbound::{AuthorityOracle, BalanceOracle};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;

/// What kind of code lives at an address.
#[derive(Clone, Debug, PartialEq, Eq)]
enum AccountKind {
    /// Externally owned, no admin state
    Plain,
    /// Managed entity exposing admin state
    Managed(AdminState),
    /// Managed code that does not expose the admin query
    Opaque,
}

#[derive(Clone, Debug)]
struct LedgerAccount {
    balance: Amount,
    kind: AccountKind,
}

impl Default for LedgerAccount {
    fn default() -> Self {
        Self {
            balance: Amount::zero(),
            kind: AccountKind::Plain,
        }
    }
}

/// In-memory ledger for testing.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    accounts: RwLock<HashMap<Address, LedgerAccount>>,
}

impl InMemoryLedger {
    /// Create a new empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set balance for an address.
    pub fn set_balance(&self, address: Address, balance: Amount) {
        self.accounts.write().entry(address).or_default().balance = balance;
    }

    /// Add to the balance of an address, saturating at `U256::MAX`.
    pub fn credit(&self, address: Address, amount: Amount) {
        let mut accounts = self.accounts.write();
        let account = accounts.entry(address).or_default();
        account.balance = account.balance.saturating_add(amount);
    }

    /// Install a managed entity with the given admins and threshold.
    pub fn deploy_managed(&self, address: Address, admins: Vec<Address>, min_required: usize) {
        self.accounts.write().entry(address).or_default().kind =
            AccountKind::Managed(AdminState::new(admins, min_required));
    }

    /// Install managed code that does not answer admin queries.
    pub fn deploy_opaque(&self, address: Address) {
        self.accounts.write().entry(address).or_default().kind = AccountKind::Opaque;
    }

    pub fn add_admin(&self, entity: Address, admin: Address) -> Result<(), OracleError> {
        self.with_admin_state(entity, |state| {
            if !state.is_admin(&admin) {
                state.admins.push(admin);
            }
        })
    }

    pub fn remove_admin(&self, entity: Address, admin: Address) -> Result<(), OracleError> {
        self.with_admin_state(entity, |state| state.admins.retain(|a| *a != admin))
    }

    pub fn set_min_required(&self, entity: Address, min_required: usize) -> Result<(), OracleError> {
        self.with_admin_state(entity, |state| state.min_required = min_required)
    }

    pub fn clear_admins(&self, entity: Address) -> Result<(), OracleError> {
        self.with_admin_state(entity, |state| state.admins.clear())
    }

    fn with_admin_state<F>(&self, entity: Address, update: F) -> Result<(), OracleError>
    where
        F: FnOnce(&mut AdminState),
    {
        let mut accounts = self.accounts.write();
        match accounts.get_mut(&entity).map(|account| &mut account.kind) {
            Some(AccountKind::Managed(state)) => {
                update(state);
                Ok(())
            }
            _ => Err(OracleError::InterfaceUnavailable { address: entity }),
        }
    }
}

impl AuthorityOracle for InMemoryLedger {
    fn is_managed(&self, address: &Address) -> bool {
        matches!(
            self.accounts.read().get(address).map(|account| &account.kind),
            Some(AccountKind::Managed(_)) | Some(AccountKind::Opaque)
        )
    }

    fn admin_state(&self, address: &Address) -> Result<AdminState, OracleError> {
        let accounts = self.accounts.read();
        match accounts.get(address).map(|account| &account.kind) {
            Some(AccountKind::Managed(state)) => {
                debug!(
                    entity = %address,
                    admins = state.admins.len(),
                    min_required = state.min_required,
                    "[qc-18] admin state read"
                );
                Ok(state.clone())
            }
            _ => Err(OracleError::InterfaceUnavailable { address: *address }),
        }
    }
}

impl BalanceOracle for InMemoryLedger {
    fn balance_of(&self, address: &Address) -> Amount {
        self.accounts
            .read()
            .get(address)
            .map(|account| account.balance)
            .unwrap_or_else(Amount::zero)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::new([byte; 20])
    }

    #[test]
    fn test_unknown_address_is_plain_with_zero_balance() {
        let ledger = InMemoryLedger::new();
        assert!(!ledger.is_managed(&addr(1)));
        assert_eq!(ledger.balance_of(&addr(1)), Amount::zero());
        assert!(ledger.admin_state(&addr(1)).is_err());
    }

    #[test]
    fn test_balances() {
        let ledger = InMemoryLedger::new();
        ledger.set_balance(addr(1), Amount::from(20u64));
        ledger.credit(addr(1), Amount::from(5u64));
        assert_eq!(ledger.balance_of(&addr(1)), Amount::from(25u64));
    }

    #[test]
    fn test_managed_entity_admin_changes_are_visible() {
        let ledger = InMemoryLedger::new();
        ledger.deploy_managed(addr(1), vec![addr(10)], 1);
        assert!(ledger.is_managed(&addr(1)));

        ledger.add_admin(addr(1), addr(11)).unwrap();
        ledger.add_admin(addr(1), addr(11)).unwrap();
        ledger.set_min_required(addr(1), 2).unwrap();
        assert_eq!(
            ledger.admin_state(&addr(1)).unwrap(),
            AdminState::new(vec![addr(10), addr(11)], 2)
        );

        ledger.remove_admin(addr(1), addr(10)).unwrap();
        assert_eq!(ledger.admin_state(&addr(1)).unwrap().admins, vec![addr(11)]);

        ledger.clear_admins(addr(1)).unwrap();
        assert!(ledger.admin_state(&addr(1)).unwrap().admins.is_empty());
    }

    #[test]
    fn test_opaque_entity_is_managed_but_unqueryable() {
        let ledger = InMemoryLedger::new();
        ledger.deploy_opaque(addr(3));
        assert!(ledger.is_managed(&addr(3)));
        assert_eq!(
            ledger.admin_state(&addr(3)),
            Err(OracleError::InterfaceUnavailable { address: addr(3) })
        );
        assert!(ledger.set_min_required(addr(3), 1).is_err());
    }

    #[test]
    fn test_balance_survives_deploy() {
        let ledger = InMemoryLedger::new();
        ledger.set_balance(addr(1), Amount::from(9u64));
        ledger.deploy_managed(addr(1), vec![addr(2)], 1);
        assert_eq!(ledger.balance_of(&addr(1)), Amount::from(9u64));
    }
}
