//! # Domain Invariants
//!
//! Checks that must hold before the process may advance past approval.

use crate::domain::registry::Registry;
use crate::domain::value_objects::Amount;
use crate::error::{RebalanceError, RebalanceResult};

/// The running total equals the live sum of receiver allocations.
#[must_use]
pub fn check_allocation_invariant(registry: &Registry) -> bool {
    let mut sum = Amount::zero();
    for receiver in registry.receivers() {
        match sum.checked_add(receiver.amount) {
            Some(next) => sum = next,
            None => return false,
        }
    }
    sum == registry.total_allocated()
}

/// Sum sender balances, saturating at `U256::MAX`.
#[must_use]
pub fn total_balance<I>(balances: I) -> Amount
where
    I: IntoIterator<Item = Amount>,
{
    balances
        .into_iter()
        .fold(Amount::zero(), |acc, balance| acc.saturating_add(balance))
}

/// The allocation must not exceed what the senders currently hold.
pub fn ensure_sufficient_funds(allocated: Amount, available: Amount) -> RebalanceResult<()> {
    if allocated > available {
        return Err(RebalanceError::InsufficientSenderFunds {
            allocated,
            available,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::Address;

    #[test]
    fn test_allocation_invariant_tracks_registry() {
        let mut registry = Registry::new();
        assert!(check_allocation_invariant(&registry));
        registry
            .register_receiver(Address::new([1u8; 20]), Amount::from(7u64))
            .unwrap();
        registry
            .register_receiver(Address::new([2u8; 20]), Amount::from(8u64))
            .unwrap();
        registry.remove_receiver(&Address::new([1u8; 20])).unwrap();
        assert!(check_allocation_invariant(&registry));
    }

    #[test]
    fn test_total_balance_saturates() {
        let total = total_balance(vec![Amount::MAX, Amount::one()]);
        assert_eq!(total, Amount::MAX);
        assert_eq!(
            total_balance(vec![Amount::from(20u64), Amount::from(20u64)]),
            Amount::from(40u64)
        );
    }

    #[test]
    fn test_funds_boundary_is_inclusive() {
        assert!(ensure_sufficient_funds(Amount::from(40u64), Amount::from(40u64)).is_ok());
        assert_eq!(
            ensure_sufficient_funds(Amount::from(50u64), Amount::from(40u64)),
            Err(RebalanceError::InsufficientSenderFunds {
                allocated: Amount::from(50u64),
                available: Amount::from(40u64),
            })
        );
    }
}
