//! Driven Ports (SPI - Outbound Dependencies)
//!
//! The coordinator owns no funds and no admin lists. Everything it needs to
//! know about the outside world comes through these traits, and every call is
//! a fresh synchronous read.

use crate::domain::{Address, AdminState, Amount, BlockNumber};
use crate::error::OracleError;
use crate::events::EventEnvelope;

/// Identity/admin oracle for sender addresses.
///
/// CRITICAL: Implementations must not cache. Admin sets and thresholds can
/// change between approvals, and quorum is judged on the current set.
pub trait AuthorityOracle: Send + Sync {
    /// Capability probe: does this address expose managed admin state?
    fn is_managed(&self, address: &Address) -> bool;

    /// Current admin list and threshold of a managed address.
    ///
    /// Returns `OracleError` when the address does not expose the query or
    /// the query could not be served. An empty list is a valid response.
    fn admin_state(&self, address: &Address) -> Result<AdminState, OracleError>;
}

/// Balance oracle. Assumed available for every valid address.
pub trait BalanceOracle: Send + Sync {
    fn balance_of(&self, address: &Address) -> Amount;
}

/// Monotonic clock compared against the activation point.
pub trait ChainClock: Send + Sync {
    fn current(&self) -> BlockNumber;
}

/// Sink for committed events.
pub trait EventPublisher: Send + Sync {
    /// Publish an event.
    ///
    /// # Returns
    ///
    /// The number of active subscribers that received the event.
    fn publish(&self, envelope: EventEnvelope) -> usize;

    /// Total events published.
    fn events_published(&self) -> u64;
}
