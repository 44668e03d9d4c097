//! Adapters implementing the outbound ports
//!
//! - `InMemoryLedger`: balances and managed-entity admin state
//! - `ManualClock`: block height source
//! - `BroadcastEventBus`: event fan-out

pub mod clock;
pub mod event_bus;
pub mod ledger;

pub use clock::ManualClock;
pub use event_bus::{BroadcastEventBus, DEFAULT_CHANNEL_CAPACITY};
pub use ledger::InMemoryLedger;
