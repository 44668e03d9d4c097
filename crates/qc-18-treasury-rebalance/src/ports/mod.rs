//! Ports module for the Treasury Rebalance subsystem

pub mod inbound;
pub mod outbound;

pub use inbound::{RebalanceSnapshot, TreasuryRebalanceApi};
pub use outbound::{AuthorityOracle, BalanceOracle, ChainClock, EventPublisher};
