//! Domain module for the Treasury Rebalance subsystem
//!
//! ## Core Modules
//! - value_objects: Address, Amount, BlockNumber
//! - entities: Sender and Receiver records
//! - phase: forward-only process state machine
//! - registry: registered sets and allocation total
//! - quorum: live sender authority and thresholds
//! - invariants: allocation and funds checks

pub mod entities;
pub mod invariants;
pub mod phase;
pub mod quorum;
pub mod registry;
pub mod value_objects;

pub use entities::{Receiver, Sender};
pub use phase::Phase;
pub use quorum::{AdminState, SenderAuthority};
pub use registry::Registry;
pub use value_objects::{Address, AddressParseError, Amount, BlockNumber, U256};
