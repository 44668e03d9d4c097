//! Outgoing events for the Treasury Rebalance subsystem
//!
//! Events are published only after the operation that produced them has
//! committed. Auditors and the downstream fund sweeper consume them.

use crate::domain::{Address, Amount, BlockNumber, Phase};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Correlation ID attached to every published event
pub type EventId = Uuid;

/// State change emitted by the coordinator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RebalanceEvent {
    SenderRegistered {
        sender: Address,
        approvers: Vec<Address>,
    },
    SenderRemoved {
        sender: Address,
        /// Approvals the entry carried when removed
        approver_count: usize,
    },
    ReceiverRegistered {
        receiver: Address,
        amount: Amount,
    },
    ReceiverRemoved {
        receiver: Address,
        /// Receivers left after removal
        remaining_receivers: usize,
    },
    Approved {
        sender: Address,
        approver: Address,
        approver_count: usize,
    },
    PhaseChanged {
        phase: Phase,
    },
    Finalized {
        memo: String,
        phase: Phase,
    },
    Reset {
        activation_point: BlockNumber,
    },
    OwnershipTransferred {
        previous_owner: Address,
        new_owner: Address,
    },
}

impl RebalanceEvent {
    /// Topic name used for routing and log fields.
    pub fn topic(&self) -> &'static str {
        match self {
            Self::SenderRegistered { .. } => "rebalance.sender.registered",
            Self::SenderRemoved { .. } => "rebalance.sender.removed",
            Self::ReceiverRegistered { .. } => "rebalance.receiver.registered",
            Self::ReceiverRemoved { .. } => "rebalance.receiver.removed",
            Self::Approved { .. } => "rebalance.approved",
            Self::PhaseChanged { .. } => "rebalance.phase",
            Self::Finalized { .. } => "rebalance.finalized",
            Self::Reset { .. } => "rebalance.reset",
            Self::OwnershipTransferred { .. } => "rebalance.owner",
        }
    }
}

/// Event plus delivery metadata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub event_id: EventId,
    /// Strictly increasing per coordinator instance
    pub sequence: u64,
    /// Clock value observed when the event was committed
    pub block_number: BlockNumber,
    pub event: RebalanceEvent,
}

impl EventEnvelope {
    pub fn new(sequence: u64, block_number: BlockNumber, event: RebalanceEvent) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            sequence,
            block_number,
            event,
        }
    }
}
