//! Driving Ports (API - Inbound)
//!
//! Every mutating call names its caller explicitly. All calls except
//! `approve` and the reads are restricted to the owner.

use crate::domain::{Address, Amount, BlockNumber, Phase, Receiver, Sender};
use crate::error::RebalanceResult;
use serde::{Deserialize, Serialize};

/// Point-in-time copy of the whole process state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebalanceSnapshot {
    pub owner: Address,
    pub phase: Phase,
    pub activation_point: BlockNumber,
    pub memo: String,
    pub total_allocated: Amount,
    pub senders: Vec<Sender>,
    pub receivers: Vec<Receiver>,
}

impl RebalanceSnapshot {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Primary Treasury Rebalance API
///
/// This is the driving port for the subsystem.
pub trait TreasuryRebalanceApi: Send + Sync {
    // --- Registry (Registration phase, owner only) ---

    fn register_sender(&self, caller: Address, sender: Address) -> RebalanceResult<()>;

    /// Returns the approver count the removed entry had.
    fn remove_sender(&self, caller: Address, sender: Address) -> RebalanceResult<usize>;

    fn register_receiver(
        &self,
        caller: Address,
        receiver: Address,
        amount: Amount,
    ) -> RebalanceResult<()>;

    /// Returns the allocation released by the removal.
    fn remove_receiver(&self, caller: Address, receiver: Address) -> RebalanceResult<Amount>;

    // --- Quorum (Registered phase, any caller) ---

    /// Record `caller` as an approver of `sender`.
    ///
    /// Returns the new approver count.
    fn approve(&self, caller: Address, sender: Address) -> RebalanceResult<usize>;

    // --- Phase control (owner only) ---

    fn finalize_registration(&self, caller: Address) -> RebalanceResult<()>;

    /// Re-checks quorum for every sender against live thresholds, then
    /// checks the allocation against live sender balances.
    fn finalize_approval(&self, caller: Address) -> RebalanceResult<()>;

    fn finalize_contract(&self, caller: Address, memo: String) -> RebalanceResult<()>;

    /// Clear everything back to an empty Registration phase.
    fn reset(&self, caller: Address) -> RebalanceResult<()>;

    fn transfer_ownership(&self, caller: Address, new_owner: Address) -> RebalanceResult<()>;

    /// Unsolicited value transfer. Always rejected.
    fn receive_payment(&self, from: Address, amount: Amount) -> RebalanceResult<()>;

    // --- Reads ---

    fn get_sender(&self, sender: Address) -> RebalanceResult<Sender>;

    fn get_receiver(&self, receiver: Address) -> RebalanceResult<Receiver>;

    fn sender_count(&self) -> usize;

    fn receiver_count(&self) -> usize;

    fn senders(&self) -> Vec<Sender>;

    fn receivers(&self) -> Vec<Receiver>;

    fn total_allocated(&self) -> Amount;

    fn phase(&self) -> Phase;

    fn activation_point(&self) -> BlockNumber;

    fn memo(&self) -> String;

    fn owner(&self) -> Address;

    fn is_managed_entity(&self, address: Address) -> bool;

    fn snapshot(&self) -> RebalanceSnapshot;
}
