//! Sender and receiver entities

use crate::domain::value_objects::{Address, Amount};
use serde::{Deserialize, Serialize};

/// Registered source account and the approvals recorded for it.
///
/// `approvers` keeps insertion order, which is approval order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    pub address: Address,
    pub approvers: Vec<Address>,
}

impl Sender {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            approvers: Vec::new(),
        }
    }

    pub fn approver_count(&self) -> usize {
        self.approvers.len()
    }

    pub fn has_approved(&self, approver: &Address) -> bool {
        self.approvers.contains(approver)
    }

    /// Append an approver. Caller must have checked for duplicates.
    pub(crate) fn push_approver(&mut self, approver: Address) -> usize {
        self.approvers.push(approver);
        self.approvers.len()
    }
}

/// Registered destination account with its allocation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receiver {
    pub address: Address,
    /// Always non-zero
    pub amount: Amount,
}

impl Receiver {
    pub fn new(address: Address, amount: Amount) -> Self {
        Self { address, amount }
    }
}
