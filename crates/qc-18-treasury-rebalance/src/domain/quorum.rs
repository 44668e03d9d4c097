//! Sender authority and quorum rules
//!
//! A sender is either a plain actor, which can only approve itself, or a
//! managed entity whose admin list and threshold are read live from its
//! authority oracle. Nothing here is cached: the service builds a fresh
//! `SenderAuthority` for every approval and every quorum check.

use crate::domain::entities::Sender;
use crate::domain::value_objects::Address;
use crate::error::{RebalanceError, RebalanceResult};
use serde::{Deserialize, Serialize};

/// Live admin state reported by a managed sender.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminState {
    /// Authorized admins, in the order the entity reports them
    pub admins: Vec<Address>,
    /// Minimum number of admin approvals required
    pub min_required: usize,
}

impl AdminState {
    pub fn new(admins: Vec<Address>, min_required: usize) -> Self {
        Self {
            admins,
            min_required,
        }
    }

    pub fn is_admin(&self, address: &Address) -> bool {
        self.admins.contains(address)
    }
}

/// Result of the capability probe on a sender.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SenderAuthority {
    /// Plain actor; only the sender itself may approve
    Plain,
    /// Managed entity with a non-empty admin list
    Managed(AdminState),
}

impl SenderAuthority {
    /// Validate admin state returned for a managed sender.
    pub fn managed(sender: Address, state: AdminState) -> RebalanceResult<Self> {
        if state.admins.is_empty() {
            return Err(RebalanceError::EmptyAdminList { sender });
        }
        Ok(Self::Managed(state))
    }

    /// Approvals needed before the sender counts as approved.
    pub fn required_approvals(&self) -> usize {
        match self {
            Self::Plain => 1,
            Self::Managed(state) => state.min_required,
        }
    }

    /// Check that `caller` may approve on behalf of `sender`.
    pub fn authorize(&self, sender: Address, caller: Address) -> RebalanceResult<()> {
        match self {
            Self::Plain if caller == sender => Ok(()),
            Self::Plain => Err(RebalanceError::CallerMismatch { sender, caller }),
            Self::Managed(state) if state.is_admin(&caller) => Ok(()),
            Self::Managed(_) => Err(RebalanceError::CallerNotAdmin { sender, caller }),
        }
    }

    /// Recorded approvers that still hold authority over the sender.
    pub fn effective_approvals(&self, sender: &Sender) -> usize {
        match self {
            Self::Plain => sender
                .approvers
                .iter()
                .filter(|approver| **approver == sender.address)
                .count(),
            Self::Managed(state) => sender
                .approvers
                .iter()
                .filter(|approver| state.is_admin(approver))
                .count(),
        }
    }

    /// Check effective approvals against the live threshold.
    ///
    /// An approval from an admin who has since been removed no longer counts.
    pub fn ensure_quorum(&self, sender: &Sender) -> RebalanceResult<()> {
        let have = self.effective_approvals(sender);
        let need = self.required_approvals();
        if have < need {
            return Err(RebalanceError::QuorumNotMet {
                sender: sender.address,
                have,
                need,
            });
        }
        Ok(())
    }
}
