//! Sender and receiver registry
//!
//! Owns the registered sets and the running allocation total. Every mutation
//! validates fully before touching state, so a rejected call changes nothing.
//! Phase and ownership gating live in the service, not here.

use crate::domain::entities::{Receiver, Sender};
use crate::domain::value_objects::{Address, Amount};
use crate::error::{EntryKind, RebalanceError, RebalanceResult};
use std::collections::HashMap;

/// Registered senders and receivers, in registration order.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    senders: HashMap<Address, Sender>,
    sender_order: Vec<Address>,
    receivers: HashMap<Address, Receiver>,
    receiver_order: Vec<Address>,
    total_allocated: Amount,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    // -------------------------------------------------------------------------
    // Senders
    // -------------------------------------------------------------------------

    pub fn register_sender(&mut self, address: Address) -> RebalanceResult<&Sender> {
        if address.is_zero() {
            return Err(RebalanceError::InvalidAddress);
        }
        if self.senders.contains_key(&address) {
            return Err(RebalanceError::AlreadyRegistered {
                kind: EntryKind::Sender,
                address,
            });
        }

        self.sender_order.push(address);
        Ok(self
            .senders
            .entry(address)
            .or_insert_with(|| Sender::new(address)))
    }

    /// Remove a sender, returning the entry as it was.
    pub fn remove_sender(&mut self, address: &Address) -> RebalanceResult<Sender> {
        let sender = self
            .senders
            .remove(address)
            .ok_or(RebalanceError::NotFound {
                kind: EntryKind::Sender,
                address: *address,
            })?;
        self.sender_order.retain(|a| a != address);
        Ok(sender)
    }

    pub fn sender(&self, address: &Address) -> RebalanceResult<&Sender> {
        self.senders.get(address).ok_or(RebalanceError::NotFound {
            kind: EntryKind::Sender,
            address: *address,
        })
    }

    pub fn is_sender(&self, address: &Address) -> bool {
        self.senders.contains_key(address)
    }

    pub fn sender_count(&self) -> usize {
        self.sender_order.len()
    }

    /// Senders in registration order.
    pub fn senders(&self) -> impl Iterator<Item = &Sender> + '_ {
        self.sender_order
            .iter()
            .filter_map(move |address| self.senders.get(address))
    }

    /// Append `approver` to the sender's approver list.
    ///
    /// Returns the new approver count.
    pub fn record_approval(
        &mut self,
        sender: &Address,
        approver: Address,
    ) -> RebalanceResult<usize> {
        let entry = self
            .senders
            .get_mut(sender)
            .ok_or(RebalanceError::SenderNotRegistered { sender: *sender })?;
        if entry.has_approved(&approver) {
            return Err(RebalanceError::DuplicateApproval {
                sender: *sender,
                approver,
            });
        }
        Ok(entry.push_approver(approver))
    }

    // -------------------------------------------------------------------------
    // Receivers
    // -------------------------------------------------------------------------

    pub fn register_receiver(
        &mut self,
        address: Address,
        amount: Amount,
    ) -> RebalanceResult<&Receiver> {
        if address.is_zero() {
            return Err(RebalanceError::InvalidAddress);
        }
        if amount.is_zero() {
            return Err(RebalanceError::InvalidAmount);
        }
        if self.receivers.contains_key(&address) {
            return Err(RebalanceError::AlreadyRegistered {
                kind: EntryKind::Receiver,
                address,
            });
        }
        let total = self
            .total_allocated
            .checked_add(amount)
            .ok_or(RebalanceError::ArithmeticOverflow { amount })?;

        self.total_allocated = total;
        self.receiver_order.push(address);
        Ok(self
            .receivers
            .entry(address)
            .or_insert_with(|| Receiver::new(address, amount)))
    }

    /// Remove a receiver and release its allocation.
    pub fn remove_receiver(&mut self, address: &Address) -> RebalanceResult<Receiver> {
        let receiver = self
            .receivers
            .remove(address)
            .ok_or(RebalanceError::NotFound {
                kind: EntryKind::Receiver,
                address: *address,
            })?;
        self.receiver_order.retain(|a| a != address);
        // Cannot underflow: the amount was added on registration.
        self.total_allocated = self.total_allocated.saturating_sub(receiver.amount);
        Ok(receiver)
    }

    pub fn receiver(&self, address: &Address) -> RebalanceResult<&Receiver> {
        self.receivers.get(address).ok_or(RebalanceError::NotFound {
            kind: EntryKind::Receiver,
            address: *address,
        })
    }

    pub fn receiver_count(&self) -> usize {
        self.receiver_order.len()
    }

    /// Receivers in registration order.
    pub fn receivers(&self) -> impl Iterator<Item = &Receiver> + '_ {
        self.receiver_order
            .iter()
            .filter_map(move |address| self.receivers.get(address))
    }

    pub fn total_allocated(&self) -> Amount {
        self.total_allocated
    }

    /// Drop every entry and zero the allocation total.
    pub fn clear(&mut self) {
        self.senders.clear();
        self.sender_order.clear();
        self.receivers.clear();
        self.receiver_order.clear();
        self.total_allocated = Amount::zero();
    }
}
