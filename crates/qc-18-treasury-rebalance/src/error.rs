//! Error types for the Treasury Rebalance subsystem
//!
//! Every rejected operation leaves process state exactly as it was before the
//! call. Errors are grouped into categories so monitoring can separate
//! security-relevant rejections from ordinary caller mistakes.

use crate::domain::phase::Phase;
use crate::domain::value_objects::{Address, Amount, BlockNumber};
use std::fmt;
use thiserror::Error;

/// Broad classification of a rejection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Malformed input (null address, zero amount). Caller-correctable.
    Validation,
    /// Ordering or duplicate-state mistake by the caller.
    StateConflict,
    /// Caller is not allowed to perform the operation.
    Authorization,
    /// A third-party authority source misbehaved.
    Oracle,
    /// A phase gate is not satisfied yet (quorum, funds).
    Invariant,
}

impl ErrorCategory {
    /// Stable snake_case name, used as a log field and metric label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::StateConflict => "state_conflict",
            Self::Authorization => "authorization",
            Self::Oracle => "oracle",
            Self::Invariant => "invariant",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which registry set an entry belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    Sender,
    Receiver,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sender => f.write_str("sender"),
            Self::Receiver => f.write_str("receiver"),
        }
    }
}

/// Treasury Rebalance errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RebalanceError {
    /// Null address supplied where an account is required
    #[error("Invalid address: the zero address is not allowed")]
    InvalidAddress,

    /// Receiver amount must be strictly positive
    #[error("Invalid amount: receiver allocation cannot be zero")]
    InvalidAmount,

    /// Total allocation would not fit in 256 bits
    #[error("Arithmetic overflow while adding {amount} to total allocation")]
    ArithmeticOverflow { amount: Amount },

    /// Entry already present in the registry
    #[error("{kind} {address} is already registered")]
    AlreadyRegistered { kind: EntryKind, address: Address },

    /// Entry absent from the registry
    #[error("{kind} {address} does not exist")]
    NotFound { kind: EntryKind, address: Address },

    /// Approval attempted for an address that was never registered
    #[error("Sender {sender} needs to be registered before approval")]
    SenderNotRegistered { sender: Address },

    /// Caller has already approved this sender
    #[error("Duplicate approval: {approver} already approved sender {sender}")]
    DuplicateApproval { sender: Address, approver: Address },

    /// Operation not allowed in the current phase
    #[error("Operation not allowed at this stage: expected {expected}, current {actual}")]
    InvalidPhase { expected: Phase, actual: Phase },

    /// Reset attempted after finalization or after the activation point
    #[error("Process is finalized at block {current} (activation point {activation_point}), cannot reset")]
    ProcessFinalized {
        current: BlockNumber,
        activation_point: BlockNumber,
    },

    /// Unsolicited value transfer to the coordinator
    #[error("Payments are not accepted: {amount} from {from}")]
    PaymentsNotAccepted { from: Address, amount: Amount },

    /// Privileged operation called by someone other than the owner
    #[error("Caller {caller} is not the owner")]
    NotOwner { caller: Address },

    /// Plain sender approved by an address other than itself
    #[error("Caller {caller} is not the plain sender {sender}")]
    CallerMismatch { sender: Address, caller: Address },

    /// Caller missing from the live admin list of a managed sender
    #[error("Caller {caller} is not an admin of sender {sender}")]
    CallerNotAdmin { sender: Address, caller: Address },

    /// Admin query against a managed sender could not be completed
    #[error("Admin query for sender {sender} failed: {reason}")]
    OracleCallFailed { sender: Address, reason: String },

    /// Managed sender reported no admins
    #[error("Admin list of sender {sender} cannot be empty")]
    EmptyAdminList { sender: Address },

    /// Sender has fewer recorded approvals than its live threshold
    #[error("Quorum not met for sender {sender}: have {have} approvals, need {need}")]
    QuorumNotMet {
        sender: Address,
        have: usize,
        need: usize,
    },

    /// Receivers are allocated more than the senders hold
    #[error("Insufficient sender funds: allocated {allocated}, available {available}")]
    InsufficientSenderFunds { allocated: Amount, available: Amount },
}

impl RebalanceError {
    /// Category of this rejection.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidAddress | Self::InvalidAmount | Self::ArithmeticOverflow { .. } => {
                ErrorCategory::Validation
            }
            Self::AlreadyRegistered { .. }
            | Self::NotFound { .. }
            | Self::SenderNotRegistered { .. }
            | Self::DuplicateApproval { .. }
            | Self::InvalidPhase { .. }
            | Self::ProcessFinalized { .. }
            | Self::PaymentsNotAccepted { .. } => ErrorCategory::StateConflict,
            Self::NotOwner { .. } | Self::CallerMismatch { .. } | Self::CallerNotAdmin { .. } => {
                ErrorCategory::Authorization
            }
            Self::OracleCallFailed { .. } | Self::EmptyAdminList { .. } => ErrorCategory::Oracle,
            Self::QuorumNotMet { .. } | Self::InsufficientSenderFunds { .. } => {
                ErrorCategory::Invariant
            }
        }
    }

    /// Returns true for rejections worth a security alert.
    #[must_use]
    pub fn is_security_relevant(&self) -> bool {
        self.category() == ErrorCategory::Authorization
    }
}

/// Failure reported by an authority oracle.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OracleError {
    /// Address is managed but does not expose the admin-state query
    #[error("{address} does not expose an admin interface")]
    InterfaceUnavailable { address: Address },
}

/// Result type for rebalance operations
pub type RebalanceResult<T> = Result<T, RebalanceError>;
