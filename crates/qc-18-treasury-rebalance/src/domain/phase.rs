//! Process phase state machine
//!
//! Phases only move forward, one step at a time. The single way back is a
//! full reset, which always lands on `Registration` and is refused once the
//! process is finalized.

use crate::error::{RebalanceError, RebalanceResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Process phase
///
/// State Machine:
/// ```text
/// [REGISTRATION] ──finalize_registration──→ [REGISTERED]
///       ↑                                        │
///       │                                  finalize_approval
///       │                                  (quorum + funds)
///       │                                        ↓
///       │                                   [APPROVED] ──finalize_contract──→ [FINALIZED]
///       │                                        │                              (terminal)
///       └─────────── reset (before activation) ──┘
/// ```
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum Phase {
    /// Senders and receivers may be added or removed
    #[default]
    Registration = 0,
    /// Registry frozen, approvals being collected
    Registered = 1,
    /// Quorum and funds verified
    Approved = 2,
    /// Terminal; nothing may change
    Finalized = 3,
}

impl Phase {
    /// Numeric status code.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// The only phase reachable from this one, if any.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Registration => Some(Self::Registered),
            Self::Registered => Some(Self::Approved),
            Self::Approved => Some(Self::Finalized),
            Self::Finalized => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == Self::Finalized
    }

    /// Fails with `InvalidPhase` unless `self == expected`.
    pub fn ensure(self, expected: Self) -> RebalanceResult<()> {
        if self == expected {
            Ok(())
        } else {
            Err(RebalanceError::InvalidPhase {
                expected,
                actual: self,
            })
        }
    }

    /// Step from `from` to its successor, checking the current phase.
    pub fn advance_from(self, from: Self) -> RebalanceResult<Self> {
        self.ensure(from)?;
        self.next().ok_or(RebalanceError::InvalidPhase {
            expected: from,
            actual: self,
        })
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Registration => "Registration",
            Self::Registered => "Registered",
            Self::Approved => "Approved",
            Self::Finalized => "Finalized",
        };
        f.write_str(name)
    }
}
