//! Manually driven block height clock.

use crate::domain::BlockNumber;
use crate::ports::outbound::ChainClock;
use std::sync::atomic::{AtomicU64, Ordering};

/// Block height source advanced by the caller.
///
/// Stands in for the chain head in tests and simulations; `advance` plays the
/// role of mining blocks.
#[derive(Debug, Default)]
pub struct ManualClock {
    height: AtomicU64,
}

impl ManualClock {
    pub fn new(height: BlockNumber) -> Self {
        Self {
            height: AtomicU64::new(height),
        }
    }

    /// Move forward by `blocks`, returning the new height.
    pub fn advance(&self, blocks: u64) -> BlockNumber {
        self.height.fetch_add(blocks, Ordering::SeqCst) + blocks
    }

    /// Jump to `height`. Never moves backwards.
    pub fn set(&self, height: BlockNumber) {
        self.height.fetch_max(height, Ordering::SeqCst);
    }
}

impl ChainClock for ManualClock {
    fn current(&self) -> BlockNumber {
        self.height.load(Ordering::SeqCst)
    }
}
