//! # qc-18-treasury-rebalance
//!
//! Treasury Rebalance coordinator: a one-time, irreversible handover of
//! pooled funds from registered sender accounts to registered receiver
//! accounts, gated by per-sender administrative quorum.
//!
//! ## Overview
//!
//! This subsystem provides:
//! - **Registry**: senders (with their ordered approvers) and receivers (with
//!   their allocations), plus the running allocation total
//! - **Quorum**: live admin-list lookups at approval time and again when
//!   approval is finalized; nothing is cached
//! - **Phase control**: a forward-only state machine with a funds check
//!   before the irreversible step
//! - **Reset**: full wipe while still revocable
//!
//! The payout sweep itself runs outside this crate after finalization.
//!
//! ## Phases
//!
//! ```text
//! [REGISTRATION] ──→ [REGISTERED] ──→ [APPROVED] ──→ [FINALIZED]
//!  register/remove     approve          quorum +       terminal
//!                                       funds checked
//!        ↑                                   │
//!        └──── reset (owner, before activation point, not finalized)
//! ```
//!
//! ## Collaborators
//!
//! | Port | Purpose |
//! |------|---------|
//! | `AuthorityOracle` | managed-entity probe and live admin state |
//! | `BalanceOracle` | current sender balances |
//! | `ChainClock` | block height compared against the activation point |
//! | `EventPublisher` | committed events for auditors and the sweeper |
//!
//! ## Example
//!
//! ```rust,ignore
//! use qc_18_treasury_rebalance::{
//!     BroadcastEventBus, InMemoryLedger, ManualClock, RebalanceConfig,
//!     TreasuryRebalanceApi, TreasuryRebalanceService,
//! };
//!
//! let config = RebalanceConfig::from_env()?;
//! let ledger = Arc::new(InMemoryLedger::new());
//! let service = TreasuryRebalanceService::new(
//!     &config,
//!     ledger.clone(),
//!     ledger,
//!     Arc::new(ManualClock::new(0)),
//!     Arc::new(BroadcastEventBus::from_config(&config)),
//! )?;
//!
//! service.register_sender(owner, treasury)?;
//! service.finalize_registration(owner)?;
//! service.approve(admin, treasury)?;
//! service.finalize_approval(owner)?;
//! service.finalize_contract(owner, "rebalance complete".into())?;
//! ```

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod events;
pub mod metrics;
pub mod ports;
pub mod service;
pub mod telemetry;

pub use adapters::{BroadcastEventBus, InMemoryLedger, ManualClock};
pub use config::{ConfigError, RebalanceConfig};
pub use domain::{
    Address, AdminState, Amount, BlockNumber, Phase, Receiver, Sender, SenderAuthority, U256,
};
pub use error::{EntryKind, ErrorCategory, OracleError, RebalanceError, RebalanceResult};
pub use events::{EventEnvelope, RebalanceEvent};
pub use ports::inbound::{RebalanceSnapshot, TreasuryRebalanceApi};
pub use ports::outbound::{AuthorityOracle, BalanceOracle, ChainClock, EventPublisher};
pub use service::TreasuryRebalanceService;
pub use telemetry::{init_tracing, TelemetryError};
