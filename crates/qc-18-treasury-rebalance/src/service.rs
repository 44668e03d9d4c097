//! Treasury Rebalance Service - Core business logic
//!
//! Owns the singleton process state behind one `parking_lot::RwLock`. Every
//! mutating call holds the write guard from its first check to its last
//! write, oracle reads included, so calls are serialized and atomic. Reads
//! share the read guard.
//!
//! Each operation validates everything before it writes anything. Events are
//! buffered while the operation runs and published only once it succeeds.

use crate::config::{ConfigError, RebalanceConfig};
use crate::domain::invariants::{ensure_sufficient_funds, total_balance};
use crate::domain::{
    Address, Amount, BlockNumber, Phase, Receiver, Registry, Sender, SenderAuthority,
};
use crate::error::{RebalanceError, RebalanceResult};
use crate::events::{EventEnvelope, RebalanceEvent};
use crate::metrics;
use crate::ports::inbound::{RebalanceSnapshot, TreasuryRebalanceApi};
use crate::ports::outbound::{AuthorityOracle, BalanceOracle, ChainClock, EventPublisher};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Internal process state
struct ProcessState {
    owner: Address,
    phase: Phase,
    registry: Registry,
    memo: String,
}

impl ProcessState {
    fn new(owner: Address) -> Self {
        Self {
            owner,
            phase: Phase::Registration,
            registry: Registry::new(),
            memo: String::new(),
        }
    }

    fn ensure_owner(&self, caller: Address) -> RebalanceResult<()> {
        if caller != self.owner {
            return Err(RebalanceError::NotOwner { caller });
        }
        Ok(())
    }
}

/// Treasury Rebalance Service implementation
pub struct TreasuryRebalanceService<A, B, C, P>
where
    A: AuthorityOracle,
    B: BalanceOracle,
    C: ChainClock,
    P: EventPublisher,
{
    activation_point: BlockNumber,
    state: RwLock<ProcessState>,
    authority: Arc<A>,
    balances: Arc<B>,
    clock: Arc<C>,
    publisher: Arc<P>,
    next_sequence: AtomicU64,
}

impl<A, B, C, P> TreasuryRebalanceService<A, B, C, P>
where
    A: AuthorityOracle,
    B: BalanceOracle,
    C: ChainClock,
    P: EventPublisher,
{
    /// Create the coordinator. The activation point is fixed here for the
    /// lifetime of the instance.
    pub fn new(
        config: &RebalanceConfig,
        authority: Arc<A>,
        balances: Arc<B>,
        clock: Arc<C>,
        publisher: Arc<P>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        info!(
            owner = %config.owner,
            activation_point = config.activation_point,
            "[qc-18] treasury rebalance coordinator created"
        );
        Ok(Self {
            activation_point: config.activation_point,
            state: RwLock::new(ProcessState::new(config.owner)),
            authority,
            balances,
            clock,
            publisher,
            next_sequence: AtomicU64::new(0),
        })
    }

    /// Run a mutating operation under the write guard.
    ///
    /// `op` must not write before its last fallible step. Buffered events are
    /// published only on success; failures are logged and counted by category.
    fn mutate<T, F>(&self, operation: &'static str, op: F) -> RebalanceResult<T>
    where
        F: FnOnce(&mut ProcessState, &mut Vec<RebalanceEvent>) -> RebalanceResult<T>,
    {
        let mut state = self.state.write();
        let mut pending = Vec::new();

        match op(&mut *state, &mut pending) {
            Ok(value) => {
                metrics::record_commit(operation);
                metrics::set_phase(state.phase);
                let block_number = self.clock.current();
                for event in pending {
                    if matches!(event, RebalanceEvent::Approved { .. }) {
                        metrics::record_approval();
                    }
                    let sequence = self.next_sequence.fetch_add(1, Ordering::SeqCst);
                    info!(
                        operation,
                        topic = event.topic(),
                        sequence,
                        phase = %state.phase,
                        "[qc-18] committed"
                    );
                    self.publisher
                        .publish(EventEnvelope::new(sequence, block_number, event));
                }
                Ok(value)
            }
            Err(err) => {
                metrics::record_rejection(err.category());
                warn!(
                    operation,
                    category = %err.category(),
                    security = err.is_security_relevant(),
                    error = %err,
                    "[qc-18] operation rejected"
                );
                Err(err)
            }
        }
    }

    /// Live capability probe for `sender`. Never cached.
    fn resolve_authority(&self, sender: Address) -> RebalanceResult<SenderAuthority> {
        if !self.authority.is_managed(&sender) {
            return Ok(SenderAuthority::Plain);
        }
        let admin_state =
            self.authority
                .admin_state(&sender)
                .map_err(|e| RebalanceError::OracleCallFailed {
                    sender,
                    reason: e.to_string(),
                })?;
        debug!(
            sender = %sender,
            admins = admin_state.admins.len(),
            min_required = admin_state.min_required,
            "[qc-18] resolved managed sender"
        );
        SenderAuthority::managed(sender, admin_state)
    }

    fn activation_reached(&self) -> bool {
        self.clock.current() >= self.activation_point
    }
}

impl<A, B, C, P> TreasuryRebalanceApi for TreasuryRebalanceService<A, B, C, P>
where
    A: AuthorityOracle,
    B: BalanceOracle,
    C: ChainClock,
    P: EventPublisher,
{
    fn register_sender(&self, caller: Address, sender: Address) -> RebalanceResult<()> {
        self.mutate("register_sender", |state, events| {
            state.ensure_owner(caller)?;
            state.phase.ensure(Phase::Registration)?;
            let entry = state.registry.register_sender(sender)?;
            events.push(RebalanceEvent::SenderRegistered {
                sender,
                approvers: entry.approvers.clone(),
            });
            Ok(())
        })
    }

    fn remove_sender(&self, caller: Address, sender: Address) -> RebalanceResult<usize> {
        self.mutate("remove_sender", |state, events| {
            state.ensure_owner(caller)?;
            state.phase.ensure(Phase::Registration)?;
            let removed = state.registry.remove_sender(&sender)?;
            let approver_count = removed.approver_count();
            events.push(RebalanceEvent::SenderRemoved {
                sender,
                approver_count,
            });
            Ok(approver_count)
        })
    }

    fn register_receiver(
        &self,
        caller: Address,
        receiver: Address,
        amount: Amount,
    ) -> RebalanceResult<()> {
        self.mutate("register_receiver", |state, events| {
            state.ensure_owner(caller)?;
            state.phase.ensure(Phase::Registration)?;
            state.registry.register_receiver(receiver, amount)?;
            events.push(RebalanceEvent::ReceiverRegistered { receiver, amount });
            Ok(())
        })
    }

    fn remove_receiver(&self, caller: Address, receiver: Address) -> RebalanceResult<Amount> {
        self.mutate("remove_receiver", |state, events| {
            state.ensure_owner(caller)?;
            state.phase.ensure(Phase::Registration)?;
            let removed = state.registry.remove_receiver(&receiver)?;
            events.push(RebalanceEvent::ReceiverRemoved {
                receiver,
                remaining_receivers: state.registry.receiver_count(),
            });
            Ok(removed.amount)
        })
    }

    fn approve(&self, caller: Address, sender: Address) -> RebalanceResult<usize> {
        self.mutate("approve", |state, events| {
            state.phase.ensure(Phase::Registered)?;
            if !state.registry.is_sender(&sender) {
                return Err(RebalanceError::SenderNotRegistered { sender });
            }

            let authority = self.resolve_authority(sender)?;
            authority.authorize(sender, caller)?;

            let approver_count = state.registry.record_approval(&sender, caller)?;
            events.push(RebalanceEvent::Approved {
                sender,
                approver: caller,
                approver_count,
            });
            Ok(approver_count)
        })
    }

    fn finalize_registration(&self, caller: Address) -> RebalanceResult<()> {
        self.mutate("finalize_registration", |state, events| {
            state.ensure_owner(caller)?;
            let next = state.phase.advance_from(Phase::Registration)?;
            state.phase = next;
            events.push(RebalanceEvent::PhaseChanged { phase: next });
            Ok(())
        })
    }

    fn finalize_approval(&self, caller: Address) -> RebalanceResult<()> {
        self.mutate("finalize_approval", |state, events| {
            state.ensure_owner(caller)?;
            let next = state.phase.advance_from(Phase::Registered)?;

            // Thresholds may have moved since the approvals were recorded.
            for sender in state.registry.senders() {
                self.resolve_authority(sender.address)?
                    .ensure_quorum(sender)?;
            }

            let available = total_balance(
                state
                    .registry
                    .senders()
                    .map(|sender| self.balances.balance_of(&sender.address)),
            );
            ensure_sufficient_funds(state.registry.total_allocated(), available)?;

            state.phase = next;
            events.push(RebalanceEvent::PhaseChanged { phase: next });
            Ok(())
        })
    }

    fn finalize_contract(&self, caller: Address, memo: String) -> RebalanceResult<()> {
        self.mutate("finalize_contract", |state, events| {
            state.ensure_owner(caller)?;
            let next = state.phase.advance_from(Phase::Approved)?;
            state.phase = next;
            state.memo = memo.clone();
            events.push(RebalanceEvent::Finalized { memo, phase: next });
            Ok(())
        })
    }

    fn reset(&self, caller: Address) -> RebalanceResult<()> {
        self.mutate("reset", |state, events| {
            state.ensure_owner(caller)?;
            if state.phase.is_terminal() || self.activation_reached() {
                return Err(RebalanceError::ProcessFinalized {
                    current: self.clock.current(),
                    activation_point: self.activation_point,
                });
            }

            state.registry.clear();
            state.memo.clear();
            state.phase = Phase::Registration;
            events.push(RebalanceEvent::Reset {
                activation_point: self.activation_point,
            });
            Ok(())
        })
    }

    fn transfer_ownership(&self, caller: Address, new_owner: Address) -> RebalanceResult<()> {
        self.mutate("transfer_ownership", |state, events| {
            state.ensure_owner(caller)?;
            if new_owner.is_zero() {
                return Err(RebalanceError::InvalidAddress);
            }
            let previous_owner = std::mem::replace(&mut state.owner, new_owner);
            events.push(RebalanceEvent::OwnershipTransferred {
                previous_owner,
                new_owner,
            });
            Ok(())
        })
    }

    fn receive_payment(&self, from: Address, amount: Amount) -> RebalanceResult<()> {
        self.mutate("receive_payment", |_, _| {
            Err(RebalanceError::PaymentsNotAccepted { from, amount })
        })
    }

    fn get_sender(&self, sender: Address) -> RebalanceResult<Sender> {
        self.state.read().registry.sender(&sender).cloned()
    }

    fn get_receiver(&self, receiver: Address) -> RebalanceResult<Receiver> {
        self.state.read().registry.receiver(&receiver).cloned()
    }

    fn sender_count(&self) -> usize {
        self.state.read().registry.sender_count()
    }

    fn receiver_count(&self) -> usize {
        self.state.read().registry.receiver_count()
    }

    fn senders(&self) -> Vec<Sender> {
        self.state.read().registry.senders().cloned().collect()
    }

    fn receivers(&self) -> Vec<Receiver> {
        self.state.read().registry.receivers().cloned().collect()
    }

    fn total_allocated(&self) -> Amount {
        self.state.read().registry.total_allocated()
    }

    fn phase(&self) -> Phase {
        self.state.read().phase
    }

    fn activation_point(&self) -> BlockNumber {
        self.activation_point
    }

    fn memo(&self) -> String {
        self.state.read().memo.clone()
    }

    fn owner(&self) -> Address {
        self.state.read().owner
    }

    fn is_managed_entity(&self, address: Address) -> bool {
        self.authority.is_managed(&address)
    }

    fn snapshot(&self) -> RebalanceSnapshot {
        let state = self.state.read();
        RebalanceSnapshot {
            owner: state.owner,
            phase: state.phase,
            activation_point: self.activation_point,
            memo: state.memo.clone(),
            total_allocated: state.registry.total_allocated(),
            senders: state.registry.senders().cloned().collect(),
            receivers: state.registry.receivers().cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{BroadcastEventBus, InMemoryLedger, ManualClock};
    use crate::domain::invariants::check_allocation_invariant;
    use tokio::sync::broadcast::error::TryRecvError;

    const OWNER: Address = Address::new([0xAA; 20]);

    type TestService =
        TreasuryRebalanceService<InMemoryLedger, InMemoryLedger, ManualClock, BroadcastEventBus>;

    struct Harness {
        service: TestService,
        ledger: Arc<InMemoryLedger>,
        clock: Arc<ManualClock>,
        bus: Arc<BroadcastEventBus>,
    }

    fn addr(byte: u8) -> Address {
        Address::new([byte; 20])
    }

    fn create_test_service() -> Harness {
        let ledger = Arc::new(InMemoryLedger::new());
        let clock = Arc::new(ManualClock::new(100));
        let bus = Arc::new(BroadcastEventBus::new());
        let service = TreasuryRebalanceService::new(
            &RebalanceConfig::new(OWNER, 140),
            Arc::clone(&ledger),
            Arc::clone(&ledger),
            Arc::clone(&clock),
            Arc::clone(&bus),
        )
        .unwrap();
        Harness {
            service,
            ledger,
            clock,
            bus,
        }
    }

    #[test]
    fn test_invalid_config_rejected() {
        let ledger = Arc::new(InMemoryLedger::new());
        let result = TreasuryRebalanceService::new(
            &RebalanceConfig::new(Address::ZERO, 140),
            Arc::clone(&ledger),
            ledger,
            Arc::new(ManualClock::new(0)),
            Arc::new(BroadcastEventBus::new()),
        );
        assert!(matches!(result, Err(ConfigError::MissingOwner)));
    }

    #[test]
    fn test_initial_state() {
        let h = create_test_service();
        assert_eq!(h.service.phase(), Phase::Registration);
        assert_eq!(h.service.total_allocated(), Amount::zero());
        assert_eq!(h.service.activation_point(), 140);
        assert_eq!(h.service.memo(), "");
        assert_eq!(h.service.owner(), OWNER);
    }

    #[test]
    fn test_owner_gate_checked_before_phase() {
        let h = create_test_service();
        h.service.finalize_registration(OWNER).unwrap();
        assert_eq!(
            h.service.register_sender(addr(9), addr(1)),
            Err(RebalanceError::NotOwner { caller: addr(9) })
        );
    }

    #[test]
    fn test_events_only_published_on_success() {
        let h = create_test_service();
        let mut rx = h.bus.subscribe();

        h.service.register_sender(OWNER, addr(1)).unwrap();
        assert!(h.service.register_sender(OWNER, addr(1)).is_err());
        assert!(h.service.register_sender(addr(2), addr(3)).is_err());

        let first = rx.try_recv().unwrap();
        assert_eq!(first.sequence, 0);
        assert_eq!(first.block_number, 100);
        assert_eq!(
            first.event,
            RebalanceEvent::SenderRegistered {
                sender: addr(1),
                approvers: vec![]
            }
        );
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
        assert_eq!(h.bus.events_published(), 1);
    }

    #[test]
    fn test_failed_finalize_approval_leaves_phase() {
        let h = create_test_service();
        h.ledger.deploy_managed(addr(1), vec![addr(10), addr(11)], 2);
        h.service.register_sender(OWNER, addr(1)).unwrap();
        h.service.finalize_registration(OWNER).unwrap();
        h.service.approve(addr(10), addr(1)).unwrap();

        let err = h.service.finalize_approval(OWNER).unwrap_err();
        assert_eq!(
            err,
            RebalanceError::QuorumNotMet {
                sender: addr(1),
                have: 1,
                need: 2
            }
        );
        assert_eq!(h.service.phase(), Phase::Registered);
        assert_eq!(h.service.get_sender(addr(1)).unwrap().approvers, vec![addr(10)]);
    }

    #[test]
    fn test_approve_failure_records_nothing() {
        let h = create_test_service();
        h.ledger.deploy_managed(addr(1), vec![addr(10)], 1);
        h.service.register_sender(OWNER, addr(1)).unwrap();
        h.service.finalize_registration(OWNER).unwrap();

        assert!(matches!(
            h.service.approve(addr(12), addr(1)),
            Err(RebalanceError::CallerNotAdmin { .. })
        ));
        assert_eq!(h.service.get_sender(addr(1)).unwrap().approver_count(), 0);
    }

    #[test]
    fn test_reset_blocked_at_activation_point() {
        let h = create_test_service();
        h.clock.set(139);
        assert!(h.service.reset(OWNER).is_ok());
        h.clock.set(140);
        assert_eq!(
            h.service.reset(OWNER),
            Err(RebalanceError::ProcessFinalized {
                current: 140,
                activation_point: 140
            })
        );
    }

    #[cfg(feature = "metrics")]
    #[test]
    fn test_rejections_counted_by_category() {
        let h = create_test_service();
        let rejected = crate::metrics::OPERATIONS_REJECTED.with_label_values(&["authorization"]);
        let approvals = &*crate::metrics::APPROVALS;
        let before = (rejected.get(), approvals.get());

        assert!(h.service.register_sender(addr(9), addr(1)).is_err());
        h.service.register_sender(OWNER, addr(1)).unwrap();
        h.service.finalize_registration(OWNER).unwrap();
        h.service.approve(addr(1), addr(1)).unwrap();

        assert!(rejected.get() > before.0);
        assert!(approvals.get() > before.1);
    }

    #[test]
    fn test_transfer_ownership() {
        let h = create_test_service();
        assert_eq!(
            h.service.transfer_ownership(OWNER, Address::ZERO),
            Err(RebalanceError::InvalidAddress)
        );
        h.service.transfer_ownership(OWNER, addr(5)).unwrap();
        assert_eq!(h.service.owner(), addr(5));
        assert!(matches!(
            h.service.register_sender(OWNER, addr(1)),
            Err(RebalanceError::NotOwner { .. })
        ));
        h.service.register_sender(addr(5), addr(1)).unwrap();
    }

    #[test]
    fn test_snapshot_reflects_state() {
        let h = create_test_service();
        h.service.register_sender(OWNER, addr(1)).unwrap();
        h.service
            .register_receiver(OWNER, addr(2), Amount::from(30u64))
            .unwrap();

        let snapshot = h.service.snapshot();
        assert_eq!(snapshot.senders.len(), 1);
        assert_eq!(snapshot.receivers[0].amount, Amount::from(30u64));
        assert_eq!(snapshot.total_allocated, Amount::from(30u64));
        assert!(snapshot.to_json().unwrap().contains("\"phase\": \"Registration\""));

        let state = h.service.state.read();
        assert!(check_allocation_invariant(&state.registry));
    }
}
