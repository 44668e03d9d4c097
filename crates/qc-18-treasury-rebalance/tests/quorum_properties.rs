//! Randomized checks of the approval gate and registry accounting.
//!
//! Each trial builds a fresh coordinator from a seeded `StdRng`, so failures
//! reproduce from the printed seed.

use qc_18_treasury_rebalance::{
    Address, Amount, BroadcastEventBus, InMemoryLedger, ManualClock, Phase, RebalanceConfig,
    RebalanceError, TreasuryRebalanceApi, TreasuryRebalanceService,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::sync::Arc;

type Service =
    TreasuryRebalanceService<InMemoryLedger, InMemoryLedger, ManualClock, BroadcastEventBus>;

const OWNER: Address = Address::new([0xEE; 20]);
const TRIALS: u64 = 200;

fn addr(tag: u8, i: u8, j: u8) -> Address {
    let mut bytes = [0x01u8; 20];
    bytes[0] = tag;
    bytes[1] = i;
    bytes[2] = j;
    Address::new(bytes)
}

fn new_service() -> (Service, Arc<InMemoryLedger>) {
    let ledger = Arc::new(InMemoryLedger::new());
    let service = TreasuryRebalanceService::new(
        &RebalanceConfig::new(OWNER, 1_000),
        Arc::clone(&ledger),
        Arc::clone(&ledger),
        Arc::new(ManualClock::new(1)),
        Arc::new(BroadcastEventBus::new()),
    )
    .unwrap();
    (service, ledger)
}

/// One sender of a generated scenario.
struct SenderPlan {
    address: Address,
    /// Empty for plain senders.
    admins: Vec<Address>,
    min_required: usize,
    approvals: usize,
    balance: u64,
}

impl SenderPlan {
    fn required(&self) -> usize {
        if self.admins.is_empty() {
            1
        } else {
            self.min_required
        }
    }

    fn approvers(&self) -> Vec<Address> {
        if self.admins.is_empty() {
            vec![self.address; self.approvals.min(1)]
        } else {
            self.admins[..self.approvals].to_vec()
        }
    }
}

fn plan_senders(rng: &mut StdRng) -> Vec<SenderPlan> {
    let count = rng.gen_range(1..=5u8);
    (0..count)
        .map(|i| {
            let address = addr(0x10, i, 0);
            let admin_count = if rng.gen_bool(0.3) { 0 } else { rng.gen_range(1..=4u8) };
            let admins: Vec<Address> = (0..admin_count).map(|j| addr(0x20, i, j + 1)).collect();
            let min_required = rng.gen_range(1..=admins.len().max(1));
            let approvals = rng.gen_range(0..=admins.len().max(1));
            SenderPlan {
                address,
                admins,
                min_required,
                approvals,
                balance: rng.gen_range(0..100),
            }
        })
        .collect()
}

#[test]
fn test_finalize_approval_matches_quorum_and_funds_model() {
    for seed in 0..TRIALS {
        let mut rng = StdRng::seed_from_u64(seed);
        let (service, ledger) = new_service();
        let plans = plan_senders(&mut rng);

        for plan in &plans {
            if !plan.admins.is_empty() {
                ledger.deploy_managed(plan.address, plan.admins.clone(), plan.min_required);
            }
            ledger.set_balance(plan.address, Amount::from(plan.balance));
            service.register_sender(OWNER, plan.address).unwrap();
        }

        let mut allocated = 0u64;
        for r in 0..rng.gen_range(0..4u8) {
            let amount = rng.gen_range(1..120u64);
            allocated += amount;
            service
                .register_receiver(OWNER, addr(0x30, r, 0), Amount::from(amount))
                .unwrap();
        }

        service.finalize_registration(OWNER).unwrap();
        for plan in &plans {
            for approver in plan.approvers() {
                service.approve(approver, plan.address).unwrap();
            }
        }

        let quorum_met = plans.iter().all(|p| p.approvers().len() >= p.required());
        let available: u64 = plans.iter().map(|p| p.balance).sum();
        let result = service.finalize_approval(OWNER);

        match result {
            Ok(()) => {
                assert!(quorum_met, "seed {seed}: accepted without quorum");
                assert!(allocated <= available, "seed {seed}: accepted underfunded");
                assert_eq!(service.phase(), Phase::Approved);
            }
            Err(RebalanceError::QuorumNotMet { .. }) => {
                assert!(!quorum_met, "seed {seed}: spurious quorum failure");
                assert_eq!(service.phase(), Phase::Registered);
            }
            Err(RebalanceError::InsufficientSenderFunds {
                allocated: a,
                available: b,
            }) => {
                assert!(quorum_met, "seed {seed}: funds checked before quorum");
                assert!(allocated > available, "seed {seed}: spurious funds failure");
                assert_eq!(a, Amount::from(allocated));
                assert_eq!(b, Amount::from(available));
            }
            Err(other) => panic!("seed {seed}: unexpected {other}"),
        }
    }
}

#[test]
fn test_duplicate_approvals_never_counted() {
    for seed in 0..TRIALS {
        let mut rng = StdRng::seed_from_u64(seed);
        let (service, ledger) = new_service();
        let sender = addr(0x10, 0, 0);
        let admins: Vec<Address> = (1..=6).map(|j| addr(0x20, 0, j)).collect();
        ledger.deploy_managed(sender, admins.clone(), 1);
        service.register_sender(OWNER, sender).unwrap();
        service.finalize_registration(OWNER).unwrap();

        let mut seen = HashSet::new();
        let mut order = Vec::new();
        for _ in 0..20 {
            let admin = admins[rng.gen_range(0..admins.len())];
            match service.approve(admin, sender) {
                Ok(count) => {
                    assert!(seen.insert(admin), "seed {seed}: repeat accepted");
                    order.push(admin);
                    assert_eq!(count, seen.len());
                }
                Err(RebalanceError::DuplicateApproval { .. }) => {
                    assert!(seen.contains(&admin));
                }
                Err(other) => panic!("seed {seed}: unexpected {other}"),
            }
        }

        assert_eq!(service.get_sender(sender).unwrap().approvers, order);
    }
}

#[test]
fn test_total_allocated_tracks_registered_receivers() {
    for seed in 0..TRIALS {
        let mut rng = StdRng::seed_from_u64(seed);
        let (service, _) = new_service();

        for _ in 0..30 {
            let receiver = addr(0x30, rng.gen_range(0..8u8), 0);
            if rng.gen_bool(0.6) {
                let _ = service.register_receiver(
                    OWNER,
                    receiver,
                    Amount::from(rng.gen_range(1..1_000u64)),
                );
            } else {
                let _ = service.remove_receiver(OWNER, receiver);
            }

            let sum = service
                .receivers()
                .iter()
                .fold(Amount::zero(), |acc, r| acc + r.amount);
            assert_eq!(service.total_allocated(), sum, "seed {seed}");
        }
    }
}

#[test]
fn test_reset_restores_empty_state_from_any_open_phase() {
    for seed in 0..TRIALS {
        let mut rng = StdRng::seed_from_u64(seed);
        let (service, ledger) = new_service();
        let sender = addr(0x10, 0, 0);
        ledger.set_balance(sender, Amount::from(1u64));

        service.register_sender(OWNER, sender).unwrap();
        service
            .register_receiver(OWNER, addr(0x30, 0, 0), Amount::from(1u64))
            .unwrap();

        let stop = rng.gen_range(0..3u8);
        if stop >= 1 {
            service.finalize_registration(OWNER).unwrap();
        }
        if stop >= 2 {
            service.approve(sender, sender).unwrap();
            service.finalize_approval(OWNER).unwrap();
        }

        for _ in 0..rng.gen_range(1..=3) {
            service.reset(OWNER).unwrap();
        }
        assert_eq!(service.phase(), Phase::Registration, "seed {seed}");
        assert_eq!(service.sender_count(), 0);
        assert_eq!(service.receiver_count(), 0);
        assert_eq!(service.total_allocated(), Amount::zero());
        assert_eq!(service.memo(), "");
    }
}
