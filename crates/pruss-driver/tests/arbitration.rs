//! Exclusive reservation of PRU cores and memory regions
//!
//! Exercises the reservation protocol end to end on a software-backed
//! instance: exclusivity under contention, release semantics, and the
//! asymmetry between core release (silent) and region release (reported).

mod common;

use common::{p0, Am335x};
use pruss_driver::prelude::*;
use pruss_driver::PruCore;
use std::sync::{Arc, Barrier};
use std::thread;

const CONTENDERS: usize = 8;

#[test]
fn concurrent_core_reservation_has_one_winner() {
    let fixture = Am335x::describe();
    fixture.bind_cores();
    let pruss = p0(&fixture);

    for round in 0..20 {
        let barrier = Arc::new(Barrier::new(CONTENDERS));
        let results: Vec<Result<CoreHandle>> = (0..CONTENDERS)
            .map(|_| {
                let pruss = Arc::clone(&pruss);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    pruss.reserve_core(PruId::Pru1)
                })
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|h| h.join().unwrap())
            .collect();

        let winners: Vec<&CoreHandle> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
        assert_eq!(winners.len(), 1, "round {round}");
        for err in results.iter().filter_map(|r| r.as_ref().err()) {
            assert!(matches!(err, PrussError::Busy { .. }), "round {round}: {err}");
        }

        pruss.release_core(winners[0]);
        assert!(pruss.core_holder(PruId::Pru1).is_none());
    }
}

#[test]
fn concurrent_region_reservation_has_one_winner() {
    let fixture = Am335x::describe();
    let pruss = p0(&fixture);

    for round in 0..20 {
        let barrier = Arc::new(Barrier::new(CONTENDERS));
        let results: Vec<Result<ReservedRegion>> = (0..CONTENDERS)
            .map(|_| {
                let pruss = Arc::clone(&pruss);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    pruss.reserve_region(MemKind::Dram0)
                })
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|h| h.join().unwrap())
            .collect();

        let winners: Vec<&ReservedRegion> =
            results.iter().filter_map(|r| r.as_ref().ok()).collect();
        assert_eq!(winners.len(), 1, "round {round}");
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, PrussError::Busy { .. })));

        assert_eq!(pruss.region_holder(MemKind::Dram0), Some(winners[0].token()));
        pruss.release_region(winners[0].token()).unwrap();
    }
}

#[test]
fn released_core_can_be_reserved_again() {
    let fixture = Am335x::describe();
    fixture.bind_cores();
    let pruss = p0(&fixture);

    let h = pruss.reserve_core(PruId::Pru0).unwrap();
    pruss.release_core(&h);
    let h2 = pruss.reserve_core(PruId::Pru0).unwrap();
    assert!(Arc::ptr_eq(&h, &h2));
    pruss.release_core(&h2);
}

#[test]
fn releasing_an_unheld_core_changes_nothing() {
    let fixture = Am335x::describe();
    fixture.bind_cores();
    let pruss = p0(&fixture);

    let held = pruss.reserve_core(PruId::Pru0).unwrap();
    let idle = fixture.tree.bound_core(fixture.pru_nodes[1]).unwrap();
    let foreign = PruCore::new("elsewhere.pru0", PruId::Pru0);

    pruss.release_core(&idle);
    pruss.release_core(&foreign);

    let holder = pruss.core_holder(PruId::Pru0).unwrap();
    assert!(Arc::ptr_eq(&holder, &held));
    assert!(pruss.core_holder(PruId::Pru1).is_none());

    // releasing twice is also fine
    pruss.release_core(&held);
    pruss.release_core(&held);
    assert!(!pruss.has_reservations());
}

#[test]
fn releasing_an_unheld_region_is_reported() {
    let fixture = Am335x::describe();
    let pruss = p0(&fixture);
    let other = p0(&fixture);

    let dram0 = pruss.reserve_region(MemKind::Dram0).unwrap();
    let foreign = other.reserve_region(MemKind::Dram1).unwrap();

    let err = pruss.release_region(foreign.token()).unwrap_err();
    assert!(matches!(err, PrussError::InvalidArgument { .. }));
    assert!(!err.is_transient());
    assert_eq!(pruss.region_holder(MemKind::Dram0), Some(dram0.token()));
    assert_eq!(pruss.region_holder(MemKind::Dram1), None);

    pruss.release_region(dram0.token()).unwrap();
    let err = pruss.release_region(dram0.token()).unwrap_err();
    assert!(matches!(err, PrussError::InvalidArgument { .. }));
    assert!(!pruss.has_reservations());
}

#[test]
fn two_clients_share_an_instance() {
    let fixture = Am335x::describe();
    fixture.bind_cores();
    let p0 = p0(&fixture);

    // client A
    let a_core = p0.reserve_core(PruId::Pru0).unwrap();

    // client B
    let err = p0.reserve_core(PruId::Pru0).unwrap_err();
    assert!(matches!(err, PrussError::Busy { .. }));
    assert!(err.is_transient());
    let b_core1 = p0.reserve_core(PruId::Pru1).unwrap();

    // client A
    let a_bank = p0.reserve_region(MemKind::Dram0).unwrap();
    assert_eq!(a_bank.region().kind, MemKind::Dram0);
    assert_eq!(a_bank.region().physical_base, 0x1000);
    assert_eq!(a_bank.region().size, 0x2000);

    p0.release_core(&a_core);
    p0.release_region(a_bank.token()).unwrap();

    // client B
    let b_core0 = p0.reserve_core(PruId::Pru0).unwrap();
    assert!(Arc::ptr_eq(&b_core0, &a_core));
    assert!(p0.reserve_region(MemKind::Dram0).is_ok());

    p0.release_core(&b_core0);
    p0.release_core(&b_core1);
}

#[test]
fn out_of_range_identifiers_are_invalid() {
    let err: PrussError = PruId::try_from(2).unwrap_err().into();
    assert!(matches!(err, PrussError::InvalidArgument { .. }));

    let err: PrussError = MemKind::try_from(6).unwrap_err().into();
    assert!(matches!(err, PrussError::InvalidArgument { .. }));
}
