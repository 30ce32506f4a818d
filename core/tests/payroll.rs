use claim_core::{
    config::{MarketConfig, SimConfig},
    engine::SimEngine,
    event::SimEvent,
};

fn engine(tick_interval_secs: f64, payroll_interval_secs: f64) -> SimEngine {
    let config = SimConfig {
        tick_interval_secs,
        payroll_interval_secs,
        market: MarketConfig { volatility: 0.0, ..MarketConfig::default() },
        ..SimConfig::default_test()
    };
    SimEngine::build_test(config).unwrap()
}

fn deductions(events: &[SimEvent]) -> Vec<(f64, u64, f64)> {
    events
        .iter()
        .filter_map(|e| match e {
            SimEvent::PayrollDeducted { amount, intervals, new_balance, .. } => {
                Some((*amount, *intervals, *new_balance))
            }
            _ => None,
        })
        .collect()
}

#[test]
fn long_tick_charges_every_elapsed_interval() {
    let mut engine = engine(20.0, 10.0);
    let owner = engine.store().insert_owner("ceres_ops", 50_000.0).unwrap();
    for name in ["Ito", "Marsh", "Quill"] {
        engine.store().insert_worker(Some(owner), name, 1_000.0).unwrap();
    }

    let events = engine.run_ticks(1);
    assert_eq!(
        events,
        vec![SimEvent::PayrollDeducted {
            player_id:   owner,
            amount:      6_000.0,
            intervals:   2,
            new_balance: 44_000.0,
        }]
    );
    assert_eq!(engine.store().owner_balance(owner).unwrap(), Some(44_000.0));
    assert_eq!(engine.world().payroll.accrued(owner), 0.0);
}

#[test]
fn nothing_is_charged_before_an_interval_completes() {
    let mut engine = engine(1.0, 60.0);
    let owner = engine.store().insert_owner("vesta_haul", 5_000.0).unwrap();
    engine.store().insert_worker(Some(owner), "Okafor", 250.0).unwrap();

    assert!(engine.run_ticks(59).is_empty());
    assert_eq!(engine.store().owner_balance(owner).unwrap(), Some(5_000.0));

    assert_eq!(deductions(&engine.run_ticks(1)), vec![(250.0, 1, 4_750.0)]);
}

#[test]
fn roster_is_read_when_the_interval_falls_due() {
    let mut engine = engine(30.0, 60.0);
    let store = engine.store();
    let owner = store.insert_owner("pallas_mining", 10_000.0).unwrap();
    let first = store.insert_worker(Some(owner), "Reyes", 100.0).unwrap();
    let second = store.insert_worker(None, "Dunn", 400.0).unwrap();

    engine.run_ticks(1);
    engine.store().hire_worker(second, owner).unwrap();
    assert_eq!(deductions(&engine.run_ticks(1)), vec![(500.0, 1, 9_500.0)]);

    engine.store().fire_worker(first).unwrap();
    assert_eq!(deductions(&engine.run_ticks(2)), vec![(400.0, 1, 9_100.0)]);
}

#[test]
fn owner_without_workers_gets_no_event() {
    let mut engine = engine(60.0, 60.0);
    let owner = engine.store().insert_owner("idle_corp", 1_000.0).unwrap();

    assert!(engine.run_ticks(3).is_empty());
    assert_eq!(engine.store().owner_balance(owner).unwrap(), Some(1_000.0));
    assert_eq!(engine.world().payroll.accrued(owner), 0.0);
}

#[test]
fn balance_may_go_negative() {
    let mut engine = engine(60.0, 60.0);
    let owner = engine.store().insert_owner("broke", 50.0).unwrap();
    engine.store().insert_worker(Some(owner), "Hale", 100.0).unwrap();

    assert_eq!(deductions(&engine.run_ticks(1)), vec![(100.0, 1, -50.0)]);
    assert_eq!(engine.store().owner_balance(owner).unwrap(), Some(-50.0));
}

#[test]
fn owners_accrue_independently() {
    let mut engine = engine(30.0, 60.0);
    let store = engine.store();
    let a = store.insert_owner("alpha", 1_000.0).unwrap();
    store.insert_worker(Some(a), "Ames", 10.0).unwrap();

    engine.run_ticks(1);
    let b = engine.store().insert_owner("beta", 1_000.0).unwrap();
    engine.store().insert_worker(Some(b), "Bell", 20.0).unwrap();

    // alpha reaches 60s, beta only 30s.
    let events = engine.run_ticks(1);
    assert_eq!(
        events,
        vec![SimEvent::PayrollDeducted { player_id: a, amount: 10.0, intervals: 1, new_balance: 990.0 }]
    );
    assert_eq!(engine.world().payroll.accrued(b), 30.0);
}
