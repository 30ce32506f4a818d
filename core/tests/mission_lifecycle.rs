use claim_core::{
    config::{MarketConfig, SimConfig},
    engine::SimEngine,
    event::SimEvent,
    mission_subsystem::{MissionStatus, OreYield},
    ore::OreType,
    store::{NewMission, NewVehicle},
    types::{MissionId, OwnerId, VehicleId},
};
use std::collections::BTreeMap;

const START_BALANCE: f64 = 1_000_000.0;

/// Ten-second ticks and a flat market so sale prices are the base prices.
fn config() -> SimConfig {
    SimConfig {
        tick_interval_secs: 10.0,
        market: MarketConfig { volatility: 0.0, ..MarketConfig::default() },
        ..SimConfig::default_test()
    }
}

struct Fleet {
    owner:   OwnerId,
    vehicle: VehicleId,
    mission: MissionId,
}

/// One owner, one vehicle, one mission: 20s out, 30s mining, 20s back,
/// 1 fuel/s. The site yields `yields` in tonnes per day.
fn dispatch(engine: &SimEngine, cargo_capacity: f64, fuel_capacity: f64, yields: &[OreYield]) -> Fleet {
    let store = engine.store();
    let owner = store.insert_owner("prospector", START_BALANCE).unwrap();
    let site = store.insert_site("Bennu", yields).unwrap();
    let vehicle = store
        .insert_vehicle(&NewVehicle {
            owner_id: owner,
            name: "Tern".into(),
            cargo_capacity,
            fuel_capacity,
            station_id: Some(1),
        })
        .unwrap();
    let mission = store
        .insert_mission(&NewMission {
            owner_id: owner,
            vehicle_id: vehicle,
            site_id: Some(site),
            transit_time: 20.0,
            fuel_per_tick: 1.0,
            mining_duration: 30.0,
        })
        .unwrap();
    Fleet { owner, vehicle, mission }
}

fn per_second(ore: OreType, tonnes: f64) -> OreYield {
    OreYield { ore, tonnes_per_day: tonnes * 86_400.0 }
}

#[test]
fn mission_runs_out_mines_returns_and_sells() {
    let mut engine = SimEngine::build_test(config()).unwrap();
    let fleet = dispatch(&engine, 100.0, 100.0, &[per_second(OreType::Nickel, 1.0)]);

    let events = engine.run_ticks(8);

    assert_eq!(
        events,
        vec![
            SimEvent::MissionArrived { mission_id: fleet.mission, player_id: fleet.owner },
            SimEvent::MissionStatusChanged {
                mission_id: fleet.mission,
                player_id:  fleet.owner,
                vehicle_id: fleet.vehicle,
                old_status: MissionStatus::TransitOut,
                new_status: MissionStatus::Mining,
            },
            SimEvent::MissionMiningComplete { mission_id: fleet.mission, player_id: fleet.owner },
            SimEvent::MissionStatusChanged {
                mission_id: fleet.mission,
                player_id:  fleet.owner,
                vehicle_id: fleet.vehicle,
                old_status: MissionStatus::Mining,
                new_status: MissionStatus::TransitBack,
            },
            SimEvent::MissionCompleted {
                mission_id:  fleet.mission,
                player_id:   fleet.owner,
                vehicle_id:  fleet.vehicle,
                cargo_value: Some(30.0 * 4_200.0),
            },
            SimEvent::MissionStatusChanged {
                mission_id: fleet.mission,
                player_id:  fleet.owner,
                vehicle_id: fleet.vehicle,
                old_status: MissionStatus::TransitBack,
                new_status: MissionStatus::Completed,
            },
        ]
    );

    let store = engine.store();
    let mission = store.mission(fleet.mission).unwrap().unwrap();
    assert_eq!(mission.status, MissionStatus::Completed);
    assert_eq!(mission.elapsed, 0.0);

    let vehicle = store.vehicle(fleet.vehicle).unwrap().unwrap();
    assert!(vehicle.is_stationed);
    assert_eq!(vehicle.station_id, None);
    assert!(vehicle.cargo.is_empty());
    // Four transit ticks of 10s at 1 fuel/s.
    assert_eq!(vehicle.fuel, 60.0);

    // The sale is reported, not paid out.
    assert_eq!(store.owner_balance(fleet.owner).unwrap(), Some(START_BALANCE));
}

#[test]
fn overshooting_transit_leaves_no_elapsed_on_completion() {
    let mut engine = SimEngine::build_test(config()).unwrap();
    let fleet = dispatch(&engine, 100.0, 100.0, &[per_second(OreType::Nickel, 1.0)]);
    // 25s legs on 10s ticks: each transit crosses its duration by 5s.
    engine
        .store()
        .execute_raw("UPDATE mission SET transit_time = 25.0")
        .unwrap();

    engine.run_ticks(20);

    let mission = engine.store().mission(fleet.mission).unwrap().unwrap();
    assert_eq!(mission.status, MissionStatus::Completed);
    assert_eq!(mission.elapsed, 0.0);
    assert!(mission.elapsed <= mission.transit_time);
}

#[test]
fn completed_mission_is_left_alone() {
    let mut engine = SimEngine::build_test(config()).unwrap();
    let fleet = dispatch(&engine, 100.0, 100.0, &[per_second(OreType::Nickel, 1.0)]);

    engine.run_ticks(7);
    let before = engine.store().mission(fleet.mission).unwrap();
    let vehicle_before = engine.store().vehicle(fleet.vehicle).unwrap();

    let events = engine.run_ticks(5);
    assert!(events.is_empty());
    assert_eq!(engine.store().mission(fleet.mission).unwrap(), before);
    assert_eq!(engine.store().vehicle(fleet.vehicle).unwrap(), vehicle_before);
}

#[test]
fn derelict_vehicle_pauses_its_mission() {
    let mut engine = SimEngine::build_test(config()).unwrap();
    let fleet = dispatch(&engine, 100.0, 100.0, &[per_second(OreType::Nickel, 1.0)]);

    engine.run_ticks(1);
    engine.store().set_vehicle_derelict(fleet.vehicle, true).unwrap();
    assert!(engine.run_ticks(3).is_empty());

    let mission = engine.store().mission(fleet.mission).unwrap().unwrap();
    assert_eq!(mission.status, MissionStatus::TransitOut);
    assert_eq!(mission.elapsed, 10.0);
    assert_eq!(engine.store().vehicle(fleet.vehicle).unwrap().unwrap().fuel, 90.0);

    // Repaired: picks up where it stopped.
    engine.store().set_vehicle_derelict(fleet.vehicle, false).unwrap();
    let events = engine.run_ticks(1);
    assert!(matches!(events[0], SimEvent::MissionArrived { .. }));
}

#[test]
fn aborted_mission_is_never_advanced() {
    let mut engine = SimEngine::build_test(config()).unwrap();
    let fleet = dispatch(&engine, 100.0, 100.0, &[per_second(OreType::Nickel, 1.0)]);
    engine.store().set_mission_status(fleet.mission, MissionStatus::Aborted).unwrap();

    assert!(engine.run_ticks(10).is_empty());
    let mission = engine.store().mission(fleet.mission).unwrap().unwrap();
    assert_eq!(mission.status, MissionStatus::Aborted);
    assert_eq!(mission.elapsed, 0.0);
}

#[test]
fn mining_fills_in_yield_order_and_stops_at_capacity() {
    let mut engine = SimEngine::build_test(config()).unwrap();
    let fleet = dispatch(
        &engine,
        25.0,
        100.0,
        &[per_second(OreType::Iron, 2.0), per_second(OreType::Nickel, 1.0)],
    );

    // Two transit ticks, then one mining tick.
    engine.run_ticks(3);
    let cargo = engine.store().vehicle(fleet.vehicle).unwrap().unwrap().cargo;
    assert_eq!(cargo, BTreeMap::from([(OreType::Iron, 20.0), (OreType::Nickel, 5.0)]));

    // Full hold: further mining adds nothing.
    engine.run_ticks(2);
    let vehicle = engine.store().vehicle(fleet.vehicle).unwrap().unwrap();
    assert_eq!(vehicle.cargo_tonnes(), 25.0);
    assert_eq!(vehicle.cargo, cargo);
}

#[test]
fn fuel_never_goes_negative() {
    let mut engine = SimEngine::build_test(config()).unwrap();
    let fleet = dispatch(&engine, 100.0, 15.0, &[per_second(OreType::Nickel, 1.0)]);

    engine.run_ticks(1);
    assert_eq!(engine.store().vehicle(fleet.vehicle).unwrap().unwrap().fuel, 5.0);
    // Out of fuel, the mission still arrives.
    let events = engine.run_ticks(1);
    assert_eq!(engine.store().vehicle(fleet.vehicle).unwrap().unwrap().fuel, 0.0);
    assert!(matches!(events[0], SimEvent::MissionArrived { .. }));
}

#[test]
fn untracked_ore_sells_at_the_fallback_price() {
    let config = SimConfig {
        market: MarketConfig {
            volatility: 0.0,
            base_prices: BTreeMap::from([(OreType::Nickel, 4_200.0)]),
            ..MarketConfig::default()
        },
        ..config()
    };
    let mut engine = SimEngine::build_test(config).unwrap();
    let fleet = dispatch(&engine, 100.0, 100.0, &[per_second(OreType::Cobalt, 1.0)]);

    let events = engine.run_ticks(7);
    assert!(events.contains(&SimEvent::MissionCompleted {
        mission_id:  fleet.mission,
        player_id:   fleet.owner,
        vehicle_id:  fleet.vehicle,
        cargo_value: Some(30.0 * 1_000.0),
    }));
    assert_eq!(engine.store().owner_balance(fleet.owner).unwrap(), Some(START_BALANCE));
}

#[test]
fn empty_hold_completes_without_a_cargo_value() {
    let mut engine = SimEngine::build_test(config()).unwrap();
    let fleet = dispatch(&engine, 100.0, 100.0, &[]);

    let events = engine.run_ticks(7);
    let completed = events
        .iter()
        .find(|e| matches!(e, SimEvent::MissionCompleted { .. }))
        .expect("mission completes");
    assert_eq!(
        *completed,
        SimEvent::MissionCompleted {
            mission_id:  fleet.mission,
            player_id:   fleet.owner,
            vehicle_id:  fleet.vehicle,
            cargo_value: None,
        }
    );
    assert_eq!(engine.store().owner_balance(fleet.owner).unwrap(), Some(START_BALANCE));
}
