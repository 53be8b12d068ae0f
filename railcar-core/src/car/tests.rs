use super::*;
use crate::environment::{CarControls, SuperelevationTable, TrackSnapshot};

fn davis_2400() -> DavisCoeffs {
    DavisCoeffs {
        a: 2000.0 * uc::N,
        b: 10.0 * uc::KGPS,
        c: 0.5 * uc::KGPM,
    }
}

fn test_car() -> Car {
    let params = CarBuilder {
        davis_empty: Some(davis_2400()),
        low_speed: Some(LowSpeedModel::DavisOnly),
        mass_freight_max: Some(60.0 * uc::TONNE),
        ..CarBuilder::new(20.0 * uc::TONNE, CarGeometry::default())
    }
    .build()
    .unwrap();
    Car::new(params, uc::celsius(30.0), Some(1))
}

fn warm_track() -> TrackSnapshot {
    TrackSnapshot {
        temp_ambient: uc::celsius(30.0),
        ..Default::default()
    }
}

#[test]
fn test_davis_scenario_through_step() {
    let mut car = test_car();
    car.set_speed(20.0 * uc::MPS);
    car.step(
        1.0 * uc::S,
        &warm_track(),
        &CarControls::default(),
        None,
        None,
        &SuperelevationTable::default(),
    )
    .unwrap();
    assert!(almost_eq(car.state.res_running.get::<si::newton>(), 2400.0, Some(1e-9)));
    assert!(almost_eq(car.state.force_total.get::<si::newton>(), -2400.0, Some(1e-9)));
    assert_eq!(car.state.res_curve, si::Force::ZERO);
    assert!(!car.state.skid);
    assert_eq!(car.state.i, 2);
    assert_eq!(car.history.len(), 1);
    // a lone car has no coupler terms
    assert_eq!(car.state.coupler_coeffs, crate::coupler::CouplerSolveCoeffs::default());
}

#[test]
fn test_step_rejects_zero_dt() {
    let mut car = test_car();
    let err = car
        .step(
            si::Time::ZERO,
            &warm_track(),
            &CarControls::default(),
            None,
            None,
            &SuperelevationTable::default(),
        )
        .unwrap_err();
    assert!(format!("{err:?}").contains("time step: 1"));
    assert_eq!(car.state.i, 1);
    assert!(car.history.is_empty());
}

#[test]
fn test_superelevation_from_table() {
    let mut car = test_car();
    car.set_speed(10.0 * uc::MPS);
    let track = TrackSnapshot {
        curve_radius: 300.0 * uc::M,
        ..warm_track()
    };
    car.step(
        0.1 * uc::S,
        &track,
        &CarControls::default(),
        None,
        None,
        &SuperelevationTable::default(),
    )
    .unwrap();
    assert!(almost_eq(car.state.superelevation.get::<si::meter>(), 0.0889, None));
    assert!(car.state.res_curve > si::Force::ZERO);
    assert!(car.state.max_safe_curve_speed > si::Velocity::ZERO);

    let track = TrackSnapshot {
        superelevation: Some(0.02 * uc::M),
        ..track
    };
    car.step(
        0.1 * uc::S,
        &track,
        &CarControls::default(),
        None,
        None,
        &SuperelevationTable::default(),
    )
    .unwrap();
    assert_eq!(car.state.superelevation, 0.02 * uc::M);
}

#[test]
fn test_max_safe_curve_speed_flag() {
    let params = CarBuilder::new(80.0 * uc::TONNE, CarGeometry::default())
        .build()
        .unwrap();
    let mut car = Car::new(params, uc::celsius(15.0), Some(1));
    let track = TrackSnapshot {
        curve_radius: 300.0 * uc::M,
        superelevation: Some(0.0889 * uc::M),
        ..Default::default()
    };
    let step_at = |car: &mut Car, speed: f64| {
        car.set_speed(speed * uc::MPS);
        car.step(
            0.1 * uc::S,
            &track,
            &CarControls::default(),
            None,
            None,
            &SuperelevationTable::default(),
        )
        .unwrap();
        car.state.max_safe_curve_speed_reached
    };
    let equal_load = (0.0889f64 * 9.80665 * 300.0 / 1.435).sqrt();

    assert!(!step_at(&mut car, 13.0));
    assert!(step_at(&mut car, 15.0));
    assert!(almost_eq(
        car.state.max_safe_curve_speed.get::<si::meter_per_second>(),
        equal_load,
        None
    ));
    // within tolerance of the threshold the flag holds
    assert!(step_at(&mut car, equal_load - 0.2));
    assert!(!step_at(&mut car, equal_load - 0.6));
}

#[test]
fn test_traction_sets_direction_at_standstill() {
    let mut car = test_car();
    let controls = CarControls {
        traction_force: 50.0 * uc::KN,
        ..Default::default()
    };
    car.step(
        0.1 * uc::S,
        &warm_track(),
        &controls,
        None,
        None,
        &SuperelevationTable::default(),
    )
    .unwrap();
    assert!(car.state.force_total > si::Force::ZERO);
    assert!(car.state.force_total < controls.traction_force);

    // no traction and no motion: only signed wind drag remains
    car.step(
        0.1 * uc::S,
        &warm_track(),
        &CarControls::default(),
        None,
        None,
        &SuperelevationTable::default(),
    )
    .unwrap();
    assert_eq!(car.state.force_total, si::Force::ZERO);
    assert!(car.state.res_running > si::Force::ZERO);
}

#[test]
fn test_coupled_pair() {
    let mut lead = test_car();
    let mut trail = test_car();
    lead.set_speed(10.0 * uc::MPS);
    trail.set_speed(9.0 * uc::MPS);
    let track = warm_track();
    let lead_snap = lead.neighbour_snapshot(&track);
    let trail_snap = trail.neighbour_snapshot(&track);
    let table = SuperelevationTable::default();
    lead.step(
        0.01 * uc::S,
        &track,
        &CarControls::default(),
        None,
        Some(&trail_snap),
        &table,
    )
    .unwrap();
    trail
        .step(
            0.01 * uc::S,
            &track,
            &CarControls::default(),
            Some(&lead_snap),
            None,
            &table,
        )
        .unwrap();

    // lead pulls away, slack opens in tension
    assert!(almost_eq(lead.coupler.slack.get::<si::meter>(), 0.01, Some(1e-9)));
    let coeffs = lead.state.coupler_coeffs;
    let m = lead.mass().get::<si::kilogram>();
    assert!(almost_eq(coeffs.a, -1.0 / m, None));
    assert!(almost_eq(coeffs.b, 2.0 / m, None));
    assert!(almost_eq(coeffs.c, -1.0 / m, None));
    assert_eq!(trail.state.coupler_coeffs, Default::default());
}

#[test]
fn test_coupler_force_flags() {
    let mut car = test_car();
    let break_1 = car.rear_coupler().break_1;
    // impulse limit out of the way so only the proof load trips
    car.params.rear_coupler.break_2 = 2.0 * break_1;
    car.apply_coupler_force(0.8 * break_1);
    assert!(car.state.coupler_overloaded);
    assert!(!car.state.coupler_exceed_break);
    car.apply_coupler_force(1.1 * break_1);
    assert!(car.state.coupler_exceed_break);
    assert_eq!(car.coupler.force_prev, 0.8 * break_1);
}

#[test]
fn test_flipped_couplers() {
    let mut car = test_car();
    car.params.front_coupler.set_slack(0.02 * uc::M, 0.02 * uc::M).unwrap();
    let front = car.params.front_coupler;
    let rear = car.params.rear_coupler;
    assert_ne!(front, rear);
    assert_eq!(*car.front_coupler(), front);
    car.flipped = true;
    assert_eq!(*car.front_coupler(), rear);
    assert_eq!(*car.rear_coupler(), front);
}

#[test]
fn test_set_freight_mass() {
    let mut car = test_car();
    car.params.davis_loaded = DavisCoeffs {
        a: 4000.0 * uc::N,
        ..davis_2400()
    };
    car.set_freight_mass(30.0 * uc::TONNE).unwrap();
    assert!(almost_eq(car.davis.a.get::<si::newton>(), 3000.0, None));
    assert_eq!(car.mass(), 50.0 * uc::TONNE);
    assert!(car.set_freight_mass(61.0 * uc::TONNE).is_err());
    assert!(car.set_freight_mass(-1.0 * uc::KG).is_err());
    assert_eq!(car.mass_freight, 30.0 * uc::TONNE);
}

#[test]
fn test_trailing_locomotive_derating() {
    let mut car = test_car();
    car.params.traction = TractionKind::Diesel;
    car.role = TractionRole {
        is_lead: true,
        coupled_to_lead: false,
    };
    assert_eq!(car.davis_c_factor(), 1.0);
    car.role.is_lead = false;
    assert_eq!(car.davis_c_factor(), DEFAULT_TRAIL_LOCO_RESISTANCE_FACTOR);
}

fn stepped_state() -> CarPersistedState {
    let mut car = test_car();
    car.set_speed(25.0 * uc::MPS);
    car.set_freight_mass(10.0 * uc::TONNE).unwrap();
    for _ in 0..10 {
        car.step(
            1.0 * uc::S,
            &warm_track(),
            &CarControls::default(),
            None,
            None,
            &SuperelevationTable::default(),
        )
        .unwrap();
    }
    car.coupler.slack = -0.01 * uc::M;
    car.derailment.elapsed = 0.05 * uc::S;
    car.persisted_state()
}

#[test]
fn test_persisted_state_str_round_trip() {
    let persisted = stepped_state();
    assert!(persisted.bearing_rise_time > si::Time::ZERO);
    for format in CarPersistedState::ACCEPTED_STR_FORMATS {
        let s = persisted.to_str(format).unwrap();
        let de = CarPersistedState::from_str(s, format, false).unwrap();
        assert_eq!(de, persisted);
    }
    let bytes = persisted.to_bincode().unwrap();
    assert_eq!(CarPersistedState::from_bincode(&bytes).unwrap(), persisted);
}

#[test]
fn test_persisted_state_file_round_trip() {
    let persisted = stepped_state();
    let dir = tempfile::tempdir().unwrap();
    for ext in CarPersistedState::ACCEPTED_BYTE_FORMATS {
        let path = dir.path().join(format!("car_state.{ext}"));
        persisted.to_file(&path).unwrap();
        let de = CarPersistedState::from_file(&path, false).unwrap();
        assert_eq!(de, persisted);
    }
}

#[test]
fn test_restore_state() {
    let persisted = stepped_state();
    let mut car = test_car();
    car.restore_state(&persisted);
    assert_eq!(car.persisted_state(), persisted);
    assert_eq!(car.state.bearing_temp, persisted.bearing_temp);
}

#[test]
fn test_car_yaml_round_trip() {
    let car = test_car();
    let yaml = car.to_yaml().unwrap();
    let de = Car::from_yaml(yaml, false).unwrap();
    assert_eq!(de, car);
}
