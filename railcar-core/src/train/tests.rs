use super::*;
use crate::car::{Car, CarBuilder, CarGeometry, CarPersistedState, HotBoxFault, TractionKind};
use crate::coupler::CouplerSolveCoeffs;
use crate::environment::{CarControls, SuperelevationTable, TrackSnapshot};
use crate::imports::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn car(traction: TractionKind, mass_tonnes: f64) -> Car {
    let params = CarBuilder {
        traction: Some(traction),
        ..CarBuilder::new(mass_tonnes * uc::TONNE, CarGeometry::default())
    }
    .build()
    .unwrap();
    Car::new(params, uc::celsius(15.0), Some(1))
}

fn test_train(n_wagons: usize) -> Train {
    let mut cars = vec![car(TractionKind::Diesel, 120.0)];
    cars.extend((0..n_wagons).map(|_| car(TractionKind::Unpowered, 40.0)));
    Train::new(cars, SuperelevationTable::default())
}

fn links(train: &Train) -> Vec<(Option<usize>, Option<usize>)> {
    train
        .cars()
        .iter()
        .map(|car| (car.car_ahead, car.car_behind))
        .collect()
}

#[test]
fn test_neighbours_on_new() {
    let train = test_train(2);
    assert_eq!(
        links(&train),
        vec![(None, Some(1)), (Some(0), Some(2)), (Some(1), None)]
    );
    assert!(train.cars()[0].role.is_lead);
    assert!(train.cars()[1].role.coupled_to_lead);
    assert!(!train.cars()[2].role.coupled_to_lead);
}

#[test]
fn test_couple_and_uncouple() {
    let mut train = test_train(1);
    train.couple(test_train(1));
    assert_eq!(train.len(), 4);
    assert_eq!(links(&train)[1], (Some(0), Some(2)));
    // second locomotive is now trailing
    assert!(!train.cars()[2].role.is_lead);

    let rear = train.uncouple(2).unwrap();
    assert_eq!(train.len(), 2);
    assert_eq!(rear.len(), 2);
    assert_eq!(links(&train), vec![(None, Some(1)), (Some(0), None)]);
    assert_eq!(links(&rear), vec![(None, Some(1)), (Some(0), None)]);
    assert!(rear.cars()[0].role.is_lead);
}

#[test]
fn test_uncouple_rejects_bad_index() {
    let mut train = test_train(2);
    for idx in [0, 3, 10] {
        let err = train.uncouple(idx).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::CompositionError(_))
        ));
    }
    assert_eq!(train.len(), 3);
}

#[test]
fn test_reverse() {
    let mut train = test_train(2);
    train.set_speed(&[5.0 * uc::MPS; 3]).unwrap();
    train.car_mut(0).unwrap().coupler.slack = 0.005 * uc::M;
    train.car_mut(1).unwrap().coupler.slack = -0.002 * uc::M;
    train.reverse();

    assert_eq!(
        links(&train),
        vec![(None, Some(1)), (Some(0), Some(2)), (Some(1), None)]
    );
    assert_eq!(train.cars()[2].params.traction, TractionKind::Diesel);
    assert!(train.cars().iter().all(|car| car.flipped));
    assert!(train.cars().iter().all(|car| car.speed() == -5.0 * uc::MPS));
    // link between old cars 1 and 2 is now owned by new car 0
    assert_eq!(train.cars()[0].coupler.slack, -0.002 * uc::M);
    assert_eq!(train.cars()[1].coupler.slack, 0.005 * uc::M);
    assert_eq!(train.cars()[2].coupler.slack, si::Length::ZERO);
    // only locomotive keeps the lead role wherever it sits
    assert!(train.cars()[2].role.is_lead);
    assert!(train.cars()[1].role.coupled_to_lead);

    train.reverse();
    assert!(train.cars().iter().all(|car| !car.flipped));
    assert_eq!(train.cars()[0].coupler.slack, 0.005 * uc::M);
}

#[test]
fn test_step_requires_matching_inputs() {
    let mut train = test_train(2);
    let res = train.step(
        0.1 * uc::S,
        &[TrackSnapshot::default(); 2],
        &[CarControls::default(); 3],
    );
    assert!(res.is_err());
    assert!(train.set_speed(&[si::Velocity::ZERO; 2]).is_err());
    assert!(train
        .set_resolved_coupler_forces(&[si::Force::ZERO; 4])
        .is_err());
    assert!(train.restore_state(&[]).is_err());
}

#[test]
fn test_step_rejects_invalid_track() {
    let mut train = test_train(1);
    train.set_speed(&[10.0 * uc::MPS; 2]).unwrap();
    for bad in [
        TrackSnapshot {
            curve_radius: -300.0 * uc::M,
            ..Default::default()
        },
        TrackSnapshot {
            rail_adhesion: 1.5 * uc::R,
            ..Default::default()
        },
    ] {
        let err = train
            .step(
                0.1 * uc::S,
                &[TrackSnapshot::default(), bad],
                &[CarControls::default(); 2],
            )
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::ValidationError(_))
        ));
    }
    // nothing was stepped
    assert!(train.cars().iter().all(|car| car.history.is_empty()));
}

#[test]
fn test_coupler_force_handoff() {
    let mut train = test_train(2);
    train.set_speed(&[10.0 * uc::MPS; 3]).unwrap();
    train
        .step(
            0.1 * uc::S,
            &[TrackSnapshot::default(); 3],
            &[CarControls::default(); 3],
        )
        .unwrap();

    let coeffs = train.coupler_solve_coeffs();
    assert_eq!(coeffs.len(), 3);
    let m_loco = (120.0 * uc::TONNE).get::<si::kilogram>();
    let m_wagon = (40.0 * uc::TONNE).get::<si::kilogram>();
    assert!(almost_eq(coeffs[0].a, -1.0 / m_loco, None));
    assert!(almost_eq(coeffs[0].b, 1.0 / m_loco + 1.0 / m_wagon, None));
    assert!(almost_eq(coeffs[1].c, -1.0 / m_wagon, None));
    assert_eq!(coeffs[2], CouplerSolveCoeffs::default());

    train
        .set_resolved_coupler_forces(&[5.0 * uc::KN, 2.0 * uc::KN, 1.0 * uc::KN])
        .unwrap();
    assert_eq!(train.cars()[0].coupler.force, 5.0 * uc::KN);
    assert_eq!(train.cars()[1].coupler.force, 2.0 * uc::KN);
    // no coupler behind the last car
    assert_eq!(train.cars()[2].coupler.force, si::Force::ZERO);
    assert!(train.cars().iter().all(|car| car.history.len() == 1));
}

#[test]
fn test_hot_box_replay_is_deterministic() {
    let run = |seed: u64| {
        let mut train = test_train(1);
        let mut rng = StdRng::seed_from_u64(seed);
        train.car_mut(1).unwrap().hot_box = Some(HotBoxFault::random(&mut rng, 60.0 * uc::S));
        train.set_speed(&[20.0 * uc::MPS; 2]).unwrap();
        for _ in 0..600 {
            train
                .step(
                    1.0 * uc::S,
                    &[TrackSnapshot::default(); 2],
                    &[CarControls::default(); 2],
                )
                .unwrap();
        }
        train.persisted_state()
    };
    let first = run(7);
    assert_eq!(first, run(7));
    assert!(first[1].bearing_temp > first[0].bearing_temp);
}

#[test]
fn test_persisted_state_round_trip() {
    let mut train = test_train(1);
    train.set_speed(&[15.0 * uc::MPS; 2]).unwrap();
    for _ in 0..5 {
        train
            .step(
                1.0 * uc::S,
                &[TrackSnapshot::default(); 2],
                &[CarControls::default(); 2],
            )
            .unwrap();
    }
    let persisted = train.persisted_state();
    let yaml = persisted.to_yaml().unwrap();
    let de = Vec::<CarPersistedState>::from_yaml(yaml, false).unwrap();

    let mut fresh = test_train(1);
    fresh.restore_state(&de).unwrap();
    assert_eq!(fresh.persisted_state(), persisted);
}

#[test]
fn test_train_yaml_init_recomposes() {
    let train = test_train(2);
    let yaml = train.to_yaml().unwrap();
    let de = Train::from_yaml(yaml, false).unwrap();
    assert_eq!(links(&de), links(&train));
    assert_eq!(de, train);
}
