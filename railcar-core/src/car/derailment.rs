//! Flange-climb derailment risk from the quasi-static lateral/vertical wheel
//! force ratio and the Nadal criterion.

use super::car_params::CarParams;
use crate::coupler::{CouplerAngles, CouplerState};
use crate::imports::*;

/// Dynamic correction on the static L/V ratio with the coupler in buff
pub const BUFF_DYNAMIC_FACTOR: f64 = 1.77;
/// Dynamic correction on the static L/V ratio with the coupler in draft
pub const DRAFT_DYNAMIC_FACTOR: f64 = 1.34;
/// Below this speed (m/s) the derailment state resets
pub const RESET_SPEED: f64 = 0.01;
/// Floor on the wheelset angle of attack, rad
const MIN_ANGLE_OF_ATTACK: f64 = 1e-4;
/// Floor on the vertical wheel force, N
const MIN_VERTICAL_FORCE: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
/// Per-tick inputs to [DerailmentState::update]
pub struct DerailmentInputs {
    pub speed: si::Velocity,
    pub mass: si::Mass,
    /// Zero on straight track
    pub curve_radius: si::Length,
    pub superelevation_angle: si::Angle,
    /// Coupler acting on the car's leading end
    pub neighbour_coupler: CouplerState,
    /// Angles of that coupler
    pub coupler_angles: CouplerAngles,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize, SerdeAPI)]
pub struct DerailmentState {
    /// Dynamic lateral/vertical force ratio
    pub coefficient: f64,
    pub nadal_limit: f64,
    pub possible: bool,
    pub expected: bool,
    /// Time `possible` has held
    pub elapsed: si::Time,
    /// Time needed to climb the flange at the current speed
    pub climb_time: si::Time,
}

/// Distance travelled while the flange climbs the rail head
pub fn climb_distance(params: &CarParams, curve_radius: si::Length) -> si::Length {
    let radius = curve_radius.si();
    let aoa = if radius > 0.0 {
        (2.0 * params.geometry.rigid_wheelbase.si() / radius)
            .clamp(-1.0, 1.0)
            .asin()
    } else {
        0.0
    }
    .max(MIN_ANGLE_OF_ATTACK);
    let beta = params.flange.angle.si();
    params.flange.length * beta.cos() / aoa.tan()
}

/// Static and dynamic lateral/vertical ratio as `(static, dynamic)`
pub fn derailment_coefficient(params: &CarParams, inputs: &DerailmentInputs) -> (f64, f64) {
    let g = uc::ACC_GRAV.get::<si::meter_per_second_squared>();
    let mass = inputs.mass.si();
    let v = inputs.speed.si();
    let radius = inputs.curve_radius.si();
    let centripetal = if radius > 0.0 { v * v / radius } else { 0.0 };
    let lateral_acc = centripetal - g * inputs.superelevation_angle.si().sin();

    let n_wheels = params.wheel_count.max(1) as f64;
    let n_axles = params.axle_count.max(1) as f64;
    let n_bogies = params.bogie_count.max(1) as f64;
    let h_over_gauge = (params.cg_height / params.gauge).get::<si::ratio>();

    let vertical = (mass / n_wheels * g + mass / n_axles * lateral_acc * h_over_gauge)
        .max(MIN_VERTICAL_FORCE);

    let in_buff = inputs.neighbour_coupler.in_buff();
    let angle = if in_buff {
        inputs.coupler_angles.buff
    } else {
        inputs.coupler_angles.tension
    };
    let coupler_force = inputs.neighbour_coupler.force.si();
    let coupler_lateral = (coupler_force * angle.si().sin()).abs() / n_bogies;
    // signed: superelevation beyond balance unloads the flange
    let lateral = coupler_lateral + mass / n_axles * lateral_acc;

    let static_ratio = lateral / vertical;
    let factor = if in_buff {
        BUFF_DYNAMIC_FACTOR
    } else {
        DRAFT_DYNAMIC_FACTOR
    };
    (static_ratio, static_ratio * factor)
}

impl DerailmentState {
    /// Evaluates the coefficient and advances the `possible` → `expected`
    /// state machine by `dt`
    pub fn update(&mut self, params: &CarParams, inputs: &DerailmentInputs, dt: si::Time) {
        let speed = inputs.speed.si().abs();
        let (_, coefficient) = derailment_coefficient(params, inputs);
        self.coefficient = coefficient;
        self.nadal_limit = params.flange.nadal_limit();

        if speed < RESET_SPEED {
            self.possible = false;
            self.expected = false;
            self.elapsed = si::Time::ZERO;
            self.climb_time = si::Time::ZERO;
            return;
        }
        if self.expected {
            return;
        }

        self.climb_time = climb_distance(params, inputs.curve_radius) / (speed * uc::MPS);
        if self.coefficient > self.nadal_limit {
            self.possible = true;
            self.elapsed += dt;
            if self.elapsed >= self.climb_time {
                self.expected = true;
                #[cfg(feature = "logging")]
                log::warn!(
                    "derailment expected: L/V {:.3} above Nadal limit {:.3} for {:.2} s",
                    self.coefficient,
                    self.nadal_limit,
                    self.elapsed.get::<si::second>()
                );
            }
        } else {
            self.possible = false;
            self.elapsed = si::Time::ZERO;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::car::car_params::CarBuilder;
    use crate::car::CarGeometry;

    fn params() -> CarParams {
        CarBuilder::new(80.0 * uc::TONNE, CarGeometry::default())
            .build()
            .unwrap()
    }

    fn inputs(speed: f64, radius: f64) -> DerailmentInputs {
        DerailmentInputs {
            speed: speed * uc::MPS,
            mass: 80.0 * uc::TONNE,
            curve_radius: radius * uc::M,
            superelevation_angle: si::Angle::ZERO,
            neighbour_coupler: CouplerState::default(),
            coupler_angles: CouplerAngles::default(),
        }
    }

    #[test]
    fn test_coefficient_monotone_in_curvature() {
        let params = params();
        let mut prev = 0.0;
        let mut radius = 5_000.0;
        while radius >= 20.0 {
            let (_, coeff) = derailment_coefficient(&params, &inputs(20.0, radius));
            assert!(coeff >= prev, "{}", format_dbg!((radius, prev, coeff)));
            prev = coeff;
            radius *= 0.9;
        }
        assert!(prev > 0.0);
    }

    #[test]
    fn test_coefficient_monotone_in_curvature_with_superelevation() {
        let params = params();
        let theta = (0.0889f64 / 1.435).asin() * uc::RAD;
        let mut prev = f64::NEG_INFINITY;
        let mut radius = 5_000.0;
        while radius >= 20.0 {
            let (_, coeff) = derailment_coefficient(
                &params,
                &DerailmentInputs {
                    superelevation_angle: theta,
                    ..inputs(10.0, radius)
                },
            );
            assert!(coeff >= prev, "{}", format_dbg!((radius, prev, coeff)));
            prev = coeff;
            radius *= 0.9;
        }
        assert!(prev > 0.0);
    }

    #[test]
    fn test_straight_track() {
        let params = params();
        let (stat, dynamic) = derailment_coefficient(&params, &inputs(20.0, 0.0));
        assert_eq!(stat, 0.0);
        assert_eq!(dynamic, 0.0);

        // only the coupler contributes on straight track
        let mut loaded = inputs(20.0, 0.0);
        loaded.neighbour_coupler.force = -1e5 * uc::N;
        loaded.coupler_angles.tension = 0.05 * uc::RAD;
        let (stat, dynamic) = derailment_coefficient(&params, &loaded);
        let vertical = 80_000.0 / 8.0 * 9.80665;
        let lateral = 1e5 * 0.05f64.sin() / 2.0;
        assert!(almost_eq(stat, lateral / vertical, None));
        assert!(almost_eq(dynamic, stat * DRAFT_DYNAMIC_FACTOR, None));
    }

    #[test]
    fn test_buff_uses_buff_angle_and_factor() {
        let params = params();
        let mut buff = inputs(20.0, 0.0);
        buff.neighbour_coupler.force = 1e5 * uc::N;
        buff.neighbour_coupler.slack = -0.01 * uc::M;
        buff.coupler_angles.tension = 0.01 * uc::RAD;
        buff.coupler_angles.buff = 0.05 * uc::RAD;
        let (stat, dynamic) = derailment_coefficient(&params, &buff);
        let vertical = 80_000.0 / 8.0 * 9.80665;
        assert!(almost_eq(stat, 1e5 * 0.05f64.sin() / 2.0 / vertical, None));
        assert!(almost_eq(dynamic, stat * BUFF_DYNAMIC_FACTOR, None));
    }

    #[test]
    fn test_state_machine() {
        let params = params();
        let dt = 1e-4 * uc::S;
        let mut state = DerailmentState::default();
        // far above the overturning speed of a 40 m curve
        let severe = inputs(40.0, 40.0);
        state.update(&params, &severe, dt);
        assert!(state.coefficient > state.nadal_limit);
        assert!(state.possible);
        assert!(!state.expected);
        let climb_time = state.climb_time;
        assert!(climb_time > si::Time::ZERO);

        let mut ticks = 1;
        while !state.expected {
            state.update(&params, &severe, dt);
            ticks += 1;
            assert!(ticks < 100_000);
        }
        assert!(state.elapsed >= climb_time);

        // expected latches even once the coefficient drops
        state.update(&params, &inputs(10.0, 0.0), dt);
        assert!(state.expected);
        assert!(state.possible);

        // reset at standstill
        state.update(&params, &inputs(0.005, 0.0), dt);
        assert!(!state.possible);
        assert!(!state.expected);
        assert_eq!(state.elapsed, si::Time::ZERO);
    }

    #[test]
    fn test_possible_clears_before_expected() {
        let params = params();
        let dt = 0.001 * uc::S;
        let mut state = DerailmentState::default();
        state.update(&params, &inputs(40.0, 40.0), dt);
        assert!(state.possible);
        assert!(!state.expected);
        state.update(&params, &inputs(10.0, 2_000.0), dt);
        assert!(!state.possible);
        assert_eq!(state.elapsed, si::Time::ZERO);
    }
}
