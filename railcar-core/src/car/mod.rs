//! A single car: parameters, persistent model state and per-tick outputs.

pub mod bearing;
pub mod brakes;
pub mod car_dynamics;
pub mod car_params;
pub mod derailment;
pub mod resistance;
pub mod traction;

pub use bearing::{BearingMode, BearingState, HotBoxFault};
pub use brakes::BrakeState;
pub use car_dynamics::NeighbourSnapshot;
pub use car_params::*;
pub use derailment::DerailmentState;
pub use resistance::{CurveSpeedFlags, CurveSpeedLimits, LowSpeedModel, WindForces};
pub use traction::{TractionKind, TractionRole};

use crate::coupler::{CouplerAngles, CouplerParams, CouplerSolveCoeffs, CouplerState};
use crate::imports::*;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, HistoryVec)]
/// Outputs of one tick for one car
pub struct CarState {
    /// time step index
    pub i: usize,
    pub speed: si::Velocity,
    pub mass: si::Mass,
    /// Superelevation in use for the tick
    pub superelevation: si::Length,
    /// Running resistance magnitude
    pub res_running: si::Force,
    /// Curve resistance magnitude
    pub res_curve: si::Force,
    /// Tunnel resistance magnitude
    pub res_tunnel: si::Force,
    /// Resistance from cross-wind flange contact
    pub res_wind_lateral: si::Force,
    /// Signed wind drag change, positive opposing forward motion
    pub force_wind_drag: si::Force,
    pub force_wind_lateral: si::Force,
    pub force_brake: si::Force,
    pub force_traction: si::Force,
    /// Net longitudinal force before coupler forces.  At standstill the
    /// resistances are applied against the traction direction and the train
    /// integrator caps the result.
    pub force_total: si::Force,
    pub brake_friction_factor: f64,
    pub skid: bool,
    pub bearing_temp: si::ThermodynamicTemperature,
    pub bearing_hot_warning: bool,
    pub bearing_failed: bool,
    pub bearing_smoke: bool,
    pub hot_box: bool,
    pub derail_coeff: f64,
    pub derail_possible: bool,
    pub derail_expected: bool,
    pub max_safe_curve_speed: si::Velocity,
    pub max_safe_curve_speed_reached: bool,
    pub critical_curve_speed_reached: bool,
    pub coupler_force: si::Force,
    pub coupler_slack: si::Length,
    pub coupler_overloaded: bool,
    pub coupler_exceed_break: bool,
    /// Tension angle of the rear coupler
    pub coupler_angle: si::Angle,
    /// Buff angle of the rear coupler
    pub coupler_buff_angle: si::Angle,
    pub coupler_coeffs: CouplerSolveCoeffs,
}

impl Default for CarState {
    fn default() -> Self {
        Self {
            i: 1,
            speed: si::Velocity::ZERO,
            mass: si::Mass::ZERO,
            superelevation: si::Length::ZERO,
            res_running: si::Force::ZERO,
            res_curve: si::Force::ZERO,
            res_tunnel: si::Force::ZERO,
            res_wind_lateral: si::Force::ZERO,
            force_wind_drag: si::Force::ZERO,
            force_wind_lateral: si::Force::ZERO,
            force_brake: si::Force::ZERO,
            force_traction: si::Force::ZERO,
            force_total: si::Force::ZERO,
            brake_friction_factor: 1.0,
            skid: false,
            bearing_temp: uc::celsius(15.0),
            bearing_hot_warning: false,
            bearing_failed: false,
            bearing_smoke: false,
            hot_box: false,
            derail_coeff: 0.0,
            derail_possible: false,
            derail_expected: false,
            max_safe_curve_speed: si::Velocity::ZERO,
            max_safe_curve_speed_reached: false,
            critical_curve_speed_reached: false,
            coupler_force: si::Force::ZERO,
            coupler_slack: si::Length::ZERO,
            coupler_overloaded: false,
            coupler_exceed_break: false,
            coupler_angle: si::Angle::ZERO,
            coupler_buff_angle: si::Angle::ZERO,
            coupler_coeffs: CouplerSolveCoeffs::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, SerdeAPI)]
/// Fields of a car that survive a save and restore
pub struct CarPersistedState {
    pub bearing_temp: si::ThermodynamicTemperature,
    pub bearing_rise_time: si::Time,
    pub bearing_decline_time: si::Time,
    pub derail_elapsed: si::Time,
    pub coupler_slack: si::Length,
    pub davis: DavisCoeffs,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// One rolling-stock unit
pub struct Car {
    pub params: CarParams,
    /// Role within the current train, set on composition change
    #[serde(default)]
    pub role: TractionRole,
    /// Car runs reversed; front and rear couplers swap
    #[serde(default)]
    pub flipped: bool,
    /// Freight currently carried
    #[serde(default)]
    pub mass_freight: si::Mass,
    /// Current Davis coefficients, interpolated on load
    pub davis: DavisCoeffs,
    #[serde(default)]
    pub hot_box: Option<HotBoxFault>,
    pub bearing: BearingState,
    #[serde(default)]
    pub brakes: BrakeState,
    #[serde(default)]
    pub derailment: DerailmentState,
    #[serde(default)]
    pub curve_flags: CurveSpeedFlags,
    /// State of the coupler between this car and the car behind
    #[serde(default)]
    pub coupler: CouplerState,
    /// Angles of the coupler to the car behind
    #[serde(default)]
    pub rear_angles: CouplerAngles,
    /// Angles of the coupler to the car ahead
    #[serde(default)]
    pub front_angles: CouplerAngles,
    #[serde(default)]
    pub state: CarState,
    #[serde(default)]
    pub history: CarStateHistoryVec,
    pub save_interval: Option<usize>,
    /// Index of the car ahead within the train
    #[serde(skip)]
    pub car_ahead: Option<usize>,
    /// Index of the car behind within the train
    #[serde(skip)]
    pub car_behind: Option<usize>,
}

impl SerdeAPI for Car {
    fn init(&mut self) -> Result<(), Error> {
        self.params.validate()?;
        Ok(())
    }
}

impl Car {
    /// New car with its bearing at `temp_ambient`
    pub fn new(
        params: CarParams,
        temp_ambient: si::ThermodynamicTemperature,
        save_interval: Option<usize>,
    ) -> Self {
        let state = CarState {
            mass: params.mass_empty,
            bearing_temp: temp_ambient,
            ..Default::default()
        };
        Self {
            davis: params.davis_empty,
            params,
            role: TractionRole::default(),
            flipped: false,
            mass_freight: si::Mass::ZERO,
            hot_box: None,
            bearing: BearingState::new(temp_ambient),
            brakes: BrakeState::default(),
            derailment: DerailmentState::default(),
            curve_flags: CurveSpeedFlags::default(),
            coupler: CouplerState::default(),
            rear_angles: CouplerAngles::default(),
            front_angles: CouplerAngles::default(),
            state,
            history: CarStateHistoryVec::new(),
            save_interval,
            car_ahead: None,
            car_behind: None,
        }
    }

    /// Total mass including freight
    pub fn mass(&self) -> si::Mass {
        self.params.mass_empty + self.mass_freight
    }

    pub fn speed(&self) -> si::Velocity {
        self.state.speed
    }

    /// Sets speed as integrated by the train
    pub fn set_speed(&mut self, speed: si::Velocity) {
        self.state.speed = speed;
    }

    /// Coupler at the leading end, respecting orientation
    pub fn front_coupler(&self) -> &CouplerParams {
        if self.flipped {
            &self.params.rear_coupler
        } else {
            &self.params.front_coupler
        }
    }

    /// Coupler at the trailing end, respecting orientation
    pub fn rear_coupler(&self) -> &CouplerParams {
        if self.flipped {
            &self.params.front_coupler
        } else {
            &self.params.rear_coupler
        }
    }

    /// Sets carried freight and moves the Davis coefficients by load fraction
    pub fn set_freight_mass(&mut self, mass_freight: si::Mass) -> anyhow::Result<()> {
        ensure!(
            mass_freight >= si::Mass::ZERO && mass_freight <= self.params.mass_freight_max,
            "{}\nfreight mass must be within [0, mass_freight_max]",
            format_dbg!((mass_freight, self.params.mass_freight_max))
        );
        self.mass_freight = mass_freight;
        let frac = if self.params.mass_freight_max > si::Mass::ZERO {
            (mass_freight / self.params.mass_freight_max).get::<si::ratio>()
        } else {
            0.0
        };
        self.davis = self
            .params
            .davis_empty
            .lerp(&self.params.davis_loaded, frac);
        self.state.mass = self.mass();
        Ok(())
    }

    /// Sets the resolved coupler force on the coupler to the car behind
    pub fn apply_coupler_force(&mut self, force: si::Force) {
        let params = *self.rear_coupler();
        self.coupler.apply_force(&params, force);
        self.state.coupler_force = self.coupler.force;
        self.state.coupler_overloaded = self.coupler.overloaded;
        self.state.coupler_exceed_break = self.coupler.exceed_break;
    }

    pub fn persisted_state(&self) -> CarPersistedState {
        CarPersistedState {
            bearing_temp: self.bearing.temperature,
            bearing_rise_time: self.bearing.rise_time,
            bearing_decline_time: self.bearing.decline_time,
            derail_elapsed: self.derailment.elapsed,
            coupler_slack: self.coupler.slack,
            davis: self.davis,
        }
    }

    pub fn restore_state(&mut self, persisted: &CarPersistedState) {
        self.bearing.temperature = persisted.bearing_temp;
        self.bearing.rise_time = persisted.bearing_rise_time;
        self.bearing.decline_time = persisted.bearing_decline_time;
        self.derailment.elapsed = persisted.derail_elapsed;
        self.coupler.slack = persisted.coupler_slack;
        self.davis = persisted.davis;
        self.state.bearing_temp = persisted.bearing_temp;
        self.state.coupler_slack = persisted.coupler_slack;
    }

    /// Coefficient on the Davis C term for the current role
    pub fn davis_c_factor(&self) -> f64 {
        if self.role.derate_davis_c(self.params.traction) {
            self.params.trail_loco_resistance_factor
        } else {
            1.0
        }
    }

    pub fn set_save_interval(&mut self, save_interval: Option<usize>) {
        self.save_interval = save_interval;
    }

    /// Saves current state into history if `save_interval` is due
    pub fn save_state(&mut self) {
        if let Some(interval) = self.save_interval {
            if interval > 0 && self.state.i % interval == 0 {
                self.history.push(self.state);
            }
        }
    }
}

#[cfg(test)]
mod tests;
