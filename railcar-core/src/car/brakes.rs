//! Brake shoe friction and wheel skid

use super::car_params::BrakeParams;
use super::traction::TractionKind;
use crate::environment::CarControls;
use crate::imports::*;

/// Friction factor applied to the delivered force while the wheels skid
pub const SKID_FRICTION: f64 = 0.08;
/// Skid clears once tread force falls below this fraction of the adhesive limit
pub const SKID_EXIT_FRACTION: f64 = 0.75;
/// Zero-speed friction of the default empirical curve
const DEFAULT_FRICTION_BASELINE: f64 = 0.2;
const FRICTION_FACTOR_MIN: f64 = 0.01;
const FRICTION_FACTOR_MAX: f64 = 1.0;
/// Throttle below which a wheel slip is attributed to the brakes
const WHEEL_SLIP_THROTTLE_MAX: f64 = 0.01;
/// Minimum brake force for a wheel slip to count as a brake skid, N
const WHEEL_SLIP_BRAKE_FORCE_MIN: f64 = 25.0;

impl BrakeParams {
    /// Speed adjustment of the brake shoe friction relative to standstill,
    /// clamped to [0.01, 1]
    pub fn friction_factor(&self, speed: si::Velocity) -> f64 {
        let factor = match self
            .friction_curve
            .as_ref()
            .map(|curve| curve.normalized(speed))
        {
            Some(Ok(factor)) => factor,
            // curves are validated on load, fall back to the default on a bad one
            Some(Err(_)) | None => {
                let kph = speed.get::<si::kilometer_per_hour>().abs();
                (7.6 / (kph + 17.5) + 0.07) / DEFAULT_FRICTION_BASELINE
            }
        };
        if factor.is_finite() {
            factor.clamp(FRICTION_FACTOR_MIN, FRICTION_FACTOR_MAX)
        } else {
            FRICTION_FACTOR_MIN
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize, SerdeAPI)]
pub struct BrakeState {
    /// Delivered brake force
    pub force: si::Force,
    pub friction_factor: f64,
    pub skid: bool,
}

impl BrakeState {
    /// Updates the delivered brake force and skid flag from the brake command
    pub fn update(
        &mut self,
        params: &BrakeParams,
        traction: TractionKind,
        controls: &CarControls,
        speed: si::Velocity,
        mass: si::Mass,
        rail_adhesion: si::Ratio,
    ) -> (si::Force, bool) {
        let cmd = controls
            .brake_force_cmd
            .max(si::Force::ZERO)
            .min(params.force_max);
        let factor = params.friction_factor(speed);

        self.skid = if traction.uses_wheel_slip_flag() {
            controls.wheel_slip
                && controls.throttle.get::<si::ratio>() < WHEEL_SLIP_THROTTLE_MAX
                && cmd.get::<si::newton>() > WHEEL_SLIP_BRAKE_FORCE_MIN
        } else {
            let tread = cmd * factor;
            let limit = mass * uc::ACC_GRAV * rail_adhesion;
            if self.skid {
                tread >= SKID_EXIT_FRACTION * limit
            } else {
                tread >= limit && tread > si::Force::ZERO
            }
        };

        self.friction_factor = factor;
        self.force = cmd * if self.skid { SKID_FRICTION } else { factor };
        (self.force, self.skid)
    }
}
