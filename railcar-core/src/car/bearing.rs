//! Wheel bearing temperature.  The bearing warms toward a speed-dependent
//! ceiling while running, cools toward ambient when slow or stopped, and can
//! develop a hot-box fault that drives it toward [HOT_BOX_TEMP_DEG_C] after a
//! random amount of running time.

use crate::imports::*;
use rand::Rng;

/// Above this speed (m/s) the bearing heats
pub const HEATING_SPEED: f64 = 7.0;
/// Activity time accumulates above this speed (m/s)
pub const ACTIVITY_SPEED: f64 = 0.1;
const HEATING_K: f64 = 0.00022;
const COOLING_K: f64 = 0.0003;
const HEATING_CEILING_BASE_DEG_C: f64 = 55.0;
const HEATING_CEILING_PER_MPS: f64 = 0.25;
pub const HOT_BOX_TEMP_DEG_C: f64 = 120.0;
const HOT_BOX_K_PER_50_TONNES: f64 = 0.002;
const HOT_BOX_K_MIN: f64 = 0.0005;
const HOT_BOX_K_MAX: f64 = 0.01;
/// Bearing failure, latched until [BearingState::repair]
pub const FAILURE_TEMP_DEG_C: f64 = 115.0;
pub const HOT_WARNING_TEMP_DEG_C: f64 = 100.0;
pub const SMOKE_ON_TEMP_DEG_C: f64 = 90.0;
pub const SMOKE_OFF_TEMP_DEG_C: f64 = 50.0;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BearingMode {
    #[default]
    Declining,
    Rising,
    HotBox,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, SerdeAPI)]
/// Pending hot-box fault
pub struct HotBoxFault {
    /// Activity time after which the fault takes over
    pub onset_activity_time: si::Time,
}

impl HotBoxFault {
    /// Fault with onset drawn uniformly from `[0, max_onset)`
    pub fn random<R: Rng + ?Sized>(rng: &mut R, max_onset: si::Time) -> Self {
        let max = max_onset.get::<si::second>().max(f64::MIN_POSITIVE);
        Self {
            onset_activity_time: rng.gen_range(0.0..max) * uc::S,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, SerdeAPI)]
pub struct BearingState {
    pub temperature: si::ThermodynamicTemperature,
    pub mode: BearingMode,
    /// Time spent in the current rising or hot-box mode
    pub rise_time: si::Time,
    /// Time spent in the current declining mode
    pub decline_time: si::Time,
    /// Accumulated time moving, drives hot-box onset
    pub activity_time: si::Time,
    pub hot_warning: bool,
    pub failed: bool,
    pub smoke: bool,
}

impl BearingState {
    /// New bearing at ambient temperature
    pub fn new(temp_ambient: si::ThermodynamicTemperature) -> Self {
        Self {
            temperature: temp_ambient,
            mode: BearingMode::Declining,
            rise_time: si::Time::ZERO,
            decline_time: si::Time::ZERO,
            activity_time: si::Time::ZERO,
            hot_warning: false,
            failed: false,
            smoke: false,
        }
    }

    /// Clears a latched failure
    pub fn repair(&mut self) {
        self.failed = false;
    }

    /// Advances temperature by `dt`
    pub fn update(
        &mut self,
        dt: si::Time,
        speed: si::Velocity,
        temp_ambient: si::ThermodynamicTemperature,
        mass: si::Mass,
        hot_box: Option<&HotBoxFault>,
    ) {
        let dt_s = dt.get::<si::second>().max(0.0);
        let speed = speed.get::<si::meter_per_second>().abs();
        let moving = speed > ACTIVITY_SPEED;
        if moving {
            self.activity_time += dt;
        }

        let hot_box_active = moving
            && hot_box.map_or(false, |fault| self.activity_time >= fault.onset_activity_time);
        let (mode, target, k) = if hot_box_active {
            let k = (HOT_BOX_K_PER_50_TONNES * mass.get::<si::megagram>() / 50.0)
                .clamp(HOT_BOX_K_MIN, HOT_BOX_K_MAX);
            (BearingMode::HotBox, HOT_BOX_TEMP_DEG_C, k)
        } else if speed > HEATING_SPEED {
            (
                BearingMode::Rising,
                HEATING_CEILING_PER_MPS * speed + HEATING_CEILING_BASE_DEG_C,
                HEATING_K,
            )
        } else {
            (BearingMode::Declining, temp_ambient.celsius(), COOLING_K)
        };

        if mode != self.mode {
            self.rise_time = si::Time::ZERO;
            self.decline_time = si::Time::ZERO;
            #[cfg(feature = "logging")]
            if mode == BearingMode::HotBox {
                log::warn!("hot box developing, bearing at {:.1} °C", self.temperature.celsius());
            }
            self.mode = mode;
        }
        match mode {
            BearingMode::Declining => self.decline_time += dt,
            BearingMode::Rising | BearingMode::HotBox => self.rise_time += dt,
        }

        let temp = self.temperature.celsius();
        let temp_new = target - (target - temp) * (-k * dt_s).exp();
        self.temperature = uc::celsius(temp_new);
        self.update_warnings(temp_new);
    }

    fn update_warnings(&mut self, temp: f64) {
        if temp > FAILURE_TEMP_DEG_C {
            #[cfg(feature = "logging")]
            if !self.failed {
                log::warn!("bearing failed at {temp:.1} °C");
            }
            self.failed = true;
            self.hot_warning = false;
        } else if temp >= HOT_WARNING_TEMP_DEG_C {
            #[cfg(feature = "logging")]
            if !self.hot_warning {
                log::warn!("hot bearing at {temp:.1} °C");
            }
            self.hot_warning = true;
        } else {
            self.hot_warning = false;
        }
        if temp > SMOKE_ON_TEMP_DEG_C {
            self.smoke = true;
        } else if temp < SMOKE_OFF_TEMP_DEG_C {
            self.smoke = false;
        }
    }
}

impl Default for BearingState {
    fn default() -> Self {
        Self::new(uc::celsius(15.0))
    }
}
