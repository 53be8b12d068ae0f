//! Curve resistance and superelevation speed limits

use crate::imports::*;

/// Hysteresis below a curve speed threshold before its flag clears, mph
pub const CURVE_SPEED_HYSTERESIS_MPH: f64 = 1.0;
/// Multiplier on the relative deviation from equal-load speed
const CURVE_SPEED_FACTOR: f64 = 2.0;

/// Superelevation angle from superelevation height and gauge
pub fn superelevation_angle(superelevation: si::Length, gauge: si::Length) -> f64 {
    let ratio = (superelevation / gauge).get::<si::ratio>();
    if ratio.is_finite() {
        ratio.clamp(-1.0, 1.0).asin()
    } else {
        0.0
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize, SerdeAPI)]
/// Speed thresholds for the current curve
pub struct CurveSpeedLimits {
    /// Speed at which the wheel loads on both rails are equal
    pub equal_load: si::Velocity,
    /// Equal-load speed with the allowed unbalanced superelevation added
    pub max_safe: si::Velocity,
    /// Speed at which the car overturns; infinite when it cannot
    pub critical: si::Velocity,
}

impl CurveSpeedLimits {
    /// Thresholds on a curve of `curve_radius`; all zero on straight track
    pub fn new(
        curve_radius: si::Length,
        superelevation: si::Length,
        unbalanced_superelevation: si::Length,
        gauge: si::Length,
        cg_height: si::Length,
    ) -> Self {
        let radius = curve_radius.get::<si::meter>();
        if radius <= 0.0 {
            return Self::default();
        }
        let g = uc::ACC_GRAV.get::<si::meter_per_second_squared>();
        let gauge_m = gauge.get::<si::meter>();
        let e = superelevation.get::<si::meter>();
        let e_u = unbalanced_superelevation.get::<si::meter>();
        let equal_load = (e * g * radius / gauge_m).max(0.0).sqrt();
        let max_safe = ((e + e_u) * g * radius / gauge_m).max(0.0).sqrt();

        let g2h = gauge_m / (2.0 * cg_height.get::<si::meter>());
        let tan_theta = superelevation_angle(superelevation, gauge).tan();
        let denom = 1.0 - g2h * tan_theta;
        let critical = if denom > 0.0 {
            (g * radius * (g2h + tan_theta) / denom).max(0.0).sqrt()
        } else {
            f64::INFINITY
        };
        Self {
            equal_load: equal_load * uc::MPS,
            max_safe: max_safe * uc::MPS,
            critical: critical * uc::MPS,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, SerdeAPI)]
pub struct CurveSpeedFlags {
    pub max_safe_reached: bool,
    pub critical_reached: bool,
}

fn update_flag(flag: &mut bool, speed: f64, threshold: f64) -> bool {
    let hysteresis = CURVE_SPEED_HYSTERESIS_MPH * uc::MPH.value;
    let rising = !*flag && speed > threshold;
    if rising {
        *flag = true;
    } else if *flag && speed < threshold - hysteresis {
        *flag = false;
    }
    rising
}

impl CurveSpeedFlags {
    /// Sets each flag when `speed` exceeds its threshold and clears it once
    /// speed falls [CURVE_SPEED_HYSTERESIS_MPH] below.  Off the curve both flags clear.
    pub fn update(&mut self, speed: si::Velocity, limits: &CurveSpeedLimits, on_curve: bool) {
        if !on_curve {
            *self = Self::default();
            return;
        }
        let speed = speed.get::<si::meter_per_second>().abs();
        if update_flag(
            &mut self.max_safe_reached,
            speed,
            limits.max_safe.get::<si::meter_per_second>(),
        ) {
            #[cfg(feature = "logging")]
            log::warn!(
                "speed {:.1} m/s exceeds max safe curve speed {:.1} m/s",
                speed,
                limits.max_safe.get::<si::meter_per_second>()
            );
        }
        if update_flag(
            &mut self.critical_reached,
            speed,
            limits.critical.get::<si::meter_per_second>(),
        ) {
            #[cfg(feature = "logging")]
            log::warn!(
                "speed {:.1} m/s exceeds critical curve speed {:.1} m/s",
                speed,
                limits.critical.get::<si::meter_per_second>()
            );
        }
    }
}

/// Curve resistance magnitude, growing as speed departs from the equal-load speed
pub fn curve_resistance(
    mass: si::Mass,
    speed: si::Velocity,
    curve_radius: si::Length,
    gauge: si::Length,
    rigid_wheelbase: si::Length,
    equal_load_speed: si::Velocity,
) -> si::Force {
    let radius = curve_radius.get::<si::meter>();
    if radius <= 0.0 {
        return si::Force::ZERO;
    }
    let v = speed.get::<si::meter_per_second>().abs();
    let v_eq = equal_load_speed.get::<si::meter_per_second>();
    let speed_factor = if v_eq > utils::DIST_TOL {
        ((v_eq - v) / v_eq).abs() * CURVE_SPEED_FACTOR
    } else {
        CURVE_SPEED_FACTOR
    };
    let weight = (mass * uc::ACC_GRAV).get::<si::newton>();
    let coeff = 0.5 * (gauge + rigid_wheelbase).get::<si::meter>() / (2.0 * radius);
    weight * coeff * (1.0 + speed_factor) * uc::N
}
