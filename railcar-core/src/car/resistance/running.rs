//! Running resistance: the Davis polynomial above the low-speed window and
//! either a configured standstill friction or the bearing-type starting
//! friction table below it.

use crate::car::car_params::{BearingType, DavisCoeffs};
use crate::imports::*;

/// Starting friction is raised to at least this multiple of the Davis value
/// at zero speed
pub const STARTING_FRICTION_DAVIS_MARGIN: f64 = 1.2;
/// Upper end of the starting friction window; the low-speed value decays to
/// the Davis value here
pub const STARTING_FRICTION_SPEED_MPH: f64 = 5.0;
/// Floor on the merge speed, m/s
pub const MIN_MERGE_SPEED: f64 = 0.01;
/// Temperature factor applied while the bearing has failed
pub const FAILED_BEARING_TEMP_FACTOR: f64 = 2.0;
const TEMP_FACTOR_COLD: f64 = 1.5;
const TEMP_COLD_DEG_C: f64 = -10.0;
const TEMP_WARM_DEG_C: f64 = 25.0;
/// Track deflection resistance numerator, lbf per long ton
const DEFLECTION_LBF_PER_LONG_TON: f64 = 1120.0;
/// Axle loads (tonnes) and gradient equivalents used for track deflection
const DEFLECTION_AXLE_LOAD_TONNES: [f64; 2] = [10.0, 30.0];
const DEFLECTION_GRADIENT_EQUIV: [f64; 2] = [800.0, 300.0];

#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize, SerdeAPI)]
/// Resistance model used below the merge speed
pub enum LowSpeedModel {
    /// Configured static friction blended linearly into the Davis value at
    /// `merge_speed`
    Standstill {
        friction: si::Force,
        merge_speed: si::Velocity,
    },
    /// Bearing-type starting friction table plus track deflection, blended
    /// into the Davis value at [STARTING_FRICTION_SPEED_MPH]
    #[default]
    StartingFriction,
    /// Davis polynomial at every speed
    DavisOnly,
}

impl Valid for LowSpeedModel {}

impl ObjState for LowSpeedModel {
    fn validate(&self) -> ValidationResults {
        let mut errors = ValidationErrors::new();
        if let Self::Standstill {
            friction,
            merge_speed,
        } = self
        {
            si_chk_num_gez_fin(&mut errors, friction, "Standstill friction");
            si_chk_num_gez_fin(&mut errors, merge_speed, "Merge speed");
        }
        errors.make_err()
    }
}

impl BearingType {
    /// Starting friction in lbf per short ton as `(warm, cold)`
    pub fn starting_friction_lbf_per_ton(&self) -> (f64, f64) {
        match self {
            Self::Roller => (5.0, 15.0),
            Self::LowTorqueRoller => (2.5, 7.5),
            Self::Grease => (20.0, 30.0),
            Self::Friction => (25.0, 35.0),
        }
    }
}

/// Fraction of the way from the warm to the cold end of the temperature range
fn cold_fraction(bearing_temp_deg_c: f64) -> f64 {
    1.0 - utils::clamped_frac(bearing_temp_deg_c, TEMP_COLD_DEG_C, TEMP_WARM_DEG_C)
}

/// Multiplier on the Davis A term, 1.5 at or below -10 °C falling linearly to
/// 1.0 at or above 25 °C
pub fn temperature_factor(bearing_temp: si::ThermodynamicTemperature, bearing_failed: bool) -> f64 {
    if bearing_failed {
        return FAILED_BEARING_TEMP_FACTOR;
    }
    1.0 + (TEMP_FACTOR_COLD - 1.0) * cold_fraction(bearing_temp.celsius())
}

/// Track deflection resistance in newtons
pub fn track_deflection(mass: si::Mass, axle_count: u8) -> f64 {
    let axle_load = mass.get::<si::megagram>() / axle_count.max(1) as f64;
    let gradient_equiv = interp1d(
        axle_load,
        &DEFLECTION_AXLE_LOAD_TONNES,
        &DEFLECTION_GRADIENT_EQUIV,
    )
    .unwrap_or(DEFLECTION_GRADIENT_EQUIV[1]);
    DEFLECTION_LBF_PER_LONG_TON * mass.get::<si::ton_long>() / gradient_equiv * uc::LBF.value
}

#[derive(Debug, Clone, Copy, PartialEq)]
/// Per-tick inputs to [compute_resistance]
pub struct ResistanceInputs {
    pub speed: si::Velocity,
    pub mass: si::Mass,
    pub bearing_temp: si::ThermodynamicTemperature,
    pub bearing_failed: bool,
    pub bearing_type: BearingType,
    pub axle_count: u8,
    /// Multiplier on the Davis C term
    pub c_factor: f64,
}

/// Running resistance magnitude.  The caller applies it against the direction
/// of motion.
pub fn compute_resistance(
    inputs: &ResistanceInputs,
    davis: &DavisCoeffs,
    low_speed: &LowSpeedModel,
) -> si::Force {
    let speed = inputs.speed.get::<si::meter_per_second>().abs();
    let temp_factor = temperature_factor(inputs.bearing_temp, inputs.bearing_failed);
    let davis_at = |v: f64| davis.eval(v, temp_factor, inputs.c_factor);

    let res = match low_speed {
        LowSpeedModel::Standstill {
            friction,
            merge_speed,
        } if *friction > si::Force::ZERO => {
            let merge_speed = merge_speed.get::<si::meter_per_second>().max(MIN_MERGE_SPEED);
            if speed < merge_speed {
                let frac = 1.0 - speed / merge_speed;
                frac * friction.get::<si::newton>() * temp_factor
                    + (1.0 - frac) * davis_at(merge_speed)
            } else {
                davis_at(speed)
            }
        }
        LowSpeedModel::Standstill { .. } | LowSpeedModel::StartingFriction => {
            let window = STARTING_FRICTION_SPEED_MPH * uc::MPH.value;
            if speed < window {
                let (warm, cold) = inputs.bearing_type.starting_friction_lbf_per_ton();
                let per_ton = warm + (cold - warm) * cold_fraction(inputs.bearing_temp.celsius());
                let table = per_ton * inputs.mass.get::<si::ton_short>() * uc::LBF.value;
                let start = (table + track_deflection(inputs.mass, inputs.axle_count))
                    .max(STARTING_FRICTION_DAVIS_MARGIN * davis_at(0.0));
                start + (davis_at(window) - start) * speed / window
            } else {
                davis_at(speed)
            }
        }
        LowSpeedModel::DavisOnly => davis_at(speed),
    };
    if res.is_finite() {
        res.max(0.0) * uc::N
    } else {
        si::Force::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn davis() -> DavisCoeffs {
        DavisCoeffs {
            a: 2000.0 * uc::N,
            b: 10.0 * uc::KGPS,
            c: 0.5 * uc::KGPM,
        }
    }

    fn inputs(speed: f64) -> ResistanceInputs {
        ResistanceInputs {
            speed: speed * uc::MPS,
            mass: 80.0 * uc::TONNE,
            bearing_temp: uc::celsius(30.0),
            bearing_failed: false,
            bearing_type: BearingType::Roller,
            axle_count: 4,
            c_factor: 1.0,
        }
    }

    fn models() -> Vec<LowSpeedModel> {
        vec![
            LowSpeedModel::StartingFriction,
            LowSpeedModel::DavisOnly,
            LowSpeedModel::Standstill {
                friction: 5000.0 * uc::N,
                merge_speed: 1.0 * uc::MPS,
            },
            LowSpeedModel::Standstill {
                friction: 5000.0 * uc::N,
                merge_speed: si::Velocity::ZERO,
            },
        ]
    }

    #[test]
    fn test_davis_scenario() {
        for model in models() {
            let res = compute_resistance(&inputs(20.0), &davis(), &model);
            assert!(
                almost_eq(res.get::<si::newton>(), 2400.0, Some(1e-9)),
                "{}",
                format_dbg!((model, res))
            );
        }
    }

    #[test]
    fn test_finite_and_continuous() {
        let dv = 1e-4;
        // the floored merge speed model is checked separately below
        for model in models().into_iter().take(3) {
            for temp in [-30.0, 0.0, 40.0] {
                let mut prev: Option<f64> = None;
                let mut v = 0.0;
                while v < 10.0 {
                    let res = compute_resistance(
                        &ResistanceInputs {
                            bearing_temp: uc::celsius(temp),
                            ..inputs(v)
                        },
                        &davis(),
                        &model,
                    )
                    .get::<si::newton>();
                    assert!(res.is_finite() && res >= 0.0);
                    if let Some(prev) = prev {
                        // slope of the steepest blend is bounded well below 1e5 N per m/s
                        assert!(
                            (res - prev).abs() < 10.0,
                            "{}",
                            format_dbg!((model, temp, v, prev, res))
                        );
                    }
                    prev = Some(res);
                    v += dv;
                }
            }
        }

        let floored = models()[3];
        let res_at = |v: f64| {
            compute_resistance(&inputs(v), &davis(), &floored).get::<si::newton>()
        };
        assert!(almost_eq(res_at(0.0), 5000.0, None));
        assert!((res_at(MIN_MERGE_SPEED - 1e-9) - res_at(MIN_MERGE_SPEED + 1e-9)).abs() < 1.0);
    }

    #[test]
    fn test_temperature_factor() {
        assert!(almost_eq(temperature_factor(uc::celsius(-20.0), false), 1.5, None));
        assert!(almost_eq(temperature_factor(uc::celsius(7.5), false), 1.25, None));
        assert!(almost_eq(temperature_factor(uc::celsius(30.0), false), 1.0, None));
        assert_eq!(
            temperature_factor(uc::celsius(30.0), true),
            FAILED_BEARING_TEMP_FACTOR
        );
    }

    #[test]
    fn test_starting_friction_exceeds_davis_margin() {
        let heavy_davis = DavisCoeffs {
            a: 50_000.0 * uc::N,
            ..davis()
        };
        let res = compute_resistance(&inputs(0.0), &heavy_davis, &LowSpeedModel::StartingFriction);
        assert!(almost_eq(
            res.get::<si::newton>(),
            STARTING_FRICTION_DAVIS_MARGIN * 50_000.0,
            None
        ));
    }

    #[test]
    fn test_starting_friction_table() {
        // roller bearing, warm: 5 lbf per short ton plus deflection at 20 t axle load
        let res = compute_resistance(&inputs(0.0), &davis(), &LowSpeedModel::StartingFriction);
        let mass = 80.0 * uc::TONNE;
        let expected = 5.0 * mass.get::<si::ton_short>() * uc::LBF.value
            + 1120.0 * mass.get::<si::ton_long>() / 550.0 * uc::LBF.value;
        assert!(almost_eq(res.get::<si::newton>(), expected, Some(1e-9)));

        let grease = compute_resistance(
            &ResistanceInputs {
                bearing_type: BearingType::Grease,
                ..inputs(0.0)
            },
            &davis(),
            &LowSpeedModel::StartingFriction,
        );
        assert!(grease > res);
    }

    #[test]
    fn test_standstill_blend() {
        let model = LowSpeedModel::Standstill {
            friction: 5000.0 * uc::N,
            merge_speed: 1.0 * uc::MPS,
        };
        let at_rest = compute_resistance(&inputs(0.0), &davis(), &model);
        assert!(almost_eq(at_rest.get::<si::newton>(), 5000.0, None));
        let halfway = compute_resistance(&inputs(0.5), &davis(), &model);
        let davis_merge = davis().eval(1.0, 1.0, 1.0);
        assert!(almost_eq(
            halfway.get::<si::newton>(),
            0.5 * 5000.0 + 0.5 * davis_merge,
            None
        ));
    }

    #[test]
    fn test_trail_derating() {
        let full = compute_resistance(&inputs(20.0), &davis(), &LowSpeedModel::DavisOnly);
        let derated = compute_resistance(
            &ResistanceInputs {
                c_factor: 0.2083,
                ..inputs(20.0)
            },
            &davis(),
            &LowSpeedModel::DavisOnly,
        );
        assert!(almost_eq(
            (full - derated).get::<si::newton>(),
            400.0 * 0.5 * (1.0 - 0.2083),
            None
        ));
    }
}
