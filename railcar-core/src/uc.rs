//! Module providing unit constants (e.g. 1 kg) for an assortment of
//! dimensional quantities.

use super::si::*;

use uom::lib::marker::PhantomData;
use uom::si::Quantity;

/// Invoking `unit_const!(R, Ratio, 1.0);` yields:
/// ```ignore
/// pub const R: Ratio = Quantity {
///    dimension: PhantomData,
///    units: PhantomData,
///    value: 1.0,
/// }
/// ```
macro_rules! unit_const {
    ($(#[$docs:meta])* $name:ident, $T:ty, $value:expr) => {
        $(#[$docs])*
        /// defines uom unit const
        pub const $name: $T = Quantity {
            dimension: PhantomData,
            units: PhantomData,
            value: $value,
        };
    };
}

unit_const!(R, Ratio, 1.0);
unit_const!(RAD, Angle, 1.0);
unit_const!(DEG, Angle, 1.745_329_251_994_329_5_E-2);

unit_const!(KG, Mass, 1.0);
unit_const!(TONNE, Mass, 1.0E3);
unit_const!(TON, Mass, 9.071_847_E2);
unit_const!(LONG_TON, Mass, 1.016_047_E3);
unit_const!(LB, Mass, 4.535_924_E-1);

unit_const!(M, Length, 1.0);
unit_const!(MM, Length, 1.0E-3);
unit_const!(FT, Length, 3.048_E-1);
unit_const!(M2, Area, 1.0);
unit_const!(FT2, Area, 9.290_304_E-2);

unit_const!(S, Time, 1.0);
unit_const!(MIN, Time, 60.0);

unit_const!(N, Force, 1.0);
unit_const!(KN, Force, 1.0E3);
unit_const!(LBF, Force, 4.448_222_E0);

unit_const!(KGPM3, MassDensity, 1.0);
unit_const!(
    /// Davis B coefficient unit, N·s/m
    KGPS,
    MassRate,
    1.0
);
unit_const!(
    /// Davis C coefficient unit, N·s²/m²
    KGPM,
    LinearMassDensity,
    1.0
);

unit_const!(MPS, Velocity, 1.0);
unit_const!(MPH, Velocity, 4.470_4_E-1);
unit_const!(KPH, Velocity, 2.777_777_777_777_778_E-1);
unit_const!(MPS2, Acceleration, 1.0);

unit_const!(
    /// Standard acceleration due to gravity
    ACC_GRAV,
    Acceleration,
    9.806_65
);

unit_const!(KELVIN, ThermodynamicTemperature, 1.0);

/// Offset between the kelvin and celsius scales
pub const CELSIUS_OFFSET: f64 = 273.15;

/// Returns a [ThermodynamicTemperature] from a value in degrees celsius
pub fn celsius(deg_c: f64) -> ThermodynamicTemperature {
    (deg_c + CELSIUS_OFFSET) * KELVIN
}

// TODO: make this vary with altitude and ambient temperature
pub fn rho_air() -> MassDensity {
    KGPM3 * 1.225
}
