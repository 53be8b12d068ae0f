//! Import uom si system and add unit constants
//! Zero values should be created using standard uom syntax ($Quantity::ZERO) after adding "use crate::imports::*"
//! Non-zero values should be created using standard uom syntax ($Quantity::new::<$unit>($value)) or multiplication syntax ($value * $UNIT_CONSTANT)

use uom::si;

pub use si::acceleration::meter_per_second_squared;
pub use si::angle::{degree, radian};
pub use si::area::square_meter;
pub use si::f64::{
    Acceleration, Angle, Area, Force, Length, LinearMassDensity, Mass, MassDensity, MassRate,
    Ratio, ThermodynamicTemperature, Time, Velocity,
};
pub use si::force::{newton, pound_force};
pub use si::length::{foot, meter};
pub use si::linear_mass_density::kilogram_per_meter;
pub use si::mass::{kilogram, megagram, ton_long, ton_short};
pub use si::mass_density::kilogram_per_cubic_meter;
pub use si::mass_rate::kilogram_per_second;
pub use si::ratio::ratio;
pub use si::thermodynamic_temperature::{degree_celsius, kelvin};
pub use si::time::second;
pub use si::velocity::{kilometer_per_hour, meter_per_second, mile_per_hour};
