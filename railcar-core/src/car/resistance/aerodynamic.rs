use crate::environment::{TunnelSection, Wind};
use crate::imports::*;

/// Drag coefficient of the car side in cross wind
const SIDE_DRAG_COEFF: f64 = 1.2;
/// Share of the lateral wind force that shows up as longitudinal resistance
/// through flange contact
const LATERAL_RESISTANCE_FRACTION: f64 = 0.5;
/// Blockage ratio cap, keeps the tunnel term finite for oversize cars
pub const MAX_BLOCKAGE_RATIO: f64 = 0.95;
/// Skin friction coefficient along the tunnel wall
const TUNNEL_FRICTION_COEFF: f64 = 0.02;

#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize, SerdeAPI)]
pub struct WindForces {
    /// Signed change in aerodynamic drag relative to still air, positive
    /// opposing forward motion
    pub drag: si::Force,
    /// Lateral force from the cross-wind component
    pub lateral: si::Force,
    /// Longitudinal resistance magnitude induced by `lateral`
    pub lateral_resistance: si::Force,
}

/// Wind forces on a car moving at `speed` along `heading`
pub fn wind_forces(
    speed: si::Velocity,
    heading: si::Angle,
    wind: &Wind,
    frontal_area: si::Area,
    side_area: si::Area,
    drag_coeff: f64,
) -> WindForces {
    let (along, across) = wind.components(heading);
    let v = speed.si();
    let half_rho = 0.5 * uc::rho_air().get::<si::kilogram_per_cubic_meter>();
    let v_rel = v - along;
    let drag = half_rho
        * drag_coeff
        * frontal_area.si()
        * (v_rel * v_rel.abs() - v * v.abs());
    let lateral =
        half_rho * SIDE_DRAG_COEFF * side_area.si() * across * across.abs();
    WindForces {
        drag: drag * uc::N,
        lateral: lateral * uc::N,
        lateral_resistance: LATERAL_RESISTANCE_FRACTION * lateral.abs() * uc::N,
    }
}

/// Additional drag magnitude from running through a tunnel bore
pub fn tunnel_resistance(
    speed: si::Velocity,
    frontal_area: si::Area,
    car_length: si::Length,
    tunnel: &TunnelSection,
) -> si::Force {
    let tunnel_area = tunnel.area.si();
    if tunnel_area <= 0.0 {
        return si::Force::ZERO;
    }
    let car_area = frontal_area.si();
    let beta = (car_area / tunnel_area).clamp(0.0, MAX_BLOCKAGE_RATIO);
    let diameter = tunnel.hydraulic_diameter().si();
    let friction = if diameter > 0.0 {
        TUNNEL_FRICTION_COEFF * car_length.si() / diameter
    } else {
        0.0
    };
    let blockage = (1.0 / (1.0 - beta)).powi(2) - 1.0;
    let v = speed.si();
    let res = 0.5 * uc::rho_air().get::<si::kilogram_per_cubic_meter>() * v * v * car_area
        * (blockage + friction);
    if res.is_finite() {
        res * uc::N
    } else {
        si::Force::ZERO
    }
}
