//! Coupler angle between adjacent cars on curved track.
//!
//! On a steady curve the angle follows from bogie-centre distance, overhang
//! and coupler-face length of both cars.  When only one of the two cars is on
//! the curve the angle is ramped toward the steady value so coupler forces
//! stay continuous through curve entry and exit.

use crate::car::CarGeometry;
use crate::imports::*;

/// Maximum change of coupler angle per tick while ramping through a transition
pub const ANGLE_RAMP_PER_TICK: f64 = 0.0006;
/// Floor on the combined overhang used to apportion the inter-car angle
pub const MIN_COUPLER_DISTANCE: f64 = 0.0001;
/// Lateral track play allowed for in the buff angle
pub const DEFAULT_TRACK_PLAY: f64 = 0.01;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// Curve transition phase of a pair of coupled cars
pub enum CurveTransition {
    #[default]
    Straight,
    /// One car on the curve, approaching it
    Entering,
    /// Both cars on the curve
    Curving,
    /// One car on the curve, leaving it
    Leaving,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize, SerdeAPI)]
/// Coupler angles at one end of a car
pub struct CouplerAngles {
    /// Signed angle in tension (draft)
    pub tension: si::Angle,
    /// Signed angle in compression (buff); zero unless the coupler is in buff
    pub buff: si::Angle,
    pub transition: CurveTransition,
}

/// One side of a coupled pair as seen by the angle calculation
#[derive(Debug, Clone, Copy)]
pub struct CouplerEnd<'a> {
    pub geometry: &'a CarGeometry,
    /// Zero on straight track
    pub curve_radius: si::Length,
    pub heading: si::Angle,
}

impl CouplerEnd<'_> {
    fn on_curve(&self) -> bool {
        self.curve_radius > si::Length::ZERO
    }
}

/// Fraction of the inter-car angle taken by `this` car's coupler
pub fn overhang_share(this: &CarGeometry, neighbour: &CarGeometry) -> f64 {
    let o_self = this.overhang().si().max(0.0);
    let o_neigh = neighbour.overhang().si().max(0.0);
    o_self / (o_self + o_neigh).max(MIN_COUPLER_DISTANCE)
}

fn half_angle(geometry: &CarGeometry, radius: f64) -> f64 {
    let alpha = geometry.bogie_distance.si() / radius;
    alpha / 2.0 + geometry.overhang().si() / radius
}

/// Unsigned steady-state tension angle in radians with each car on its own radius
pub fn steady_state_angle(
    this: &CarGeometry,
    neighbour: &CarGeometry,
    radius: si::Length,
    neighbour_radius: si::Length,
) -> f64 {
    let radius = radius.si();
    let neighbour_radius = neighbour_radius.si();
    if radius <= 0.0 || neighbour_radius <= 0.0 {
        return 0.0;
    }
    let theta = half_angle(this, radius) + half_angle(neighbour, neighbour_radius);
    theta * overhang_share(this, neighbour)
}

/// Unsigned buff angle in radians from the triangle formed by the two car
/// half-lengths and the track radii, widened by the track play
pub fn buff_angle(
    this: &CarGeometry,
    neighbour: &CarGeometry,
    radius: si::Length,
    neighbour_radius: si::Length,
    track_play: si::Length,
) -> f64 {
    let play = track_play.si();
    let r1 = radius.si() + play;
    let r2 = neighbour_radius.si() + play;
    if r1 <= play || r2 <= play {
        return 0.0;
    }
    let d = this.length.si() / 2.0 + neighbour.length.si() / 2.0;
    let cos_phi = ((r1 * r1 + r2 * r2 - d * d) / (2.0 * r1 * r2)).clamp(-1.0, 1.0);
    let phi = cos_phi.acos();
    let bogie_distance = this.bogie_distance.si().max(MIN_COUPLER_DISTANCE);
    phi * overhang_share(this, neighbour) + (2.0 * play / bogie_distance).clamp(-1.0, 1.0).asin()
}

/// Computes the coupler angles between `this` car and `neighbour` for the
/// current tick.  `prev` is the result from the previous tick; it sets the
/// starting point and direction of any transition ramp.
pub fn compute_coupler_angles(
    prev: &CouplerAngles,
    this: CouplerEnd,
    neighbour: CouplerEnd,
    coupler_force: si::Force,
    slack: si::Length,
    track_play: si::Length,
) -> CouplerAngles {
    let prev_mag = prev.tension.si().abs();
    let (magnitude, transition) = match (this.on_curve(), neighbour.on_curve()) {
        (true, true) => (
            steady_state_angle(
                this.geometry,
                neighbour.geometry,
                this.curve_radius,
                neighbour.curve_radius,
            ),
            CurveTransition::Curving,
        ),
        (true, false) | (false, true) => {
            let radius = if this.on_curve() {
                this.curve_radius
            } else {
                neighbour.curve_radius
            };
            let target = steady_state_angle(this.geometry, neighbour.geometry, radius, radius);
            match prev.transition {
                CurveTransition::Straight | CurveTransition::Entering => (
                    (prev_mag + ANGLE_RAMP_PER_TICK).clamp(0.0, target),
                    CurveTransition::Entering,
                ),
                CurveTransition::Curving | CurveTransition::Leaving => (
                    (prev_mag - ANGLE_RAMP_PER_TICK).clamp(0.0, target),
                    CurveTransition::Leaving,
                ),
            }
        }
        (false, false) => (
            (prev_mag - ANGLE_RAMP_PER_TICK).max(0.0),
            CurveTransition::Straight,
        ),
    };

    let heading_diff = utils::wrap_angle((neighbour.heading - this.heading).si());
    let sign = if heading_diff >= 0.0 { 1.0 } else { -1.0 };

    let buff = if coupler_force > si::Force::ZERO && slack < si::Length::ZERO {
        let (radius, neighbour_radius) = match (this.on_curve(), neighbour.on_curve()) {
            (true, true) => (this.curve_radius, neighbour.curve_radius),
            (true, false) => (this.curve_radius, this.curve_radius),
            (false, true) => (neighbour.curve_radius, neighbour.curve_radius),
            (false, false) => (si::Length::ZERO, si::Length::ZERO),
        };
        buff_angle(
            this.geometry,
            neighbour.geometry,
            radius,
            neighbour_radius,
            track_play,
        )
    } else {
        0.0
    };

    CouplerAngles {
        tension: sign * magnitude * uc::RAD,
        buff: sign * buff * uc::RAD,
        transition,
    }
}
