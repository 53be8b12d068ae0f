//! Per-tick orchestration of the car models.
//!
//! Each tick a car reads its own persistent state plus a snapshot of each
//! neighbour taken before any car in the train was stepped, so the result
//! does not depend on the order in which cars are visited.

use super::derailment::DerailmentInputs;
use super::resistance::{
    compute_resistance, curve_resistance, superelevation_angle, tunnel_resistance, wind_forces,
    CurveSpeedLimits, ResistanceInputs, WindForces,
};
use super::{Car, CarGeometry};
use crate::coupler::{
    compute_coupler_angles, CouplerAngles, CouplerEnd, CouplerSolveCoeffs, CouplerState,
};
use crate::environment::{CarControls, SuperelevationTable, TrackSnapshot};
use crate::imports::*;

#[derive(Debug, Clone, Copy, PartialEq)]
/// What a car needs to know about an adjacent car for one tick
pub struct NeighbourSnapshot {
    pub geometry: CarGeometry,
    pub curve_radius: si::Length,
    pub heading: si::Angle,
    pub speed: si::Velocity,
    pub mass: si::Mass,
    /// Net force from the neighbour's previous tick
    pub force_total: si::Force,
    /// Coupler between the neighbour and the car behind it
    pub coupler: CouplerState,
    pub rear_angles: CouplerAngles,
}

impl Car {
    /// Snapshot of this car as seen by its neighbours, taken before stepping
    pub fn neighbour_snapshot(&self, track: &TrackSnapshot) -> NeighbourSnapshot {
        NeighbourSnapshot {
            geometry: self.params.geometry,
            curve_radius: track.curve_radius,
            heading: track.heading,
            speed: self.state.speed,
            mass: self.mass(),
            force_total: self.state.force_total,
            coupler: self.coupler,
            rear_angles: self.rear_angles,
        }
    }

    /// Advances every car model by `dt` and records the tick's outputs
    pub fn step(
        &mut self,
        dt: si::Time,
        track: &TrackSnapshot,
        controls: &CarControls,
        ahead: Option<&NeighbourSnapshot>,
        behind: Option<&NeighbourSnapshot>,
        superelevation_table: &SuperelevationTable,
    ) -> anyhow::Result<()> {
        self.solve_step(dt, track, controls, ahead, behind, superelevation_table)
            .map_err(|err| err.context(format!("time step: {}", self.state.i)))?;
        self.save_state();
        self.state.i += 1;
        Ok(())
    }

    fn solve_step(
        &mut self,
        dt: si::Time,
        track: &TrackSnapshot,
        controls: &CarControls,
        ahead: Option<&NeighbourSnapshot>,
        behind: Option<&NeighbourSnapshot>,
        superelevation_table: &SuperelevationTable,
    ) -> anyhow::Result<()> {
        ensure!(
            dt > si::Time::ZERO && dt.get::<si::second>().is_finite(),
            "{}\ntime step must be positive",
            format_dbg!(dt)
        );
        let speed = self.state.speed;
        let mass = self.mass();

        let superelevation = match track.superelevation {
            Some(elev) => elev,
            None => superelevation_table
                .lookup(track.curve_radius)
                .with_context(|| format_dbg!())?,
        };

        self.bearing
            .update(dt, speed, track.temp_ambient, mass, self.hot_box.as_ref());

        let res_running = compute_resistance(
            &ResistanceInputs {
                speed,
                mass,
                bearing_temp: self.bearing.temperature,
                bearing_failed: self.bearing.failed,
                bearing_type: self.params.bearing_type,
                axle_count: self.params.axle_count,
                c_factor: self.davis_c_factor(),
            },
            &self.davis,
            &self.params.low_speed,
        );

        let limits = CurveSpeedLimits::new(
            track.curve_radius,
            superelevation,
            self.params.unbalanced_superelevation,
            self.params.gauge,
            self.params.cg_height,
        );
        self.curve_flags.update(speed, &limits, track.on_curve());
        let res_curve = curve_resistance(
            mass,
            speed,
            track.curve_radius,
            self.params.gauge,
            self.params.geometry.rigid_wheelbase,
            limits.equal_load,
        );

        let wind = if track.wind.speed > si::Velocity::ZERO {
            wind_forces(
                speed,
                track.heading,
                &track.wind,
                self.params.frontal_area,
                self.params.side_area,
                self.params.drag_coeff,
            )
        } else {
            WindForces::default()
        };
        let res_tunnel = track.tunnel.as_ref().map_or(si::Force::ZERO, |tunnel| {
            tunnel_resistance(
                speed,
                self.params.frontal_area,
                self.params.geometry.length,
                tunnel,
            )
        });

        let (force_brake, skid) = self.brakes.update(
            &self.params.brakes,
            self.params.traction,
            controls,
            speed,
            mass,
            track.rail_adhesion,
        );

        // rear coupler: slack and angles against the car behind
        if let Some(behind) = behind {
            let params = *self.rear_coupler();
            self.coupler
                .integrate_slack(&params, speed, behind.speed, dt);
            self.rear_angles = compute_coupler_angles(
                &self.rear_angles,
                CouplerEnd {
                    geometry: &self.params.geometry,
                    curve_radius: track.curve_radius,
                    heading: track.heading,
                },
                CouplerEnd {
                    geometry: &behind.geometry,
                    curve_radius: behind.curve_radius,
                    heading: behind.heading,
                },
                self.coupler.force,
                self.coupler.slack,
                self.params.track_play,
            );
        } else {
            self.coupler = CouplerState::default();
            self.rear_angles = CouplerAngles::default();
        }

        // front coupler: owned by the car ahead
        if let Some(ahead) = ahead {
            self.front_angles = compute_coupler_angles(
                &self.front_angles,
                CouplerEnd {
                    geometry: &self.params.geometry,
                    curve_radius: track.curve_radius,
                    heading: track.heading,
                },
                CouplerEnd {
                    geometry: &ahead.geometry,
                    curve_radius: ahead.curve_radius,
                    heading: ahead.heading,
                },
                ahead.coupler.force,
                ahead.coupler.slack,
                self.params.track_play,
            );
        } else {
            self.front_angles = CouplerAngles::default();
        }

        let (neighbour_coupler, coupler_angles) = match (ahead, behind) {
            (Some(ahead), _) => (ahead.coupler, self.front_angles),
            (None, Some(_)) => (self.coupler, self.rear_angles),
            (None, None) => (CouplerState::default(), CouplerAngles::default()),
        };
        self.derailment.update(
            &self.params,
            &DerailmentInputs {
                speed,
                mass,
                curve_radius: track.curve_radius,
                superelevation_angle: superelevation_angle(superelevation, self.params.gauge)
                    * uc::RAD,
                neighbour_coupler,
                coupler_angles,
            },
            dt,
        );

        let force_traction = controls.traction_force;
        let dir = if speed > si::Velocity::ZERO {
            1.0
        } else if speed < si::Velocity::ZERO {
            -1.0
        } else if force_traction > si::Force::ZERO {
            1.0
        } else if force_traction < si::Force::ZERO {
            -1.0
        } else {
            0.0
        };
        let resistance =
            res_running + res_curve + res_tunnel + wind.lateral_resistance + force_brake;
        let force_total = force_traction - dir * resistance - wind.drag;
        ensure!(
            force_total.value.is_finite(),
            "{}\nnon-finite net force",
            format_dbg!((res_running, res_curve, res_tunnel, force_brake, wind.drag))
        );

        self.state = super::CarState {
            i: self.state.i,
            speed,
            mass,
            superelevation,
            res_running,
            res_curve,
            res_tunnel,
            res_wind_lateral: wind.lateral_resistance,
            force_wind_drag: wind.drag,
            force_wind_lateral: wind.lateral,
            force_brake,
            force_traction,
            force_total,
            brake_friction_factor: self.brakes.friction_factor,
            skid,
            bearing_temp: self.bearing.temperature,
            bearing_hot_warning: self.bearing.hot_warning,
            bearing_failed: self.bearing.failed,
            bearing_smoke: self.bearing.smoke,
            hot_box: self.bearing.mode == super::BearingMode::HotBox,
            derail_coeff: self.derailment.coefficient,
            derail_possible: self.derailment.possible,
            derail_expected: self.derailment.expected,
            max_safe_curve_speed: limits.max_safe,
            max_safe_curve_speed_reached: self.curve_flags.max_safe_reached,
            critical_curve_speed_reached: self.curve_flags.critical_reached,
            coupler_force: self.coupler.force,
            coupler_slack: self.coupler.slack,
            coupler_overloaded: self.coupler.overloaded,
            coupler_exceed_break: self.coupler.exceed_break,
            coupler_angle: self.rear_angles.tension,
            coupler_buff_angle: self.rear_angles.buff,
            coupler_coeffs: CouplerSolveCoeffs::new(
                mass,
                force_total,
                behind.map(|b| (b.mass, b.force_total)),
            ),
        };
        Ok(())
    }
}
