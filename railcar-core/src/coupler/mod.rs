//! Coupler parameters, per-tick coupler state and coupler angle geometry.

pub mod coupler_force;
pub mod coupler_params;
pub mod geometry;

pub use coupler_force::*;
pub use coupler_params::*;
pub use geometry::*;
