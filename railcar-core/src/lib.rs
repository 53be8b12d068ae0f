#![allow(clippy::field_reassign_with_default)]

//! Crate containing the per-car dynamics core of a rail vehicle simulation.  Each
//! simulation step advances every car of a [train::Train] once, computing running
//! resistance, curve and wind forces, brake friction and skid, bearing temperature,
//! coupler angles and derailment risk, and the per-car coefficients consumed by an
//! external train-level coupler force solver.
//! # Features:
//! - logging: enable this feature to log state transitions (hot box, derailment, coupler break)

#[macro_use]
pub mod macros;

#[cfg(test)]
pub mod testing;

pub mod car;
pub mod coupler;
pub mod environment;
pub mod error;
pub mod imports;
pub mod prelude;
pub mod si;
pub mod train;
pub mod traits;
pub mod uc;
pub mod utils;
pub mod validate;
