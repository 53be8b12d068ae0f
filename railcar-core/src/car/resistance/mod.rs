//! Resistance forces acting on a single car

pub mod aerodynamic;
pub mod curve;
pub mod running;

pub use aerodynamic::*;
pub use curve::*;
pub use running::*;
