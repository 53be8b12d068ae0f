//! Convenience module for exposing commonly used structs
pub use crate::car::{
    BearingType, BrakeParams, Car, CarBuilder, CarGeometry, CarParams, CarPersistedState,
    CarState, DavisCoeffs, FrictionCurve, LowSpeedModel, TractionKind,
};
pub use crate::coupler::{CouplerParams, CouplerSolveCoeffs, CouplerState};
pub use crate::environment::{
    CarControls, SuperelevationTable, TrackSnapshot, TunnelSection, Wind,
};
pub use crate::si;
pub use crate::train::Train;
pub use crate::traits::SerdeAPI;
pub use crate::uc;
