//! Traction type of a car and its role within the current train composition.

use crate::imports::*;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, SerdeAPI)]
/// Closed set of traction types the per-car physics distinguishes
pub enum TractionKind {
    #[default]
    Unpowered,
    Tender,
    Steam,
    Diesel,
    Electric,
    /// Driving trailer with a cab but no traction
    ControlTrailer,
}

impl TractionKind {
    /// Whether the car produces traction
    pub fn is_locomotive(&self) -> bool {
        matches!(self, Self::Steam | Self::Diesel | Self::Electric)
    }

    /// Diesel and electric units infer brake skid from the traction
    /// subsystem's wheel-slip flag instead of the adhesion balance
    pub fn uses_wheel_slip_flag(&self) -> bool {
        matches!(self, Self::Diesel | Self::Electric)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// Role of a car within its train, resolved on every composition change
pub struct TractionRole {
    /// First locomotive in train order
    pub is_lead: bool,
    /// Immediately coupled to the lead locomotive
    pub coupled_to_lead: bool,
}

impl TractionRole {
    /// Whether the trailing-locomotive derating of the Davis C term applies
    pub fn derate_davis_c(&self, kind: TractionKind) -> bool {
        match kind {
            k if k.is_locomotive() => !self.is_lead,
            TractionKind::Tender => !self.coupled_to_lead,
            _ => false,
        }
    }
}

/// Resolves the traction role of every car from the traction kinds in train order
pub fn resolve_roles(kinds: &[TractionKind]) -> Vec<TractionRole> {
    let lead = kinds.iter().position(|k| k.is_locomotive());
    (0..kinds.len())
        .map(|idx| TractionRole {
            is_lead: Some(idx) == lead,
            coupled_to_lead: lead.map_or(false, |lead| idx.abs_diff(lead) == 1),
        })
        .collect()
}
