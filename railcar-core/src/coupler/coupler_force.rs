use super::{CouplerParams, OVERLOAD_FRACTION};
use crate::imports::*;

#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize, SerdeAPI)]
/// Coupler state carried from tick to tick.  Positive force is compressive
/// (buff) when accompanied by negative slack.
pub struct CouplerState {
    /// Free slack taken up, negative in compression
    pub slack: si::Length,
    /// Resolved coupler force from the train-level solve
    pub force: si::Force,
    /// Resolved coupler force from the previous tick
    pub force_prev: si::Force,
    /// Force above [super::OVERLOAD_FRACTION] of `break_1`
    pub overloaded: bool,
    /// Force above `break_1` or impulse above `break_2`
    pub exceed_break: bool,
}

impl CouplerState {
    /// Whether the coupler is in buff (compression)
    pub fn in_buff(&self) -> bool {
        self.force > si::Force::ZERO && self.slack < si::Length::ZERO
    }

    /// Accepts a resolved force and reevaluates the overload and break flags
    pub fn apply_force(&mut self, params: &CouplerParams, force: si::Force) {
        self.force_prev = self.force;
        self.force = force;
        let force_abs = force.abs();
        let impulse = (force - self.force_prev).abs();
        let exceed_break = force_abs > params.break_1 || impulse > params.break_2;
        #[cfg(feature = "logging")]
        if exceed_break && !self.exceed_break {
            log::warn!(
                "coupler force {:.0} N exceeds break limit ({:.0} N proof, {:.0} N impulse)",
                force_abs.get::<si::newton>(),
                params.break_1.get::<si::newton>(),
                params.break_2.get::<si::newton>()
            );
        }
        self.exceed_break = exceed_break;
        self.overloaded = force_abs > OVERLOAD_FRACTION * params.break_1;
    }

    /// Advances slack by the relative velocity of the two coupled cars and
    /// clamps it to the coupler's slack limits
    pub fn integrate_slack(
        &mut self,
        params: &CouplerParams,
        speed: si::Velocity,
        speed_behind: si::Velocity,
        dt: si::Time,
    ) {
        if params.rigid {
            self.slack = si::Length::ZERO;
            return;
        }
        let (lo, hi) = params.slack_limits();
        let slack = self.slack + (speed - speed_behind) * dt;
        self.slack = slack.max(lo).min(hi);
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize, SerdeAPI)]
/// Row of the tridiagonal system solved across the train for the coupler
/// forces.  `a`, `b` and `c` are in 1/kg, `r` in m/s², `g` is scratch space
/// for the solver.
pub struct CouplerSolveCoeffs {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub g: f64,
    pub r: f64,
}

impl CouplerSolveCoeffs {
    /// Coefficients for the coupler between a car and the car behind it.
    /// Without a car behind every term is zero.
    pub fn new(
        mass: si::Mass,
        force: si::Force,
        behind: Option<(si::Mass, si::Force)>,
    ) -> Self {
        let Some((mass_behind, force_behind)) = behind else {
            return Self::default();
        };
        let m_self = mass.get::<si::kilogram>();
        let m_behind = mass_behind.get::<si::kilogram>();
        if m_self <= 0.0 || m_behind <= 0.0 {
            return Self::default();
        }
        Self {
            a: -1.0 / m_self,
            b: 1.0 / m_self + 1.0 / m_behind,
            c: -1.0 / m_behind,
            g: 0.0,
            r: force_behind.get::<si::newton>() / m_behind - force.get::<si::newton>() / m_self,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_break_and_overload_flags() {
        let mut params = CouplerParams::default();
        params.set_break(1e10 * uc::N, 1e12 * uc::N).unwrap();
        let mut state = CouplerState::default();

        state.apply_force(&params, 1.1e10 * uc::N);
        assert!(state.exceed_break);
        assert!(state.overloaded);

        state.apply_force(&params, 0.9e10 * uc::N);
        assert!(!state.exceed_break);
        assert!(state.overloaded);

        state.apply_force(&params, 0.5e10 * uc::N);
        assert!(!state.exceed_break);
        assert!(!state.overloaded);

        state.apply_force(&params, -1.2e10 * uc::N);
        assert!(state.exceed_break);
    }

    #[test]
    fn test_impulse_break() {
        let params = CouplerParams::default();
        let mut state = CouplerState::default();
        state.apply_force(&params, 1e6 * uc::N);
        assert!(!state.exceed_break);
        state.apply_force(&params, 5e7 * uc::N);
        assert!(state.exceed_break);
        assert!(!state.overloaded);
    }

    #[test]
    fn test_slack_stays_within_limits() {
        let params = CouplerParams::default();
        let (lo, hi) = params.slack_limits();
        let mut state = CouplerState::default();
        for _ in 0..100 {
            state.integrate_slack(&params, 2.0 * uc::MPS, si::Velocity::ZERO, 0.1 * uc::S);
            assert!(state.slack <= hi);
        }
        assert_eq!(state.slack, hi);
        for _ in 0..100 {
            state.integrate_slack(&params, si::Velocity::ZERO, 2.0 * uc::MPS, 0.1 * uc::S);
            assert!(state.slack >= lo);
        }
        assert_eq!(state.slack, lo);

        let rigid = CouplerParams {
            rigid: true,
            ..Default::default()
        };
        state.integrate_slack(&rigid, 2.0 * uc::MPS, si::Velocity::ZERO, 0.1 * uc::S);
        assert_eq!(state.slack, si::Length::ZERO);
    }

    #[test]
    fn test_solve_coeffs() {
        let coeffs = CouplerSolveCoeffs::new(
            1000.0 * uc::KG,
            100.0 * uc::N,
            Some((500.0 * uc::KG, 100.0 * uc::N)),
        );
        assert!(almost_eq(coeffs.a, -1e-3, None));
        assert!(almost_eq(coeffs.b, 3e-3, None));
        assert!(almost_eq(coeffs.c, -2e-3, None));
        assert!(almost_eq(coeffs.r, 0.1, None));
        assert_eq!(
            CouplerSolveCoeffs::new(1000.0 * uc::KG, 100.0 * uc::N, None),
            CouplerSolveCoeffs::default()
        );
    }
}
