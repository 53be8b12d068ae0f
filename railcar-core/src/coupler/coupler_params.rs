use crate::imports::*;

/// Default proof/failure limit; effectively unbreakable
pub const DEFAULT_BREAK_1: f64 = 1e10;
/// Default impulse limit
pub const DEFAULT_BREAK_2: f64 = 2e7;
/// Slack travel assumed when the coupler has a non-zero `r0_x`
pub const DEFAULT_R0_DIFF: f64 = 0.012;
pub const R0_DIFF_MIN: f64 = 0.001;
pub const R0_DIFF_MAX: f64 = 0.1;
/// Fraction of `break_1` above which the coupler is flagged as overloaded
pub const OVERLOAD_FRACTION: f64 = 0.75;

#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
/// Separate tension and compression characteristics.  Any value left as
/// `None` is promoted from the simple coupler on [SerdeAPI::init].
pub struct AdvancedCouplerParams {
    /// Slack travel in tension
    pub r0_y_tension: Option<si::Length>,
    /// Slack travel in compression
    pub r0_y_compression: Option<si::Length>,
    pub stiffness_tension_newtons_per_meter: Option<f64>,
    pub stiffness_compression_newtons_per_meter: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
/// Spring, slack and break parameters for one end of a car
pub struct CouplerParams {
    /// Rigid couplers (e.g. articulated or bar coupled sets) carry no slack
    pub rigid: bool,
    /// Zero-length offset in x
    #[serde(alias = "R0X")]
    pub r0_x: si::Length,
    /// Zero-length offset in y
    #[serde(alias = "R0Y")]
    pub r0_y: si::Length,
    /// Free slack travel, clamped to [[R0_DIFF_MIN], [R0_DIFF_MAX]]
    pub r0_diff: si::Length,
    pub stiffness_1_newtons_per_meter: f64,
    pub stiffness_2_newtons_per_meter: f64,
    /// Proof/failure limit applied to the static coupler force
    #[serde(alias = "Break1N")]
    pub break_1: si::Force,
    /// Impulse limit applied to the change in coupler force over one tick
    #[serde(alias = "Break2N")]
    pub break_2: si::Force,
    #[serde(default)]
    pub advanced: Option<AdvancedCouplerParams>,
}

impl Default for CouplerParams {
    fn default() -> Self {
        let mut coupler = Self {
            rigid: false,
            r0_x: si::Length::ZERO,
            r0_y: si::Length::ZERO,
            r0_diff: DEFAULT_R0_DIFF * uc::M,
            stiffness_1_newtons_per_meter: 1e7,
            stiffness_2_newtons_per_meter: 2e7,
            break_1: DEFAULT_BREAK_1 * uc::N,
            break_2: DEFAULT_BREAK_2 * uc::N,
            advanced: None,
        };
        coupler.set_simple_r0(0.0 * uc::M, 0.1 * uc::M);
        coupler
    }
}

impl SerdeAPI for CouplerParams {
    fn init(&mut self) -> Result<(), Error> {
        self.promote_advanced();
        self.validate().map_err(Error::from)
    }
}

impl CouplerParams {
    /// Sets the simple-model zero-length offsets.  `r0_diff` is derived from the
    /// stiffness split when `a` is zero and otherwise takes [DEFAULT_R0_DIFF].
    pub fn set_simple_r0(&mut self, a: si::Length, b: si::Length) {
        self.r0_x = a;
        self.r0_y = b;
        let r0_diff = if a == si::Length::ZERO {
            let stiffness_sum =
                self.stiffness_1_newtons_per_meter + self.stiffness_2_newtons_per_meter;
            let share = if stiffness_sum > 0.0 {
                self.stiffness_1_newtons_per_meter / stiffness_sum
            } else {
                0.5
            };
            b.get::<si::meter>() / 2.0 * share
        } else {
            DEFAULT_R0_DIFF
        };
        self.r0_diff = if r0_diff.is_nan() {
            R0_DIFF_MIN
        } else {
            r0_diff.clamp(R0_DIFF_MIN, R0_DIFF_MAX)
        } * uc::M;
    }

    /// Sets slack offsets, rejecting a pair with a negative sum and leaving
    /// the previous values in place
    pub fn set_slack(&mut self, a: si::Length, b: si::Length) -> anyhow::Result<()> {
        ensure!(
            a + b >= si::Length::ZERO,
            "{}\nslack pair must not sum to less than zero",
            format_dbg!((a, b))
        );
        self.set_simple_r0(a, b);
        Ok(())
    }

    /// Sets the stiffness pair.  A zero first value splits `b` evenly.
    pub fn set_stiffness(&mut self, a: f64, b: f64) -> anyhow::Result<()> {
        ensure!(
            a + b >= 0.0,
            "{}\nstiffness pair must not sum to less than zero",
            format_dbg!((a, b))
        );
        if a == 0.0 {
            self.stiffness_1_newtons_per_meter = b / 2.0;
            self.stiffness_2_newtons_per_meter = b / 2.0;
        } else {
            self.stiffness_1_newtons_per_meter = a;
            self.stiffness_2_newtons_per_meter = b;
        }
        Ok(())
    }

    /// Sets the break pair; non-positive values fall back to their defaults
    pub fn set_break(&mut self, a: si::Force, b: si::Force) -> anyhow::Result<()> {
        ensure!(
            a + b >= si::Force::ZERO,
            "{}\nbreak pair must not sum to less than zero",
            format_dbg!((a, b))
        );
        self.break_1 = if a > si::Force::ZERO {
            a
        } else if b > si::Force::ZERO {
            b
        } else {
            DEFAULT_BREAK_1 * uc::N
        };
        self.break_2 = if b > si::Force::ZERO {
            b
        } else {
            DEFAULT_BREAK_2 * uc::N
        };
        Ok(())
    }

    /// Fills in missing advanced values from the simple model
    pub fn promote_advanced(&mut self) {
        let r0_diff = self.r0_diff;
        let stiffness = self.stiffness_1_newtons_per_meter;
        if let Some(adv) = self.advanced.as_mut() {
            adv.r0_y_tension.get_or_insert(r0_diff);
            adv.r0_y_compression.get_or_insert(r0_diff);
            adv.stiffness_tension_newtons_per_meter
                .get_or_insert(stiffness);
            adv.stiffness_compression_newtons_per_meter
                .get_or_insert(stiffness);
        }
    }

    /// Slack limits as `(compression, tension)`; compression is negative
    pub fn slack_limits(&self) -> (si::Length, si::Length) {
        if self.rigid {
            return (si::Length::ZERO, si::Length::ZERO);
        }
        match &self.advanced {
            Some(adv) => (
                -adv.r0_y_compression.unwrap_or(self.r0_diff),
                adv.r0_y_tension.unwrap_or(self.r0_diff),
            ),
            None => (-self.r0_diff, self.r0_diff),
        }
    }
}

impl Valid for CouplerParams {}

impl ObjState for CouplerParams {
    fn validate(&self) -> ValidationResults {
        let mut errors = ValidationErrors::new();
        si_chk_num_fin(&mut errors, &self.r0_x, "R0 x");
        si_chk_num_fin(&mut errors, &self.r0_y, "R0 y");
        chk_num_range(
            &mut errors,
            self.r0_diff.get::<si::meter>(),
            R0_DIFF_MIN,
            R0_DIFF_MAX,
            "R0 diff",
        );
        chk_num_gez_fin(
            &mut errors,
            self.stiffness_1_newtons_per_meter,
            "Stiffness 1",
        );
        chk_num_gez_fin(
            &mut errors,
            self.stiffness_2_newtons_per_meter,
            "Stiffness 2",
        );
        si_chk_num_gtz_fin(&mut errors, &self.break_1, "Break 1");
        si_chk_num_gtz_fin(&mut errors, &self.break_2, "Break 2");
        if let Some(adv) = &self.advanced {
            for (val, name) in [
                (adv.r0_y_tension, "Advanced r0 y tension"),
                (adv.r0_y_compression, "Advanced r0 y compression"),
            ] {
                if let Some(val) = val {
                    si_chk_num_gez_fin(&mut errors, &val, name);
                }
            }
            for (val, name) in [
                (
                    adv.stiffness_tension_newtons_per_meter,
                    "Advanced stiffness tension",
                ),
                (
                    adv.stiffness_compression_newtons_per_meter,
                    "Advanced stiffness compression",
                ),
            ] {
                if let Some(val) = val {
                    chk_num_gez_fin(&mut errors, val, name);
                }
            }
        }
        errors.make_err()
    }
}
