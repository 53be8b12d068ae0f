//! Read-only per-tick inputs supplied by the route and the driver (or AI):
//! curvature, superelevation, heading, wind, tunnel cross section, ambient
//! temperature and the car controls.

use crate::imports::*;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, SerdeAPI)]
/// Tunnel cross section surrounding a car
pub struct TunnelSection {
    /// Free cross-sectional area of the tunnel bore
    pub area: si::Area,
    /// Wetted perimeter of the tunnel bore
    pub perimeter: si::Length,
}

impl TunnelSection {
    /// Hydraulic diameter, `4 A / P`
    pub fn hydraulic_diameter(&self) -> si::Length {
        4.0 * self.area / self.perimeter
    }
}

impl Default for TunnelSection {
    fn default() -> Self {
        // single-track high speed bore
        Self {
            area: 60.0 * uc::M2,
            perimeter: 30.0 * uc::M,
        }
    }
}

impl Valid for TunnelSection {}

impl ObjState for TunnelSection {
    fn validate(&self) -> ValidationResults {
        let mut errors = ValidationErrors::new();
        si_chk_num_gtz_fin(&mut errors, &self.area, "Tunnel area");
        si_chk_num_gtz_fin(&mut errors, &self.perimeter, "Tunnel perimeter");
        errors.make_err()
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize, SerdeAPI)]
/// Wind expressed in the same horizontal frame as car heading
pub struct Wind {
    pub speed: si::Velocity,
    /// Direction the wind blows toward
    pub direction: si::Angle,
}

impl Wind {
    /// Components of the wind along and across a car with heading `heading`, in m/s
    pub fn components(&self, heading: si::Angle) -> (f64, f64) {
        let rel = (self.direction - heading).get::<si::radian>();
        let speed = self.speed.get::<si::meter_per_second>();
        (speed * rel.cos(), speed * rel.sin())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, SerdeAPI)]
/// Route superelevation as a function of curve radius
pub struct SuperelevationTable {
    /// Curve radii, ascending
    pub radius: Vec<si::Length>,
    /// Superelevation (outer rail height above inner rail) at each radius
    pub superelevation: Vec<si::Length>,
}

#[derive(Debug, Deserialize)]
struct SuperelevationRow {
    #[serde(alias = "Radius (m)")]
    radius_meters: f64,
    #[serde(alias = "Superelevation (m)")]
    superelevation_meters: f64,
}

impl Default for SuperelevationTable {
    fn default() -> Self {
        let radius = [100.0, 300.0, 600.0, 1_000.0, 2_000.0, 4_000.0];
        let superelevation = [0.15, 0.0889, 0.0635, 0.045, 0.025, 0.0];
        Self {
            radius: radius.iter().map(|r| *r * uc::M).collect(),
            superelevation: superelevation.iter().map(|e| *e * uc::M).collect(),
        }
    }
}

impl SuperelevationTable {
    /// Superelevation at `curve_radius`, interpolated and held constant past the
    /// ends of the table.  Straight track (zero radius) has none.
    pub fn lookup(&self, curve_radius: si::Length) -> anyhow::Result<si::Length> {
        if curve_radius <= si::Length::ZERO {
            return Ok(si::Length::ZERO);
        }
        let radius: Vec<f64> = self.radius.iter().map(|r| r.get::<si::meter>()).collect();
        let elev: Vec<f64> = self
            .superelevation
            .iter()
            .map(|e| e.get::<si::meter>())
            .collect();
        Ok(interp1d(curve_radius.get::<si::meter>(), &radius, &elev)
            .with_context(|| format_dbg!(curve_radius))?
            * uc::M)
    }

    /// Loads a table from a csv file with `radius_meters` and `superelevation_meters` columns
    pub fn from_csv_file<P: AsRef<Path>>(filepath: P) -> anyhow::Result<Self> {
        let filepath = filepath.as_ref();
        let file = File::open(filepath).with_context(|| format!("Could not open {filepath:?}"))?;
        Self::from_csv_reader(file)
    }

    pub fn from_csv_reader<R: std::io::Read>(rdr: R) -> anyhow::Result<Self> {
        let mut reader = csv::Reader::from_reader(rdr);
        let mut table = Self {
            radius: vec![],
            superelevation: vec![],
        };
        for result in reader.deserialize() {
            let row: SuperelevationRow = result?;
            table.radius.push(row.radius_meters * uc::M);
            table.superelevation.push(row.superelevation_meters * uc::M);
        }
        table.validate().map_err(Error::from)?;
        Ok(table)
    }
}

impl Valid for SuperelevationTable {}

impl ObjState for SuperelevationTable {
    fn validate(&self) -> ValidationResults {
        let mut errors = ValidationErrors::new();
        if self.radius.is_empty() {
            errors.push(anyhow!("Superelevation table must not be empty!"));
        }
        if self.radius.len() != self.superelevation.len() {
            errors.push(anyhow!(
                "Superelevation table radius and superelevation lengths differ: {} vs {}",
                self.radius.len(),
                self.superelevation.len()
            ));
        }
        early_err!(errors, "Superelevation table");
        for (idx, (radius, elev)) in self.radius.iter().zip(&self.superelevation).enumerate() {
            si_chk_num_gtz_fin(&mut errors, radius, &format!("Radius {idx}"));
            si_chk_num_gez_fin(&mut errors, elev, &format!("Superelevation {idx}"));
        }
        let radius: Vec<f64> = self.radius.iter().map(|r| r.value).collect();
        if !is_sorted(&radius) {
            errors.push(anyhow!("Superelevation table radii must be ascending!"));
        }
        errors.make_err()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, SerdeAPI)]
/// Route and weather inputs for one car for one tick
pub struct TrackSnapshot {
    /// Curve radius, zero on straight track
    pub curve_radius: si::Length,
    /// Superelevation supplied by the route; looked up from a
    /// [SuperelevationTable] when `None`
    pub superelevation: Option<si::Length>,
    /// Yaw of the car's forward vector
    pub heading: si::Angle,
    pub wind: Wind,
    pub tunnel: Option<TunnelSection>,
    pub temp_ambient: si::ThermodynamicTemperature,
    /// Wheel/rail adhesion coefficient
    pub rail_adhesion: si::Ratio,
}

impl Default for TrackSnapshot {
    fn default() -> Self {
        Self {
            curve_radius: si::Length::ZERO,
            superelevation: None,
            heading: si::Angle::ZERO,
            wind: Wind::default(),
            tunnel: None,
            temp_ambient: uc::celsius(15.0),
            rail_adhesion: 0.3 * uc::R,
        }
    }
}

impl TrackSnapshot {
    pub fn on_curve(&self) -> bool {
        self.curve_radius > si::Length::ZERO
    }
}

impl Valid for TrackSnapshot {}

impl ObjState for TrackSnapshot {
    fn validate(&self) -> ValidationResults {
        let mut errors = ValidationErrors::new();
        si_chk_num_gez_fin(&mut errors, &self.curve_radius, "Curve radius");
        if let Some(elev) = &self.superelevation {
            si_chk_num_gez_fin(&mut errors, elev, "Superelevation");
        }
        si_chk_num_fin(&mut errors, &self.heading, "Heading");
        si_chk_num_gez_fin(&mut errors, &self.wind.speed, "Wind speed");
        if let Some(tunnel) = &self.tunnel {
            validate_field_real(&mut errors, tunnel, "Tunnel");
        }
        chk_num_range(
            &mut errors,
            self.rail_adhesion.get::<si::ratio>(),
            0.0,
            1.0,
            "Rail adhesion",
        );
        errors.make_err()
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize, SerdeAPI)]
/// Control inputs applied to one car for one tick
pub struct CarControls {
    /// Requested brake shoe force
    pub brake_force_cmd: si::Force,
    /// Throttle setting in [0, 1]
    pub throttle: si::Ratio,
    /// Wheel slip flag reported by the traction/adhesion subsystem
    pub wheel_slip: bool,
    /// Tractive force at the wheel rim
    pub traction_force: si::Force,
}
