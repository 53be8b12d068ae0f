use super::resistance::LowSpeedModel;
use super::traction::TractionKind;
use crate::coupler::{CouplerParams, DEFAULT_TRACK_PLAY};
use crate::imports::*;

/// Unbalanced superelevation allowed on top of the installed superelevation
/// when computing the maximum safe curve speed.  Zero keeps the maximum safe
/// speed at the equal-load speed.
pub const DEFAULT_UNBALANCED_SUPERELEVATION: f64 = 0.0;
/// Derating of the Davis C term for trailing locomotives and detached tenders
pub const DEFAULT_TRAIL_LOCO_RESISTANCE_FACTOR: f64 = 0.2083;
/// Side area per unit body length used when no side area is given
const DEFAULT_SIDE_HEIGHT: f64 = 3.9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, SerdeAPI)]
/// Lengths of a car body that govern coupler angles on curves
pub struct CarGeometry {
    /// Body length
    pub length: si::Length,
    /// Distance between bogie centres
    pub bogie_distance: si::Length,
    /// Length over coupler faces
    pub coupler_face_length: si::Length,
    /// Rigid wheelbase of one bogie
    pub rigid_wheelbase: si::Length,
}

impl CarGeometry {
    /// Distance from a bogie centre to the coupler face
    pub fn overhang(&self) -> si::Length {
        (self.coupler_face_length - self.bogie_distance) / 2.0
    }
}

impl Default for CarGeometry {
    fn default() -> Self {
        Self {
            length: 20.0 * uc::M,
            bogie_distance: 14.0 * uc::M,
            coupler_face_length: 20.0 * uc::M,
            rigid_wheelbase: 1.8 * uc::M,
        }
    }
}

impl Valid for CarGeometry {}

impl ObjState for CarGeometry {
    fn validate(&self) -> ValidationResults {
        let mut errors = ValidationErrors::new();
        si_chk_num_gtz_fin(&mut errors, &self.length, "Length");
        si_chk_num_gtz_fin(&mut errors, &self.bogie_distance, "Bogie distance");
        si_chk_num_gtz_fin(&mut errors, &self.coupler_face_length, "Coupler face length");
        si_chk_num_gtz_fin(&mut errors, &self.rigid_wheelbase, "Rigid wheelbase");
        early_err!(errors, "Car geometry");
        if self.bogie_distance > self.coupler_face_length {
            errors.push(anyhow!(
                "{}\nbogie distance must not exceed coupler face length",
                format_dbg!((self.bogie_distance, self.coupler_face_length))
            ));
        }
        errors.make_err()
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize, SerdeAPI)]
/// Davis running resistance coefficients, `A + B v + C v²`
pub struct DavisCoeffs {
    pub a: si::Force,
    pub b: si::MassRate,
    pub c: si::LinearMassDensity,
}

impl DavisCoeffs {
    /// Coefficients from the Davis (1926) formula,
    /// `R[lbf] = 1.3 W + 29 n + 0.045 W V + 0.0005 A V²` with `W` in short
    /// tons, `n` axles, `V` in mph and `A` the frontal area in ft²
    pub fn davis_1926(mass: si::Mass, axle_count: u8, frontal_area: si::Area) -> Self {
        let tons = mass.get::<si::ton_short>();
        let area_ft2 = frontal_area.value / uc::FT2.value;
        let lbf = uc::LBF.value;
        let mph = uc::MPH.value;
        Self {
            a: (1.3 * tons + 29.0 * axle_count as f64) * lbf * uc::N,
            b: 0.045 * tons * lbf / mph * uc::KGPS,
            c: 0.0005 * area_ft2 * lbf / (mph * mph) * uc::KGPM,
        }
    }

    /// Evaluates `A tf + v (B + v C c_factor)` in newtons for speed `v` in m/s
    pub fn eval(&self, speed: f64, temp_factor: f64, c_factor: f64) -> f64 {
        let a = self.a.get::<si::newton>();
        let b = self.b.get::<si::kilogram_per_second>();
        let c = self.c.get::<si::kilogram_per_meter>();
        a * temp_factor + speed * (b + speed * c * c_factor)
    }

    /// Linear interpolation between `self` and `other`
    pub fn lerp(&self, other: &Self, frac: f64) -> Self {
        Self {
            a: self.a + (other.a - self.a) * frac,
            b: self.b + (other.b - self.b) * frac,
            c: self.c + (other.c - self.c) * frac,
        }
    }
}

impl Valid for DavisCoeffs {}

impl ObjState for DavisCoeffs {
    fn validate(&self) -> ValidationResults {
        let mut errors = ValidationErrors::new();
        si_chk_num_gez_fin(&mut errors, &self.a, "Davis A");
        si_chk_num_gez_fin(&mut errors, &self.b, "Davis B");
        si_chk_num_gez_fin(&mut errors, &self.c, "Davis C");
        errors.make_err()
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, SerdeAPI)]
/// Wheel bearing construction, selects the starting friction table
pub enum BearingType {
    #[default]
    Roller,
    LowTorqueRoller,
    Grease,
    Friction,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, SerdeAPI)]
/// Wheel flange parameters for the flange-climb criterion
pub struct FlangeParams {
    /// Maximum flange contact angle
    pub angle: si::Angle,
    /// Wheel/rail friction coefficient at the flange contact
    pub friction: f64,
    /// Flange height that has to be climbed
    pub length: si::Length,
}

impl Default for FlangeParams {
    fn default() -> Self {
        Self {
            angle: 70.0 * uc::DEG,
            friction: 0.5,
            length: 0.0254 * uc::M,
        }
    }
}

impl FlangeParams {
    /// Nadal limit on the lateral/vertical force ratio
    pub fn nadal_limit(&self) -> f64 {
        let tan_beta = self.angle.get::<si::radian>().tan();
        (tan_beta - self.friction) / (1.0 + self.friction * tan_beta)
    }
}

impl Valid for FlangeParams {}

impl ObjState for FlangeParams {
    fn validate(&self) -> ValidationResults {
        let mut errors = ValidationErrors::new();
        chk_num_range(
            &mut errors,
            self.angle.get::<si::degree>(),
            1.0,
            89.0,
            "Flange angle (deg)",
        );
        chk_num_gez_fin(&mut errors, self.friction, "Flange friction");
        si_chk_num_gtz_fin(&mut errors, &self.length, "Flange length");
        errors.make_err()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, SerdeAPI)]
/// Measured brake shoe friction against speed
pub struct FrictionCurve {
    /// Speeds, ascending and starting at zero
    pub speed: Vec<si::Velocity>,
    pub friction: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct FrictionRow {
    #[serde(alias = "Speed (m/s)")]
    speed_meters_per_second: f64,
    #[serde(alias = "Friction")]
    friction: f64,
}

impl Default for FrictionCurve {
    fn default() -> Self {
        // cast iron shoe, sampled from the default empirical curve
        let kph = [0.0, 20.0, 40.0, 60.0, 80.0, 100.0, 120.0];
        Self {
            speed: kph.iter().map(|v| *v * uc::KPH).collect(),
            friction: kph.iter().map(|v| 7.6 / (v + 17.5) + 0.07).collect(),
        }
    }
}

impl FrictionCurve {
    /// Friction at `speed` relative to friction at standstill
    pub fn normalized(&self, speed: si::Velocity) -> anyhow::Result<f64> {
        let speeds: Vec<f64> = self.speed.iter().map(|v| v.value).collect();
        let friction = interp1d(speed.value.abs(), &speeds, &self.friction)?;
        let friction_zero = interp1d(0.0, &speeds, &self.friction)?;
        ensure!(
            friction_zero > 0.0,
            "{}\nzero-speed friction must be positive",
            format_dbg!(friction_zero)
        );
        Ok(friction / friction_zero)
    }

    /// Loads a curve from a csv file with `speed_meters_per_second` and `friction` columns
    pub fn from_csv_file<P: AsRef<Path>>(filepath: P) -> anyhow::Result<Self> {
        let filepath = filepath.as_ref();
        let file = File::open(filepath).with_context(|| format!("Could not open {filepath:?}"))?;
        Self::from_csv_reader(file)
    }

    pub fn from_csv_reader<R: std::io::Read>(rdr: R) -> anyhow::Result<Self> {
        let mut reader = csv::Reader::from_reader(rdr);
        let mut curve = Self {
            speed: vec![],
            friction: vec![],
        };
        for result in reader.deserialize() {
            let row: FrictionRow = result?;
            curve.speed.push(row.speed_meters_per_second * uc::MPS);
            curve.friction.push(row.friction);
        }
        curve.validate().map_err(Error::from)?;
        Ok(curve)
    }
}

impl Valid for FrictionCurve {}

impl ObjState for FrictionCurve {
    fn validate(&self) -> ValidationResults {
        let mut errors = ValidationErrors::new();
        if self.speed.is_empty() || self.speed.len() != self.friction.len() {
            errors.push(anyhow!(
                "Friction curve must have matching, non-empty speed and friction vecs: {} vs {}",
                self.speed.len(),
                self.friction.len()
            ));
        }
        early_err!(errors, "Friction curve");
        let speeds: Vec<f64> = self.speed.iter().map(|v| v.value).collect();
        if !is_sorted(&speeds) {
            errors.push(anyhow!("Friction curve speeds must be ascending!"));
        }
        for (idx, friction) in self.friction.iter().enumerate() {
            chk_num_gez_fin(&mut errors, *friction, &format!("Friction {idx}"));
        }
        chk_num_gtz_fin(&mut errors, self.friction[0], "Zero-speed friction");
        errors.make_err()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, SerdeAPI)]
pub struct BrakeParams {
    /// Maximum brake shoe force
    pub force_max: si::Force,
    /// Measured friction curve; the default empirical curve is used if `None`
    pub friction_curve: Option<FrictionCurve>,
}

impl Default for BrakeParams {
    fn default() -> Self {
        Self {
            force_max: 100.0 * uc::KN,
            friction_curve: None,
        }
    }
}

impl Valid for BrakeParams {}

impl ObjState for BrakeParams {
    fn validate(&self) -> ValidationResults {
        let mut errors = ValidationErrors::new();
        si_chk_num_gez_fin(&mut errors, &self.force_max, "Brake force max");
        if let Some(curve) = &self.friction_curve {
            validate_field_real(&mut errors, curve, "Friction curve");
        }
        errors.make_err()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, SerdeAPI)]
/// Fully resolved, validated parameters of one car
pub struct CarParams {
    /// Empty mass
    pub mass_empty: si::Mass,
    /// Maximum freight mass carried on top of `mass_empty`
    pub mass_freight_max: si::Mass,
    pub geometry: CarGeometry,
    pub gauge: si::Length,
    pub axle_count: u8,
    pub wheel_count: u8,
    pub bogie_count: u8,
    /// Height of the centre of gravity above rail
    pub cg_height: si::Length,
    pub frontal_area: si::Area,
    pub side_area: si::Area,
    pub drag_coeff: f64,
    /// Davis coefficients when empty
    pub davis_empty: DavisCoeffs,
    /// Davis coefficients at `mass_freight_max`
    pub davis_loaded: DavisCoeffs,
    pub low_speed: LowSpeedModel,
    pub bearing_type: BearingType,
    pub trail_loco_resistance_factor: f64,
    pub traction: TractionKind,
    pub flange: FlangeParams,
    pub brakes: BrakeParams,
    pub front_coupler: CouplerParams,
    pub rear_coupler: CouplerParams,
    pub unbalanced_superelevation: si::Length,
    pub track_play: si::Length,
}

impl Default for CarParams {
    fn default() -> Self {
        CarBuilder::default().resolve()
    }
}

impl Valid for CarParams {}

impl ObjState for CarParams {
    fn validate(&self) -> ValidationResults {
        let mut errors = ValidationErrors::new();
        si_chk_num_gtz_fin(&mut errors, &self.mass_empty, "Mass empty");
        si_chk_num_gez_fin(&mut errors, &self.mass_freight_max, "Mass freight max");
        validate_field_real(&mut errors, &self.geometry, "Geometry");
        si_chk_num_gtz_fin(&mut errors, &self.gauge, "Gauge");
        for (count, name) in [
            (self.axle_count, "Axle count"),
            (self.wheel_count, "Wheel count"),
            (self.bogie_count, "Bogie count"),
        ] {
            if count == 0 {
                errors.push(anyhow!("{name} must be greater than zero!"));
            }
        }
        si_chk_num_gtz_fin(&mut errors, &self.cg_height, "CG height");
        si_chk_num_gez_fin(&mut errors, &self.frontal_area, "Frontal area");
        si_chk_num_gez_fin(&mut errors, &self.side_area, "Side area");
        chk_num_gez_fin(&mut errors, self.drag_coeff, "Drag coefficient");
        validate_field_real(&mut errors, &self.davis_empty, "Davis empty");
        validate_field_real(&mut errors, &self.davis_loaded, "Davis loaded");
        validate_field_real(&mut errors, &self.low_speed, "Low speed model");
        chk_num_gez_fin(
            &mut errors,
            self.trail_loco_resistance_factor,
            "Trail loco resistance factor",
        );
        validate_field_real(&mut errors, &self.flange, "Flange");
        validate_field_real(&mut errors, &self.brakes, "Brakes");
        validate_field_real(&mut errors, &self.front_coupler, "Front coupler");
        validate_field_real(&mut errors, &self.rear_coupler, "Rear coupler");
        si_chk_num_gez_fin(
            &mut errors,
            &self.unbalanced_superelevation,
            "Unbalanced superelevation",
        );
        si_chk_num_gez_fin(&mut errors, &self.track_play, "Track play");
        errors.make_err()
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize, SerdeAPI)]
#[serde(default)]
/// Raw car definition as parsed from vehicle data.  Every field except mass
/// and geometry may be omitted and is resolved to a default by
/// [CarBuilder::build].
pub struct CarBuilder {
    pub mass_empty: Option<si::Mass>,
    pub mass_freight_max: Option<si::Mass>,
    pub geometry: Option<CarGeometry>,
    pub gauge: Option<si::Length>,
    pub axle_count: Option<u8>,
    pub wheel_count: Option<u8>,
    pub bogie_count: Option<u8>,
    pub cg_height: Option<si::Length>,
    pub rigid_wheelbase: Option<si::Length>,
    pub frontal_area: Option<si::Area>,
    pub side_area: Option<si::Area>,
    pub drag_coeff: Option<f64>,
    pub davis_empty: Option<DavisCoeffs>,
    pub davis_loaded: Option<DavisCoeffs>,
    pub low_speed: Option<LowSpeedModel>,
    pub bearing_type: Option<BearingType>,
    pub trail_loco_resistance_factor: Option<f64>,
    pub traction: Option<TractionKind>,
    pub flange: Option<FlangeParams>,
    pub brakes: Option<BrakeParams>,
    pub front_coupler: Option<CouplerParams>,
    pub rear_coupler: Option<CouplerParams>,
    pub unbalanced_superelevation: Option<si::Length>,
    pub track_play: Option<si::Length>,
}

impl CarBuilder {
    /// Builder with the two required values set
    pub fn new(mass_empty: si::Mass, geometry: CarGeometry) -> Self {
        Self {
            mass_empty: Some(mass_empty),
            geometry: Some(geometry),
            ..Default::default()
        }
    }

    /// Checks that the required values are present, resolves defaults and
    /// validates the result
    pub fn build(&self) -> anyhow::Result<CarParams> {
        if self.mass_empty.is_none() {
            bail!(Error::InitError("car mass is required".into()));
        }
        if self.geometry.is_none() {
            bail!(Error::InitError("car geometry is required".into()));
        }
        let params = self.resolve();
        params
            .validate()
            .map_err(Error::from)
            .with_context(|| format_dbg!())?;
        Ok(params)
    }

    /// Fills every omitted value with its default without validating
    fn resolve(&self) -> CarParams {
        let mass_empty = self.mass_empty.unwrap_or(40.0 * uc::TONNE);
        let mut geometry = self.geometry.unwrap_or_default();
        if let Some(rigid_wheelbase) = self.rigid_wheelbase {
            geometry.rigid_wheelbase = rigid_wheelbase;
        }
        let mass_freight_max = self.mass_freight_max.unwrap_or(si::Mass::ZERO);
        let axle_count = self.axle_count.unwrap_or(4);
        let frontal_area = self.frontal_area.unwrap_or(10.0 * uc::M2);

        let davis_empty = match self.davis_empty {
            Some(davis) => davis,
            None => {
                #[cfg(feature = "logging")]
                log::info!(
                    "Davis coefficients not supplied, deriving from the Davis (1926) formula"
                );
                DavisCoeffs::davis_1926(mass_empty, axle_count, frontal_area)
            }
        };
        let davis_loaded = match self.davis_loaded {
            Some(davis) => davis,
            None if self.davis_empty.is_some() => davis_empty,
            None => {
                DavisCoeffs::davis_1926(mass_empty + mass_freight_max, axle_count, frontal_area)
            }
        };

        let mut front_coupler = self.front_coupler.unwrap_or_default();
        let mut rear_coupler = self.rear_coupler.unwrap_or_default();
        front_coupler.promote_advanced();
        rear_coupler.promote_advanced();

        CarParams {
            mass_empty,
            mass_freight_max,
            geometry,
            gauge: self.gauge.unwrap_or(1.435 * uc::M),
            axle_count,
            wheel_count: self.wheel_count.unwrap_or(axle_count.saturating_mul(2)),
            bogie_count: self.bogie_count.unwrap_or(2),
            cg_height: self.cg_height.unwrap_or(1.8 * uc::M),
            frontal_area,
            side_area: self
                .side_area
                .unwrap_or(geometry.length * DEFAULT_SIDE_HEIGHT * uc::M),
            drag_coeff: self.drag_coeff.unwrap_or(0.8),
            davis_empty,
            davis_loaded,
            low_speed: self.low_speed.unwrap_or_default(),
            bearing_type: self.bearing_type.unwrap_or_default(),
            trail_loco_resistance_factor: self
                .trail_loco_resistance_factor
                .unwrap_or(DEFAULT_TRAIL_LOCO_RESISTANCE_FACTOR),
            traction: self.traction.unwrap_or_default(),
            flange: self.flange.unwrap_or_default(),
            brakes: self.brakes.clone().unwrap_or_default(),
            front_coupler,
            rear_coupler,
            unbalanced_superelevation: self
                .unbalanced_superelevation
                .unwrap_or(DEFAULT_UNBALANCED_SUPERELEVATION * uc::M),
            track_play: self.track_play.unwrap_or(DEFAULT_TRACK_PLAY * uc::M),
        }
    }
}
