//! Validation of parameter objects.  Objects are either "fake" (placeholder
//! defaults that are skipped) or "real", in which case every field must pass
//! its checks before the object is used in a simulation.

use crate::imports::*;
use uom::si::{Dimension, Quantity, Units};

/// Collection of validation failures, reported together
#[derive(Debug, Default)]
pub struct ValidationErrors(Vec<anyhow::Error>);

pub type ValidationResults = Result<(), ValidationErrors>;

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, err: anyhow::Error) {
        self.0.push(err);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Appends nested errors, prefixing them with the name of the field that owns them
    pub fn append_nested(&mut self, errs: ValidationErrors, field_name: &str) {
        for err in errs.0 {
            self.0.push(err.context(format!("{field_name} is invalid")));
        }
    }

    pub fn make_err(self) -> ValidationResults {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for err in &self.0 {
            writeln!(f, "{err:#}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl From<ValidationErrors> for Error {
    fn from(errs: ValidationErrors) -> Self {
        Error::ValidationError(errs.to_string())
    }
}

/// Provides an instance that passes validation
pub trait Valid: Sized + Default {
    fn valid() -> Self {
        Default::default()
    }
}

pub trait ObjState {
    fn is_fake(&self) -> bool {
        false
    }
    fn is_real(&self) -> bool {
        !self.is_fake()
    }
    fn validate(&self) -> ValidationResults {
        Ok(())
    }
}

impl<T: ObjState> ObjState for Option<T> {
    fn is_fake(&self) -> bool {
        self.as_ref().map_or(true, |val| val.is_fake())
    }
    fn validate(&self) -> ValidationResults {
        match self {
            Some(val) => val.validate(),
            None => Ok(()),
        }
    }
}

macro_rules! early_err {
    ($errors: ident, $name: expr) => {
        if !$errors.is_empty() {
            $errors.push(anyhow!("{} validation unfinished!", $name));
            return $errors.make_err();
        }
    };
}
pub(crate) use early_err;

pub fn validate_field_real<T: ObjState>(errors: &mut ValidationErrors, field: &T, name: &str) {
    if field.is_fake() {
        errors.push(anyhow!("{name} must be real!"));
    } else if let Err(errs) = field.validate() {
        errors.append_nested(errs, name);
    }
}

fn num_chk(errors: &mut ValidationErrors, value: f64, name: &str, ok: bool, requirement: &str) {
    if !ok || value.is_nan() {
        errors.push(anyhow!("{name} = {value:?} must be {requirement}!"));
    }
}

pub fn chk_num_gtz_fin(errors: &mut ValidationErrors, value: f64, name: &str) {
    num_chk(
        errors,
        value,
        name,
        value > 0.0 && value.is_finite(),
        "greater than zero and finite",
    );
}

pub fn chk_num_gez_fin(errors: &mut ValidationErrors, value: f64, name: &str) {
    num_chk(
        errors,
        value,
        name,
        value >= 0.0 && value.is_finite(),
        "greater than or equal to zero and finite",
    );
}

pub fn chk_num_fin(errors: &mut ValidationErrors, value: f64, name: &str) {
    num_chk(errors, value, name, value.is_finite(), "finite");
}

pub fn chk_num_range(errors: &mut ValidationErrors, value: f64, lo: f64, hi: f64, name: &str) {
    num_chk(
        errors,
        value,
        name,
        (lo..=hi).contains(&value),
        &format!("between {lo} and {hi}"),
    );
}

pub fn si_chk_num_gtz_fin<D, U>(
    errors: &mut ValidationErrors,
    field: &Quantity<D, U, f64>,
    name: &str,
) where
    D: Dimension + ?Sized,
    U: Units<f64> + ?Sized,
{
    chk_num_gtz_fin(errors, field.value, name);
}

pub fn si_chk_num_gez_fin<D, U>(
    errors: &mut ValidationErrors,
    field: &Quantity<D, U, f64>,
    name: &str,
) where
    D: Dimension + ?Sized,
    U: Units<f64> + ?Sized,
{
    chk_num_gez_fin(errors, field.value, name);
}

pub fn si_chk_num_fin<D, U>(errors: &mut ValidationErrors, field: &Quantity<D, U, f64>, name: &str)
where
    D: Dimension + ?Sized,
    U: Units<f64> + ?Sized,
{
    chk_num_fin(errors, field.value, name);
}
