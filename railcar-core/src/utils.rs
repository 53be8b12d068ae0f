//! Module containing miscellaneous utility functions.

use crate::imports::*;

pub const DIST_TOL: f64 = 1e-9;

/// Returns true if `val1` and `val2` are within a relative/absolute `epsilon` of each other,
/// depending on magnitude.
pub fn almost_eq(val1: f64, val2: f64, epsilon: Option<f64>) -> bool {
    let epsilon = epsilon.unwrap_or(1e-8);
    ((val2 - val1) / (val1 + val2)).abs() < epsilon || (val2 - val1).abs() < epsilon
}

/// Returns true if `vals` is sorted in ascending order
pub fn is_sorted(vals: &[f64]) -> bool {
    vals.windows(2).all(|w| w[0] <= w[1])
}

/// Linear interpolation of `y` at `x`, clamped to the end points of `xs`.
/// `xs` must be sorted and the same length as `ys`.
pub fn interp1d(x: f64, xs: &[f64], ys: &[f64]) -> anyhow::Result<f64> {
    ensure!(
        xs.len() == ys.len(),
        "{}\n`xs` and `ys` must have the same length",
        format_dbg!((xs.len(), ys.len()))
    );
    ensure!(!xs.is_empty(), "{}\n`xs` must not be empty", format_dbg!());
    ensure!(is_sorted(xs), "{}\n`xs` must be sorted", format_dbg!(xs));
    if x <= xs[0] {
        return Ok(ys[0]);
    }
    let last = xs.len() - 1;
    if x >= xs[last] {
        return Ok(ys[last]);
    }
    let idx = xs.partition_point(|&x_i| x_i <= x) - 1;
    let dx = xs[idx + 1] - xs[idx];
    if dx <= 0.0 {
        return Ok(ys[idx]);
    }
    Ok(ys[idx] + (ys[idx + 1] - ys[idx]) * (x - xs[idx]) / dx)
}

/// Fraction of the way `x` lies from `lo` to `hi`, clamped to [0, 1]
pub fn clamped_frac(x: f64, lo: f64, hi: f64) -> f64 {
    if hi <= lo {
        return if x >= hi { 1.0 } else { 0.0 };
    }
    ((x - lo) / (hi - lo)).clamp(0.0, 1.0)
}

/// Wraps an angle in radians into [-pi, pi)
pub fn wrap_angle(angle: f64) -> f64 {
    use std::f64::consts::PI;
    (angle + PI).rem_euclid(2.0 * PI) - PI
}
