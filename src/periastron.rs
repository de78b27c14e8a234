//! Closest approach of a photon that turns around outside the photon sphere.

use crate::geodesic::{is_captured, HORIZON_RADIUS, PHOTON_SPHERE_RADIUS};
use std::fmt;

/// Offset added to the root before integrating up to it, so the closed
/// interval stays strictly outside the turning point.
pub const PERIASTRON_EPSILON: f64 = 1e-7;

const MAX_ITERATIONS: usize = 200;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Periastron {
    /// Root of `r / sqrt(1 - 2/r) = b`.
    pub radius: f64,
}

impl Periastron {
    /// Radius to integrate to.
    pub fn safe_radius(&self) -> f64 {
        self.radius + PERIASTRON_EPSILON
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PeriastronError {
    /// `b < sqrt(27)`: the photon has no turning point.
    Captured { b: f64 },
    /// The root does not lie in `[3, r0]`.
    NoBracket { r0: f64, b: f64 },
    NoConvergence { iterations: usize },
}

impl fmt::Display for PeriastronError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Captured { b } => write!(f, "photon with b = {b} is captured, no periastron"),
            Self::NoBracket { r0, b } => {
                write!(f, "no periastron for b = {b} between the photon sphere and r = {r0}")
            }
            Self::NoConvergence { iterations } => {
                write!(f, "periastron bisection did not converge in {iterations} iterations")
            }
        }
    }
}

impl std::error::Error for PeriastronError {}

fn turning_condition(r: f64, b: f64) -> f64 {
    r / (1.0 - HORIZON_RADIUS / r).sqrt() - b
}

/// Bisects `r / sqrt(1 - 2/r) - b` on `[3, r0]`; the function is increasing
/// there, so the bracket shrinks onto the unique root.
pub fn find_closest_approach(r0: f64, b: f64) -> Result<Periastron, PeriastronError> {
    if !b.is_finite() || is_captured(b) {
        return Err(PeriastronError::Captured { b });
    }
    let no_bracket = PeriastronError::NoBracket { r0, b };
    if !(r0 >= PHOTON_SPHERE_RADIUS) || !r0.is_finite() {
        return Err(no_bracket);
    }

    let mut lo = PHOTON_SPHERE_RADIUS;
    let mut hi = r0;
    if turning_condition(lo, b) >= 0.0 {
        return Ok(Periastron { radius: lo });
    }
    if turning_condition(hi, b) < 0.0 {
        return Err(no_bracket);
    }

    for _ in 0..MAX_ITERATIONS {
        let mid = 0.5 * (lo + hi);
        if mid <= lo || mid >= hi {
            return Ok(Periastron { radius: mid });
        }
        if turning_condition(mid, b) < 0.0 {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    Err(PeriastronError::NoConvergence {
        iterations: MAX_ITERATIONS,
    })
}
