//! Deflection integral: the angular sweep of a photon between two radii.
//!
//! `integrate(r0, r1, b) = ∫ dr / (r² sqrt(1/b² - 1/r² + 2/r³))` from `r0` to `r1`,
//! positive when `r0 < r1`. The closed interval must stay strictly outside the
//! photon's turning point; asking otherwise is a caller bug and is reported as
//! [`IntegrationError::Singular`].

mod adaptive;
mod fixed_step;
mod runge_kutta;
mod workspace;

pub use self::adaptive::AdaptiveQuadrature;
pub use self::fixed_step::FixedStep;
pub use self::runge_kutta::RungeKuttaFehlberg;
pub use self::workspace::{Interval, Scratch, Workspace};

use crate::geodesic::{radial_potential, turning_point_inverse_radius};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum IntegrationError {
    /// The requested interval touches or crosses the turning point (or is not
    /// a valid radial interval at all).
    Singular { r0: f64, r1: f64, b: f64 },
    /// The method ran out of its subdivision or step budget.
    NoConvergence {
        method: IntegrationMethod,
        estimated_error: f64,
    },
}

impl fmt::Display for IntegrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Singular { r0, r1, b } => write!(
                f,
                "deflection integral over [{r0}, {r1}] with b = {b} touches the turning point"
            ),
            Self::NoConvergence {
                method,
                estimated_error,
            } => write!(
                f,
                "{} integration did not converge (error estimate {estimated_error:e})",
                method.label()
            ),
        }
    }
}

impl std::error::Error for IntegrationError {}

pub trait DeflectionIntegrator {
    fn integrate(&mut self, r0: f64, r1: f64, b: f64) -> Result<f64, IntegrationError>;
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum IntegrationMethod {
    FixedStep,
    Adaptive,
    RungeKutta,
}

impl Default for IntegrationMethod {
    fn default() -> Self {
        Self::Adaptive
    }
}

impl IntegrationMethod {
    pub fn label(self) -> &'static str {
        match self {
            Self::FixedStep => "fixed_step",
            Self::Adaptive => "adaptive",
            Self::RungeKutta => "runge_kutta",
        }
    }
}

/// The integrator a render worker owns for its whole stripe.
pub enum Integrator {
    FixedStep(FixedStep),
    Adaptive(AdaptiveQuadrature),
    RungeKutta(RungeKuttaFehlberg),
}

impl Integrator {
    pub fn new(method: IntegrationMethod) -> Self {
        match method {
            IntegrationMethod::FixedStep => Self::FixedStep(FixedStep::default()),
            IntegrationMethod::Adaptive => Self::Adaptive(AdaptiveQuadrature::default()),
            IntegrationMethod::RungeKutta => Self::RungeKutta(RungeKuttaFehlberg::default()),
        }
    }

    pub fn method(&self) -> IntegrationMethod {
        match self {
            Self::FixedStep(_) => IntegrationMethod::FixedStep,
            Self::Adaptive(_) => IntegrationMethod::Adaptive,
            Self::RungeKutta(_) => IntegrationMethod::RungeKutta,
        }
    }
}

impl DeflectionIntegrator for Integrator {
    fn integrate(&mut self, r0: f64, r1: f64, b: f64) -> Result<f64, IntegrationError> {
        match self {
            Self::FixedStep(inner) => inner.integrate(r0, r1, b),
            Self::Adaptive(inner) => inner.integrate(r0, r1, b),
            Self::RungeKutta(inner) => inner.integrate(r0, r1, b),
        }
    }
}

/// Validated, ordered integration bounds shared by every method.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Bounds {
    /// Smaller radius.
    pub(crate) near: f64,
    /// Larger radius.
    pub(crate) far: f64,
    /// `+1` when integrating outward, `-1` inward.
    pub(crate) sign: f64,
    /// Inverse radius of the turning point, if the photon has one.
    pub(crate) turning_u: Option<f64>,
}

impl Bounds {
    /// `Ok(None)` for an empty interval.
    pub(crate) fn check(r0: f64, r1: f64, b: f64) -> Result<Option<Self>, IntegrationError> {
        let singular = IntegrationError::Singular { r0, r1, b };
        if !(r0.is_finite() && r1.is_finite() && b.is_finite()) || r0 <= 0.0 || r1 <= 0.0 || b < 0.0
        {
            return Err(singular);
        }

        let (near, far, sign) = if r0 <= r1 {
            (r0, r1, 1.0)
        } else {
            (r1, r0, -1.0)
        };

        let turning_u = turning_point_inverse_radius(b);
        if let Some(u_p) = turning_u {
            if 1.0 / near >= u_p {
                return Err(singular);
            }
        }

        if near == far {
            return Ok(None);
        }
        Ok(Some(Self {
            near,
            far,
            sign,
            turning_u,
        }))
    }

    /// Limits and integrand of the unsigned sweep in a variable that keeps the
    /// integrand bounded: `u = 1/r`, or `u = u_p - s²` when the photon turns.
    pub(crate) fn regularized(&self, b: f64) -> (f64, f64, impl Fn(f64) -> f64 + Copy) {
        let u_low = 1.0 / self.far;
        let u_high = 1.0 / self.near;
        let turning_u = self.turning_u;
        let (lower, upper) = match turning_u {
            None => (u_low, u_high),
            Some(u_p) => ((u_p - u_high).sqrt(), (u_p - u_low).sqrt()),
        };
        let integrand = move |x: f64| match turning_u {
            None => 1.0 / radial_potential(x, b).sqrt(),
            Some(u_p) => 2.0 / reduced_potential(u_p - x * x, u_p).sqrt(),
        };
        (lower, upper, integrand)
    }
}

/// `radial_potential(u) / (u_p - u)` expanded so it never cancels near `u_p`.
fn reduced_potential(u: f64, u_p: f64) -> f64 {
    (u + u_p) - 2.0 * (u * u + u * u_p + u_p * u_p)
}
