//! Locates where a photon pierces the disk plane (`y = 0`) and samples the
//! disk color ramp there.

use cgmath::{InnerSpace, Vector3};
use std::fmt;

use crate::geodesic::rotate_in_plane;
use crate::integrate::{DeflectionIntegrator, IntegrationError};
use crate::scene::{BlackHole, Color};

const RAMP_SLACK: f64 = 1e-9;

/// Radial step control for the crossing search.
///
/// Steps are `base` far from the plane and shrink linearly once the photon is
/// within `refine_band` of it, never below `min_step`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DiskStepping {
    pub base: f64,
    pub min_step: f64,
    pub refine_band: f64,
}

impl Default for DiskStepping {
    fn default() -> Self {
        Self {
            base: 0.05,
            min_step: 0.002,
            refine_band: 1.0,
        }
    }
}

impl DiskStepping {
    pub fn step_at(&self, height: f64) -> f64 {
        (self.base * (height.abs() / self.refine_band).min(1.0)).max(self.min_step)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DiskError {
    Integration(IntegrationError),
    /// The start position has no direction to rescale.
    DegenerateStart,
    /// The located radius lies outside the annulus.
    RampIndexOutOfRange { radius: f64, t: f64 },
}

impl fmt::Display for DiskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integration(err) => write!(f, "disk crossing search failed: {err}"),
            Self::DegenerateStart => write!(f, "disk crossing search started at the origin"),
            Self::RampIndexOutOfRange { radius, t } => write!(
                f,
                "disk sample at r = {radius} maps to ramp coordinate {t} outside [0, 1]"
            ),
        }
    }
}

impl std::error::Error for DiskError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Integration(err) => Some(err),
            _ => None,
        }
    }
}

impl From<IntegrationError> for DiskError {
    fn from(value: IntegrationError) -> Self {
        Self::Integration(value)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DiskCrossing {
    /// Sample closest to the disk plane.
    pub position: Vector3<f64>,
    pub radius: f64,
    /// Whether the vertical coordinate actually changed sign.
    pub crossed: bool,
    pub steps: usize,
}

/// Walks the photon from `r_from` toward `r_to`, rotating `start` by the
/// accumulated deflection and rescaling it to the current radius.
pub fn locate_crossing<I: DeflectionIntegrator + ?Sized>(
    start: Vector3<f64>,
    b: f64,
    r_from: f64,
    r_to: f64,
    axis: Vector3<f64>,
    integrator: &mut I,
    stepping: &DiskStepping,
) -> Result<DiskCrossing, DiskError> {
    let length = start.magnitude();
    if !(length > 0.0) || !length.is_finite() {
        return Err(DiskError::DegenerateStart);
    }
    let start = start * (r_from / length);
    let direction = if r_to >= r_from { 1.0 } else { -1.0 };

    let mut r = r_from;
    let mut sweep = 0.0;
    let mut position = start;
    let mut closest = start;
    let mut steps = 0;
    let mut crossed = false;

    while direction * (r_to - r) > 0.0 {
        let mut r_next = r + direction * stepping.step_at(position.y);
        if direction * (r_next - r_to) >= 0.0 {
            r_next = r_to;
        }
        sweep += integrator.integrate(r, r_next, b)?.abs();

        let previous = position;
        position = rotate_in_plane(start, sweep, axis).normalize_to(r_next);
        r = r_next;
        steps += 1;

        if position.y.abs() < closest.y.abs() {
            closest = position;
        }
        if position.y * previous.y < 0.0 {
            crossed = true;
            break;
        }
    }

    Ok(DiskCrossing {
        position: closest,
        radius: closest.magnitude(),
        crossed,
        steps,
    })
}

/// Ramp color at a radius inside the annulus.
pub fn ramp_color(radius: f64, blackhole: &BlackHole) -> Result<Color, DiskError> {
    let inner = blackhole.disk_inner();
    let t = (radius - inner) / (blackhole.disk_outer() - inner);
    if !(t >= -RAMP_SLACK && t <= 1.0 + RAMP_SLACK) {
        return Err(DiskError::RampIndexOutOfRange { radius, t });
    }
    let ramp = blackhole.ramp();
    let index = (t.clamp(0.0, 1.0) * (ramp.len() - 1) as f64).round() as usize;
    ramp.get(index)
        .ok_or(DiskError::RampIndexOutOfRange { radius, t })
}

/// Disk color where the photon comes closest to the plane between `r_from`
/// and `r_to`.
#[allow(clippy::too_many_arguments)]
pub fn sample_disk<I: DeflectionIntegrator + ?Sized>(
    start: Vector3<f64>,
    b: f64,
    r_from: f64,
    r_to: f64,
    axis: Vector3<f64>,
    blackhole: &BlackHole,
    integrator: &mut I,
    stepping: &DiskStepping,
) -> Result<Color, DiskError> {
    let crossing = locate_crossing(start, b, r_from, r_to, axis, integrator, stepping)?;
    ramp_color(crossing.radius, blackhole)
}
