//! Per-ray classification: a camera ray is captured, crosses the disk, or
//! escapes to the sky.
//!
//! Every ray is reduced to its orbit plane (spanned by the camera offset and
//! the ray direction) and its impact parameter `b`. The photon's position at
//! any radius is then the camera offset rotated about the plane normal by the
//! deflection accumulated so far, so the whole trajectory is a handful of 1-D
//! integrals rather than a full ODE solve.

use cgmath::{InnerSpace, Vector3};
use std::f64::consts::PI;
use std::fmt;

use crate::disk::{sample_disk, DiskError, DiskStepping};
use crate::geodesic::{
    impact_parameter, is_captured, rotate_in_plane, wrap_angle, INTEGRATION_LIMIT,
};
use crate::integrate::{DeflectionIntegrator, IntegrationError};
use crate::periastron::{find_closest_approach, PeriastronError};
use crate::scene::{BlackHole, Color, SceneError, Skybox};
use crate::sky::{sample_sky, SkyError};

#[cfg(test)]
mod tests;

// ─── Errors ─────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Severity {
    /// A precondition was broken; the ray should never have got here.
    ContractViolation,
    /// A numerical method ran out of budget.
    NonConvergence,
    /// The geometry is valid but has no defined color.
    Unresolved,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TraceError {
    Scene(SceneError),
    DegenerateDirection,
    Integration(IntegrationError),
    Periastron(PeriastronError),
    Disk(DiskError),
    Sky(SkyError),
    /// The photon turns around inside the disk's inner edge.
    InnerEdgePassage { periastron: f64, disk_inner: f64 },
}

impl TraceError {
    pub fn severity(&self) -> Severity {
        match self {
            Self::Integration(IntegrationError::NoConvergence { .. })
            | Self::Periastron(PeriastronError::NoConvergence { .. })
            | Self::Disk(DiskError::Integration(IntegrationError::NoConvergence { .. })) => {
                Severity::NonConvergence
            }
            Self::InnerEdgePassage { .. } => Severity::Unresolved,
            _ => Severity::ContractViolation,
        }
    }
}

impl fmt::Display for TraceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scene(err) => write!(f, "{err}"),
            Self::DegenerateDirection => write!(f, "ray direction is zero or not finite"),
            Self::Integration(err) => write!(f, "{err}"),
            Self::Periastron(err) => write!(f, "{err}"),
            Self::Disk(err) => write!(f, "{err}"),
            Self::Sky(err) => write!(f, "{err}"),
            Self::InnerEdgePassage {
                periastron,
                disk_inner,
            } => write!(
                f,
                "photon turns at r = {periastron}, inside the disk inner edge {disk_inner}"
            ),
        }
    }
}

impl std::error::Error for TraceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Scene(err) => Some(err),
            Self::Integration(err) => Some(err),
            Self::Periastron(err) => Some(err),
            Self::Disk(err) => Some(err),
            Self::Sky(err) => Some(err),
            Self::DegenerateDirection | Self::InnerEdgePassage { .. } => None,
        }
    }
}

impl From<SceneError> for TraceError {
    fn from(value: SceneError) -> Self {
        Self::Scene(value)
    }
}

impl From<IntegrationError> for TraceError {
    fn from(value: IntegrationError) -> Self {
        Self::Integration(value)
    }
}

impl From<PeriastronError> for TraceError {
    fn from(value: PeriastronError) -> Self {
        Self::Periastron(value)
    }
}

impl From<DiskError> for TraceError {
    fn from(value: DiskError) -> Self {
        Self::Disk(value)
    }
}

impl From<SkyError> for TraceError {
    fn from(value: SkyError) -> Self {
        Self::Sky(value)
    }
}

// ─── Ray geometry ───────────────────────────────────────────────────────────

/// Orbit-plane quantities of one camera ray, fixed for its whole flight.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayGeometry {
    /// Camera position relative to the black hole.
    pub offset: Vector3<f64>,
    /// Unit normal of the orbit plane.
    pub axis: Vector3<f64>,
    /// Angle between the ray and the direction to the black hole.
    pub theta: f64,
    pub r0: f64,
    pub b: f64,
}

impl RayGeometry {
    pub fn new(
        direction: Vector3<f64>,
        blackhole: &BlackHole,
        camera_position: Vector3<f64>,
    ) -> Result<Self, TraceError> {
        blackhole.check_camera(camera_position)?;
        let length = direction.magnitude();
        if !(length > 0.0) || !length.is_finite() {
            return Err(TraceError::DegenerateDirection);
        }

        let offset = camera_position - blackhole.position;
        let to_hole = -offset;
        let r0 = offset.magnitude();
        let cos_theta = (direction.dot(to_hole) / (length * r0)).clamp(-1.0, 1.0);
        let theta = cos_theta.acos();

        let normal = direction.cross(to_hole);
        let axis = if normal.magnitude2() > 0.0 {
            normal.normalize()
        } else {
            // Radial ray: any plane through the hole contains it.
            any_orthogonal(offset)
        };

        Ok(Self {
            offset,
            axis,
            theta,
            r0,
            b: impact_parameter(theta, r0),
        })
    }

    /// Photon position after a net deflection of `sweep`.
    pub fn position_after(&self, sweep: f64) -> Vector3<f64> {
        rotate_in_plane(self.offset, -sweep, self.axis)
    }
}

fn any_orthogonal(v: Vector3<f64>) -> Vector3<f64> {
    let helper = if v.x.abs() < v.y.abs() {
        Vector3::unit_x()
    } else {
        Vector3::unit_y()
    };
    v.cross(helper).normalize()
}

// ─── Classification ─────────────────────────────────────────────────────────

/// Radial stretch handed to the disk sampler.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DiskSpan {
    /// Photon position at `r_from`.
    pub start: Vector3<f64>,
    pub r_from: f64,
    pub r_to: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RayFate {
    Captured,
    CrossedDisk(DiskSpan),
    /// Net deflection to apply to the camera offset before the sky lookup.
    Escaped(f64),
}

/// One monotone radial stretch of the trajectory.
#[derive(Clone, Copy, Debug)]
struct Leg {
    r_from: f64,
    r_to: f64,
    /// Net deflection before and after the leg.
    sweep_before: f64,
    sweep_after: f64,
    /// Raw (unwrapped) deflection accumulated over this leg alone.
    leg_sweep: f64,
}

impl Leg {
    fn walk<I: DeflectionIntegrator + ?Sized>(
        integrator: &mut I,
        b: f64,
        sweep_before: f64,
        r_from: f64,
        r_to: f64,
    ) -> Result<Self, IntegrationError> {
        let leg_sweep = integrator.integrate(r_from, r_to, b)?;
        // The net deflection only grows in magnitude: inbound integrals are
        // negative, outbound legs are subtracted.
        let signed = if r_to <= r_from { leg_sweep } else { -leg_sweep };
        Ok(Self {
            r_from,
            r_to,
            sweep_before,
            sweep_after: wrap_angle(sweep_before + signed),
            leg_sweep,
        })
    }

    fn crosses_plane(&self, ray: &RayGeometry) -> bool {
        let start = ray.position_after(self.sweep_before);
        let end = ray.position_after(self.sweep_after);
        start.y * end.y < 0.0
    }

    fn span(&self, ray: &RayGeometry) -> DiskSpan {
        DiskSpan {
            start: ray.position_after(self.sweep_before),
            r_from: self.r_from,
            r_to: self.r_to,
        }
    }
}

/// Plunging photon (`b < sqrt(27)`): it either crosses the annulus on the way
/// down or is swallowed.
pub fn classify_capture<I: DeflectionIntegrator + ?Sized>(
    ray: &RayGeometry,
    blackhole: &BlackHole,
    integrator: &mut I,
) -> Result<RayFate, TraceError> {
    let entry = ray.r0.min(blackhole.disk_outer());
    let floor = blackhole.disk_inner().min(entry);

    let approach = Leg::walk(integrator, ray.b, 0.0, ray.r0, entry)?;
    let band = Leg::walk(integrator, ray.b, approach.sweep_after, entry, floor)?;

    if band.leg_sweep.abs() > PI || band.crosses_plane(ray) {
        return Ok(RayFate::CrossedDisk(band.span(ray)));
    }
    Ok(RayFate::Captured)
}

/// Photon with a periastron (`b >= sqrt(27)`): it leaves again, possibly
/// piercing the annulus on the way in or out.
pub fn classify_escape<I: DeflectionIntegrator + ?Sized>(
    ray: &RayGeometry,
    blackhole: &BlackHole,
    integrator: &mut I,
) -> Result<RayFate, TraceError> {
    let periastron = find_closest_approach(ray.r0, ray.b)?;
    let r3 = periastron.safe_radius();
    // A tangential ray starts within the periastron offset of its turning point.
    let r0 = ray.r0.max(r3);
    let outer = blackhole.disk_outer();
    let limit = INTEGRATION_LIMIT.max(r0);

    if periastron.radius > outer {
        let incoming = integrator.integrate(r0, r3, ray.b)?;
        let outgoing = integrator.integrate(r3, limit, ray.b)?;
        return Ok(RayFate::Escaped(wrap_angle(incoming - outgoing)));
    }
    if periastron.radius < blackhole.disk_inner() {
        return Err(TraceError::InnerEdgePassage {
            periastron: periastron.radius,
            disk_inner: blackhole.disk_inner(),
        });
    }

    let entry = r0.min(outer);
    let approach = Leg::walk(integrator, ray.b, 0.0, r0, entry)?;
    let inbound = Leg::walk(integrator, ray.b, approach.sweep_after, entry, r3)?;
    let outbound = Leg::walk(integrator, ray.b, inbound.sweep_after, r3, outer)?;

    // Crossings on the legs beyond `outer` lie outside the disk rim.
    for leg in [inbound, outbound] {
        if leg.crosses_plane(ray) {
            return Ok(RayFate::CrossedDisk(leg.span(ray)));
        }
    }
    let departure = Leg::walk(integrator, ray.b, outbound.sweep_after, outer, limit)?;
    Ok(RayFate::Escaped(departure.sweep_after))
}

pub fn classify<I: DeflectionIntegrator + ?Sized>(
    ray: &RayGeometry,
    blackhole: &BlackHole,
    integrator: &mut I,
) -> Result<RayFate, TraceError> {
    if is_captured(ray.b) {
        classify_capture(ray, blackhole, integrator)
    } else {
        classify_escape(ray, blackhole, integrator)
    }
}

// ─── Resolution ─────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Hit {
    Sky,
    Disk,
    Nothing,
}

impl Hit {
    pub fn label(self) -> &'static str {
        match self {
            Self::Sky => "sky",
            Self::Disk => "disk",
            Self::Nothing => "nothing",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TraceOutcome {
    pub color: Color,
    pub hit: Hit,
}

pub fn resolve<I: DeflectionIntegrator + ?Sized>(
    fate: RayFate,
    ray: &RayGeometry,
    blackhole: &BlackHole,
    skybox: &Skybox,
    integrator: &mut I,
    stepping: &DiskStepping,
) -> Result<TraceOutcome, TraceError> {
    match fate {
        RayFate::Captured => Ok(TraceOutcome {
            color: Color::BLACK,
            hit: Hit::Nothing,
        }),
        RayFate::CrossedDisk(span) => {
            let color = sample_disk(
                span.start,
                ray.b,
                span.r_from,
                span.r_to,
                ray.axis,
                blackhole,
                integrator,
                stepping,
            )?;
            Ok(TraceOutcome {
                color,
                hit: Hit::Disk,
            })
        }
        RayFate::Escaped(sweep) => {
            let color = sample_sky(ray.position_after(sweep), skybox)?;
            Ok(TraceOutcome {
                color,
                hit: Hit::Sky,
            })
        }
    }
}

/// Color seen along `direction` from `camera_position`.
pub fn trace<I: DeflectionIntegrator + ?Sized>(
    direction: Vector3<f64>,
    blackhole: &BlackHole,
    camera_position: Vector3<f64>,
    skybox: &Skybox,
    integrator: &mut I,
) -> Result<TraceOutcome, TraceError> {
    trace_with_stepping(
        direction,
        blackhole,
        camera_position,
        skybox,
        integrator,
        &DiskStepping::default(),
    )
}

pub fn trace_with_stepping<I: DeflectionIntegrator + ?Sized>(
    direction: Vector3<f64>,
    blackhole: &BlackHole,
    camera_position: Vector3<f64>,
    skybox: &Skybox,
    integrator: &mut I,
    stepping: &DiskStepping,
) -> Result<TraceOutcome, TraceError> {
    let ray = RayGeometry::new(direction, blackhole, camera_position)?;
    let fate = classify(&ray, blackhole, integrator)?;
    resolve(fate, &ray, blackhole, skybox, integrator, stepping)
}
