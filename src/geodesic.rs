//! Schwarzschild photon orbit quantities in geometrized units (rs = 2).

use cgmath::{InnerSpace, Matrix3, Rad, Vector3};

/// Impact parameter below which a photon falls through the photon sphere.
pub const CRITICAL_IMPACT_PARAMETER: f64 = 5.196_152_422_706_632; // sqrt(27)

/// Radius of the event horizon.
pub const HORIZON_RADIUS: f64 = 2.0;

/// Radius of the unstable circular photon orbit.
pub const PHOTON_SPHERE_RADIUS: f64 = 3.0;

/// Stand-in for infinity on outgoing legs.
pub const INTEGRATION_LIMIT: f64 = 2000.0;

/// `b = r sin(theta) / sqrt(1 - 2/r)` for a ray leaving radius `r` at angle
/// `theta` to the inward radial direction.
pub fn impact_parameter(theta: f64, r: f64) -> f64 {
    r * theta.sin() / (1.0 - HORIZON_RADIUS / r).sqrt()
}

pub fn is_captured(b: f64) -> bool {
    b < CRITICAL_IMPACT_PARAMETER
}

/// dphi/dr along a photon orbit.
pub fn geodesic(r: f64, b: f64) -> f64 {
    1.0 / (r * r * radial_potential(1.0 / r, b).sqrt())
}

/// `1/b^2 - u^2 + 2u^3` with `u = 1/r`. Positive wherever the photon may travel.
pub fn radial_potential(u: f64, b: f64) -> f64 {
    1.0 / (b * b) - u * u + 2.0 * u * u * u
}

/// Inverse radius of the turning point, or `None` when the photon has none
/// (`b <= sqrt(27)`).
///
/// The potential is strictly decreasing on `(0, 1/3)`, so plain bisection
/// converges to the unique root there.
pub fn turning_point_inverse_radius(b: f64) -> Option<f64> {
    if !(b > CRITICAL_IMPACT_PARAMETER) || !b.is_finite() {
        return None;
    }
    let mut lo = 0.0_f64;
    let mut hi = 1.0 / PHOTON_SPHERE_RADIUS;
    for _ in 0..200 {
        let mid = 0.5 * (lo + hi);
        if mid <= lo || mid >= hi {
            break;
        }
        if radial_potential(mid, b) > 0.0 {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    Some(lo)
}

/// Truncated reduction into `(-2pi, 2pi)`, keeping the sign of `angle`.
pub fn wrap_angle(angle: f64) -> f64 {
    angle % std::f64::consts::TAU
}

/// Rotates `position` by `angle` (right-handed) about the orbit-plane normal.
pub fn rotate_in_plane(position: Vector3<f64>, angle: f64, axis: Vector3<f64>) -> Vector3<f64> {
    Matrix3::from_axis_angle(axis.normalize(), Rad(angle)) * position
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_4, PI, TAU};

    #[test]
    fn critical_impact_parameter_is_sqrt_27() {
        assert_eq!(CRITICAL_IMPACT_PARAMETER, 27.0_f64.sqrt());
    }

    #[test]
    fn impact_parameter_at_quarter_turn() {
        assert!((impact_parameter(FRAC_PI_4, 20.0) - 14.9071198499986).abs() < 1e-10);
    }

    #[test]
    fn geodesic_reference_values() {
        assert!((geodesic(20.0, 10.0) - 0.02839809171235324).abs() < 1e-10);
        assert!((geodesic(20.0, 20.0) - 0.15811388300841897).abs() < 1e-10);
    }

    #[test]
    fn turning_point_only_for_escaping_photons() {
        assert_eq!(turning_point_inverse_radius(5.0), None);
        assert_eq!(turning_point_inverse_radius(CRITICAL_IMPACT_PARAMETER), None);

        let u = turning_point_inverse_radius(10.0).unwrap();
        assert!(radial_potential(u, 10.0).abs() < 1e-15);
        // r / sqrt(1 - 2/r) == b at the turning point
        let r = 1.0 / u;
        assert!((r / (1.0 - 2.0 / r).sqrt() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn rotation_is_right_handed() {
        let z = Vector3::new(0.0, 0.0, 2.0);
        let turned = rotate_in_plane(Vector3::new(1.0, 0.0, 0.0), PI / 2.0, z);
        assert!((turned - Vector3::new(0.0, 1.0, 0.0)).magnitude() < 1e-12);
    }

    #[test]
    fn wrap_angle_keeps_sign() {
        assert!((wrap_angle(TAU + 0.5) - 0.5).abs() < 1e-12);
        assert!((wrap_angle(-TAU - 0.5) + 0.5).abs() < 1e-12);
        assert_eq!(wrap_angle(PI), PI);
    }
}
