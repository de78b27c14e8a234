//! Cube-map lookup for rays that escape to infinity.

use cgmath::Vector3;
use std::fmt;

use crate::scene::{Color, CubeFace, Skybox};

const COORDINATE_SLACK: f64 = 1e-9;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SkyError {
    /// Zero or non-finite escape direction.
    DegenerateDirection,
    /// Face coordinate landed outside `[0, 1]`.
    CoordinateOutOfRange { face: CubeFace, u: f64, v: f64 },
}

impl fmt::Display for SkyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DegenerateDirection => write!(f, "sky lookup with a degenerate direction"),
            Self::CoordinateOutOfRange { face, u, v } => write!(
                f,
                "sky coordinate ({u}, {v}) outside face {}",
                face.label()
            ),
        }
    }
}

impl std::error::Error for SkyError {}

/// Face hit by `direction` and its `(u, v)` coordinates in `[0, 1]`.
///
/// The dominant axis picks the face; ties go to z, then y.
pub fn face_coordinates(direction: Vector3<f64>) -> Result<(CubeFace, f64, f64), SkyError> {
    let Vector3 { x, y, z } = direction;
    if !(x.is_finite() && y.is_finite() && z.is_finite()) {
        return Err(SkyError::DegenerateDirection);
    }
    let (ax, ay, az) = (x.abs(), y.abs(), z.abs());
    let major = ax.max(ay).max(az);
    if major == 0.0 {
        return Err(SkyError::DegenerateDirection);
    }

    let (face, a, b) = if az == major {
        let face = if z > 0.0 { CubeFace::Back } else { CubeFace::Front };
        (face, x / az, y / az)
    } else if ay == major {
        let face = if y > 0.0 { CubeFace::Top } else { CubeFace::Bottom };
        (face, x / ay, z / ay)
    } else {
        let face = if x > 0.0 { CubeFace::Right } else { CubeFace::Left };
        (face, y / ax, z / ax)
    };

    let u = (a + 1.0) / 2.0;
    let v = (b + 1.0) / 2.0;
    let in_range = |c: f64| (-COORDINATE_SLACK..=1.0 + COORDINATE_SLACK).contains(&c);
    if !in_range(u) || !in_range(v) {
        return Err(SkyError::CoordinateOutOfRange { face, u, v });
    }
    Ok((face, u.clamp(0.0, 1.0), v.clamp(0.0, 1.0)))
}

/// Color of the sky seen along `direction`.
pub fn sample_sky(direction: Vector3<f64>, skybox: &Skybox) -> Result<Color, SkyError> {
    let (face, u, v) = face_coordinates(direction)?;
    let grid = skybox.face(face);
    let row = ((1.0 - v) * (grid.height() - 1) as f64).round() as usize;
    let col = (u * (grid.width() - 1) as f64).round() as usize;
    grid.texel(row, col)
        .ok_or(SkyError::CoordinateOutOfRange { face, u, v })
}
