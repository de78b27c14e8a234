//! Pinhole camera, pixel-to-ray mappings, and scripted fly-through paths.

use cgmath::{InnerSpace, Vector3};

use crate::scene::SceneError;

pub const DEFAULT_FOV_DEGREES: f64 = 45.0;
const MAX_PITCH_DEGREES: f64 = 89.0;

fn wrap_degrees(a: f64) -> f64 {
    let mut a = a % 360.0;
    if a > 180.0 {
        a -= 360.0;
    } else if a < -180.0 {
        a += 360.0;
    }
    a
}

/// Fixed screen mapping looking down `-z`: pixel centres spread evenly over
/// `[-1, 1]` in x and y, row 0 at the top.
pub fn pixel_direction(row: usize, col: usize, width: usize, height: usize) -> Vector3<f64> {
    let x_span = width.saturating_sub(1).max(1) as f64;
    let y_span = height.saturating_sub(1).max(1) as f64;
    let x = col as f64 / x_span * 2.0 - 1.0;
    let y = (height as f64 - row as f64 - 1.0) / y_span * 2.0 - 1.0;
    Vector3::new(x, y, -1.0)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub position: Vector3<f64>,
    /// Unit view direction.
    pub front: Vector3<f64>,
    pub up: Vector3<f64>,
    pub right: Vector3<f64>,
    /// Full opening angle across the image width.
    pub fov_degrees: f64,
}

impl Camera {
    pub fn look_at(
        position: Vector3<f64>,
        target: Vector3<f64>,
        world_up: Vector3<f64>,
        fov_degrees: f64,
    ) -> Result<Self, SceneError> {
        Self::with_front(position, target - position, world_up, fov_degrees)
    }

    /// Yaw and pitch in degrees; yaw `-90` looks down `-z`.
    pub fn from_euler(
        position: Vector3<f64>,
        yaw_degrees: f64,
        pitch_degrees: f64,
        fov_degrees: f64,
    ) -> Result<Self, SceneError> {
        let yaw = wrap_degrees(yaw_degrees).to_radians();
        let pitch = pitch_degrees
            .clamp(-MAX_PITCH_DEGREES, MAX_PITCH_DEGREES)
            .to_radians();
        let front = Vector3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos());
        Self::with_front(position, front, Vector3::unit_y(), fov_degrees)
    }

    fn with_front(
        position: Vector3<f64>,
        front: Vector3<f64>,
        world_up: Vector3<f64>,
        fov_degrees: f64,
    ) -> Result<Self, SceneError> {
        if !(front.magnitude2() > 0.0) || !(fov_degrees > 0.0 && fov_degrees < 180.0) {
            return Err(SceneError::DegenerateView);
        }
        let front = front.normalize();
        let right = front.cross(world_up);
        if !(right.magnitude2() > 1e-18) {
            return Err(SceneError::DegenerateView);
        }
        let right = right.normalize();
        let up = right.cross(front).normalize();
        Ok(Self {
            position,
            front,
            up,
            right,
            fov_degrees,
        })
    }

    /// Ray through a pixel: each screen axis bends the view by up to half the
    /// field of view at the image edge.
    pub fn pixel_direction(&self, row: usize, col: usize, width: usize, height: usize) -> Vector3<f64> {
        let half_fov = (self.fov_degrees / 2.0).to_radians();
        let center_x = width as f64 / 2.0;
        let center_y = height as f64 / 2.0;
        let bend_x = (col as f64 - center_x) / center_x * half_fov;
        let bend_y = -(row as f64 - center_y) / center_y * half_fov;
        self.front + self.up * bend_y.tan() + self.right * bend_x.tan()
    }
}

/// Camera placement for one frame of a path.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraPose {
    pub position: Vector3<f64>,
    pub target: Vector3<f64>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathSegment {
    pub end: Vector3<f64>,
    pub frames: usize,
    /// Point the camera keeps looking at along this segment.
    pub target: Vector3<f64>,
}

/// Piecewise-linear fly-through. Frame 0 is the start pose; each segment then
/// contributes `frames` evenly spaced poses ending on its `end` point.
#[derive(Clone, Debug, PartialEq)]
pub struct CameraPath {
    pub start: CameraPose,
    pub segments: Vec<PathSegment>,
}

impl CameraPath {
    pub fn still(pose: CameraPose) -> Self {
        Self {
            start: pose,
            segments: Vec::new(),
        }
    }

    /// Sweeps past the hole, climbs above the disk, then dives under it.
    pub fn fly_through(start: CameraPose) -> Self {
        let upper = Vector3::new(0.3, 0.4, 0.5);
        let lower = Vector3::new(0.3, -0.4, 0.5);
        Self {
            start,
            segments: vec![
                PathSegment {
                    end: Vector3::new(16.0, 1.0, 10.0),
                    frames: 200,
                    target: upper,
                },
                PathSegment {
                    end: Vector3::new(20.0, 15.0, -30.0),
                    frames: 100,
                    target: lower,
                },
                PathSegment {
                    end: Vector3::new(30.0, -30.0, 60.0),
                    frames: 200,
                    target: lower,
                },
            ],
        }
    }

    pub fn frame_count(&self) -> usize {
        1 + self.segments.iter().map(|s| s.frames).sum::<usize>()
    }

    pub fn pose(&self, frame: usize) -> Option<CameraPose> {
        if frame == 0 {
            return Some(self.start);
        }
        let mut remaining = frame - 1;
        let mut from = self.start.position;
        for segment in &self.segments {
            if remaining < segment.frames {
                let t = (remaining + 1) as f64 / segment.frames as f64;
                return Some(CameraPose {
                    position: from + (segment.end - from) * t,
                    target: segment.target,
                });
            }
            remaining -= segment.frames;
            from = segment.end;
        }
        None
    }

    pub fn camera(
        &self,
        frame: usize,
        world_up: Vector3<f64>,
        fov_degrees: f64,
    ) -> Option<Result<Camera, SceneError>> {
        self.pose(frame)
            .map(|pose| Camera::look_at(pose.position, pose.target, world_up, fov_degrees))
    }
}
