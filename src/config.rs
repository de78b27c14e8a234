//! Plain configuration structs for a render session, filled from the command
//! line and validated before any worker starts.

use cgmath::Vector3;
use std::fmt;
use std::path::PathBuf;

use crate::camera::{CameraPath, CameraPose, DEFAULT_FOV_DEGREES};
use crate::disk::DiskStepping;
use crate::integrate::IntegrationMethod;
use crate::scene::{build_disk_ramp, BlackHole, Scene, SceneError};
use crate::skybox_io::{load_skybox, starfield, SkyboxError};

#[derive(Debug)]
pub enum ConfigError {
    Scene(SceneError),
    Skybox(SkyboxError),
    Invalid { field: &'static str, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scene(err) => write!(f, "{err}"),
            Self::Skybox(err) => write!(f, "{err}"),
            Self::Invalid { field, reason } => write!(f, "invalid {field}: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Scene(err) => Some(err),
            Self::Skybox(err) => Some(err),
            Self::Invalid { .. } => None,
        }
    }
}

impl From<SceneError> for ConfigError {
    fn from(value: SceneError) -> Self {
        Self::Scene(value)
    }
}

impl From<SkyboxError> for ConfigError {
    fn from(value: SkyboxError) -> Self {
        Self::Skybox(value)
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Projection {
    /// Field-of-view rays around the camera's view direction.
    Perspective,
    /// Fixed screen grid looking down `-z`, ignoring the camera orientation.
    Screen,
}

impl Default for Projection {
    fn default() -> Self {
        Self::Perspective
    }
}

impl Projection {
    pub fn label(self) -> &'static str {
        match self {
            Self::Perspective => "perspective",
            Self::Screen => "screen",
        }
    }
}

#[derive(Clone, Debug)]
pub struct RenderConfig {
    pub width: usize,
    pub height: usize,
    /// Number of row stripes, one integrator each.
    pub workers: usize,
    /// Rays per pixel.
    pub samples: usize,
    /// Half-width of the per-component direction jitter when `samples > 1`.
    pub jitter: f64,
    pub method: IntegrationMethod,
    pub projection: Projection,
    pub bloom: bool,
    pub seed: u64,
    pub stepping: DiskStepping,
}

impl RenderConfig {
    pub fn with_defaults() -> Self {
        Self {
            width: 256,
            height: 256,
            workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            samples: 16,
            jitter: 0.001,
            method: IntegrationMethod::default(),
            projection: Projection::default(),
            bloom: false,
            seed: 0x5eed,
            stepping: DiskStepping::default(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(invalid("resolution", format!("{}x{}", self.width, self.height)));
        }
        if self.workers == 0 {
            return Err(invalid("workers", "need at least one worker"));
        }
        if self.samples == 0 {
            return Err(invalid("samples", "need at least one sample per pixel"));
        }
        if !(self.jitter >= 0.0 && self.jitter.is_finite()) {
            return Err(invalid("jitter", format!("{} is not a finite non-negative value", self.jitter)));
        }
        let s = &self.stepping;
        if !(s.min_step > 0.0 && s.min_step <= s.base && s.refine_band > 0.0) {
            return Err(invalid(
                "disk stepping",
                format!(
                    "need 0 < min_step <= base and refine_band > 0 (got {}, {}, {})",
                    s.min_step, s.base, s.refine_band
                ),
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct SceneConfig {
    pub blackhole_position: Vector3<f64>,
    pub disk_inner: f64,
    pub disk_outer: f64,
    pub ramp_segments: usize,
    /// Directory holding the six face images; a generated starfield otherwise.
    pub skybox_dir: Option<PathBuf>,
    pub starfield_resolution: usize,
    pub starfield_seed: u64,
}

impl SceneConfig {
    pub fn with_defaults() -> Self {
        Self {
            blackhole_position: Vector3::new(0.0, 0.0, 0.0),
            disk_inner: 8.0,
            disk_outer: 18.0,
            ramp_segments: 20,
            skybox_dir: None,
            starfield_resolution: 512,
            starfield_seed: 1337,
        }
    }

    pub fn build(&self) -> Result<Scene, ConfigError> {
        let ramp = build_disk_ramp(self.ramp_segments)?;
        let blackhole = BlackHole::new(self.blackhole_position, self.disk_inner, self.disk_outer, ramp)?;
        let skybox = match &self.skybox_dir {
            Some(dir) => load_skybox(dir)?,
            None => starfield(self.starfield_resolution, self.starfield_seed)?,
        };
        Ok(Scene { blackhole, skybox })
    }
}

#[derive(Clone, Debug)]
pub struct CameraConfig {
    pub position: Vector3<f64>,
    pub target: Vector3<f64>,
    pub world_up: Vector3<f64>,
    pub fov_degrees: f64,
    /// More than one frame follows the fly-through path from `position`.
    pub frames: usize,
}

impl CameraConfig {
    pub fn with_defaults() -> Self {
        Self {
            position: Vector3::new(0.0, 1.0, 12.0),
            target: Vector3::new(0.1, 0.2, 0.3),
            world_up: Vector3::unit_y(),
            fov_degrees: DEFAULT_FOV_DEGREES,
            frames: 1,
        }
    }

    pub fn path(&self) -> CameraPath {
        let start = CameraPose {
            position: self.position,
            target: self.target,
        };
        if self.frames > 1 {
            CameraPath::fly_through(start)
        } else {
            CameraPath::still(start)
        }
    }

    /// Frames actually rendered: the request, capped by the path length.
    pub fn frame_count(&self) -> usize {
        self.frames.max(1).min(self.path().frame_count())
    }
}
