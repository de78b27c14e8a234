//! Scene description shared read-only by every render worker.

use bytemuck::{Pod, Zeroable};
use cgmath::{InnerSpace, Vector3};
use std::fmt;
use std::ops::{Add, AddAssign, Mul};

use crate::geodesic::PHOTON_SPHERE_RADIUS;

/// Linear RGB, channels in `[0, 1]`.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0);
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0);
    /// Sentinel written for rays that failed to resolve.
    pub const ERROR: Self = Self::new(1.0, 0.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub fn to_rgb8(self) -> [u8; 3] {
        let channel = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [channel(self.r), channel(self.g), channel(self.b)]
    }

    pub fn from_rgb8([r, g, b]: [u8; 3]) -> Self {
        Self::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
    }

    pub fn luminance(self) -> f32 {
        0.2126 * self.r + 0.7152 * self.g + 0.0722 * self.b
    }
}

impl Add for Color {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.r + other.r, self.g + other.g, self.b + other.b)
    }
}

impl AddAssign for Color {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Mul<f32> for Color {
    type Output = Self;

    fn mul(self, factor: f32) -> Self {
        Self::new(self.r * factor, self.g * factor, self.b * factor)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SceneError {
    /// Disk radii must be finite with `0 < inner < outer`.
    DegenerateDisk { inner: f64, outer: f64 },
    EmptyRamp,
    EmptyFace { face: CubeFace },
    FaceSizeMismatch {
        face: CubeFace,
        expected: usize,
        actual: usize,
    },
    /// The camera must sit outside the photon sphere.
    CameraTooClose { distance: f64 },
    /// View direction is zero or parallel to the up vector.
    DegenerateView,
}

impl fmt::Display for SceneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DegenerateDisk { inner, outer } => {
                write!(f, "disk radii must satisfy 0 < inner < outer (got {inner}, {outer})")
            }
            Self::EmptyRamp => write!(f, "disk color ramp needs at least one entry"),
            Self::EmptyFace { face } => write!(f, "skybox face {} is empty", face.label()),
            Self::FaceSizeMismatch {
                face,
                expected,
                actual,
            } => write!(
                f,
                "skybox face {} has {actual} texels, expected {expected}",
                face.label()
            ),
            Self::CameraTooClose { distance } => write!(
                f,
                "camera at distance {distance} is inside the photon sphere (r <= {PHOTON_SPHERE_RADIUS})"
            ),
            Self::DegenerateView => write!(f, "camera view direction is degenerate"),
        }
    }
}

impl std::error::Error for SceneError {}

/// Ordered inner-to-outer colors of the accretion disk.
#[derive(Clone, Debug, PartialEq)]
pub struct DiskRamp {
    colors: Vec<Color>,
}

impl DiskRamp {
    pub fn new(colors: Vec<Color>) -> Result<Self, SceneError> {
        if colors.is_empty() {
            return Err(SceneError::EmptyRamp);
        }
        Ok(Self { colors })
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    pub fn get(&self, index: usize) -> Option<Color> {
        self.colors.get(index).copied()
    }
}

/// `n` entries fading from green at the inner edge toward red at the outer.
pub fn build_disk_ramp(n: usize) -> Result<DiskRamp, SceneError> {
    let colors = (0..n)
        .map(|i| {
            let t = i as f32 / n as f32;
            Color::new(t, 1.0 - t, 0.0)
        })
        .collect();
    DiskRamp::new(colors)
}

#[derive(Clone, Debug)]
pub struct BlackHole {
    pub position: Vector3<f64>,
    disk_inner: f64,
    disk_outer: f64,
    ramp: DiskRamp,
}

impl BlackHole {
    pub fn new(
        position: Vector3<f64>,
        disk_inner: f64,
        disk_outer: f64,
        ramp: DiskRamp,
    ) -> Result<Self, SceneError> {
        let finite = disk_inner.is_finite() && disk_outer.is_finite();
        if !finite || disk_inner <= 0.0 || disk_inner >= disk_outer {
            return Err(SceneError::DegenerateDisk {
                inner: disk_inner,
                outer: disk_outer,
            });
        }
        Ok(Self {
            position,
            disk_inner,
            disk_outer,
            ramp,
        })
    }

    pub fn disk_inner(&self) -> f64 {
        self.disk_inner
    }

    pub fn disk_outer(&self) -> f64 {
        self.disk_outer
    }

    pub fn ramp(&self) -> &DiskRamp {
        &self.ramp
    }

    /// Rejects camera positions on or inside the photon sphere.
    pub fn check_camera(&self, camera_position: Vector3<f64>) -> Result<(), SceneError> {
        let distance = (camera_position - self.position).magnitude();
        if !(distance > PHOTON_SPHERE_RADIUS) {
            return Err(SceneError::CameraTooClose { distance });
        }
        Ok(())
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum CubeFace {
    Right,
    Left,
    Top,
    Bottom,
    Back,
    Front,
}

impl CubeFace {
    pub const ALL: [Self; 6] = [
        Self::Right,
        Self::Left,
        Self::Top,
        Self::Bottom,
        Self::Back,
        Self::Front,
    ];

    pub fn index(self) -> usize {
        match self {
            Self::Right => 0,
            Self::Left => 1,
            Self::Top => 2,
            Self::Bottom => 3,
            Self::Back => 4,
            Self::Front => 5,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Right => "right",
            Self::Left => "left",
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Back => "back",
            Self::Front => "front",
        }
    }
}

/// Row-major texels of one cube face, row 0 at the top.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceGrid {
    width: usize,
    height: usize,
    texels: Vec<Color>,
}

impl FaceGrid {
    pub fn new(
        face: CubeFace,
        width: usize,
        height: usize,
        texels: Vec<Color>,
    ) -> Result<Self, SceneError> {
        if width == 0 || height == 0 {
            return Err(SceneError::EmptyFace { face });
        }
        if texels.len() != width * height {
            return Err(SceneError::FaceSizeMismatch {
                face,
                expected: width * height,
                actual: texels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            texels,
        })
    }

    pub fn filled(face: CubeFace, width: usize, height: usize, color: Color) -> Result<Self, SceneError> {
        Self::new(face, width, height, vec![color; width * height])
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn texel(&self, row: usize, col: usize) -> Option<Color> {
        if row >= self.height || col >= self.width {
            return None;
        }
        self.texels.get(row * self.width + col).copied()
    }

    pub fn texels(&self) -> &[Color] {
        &self.texels
    }
}

/// Six faces, indexed by [`CubeFace::index`].
#[derive(Clone, Debug)]
pub struct Skybox {
    faces: [FaceGrid; 6],
}

impl Skybox {
    pub fn new(faces: [FaceGrid; 6]) -> Self {
        Self { faces }
    }

    /// One color per face, in [`CubeFace::ALL`] order.
    pub fn solid(colors: [Color; 6]) -> Result<Self, SceneError> {
        let [r, l, t, bo, ba, f] = colors;
        Ok(Self::new([
            FaceGrid::filled(CubeFace::Right, 1, 1, r)?,
            FaceGrid::filled(CubeFace::Left, 1, 1, l)?,
            FaceGrid::filled(CubeFace::Top, 1, 1, t)?,
            FaceGrid::filled(CubeFace::Bottom, 1, 1, bo)?,
            FaceGrid::filled(CubeFace::Back, 1, 1, ba)?,
            FaceGrid::filled(CubeFace::Front, 1, 1, f)?,
        ]))
    }

    pub fn face(&self, face: CubeFace) -> &FaceGrid {
        &self.faces[face.index()]
    }
}

/// Everything a ray can sample.
#[derive(Clone, Debug)]
pub struct Scene {
    pub blackhole: BlackHole,
    pub skybox: Skybox,
}
