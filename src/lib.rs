//! Gravitational lensing around a Schwarzschild black hole with a thin
//! accretion disk, rendered one camera ray at a time from the photon's impact
//! parameter and a one-dimensional deflection integral.

pub mod camera;
pub mod config;
pub mod disk;
pub mod geodesic;
pub mod integrate;
pub mod periastron;
pub mod render;
pub mod rng;
pub mod scene;
pub mod sky;
pub mod skybox_io;
pub mod trace;

pub use crate::camera::{Camera, CameraPath};
pub use crate::config::{CameraConfig, ConfigError, Projection, RenderConfig, SceneConfig};
pub use crate::integrate::{DeflectionIntegrator, IntegrationMethod, Integrator};
pub use crate::render::{render_frame, Frame, FrameStats, RenderError, Renderer};
pub use crate::scene::{BlackHole, Color, Scene, Skybox};
pub use crate::trace::{trace, Hit, TraceError, TraceOutcome};
