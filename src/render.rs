//! Frame driver: splits the image into row stripes, traces every pixel of a
//! stripe with one integrator, then assembles the frame and its statistics.

mod bloom;
mod frame;
mod stats;

pub use self::bloom::bloom;
pub use self::frame::Frame;
pub use self::stats::FrameStats;

use std::fmt;

use cgmath::Vector3;
use log::{debug, info, warn};
use rayon::prelude::*;
use web_time::Instant;

use crate::camera::{pixel_direction, Camera};
use crate::config::{ConfigError, Projection, RenderConfig};
use crate::integrate::Integrator;
use crate::rng::SplitMix64;
use crate::scene::{Color, Scene, SceneError};
use crate::trace::{trace_with_stepping, Hit};

#[derive(Debug)]
pub enum RenderError {
    ThreadPool(rayon::ThreadPoolBuildError),
    Config(ConfigError),
    Scene(SceneError),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ThreadPool(err) => write!(f, "failed to start render workers: {err}"),
            Self::Config(err) => write!(f, "{err}"),
            Self::Scene(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ThreadPool(err) => Some(err),
            Self::Config(err) => Some(err),
            Self::Scene(err) => Some(err),
        }
    }
}

impl From<rayon::ThreadPoolBuildError> for RenderError {
    fn from(value: rayon::ThreadPoolBuildError) -> Self {
        Self::ThreadPool(value)
    }
}

impl From<ConfigError> for RenderError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<SceneError> for RenderError {
    fn from(value: SceneError) -> Self {
        Self::Scene(value)
    }
}

/// Rows owned by `stripe` when `height` rows are dealt round-robin to
/// `workers` stripes.
pub fn stripe_rows(height: usize, workers: usize, stripe: usize) -> impl Iterator<Item = usize> {
    (stripe..height).step_by(workers.max(1))
}

#[derive(Copy, Clone, Debug)]
struct Pixel {
    color: Color,
    disk: bool,
}

struct StripeOutput {
    rows: Vec<(usize, Vec<Pixel>)>,
    stats: FrameStats,
}

#[derive(Clone, Debug)]
pub struct RenderedFrame {
    pub frame: Frame,
    pub stats: FrameStats,
}

pub struct Renderer {
    config: RenderConfig,
    pool: rayon::ThreadPool,
}

impl Renderer {
    pub fn new(config: RenderConfig) -> Result<Self, RenderError> {
        config.validate()?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.workers)
            .thread_name(|i| format!("lens-stripe-{i}"))
            .build()?;
        debug!(
            "renderer ready: {}x{}, {} workers, {} samples, {} integrator, {} projection",
            config.width,
            config.height,
            config.workers,
            config.samples,
            config.method.label(),
            config.projection.label()
        );
        Ok(Self { config, pool })
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn render(&self, scene: &Scene, camera: &Camera) -> Result<RenderedFrame, RenderError> {
        scene.blackhole.check_camera(camera.position)?;
        let start = Instant::now();
        let (width, height, workers) = (self.config.width, self.config.height, self.config.workers);

        let stripes: Vec<StripeOutput> = self.pool.install(|| {
            (0..workers)
                .into_par_iter()
                .map(|stripe| self.render_stripe(stripe, scene, camera))
                .collect()
        });

        let mut colors = vec![Color::BLACK; width * height];
        let mut disk_mask = vec![false; width * height];
        let mut stats = FrameStats::default();
        for stripe in stripes {
            for (row, pixels) in stripe.rows {
                for (col, pixel) in pixels.into_iter().enumerate() {
                    colors[row * width + col] = pixel.color;
                    disk_mask[row * width + col] = pixel.disk;
                }
            }
            stats.merge(stripe.stats);
        }

        if self.config.bloom {
            bloom(&mut colors, &disk_mask, width, height);
        }

        if stats.failed > 0 {
            warn!(
                "{} of {} rays failed ({} unresolved, {} non-converged, {} contract violations); first: {}",
                stats.failed,
                stats.rays,
                stats.unresolved,
                stats.non_converged,
                stats.contract_violations,
                stats.first_failure.as_deref().unwrap_or("?")
            );
        }
        debug_assert_eq!(
            stats.contract_violations, 0,
            "ray classifier broke a precondition: {:?}",
            stats.first_failure
        );

        info!(
            "frame {}x{} in {:.2?}: {} sky, {} disk, {} captured, {} failed",
            width,
            height,
            start.elapsed(),
            stats.sky,
            stats.disk,
            stats.captured,
            stats.failed
        );

        Ok(RenderedFrame {
            frame: Frame::from_colors(width, height, &colors),
            stats,
        })
    }

    fn render_stripe(&self, stripe: usize, scene: &Scene, camera: &Camera) -> StripeOutput {
        let mut integrator = Integrator::new(self.config.method);
        let mut stats = FrameStats::default();
        let mut rows = Vec::new();
        for row in stripe_rows(self.config.height, self.config.workers, stripe) {
            let mut pixels = Vec::with_capacity(self.config.width);
            for col in 0..self.config.width {
                pixels.push(self.shade_pixel(row, col, scene, camera, &mut integrator, &mut stats));
            }
            rows.push((row, pixels));
        }
        StripeOutput { rows, stats }
    }

    fn base_direction(&self, row: usize, col: usize, camera: &Camera) -> Vector3<f64> {
        let (width, height) = (self.config.width, self.config.height);
        match self.config.projection {
            Projection::Perspective => camera.pixel_direction(row, col, width, height),
            Projection::Screen => pixel_direction(row, col, width, height),
        }
    }

    fn shade_pixel(
        &self,
        row: usize,
        col: usize,
        scene: &Scene,
        camera: &Camera,
        integrator: &mut Integrator,
        stats: &mut FrameStats,
    ) -> Pixel {
        let config = &self.config;
        let base = self.base_direction(row, col, camera);
        let mut rng = SplitMix64::for_cell(config.seed, (row * config.width + col) as u64);

        let mut sum = Color::BLACK;
        let mut disk = false;
        for _ in 0..config.samples {
            let direction = if config.samples > 1 {
                base + Vector3::new(
                    rng.symmetric(config.jitter),
                    rng.symmetric(config.jitter),
                    rng.symmetric(config.jitter),
                )
            } else {
                base
            };
            match trace_with_stepping(
                direction,
                &scene.blackhole,
                camera.position,
                &scene.skybox,
                integrator,
                &config.stepping,
            ) {
                Ok(outcome) => {
                    stats.record(outcome.hit);
                    disk |= outcome.hit == Hit::Disk;
                    sum += outcome.color;
                }
                Err(err) => {
                    stats.record_failure(&err);
                    sum += Color::ERROR;
                }
            }
        }
        Pixel {
            color: sum * (1.0 / config.samples as f32),
            disk,
        }
    }
}

/// One-shot render with a temporary worker pool.
pub fn render_frame(scene: &Scene, camera: &Camera, config: &RenderConfig) -> Result<Frame, RenderError> {
    Ok(Renderer::new(config.clone())?.render(scene, camera)?.frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{build_disk_ramp, BlackHole, Skybox};

    fn test_scene() -> Scene {
        let blackhole = BlackHole::new(
            Vector3::new(0.0, 0.0, 0.0),
            4.0,
            10.0,
            build_disk_ramp(20).unwrap(),
        )
        .unwrap();
        let skybox = Skybox::solid([
            Color::new(1.0, 0.0, 0.0),
            Color::new(0.0, 1.0, 0.0),
            Color::new(0.0, 0.0, 1.0),
            Color::new(1.0, 1.0, 0.0),
            Color::new(0.0, 1.0, 1.0),
            Color::new(1.0, 1.0, 1.0),
        ])
        .unwrap();
        Scene { blackhole, skybox }
    }

    fn test_config(workers: usize) -> RenderConfig {
        RenderConfig {
            width: 12,
            height: 9,
            workers,
            samples: 1,
            ..RenderConfig::with_defaults()
        }
    }

    fn test_camera() -> Camera {
        Camera::look_at(
            Vector3::new(0.0, 2.0, 30.0),
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::unit_y(),
            30.0,
        )
        .unwrap()
    }

    #[test]
    fn stripes_partition_rows() {
        for workers in 1..6 {
            let mut seen = vec![0; 23];
            for stripe in 0..workers {
                for row in stripe_rows(23, workers, stripe) {
                    seen[row] += 1;
                }
            }
            assert!(seen.iter().all(|&n| n == 1), "workers = {workers}");
        }
        assert!(stripe_rows(3, 8, 5).next().is_none());
    }

    #[test]
    fn small_frame_accounts_for_every_ray() {
        let scene = test_scene();
        let rendered = Renderer::new(test_config(3))
            .unwrap()
            .render(&scene, &test_camera())
            .unwrap();
        let stats = &rendered.stats;
        assert_eq!(stats.rays, 12 * 9);
        assert_eq!(stats.sky + stats.disk + stats.captured + stats.failed, stats.rays);
        assert_eq!(stats.contract_violations, 0);
        assert!(stats.sky > 0);
        // The centre pixel looks straight at the hole.
        assert_eq!(rendered.frame.get(4, 6), Some([0, 0, 0]));
        assert_eq!(rendered.frame.as_bytes().len(), 12 * 9 * 3);
    }

    #[test]
    fn frame_does_not_depend_on_worker_count() {
        let scene = test_scene();
        let camera = test_camera();
        let mut config = test_config(1);
        config.samples = 3;
        let one = render_frame(&scene, &camera, &config).unwrap();
        config.workers = 4;
        let four = render_frame(&scene, &camera, &config).unwrap();
        assert_eq!(one, four);
    }

    #[test]
    fn screen_projection_ignores_camera_orientation() {
        let scene = test_scene();
        let mut config = test_config(2);
        config.projection = Projection::Screen;
        let a = render_frame(&scene, &test_camera(), &config).unwrap();
        let turned = Camera::look_at(
            Vector3::new(0.0, 2.0, 30.0),
            Vector3::new(5.0, 0.0, 0.0),
            Vector3::unit_y(),
            30.0,
        )
        .unwrap();
        let b = render_frame(&scene, &turned, &config).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn camera_inside_photon_sphere_is_rejected_up_front() {
        let scene = test_scene();
        let camera = Camera::look_at(
            Vector3::new(0.0, 0.0, 2.5),
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::unit_y(),
            30.0,
        )
        .unwrap();
        let err = render_frame(&scene, &camera, &test_config(1)).unwrap_err();
        assert!(matches!(err, RenderError::Scene(SceneError::CameraTooClose { .. })));
        assert!(matches!(
            Renderer::new(test_config(0)),
            Err(RenderError::Config(ConfigError::Invalid { field: "workers", .. }))
        ));
    }
}
