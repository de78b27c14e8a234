use clap::{Parser, ValueEnum};
use cgmath::Vector3;
use log::{error, info};
use schwarzschild_lens::config::{CameraConfig, Projection, RenderConfig, SceneConfig};
use schwarzschild_lens::integrate::IntegrationMethod;
use schwarzschild_lens::render::Renderer;
use schwarzschild_lens::skybox_io::write_png;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use web_time::Instant;

#[derive(Parser, Debug, Clone)]
#[command(version, about = "Schwarzschild black hole lens renderer")]
struct Args {
    /// Image width in pixels
    #[arg(long, short = 'W', default_value_t = 256)]
    width: usize,

    /// Image height in pixels
    #[arg(long, short = 'H', default_value_t = 256)]
    height: usize,

    /// Row stripes rendered in parallel (defaults to the number of cores)
    #[arg(long)]
    workers: Option<usize>,

    /// Rays per pixel
    #[arg(long, default_value_t = 16)]
    samples: usize,

    /// Direction jitter half-width for supersampling
    #[arg(long, default_value_t = 0.001)]
    jitter: f64,

    /// Deflection integral method
    #[arg(long, value_enum, default_value_t = MethodArg::Adaptive)]
    method: MethodArg,

    /// Directory with right/left/top/bottom/back/front face images
    #[arg(long)]
    skybox: Option<PathBuf>,

    /// Camera position as x,y,z
    #[arg(long, value_parser = parse_vector, default_value = "0,1,12")]
    camera: Vector3<f64>,

    /// Point the camera looks at, as x,y,z
    #[arg(long, value_parser = parse_vector, default_value = "0.1,0.2,0.3")]
    target: Vector3<f64>,

    /// Horizontal field of view in degrees
    #[arg(long, default_value_t = 45.0)]
    fov: f64,

    /// Fixed screen grid looking down -z instead of the camera's field of view
    #[arg(long)]
    ortho: bool,

    #[arg(long, default_value_t = 8.0)]
    disk_inner: f64,

    #[arg(long, default_value_t = 18.0)]
    disk_outer: f64,

    /// Number of colors in the disk ramp
    #[arg(long, default_value_t = 20)]
    ramp_segments: usize,

    /// Frames to render; more than one follows the fly-through path
    #[arg(long, default_value_t = 1)]
    frames: usize,

    /// Output PNG; numbered per frame when rendering several
    #[arg(long, short = 'o', default_value = "blackhole.png")]
    output: PathBuf,

    /// Glow around disk pixels
    #[arg(long)]
    bloom: bool,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum MethodArg {
    FixedStep,
    Adaptive,
    RungeKutta,
}

impl MethodArg {
    fn to_integration_method(self) -> IntegrationMethod {
        match self {
            MethodArg::FixedStep => IntegrationMethod::FixedStep,
            MethodArg::Adaptive => IntegrationMethod::Adaptive,
            MethodArg::RungeKutta => IntegrationMethod::RungeKutta,
        }
    }
}

fn parse_vector(s: &str) -> Result<Vector3<f64>, String> {
    let parts = s
        .split(',')
        .map(|p| p.trim().parse::<f64>().map_err(|e| format!("{p:?}: {e}")))
        .collect::<Result<Vec<_>, _>>()?;
    match parts.as_slice() {
        [x, y, z] => Ok(Vector3::new(*x, *y, *z)),
        _ => Err(format!("expected x,y,z, got {} components", parts.len())),
    }
}

fn frame_path(output: &Path, frame: usize, frames: usize) -> PathBuf {
    if frames <= 1 {
        return output.to_path_buf();
    }
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "frame".to_string());
    output.with_file_name(format!("{stem}_{frame:04}.png"))
}

impl Args {
    fn configs(&self) -> (RenderConfig, SceneConfig, CameraConfig) {
        let defaults = RenderConfig::with_defaults();
        let render = RenderConfig {
            width: self.width,
            height: self.height,
            workers: self.workers.unwrap_or(defaults.workers),
            samples: self.samples,
            jitter: self.jitter,
            method: self.method.to_integration_method(),
            projection: if self.ortho {
                Projection::Screen
            } else {
                Projection::Perspective
            },
            bloom: self.bloom,
            ..defaults
        };
        let scene = SceneConfig {
            disk_inner: self.disk_inner,
            disk_outer: self.disk_outer,
            ramp_segments: self.ramp_segments,
            skybox_dir: self.skybox.clone(),
            ..SceneConfig::with_defaults()
        };
        let camera = CameraConfig {
            position: self.camera,
            target: self.target,
            fov_degrees: self.fov,
            frames: self.frames,
            ..CameraConfig::with_defaults()
        };
        (render, scene, camera)
    }
}

fn run(args: &Args) -> Result<(), Box<dyn Error>> {
    let (render_config, scene_config, camera_config) = args.configs();
    let scene = scene_config.build()?;
    let renderer = Renderer::new(render_config)?;

    let path = camera_config.path();
    let frames = camera_config.frame_count();
    let start = Instant::now();
    for frame in 0..frames {
        let Some(camera) = path.camera(frame, camera_config.world_up, camera_config.fov_degrees)
        else {
            break;
        };
        let rendered = renderer.render(&scene, &camera?)?;
        let out = frame_path(&args.output, frame, frames);
        write_png(&rendered.frame, &out)?;
        info!("frame {}/{} written to {}", frame + 1, frames, out.display());
    }
    info!("rendered {} frame(s) in {:.2?}", frames, start.elapsed());
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
