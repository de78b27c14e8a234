//! Image files in and out: cube-map faces, the procedural starfield stand-in,
//! and PNG output of rendered frames.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::render::Frame;
use crate::rng::SplitMix64;
use crate::scene::{Color, CubeFace, FaceGrid, SceneError, Skybox};

const FACE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

#[derive(Debug)]
pub enum SkyboxError {
    Image {
        path: PathBuf,
        source: image::ImageError,
    },
    Scene(SceneError),
}

impl fmt::Display for SkyboxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Image { path, source } => {
                write!(f, "failed to read skybox face {}: {source}", path.display())
            }
            Self::Scene(err) => write!(f, "invalid skybox: {err}"),
        }
    }
}

impl std::error::Error for SkyboxError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Image { source, .. } => Some(source),
            Self::Scene(err) => Some(err),
        }
    }
}

impl From<SceneError> for SkyboxError {
    fn from(value: SceneError) -> Self {
        Self::Scene(value)
    }
}

/// `<dir>/<face>.jpg`, falling back to `.jpeg` and `.png`.
fn face_path(dir: &Path, face: CubeFace) -> PathBuf {
    FACE_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{}.{ext}", face.label())))
        .find(|path| path.is_file())
        .unwrap_or_else(|| dir.join(format!("{}.jpg", face.label())))
}

fn load_face(dir: &Path, face: CubeFace) -> Result<FaceGrid, SkyboxError> {
    let path = face_path(dir, face);
    let rgb = match image::open(&path) {
        Ok(img) => img.to_rgb8(),
        Err(source) => return Err(SkyboxError::Image { path, source }),
    };
    let (width, height) = rgb.dimensions();
    let texels = rgb.pixels().map(|p| Color::from_rgb8(p.0)).collect();
    log::debug!(
        "loaded skybox face {} ({}x{}) from {}",
        face.label(),
        width,
        height,
        path.display()
    );
    Ok(FaceGrid::new(face, width as usize, height as usize, texels)?)
}

/// Loads the six faces `front`, `back`, `top`, `bottom`, `left`, `right`.
pub fn load_skybox(dir: &Path) -> Result<Skybox, SkyboxError> {
    let [right, left, top, bottom, back, front] = CubeFace::ALL.map(|face| load_face(dir, face));
    Ok(Skybox::new([right?, left?, top?, bottom?, back?, front?]))
}

const STAR_PROBABILITY: f64 = 0.004;
const BACKGROUND: Color = Color::new(0.004, 0.004, 0.012);

/// Sparse random stars on a near-black background, identical for a given
/// `(resolution, seed)`.
pub fn starfield(resolution: usize, seed: u64) -> Result<Skybox, SceneError> {
    let face_grid = |face: CubeFace| {
        let base = (face.index() * resolution * resolution) as u64;
        let texels = (0..resolution * resolution)
            .map(|i| {
                let mut rng = SplitMix64::for_cell(seed, base + i as u64);
                if rng.next_f64() >= STAR_PROBABILITY {
                    return BACKGROUND;
                }
                let brightness = 0.5 + 0.5 * rng.next_f64() as f32;
                let warmth = 0.85 + 0.15 * rng.next_f64() as f32;
                Color::new(brightness, brightness * warmth, brightness * warmth * warmth)
            })
            .collect();
        FaceGrid::new(face, resolution, resolution, texels)
    };
    let [right, left, top, bottom, back, front] = CubeFace::ALL.map(face_grid);
    Ok(Skybox::new([right?, left?, top?, bottom?, back?, front?]))
}

pub fn write_png(frame: &Frame, path: &Path) -> Result<(), image::ImageError> {
    image::save_buffer_with_format(
        path,
        frame.as_bytes(),
        frame.width() as u32,
        frame.height() as u32,
        image::ExtendedColorType::Rgb8,
        image::ImageFormat::Png,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "schwarzschild-lens-{name}-{}",
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn loads_six_png_faces() {
        let dir = scratch_dir("faces");
        for (i, face) in CubeFace::ALL.iter().enumerate() {
            let mut img = image::RgbImage::new(3, 2);
            for p in img.pixels_mut() {
                *p = image::Rgb([(i * 40) as u8, 0, 255]);
            }
            img.save(dir.join(format!("{}.png", face.label()))).unwrap();
        }

        let skybox = load_skybox(&dir).unwrap();
        for (i, face) in CubeFace::ALL.iter().enumerate() {
            let grid = skybox.face(*face);
            assert_eq!((grid.width(), grid.height()), (3, 2));
            assert_eq!(
                grid.texel(1, 2).unwrap(),
                Color::from_rgb8([(i * 40) as u8, 0, 255])
            );
        }
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_face_names_the_file() {
        let dir = scratch_dir("missing");
        let err = load_skybox(&dir).unwrap_err();
        let SkyboxError::Image { path, .. } = err else {
            panic!("expected an image error");
        };
        assert_eq!(path, dir.join("right.jpg"));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn starfield_is_deterministic_and_sparse() {
        let a = starfield(32, 9).unwrap();
        let b = starfield(32, 9).unwrap();
        let c = starfield(32, 10).unwrap();
        let front = |s: &Skybox| s.face(CubeFace::Front).texels().to_vec();
        assert_eq!(front(&a), front(&b));
        assert_ne!(
            CubeFace::ALL.map(|f| a.face(f).texels().to_vec()),
            CubeFace::ALL.map(|f| c.face(f).texels().to_vec())
        );
        let stars: usize = CubeFace::ALL
            .iter()
            .map(|f| a.face(*f).texels().iter().filter(|t| **t != BACKGROUND).count())
            .sum();
        assert!(stars < 6 * 32 * 32 / 20);
        assert!(starfield(0, 1).is_err());
    }

    #[test]
    fn png_round_trip_keeps_pixels() {
        let dir = scratch_dir("png");
        let mut frame = Frame::new(4, 3);
        frame.set(2, 1, [10, 20, 30]);
        let path = dir.join("frame.png");
        write_png(&frame, &path).unwrap();

        let back = image::open(&path).unwrap().to_rgb8();
        assert_eq!(back.dimensions(), (4, 3));
        assert_eq!(back.get_pixel(1, 2).0, [10, 20, 30]);
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
