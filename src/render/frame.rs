use crate::scene::Color;

/// Row-major 8-bit RGB image, row 0 at the top.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    width: usize,
    height: usize,
    pixels: Vec<[u8; 3]>,
}

impl Frame {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![[0; 3]; width * height],
        }
    }

    pub fn from_colors(width: usize, height: usize, colors: &[Color]) -> Self {
        debug_assert_eq!(colors.len(), width * height);
        Self {
            width,
            height,
            pixels: colors.iter().map(|c| c.to_rgb8()).collect(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, row: usize, col: usize) -> Option<[u8; 3]> {
        if row >= self.height || col >= self.width {
            return None;
        }
        Some(self.pixels[row * self.width + col])
    }

    pub fn set(&mut self, row: usize, col: usize, rgb: [u8; 3]) {
        if row < self.height && col < self.width {
            self.pixels[row * self.width + col] = rgb;
        }
    }

    pub fn pixels(&self) -> &[[u8; 3]] {
        &self.pixels
    }

    /// Tightly packed `RGBRGB...` bytes.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_are_packed_row_major() {
        let mut frame = Frame::new(2, 2);
        frame.set(0, 1, [1, 2, 3]);
        frame.set(1, 0, [4, 5, 6]);
        frame.set(5, 5, [9, 9, 9]);
        assert_eq!(
            frame.as_bytes(),
            &[0, 0, 0, 1, 2, 3, 4, 5, 6, 0, 0, 0]
        );
        assert_eq!(frame.get(1, 0), Some([4, 5, 6]));
        assert_eq!(frame.get(2, 0), None);
    }

    #[test]
    fn colors_are_quantized() {
        let frame = Frame::from_colors(1, 2, &[Color::WHITE, Color::new(0.5, 0.0, 1.0)]);
        assert_eq!(frame.pixels(), &[[255, 255, 255], [128, 0, 255]]);
    }
}
