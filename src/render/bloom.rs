use crate::scene::Color;

const GLOW_THRESHOLD: f32 = 1e-5;

/// 3x3 box blur of the disk-hit pixels laid over the frame, so the disk
/// bleeds a soft glow onto its neighbours. Pixels with no disk light nearby
/// are left alone.
pub fn bloom(colors: &mut [Color], disk_mask: &[bool], width: usize, height: usize) {
    debug_assert_eq!(colors.len(), width * height);
    debug_assert_eq!(disk_mask.len(), width * height);

    let glow: Vec<Color> = colors
        .iter()
        .zip(disk_mask)
        .map(|(c, &disk)| if disk { *c } else { Color::BLACK })
        .collect();

    for row in 0..height {
        for col in 0..width {
            let mut sum = Color::BLACK;
            let mut count = 0;
            for r in row.saturating_sub(1)..=(row + 1).min(height - 1) {
                for c in col.saturating_sub(1)..=(col + 1).min(width - 1) {
                    sum += glow[r * width + c];
                    count += 1;
                }
            }
            let average = sum * (1.0 / count as f32);
            let magnitude =
                (average.r * average.r + average.g * average.g + average.b * average.b).sqrt();
            if magnitude > GLOW_THRESHOLD {
                colors[row * width + col] = average;
            }
        }
    }
}
