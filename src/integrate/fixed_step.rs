use super::{Bounds, DeflectionIntegrator, IntegrationError};

pub const DEFAULT_PANELS: usize = 256;

/// Composite Simpson rule with a fixed panel count.
///
/// Integrates in `u = 1/r`. When the photon has a turning point `u_p` the
/// variable becomes `u = u_p - s²`, which turns the inverse square-root
/// singularity at the periastron into a bounded integrand.
#[derive(Clone, Copy, Debug)]
pub struct FixedStep {
    panels: usize,
}

impl Default for FixedStep {
    fn default() -> Self {
        Self::new(DEFAULT_PANELS)
    }
}

impl FixedStep {
    /// Rounded up to an even count of at least two.
    pub fn new(panels: usize) -> Self {
        let panels = panels.max(2);
        Self {
            panels: panels + panels % 2,
        }
    }

    pub fn panels(&self) -> usize {
        self.panels
    }
}

fn simpson(f: impl Fn(f64) -> f64, lower: f64, upper: f64, panels: usize) -> f64 {
    let h = (upper - lower) / panels as f64;
    let mut sum = f(lower) + f(upper);
    for i in 1..panels {
        let weight = if i % 2 == 1 { 4.0 } else { 2.0 };
        sum += weight * f(lower + i as f64 * h);
    }
    sum * h / 3.0
}

impl DeflectionIntegrator for FixedStep {
    fn integrate(&mut self, r0: f64, r1: f64, b: f64) -> Result<f64, IntegrationError> {
        let Some(bounds) = Bounds::check(r0, r1, b)? else {
            return Ok(0.0);
        };
        let (lower, upper, integrand) = bounds.regularized(b);
        Ok(bounds.sign * simpson(integrand, lower, upper, self.panels))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panel_count_is_even() {
        assert_eq!(FixedStep::new(7).panels(), 8);
        assert_eq!(FixedStep::new(0).panels(), 2);
        assert_eq!(FixedStep::default().panels(), DEFAULT_PANELS);
    }

    #[test]
    fn simpson_is_exact_for_cubics() {
        let value = simpson(|x| x * x * x - x, 0.0, 2.0, 2);
        assert!((value - 2.0).abs() < 1e-14);
    }
}
