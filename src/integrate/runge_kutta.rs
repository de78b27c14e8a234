use super::{Bounds, DeflectionIntegrator, IntegrationError, IntegrationMethod};

/// Runge-Kutta-Fehlberg 4(5) with step-size control from the embedded error
/// estimate.
///
/// Steps through the same bounded variable as [`super::FixedStep`] rather than
/// `r`, where the periastron singularity would starve the step size.
#[derive(Clone, Copy, Debug)]
pub struct RungeKuttaFehlberg {
    pub tolerance: f64,
    pub max_steps: usize,
}

impl Default for RungeKuttaFehlberg {
    fn default() -> Self {
        Self {
            tolerance: 1e-10,
            max_steps: 200_000,
        }
    }
}

impl DeflectionIntegrator for RungeKuttaFehlberg {
    fn integrate(&mut self, r0: f64, r1: f64, b: f64) -> Result<f64, IntegrationError> {
        let Some(bounds) = Bounds::check(r0, r1, b)? else {
            return Ok(0.0);
        };
        let (lower, upper, f) = bounds.regularized(b);
        let span = upper - lower;
        if span <= 0.0 {
            return Ok(0.0);
        }

        let mut x = lower;
        let mut phi = 0.0_f64;
        let mut h = span / 16.0;
        let mut steps = 0;
        let mut last_error = 0.0;

        while x < upper {
            if steps >= self.max_steps {
                return Err(IntegrationError::NoConvergence {
                    method: IntegrationMethod::RungeKutta,
                    estimated_error: last_error,
                });
            }
            steps += 1;

            let final_step = x + h >= upper;
            if final_step {
                h = upper - x;
            }

            // The right-hand side does not depend on phi, so the k2 stage
            // drops out of both embedded solutions.
            let k1 = f(x);
            let k3 = f(x + 3.0 / 8.0 * h);
            let k4 = f(x + 12.0 / 13.0 * h);
            let k5 = f(x + h);
            let k6 = f(x + 0.5 * h);

            let fourth = h * (25.0 / 216.0 * k1 + 1408.0 / 2565.0 * k3 + 2197.0 / 4104.0 * k4
                - 0.2 * k5);
            let fifth = h
                * (16.0 / 135.0 * k1 + 6656.0 / 12825.0 * k3 + 28561.0 / 56430.0 * k4
                    - 9.0 / 50.0 * k5
                    + 2.0 / 55.0 * k6);

            let error = (fifth - fourth).abs();
            let allowed = self.tolerance * phi.abs().max(1.0) * h / span;
            let at_resolution = h <= 1e-12 * x.abs().max(1.0);

            if error <= allowed || at_resolution {
                x = if final_step { upper } else { x + h };
                phi += fifth;
                last_error = error;
            }

            let scale = if error > 0.0 {
                (0.84 * (allowed / error).powf(0.25)).clamp(0.1, 4.0)
            } else {
                4.0
            };
            h *= scale;
        }

        Ok(bounds.sign * phi)
    }
}
