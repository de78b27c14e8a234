use super::workspace::{Interval, Workspace};
use super::{Bounds, DeflectionIntegrator, IntegrationError, IntegrationMethod};
use crate::geodesic::geodesic;

// 21-point Kronrod abscissae (positive half) with the embedded 10-point Gauss rule
// on the odd entries.
const XGK: [f64; 11] = [
    0.995657163025808080735527280689003,
    0.973906528517171720077964012084452,
    0.930157491355708226001207180059508,
    0.865063366688984510732096688423493,
    0.780817726586416897063717578345042,
    0.679409568299024406234327365114874,
    0.562757134668604683339000099272694,
    0.433395394129247190799265943165784,
    0.294392862701460198131126603103866,
    0.148874338981631210884826001129720,
    0.000000000000000000000000000000000,
];

const WGK: [f64; 11] = [
    0.011694638867371874278064396062192,
    0.032558162307964727478818972459390,
    0.054755896574351996031381300244580,
    0.075039674810919952767043140916190,
    0.093125454583697605535065465083366,
    0.109387158802297641899210590325805,
    0.123491976262065851077208980201585,
    0.134709217311473325928054001771707,
    0.142775938577060080797094273138717,
    0.147739104901338491374841515972068,
    0.149445554002916905664936468389821,
];

const WG: [f64; 5] = [
    0.066671344308688137593568809893332,
    0.149451349150580593145776339657697,
    0.219086362515982043995534934228163,
    0.269266719309996355091226921569469,
    0.295524224714752870173892994651338,
];

/// Globally adaptive Gauss-Kronrod (G10/K21) quadrature in `r`.
pub struct AdaptiveQuadrature {
    pub epsabs: f64,
    pub epsrel: f64,
    workspace: Workspace,
}

impl Default for AdaptiveQuadrature {
    fn default() -> Self {
        Self::new(Workspace::default())
    }
}

impl AdaptiveQuadrature {
    pub fn new(workspace: Workspace) -> Self {
        Self {
            epsabs: 1e-12,
            epsrel: 1e-10,
            workspace,
        }
    }

    pub fn with_tolerance(mut self, epsabs: f64, epsrel: f64) -> Self {
        self.epsabs = epsabs;
        self.epsrel = epsrel;
        self
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }
}

fn gauss_kronrod_21(f: impl Fn(f64) -> f64, lower: f64, upper: f64) -> Interval {
    let center = 0.5 * (lower + upper);
    let half_length = 0.5 * (upper - lower);

    let mut kronrod = f(center) * WGK[10];
    let mut gauss = 0.0;
    for j in 0..10 {
        let dx = half_length * XGK[j];
        let pair = f(center - dx) + f(center + dx);
        kronrod += WGK[j] * pair;
        if j % 2 == 1 {
            gauss += WG[j / 2] * pair;
        }
    }

    Interval {
        lower,
        upper,
        result: kronrod * half_length,
        error: ((kronrod - gauss) * half_length).abs(),
    }
}

impl DeflectionIntegrator for AdaptiveQuadrature {
    fn integrate(&mut self, r0: f64, r1: f64, b: f64) -> Result<f64, IntegrationError> {
        let Some(bounds) = Bounds::check(r0, r1, b)? else {
            return Ok(0.0);
        };
        let f = |r: f64| geodesic(r, b);
        let (epsabs, epsrel) = (self.epsabs, self.epsrel);

        let mut scratch = self.workspace.begin();
        scratch.push(gauss_kronrod_21(f, bounds.near, bounds.far));

        loop {
            let (total, error) = scratch.totals();
            if error <= epsabs.max(epsrel * total.abs()) {
                return Ok(bounds.sign * total);
            }

            let no_convergence = IntegrationError::NoConvergence {
                method: IntegrationMethod::Adaptive,
                estimated_error: error,
            };
            if scratch.is_full() {
                return Err(no_convergence);
            }
            let Some(worst) = scratch.pop_worst() else {
                return Err(no_convergence);
            };
            let mid = 0.5 * (worst.lower + worst.upper);
            if mid <= worst.lower || mid >= worst.upper {
                // Interval already at the resolution of f64.
                return Err(no_convergence);
            }
            scratch.push(gauss_kronrod_21(f, worst.lower, mid));
            scratch.push(gauss_kronrod_21(f, mid, worst.upper));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kronrod_rule_is_exact_for_polynomials() {
        let interval = gauss_kronrod_21(|x| 3.0 * x * x + 1.0, 0.0, 2.0);
        assert!((interval.result - 10.0).abs() < 1e-13);
        assert!(interval.error < 1e-13);
    }

    #[test]
    fn workspace_is_clear_after_success_and_failure() {
        let mut integrator = AdaptiveQuadrature::default();
        integrator.integrate(10.0, 6000.0, 8.0).unwrap();
        assert!(integrator.workspace().is_clear());

        let mut starved = AdaptiveQuadrature::new(Workspace::with_limit(1)).with_tolerance(0.0, 1e-15);
        let error = starved.integrate(10.0, 6000.0, 8.0).unwrap_err();
        assert!(matches!(
            error,
            IntegrationError::NoConvergence {
                method: IntegrationMethod::Adaptive,
                ..
            }
        ));
        assert!(starved.workspace().is_clear());
    }
}
