use crate::trace::{Hit, Severity, TraceError};

/// Per-frame ray tallies. Each stripe fills its own and they are merged once
/// the frame is done.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameStats {
    pub rays: usize,
    pub sky: usize,
    pub disk: usize,
    pub captured: usize,
    pub failed: usize,
    pub unresolved: usize,
    pub non_converged: usize,
    pub contract_violations: usize,
    /// First failure seen, kept for the log summary.
    pub first_failure: Option<String>,
}

impl FrameStats {
    pub fn record(&mut self, hit: Hit) {
        self.rays += 1;
        match hit {
            Hit::Sky => self.sky += 1,
            Hit::Disk => self.disk += 1,
            Hit::Nothing => self.captured += 1,
        }
    }

    pub fn record_failure(&mut self, err: &TraceError) {
        self.rays += 1;
        self.failed += 1;
        match err.severity() {
            Severity::ContractViolation => self.contract_violations += 1,
            Severity::NonConvergence => self.non_converged += 1,
            Severity::Unresolved => self.unresolved += 1,
        }
        if self.first_failure.is_none() {
            self.first_failure = Some(err.to_string());
        }
    }

    pub fn merge(&mut self, other: Self) {
        self.rays += other.rays;
        self.sky += other.sky;
        self.disk += other.disk;
        self.captured += other.captured;
        self.failed += other.failed;
        self.unresolved += other.unresolved;
        self.non_converged += other.non_converged;
        self.contract_violations += other.contract_violations;
        if self.first_failure.is_none() {
            self.first_failure = other.first_failure;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_adds_counts_and_keeps_first_failure() {
        let mut a = FrameStats::default();
        a.record(Hit::Sky);
        a.record(Hit::Disk);
        let mut b = FrameStats::default();
        b.record(Hit::Nothing);
        b.record_failure(&TraceError::InnerEdgePassage {
            periastron: 3.5,
            disk_inner: 4.0,
        });
        b.record_failure(&TraceError::DegenerateDirection);

        a.merge(b);
        assert_eq!(a.rays, 5);
        assert_eq!((a.sky, a.disk, a.captured, a.failed), (1, 1, 1, 2));
        assert_eq!((a.unresolved, a.contract_violations), (1, 1));
        assert!(a.first_failure.unwrap().contains("inner edge"));
    }
}
