use std::cmp::Ordering;
use std::collections::BinaryHeap;

pub const DEFAULT_INTERVAL_LIMIT: usize = 1000;

/// One subinterval of an adaptive quadrature together with its local
/// Gauss-Kronrod estimate.
#[derive(Clone, Copy, Debug)]
pub struct Interval {
    pub lower: f64,
    pub upper: f64,
    pub result: f64,
    pub error: f64,
}

impl PartialEq for Interval {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Interval {}

impl PartialOrd for Interval {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Interval {
    // Max-heap on the error estimate: the worst interval is split first.
    fn cmp(&self, other: &Self) -> Ordering {
        self.error.total_cmp(&other.error)
    }
}

/// Reusable subdivision storage for [`super::AdaptiveQuadrature`].
///
/// Contents only live for one integral: they are reachable through
/// [`Workspace::begin`], and the returned [`Scratch`] empties the heap when it
/// is dropped, whichever way the integral ends.
pub struct Workspace {
    heap: BinaryHeap<Interval>,
    limit: usize,
}

impl Default for Workspace {
    fn default() -> Self {
        Self::with_limit(DEFAULT_INTERVAL_LIMIT)
    }
}

impl Workspace {
    pub fn with_limit(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            heap: BinaryHeap::with_capacity(limit),
            limit,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn is_clear(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn begin(&mut self) -> Scratch<'_> {
        debug_assert!(self.heap.is_empty(), "workspace scratch leaked from a previous call");
        self.heap.clear();
        Scratch {
            workspace: self,
            total: 0.0,
            error: 0.0,
        }
    }
}

pub struct Scratch<'a> {
    workspace: &'a mut Workspace,
    total: f64,
    error: f64,
}

impl Scratch<'_> {
    pub fn push(&mut self, interval: Interval) {
        self.total += interval.result;
        self.error += interval.error;
        self.workspace.heap.push(interval);
    }

    pub fn pop_worst(&mut self) -> Option<Interval> {
        let interval = self.workspace.heap.pop()?;
        self.total -= interval.result;
        self.error = (self.error - interval.error).max(0.0);
        Some(interval)
    }

    pub fn len(&self) -> usize {
        self.workspace.heap.len()
    }

    /// No room left to split another interval.
    pub fn is_full(&self) -> bool {
        self.len() >= self.workspace.limit
    }

    /// Running sum of the results and error estimates of all live intervals.
    pub fn totals(&self) -> (f64, f64) {
        (self.total, self.error)
    }
}

impl Drop for Scratch<'_> {
    fn drop(&mut self) {
        self.workspace.heap.clear();
    }
}
