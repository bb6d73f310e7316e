//! Contiguous index ranges produced by a segmentation.

use crate::utils::{mean, std_dev};

/// Half-open index range `[start, end)` over a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub start: usize,
    pub end: usize,
}

impl Segment {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Mean of `series` over the segment (NaN when empty).
    pub fn mean(&self, series: &[f64]) -> f64 {
        mean(&series[self.start..self.end])
    }

    /// Mean of an already log2-transformed series over the segment.
    pub fn log_mean(&self, log_values: &[f64]) -> f64 {
        self.mean(log_values)
    }

    /// Sample standard deviation of the linear-domain values.
    pub fn std_dev(&self, values: &[f64]) -> f64 {
        std_dev(&values[self.start..self.end])
    }
}

/// Build segments from ruptures-style breakpoints (segment ends, last == n).
pub fn segments_from_breakpoints(breakpoints: &[usize]) -> Vec<Segment> {
    let mut start = 0;
    breakpoints
        .iter()
        .filter_map(|&end| {
            if end <= start {
                return None;
            }
            let segment = Segment::new(start, end);
            start = end;
            Some(segment)
        })
        .collect()
}
