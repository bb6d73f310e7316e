//! PELT (Pruned Exact Linear Time) search over a kernel segmentation cost.
//!
//! Minimizes `sum(segment costs) + penalty * n_changepoints` subject to a
//! minimum segment length.

use std::time::{Duration, Instant};

use tracing::debug;

use super::cost::{Kernel, KernelCost};
use super::segment::{segments_from_breakpoints, Segment};
use crate::error::{DropError, Result};

/// Wall-clock guard for the segmentation search.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SearchBudget {
    /// Abort with [`DropError::Timeout`] once the search runs this long.
    pub max_duration: Option<Duration>,
}

impl SearchBudget {
    /// No limit.
    pub fn unlimited() -> Self {
        Self::default()
    }

    /// Limit the search to `max_duration`.
    pub fn with_max_duration(max_duration: Duration) -> Self {
        Self {
            max_duration: Some(max_duration),
        }
    }

    fn check(&self, started: Instant) -> Result<()> {
        if let Some(max) = self.max_duration {
            let elapsed = started.elapsed();
            if elapsed >= max {
                return Err(DropError::Timeout { elapsed });
            }
        }
        Ok(())
    }
}

/// Configuration for PELT algorithm.
#[derive(Debug, Clone)]
pub struct PeltConfig {
    /// Kernel of the segment cost
    pub kernel: Kernel,
    /// Penalty for each changepoint (controls number of changepoints)
    pub penalty: f64,
    /// Minimum segment length
    pub min_segment_length: usize,
    /// Search time guard
    pub budget: SearchBudget,
}

impl Default for PeltConfig {
    fn default() -> Self {
        Self {
            kernel: Kernel::Linear,
            penalty: 1.0,
            min_segment_length: 2,
            budget: SearchBudget::unlimited(),
        }
    }
}

impl PeltConfig {
    /// Set the kernel.
    pub fn kernel(mut self, kernel: Kernel) -> Self {
        self.kernel = kernel;
        self
    }

    /// Set the penalty.
    pub fn penalty(mut self, penalty: f64) -> Self {
        self.penalty = penalty;
        self
    }

    /// Set minimum segment length.
    pub fn min_segment_length(mut self, min_len: usize) -> Self {
        self.min_segment_length = min_len.max(1);
        self
    }

    /// Set the search time guard.
    pub fn budget(mut self, budget: SearchBudget) -> Self {
        self.budget = budget;
        self
    }
}

/// Result of PELT changepoint detection.
#[derive(Debug, Clone)]
pub struct PeltResult {
    /// Detected changepoint indices (first sample of each new segment)
    pub changepoints: Vec<usize>,
    /// Segments covering the whole series, in order
    pub segments: Vec<Segment>,
    /// Total cost (excluding penalty)
    pub cost: f64,
    /// Number of changepoints
    pub n_changepoints: usize,
}

impl PeltResult {
    /// Segment ends, the last one being the series length.
    pub fn breakpoints(&self) -> Vec<usize> {
        self.segments.iter().map(|s| s.end).collect()
    }
}

/// Detect changepoints using the PELT algorithm.
///
/// A series shorter than two minimum segments is returned as one segment.
///
/// # Errors
/// `Timeout` when the configured budget runs out.
pub fn pelt_detect(series: &[f64], config: &PeltConfig) -> Result<PeltResult> {
    let n = series.len();
    let min_len = config.min_segment_length.max(1);
    let cost = KernelCost::fit(series, config.kernel);

    if n < min_len.saturating_mul(2) {
        return Ok(PeltResult {
            changepoints: Vec::new(),
            segments: if n > 0 {
                vec![Segment::new(0, n)]
            } else {
                Vec::new()
            },
            cost: cost.error(0, n),
            n_changepoints: 0,
        });
    }

    let started = Instant::now();

    // F[t] = minimum penalized cost of segmenting series[0..t]
    let mut f = vec![f64::INFINITY; n + 1];
    f[0] = -config.penalty; // So first segment doesn't get penalized twice

    // cp[t] = optimal last changepoint for series[0..t]
    let mut cp: Vec<usize> = vec![0; n + 1];

    // R = set of candidate changepoints (pruned)
    let mut candidates: Vec<usize> = vec![0];

    // A candidate beaten at step t only loses for ends T >= t + min_len,
    // so its removal is deferred until then.
    let mut removal_at: Vec<Option<usize>> = vec![None; n + 1];

    for t in min_len..=n {
        config.budget.check(started)?;

        candidates.retain(|&s| removal_at[s].is_none_or(|at| at > t));

        let mut best_cost = f64::INFINITY;
        let mut best_cp = 0;

        for &s in &candidates {
            if t - s >= min_len {
                let total = f[s] + cost.error(s, t) + config.penalty;
                if total < best_cost {
                    best_cost = total;
                    best_cp = s;
                }
            }
        }

        f[t] = best_cost;
        cp[t] = best_cp;

        // Pruning: schedule candidates that can never be optimal again
        for &s in &candidates {
            if t - s >= min_len && removal_at[s].is_none() && f[s] + cost.error(s, t) > f[t] {
                removal_at[s] = Some(t + min_len);
            }
        }

        candidates.push(t);
    }

    // Backtrack to find changepoints
    let mut changepoints = Vec::new();
    let mut t = n;
    while t > 0 {
        let prev = cp[t];
        if prev > 0 {
            changepoints.push(prev);
        }
        t = prev;
    }
    changepoints.reverse();

    let breakpoints: Vec<usize> = changepoints
        .iter()
        .copied()
        .chain(std::iter::once(n))
        .collect();
    let segments = segments_from_breakpoints(&breakpoints);

    let total_cost: f64 = segments.iter().map(|s| cost.error(s.start, s.end)).sum();

    debug!(
        n,
        min_len,
        penalty = config.penalty,
        gamma = cost.gamma(),
        n_changepoints = changepoints.len(),
        elapsed_us = started.elapsed().as_micros() as u64,
        "pelt search finished"
    );

    Ok(PeltResult {
        n_changepoints: changepoints.len(),
        changepoints,
        segments,
        cost: total_cost,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn pelt_no_changepoint() {
        let series = vec![5.0; 20];
        let config = PeltConfig::default().penalty(10.0);
        let result = pelt_detect(&series, &config).unwrap();

        assert_eq!(result.n_changepoints, 0);
        assert_eq!(result.segments, vec![Segment::new(0, 20)]);
        assert_eq!(result.breakpoints(), vec![20]);
    }

    #[test]
    fn pelt_one_clear_changepoint() {
        let mut series = vec![0.0; 10];
        series.extend(vec![10.0; 10]);

        let config = PeltConfig::default().penalty(2.0);
        let result = pelt_detect(&series, &config).unwrap();

        assert_eq!(result.n_changepoints, 1);
        assert_eq!(result.changepoints[0], 10);
        assert_eq!(result.breakpoints(), vec![10, 20]);
        assert_relative_eq!(result.cost, 0.0, epsilon = 1e-10);
    }

    #[test]
    fn pelt_two_changepoints() {
        let mut series = vec![0.0; 10];
        series.extend(vec![10.0; 10]);
        series.extend(vec![0.0; 10]);

        let config = PeltConfig::default().penalty(2.0);
        let result = pelt_detect(&series, &config).unwrap();

        assert_eq!(result.changepoints, vec![10, 20]);
    }

    #[test]
    fn pelt_short_series() {
        let series = vec![1.0, 2.0, 3.0];
        let result = pelt_detect(&series, &PeltConfig::default()).unwrap();

        assert_eq!(result.n_changepoints, 0);
        assert_eq!(result.breakpoints(), vec![3]);
    }

    #[test]
    fn pelt_empty_series() {
        let series: Vec<f64> = vec![];
        let result = pelt_detect(&series, &PeltConfig::default()).unwrap();

        assert_eq!(result.n_changepoints, 0);
        assert!(result.segments.is_empty());
    }

    #[test]
    fn pelt_high_penalty_no_changepoints() {
        // Cost without a changepoint is 50000
        let mut series = vec![0.0; 10];
        series.extend(vec![100.0; 10]);

        let config = PeltConfig::default().penalty(100000.0);
        let result = pelt_detect(&series, &config).unwrap();

        assert_eq!(result.n_changepoints, 0);
    }

    #[test]
    fn pelt_config_builder() {
        let config = PeltConfig::default()
            .kernel(Kernel::Rbf { gamma: None })
            .penalty(5.0)
            .min_segment_length(0);

        assert_eq!(config.kernel, Kernel::Rbf { gamma: None });
        assert_relative_eq!(config.penalty, 5.0, epsilon = 1e-10);
        assert_eq!(config.min_segment_length, 1);
    }

    /// Exhaustive O(n^2) optimal partition under the same constraints.
    fn optimal_penalized_cost(series: &[f64], penalty: f64, min_len: usize) -> f64 {
        let n = series.len();
        let cost = KernelCost::fit(series, Kernel::Linear);
        if n < 2 * min_len {
            return cost.error(0, n);
        }

        let mut f = vec![f64::INFINITY; n + 1];
        f[0] = -penalty;
        for t in min_len..=n {
            for s in std::iter::once(0).chain(min_len..=t - min_len) {
                f[t] = f[t].min(f[s] + cost.error(s, t) + penalty);
            }
        }
        f[n]
    }

    fn penalized_cost(result: &PeltResult, penalty: f64) -> f64 {
        result.cost + penalty * result.n_changepoints as f64
    }

    #[test]
    fn pelt_matches_exhaustive_search() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..400 {
            let n = rng.gen_range(1..48);
            let min_len = rng.gen_range(1..=4);
            let penalty = rng.gen_range(0.1..3.0);
            let series: Vec<f64> = (0..n)
                .map(|_| rng.gen_range(0..5) as f64 + rng.gen_range(-0.5..0.5))
                .collect();

            let config = PeltConfig::default()
                .penalty(penalty)
                .min_segment_length(min_len);
            let result = pelt_detect(&series, &config).unwrap();

            assert_relative_eq!(
                penalized_cost(&result, penalty),
                optimal_penalized_cost(&series, penalty, min_len),
                epsilon = 1e-9,
                max_relative = 1e-9
            );
            assert!(result.segments.iter().all(|s| s.len() >= min_len.min(n)));
        }
    }

    #[test]
    fn pruned_candidate_still_ends_short_segment() {
        // A candidate beaten at t can still be the best split for t + 1
        let series = [
            3.0, 4.0, 3.0, 4.0, 4.0, 2.0, 3.0, 1.0, 4.0, 1.0, 2.0, 4.0, 3.0, 1.0, 2.0, 4.0, 1.0,
            1.0, 4.0, 1.0, 2.0, 0.0, 4.0, 1.0, 3.0, 3.0,
        ];
        let result = pelt_detect(&series, &PeltConfig::default()).unwrap();

        assert_eq!(result.breakpoints(), vec![5, 9, 11, 13, 15, 19, 22, 26]);
        assert_relative_eq!(penalized_cost(&result, 1.0), 30.45, epsilon = 1e-9);
    }

    #[test]
    fn pelt_min_segment_length() {
        // Changepoint at position 2, but min_segment_length = 5
        let mut series = vec![0.0; 2];
        series.extend(vec![100.0; 18]);

        let config = PeltConfig::default().min_segment_length(5);
        let result = pelt_detect(&series, &config).unwrap();

        for segment in &result.segments {
            assert!(segment.len() >= 5);
        }
    }

    #[test]
    fn rbf_kernel_finds_spread_change() {
        // Same mean on both sides, only the amplitude changes
        let series: Vec<f64> = (0..60)
            .map(|i| {
                let amp = if i < 30 { 0.1 } else { 3.0 };
                if i % 2 == 0 {
                    amp
                } else {
                    -amp
                }
            })
            .collect();

        let linear = pelt_detect(&series, &PeltConfig::default().penalty(5.0)).unwrap();
        assert_eq!(linear.n_changepoints, 0);

        let rbf = pelt_detect(
            &series,
            &PeltConfig::default()
                .kernel(Kernel::Rbf { gamma: None })
                .penalty(5.0),
        )
        .unwrap();
        assert_eq!(rbf.changepoints, vec![30]);
    }

    #[test]
    fn exhausted_budget_times_out() {
        let series = vec![1.0; 50];
        let config = PeltConfig::default().budget(SearchBudget::with_max_duration(Duration::ZERO));

        let result = pelt_detect(&series, &config);
        assert!(matches!(result, Err(DropError::Timeout { .. })));
    }

    #[test]
    fn short_series_ignores_budget() {
        let config = PeltConfig::default().budget(SearchBudget::with_max_duration(Duration::ZERO));
        assert!(pelt_detect(&[1.0, 2.0], &config).is_ok());
    }
}
