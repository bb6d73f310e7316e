//! Change-point based drop detection.
//!
//! The count series is moved to the log2 domain, where a multiplicative drop
//! ("the rate falls to a third") becomes an additive shift of the segment
//! mean independent of the baseline rate. PELT segments the log series, and
//! the steepest negative step between consecutive segment means is compared
//! against `log2(drop_threshold)`.

use std::time::Duration;

use tracing::{debug, info, warn};

use super::result::DropResult;
use crate::changepoint::{pelt_detect, Kernel, PeltConfig, SearchBudget};
use crate::core::BinnedSeries;
use crate::error::{DropError, Result};
use crate::utils::{argmin, diff};

/// Relative tolerance for the uniform-binning check.
const UNIFORM_TOLERANCE: f64 = 1e-6;

/// Configuration for [`ChangePointDropDetector`].
#[derive(Debug, Clone)]
pub struct DropoffConfig {
    /// Expected duration of the drop in seconds; sets the minimum segment size.
    pub characteristic_time: f64,
    /// Penalty per changepoint (higher = fewer, more conservative segments).
    pub penalty: f64,
    /// Minimum linear-domain factor by which the rate must fall.
    pub drop_threshold: f64,
    /// Kernel of the segmentation cost.
    pub kernel: Kernel,
    /// Time guard for the segmentation search.
    pub budget: SearchBudget,
}

impl Default for DropoffConfig {
    fn default() -> Self {
        Self {
            characteristic_time: 2e-4,
            penalty: 1.0,
            drop_threshold: 3.0,
            kernel: Kernel::Linear,
            budget: SearchBudget::unlimited(),
        }
    }
}

impl DropoffConfig {
    pub fn characteristic_time(mut self, seconds: f64) -> Self {
        self.characteristic_time = seconds;
        self
    }

    pub fn penalty(mut self, penalty: f64) -> Self {
        self.penalty = penalty;
        self
    }

    pub fn drop_threshold(mut self, ratio: f64) -> Self {
        self.drop_threshold = ratio;
        self
    }

    pub fn kernel(mut self, kernel: Kernel) -> Self {
        self.kernel = kernel;
        self
    }

    pub fn max_duration(mut self, max_duration: Duration) -> Self {
        self.budget = SearchBudget::with_max_duration(max_duration);
        self
    }

    /// Check that every tunable is usable.
    pub fn validate(&self) -> Result<()> {
        if !(self.characteristic_time.is_finite() && self.characteristic_time >= 0.0) {
            return Err(DropError::InvalidParameter(format!(
                "characteristic_time must be finite and non-negative, got {}",
                self.characteristic_time
            )));
        }
        if !(self.penalty.is_finite() && self.penalty >= 0.0) {
            return Err(DropError::InvalidParameter(format!(
                "penalty must be finite and non-negative, got {}",
                self.penalty
            )));
        }
        if !(self.drop_threshold.is_finite() && self.drop_threshold > 0.0) {
            return Err(DropError::InvalidParameter(format!(
                "drop_threshold must be finite and positive, got {}",
                self.drop_threshold
            )));
        }
        if let Kernel::Rbf { gamma: Some(g) } = self.kernel {
            if !(g.is_finite() && g > 0.0) {
                return Err(DropError::InvalidParameter(format!(
                    "rbf gamma must be finite and positive, got {g}"
                )));
            }
        }
        Ok(())
    }
}

/// Detection outcome together with the segmentation behind it.
#[derive(Debug, Clone)]
pub struct DropAnalysis {
    pub result: DropResult,
    /// Segment ends; the last one equals the series length.
    pub breakpoints: Vec<usize>,
    /// Segment means back in the linear domain (`2^log_mean`).
    pub segment_means: Vec<f64>,
    /// Sample standard deviation of the raw counts in each segment.
    pub segment_std_devs: Vec<f64>,
    /// `log_mean[k+1] - log_mean[k]` for consecutive segments.
    pub log_mean_diffs: Vec<f64>,
    /// Magnitude of the steepest negative step; `None` with a single segment.
    pub max_drop_log: Option<f64>,
    pub min_segment_size: usize,
}

/// Flags a sharp drop in a binned count series by log-domain segmentation.
#[derive(Debug, Clone, Default)]
pub struct ChangePointDropDetector {
    config: DropoffConfig,
}

impl ChangePointDropDetector {
    /// Create a detector, rejecting unusable configuration.
    pub fn new(config: DropoffConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &DropoffConfig {
        &self.config
    }

    /// Smallest segment the search may produce for bin width `dt`.
    pub fn min_segment_size(&self, dt: f64) -> usize {
        let samples = (self.config.characteristic_time / dt).ceil();
        if samples.is_nan() {
            2
        } else {
            // Saturates at usize::MAX when dt underflows the ratio
            (samples as usize).max(2)
        }
    }

    /// Screen `values` binned at `times` for a sharp drop.
    ///
    /// # Errors
    /// * `InvalidInput`/`DimensionMismatch`/`InsufficientData` for fewer than
    ///   two samples, mismatched lengths, non-positive counts or
    ///   non-increasing times
    /// * `Timeout` when the segmentation budget runs out
    pub fn detect(&self, times: &[f64], values: &[f64]) -> Result<DropResult> {
        self.analyze(times, values).map(|analysis| analysis.result)
    }

    /// Like [`detect`](Self::detect) but also returns the segmentation.
    pub fn analyze(&self, times: &[f64], values: &[f64]) -> Result<DropAnalysis> {
        let series = BinnedSeries::positive(times, values, 2)?;
        if !series.is_uniform(UNIFORM_TOLERANCE) {
            warn!("time bins are not uniformly spaced, using the first bin width");
        }

        let dt = series.dt();
        let min_segment_size = self.min_segment_size(dt);
        let log_values: Vec<f64> = values.iter().map(|v| v.log2()).collect();

        let pelt = PeltConfig::default()
            .kernel(self.config.kernel)
            .penalty(self.config.penalty)
            .min_segment_length(min_segment_size)
            .budget(self.config.budget);
        let segmentation = pelt_detect(&log_values, &pelt)?;

        let breakpoints = segmentation.breakpoints();
        let log_means: Vec<f64> = segmentation
            .segments
            .iter()
            .map(|s| s.log_mean(&log_values))
            .collect();
        let segment_means: Vec<f64> = log_means.iter().map(|m| m.exp2()).collect();
        let segment_std_devs: Vec<f64> = segmentation
            .segments
            .iter()
            .map(|s| s.std_dev(values))
            .collect();
        let log_mean_diffs = diff(&log_means);

        let breakpoint_times: Vec<f64> = segmentation
            .changepoints
            .iter()
            .map(|&i| times[i])
            .collect();
        debug!(?breakpoint_times, ?segment_means, ?segment_std_devs, "segmentation");

        let Some(drop_index) = argmin(&log_mean_diffs) else {
            info!("no change point found, BH drop detected: false");
            return Ok(DropAnalysis {
                result: DropResult::none(),
                breakpoints,
                segment_means,
                segment_std_devs,
                log_mean_diffs,
                max_drop_log: None,
                min_segment_size,
            });
        };

        let max_drop_log = -log_mean_diffs[drop_index];
        info!(sharpest_drop = max_drop_log.exp2(), "sharpest drop");

        let result = if max_drop_log >= self.config.drop_threshold.log2() {
            let drop_time = times[breakpoints[drop_index]];
            info!(drop_time, "potential BH formation");
            DropResult::drop_at(drop_time, max_drop_log.exp2())
        } else {
            DropResult::none()
        };
        info!(has_drop = result.has_drop, "BH drop detected");

        Ok(DropAnalysis {
            result,
            breakpoints,
            segment_means,
            segment_std_devs,
            log_mean_diffs,
            max_drop_log: Some(max_drop_log),
            min_segment_size,
        })
    }
}
