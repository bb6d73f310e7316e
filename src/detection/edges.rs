//! Derivative-based edge detection on binned count series.
//!
//! Two edge finders share this detector:
//!
//! - [`DerivativeEdgeDetector::find_edges`] smooths the series, takes discrete
//!   first and second derivatives and keeps curvature zero crossings whose
//!   slope is steep enough.
//! - [`DerivativeEdgeDetector::canny_edges`] follows the Canny scheme in 1-D:
//!   gradient magnitude scaled to 0-100, non-maximum suppression, then double
//!   threshold with hysteresis linking.
//!
//! Both return strictly increasing sample indices.

use serde::Deserialize;
use tracing::{debug, info, warn};

use super::result::DropResult;
use crate::core::BinnedSeries;
use crate::error::{DropError, Result};
use crate::transform::{convolve_same, median_filter};
use crate::utils::max_value;

const CENTERED_DIFF: [f64; 3] = [1.0, 0.0, -1.0];
const BACKWARD_DIFF: [f64; 2] = [1.0, -1.0];

/// Fewest samples for which a second derivative and both neighbours exist.
pub const MIN_EDGE_SAMPLES: usize = 3;

/// Direction of the transitions to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeType {
    /// Rate decreasing through the edge.
    #[default]
    Falling,
    /// Rate increasing through the edge.
    Rising,
    /// Either direction.
    Both,
}

/// Which edge finder feeds [`DerivativeEdgeDetector::detect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeMethod {
    #[default]
    Derivative,
    Canny,
}

/// Double-threshold settings for the Canny edge finder (0-100 scale).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CannyConfig {
    pub strong_threshold: f64,
    pub weak_threshold: f64,
    pub median_window: usize,
}

impl Default for CannyConfig {
    fn default() -> Self {
        Self {
            strong_threshold: 95.0,
            weak_threshold: 80.0,
            median_window: 7,
        }
    }
}

/// Configuration for [`DerivativeEdgeDetector`].
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeConfig {
    /// Curvature magnitude below which the second derivative counts as zero.
    pub epsilon: f64,
    /// Minimum first-derivative magnitude (counts per millisecond).
    pub slope_threshold: f64,
    pub edge_type: EdgeType,
    /// Median filter window ahead of differentiation.
    pub median_window: usize,
    pub method: EdgeMethod,
    pub canny: CannyConfig,
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            epsilon: 60.0,
            slope_threshold: 400.0,
            edge_type: EdgeType::Falling,
            median_window: 5,
            method: EdgeMethod::Derivative,
            canny: CannyConfig::default(),
        }
    }
}

impl EdgeConfig {
    pub fn epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn slope_threshold(mut self, slope: f64) -> Self {
        self.slope_threshold = slope;
        self
    }

    pub fn edge_type(mut self, edge_type: EdgeType) -> Self {
        self.edge_type = edge_type;
        self
    }

    pub fn method(mut self, method: EdgeMethod) -> Self {
        self.method = method;
        self
    }

    pub fn canny_thresholds(mut self, strong: f64, weak: f64) -> Self {
        self.canny.strong_threshold = strong;
        self.canny.weak_threshold = weak;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.epsilon.is_finite() && self.epsilon > 0.0) {
            return Err(DropError::InvalidParameter(format!(
                "epsilon must be finite and positive, got {}",
                self.epsilon
            )));
        }
        if !(self.slope_threshold.is_finite() && self.slope_threshold >= 0.0) {
            return Err(DropError::InvalidParameter(format!(
                "slope_threshold is a magnitude and must be non-negative, got {}",
                self.slope_threshold
            )));
        }
        if self.median_window == 0 || self.canny.median_window == 0 {
            return Err(DropError::InvalidParameter(
                "median window must be at least 1".to_string(),
            ));
        }
        let (strong, weak) = (self.canny.strong_threshold, self.canny.weak_threshold);
        if !(weak > 0.0 && weak <= strong && strong <= 100.0) {
            return Err(DropError::InvalidParameter(format!(
                "canny thresholds need 0 < weak <= strong <= 100, got weak {weak}, strong {strong}"
            )));
        }
        Ok(())
    }
}

/// Locates sharp transitions in a binned count series.
#[derive(Debug, Clone, Default)]
pub struct DerivativeEdgeDetector {
    config: EdgeConfig,
}

impl DerivativeEdgeDetector {
    pub fn new(config: EdgeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EdgeConfig {
        &self.config
    }

    /// Edges at curvature zero crossings with slope beyond the threshold.
    ///
    /// # Errors
    /// `InsufficientData` below three samples, other invalid-input variants
    /// for mismatched lengths, non-finite values or non-increasing times.
    pub fn find_edges(&self, times: &[f64], values: &[f64]) -> Result<Vec<usize>> {
        let series = BinnedSeries::new(times, values, MIN_EDGE_SAMPLES)?;
        let n = series.len();

        let smooth = median_filter(values, self.config.median_window);

        // Sampling interval in ms, the unit of slope_threshold
        let dt = series.span() * 1000.0 / n as f64;
        let diff1: Vec<f64> = convolve_same(&smooth, &CENTERED_DIFF)
            .into_iter()
            .map(|d| d / dt)
            .collect();
        let diff2: Vec<f64> = convolve_same(&diff1, &BACKWARD_DIFF)
            .into_iter()
            .map(|d| d / dt)
            .collect();

        let eps = self.config.epsilon;
        let slope = self.config.slope_threshold;
        let edges: Vec<usize> = (1..n - 1)
            .filter(|&i| diff2[i].abs() < eps && sign(diff2[i - 1]) * sign(diff2[i + 1]) < 0.0)
            .filter(|&i| match self.config.edge_type {
                EdgeType::Falling => diff1[i] < -slope && diff2[i - 1] < 0.0,
                EdgeType::Rising => diff1[i] > slope && diff2[i - 1] > 0.0,
                EdgeType::Both => diff1[i].abs() > slope,
            })
            .collect();

        debug!(?edges, edge_type = ?self.config.edge_type, "derivative edges");
        Ok(edges)
    }

    /// Canny-style edges: suppressed gradient peaks linked by hysteresis.
    ///
    /// A flat series has no gradient and yields no edges.
    pub fn canny_edges(&self, times: &[f64], values: &[f64]) -> Result<Vec<usize>> {
        let series = BinnedSeries::new(times, values, MIN_EDGE_SAMPLES)?;
        let n = series.len();
        let canny = self.config.canny;

        let smooth = median_filter(values, canny.median_window);
        let mut grad: Vec<f64> = convolve_same(&smooth, &CENTERED_DIFF)
            .into_iter()
            .map(f64::abs)
            .collect();
        grad[0] = 0.0;
        grad[n - 1] = 0.0;

        let peak = match max_value(&grad) {
            Some(p) if p > 0.0 => p,
            _ => return Ok(Vec::new()),
        };
        for g in grad.iter_mut() {
            *g = *g / peak * 100.0;
        }

        let thinned = non_max_suppression(&grad);
        let edges = hysteresis_link(&thinned, canny.strong_threshold, canny.weak_threshold);

        debug!(?edges, "canny edges");
        Ok(edges)
    }

    /// Edge indices from the configured method.
    pub fn edges(&self, times: &[f64], values: &[f64]) -> Result<Vec<usize>> {
        match self.config.method {
            EdgeMethod::Derivative => self.find_edges(times, values),
            EdgeMethod::Canny => self.canny_edges(times, values),
        }
    }

    /// Report the most recent edge as the drop time.
    pub fn detect(&self, times: &[f64], values: &[f64]) -> Result<DropResult> {
        let series = BinnedSeries::new(times, values, MIN_EDGE_SAMPLES)?;
        if !series.is_uniform(1e-6) {
            warn!("time bins are not uniformly spaced, slopes use the mean bin width");
        }

        let edges = self.edges(times, values)?;
        let result = match edges.last() {
            Some(&i) => DropResult::edge_at(times[i]),
            None => DropResult::none(),
        };
        info!(
            has_drop = result.has_drop,
            drop_time = ?result.drop_time,
            n_edges = edges.len(),
            "edge scan"
        );
        Ok(result)
    }
}

/// Zero every point smaller than either neighbour; both ends are zeroed.
pub fn non_max_suppression(response: &[f64]) -> Vec<f64> {
    let n = response.len();
    let mut thinned = vec![0.0; n];
    for i in 1..n.saturating_sub(1) {
        if response[i] >= response[i - 1] && response[i] >= response[i + 1] {
            thinned[i] = response[i];
        }
    }
    thinned
}

/// Double threshold: strong points are kept, weak points (`[weak, strong)`)
/// only when directly next to a strong one. Returns ascending indices.
pub fn hysteresis_link(response: &[f64], strong: f64, weak: f64) -> Vec<usize> {
    let n = response.len();
    let is_strong: Vec<bool> = response.iter().map(|&r| r >= strong).collect();

    (0..n)
        .filter(|&i| {
            if is_strong[i] {
                return true;
            }
            let r = response[i];
            r >= weak
                && r < strong
                && ((i > 0 && is_strong[i - 1]) || (i + 1 < n && is_strong[i + 1]))
        })
        .collect()
}

/// Sign with zero mapped to zero, unlike `f64::signum`.
fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}
