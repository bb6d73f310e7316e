//! Kernel cost functions for changepoint detection.
//!
//! A kernel cost measures how far a segment is from being homogeneous in the
//! feature space induced by a kernel `k`:
//!
//! ```text
//! c(x[a..b]) = sum_i k(x_i, x_i) - 1/(b-a) * sum_i sum_j k(x_i, x_j)
//! ```
//!
//! Lower cost indicates a better fit. The linear kernel reduces this to the
//! residual sum of squares around the segment mean (sensitive to mean shifts).
//! The Gaussian (RBF) kernel also reacts to changes in spread.

use crate::utils::median;

/// Largest number of samples used when estimating the RBF bandwidth.
const GAMMA_SAMPLE_LIMIT: usize = 512;

/// Kernel used by the segmentation cost.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Kernel {
    /// `k(x, y) = x * y`; cost is the sum of squared deviations from the mean.
    #[default]
    Linear,
    /// `k(x, y) = exp(-gamma * (x - y)^2)`.
    ///
    /// With `gamma = None` the bandwidth is set from the median pairwise
    /// squared distance of the signal.
    Rbf { gamma: Option<f64> },
}

/// Segment cost fitted to a signal, queried by index range.
#[derive(Debug, Clone)]
pub struct KernelCost<'a> {
    signal: &'a [f64],
    kernel: Kernel,
    gamma: f64,
    cum_sum: Vec<f64>,
    cum_sum_sq: Vec<f64>,
}

impl<'a> KernelCost<'a> {
    /// Precompute whatever the kernel needs for constant-time queries.
    pub fn fit(signal: &'a [f64], kernel: Kernel) -> Self {
        let (cum_sum, cum_sum_sq, gamma) = match kernel {
            Kernel::Linear => {
                let cum_sum: Vec<f64> = std::iter::once(0.0)
                    .chain(signal.iter().scan(0.0, |acc, &x| {
                        *acc += x;
                        Some(*acc)
                    }))
                    .collect();
                let cum_sum_sq: Vec<f64> = std::iter::once(0.0)
                    .chain(signal.iter().scan(0.0, |acc, &x| {
                        *acc += x * x;
                        Some(*acc)
                    }))
                    .collect();
                (cum_sum, cum_sum_sq, 0.0)
            }
            Kernel::Rbf { gamma } => (
                Vec::new(),
                Vec::new(),
                gamma.unwrap_or_else(|| median_heuristic_gamma(signal)),
            ),
        };

        Self {
            signal,
            kernel,
            gamma,
            cum_sum,
            cum_sum_sq,
        }
    }

    /// Number of samples in the fitted signal.
    pub fn len(&self) -> usize {
        self.signal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signal.is_empty()
    }

    /// Bandwidth in use (0 for the linear kernel).
    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    /// Cost of `signal[start..end]`.
    pub fn error(&self, start: usize, end: usize) -> f64 {
        if end <= start {
            return 0.0;
        }
        match self.kernel {
            Kernel::Linear => {
                let n = (end - start) as f64;
                let sum = self.cum_sum[end] - self.cum_sum[start];
                let sum_sq = self.cum_sum_sq[end] - self.cum_sum_sq[start];
                (sum_sq - sum * sum / n).max(0.0)
            }
            Kernel::Rbf { .. } => rbf_cost(&self.signal[start..end], self.gamma),
        }
    }
}

/// Gaussian kernel cost with bandwidth `gamma`.
///
/// Quadratic in the segment length.
pub fn rbf_cost(segment: &[f64], gamma: f64) -> f64 {
    let n = segment.len();
    if n == 0 {
        return 0.0;
    }

    let mut gram_sum = n as f64;
    for i in 0..n {
        for j in (i + 1)..n {
            let d = segment[i] - segment[j];
            gram_sum += 2.0 * (-gamma * d * d).exp();
        }
    }

    (n as f64 - gram_sum / n as f64).max(0.0)
}

/// Inverse median of pairwise squared distances.
///
/// Long signals are subsampled at a fixed stride. Returns 1 when the median
/// distance is zero.
pub fn median_heuristic_gamma(signal: &[f64]) -> f64 {
    let stride = signal.len().div_ceil(GAMMA_SAMPLE_LIMIT).max(1);
    let sample: Vec<f64> = signal.iter().step_by(stride).copied().collect();

    let mut distances = Vec::with_capacity(sample.len() * sample.len().saturating_sub(1) / 2);
    for i in 0..sample.len() {
        for j in (i + 1)..sample.len() {
            distances.push((sample[i] - sample[j]).powi(2));
        }
    }

    let med = median(&distances);
    if med.is_finite() && med > 0.0 {
        1.0 / med
    } else {
        1.0
    }
}
