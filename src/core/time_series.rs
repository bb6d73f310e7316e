//! Binned count series: paired time bins and counts.

use crate::error::{DropError, Result};

/// A borrowed, validated pair of time bins and per-bin counts.
///
/// Times are bin positions in seconds and must be strictly increasing.
/// Bins are expected to be uniformly spaced; see [`BinnedSeries::is_uniform`].
#[derive(Debug, Clone, Copy)]
pub struct BinnedSeries<'a> {
    times: &'a [f64],
    values: &'a [f64],
}

impl<'a> BinnedSeries<'a> {
    /// Validate a times/values pair.
    ///
    /// # Errors
    /// * `DimensionMismatch` if the slices differ in length
    /// * `InsufficientData` if fewer than `min_len` samples are given
    /// * `InvalidInput` for non-finite entries or non-increasing times
    pub fn new(times: &'a [f64], values: &'a [f64], min_len: usize) -> Result<Self> {
        if times.len() != values.len() {
            return Err(DropError::DimensionMismatch {
                expected: times.len(),
                got: values.len(),
            });
        }
        if times.len() < min_len {
            return Err(DropError::InsufficientData {
                needed: min_len,
                got: times.len(),
            });
        }

        if let Some(i) = times.iter().position(|t| !t.is_finite()) {
            return Err(DropError::InvalidInput(format!(
                "time bin {i} is not finite"
            )));
        }
        if let Some(i) = values.iter().position(|v| !v.is_finite()) {
            return Err(DropError::InvalidInput(format!("count {i} is not finite")));
        }

        for i in 1..times.len() {
            if times[i] <= times[i - 1] {
                return Err(DropError::InvalidInput(
                    "time bins must be strictly increasing".to_string(),
                ));
            }
        }

        Ok(Self { times, values })
    }

    /// Validate a pair destined for a log transform: every count must be > 0.
    pub fn positive(times: &'a [f64], values: &'a [f64], min_len: usize) -> Result<Self> {
        let series = Self::new(times, values, min_len)?;
        if let Some(i) = values.iter().position(|&v| v <= 0.0) {
            return Err(DropError::InvalidInput(format!(
                "count {i} is {}, log-domain detection needs strictly positive counts",
                values[i]
            )));
        }
        Ok(series)
    }

    pub fn times(&self) -> &'a [f64] {
        self.times
    }

    pub fn values(&self) -> &'a [f64] {
        self.values
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Spacing of the first two bins.
    pub fn dt(&self) -> f64 {
        if self.times.len() < 2 {
            return f64::NAN;
        }
        self.times[1] - self.times[0]
    }

    /// Distance from the first to the last bin.
    pub fn span(&self) -> f64 {
        match (self.times.first(), self.times.last()) {
            (Some(first), Some(last)) => last - first,
            _ => 0.0,
        }
    }

    /// Check that every bin spacing is within `rel_tol` of the first one.
    pub fn is_uniform(&self, rel_tol: f64) -> bool {
        let dt = self.dt();
        if !dt.is_finite() {
            return true;
        }
        self.times
            .windows(2)
            .all(|w| ((w[1] - w[0]) - dt).abs() <= rel_tol * dt.abs())
    }
}
