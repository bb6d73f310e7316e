//! Outcome of screening one series.

use serde::Serialize;

/// Whether a sharp drop was found, and where.
///
/// `drop_time` and `max_drop` are present only when `has_drop` is set;
/// edge-based detectors never report `max_drop`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DropResult {
    pub has_drop: bool,
    pub drop_time: Option<f64>,
    /// Linear-domain ratio by which the rate fell (>= 1).
    pub max_drop: Option<f64>,
}

impl DropResult {
    /// No drop found.
    pub fn none() -> Self {
        Self {
            has_drop: false,
            drop_time: None,
            max_drop: None,
        }
    }

    /// Drop at `drop_time` by a factor of `max_drop`.
    pub fn drop_at(drop_time: f64, max_drop: f64) -> Self {
        Self {
            has_drop: true,
            drop_time: Some(drop_time),
            max_drop: Some(max_drop),
        }
    }

    /// Drop at `drop_time` with no magnitude estimate.
    pub fn edge_at(drop_time: f64) -> Self {
        Self {
            has_drop: true,
            drop_time: Some(drop_time),
            max_drop: None,
        }
    }
}

impl Default for DropResult {
    fn default() -> Self {
        Self::none()
    }
}
