//! # sharpdrop
//!
//! Sharp count-rate drop detection for binned neutrino time series.
//!
//! A sudden collapse of the neutrino rate during a core-collapse supernova
//! burst is a candidate signature of black hole formation. This crate screens
//! a complete, already-binned series for such a collapse with two
//! interchangeable strategies:
//!
//! - [`ChangePointDropDetector`](detection::ChangePointDropDetector):
//!   PELT segmentation of `log2(counts)` and the steepest drop between
//!   consecutive segment means
//! - [`DerivativeEdgeDetector`](detection::DerivativeEdgeDetector):
//!   curvature zero crossings of the smoothed series, or a Canny-style edge
//!   finder with hysteresis
//!
//! The [`pipeline`] module adapts both to JSON alert records.
//!
//! # Example
//!
//! ```
//! use sharpdrop::prelude::*;
//!
//! let times: Vec<f64> = (0..200).map(|i| i as f64 * 1e-3).collect();
//! let counts: Vec<f64> = (0..200).map(|i| if i < 120 { 1500.0 } else { 150.0 }).collect();
//!
//! let detector = ChangePointDropDetector::default();
//! let result = detector.detect(&times, &counts).unwrap();
//! assert!(result.has_drop);
//! assert_eq!(result.drop_time, Some(times[120]));
//! ```

#![allow(clippy::needless_range_loop)]

pub mod changepoint;
pub mod core;
pub mod detection;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod transform;
pub mod utils;

pub use error::{DropError, Result};

pub mod prelude {
    pub use crate::changepoint::{Kernel, SearchBudget};
    pub use crate::detection::{
        ChangePointDropDetector, DerivativeEdgeDetector, DropResult, DropoffConfig, EdgeConfig,
        EdgeMethod, EdgeType,
    };
    pub use crate::error::{DropError, Result};
    pub use crate::pipeline::{BhDetector, Node, Record, SharpDropoff};
}
