//! Sharp-drop detectors.
//!
//! This module provides two independent strategies for the same question,
//! "did the count rate collapse?":
//! - Log-domain changepoint segmentation ([`ChangePointDropDetector`])
//! - Derivative and Canny edge finding ([`DerivativeEdgeDetector`])

mod dropoff;
mod edges;
mod result;

pub use dropoff::{ChangePointDropDetector, DropAnalysis, DropoffConfig};
pub use edges::{
    hysteresis_link, non_max_suppression, CannyConfig, DerivativeEdgeDetector, EdgeConfig,
    EdgeMethod, EdgeType, MIN_EDGE_SAMPLES,
};
pub use result::DropResult;
