//! Changepoint detection.
//!
//! Partitions a series into piecewise-homogeneous segments by minimizing a
//! kernel cost plus a per-changepoint penalty.
//!
//! # Available Algorithms
//!
//! - **PELT**: Pruned Exact Linear Time - exact method with O(n) average complexity
//!
//! # Kernels
//!
//! - **Linear**: mean shifts (default)
//! - **Rbf**: mean and spread shifts
//!
//! # Example
//!
//! ```
//! use sharpdrop::changepoint::{pelt_detect, PeltConfig};
//!
//! // Create series with a level shift
//! let mut series = vec![0.0; 50];
//! series.extend(vec![10.0; 50]);
//!
//! let config = PeltConfig::default().penalty(5.0);
//! let result = pelt_detect(&series, &config).unwrap();
//!
//! assert_eq!(result.changepoints, vec![50]);
//! assert_eq!(result.breakpoints(), vec![50, 100]);
//! ```

pub mod cost;
pub mod pelt;
pub mod segment;

pub use cost::{median_heuristic_gamma, rbf_cost, Kernel, KernelCost};
pub use pelt::{pelt_detect, PeltConfig, PeltResult, SearchBudget};
pub use segment::{segments_from_breakpoints, Segment};
