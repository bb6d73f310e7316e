//! Signal transformations used ahead of edge detection.

pub mod convolve;
pub mod window;

pub use convolve::{convolve_full, convolve_same};
pub use window::median_filter;
