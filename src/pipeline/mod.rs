//! Pipeline-facing nodes.
//!
//! Nodes read the time-bin and count arrays from caller-named fields of a
//! JSON record, run a detector and write the outcome back, either merged into
//! the record or nested under an output field.

mod nodes;
mod record;

pub use nodes::{
    BhDetector, BhDetectorConfig, KernelName, Node, SharpDropoff, SharpDropoffConfig,
};
pub use record::{read_series, write_result, Record};
