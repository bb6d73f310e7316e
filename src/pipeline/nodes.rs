//! Detector nodes wired to named record fields.

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};

use super::record::{read_series, write_result, Record};
use crate::changepoint::Kernel;
use crate::detection::{
    ChangePointDropDetector, DerivativeEdgeDetector, DropoffConfig, EdgeConfig, EdgeMethod,
    EdgeType,
};
use crate::error::Result;

/// A processing step that reads from and writes to an alert record.
pub trait Node {
    fn name(&self) -> &str;

    /// Process one record in place. Returns whether the record should be
    /// forwarded downstream.
    fn alert(&self, data: &mut Record) -> Result<bool>;
}

fn default_char_time() -> f64 {
    2e-4
}

fn default_penalty() -> f64 {
    1.0
}

fn default_threshold_drop() -> f64 {
    3.0
}

fn default_epsilon() -> f64 {
    60.0
}

fn default_threshold_slope() -> f64 {
    400.0
}

fn default_strong_threshold() -> f64 {
    95.0
}

fn default_weak_threshold() -> f64 {
    80.0
}

/// Segmentation kernel as named in node configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KernelName {
    #[default]
    Linear,
    Rbf,
}

/// Options of a [`SharpDropoff`] node. Unrecognized keys are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SharpDropoffConfig {
    #[serde(default = "SharpDropoffConfig::default_name")]
    pub name: String,
    /// Field holding the time bins.
    pub in_xfield: String,
    /// Field holding the counts per bin.
    pub in_yfield: String,
    #[serde(default = "default_char_time")]
    pub char_time: f64,
    #[serde(default = "default_penalty")]
    pub penalty: f64,
    #[serde(default = "default_threshold_drop")]
    pub threshold_drop: f64,
    #[serde(default)]
    pub kernel: KernelName,
    #[serde(default)]
    pub gamma: Option<f64>,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub out_field: Option<String>,
}

impl SharpDropoffConfig {
    fn default_name() -> String {
        "SharpDropoff".to_string()
    }

    fn detector_config(&self) -> DropoffConfig {
        let kernel = match self.kernel {
            KernelName::Linear => Kernel::Linear,
            KernelName::Rbf => Kernel::Rbf { gamma: self.gamma },
        };
        let mut config = DropoffConfig::default()
            .characteristic_time(self.char_time)
            .penalty(self.penalty)
            .drop_threshold(self.threshold_drop)
            .kernel(kernel);
        if let Some(ms) = self.timeout_ms {
            config = config.max_duration(Duration::from_millis(ms));
        }
        config
    }
}

/// Looks for a sharp drop with log-domain changepoint segmentation.
///
/// Writes `has_drop`, `drop_time` and `max_drop`.
#[derive(Debug, Clone)]
pub struct SharpDropoff {
    config: SharpDropoffConfig,
    detector: ChangePointDropDetector,
}

impl SharpDropoff {
    pub fn new(config: SharpDropoffConfig) -> Result<Self> {
        let detector = ChangePointDropDetector::new(config.detector_config())?;
        Ok(Self { config, detector })
    }

    /// Build from a JSON object of node options.
    pub fn from_json_config(json: &str) -> Result<Self> {
        Self::new(serde_json::from_str(json)?)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        Self::new(serde_json::from_value(value)?)
    }

    pub fn config(&self) -> &SharpDropoffConfig {
        &self.config
    }
}

impl Node for SharpDropoff {
    fn name(&self) -> &str {
        &self.config.name
    }

    #[instrument(skip_all, fields(node = %self.config.name))]
    fn alert(&self, data: &mut Record) -> Result<bool> {
        let times = read_series(data, &self.config.in_xfield)?;
        let values = read_series(data, &self.config.in_yfield)?;

        let result = self.detector.detect(&times, &values)?;
        debug!(?result, "sharp dropoff");
        write_result(data, &result, self.config.out_field.as_deref(), true);
        Ok(true)
    }
}

/// Options of a [`BhDetector`] node. Unrecognized keys are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BhDetectorConfig {
    #[serde(default = "BhDetectorConfig::default_name")]
    pub name: String,
    pub in_xfield: String,
    pub in_yfield: String,
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,
    /// Slope magnitude; a negative value is read as its absolute value.
    #[serde(default = "default_threshold_slope")]
    pub threshold_slope: f64,
    #[serde(default)]
    pub edge_type: EdgeType,
    #[serde(default)]
    pub method: EdgeMethod,
    #[serde(default = "default_strong_threshold")]
    pub strong_threshold: f64,
    #[serde(default = "default_weak_threshold")]
    pub weak_threshold: f64,
    #[serde(default)]
    pub out_field: Option<String>,
}

impl BhDetectorConfig {
    fn default_name() -> String {
        "BH_Detector".to_string()
    }

    fn detector_config(&self) -> EdgeConfig {
        EdgeConfig::default()
            .epsilon(self.epsilon)
            .slope_threshold(self.threshold_slope.abs())
            .edge_type(self.edge_type)
            .method(self.method)
            .canny_thresholds(self.strong_threshold, self.weak_threshold)
    }
}

/// Looks for a sharp falling edge with the derivative or Canny edge finder.
///
/// Writes `has_drop` and `drop_time` (time of the last edge).
#[derive(Debug, Clone)]
pub struct BhDetector {
    config: BhDetectorConfig,
    detector: DerivativeEdgeDetector,
}

impl BhDetector {
    pub fn new(config: BhDetectorConfig) -> Result<Self> {
        let detector = DerivativeEdgeDetector::new(config.detector_config())?;
        Ok(Self { config, detector })
    }

    pub fn from_json_config(json: &str) -> Result<Self> {
        Self::new(serde_json::from_str(json)?)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        Self::new(serde_json::from_value(value)?)
    }

    pub fn config(&self) -> &BhDetectorConfig {
        &self.config
    }
}

impl Node for BhDetector {
    fn name(&self) -> &str {
        &self.config.name
    }

    #[instrument(skip_all, fields(node = %self.config.name))]
    fn alert(&self, data: &mut Record) -> Result<bool> {
        let times = read_series(data, &self.config.in_xfield)?;
        let values = read_series(data, &self.config.in_yfield)?;

        let result = self.detector.detect(&times, &values)?;
        debug!(?result, "bh detector");
        write_result(data, &result, self.config.out_field.as_deref(), false);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DropError;
    use serde_json::json;

    fn step_record(n: usize, at: usize) -> Record {
        let times: Vec<f64> = (0..n).map(|i| i as f64 * 1e-3).collect();
        let counts: Vec<f64> = (0..n).map(|i| if i < at { 1200.0 } else { 100.0 }).collect();
        match json!({"name": "KM3NeT", "t_low": times, "t_bins": counts}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn sharp_dropoff_defaults() {
        let node = SharpDropoff::from_json_config(
            r#"{"in_xfield": "t_low", "in_yfield": "t_bins", "unrelated": 7}"#,
        )
        .unwrap();

        let config = node.config();
        assert_eq!(node.name(), "SharpDropoff");
        assert_eq!(config.char_time, 2e-4);
        assert_eq!(config.penalty, 1.0);
        assert_eq!(config.threshold_drop, 3.0);
        assert_eq!(config.kernel, KernelName::Linear);
        assert_eq!(config.out_field, None);
    }

    #[test]
    fn sharp_dropoff_writes_fields() {
        let node = SharpDropoff::from_value(json!({
            "name": "drop", "in_xfield": "t_low", "in_yfield": "t_bins"
        }))
        .unwrap();
        let mut data = step_record(80, 50);

        assert!(node.alert(&mut data).unwrap());
        assert_eq!(data["has_drop"], json!(true));
        assert_eq!(data["drop_time"], json!(50.0 * 1e-3));
        assert!(data["max_drop"].as_f64().unwrap() > 11.9);
        assert_eq!(data["name"], json!("KM3NeT"));
    }

    #[test]
    fn sharp_dropoff_nested_output() {
        let node = SharpDropoff::from_value(json!({
            "in_xfield": "t_low", "in_yfield": "t_bins", "out_field": "dropoff",
            "threshold_drop": 20.0
        }))
        .unwrap();
        let mut data = step_record(80, 50);

        node.alert(&mut data).unwrap();
        assert_eq!(
            data["dropoff"],
            json!({"has_drop": false, "drop_time": null, "max_drop": null})
        );
        assert!(!data.contains_key("has_drop"));
    }

    #[test]
    fn sharp_dropoff_missing_field() {
        let node = SharpDropoff::from_value(json!({"in_xfield": "t", "in_yfield": "n"})).unwrap();
        let mut data = step_record(10, 5);

        assert_eq!(
            node.alert(&mut data),
            Err(DropError::MissingField("t".to_string()))
        );
    }

    #[test]
    fn sharp_dropoff_bad_config() {
        assert!(matches!(
            SharpDropoff::from_json_config(r#"{"in_xfield": "t"}"#),
            Err(DropError::Config(_))
        ));
        assert!(matches!(
            SharpDropoff::from_value(json!({"in_xfield": "t", "in_yfield": "n", "penalty": -2.0})),
            Err(DropError::InvalidParameter(_))
        ));
    }

    #[test]
    fn sharp_dropoff_rbf_kernel_option() {
        let node = SharpDropoff::from_value(json!({
            "in_xfield": "t", "in_yfield": "n", "kernel": "rbf", "gamma": 0.5, "timeout_ms": 250
        }))
        .unwrap();
        let config = node.config().detector_config();
        assert_eq!(config.kernel, Kernel::Rbf { gamma: Some(0.5) });
        assert_eq!(config.budget.max_duration, Some(Duration::from_millis(250)));
    }

    #[test]
    fn bh_detector_writes_last_edge() {
        let node = BhDetector::from_value(json!({
            "in_xfield": "t_low", "in_yfield": "t_bins", "threshold_slope": -400
        }))
        .unwrap();
        assert_eq!(node.config().detector_config().slope_threshold, 400.0);

        let mut data = step_record(80, 50);
        node.alert(&mut data).unwrap();

        assert_eq!(data["has_drop"], json!(true));
        assert_eq!(data["drop_time"], json!(50.0 * 1e-3));
        assert!(!data.contains_key("max_drop"));
    }

    #[test]
    fn bh_detector_rising_finds_nothing_on_drop() {
        let node = BhDetector::from_value(json!({
            "in_xfield": "t_low", "in_yfield": "t_bins", "edge_type": "rising",
            "out_field": "bh"
        }))
        .unwrap();
        let mut data = step_record(80, 50);
        node.alert(&mut data).unwrap();

        assert_eq!(data["bh"], json!({"has_drop": false, "drop_time": null}));
    }

    #[test]
    fn bh_detector_canny_method() {
        let node = BhDetector::from_value(json!({
            "in_xfield": "t_low", "in_yfield": "t_bins", "method": "canny"
        }))
        .unwrap();
        assert_eq!(node.name(), "BH_Detector");

        let mut data = step_record(80, 50);
        node.alert(&mut data).unwrap();
        assert_eq!(data["drop_time"], json!(50.0 * 1e-3));
    }

    #[test]
    fn bh_detector_short_record_fails() {
        let node = BhDetector::from_value(json!({"in_xfield": "t_low", "in_yfield": "t_bins"}))
            .unwrap();
        let mut data = step_record(2, 1);
        let err = node.alert(&mut data).unwrap_err();
        assert!(err.is_invalid_input());
    }
}
