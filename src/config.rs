use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::spatial::DistanceMetric;

/// Thresholds used across anchor finding, assignment and conflict resolution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Maximum vertical gap in pixels between a question's expected Y and its
    /// anchor's top edge.
    pub y_tolerance: i32,
    /// Multiplier applied to the distance to an anchor at or above the element.
    pub below_anchor_weight: f64,
    pub max_distance: f64,
    pub metric: DistanceMetric,
    pub severe_overlap_threshold: f64,
    pub reassignment_iou_delta: f64,
    /// Per-coordinate tolerance when matching element copies by box.
    pub box_match_epsilon: i32,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            y_tolerance: 10,
            below_anchor_weight: 0.9,
            max_distance: 500.0,
            metric: DistanceMetric::Euclidean,
            severe_overlap_threshold: 0.3,
            reassignment_iou_delta: 0.15,
            box_match_epsilon: 1,
        }
    }
}

impl AnalyzerConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: AnalyzerConfig = serde_json::from_str(&data)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }

    pub fn with_max_distance(mut self, max_distance: f64) -> Self {
        self.max_distance = max_distance;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn partial_config_keeps_defaults() {
        let config: AnalyzerConfig =
            serde_json::from_str(r#"{"max_distance": 250.0, "metric": "manhattan"}"#).unwrap();
        assert_eq!(config.max_distance, 250.0);
        assert_eq!(config.metric, DistanceMetric::Manhattan);
        assert_eq!(config.y_tolerance, 10);
        assert_eq!(config.below_anchor_weight, 0.9);
    }
}
