//! Column-aware nearest-question assignment.

use std::cmp::Ordering;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::config::AnalyzerConfig;
use crate::core::geometry::Point;
use crate::core::model::{
    compare_question_ids, AssignmentDiagnostics, ColumnRange, UNKNOWN_QUESTION,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    #[default]
    Euclidean,
    Manhattan,
}

impl DistanceMetric {
    pub fn distance(&self, a: &Point, b: &Point) -> f64 {
        match self {
            DistanceMetric::Euclidean => a.euclidean(b),
            DistanceMetric::Manhattan => a.manhattan(b),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Placement {
    Question {
        question_id: String,
        distance: f64,
        weighted_distance: f64,
    },
    Unknown,
}

impl Placement {
    pub fn question_id(&self) -> &str {
        match self {
            Placement::Question { question_id, .. } => question_id,
            Placement::Unknown => UNKNOWN_QUESTION,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Placement::Unknown)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabeledPoint {
    pub x: f64,
    pub y: f64,
    pub label: String,
}

impl LabeledPoint {
    pub fn new(x: f64, y: f64, label: impl Into<String>) -> Self {
        Self {
            x,
            y,
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Spatial2DAnalyzer {
    below_anchor_weight: f64,
    metric: DistanceMetric,
    max_distance: f64,
}

impl Default for Spatial2DAnalyzer {
    fn default() -> Self {
        Self::from_config(&AnalyzerConfig::default())
    }
}

impl Spatial2DAnalyzer {
    pub fn from_config(config: &AnalyzerConfig) -> Self {
        Self {
            below_anchor_weight: config.below_anchor_weight,
            metric: config.metric,
            max_distance: config.max_distance,
        }
    }

    /// Places `(x, y)` under the nearest question anchored in the same column
    /// using the configured metric and distance cap.
    pub fn place(
        &self,
        x: f64,
        y: f64,
        positions: &IndexMap<String, Point>,
        columns: &[ColumnRange],
    ) -> Placement {
        self.assign(x, y, positions, columns, self.metric, self.max_distance)
    }

    /// Places `(x, y)` under the nearest question anchored in the same column.
    ///
    /// Anchors at or above the point have their distance scaled by the
    /// below-anchor weight, so content reads as belonging to the question
    /// above it. Exact weighted ties go to the lower question id.
    pub fn assign(
        &self,
        x: f64,
        y: f64,
        positions: &IndexMap<String, Point>,
        columns: &[ColumnRange],
        metric: DistanceMetric,
        max_distance: f64,
    ) -> Placement {
        let Some(column) = columns.iter().find(|c| c.contains(x)) else {
            return Placement::Unknown;
        };

        let point = Point::new(x, y);
        let mut best: Option<(&str, f64, f64)> = None;

        for (question_id, anchor) in positions {
            if !column.contains(anchor.x) {
                continue;
            }
            let distance = metric.distance(&point, anchor);
            let weight = if anchor.y <= y {
                self.below_anchor_weight
            } else {
                1.0
            };
            let weighted = distance * weight;

            let better = match best {
                None => true,
                Some((best_id, _, best_weighted)) => match weighted.total_cmp(&best_weighted) {
                    Ordering::Less => true,
                    Ordering::Equal => compare_question_ids(question_id, best_id) == Ordering::Less,
                    Ordering::Greater => false,
                },
            };
            if better {
                best = Some((question_id.as_str(), distance, weighted));
            }
        }

        match best {
            Some((question_id, distance, weighted)) if weighted <= max_distance => {
                Placement::Question {
                    question_id: question_id.to_string(),
                    distance,
                    weighted_distance: weighted,
                }
            }
            _ => Placement::Unknown,
        }
    }

    /// Label to question id for every point, in input order.
    pub fn assign_batch(
        &self,
        points: &[LabeledPoint],
        positions: &IndexMap<String, Point>,
        columns: &[ColumnRange],
    ) -> IndexMap<String, String> {
        points
            .iter()
            .map(|p| {
                let placement = self.place(p.x, p.y, positions, columns);
                (p.label.clone(), placement.question_id().to_string())
            })
            .collect()
    }

    /// Assignment statistics over a batch; `average_distance` is the mean raw
    /// distance of the assigned points.
    pub fn diagnostics(
        &self,
        points: &[LabeledPoint],
        positions: &IndexMap<String, Point>,
        columns: &[ColumnRange],
    ) -> AssignmentDiagnostics {
        let distances: Vec<f64> = points
            .iter()
            .filter_map(|p| match self.place(p.x, p.y, positions, columns) {
                Placement::Question { distance, .. } => Some(distance),
                Placement::Unknown => None,
            })
            .collect();
        summarize(points.len(), &distances)
    }
}

/// Builds diagnostics from a batch size and the raw distances of its assigned
/// members.
pub fn summarize(total: usize, assigned_distances: &[f64]) -> AssignmentDiagnostics {
    let assigned = assigned_distances.len();
    AssignmentDiagnostics {
        total_elements: total,
        assigned_elements: assigned,
        unknown_elements: total - assigned,
        assignment_rate: if total == 0 {
            0.0
        } else {
            assigned as f64 / total as f64
        },
        average_distance: if assigned == 0 {
            0.0
        } else {
            assigned_distances.iter().sum::<f64>() / assigned as f64
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn positions(entries: &[(&str, f64, f64)]) -> IndexMap<String, Point> {
        entries
            .iter()
            .map(|(id, x, y)| (id.to_string(), Point::new(*x, *y)))
            .collect()
    }

    fn two_columns() -> Vec<ColumnRange> {
        vec![ColumnRange::new(0, 0, 350), ColumnRange::new(1, 350, 1000)]
    }

    fn full_width() -> Vec<ColumnRange> {
        vec![ColumnRange::new(0, 0, 1000)]
    }

    #[test]
    fn empty_positions_are_unknown() {
        let analyzer = Spatial2DAnalyzer::default();
        let empty = IndexMap::new();
        for (x, y) in [(0.0, 0.0), (100.0, 250.0), (999.0, 5000.0)] {
            assert_eq!(analyzer.place(x, y, &empty, &full_width()), Placement::Unknown);
        }
    }

    #[test]
    fn point_outside_columns_is_unknown() {
        let analyzer = Spatial2DAnalyzer::default();
        let positions = positions(&[("1", 100.0, 100.0)]);
        let columns = vec![ColumnRange::new(0, 0, 350)];
        assert!(analyzer.place(400.0, 100.0, &positions, &columns).is_unknown());
        assert!(analyzer.place(-5.0, 100.0, &positions, &columns).is_unknown());
    }

    #[test]
    fn stays_within_own_column() {
        let analyzer = Spatial2DAnalyzer::default();
        let positions = positions(&[
            ("1", 100.0, 100.0),
            ("2", 100.0, 250.0),
            ("3", 600.0, 100.0),
            ("4", 600.0, 400.0),
        ]);
        let placement = analyzer.place(600.0, 250.0, &positions, &two_columns());
        assert!(matches!(placement.question_id(), "3" | "4"));
    }

    #[test]
    fn column_without_anchors_is_unknown() {
        let analyzer = Spatial2DAnalyzer::default();
        let positions = positions(&[("1", 100.0, 100.0), ("2", 100.0, 300.0)]);
        let placement = analyzer.place(600.0, 120.0, &positions, &two_columns());
        assert_eq!(placement, Placement::Unknown);
    }

    #[test]
    fn equidistant_point_goes_to_anchor_above() {
        let analyzer = Spatial2DAnalyzer::default();
        let positions = positions(&[("1", 100.0, 100.0), ("2", 100.0, 400.0)]);
        let placement = analyzer.place(100.0, 250.0, &positions, &full_width());
        assert_eq!(placement.question_id(), "1");
        match placement {
            Placement::Question {
                distance,
                weighted_distance,
                ..
            } => {
                assert_eq!(distance, 150.0);
                assert!((weighted_distance - 135.0).abs() < 1e-9);
            }
            Placement::Unknown => panic!("expected a question"),
        }
    }

    #[test]
    fn anchor_at_same_height_gets_weight() {
        let analyzer = Spatial2DAnalyzer::default();
        let positions = positions(&[("1", 100.0, 200.0), ("2", 300.0, 210.0)]);
        // 100px to q1 at the same height (weighted 90) vs ~100.5px to q2 below.
        let placement = analyzer.place(200.0, 200.0, &positions, &full_width());
        assert_eq!(placement.question_id(), "1");
    }

    #[test]
    fn max_distance_cuts_off() {
        let analyzer = Spatial2DAnalyzer::default();
        let positions = positions(&[("1", 100.0, 100.0)]);
        let placement = analyzer.assign(
            100.0,
            800.0,
            &positions,
            &full_width(),
            DistanceMetric::Euclidean,
            100.0,
        );
        assert_eq!(placement, Placement::Unknown);
    }

    #[test]
    fn max_distance_applies_to_weighted_distance() {
        let analyzer = Spatial2DAnalyzer::default();

        // 540px below the anchor: weighted to 486, inside the 500px limit.
        let below = analyzer.place(100.0, 640.0, &positions(&[("1", 100.0, 100.0)]), &full_width());
        match below {
            Placement::Question {
                distance,
                weighted_distance,
                ..
            } => {
                assert!((distance - 540.0).abs() < 1e-9);
                assert!((weighted_distance - 486.0).abs() < 1e-9);
            }
            Placement::Unknown => panic!("expected question 1, got unknown"),
        }

        // Same gap with the anchor below the element carries no weight.
        let above = analyzer.place(100.0, 160.0, &positions(&[("1", 100.0, 700.0)]), &full_width());
        assert_eq!(above, Placement::Unknown);
    }

    #[test]
    fn exact_tie_goes_to_lower_question_id() {
        let analyzer = Spatial2DAnalyzer::default();
        // Both anchors above and 100px away; "10" is listed first.
        let positions = positions(&[("10", 0.0, 100.0), ("9", 200.0, 100.0)]);
        let placement = analyzer.place(100.0, 100.0, &positions, &full_width());
        assert_eq!(placement.question_id(), "9");
    }

    #[test]
    fn manhattan_metric_is_selectable() {
        let analyzer = Spatial2DAnalyzer::default();
        let positions = positions(&[("1", 0.0, 0.0)]);
        let placement = analyzer.assign(
            30.0,
            40.0,
            &positions,
            &full_width(),
            DistanceMetric::Manhattan,
            500.0,
        );
        match placement {
            Placement::Question { distance, .. } => assert_eq!(distance, 70.0),
            Placement::Unknown => panic!("expected a question"),
        }
    }

    #[test]
    fn batch_and_diagnostics() {
        let analyzer = Spatial2DAnalyzer::default();
        let positions = positions(&[("1", 100.0, 100.0), ("3", 600.0, 100.0)]);
        let points = vec![
            LabeledPoint::new(100.0, 200.0, "a"),
            LabeledPoint::new(600.0, 300.0, "b"),
            LabeledPoint::new(1200.0, 300.0, "c"),
            LabeledPoint::new(100.0, 1500.0, "d"),
        ];

        let batch = analyzer.assign_batch(&points, &positions, &two_columns());
        let labels: Vec<(&str, &str)> = batch
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        assert_eq!(
            labels,
            vec![("a", "1"), ("b", "3"), ("c", UNKNOWN_QUESTION), ("d", UNKNOWN_QUESTION)]
        );

        let diagnostics = analyzer.diagnostics(&points, &positions, &two_columns());
        assert_eq!(
            diagnostics,
            AssignmentDiagnostics {
                total_elements: 4,
                assigned_elements: 2,
                unknown_elements: 2,
                assignment_rate: 0.5,
                average_distance: 150.0,
            }
        );
    }

    #[test]
    fn empty_batch_diagnostics() {
        assert_eq!(summarize(0, &[]), AssignmentDiagnostics::default());
    }
}
