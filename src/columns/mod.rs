//! Column ranges for multi-column pages.
//!
//! How column boundaries are clustered from raw positions belongs to the
//! upstream layout service; this module only carries its output contract:
//! ranges are sorted, pairwise disjoint, and every anchor X falls in exactly
//! one of them.

use tracing::warn;

use crate::core::error::{Result, StructureError};
use crate::core::model::{ColumnRange, QuestionAnchor};

pub trait ColumnDetector {
    fn detect(&self, anchors: &[QuestionAnchor], page_width: i32) -> Vec<ColumnRange>;
}

/// Checks the column contract against a page's anchors.
pub fn validate_columns(ranges: &[ColumnRange], anchors: &[QuestionAnchor]) -> Result<()> {
    for range in ranges {
        if range.x_end <= range.x_start {
            return Err(StructureError::InvalidColumns(format!(
                "column {} has non-positive width [{}, {})",
                range.index, range.x_start, range.x_end
            )));
        }
    }
    for (i, a) in ranges.iter().enumerate() {
        for b in &ranges[i + 1..] {
            if a.overlaps(b) {
                return Err(StructureError::InvalidColumns(format!(
                    "columns {} [{}, {}) and {} [{}, {}) overlap",
                    a.index, a.x_start, a.x_end, b.index, b.x_start, b.x_end
                )));
            }
        }
    }
    for anchor in anchors {
        let hits = ranges
            .iter()
            .filter(|r| r.contains(anchor.position.x))
            .count();
        if hits != 1 {
            return Err(StructureError::InvalidColumns(format!(
                "anchor of question {} at x={} falls in {hits} columns",
                anchor.question_id, anchor.position.x
            )));
        }
    }
    Ok(())
}

/// Sorts ranges by start and renumbers them left to right.
fn normalize(mut ranges: Vec<ColumnRange>) -> Vec<ColumnRange> {
    ranges.sort_by_key(|r| (r.x_start, r.x_end));
    for (index, range) in ranges.iter_mut().enumerate() {
        range.index = index;
    }
    ranges
}

/// The whole page as one column.
#[derive(Debug, Default, Clone)]
pub struct SingleColumnDetector;

impl SingleColumnDetector {
    pub fn new() -> Self {
        Self
    }
}

impl ColumnDetector for SingleColumnDetector {
    fn detect(&self, anchors: &[QuestionAnchor], page_width: i32) -> Vec<ColumnRange> {
        // Widen past the rightmost anchor so a page width taken from a
        // cropped scan still holds every anchor.
        let rightmost = anchors
            .iter()
            .map(|a| (a.position.x.floor() as i32).saturating_add(1))
            .max()
            .unwrap_or(0);
        let x_end = page_width.max(rightmost).max(1);
        vec![ColumnRange::new(0, 0, x_end)]
    }
}

/// Column ranges supplied by the caller, validated against the anchors.
/// Falls back to a single column when the supplied ranges break the contract.
#[derive(Debug, Clone)]
pub struct FixedColumnDetector {
    ranges: Vec<ColumnRange>,
}

impl FixedColumnDetector {
    pub fn new(ranges: Vec<ColumnRange>) -> Self {
        Self {
            ranges: normalize(ranges),
        }
    }
}

impl ColumnDetector for FixedColumnDetector {
    fn detect(&self, anchors: &[QuestionAnchor], page_width: i32) -> Vec<ColumnRange> {
        if self.ranges.is_empty() {
            return SingleColumnDetector.detect(anchors, page_width);
        }
        match validate_columns(&self.ranges, anchors) {
            Ok(()) => self.ranges.clone(),
            Err(err) => {
                warn!("{err}; falling back to a single column");
                SingleColumnDetector.detect(anchors, page_width)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::Point;
    use pretty_assertions::assert_eq;

    fn anchor(id: &str, x: f64) -> QuestionAnchor {
        QuestionAnchor {
            question_id: id.to_string(),
            element_id: 0,
            position: Point::new(x, 100.0),
        }
    }

    #[test]
    fn single_column_spans_page() {
        let ranges = SingleColumnDetector::new().detect(&[anchor("1", 100.0)], 1000);
        assert_eq!(ranges, vec![ColumnRange::new(0, 0, 1000)]);
    }

    #[test]
    fn single_column_covers_anchor_past_page_width() {
        let ranges = SingleColumnDetector::new().detect(&[anchor("1", 1200.5)], 1000);
        assert_eq!(ranges, vec![ColumnRange::new(0, 0, 1201)]);
        assert!(ranges[0].contains(1200.5));
    }

    #[test]
    fn single_column_saturates_at_page_edge() {
        let ranges = SingleColumnDetector::new().detect(&[anchor("1", i32::MAX as f64)], 1000);
        assert_eq!(ranges, vec![ColumnRange::new(0, 0, i32::MAX)]);
    }

    #[test]
    fn fixed_columns_are_sorted_and_reindexed() {
        let detector = FixedColumnDetector::new(vec![
            ColumnRange::new(7, 350, 1000),
            ColumnRange::new(3, 0, 350),
        ]);
        let ranges = detector.detect(&[anchor("1", 100.0), anchor("3", 600.0)], 1000);
        assert_eq!(
            ranges,
            vec![ColumnRange::new(0, 0, 350), ColumnRange::new(1, 350, 1000)]
        );
    }

    #[test]
    fn rejects_overlapping_columns() {
        let ranges = vec![ColumnRange::new(0, 0, 400), ColumnRange::new(1, 350, 1000)];
        assert!(matches!(
            validate_columns(&ranges, &[]),
            Err(StructureError::InvalidColumns(_))
        ));
    }

    #[test]
    fn rejects_anchor_outside_columns() {
        let ranges = vec![ColumnRange::new(0, 0, 350)];
        assert!(validate_columns(&ranges, &[anchor("1", 500.0)]).is_err());
    }

    #[test]
    fn invalid_fixed_columns_fall_back_to_single() {
        let detector = FixedColumnDetector::new(vec![
            ColumnRange::new(0, 0, 400),
            ColumnRange::new(1, 300, 900),
        ]);
        let ranges = detector.detect(&[anchor("1", 100.0)], 900);
        assert_eq!(ranges, vec![ColumnRange::new(0, 0, 900)]);
    }

    #[test]
    fn boundary_x_belongs_to_right_column() {
        let ranges = vec![ColumnRange::new(0, 0, 350), ColumnRange::new(1, 350, 1000)];
        assert!(!ranges[0].contains(350.0));
        assert!(ranges[1].contains(350.0));
    }
}
