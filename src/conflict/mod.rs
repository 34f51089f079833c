//! Overlap detection between question regions.

use tracing::debug;

use crate::config::AnalyzerConfig;
use crate::core::assignment::Assignment;
use crate::core::geometry::BBox;
use crate::core::model::RangeConflict;

/// Intersection area over the smaller box's area; 0 when either box is empty
/// or they do not overlap.
pub fn overlap_ratio(a: &BBox, b: &BBox) -> f64 {
    let inter = a.intersection_area(b);
    let smaller = a.area().min(b.area());
    if inter == 0 || smaller == 0 {
        0.0
    } else {
        inter as f64 / smaller as f64
    }
}

#[derive(Debug, Clone)]
pub struct ConflictDetector {
    severe_overlap_threshold: f64,
}

impl Default for ConflictDetector {
    fn default() -> Self {
        Self::from_config(&AnalyzerConfig::default())
    }
}

impl ConflictDetector {
    pub fn new(severe_overlap_threshold: f64) -> Self {
        Self {
            severe_overlap_threshold,
        }
    }

    pub fn from_config(config: &AnalyzerConfig) -> Self {
        Self::new(config.severe_overlap_threshold)
    }

    /// Every pair of question regions whose overlap ratio exceeds the severe
    /// threshold, in bucket order. The `unknown` bucket never takes part.
    pub fn detect(&self, assignment: &Assignment) -> Vec<RangeConflict> {
        let boxes: Vec<(&str, BBox)> = assignment
            .question_ids()
            .map(|id| (id, assignment.question_box(id)))
            .filter(|(_, bbox)| !bbox.is_empty())
            .collect();

        let mut conflicts = Vec::new();
        for (i, (q1, box1)) in boxes.iter().enumerate() {
            for (q2, box2) in &boxes[i + 1..] {
                let Some(inter) = box1.intersection(box2) else {
                    continue;
                };
                let ratio = overlap_ratio(box1, box2);
                if ratio <= self.severe_overlap_threshold {
                    continue;
                }

                let overlapping_elements = assignment
                    .elements(q1)
                    .iter()
                    .chain(assignment.elements(q2))
                    .filter(|e| e.bbox.intersection(&inter).is_some())
                    .cloned()
                    .collect::<Vec<_>>();

                debug!(
                    q1 = %q1,
                    q2 = %q2,
                    overlap_area = inter.area(),
                    ratio,
                    elements = overlapping_elements.len(),
                    "severe region overlap"
                );
                conflicts.push(RangeConflict {
                    question1: q1.to_string(),
                    question2: q2.to_string(),
                    overlap_area: inter.area(),
                    overlap_ratio: ratio,
                    overlapping_elements,
                });
            }
        }
        conflicts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{LayoutElement, UNKNOWN_QUESTION};
    use pretty_assertions::assert_eq;

    fn element(id: u32, bbox: BBox) -> LayoutElement {
        LayoutElement::new(id, "plain_text", bbox)
    }

    #[test]
    fn ratio_uses_smaller_box() {
        let big = BBox::new(0, 0, 100, 100);
        let small = BBox::new(50, 50, 70, 70);
        assert_eq!(overlap_ratio(&big, &small), 1.0);
        assert_eq!(overlap_ratio(&big, &BBox::EMPTY), 0.0);
    }

    #[test]
    fn flags_severe_overlap_with_elements_in_intersection() {
        let mut assignment = Assignment::new(["1", "2"]);
        assignment.insert("1", element(1, BBox::new(0, 0, 300, 100)));
        assignment.insert("1", element(2, BBox::new(0, 150, 300, 250)));
        assignment.insert("2", element(3, BBox::new(0, 120, 300, 200)));
        assignment.insert("2", element(4, BBox::new(0, 200, 300, 300)));

        let conflicts = ConflictDetector::default().detect(&assignment);

        assert_eq!(conflicts.len(), 1);
        let conflict = &conflicts[0];
        assert_eq!((conflict.question1.as_str(), conflict.question2.as_str()), ("1", "2"));
        // q1 box [0,0,300,250], q2 box [0,120,300,300] -> [0,120,300,250]
        assert_eq!(conflict.overlap_area, 300 * 130);
        let ids: Vec<u32> = conflict.overlapping_elements.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![2, 3, 4]);
    }

    #[test]
    fn ignores_minor_overlap_and_unknown_bucket() {
        let mut assignment = Assignment::new(["1", "2"]);
        assignment.insert("1", element(1, BBox::new(0, 0, 100, 100)));
        assignment.insert("2", element(2, BBox::new(0, 80, 100, 180)));
        assignment.insert(UNKNOWN_QUESTION, element(3, BBox::new(0, 0, 100, 180)));

        // 20% of the smaller box overlaps.
        assert!(ConflictDetector::default().detect(&assignment).is_empty());
    }

    #[test]
    fn skips_questions_without_boxes() {
        let mut assignment = Assignment::new(["1", "2"]);
        assignment.insert("1", element(1, BBox::new(0, 0, 100, 100)));
        assignment.insert("2", element(2, BBox::EMPTY));
        assert!(ConflictDetector::default().detect(&assignment).is_empty());
    }
}
