//! Resolution of overlapping question regions by moving elements to the
//! question they fit better.

use std::cmp::Ordering;
use std::collections::HashSet;

use tracing::{debug, info};

use crate::config::AnalyzerConfig;
use crate::core::assignment::Assignment;
use crate::core::geometry::BBox;
use crate::core::model::{compare_question_ids, LayoutElement, RangeConflict, ReassignmentRecord};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReassignmentOutcome {
    pub records: Vec<ReassignmentRecord>,
    /// Conflicts in which at least one element actually moved.
    pub conflicts_resolved: usize,
}

/// Which of the two conflicting questions an element should belong to, and
/// why.
#[derive(Debug, Clone, PartialEq)]
struct Decision {
    target: String,
    reason: String,
}

#[derive(Debug, Clone)]
pub struct ElementReassignmentEngine {
    iou_delta_threshold: f64,
    box_match_epsilon: i32,
}

impl Default for ElementReassignmentEngine {
    fn default() -> Self {
        Self::from_config(&AnalyzerConfig::default())
    }
}

impl ElementReassignmentEngine {
    pub fn new(iou_delta_threshold: f64, box_match_epsilon: i32) -> Self {
        Self {
            iou_delta_threshold,
            box_match_epsilon,
        }
    }

    pub fn from_config(config: &AnalyzerConfig) -> Self {
        Self::new(config.reassignment_iou_delta, config.box_match_epsilon)
    }

    /// Resolves conflicts in order, moving elements inside `assignment`.
    /// Elements listed in `pinned` (question anchors) never move.
    pub fn resolve(
        &self,
        conflicts: &[RangeConflict],
        assignment: &mut Assignment,
        pinned: &HashSet<u32>,
    ) -> ReassignmentOutcome {
        let mut records = Vec::new();
        let mut conflicts_resolved = 0;

        for conflict in conflicts {
            let moved = self.resolve_one(conflict, assignment, pinned);
            if !moved.is_empty() {
                conflicts_resolved += 1;
            }
            records.extend(moved);
        }

        if !records.is_empty() {
            info!(
                moved = records.len(),
                conflicts = conflicts.len(),
                conflicts_resolved,
                "reassigned elements between overlapping questions"
            );
        }

        ReassignmentOutcome {
            records,
            conflicts_resolved,
        }
    }

    fn resolve_one(
        &self,
        conflict: &RangeConflict,
        assignment: &mut Assignment,
        pinned: &HashSet<u32>,
    ) -> Vec<ReassignmentRecord> {
        let q1 = conflict.question1.as_str();
        let q2 = conflict.question2.as_str();
        let q1_box = assignment.question_box(q1);
        let q2_box = assignment.question_box(q2);
        if q1_box.is_empty() || q2_box.is_empty() {
            debug!(q1, q2, "skipping conflict with an empty question region");
            return Vec::new();
        }

        let mut records = Vec::new();
        for element in &conflict.overlapping_elements {
            if pinned.contains(&element.id) || element.bbox.is_empty() {
                continue;
            }
            let decision = self.decide(element, (q1, &q1_box), (q2, &q2_box));

            let Some((current, tracked_id)) = self.current_owner(assignment, element) else {
                debug!(element = element.id, "cannot locate current owner; skipping");
                continue;
            };
            if current == decision.target || pinned.contains(&tracked_id) {
                continue;
            }

            if assignment.move_element(tracked_id, &current, &decision.target) {
                debug!(
                    element = element.id,
                    from = %current,
                    to = %decision.target,
                    reason = %decision.reason,
                    "element reassigned"
                );
                records.push(ReassignmentRecord {
                    element_label: format!("{}#{}", element.class_name, tracked_id),
                    element_id: tracked_id,
                    from_question: current,
                    to_question: decision.target,
                    reason: decision.reason,
                });
            }
        }
        records
    }

    /// Current owner and tracked id of `element`: by id first, then by box
    /// match for copies whose id is not tracked.
    fn current_owner(&self, assignment: &Assignment, element: &LayoutElement) -> Option<(String, u32)> {
        if let Some(owner) = assignment.owner_of(element.id) {
            return Some((owner.to_string(), element.id));
        }
        assignment
            .find_owner_by_box(&element.bbox, self.box_match_epsilon)
            .map(|(owner, id)| (owner.to_string(), id))
    }

    fn decide(&self, element: &LayoutElement, first: (&str, &BBox), second: (&str, &BBox)) -> Decision {
        let (q1, box1) = first;
        let (q2, box2) = second;
        let iou1 = element.bbox.iou(box1);
        let iou2 = element.bbox.iou(box2);
        let delta = (iou1 - iou2).abs();

        if delta >= self.iou_delta_threshold {
            let (winner, w_iou, loser, l_iou) = if iou1 > iou2 {
                (q1, iou1, q2, iou2)
            } else {
                (q2, iou2, q1, iou1)
            };
            return Decision {
                target: winner.to_string(),
                reason: format!(
                    "IoU-based (q{winner}={w_iou:.2} > q{loser}={l_iou:.2}, delta={delta:.2})"
                ),
            };
        }

        let center = element.center();
        let d1 = center.euclidean(&box1.center());
        let d2 = center.euclidean(&box2.center());
        match d1.total_cmp(&d2) {
            Ordering::Less => distance_decision(q1, d1, q2, d2),
            Ordering::Greater => distance_decision(q2, d2, q1, d1),
            Ordering::Equal => {
                let winner = match compare_question_ids(q1, q2) {
                    Ordering::Greater => q2,
                    _ => q1,
                };
                Decision {
                    target: winner.to_string(),
                    reason: format!(
                        "distance-based tie (q{q1}={d1:.0}px = q{q2}={d2:.0}px, lower id wins)"
                    ),
                }
            }
        }
    }
}

fn distance_decision(winner: &str, w_dist: f64, loser: &str, l_dist: f64) -> Decision {
    Decision {
        target: winner.to_string(),
        reason: format!("distance-based (q{winner}={w_dist:.0}px < q{loser}={l_dist:.0}px)"),
    }
}
