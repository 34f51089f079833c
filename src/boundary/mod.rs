//! Anchor lookup: finding the layout element that marks where a question
//! starts on the page.

pub mod numeric;
pub mod question_type;

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::core::error::Result;
use crate::core::model::{LayoutElement, OcrMap, QuestionAnchor, QuestionSpec};

pub use numeric::NumericAnchorFinder;
pub use question_type::{parse_type_identifier, QuestionTypeAnchorFinder};

/// Strategy for locating a question's anchor element.
///
/// `supports` must be a pure predicate on the identifier's shape; the
/// registered strategies are mutually exclusive, so dispatch order never
/// matters.
pub trait BoundaryElementFinder: Send + Sync {
    fn supports(&self, question_id: &str) -> bool;

    fn find<'a>(
        &self,
        question_id: &str,
        question_y: i32,
        elements: &'a [LayoutElement],
        ocr: &OcrMap,
    ) -> Result<Option<&'a LayoutElement>>;
}

/// True when the element's top edge lies within `tolerance` pixels of `y`.
pub(crate) fn within_y_tolerance(element: &LayoutElement, y: i32, tolerance: i32) -> bool {
    (element.bbox.y1 as i64 - y as i64).abs() <= tolerance as i64
}

pub struct AnchorLocator {
    finders: Vec<Box<dyn BoundaryElementFinder>>,
}

impl AnchorLocator {
    pub fn new(y_tolerance: i32) -> Self {
        Self {
            finders: vec![
                Box::new(NumericAnchorFinder::new(y_tolerance)),
                Box::new(QuestionTypeAnchorFinder::new(y_tolerance)),
            ],
        }
    }

    /// Locator restricted to the given strategies; identifiers no strategy
    /// supports are reported missing.
    pub fn with_finders(finders: Vec<Box<dyn BoundaryElementFinder>>) -> Self {
        Self { finders }
    }

    /// Anchor for one question. Identifier errors are logged and read as "no
    /// match".
    pub fn locate<'a>(
        &self,
        question: &QuestionSpec,
        elements: &'a [LayoutElement],
        ocr: &OcrMap,
    ) -> Option<&'a LayoutElement> {
        let finder = self.finders.iter().find(|f| f.supports(&question.id))?;
        match finder.find(&question.id, question.y, elements, ocr) {
            Ok(found) => found,
            Err(err) => {
                warn!(question = %question.id, "anchor lookup failed: {err}");
                None
            }
        }
    }

    /// Anchors for every question, in question order, plus the ids whose
    /// anchor could not be found. An element already claimed by an earlier
    /// question is not reused.
    pub fn locate_all(
        &self,
        questions: &[QuestionSpec],
        elements: &[LayoutElement],
        ocr: &OcrMap,
    ) -> (Vec<QuestionAnchor>, Vec<String>) {
        let mut anchors = Vec::with_capacity(questions.len());
        let mut missing = Vec::new();
        let mut claimed: HashMap<u32, &str> = HashMap::new();

        for question in questions {
            match self.locate(question, elements, ocr) {
                Some(element) => {
                    if let Some(owner) = claimed.get(&element.id) {
                        warn!(
                            question = %question.id,
                            element = element.id,
                            "anchor already claimed by question {owner}"
                        );
                        missing.push(question.id.clone());
                        continue;
                    }
                    debug!(question = %question.id, element = element.id, "anchor found");
                    claimed.insert(element.id, &question.id);
                    anchors.push(QuestionAnchor {
                        question_id: question.id.clone(),
                        element_id: element.id,
                        position: element.center(),
                    });
                }
                None => {
                    warn!(question = %question.id, y = question.y, "no anchor element found");
                    missing.push(question.id.clone());
                }
            }
        }

        (anchors, missing)
    }
}
