use regex::Regex;

use crate::boundary::question_type::TYPE_PREFIX;
use crate::boundary::{within_y_tolerance, BoundaryElementFinder};
use crate::core::error::{Result, StructureError};
use crate::core::model::{class_names, ocr_text_for, LayoutElement, OcrMap};
use crate::text::normalize_ocr_text;

/// Finds plain numbered questions (`"1"`, `"593"`) by the OCR text of
/// `question_number` elements.
#[derive(Debug, Clone)]
pub struct NumericAnchorFinder {
    y_tolerance: i32,
}

impl NumericAnchorFinder {
    pub fn new(y_tolerance: i32) -> Self {
        Self { y_tolerance }
    }

    /// `<id>` optionally followed by `.`, `번` or `)`, anywhere in the text.
    fn label_pattern(question_id: &str) -> Result<Regex> {
        Regex::new(&format!("{}[.번)]?", regex::escape(question_id))).map_err(|err| {
            StructureError::InvalidIdentifier {
                identifier: question_id.to_string(),
                reason: err.to_string(),
            }
        })
    }
}

impl BoundaryElementFinder for NumericAnchorFinder {
    fn supports(&self, question_id: &str) -> bool {
        !question_id.starts_with(TYPE_PREFIX)
    }

    fn find<'a>(
        &self,
        question_id: &str,
        question_y: i32,
        elements: &'a [LayoutElement],
        ocr: &OcrMap,
    ) -> Result<Option<&'a LayoutElement>> {
        if !self.supports(question_id) {
            return Ok(None);
        }
        let pattern = Self::label_pattern(question_id)?;

        // First match in input order wins.
        let found = elements.iter().find(|element| {
            element.has_class(class_names::QUESTION_NUMBER)
                && within_y_tolerance(element, question_y, self.y_tolerance)
                && ocr_text_for(element, ocr)
                    .map(|text| pattern.is_match(&normalize_ocr_text(text)))
                    .unwrap_or(false)
        });
        Ok(found)
    }
}
