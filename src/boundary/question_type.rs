use crate::boundary::{within_y_tolerance, BoundaryElementFinder};
use crate::core::error::{Result, StructureError};
use crate::core::model::{class_names, LayoutElement, OcrMap};

pub(crate) const TYPE_PREFIX: &str = "type_";

/// Splits `type_{layoutId}_{label}` into the layout element id and the label.
pub fn parse_type_identifier(question_id: &str) -> Result<(u32, &str)> {
    let invalid = |reason: &str| StructureError::InvalidIdentifier {
        identifier: question_id.to_string(),
        reason: reason.to_string(),
    };

    let rest = question_id
        .strip_prefix(TYPE_PREFIX)
        .ok_or_else(|| invalid("missing 'type_' prefix"))?;
    let (layout_id, label) = rest
        .split_once('_')
        .ok_or_else(|| invalid("expected type_{layoutId}_{label}"))?;
    let layout_id = layout_id
        .parse::<u32>()
        .map_err(|_| invalid("layout id is not a non-negative integer"))?;
    Ok((layout_id, label))
}

/// Finds question-type headers by the layout element id embedded in the
/// identifier. No OCR is involved.
#[derive(Debug, Clone)]
pub struct QuestionTypeAnchorFinder {
    y_tolerance: i32,
}

impl QuestionTypeAnchorFinder {
    pub fn new(y_tolerance: i32) -> Self {
        Self { y_tolerance }
    }
}

impl BoundaryElementFinder for QuestionTypeAnchorFinder {
    fn supports(&self, question_id: &str) -> bool {
        question_id.starts_with(TYPE_PREFIX)
    }

    fn find<'a>(
        &self,
        question_id: &str,
        question_y: i32,
        elements: &'a [LayoutElement],
        _ocr: &OcrMap,
    ) -> Result<Option<&'a LayoutElement>> {
        let (layout_id, _label) = parse_type_identifier(question_id)?;
        Ok(elements.iter().find(|element| {
            element.id == layout_id
                && element.has_class(class_names::QUESTION_TYPE)
                && within_y_tolerance(element, question_y, self.y_tolerance)
        }))
    }
}
