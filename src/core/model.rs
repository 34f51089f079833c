use std::cmp::Ordering;
use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::core::geometry::{BBox, Point};

/// Reserved bucket for elements that could not be placed under any question.
pub const UNKNOWN_QUESTION: &str = "unknown";

pub mod class_names {
    pub const QUESTION_NUMBER: &str = "question_number";
    pub const QUESTION_TYPE: &str = "question_type";
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LayoutElement {
    pub id: u32,
    #[serde(alias = "className")]
    pub class_name: String,
    #[serde(rename = "box", alias = "bbox", default)]
    pub bbox: BBox,
    #[serde(default)]
    pub confidence: f32,
    #[serde(
        default,
        alias = "ocrText",
        skip_serializing_if = "Option::is_none"
    )]
    pub ocr_text: Option<String>,
}

impl LayoutElement {
    pub fn new(id: u32, class_name: &str, bbox: BBox) -> Self {
        Self {
            id,
            class_name: class_name.to_string(),
            bbox,
            confidence: 1.0,
            ocr_text: None,
        }
    }

    pub fn with_ocr_text(mut self, text: &str) -> Self {
        self.ocr_text = Some(text.to_string());
        self
    }

    /// Class comparison ignoring case and the `_`/`-`/space spelling variants
    /// emitted by different detector exports.
    pub fn has_class(&self, class_name: &str) -> bool {
        normalize_class(&self.class_name) == normalize_class(class_name)
    }

    pub fn center(&self) -> Point {
        self.bbox.center()
    }

    pub fn label(&self) -> String {
        format!("{}#{}", self.class_name, self.id)
    }
}

fn normalize_class(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| match c {
            ' ' | '-' => '_',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OcrEntry {
    pub text: String,
    #[serde(default)]
    pub confidence: f32,
}

pub type OcrMap = BTreeMap<u32, OcrEntry>;

/// OCR text for an element: the OCR map entry first, then inline text.
pub fn ocr_text_for<'a>(element: &'a LayoutElement, ocr: &'a OcrMap) -> Option<&'a str> {
    ocr.get(&element.id)
        .map(|entry| entry.text.as_str())
        .or(element.ocr_text.as_deref())
}

/// Orders question ids numerically when both are integers, lexically otherwise.
pub fn compare_question_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        _ => a.cmp(b),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuestionSpec {
    pub id: String,
    pub y: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuestionAnchor {
    pub question_id: String,
    pub element_id: u32,
    pub position: Point,
}

/// Horizontal band `[x_start, x_end)` describing one reading column.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ColumnRange {
    #[serde(default)]
    pub index: usize,
    #[serde(alias = "xStart")]
    pub x_start: i32,
    #[serde(alias = "xEnd")]
    pub x_end: i32,
}

impl ColumnRange {
    pub fn new(index: usize, x_start: i32, x_end: i32) -> Self {
        Self {
            index,
            x_start,
            x_end,
        }
    }

    pub fn contains(&self, x: f64) -> bool {
        self.x_start as f64 <= x && x < self.x_end as f64
    }

    pub fn overlaps(&self, other: &Self) -> bool {
        self.x_start < other.x_end && other.x_start < self.x_end
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangeConflict {
    pub question1: String,
    pub question2: String,
    pub overlap_area: i64,
    pub overlap_ratio: f64,
    pub overlapping_elements: Vec<LayoutElement>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConflictReport {
    pub question1: String,
    pub question2: String,
    pub overlap_area: i64,
    pub overlap_ratio: f64,
    pub element_ids: Vec<u32>,
}

impl From<&RangeConflict> for ConflictReport {
    fn from(conflict: &RangeConflict) -> Self {
        Self {
            question1: conflict.question1.clone(),
            question2: conflict.question2.clone(),
            overlap_area: conflict.overlap_area,
            overlap_ratio: conflict.overlap_ratio,
            element_ids: conflict.overlapping_elements.iter().map(|e| e.id).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReassignmentRecord {
    pub element_label: String,
    pub element_id: u32,
    pub from_question: String,
    pub to_question: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AssignmentDiagnostics {
    pub total_elements: usize,
    pub assigned_elements: usize,
    pub unknown_elements: usize,
    pub assignment_rate: f64,
    pub average_distance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageInput {
    #[serde(default, alias = "pageIdx")]
    pub page_idx: usize,
    #[serde(default)]
    pub width: Option<i32>,
    #[serde(default)]
    pub height: Option<i32>,
    pub elements: Vec<LayoutElement>,
    #[serde(default)]
    pub ocr: OcrMap,
    #[serde(default)]
    pub questions: Vec<QuestionSpec>,
    #[serde(default)]
    pub columns: Option<Vec<ColumnRange>>,
}

impl PageInput {
    pub fn page_width(&self) -> i32 {
        self.width.unwrap_or_else(|| {
            self.elements
                .iter()
                .filter(|e| !e.bbox.is_empty())
                .map(|e| e.bbox.x2)
                .max()
                .unwrap_or(0)
        })
    }

    pub fn page_height(&self) -> i32 {
        self.height.unwrap_or_else(|| {
            self.elements
                .iter()
                .filter(|e| !e.bbox.is_empty())
                .map(|e| e.bbox.y2)
                .max()
                .unwrap_or(0)
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentInput {
    pub pages: Vec<PageInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResult {
    pub page_idx: usize,
    pub width: i32,
    pub height: i32,
    pub anchors: Vec<QuestionAnchor>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub missing_anchors: Vec<String>,
    pub columns: Vec<ColumnRange>,
    /// Question id to element ids, with the `unknown` bucket last.
    pub assignment: IndexMap<String, Vec<u32>>,
    pub conflicts: Vec<ConflictReport>,
    pub reassignments: Vec<ReassignmentRecord>,
    pub conflicts_resolved: usize,
    pub diagnostics: AssignmentDiagnostics,
    /// Page elements with OCR text resolved, for exporters.
    pub elements: Vec<LayoutElement>,
}

impl PageResult {
    pub fn element(&self, id: u32) -> Option<&LayoutElement> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn is_anchor(&self, id: u32) -> bool {
        self.anchors.iter().any(|a| a.element_id == id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentResult {
    pub pages: Vec<PageResult>,
}
