pub mod html_debug_export;
pub mod json_export;
pub mod markdown_export;

use anyhow::Result;

use crate::core::model::{DocumentResult, LayoutElement, PageResult};

pub use html_debug_export::HtmlDebugExporter;
pub use json_export::JsonExporter;
pub use markdown_export::MarkdownExporter;

pub trait Exporter {
    fn export(&self, document: &DocumentResult) -> Result<()>;
}

/// Elements of one assignment bucket in reading order (top to bottom, then
/// left to right).
pub(crate) fn bucket_elements<'a>(page: &'a PageResult, ids: &[u32]) -> Vec<&'a LayoutElement> {
    let mut elements: Vec<&LayoutElement> = ids.iter().filter_map(|id| page.element(*id)).collect();
    elements.sort_by_key(|e| (e.bbox.y1, e.bbox.x1));
    elements
}
