use std::fs;
use std::path::PathBuf;

use anyhow::Result;

use crate::core::model::{DocumentResult, LayoutElement, PageResult, UNKNOWN_QUESTION};
use crate::export::{bucket_elements, Exporter};

/// Question-by-question markdown: `structure.md` for the document and
/// `page_NNN.md` per page.
#[derive(Debug, Clone)]
pub struct MarkdownExporter {
    out_dir: PathBuf,
}

impl MarkdownExporter {
    pub fn new(out_dir: PathBuf) -> Self {
        Self { out_dir }
    }

    fn format_element(element: &LayoutElement, is_anchor: bool) -> String {
        let text = element
            .ocr_text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty());
        match (text, is_anchor) {
            (Some(text), true) => format!("- **{}**", text.replace('\n', " ")),
            (Some(text), false) => format!("- {}", text.replace('\n', " ")),
            (None, _) => format!(
                "- [{}: {}x{} at ({}, {})]",
                element.class_name,
                element.bbox.width(),
                element.bbox.height(),
                element.bbox.x1,
                element.bbox.y1
            ),
        }
    }

    fn format_page(page: &PageResult, heading: &str) -> String {
        let mut md = String::new();
        md.push_str(&format!("{heading} Page {}\n\n", page.page_idx + 1));

        for (question_id, ids) in &page.assignment {
            if question_id == UNKNOWN_QUESTION {
                continue;
            }
            md.push_str(&format!("{heading}# Question {question_id}\n\n"));
            let elements = bucket_elements(page, ids);
            if elements.is_empty() {
                md.push_str("_(no elements)_\n\n");
                continue;
            }
            for element in elements {
                md.push_str(&Self::format_element(element, page.is_anchor(element.id)));
                md.push('\n');
            }
            md.push('\n');
        }

        let unknown = page
            .assignment
            .get(UNKNOWN_QUESTION)
            .map(|ids| bucket_elements(page, ids))
            .unwrap_or_default();
        if !unknown.is_empty() {
            md.push_str(&format!("{heading}# Unassigned\n\n"));
            for element in unknown {
                md.push_str(&Self::format_element(element, false));
                md.push('\n');
            }
            md.push('\n');
        }

        if !page.reassignments.is_empty() {
            md.push_str(&format!("{heading}# Reassignments\n\n"));
            md.push_str("| Element | From | To | Reason |\n|---|---|---|---|\n");
            for record in &page.reassignments {
                md.push_str(&format!(
                    "| {} | {} | {} | {} |\n",
                    record.element_label, record.from_question, record.to_question, record.reason
                ));
            }
            md.push('\n');
        }

        md
    }
}

impl Exporter for MarkdownExporter {
    fn export(&self, document: &DocumentResult) -> Result<()> {
        fs::create_dir_all(&self.out_dir)?;

        let mut markdown = String::from("# Questions\n\n");
        for page in &document.pages {
            markdown.push_str("---\n\n");
            markdown.push_str(&Self::format_page(page, "##"));
        }
        fs::write(self.out_dir.join("structure.md"), markdown)?;

        for page in &document.pages {
            let path = self
                .out_dir
                .join(format!("page_{:03}.md", page.page_idx + 1));
            fs::write(path, Self::format_page(page, "#"))?;
        }

        Ok(())
    }
}
