use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indexmap::IndexMap;
use rayon::prelude::*;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::boundary::AnchorLocator;
use crate::columns::{ColumnDetector, FixedColumnDetector, SingleColumnDetector};
use crate::config::AnalyzerConfig;
use crate::conflict::ConflictDetector;
use crate::core::assignment::Assignment;
use crate::core::geometry::Point;
use crate::core::model::{
    ocr_text_for, ConflictReport, DocumentInput, DocumentResult, LayoutElement, PageInput,
    PageResult, UNKNOWN_QUESTION,
};
use crate::export::html_debug_export::HtmlDebugExporter;
use crate::export::json_export::JsonExporter;
use crate::export::markdown_export::MarkdownExporter;
use crate::export::Exporter;
use crate::reassign::ElementReassignmentEngine;
use crate::spatial::{summarize, Placement, Spatial2DAnalyzer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Markdown,
    Html,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub analyzer: AnalyzerConfig,
    pub formats: Vec<OutputFormat>,
    /// Also write `pages/page_NNN.json` next to `structure.json`.
    pub per_page_json: bool,
}

impl PipelineConfig {
    pub fn new(input: PathBuf, output: PathBuf, analyzer: AnalyzerConfig) -> Self {
        Self {
            input,
            output,
            analyzer,
            formats: vec![OutputFormat::Json, OutputFormat::Markdown],
            per_page_json: false,
        }
    }

    pub fn with_formats(mut self, formats: Vec<OutputFormat>) -> Self {
        self.formats = formats;
        self
    }

    pub fn with_per_page_json(mut self, per_page_json: bool) -> Self {
        self.per_page_json = per_page_json;
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum InputFile {
    Document(DocumentInput),
    Page(PageInput),
}

/// Reads either a single page object or `{"pages": [...]}`.
pub fn load_document(path: &Path) -> Result<DocumentInput> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read input {}", path.display()))?;
    let parsed: InputFile = serde_json::from_str(&data)
        .with_context(|| format!("failed to parse page layout JSON in {}", path.display()))?;
    Ok(match parsed {
        InputFile::Document(document) => document,
        InputFile::Page(page) => DocumentInput { pages: vec![page] },
    })
}

/// Ids that occur more than once, in order of their second occurrence.
fn duplicate_element_ids(elements: &[LayoutElement]) -> Vec<u32> {
    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    for element in elements {
        if !seen.insert(element.id) && !duplicates.contains(&element.id) {
            duplicates.push(element.id);
        }
    }
    duplicates
}

/// Groups one page's elements into questions.
///
/// Anchors are located first and pinned to their questions; every other
/// element goes to the nearest question in its column; severe overlaps between
/// the resulting regions are then resolved by moving misplaced elements.
pub fn structure_page(page: &PageInput, config: &AnalyzerConfig) -> PageResult {
    let locator = AnchorLocator::new(config.y_tolerance);
    let (anchors, missing_anchors) = locator.locate_all(&page.questions, &page.elements, &page.ocr);

    let page_width = page.page_width();
    let columns = match &page.columns {
        Some(ranges) => FixedColumnDetector::new(ranges.clone()).detect(&anchors, page_width),
        None => SingleColumnDetector::new().detect(&anchors, page_width),
    };

    let positions: IndexMap<String, Point> = anchors
        .iter()
        .map(|a| (a.question_id.clone(), a.position))
        .collect();
    let pinned: HashSet<u32> = anchors.iter().map(|a| a.element_id).collect();

    for id in duplicate_element_ids(&page.elements) {
        warn!(
            page = page.page_idx,
            element = id,
            "duplicate element id; its copies share one assignment slot"
        );
    }

    let mut assignment = Assignment::new(page.questions.iter().map(|q| q.id.clone()));
    for anchor in &anchors {
        if let Some(element) = page.elements.iter().find(|e| e.id == anchor.element_id) {
            assignment.insert(&anchor.question_id, element.clone());
        }
    }

    let analyzer = Spatial2DAnalyzer::from_config(config);
    let mut distances = Vec::new();
    let mut placed = 0usize;
    for element in page.elements.iter().filter(|e| !pinned.contains(&e.id)) {
        placed += 1;
        if element.bbox.is_empty() {
            assignment.insert(UNKNOWN_QUESTION, element.clone());
            continue;
        }
        let center = element.center();
        match analyzer.place(center.x, center.y, &positions, &columns) {
            Placement::Question {
                question_id,
                distance,
                ..
            } => {
                distances.push(distance);
                assignment.insert(&question_id, element.clone());
            }
            Placement::Unknown => {
                assignment.insert(UNKNOWN_QUESTION, element.clone());
            }
        }
    }
    let diagnostics = summarize(placed, &distances);

    let conflicts = ConflictDetector::from_config(config).detect(&assignment);
    let outcome =
        ElementReassignmentEngine::from_config(config).resolve(&conflicts, &mut assignment, &pinned);

    debug!(
        page = page.page_idx,
        anchors = anchors.len(),
        columns = columns.len(),
        unknown = assignment.unknown().len(),
        conflicts = conflicts.len(),
        moved = outcome.records.len(),
        "page structured"
    );

    let elements = page
        .elements
        .iter()
        .map(|e| {
            let mut resolved = e.clone();
            resolved.ocr_text = ocr_text_for(e, &page.ocr).map(str::to_string);
            resolved
        })
        .collect();

    PageResult {
        page_idx: page.page_idx,
        width: page_width,
        height: page.page_height(),
        anchors,
        missing_anchors,
        columns,
        assignment: assignment.to_id_map(),
        conflicts: conflicts.iter().map(ConflictReport::from).collect(),
        reassignments: outcome.records,
        conflicts_resolved: outcome.conflicts_resolved,
        diagnostics,
        elements,
    }
}

/// Structures every page; pages are independent and run in parallel.
pub fn build_document(input: &DocumentInput, config: &AnalyzerConfig) -> DocumentResult {
    let mut pages: Vec<PageResult> = input
        .pages
        .par_iter()
        .map(|page| structure_page(page, config))
        .collect();
    pages.sort_by_key(|page| page.page_idx);
    DocumentResult { pages }
}

pub fn run(config: &PipelineConfig) -> Result<DocumentResult> {
    let input = load_document(&config.input)?;
    Ok(build_document(&input, &config.analyzer))
}

pub fn export_document(document: &DocumentResult, config: &PipelineConfig) -> Result<()> {
    let output = config.output.as_path();
    for format in &config.formats {
        match format {
            OutputFormat::Json => JsonExporter::new(output.to_path_buf())
                .with_per_page(config.per_page_json)
                .export(document)?,
            OutputFormat::Markdown => MarkdownExporter::new(output.to_path_buf()).export(document)?,
            OutputFormat::Html => HtmlDebugExporter::new(output.join("debug")).export(document)?,
        }
    }
    Ok(())
}
