use std::fs;
use std::path::PathBuf;

use anyhow::Result;

use crate::core::model::{DocumentResult, LayoutElement, PageResult, UNKNOWN_QUESTION};
use crate::export::Exporter;

/// One HTML page per document page with every element drawn at its detected
/// position, colored by the question it ended up in.
#[derive(Debug, Clone)]
pub struct HtmlDebugExporter {
    out_dir: PathBuf,
}

impl HtmlDebugExporter {
    pub fn new(out_dir: PathBuf) -> Self {
        Self { out_dir }
    }

    fn element_to_div(
        element: &LayoutElement,
        question_id: &str,
        color: &str,
        is_anchor: bool,
        moved_from: Option<&str>,
    ) -> String {
        let bbox = element.bbox;
        let mut classes = String::from("bbox");
        if is_anchor {
            classes.push_str(" anchor");
        }
        if moved_from.is_some() {
            classes.push_str(" moved");
        }
        format!(
            r#"<div class='{classes}' style='left:{x}px; top:{y}px; width:{w}px; height:{h}px; border-color:{color}; background:{color}22;' data-id='{id}' data-class='{class}' data-question='{question}' data-moved-from='{moved}' data-text='{text}'><span class='tag' style='background:{color};'>{tag}</span></div>"#,
            classes = classes,
            x = bbox.x1,
            y = bbox.y1,
            w = bbox.width(),
            h = bbox.height(),
            color = color,
            id = element.id,
            class = html_escape::encode_single_quoted_attribute(&element.class_name),
            question = html_escape::encode_single_quoted_attribute(question_id),
            tag = html_escape::encode_text(question_id),
            moved = html_escape::encode_single_quoted_attribute(moved_from.unwrap_or("")),
            text = html_escape::encode_single_quoted_attribute(
                element.ocr_text.as_deref().unwrap_or("")
            ),
        )
    }

    fn render_page(page: &PageResult) -> String {
        let mut blocks_html = String::new();
        let mut legend_html = String::new();

        for (index, (question_id, ids)) in page.assignment.iter().enumerate() {
            let color = question_color(index, question_id);
            legend_html.push_str(&format!(
                "<div class='legend-item'><span class='legend-box' style='border-color:{color}; background:{color}22;'></span>{} ({})</div>\n",
                html_escape::encode_text(question_id),
                ids.len()
            ));
            for id in ids {
                let Some(element) = page.element(*id) else {
                    continue;
                };
                if element.bbox.is_empty() {
                    continue;
                }
                let moved_from = page
                    .reassignments
                    .iter()
                    .find(|r| r.element_id == *id)
                    .map(|r| r.from_question.as_str());
                blocks_html.push_str(&Self::element_to_div(
                    element,
                    question_id,
                    &color,
                    page.is_anchor(*id),
                    moved_from,
                ));
                blocks_html.push('\n');
            }
        }

        let mut columns_html = String::new();
        for column in &page.columns {
            columns_html.push_str(&format!(
                "<div class='column' style='left:{}px; width:{}px; height:{}px;'></div>\n",
                column.x_start,
                column.x_end as i64 - column.x_start as i64,
                page.height
            ));
        }

        let mut moves_html = String::new();
        for record in &page.reassignments {
            moves_html.push_str(&format!(
                "<li>{}: {} &rarr; {} <small>{}</small></li>\n",
                html_escape::encode_text(&record.element_label),
                html_escape::encode_text(&record.from_question),
                html_escape::encode_text(&record.to_question),
                html_escape::encode_text(&record.reason)
            ));
        }

        format!(
            r#"<!DOCTYPE html>
<html>
<head>
<meta charset='utf-8'>
<title>qstruct Debug Page {page_no}</title>
<style>
body {{ margin: 0; font-family: Arial, sans-serif; }}
#canvas {{ position: relative; width: {width}px; height: {height}px; background: #fafafa; }}
.column {{ position: absolute; top: 0; border-left: 1px dashed #bbb; border-right: 1px dashed #bbb; box-sizing: border-box; }}
.bbox {{ position: absolute; border: 2px solid; box-sizing: border-box; }}
.bbox.anchor {{ border-width: 4px; }}
.bbox.moved {{ border-style: dashed; }}
.tag {{ position: absolute; left: 0; top: -16px; color: #fff; font-size: 11px; padding: 0 3px; }}
#info {{ position: fixed; right: 10px; top: 10px; background: #fff; padding: 10px; border: 1px solid #ddd; max-width: 320px; }}
#legend {{ position: fixed; right: 10px; bottom: 10px; background: #fff; padding: 10px; border: 1px solid #ddd; font-size: 12px; max-height: 50%; overflow: auto; }}
.legend-item {{ margin: 5px 0; }}
.legend-box {{ display: inline-block; width: 20px; height: 15px; border: 2px solid; vertical-align: middle; margin-right: 5px; }}
</style>
</head>
<body>
<div id='info'>Click an element to inspect.<ul>{moves}</ul></div>
<div id='legend'>
{legend}</div>
<div id='canvas'>
{columns}{blocks}</div>
<script>
const info = document.getElementById('info');
const fields = [['id', 'id'], ['class', 'class'], ['question', 'question'], ['moved from', 'movedFrom'], ['text', 'text']];
for (const el of document.querySelectorAll('.bbox')) {{
  el.addEventListener('click', () => {{
    info.replaceChildren();
    for (const [label, key] of fields) {{
      const line = document.createElement('div');
      line.textContent = `${{label}}: ${{el.dataset[key]}}`;
      info.appendChild(line);
    }}
  }});
}}
</script>
</body>
</html>"#,
            page_no = page.page_idx + 1,
            width = page.width.max(1),
            height = page.height.max(1),
            moves = moves_html,
            legend = legend_html,
            columns = columns_html,
            blocks = blocks_html,
        )
    }
}

/// Spreads question hues around the color wheel; `unknown` is always gray.
fn question_color(index: usize, question_id: &str) -> String {
    if question_id == UNKNOWN_QUESTION {
        return "#808080".to_string();
    }
    let hue = (index * 137) % 360;
    let (r, g, b) = hsl_to_rgb(hue as f64, 0.65, 0.45);
    format!("#{r:02x}{g:02x}{b:02x}")
}

fn hsl_to_rgb(h: f64, s: f64, l: f64) -> (u8, u8, u8) {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = l - c / 2.0;
    let (r, g, b) = match h as u32 {
        0..=59 => (c, x, 0.0),
        60..=119 => (x, c, 0.0),
        120..=179 => (0.0, c, x),
        180..=239 => (0.0, x, c),
        240..=299 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let to_byte = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    (to_byte(r), to_byte(g), to_byte(b))
}

impl Exporter for HtmlDebugExporter {
    fn export(&self, document: &DocumentResult) -> Result<()> {
        fs::create_dir_all(&self.out_dir)?;
        for page in &document.pages {
            let path = self
                .out_dir
                .join(format!("page_{:03}.html", page.page_idx + 1));
            fs::write(path, Self::render_page(page))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::BBox;

    #[test]
    fn unknown_bucket_is_gray() {
        assert_eq!(question_color(3, UNKNOWN_QUESTION), "#808080");
        assert_ne!(question_color(0, "1"), question_color(1, "2"));
    }

    #[test]
    fn pure_red_hue() {
        assert_eq!(hsl_to_rgb(0.0, 1.0, 0.5), (255, 0, 0));
    }

    #[test]
    fn question_ids_are_attribute_escaped() {
        let element =
            LayoutElement::new(1, "plain_text", BBox::new(0, 0, 10, 10)).with_ocr_text("<b>it's</b>");
        let div = HtmlDebugExporter::element_to_div(&element, "q'1", "#ff0000", false, None);

        assert!(div.contains("data-question='q&#x27;1'"));
        assert!(!div.contains("data-question='q'1'"));
        assert!(!div.contains("<b>"));
    }

    #[test]
    fn inspector_never_writes_inner_html() {
        let page = PageResult {
            page_idx: 0,
            width: 100,
            height: 100,
            anchors: Vec::new(),
            missing_anchors: Vec::new(),
            columns: Vec::new(),
            assignment: Default::default(),
            conflicts: Vec::new(),
            reassignments: Vec::new(),
            conflicts_resolved: 0,
            diagnostics: Default::default(),
            elements: Vec::new(),
        };
        let html = HtmlDebugExporter::render_page(&page);
        assert!(!html.contains("innerHTML"));
        assert!(html.contains("textContent"));
    }
}
