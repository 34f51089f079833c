use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::core::model::DocumentResult;
use crate::export::Exporter;

/// Writes `structure.json` for the whole document and, optionally, one
/// `pages/page_NNN.json` per page.
#[derive(Debug, Clone)]
pub struct JsonExporter {
    out_dir: PathBuf,
    per_page: bool,
}

impl JsonExporter {
    pub fn new(out_dir: PathBuf) -> Self {
        Self {
            out_dir,
            per_page: false,
        }
    }

    pub fn with_per_page(mut self, per_page: bool) -> Self {
        self.per_page = per_page;
        self
    }
}

impl Exporter for JsonExporter {
    fn export(&self, document: &DocumentResult) -> Result<()> {
        fs::create_dir_all(&self.out_dir)?;
        let path = self.out_dir.join("structure.json");
        let data = serde_json::to_string_pretty(document)?;
        fs::write(&path, data).with_context(|| format!("failed to write {}", path.display()))?;

        if self.per_page {
            let pages_dir = self.out_dir.join("pages");
            fs::create_dir_all(&pages_dir)?;
            for page in &document.pages {
                let page_path = pages_dir.join(format!("page_{:03}.json", page.page_idx + 1));
                fs::write(&page_path, serde_json::to_string_pretty(page)?)
                    .with_context(|| format!("failed to write {}", page_path.display()))?;
            }
        }
        Ok(())
    }
}
