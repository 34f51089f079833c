pub mod boundary;
pub mod columns;
pub mod config;
pub mod conflict;
pub mod core;
pub mod export;
pub mod pipeline;
pub mod reassign;
pub mod spatial;
pub mod text;

pub use crate::config::AnalyzerConfig;
pub use crate::core::assignment::Assignment;
pub use crate::core::model::{DocumentResult, LayoutElement, PageInput, PageResult, UNKNOWN_QUESTION};
