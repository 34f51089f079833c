use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use qstruct::config::AnalyzerConfig;
use qstruct::core::model::class_names;
use qstruct::pipeline::{export_document, load_document, run, OutputFormat, PipelineConfig};
use qstruct::spatial::DistanceMetric;

#[derive(Parser, Debug)]
#[command(name = "qstruct")]
#[command(version, about = "Group worksheet layout detections into per-question blocks", long_about = None)]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Assign the elements of one layout JSON file to questions
    Assign {
        /// Input layout JSON (single page or {"pages": [...]})
        input: PathBuf,

        /// Output directory (default: ./<input_name>_output)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        options: AnalyzeOptions,

        /// Suppress progress output
        #[arg(short, long)]
        quiet: bool,
    },

    /// Assign multiple layout JSON files
    Batch {
        /// Input layout JSON files
        inputs: Vec<PathBuf>,

        /// Output directory for all results
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        options: AnalyzeOptions,
    },

    /// Show information about a layout JSON file
    Info {
        /// Input layout JSON file
        input: PathBuf,
    },
}

#[derive(Args, Debug, Clone)]
struct AnalyzeOptions {
    /// Output format(s) to generate
    #[arg(short, long, value_enum, default_values_t = vec![Format::Json, Format::Markdown])]
    format: Vec<Format>,

    /// JSON file with analyzer thresholds
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Distance metric for element-to-question assignment
    #[arg(long, value_enum)]
    metric: Option<Metric>,

    /// Maximum weighted distance before an element is left unassigned
    #[arg(long)]
    max_distance: Option<f64>,

    /// Also write one JSON file per page under pages/
    #[arg(long)]
    per_page: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
enum Format {
    Json,
    Markdown,
    Html,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Json => OutputFormat::Json,
            Format::Markdown => OutputFormat::Markdown,
            Format::Html => OutputFormat::Html,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
enum Metric {
    Euclidean,
    Manhattan,
}

impl From<Metric> for DistanceMetric {
    fn from(metric: Metric) -> Self {
        match metric {
            Metric::Euclidean => DistanceMetric::Euclidean,
            Metric::Manhattan => DistanceMetric::Manhattan,
        }
    }
}

impl AnalyzeOptions {
    fn analyzer_config(&self) -> Result<AnalyzerConfig> {
        let mut config = match &self.config {
            Some(path) => AnalyzerConfig::from_file(path)?,
            None => AnalyzerConfig::default(),
        };
        if let Some(metric) = self.metric {
            config = config.with_metric(metric.into());
        }
        if let Some(max_distance) = self.max_distance {
            config = config.with_max_distance(max_distance);
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Assign {
            input,
            output,
            options,
            quiet,
        } => assign_single(input, output, &options, quiet),
        Commands::Batch {
            inputs,
            output,
            options,
        } => assign_batch(inputs, output, &options),
        Commands::Info { input } => show_info(input),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn input_stem(input: &Path) -> String {
    input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "input".to_string())
}

fn assign_single(
    input: PathBuf,
    output: Option<PathBuf>,
    options: &AnalyzeOptions,
    quiet: bool,
) -> Result<()> {
    if !input.exists() {
        anyhow::bail!("Input file does not exist: {}", input.display());
    }
    if !input.is_file() {
        anyhow::bail!("Input is not a file: {}", input.display());
    }

    let output_dir =
        output.unwrap_or_else(|| PathBuf::from(format!("{}_output", input_stem(&input))));
    let analyzer = options.analyzer_config()?;

    if !quiet {
        println!("[*] Processing: {}", input.display());
        println!("[*] Output: {}", output_dir.display());
        println!(
            "[*] Metric: {:?}, max distance: {}",
            analyzer.metric, analyzer.max_distance
        );
    }

    let formats: Vec<OutputFormat> = options.format.iter().copied().map(Into::into).collect();
    let config = PipelineConfig::new(input.clone(), output_dir.clone(), analyzer)
        .with_formats(formats)
        .with_per_page_json(options.per_page);

    if !quiet {
        println!("\n[+] Assigning elements...");
    }

    let document =
        run(&config).with_context(|| format!("Failed to process: {}", input.display()))?;

    if !quiet {
        for page in &document.pages {
            println!(
                "    page {}: {} question(s), {}/{} assigned, {} unknown, {} moved",
                page.page_idx + 1,
                page.anchors.len(),
                page.diagnostics.assigned_elements,
                page.diagnostics.total_elements,
                page.diagnostics.unknown_elements,
                page.reassignments.len()
            );
        }
        println!("[+] Exporting results...");
    }

    export_document(&document, &config)
        .with_context(|| format!("Failed to export to: {}", output_dir.display()))?;

    if !quiet {
        println!("\n[✓] Done! Results saved to: {}", output_dir.display());
    }

    Ok(())
}

fn assign_batch(
    inputs: Vec<PathBuf>,
    output: Option<PathBuf>,
    options: &AnalyzeOptions,
) -> Result<()> {
    if inputs.is_empty() {
        anyhow::bail!("No input files specified");
    }

    let base_output = output.unwrap_or_else(|| PathBuf::from("batch_output"));

    println!("[*] Batch processing {} file(s)", inputs.len());
    println!("[*] Base output: {}\n", base_output.display());

    let mut success = 0;
    let mut failed = 0;

    for (i, input) in inputs.iter().enumerate() {
        println!("[{}/{}] Processing: {}", i + 1, inputs.len(), input.display());

        if !input.exists() {
            eprintln!("  [!] Skipped: file does not exist");
            failed += 1;
            continue;
        }

        let output_dir = base_output.join(input_stem(input));

        match assign_single(input.clone(), Some(output_dir), options, true) {
            Ok(_) => {
                println!("  [✓] Success");
                success += 1;
            }
            Err(e) => {
                eprintln!("  [✗] Failed: {:#}", e);
                failed += 1;
            }
        }
        println!();
    }

    println!("\n[*] Summary: {} succeeded, {} failed", success, failed);

    if failed > 0 {
        anyhow::bail!("{} file(s) failed to process", failed);
    }

    Ok(())
}

fn show_info(input: PathBuf) -> Result<()> {
    if !input.exists() {
        anyhow::bail!("Input file does not exist: {}", input.display());
    }

    let document = load_document(&input)?;

    println!("Layout Information");
    println!("==================");
    println!("File: {}", input.display());
    println!("Pages: {}", document.pages.len());

    for page in &document.pages {
        let numbers = page
            .elements
            .iter()
            .filter(|e| e.has_class(class_names::QUESTION_NUMBER))
            .count();
        let types = page
            .elements
            .iter()
            .filter(|e| e.has_class(class_names::QUESTION_TYPE))
            .count();
        println!(
            "  page {}: {} element(s), {} question(s), {} number anchor(s), {} type anchor(s), {} OCR entr{}",
            page.page_idx + 1,
            page.elements.len(),
            page.questions.len(),
            numbers,
            types,
            page.ocr.len(),
            if page.ocr.len() == 1 { "y" } else { "ies" }
        );
        if let Some(columns) = &page.columns {
            println!("    columns: {}", columns.len());
        }
    }

    Ok(())
}
