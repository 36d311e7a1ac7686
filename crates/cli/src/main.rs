//! CLI tool for finding inconsistent claims across presentation slides.

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use deckcheck_core::{Analysis, Auditor, FolderSource, PipelineConfig, SlideSource};
use deckcheck_gemini::{GeminiClient, GeminiConfig};
use deckcheck_pptx::PptxSource;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Find factual and numerical inconsistencies across the slides of a deck.
#[derive(Parser, Debug)]
#[command(name = "deckcheck")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a .pptx file or a folder of slide images (.jpg, .jpeg, .png)
    input: PathBuf,

    /// Model to use (overrides GEMINI_MODEL)
    #[arg(short, long)]
    model: Option<String>,

    /// Pause between normalization calls, in milliseconds
    #[arg(long, default_value = "1000")]
    throttle_ms: u64,

    /// Multiply all service timeouts by this factor
    #[arg(long, default_value = "1")]
    timeout_scale: u32,

    /// Report format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Human-readable report
    Text,
    /// Findings as a JSON list
    Json,
}

/// What the input path points at.
#[derive(Debug, PartialEq, Eq)]
enum InputKind {
    ImageFolder(PathBuf),
    Pptx(PathBuf),
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load .env file if present (ignore if missing)
    let _ = dotenvy::dotenv();

    // Initialize logging
    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    let mut gemini = GeminiConfig::from_env().context("Cannot configure the reasoning service")?;
    if let Some(model) = &args.model {
        gemini = gemini.with_model(model);
    }
    let client = GeminiClient::new(gemini)?;

    let slides = match classify_input(&args.input)? {
        InputKind::ImageFolder(dir) => {
            let source = FolderSource::new(dir);
            log::info!("Reading slide images from {}", source.dir().display());
            source.load_slides()
        }
        InputKind::Pptx(path) => {
            let source = PptxSource::new(path);
            log::info!("Reading slide text from {}", source.path().display());
            source.load_slides()
        }
    }
    .with_context(|| format!("Failed to load slides from {}", args.input.display()))?;

    if slides.is_empty() {
        log::warn!("No slides found in {}", args.input.display());
    }

    let config = PipelineConfig::new()
        .with_throttle(Duration::from_millis(args.throttle_ms))
        .with_timeout_scale(args.timeout_scale);
    log::info!("Analyzing {} slides with {}", slides.len(), client.config().model);
    let mut auditor = Auditor::new(client).with_config(config);
    let report = auditor.run(&slides);

    if let Some(warning) = failure_warning(&report.analysis) {
        log::warn!("{}", warning);
    }

    match args.format {
        OutputFormat::Text => {
            println!();
            print!("{}", report.rendered);
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(report.findings())
                .context("Failed to serialize findings")?;
            println!("{}", json);
        }
    }

    Ok(())
}

/// A warning for runs whose empty findings list does not mean a clean deck.
fn failure_warning(analysis: &Analysis) -> Option<String> {
    match analysis {
        Analysis::Failed(reason) => Some(format!(
            "Inconsistency analysis failed ({}); an empty findings list does not mean the deck is consistent",
            reason
        )),
        _ => None,
    }
}

/// Decide how to read the input path.
fn classify_input(path: &Path) -> Result<InputKind> {
    if !path.exists() {
        bail!("The specified path does not exist: {}", path.display());
    }

    let path = path
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", path.display()))?;

    if path.is_dir() {
        return Ok(InputKind::ImageFolder(path));
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "pptx" => Ok(InputKind::Pptx(path)),
        "ppt" => bail!(
            "Legacy .ppt files are not supported. Save {} as .pptx, or export the slides as images into a folder.",
            path.display()
        ),
        _ => bail!(
            "Invalid input path {}. Provide a folder of slide images or a .pptx file.",
            path.display()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = classify_input(&dir.path().join("missing.pptx")).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_folder_and_pptx() {
        let dir = tempfile::tempdir().unwrap();
        let deck = dir.path().join("Deck.PPTX");
        fs::write(&deck, b"PK").unwrap();

        assert!(matches!(classify_input(dir.path()).unwrap(), InputKind::ImageFolder(_)));
        assert!(matches!(classify_input(&deck).unwrap(), InputKind::Pptx(_)));
    }

    #[test]
    fn test_unsupported_files() {
        let dir = tempfile::tempdir().unwrap();
        let legacy = dir.path().join("old.ppt");
        let notes = dir.path().join("notes.txt");
        fs::write(&legacy, b"").unwrap();
        fs::write(&notes, b"").unwrap();

        assert!(classify_input(&legacy).unwrap_err().to_string().contains("Legacy .ppt"));
        assert!(classify_input(&notes).unwrap_err().to_string().contains("Invalid input path"));
    }

    #[test]
    fn test_failed_analysis_warns() {
        let warning = failure_warning(&Analysis::Failed("timed out after 300s".to_string())).unwrap();
        assert!(warning.contains("timed out after 300s"));

        assert_eq!(failure_warning(&Analysis::Completed(vec![])), None);
        assert_eq!(failure_warning(&Analysis::Skipped), None);
    }

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from(["deckcheck", "slides/", "--format", "json", "--throttle-ms", "0"]).unwrap();
        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(args.throttle_ms, 0);
        assert_eq!(args.timeout_scale, 1);
    }
}
