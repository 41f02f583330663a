//! CLI binary for pdf2rmd.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConversionConfig`, asks for a path when none is given, and turns
//! library errors into distinct exit codes.

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use indicatif::{ProgressBar, ProgressStyle};
use pdf2rmd::{
    run_pipeline, ConversionConfig, ConversionOutput, ConversionProgressCallback, OcrMode,
    Pdf2RmdError, ProgressCallback, Stage,
};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress: one spinner whose prefix shows the current stage and
/// a log line per finished stage. The OCR stage can run for many minutes
/// without printing anything, so the steady tick is what tells the user
/// the process is still alive.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed_precise:.dim}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

fn stage_message(stage: Stage) -> &'static str {
    match stage {
        Stage::Input => "Checking input…",
        Stage::Copy => "Copying PDF to assets/in…",
        Stage::Rasterize => "Converting pages to PNG…",
        Stage::Ocr => "Running Nougat OCR (this can take a while)…",
        Stage::Assemble => "Generating R Markdown…",
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, document: &str) {
        self.bar
            .println(format!("{} {}", cyan("◆"), bold(&format!("Converting {document}"))));
    }

    fn on_stage_start(&self, stage: Stage) {
        self.bar
            .set_prefix(format!("[{}/{}]", stage.step(), Stage::PIPELINE.len()));
        self.bar.set_message(stage_message(stage));
        self.bar.reset_elapsed();
    }

    fn on_stage_complete(&self, stage: Stage, detail: &str) {
        self.bar.println(format!(
            "  {} {:<10} {}  {}",
            green("✓"),
            stage.to_string(),
            detail,
            dim(&format!("{:.1}s", self.bar.elapsed().as_secs_f64())),
        ));
    }

    fn on_stage_error(&self, stage: Stage, error: &str) {
        // Keep the first line only; the full message is printed on exit.
        let first = error.lines().next().unwrap_or(error);
        self.bar
            .println(format!("  {} {:<10} {}", red("✗"), stage.to_string(), red(first)));
        self.bar.finish_and_clear();
    }

    fn on_conversion_complete(&self, _output: &std::path::Path) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert, prompting for the path
  pdf2rmd

  # Convert a file; outputs land under ./assets/
  pdf2rmd paper.pdf

  # Use a different working root and resolution
  pdf2rmd --root /tmp/work --dpi 300 scan.pdf

  # Feed the rasterised pages to an image-capable OCR wrapper
  pdf2rmd --ocr-mode images --ocr-program my-ocr-wrapper scan.pdf

  # Machine-readable report
  pdf2rmd --json paper.pdf > report.json

OUTPUT LAYOUT (relative to --root):
  assets/in/<name>.pdf            staged copy of the input
  assets/out/png/1.png …          one image per page
  assets/out/nougat/<stem>.mmd    Nougat transcript
  assets/out/<stem>.Rmd           R Markdown document

EXIT STATUS:
  0   success
  1   internal error
  2   invalid input or configuration
  3   input PDF not found
  4   copying the PDF failed
  5   rasterisation failed
  6   OCR engine not installed
  7   OCR engine failed
  8   OCR produced no transcript
  9   transcript unreadable
  10  writing the output document failed

REQUIREMENTS:
  pdftoppm   sudo apt-get install poppler-utils   (brew install poppler)
  nougat     pip install nougat-ocr
"#;

/// Convert a scanned PDF to R Markdown using pdftoppm and Nougat OCR.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2rmd",
    version,
    about = "Convert a scanned PDF to R Markdown using pdftoppm and Nougat OCR",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Path to the PDF file. Prompted for when omitted.
    input: Option<String>,

    /// Working root; the assets/ tree is created under it.
    #[arg(long, env = "PDF2RMD_ROOT", default_value = ".")]
    root: PathBuf,

    /// Rasterisation DPI (72–600).
    #[arg(long, env = "PDF2RMD_DPI", default_value_t = 150,
          value_parser = clap::value_parser!(u32).range(72..=600))]
    dpi: u32,

    /// What Nougat reads: the staged PDF or the rasterised page images.
    #[arg(long, env = "PDF2RMD_OCR_MODE", value_enum, default_value = "pdf")]
    ocr_mode: OcrModeArg,

    /// Rasteriser executable.
    #[arg(long, env = "PDF2RMD_RASTERIZER", default_value = "pdftoppm")]
    rasterizer: String,

    /// OCR executable.
    #[arg(long, env = "PDF2RMD_OCR_PROGRAM", default_value = "nougat")]
    ocr_program: String,

    /// Extra argument for the OCR engine (repeatable, passed as-is).
    /// Replaces the default `--no-skipping`. Without this flag,
    /// whitespace-separated arguments from PDF2RMD_OCR_ARGS are used.
    #[arg(long = "ocr-arg", action = ArgAction::Append, allow_hyphen_values = true)]
    ocr_args: Vec<String>,

    /// `author:` field of the generated document.
    #[arg(long, env = "PDF2RMD_AUTHOR", default_value = "Generated by pdf2rmd")]
    author: String,

    /// Print the conversion report as JSON on stdout.
    #[arg(long, env = "PDF2RMD_JSON")]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "PDF2RMD_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2RMD_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2RMD_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum OcrModeArg {
    Pdf,
    Images,
}

impl From<OcrModeArg> for OcrMode {
    fn from(v: OcrModeArg) -> Self {
        match v {
            OcrModeArg::Pdf => OcrMode::Pdf,
            OcrModeArg::Images => OcrMode::Images,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner provides the feedback that matters; INFO logs would tear it.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match run(&cli, show_progress).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {:#}", red("Error:"), err);
            let code = err
                .downcast_ref::<Pdf2RmdError>()
                .map_or(1, Pdf2RmdError::exit_code);
            ExitCode::from(code)
        }
    }
}

async fn run(cli: &Cli, show_progress: bool) -> Result<()> {
    // ── Resolve input ────────────────────────────────────────────────────
    let raw_input = match cli.input {
        Some(ref s) => s.clone(),
        None => prompt_for_path().context("Failed to read PDF path from stdin")?,
    };
    let source = pdf2rmd::resolve_input(&raw_input)?;

    if !cli.quiet && !cli.json {
        let size_mb = std::fs::metadata(&source)
            .map(|m| m.len() as f64 / 1024.0 / 1024.0)
            .unwrap_or(0.0);
        eprintln!("Input PDF: {}", source.display());
        eprintln!("Size:      {size_mb:.1} MB");
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };
    let config = build_config(cli, progress_cb)?;

    // ── Run conversion ───────────────────────────────────────────────────
    let output = run_pipeline(&source, &config).await?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else if !cli.quiet {
        print_summary(&output);
    }

    Ok(())
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .root(&cli.root)
        .dpi(cli.dpi)
        .ocr_mode(cli.ocr_mode.clone().into())
        .rasterizer(&cli.rasterizer)
        .ocr_program(&cli.ocr_program)
        .author(cli.author.clone());

    if let Some(args) = ocr_args(cli, std::env::var(OCR_ARGS_ENV).ok()) {
        builder = builder.ocr_args(args);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    Ok(builder.build()?)
}

const OCR_ARGS_ENV: &str = "PDF2RMD_OCR_ARGS";

/// OCR arguments overriding the library default, if any.
///
/// `--ocr-arg` values are taken verbatim (an empty value clears the list);
/// otherwise `env_value` is split on whitespace.
fn ocr_args(cli: &Cli, env_value: Option<String>) -> Option<Vec<String>> {
    if !cli.ocr_args.is_empty() {
        return Some(cli.ocr_args.iter().filter(|a| !a.is_empty()).cloned().collect());
    }
    env_value.map(|v| v.split_whitespace().map(str::to_string).collect())
}

/// Ask for a path on stdin.
fn prompt_for_path() -> Result<String> {
    eprint!("Enter path to PDF file: ");
    io::stderr().flush().ok();

    let mut line = String::new();
    let read = io::stdin().lock().read_line(&mut line)?;
    if read == 0 {
        anyhow::bail!("no path given (stdin closed)");
    }
    Ok(line.trim().to_string())
}

fn print_summary(output: &ConversionOutput) {
    let png_dir = output
        .page_images
        .first()
        .and_then(|p| p.parent())
        .map(|p| p.display().to_string())
        .unwrap_or_default();

    eprintln!(
        "{} {} pages  {}ms  →  {}",
        green("✔"),
        output.stats.page_count,
        output.stats.total_duration_ms,
        bold(&output.output.display().to_string()),
    );
    eprintln!("   PNG pages:  {}", dim(&png_dir));
    eprintln!("   Transcript: {}", dim(&output.transcript.display().to_string()));
    eprintln!();
    eprintln!("Next steps:");
    eprintln!("  1. Review {}", output.output.display());
    eprintln!(
        "  2. Render: Rscript -e 'rmarkdown::render(\"{}\")'",
        output.output.display()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ocr_arg_with_comma_stays_one_argument() {
        let cli = Cli::try_parse_from([
            "pdf2rmd",
            "--ocr-arg=--pages",
            "--ocr-arg=1-4,7",
            "x.pdf",
        ])
        .unwrap();
        assert_eq!(cli.ocr_args, vec!["--pages", "1-4,7"]);
        assert_eq!(
            ocr_args(&cli, Some("--batchsize 2".into())),
            Some(vec!["--pages".to_string(), "1-4,7".to_string()])
        );
    }

    #[test]
    fn ocr_arg_accepts_hyphen_values_as_separate_tokens() {
        let cli =
            Cli::try_parse_from(["pdf2rmd", "--ocr-arg", "--markdown", "x.pdf"]).unwrap();
        assert_eq!(cli.ocr_args, vec!["--markdown"]);
        assert_eq!(cli.input.as_deref(), Some("x.pdf"));
    }

    #[test]
    fn env_ocr_args_split_on_whitespace() {
        let cli = Cli::try_parse_from(["pdf2rmd", "x.pdf"]).unwrap();
        assert_eq!(
            ocr_args(&cli, Some(" --pages  1-4,7 ".into())),
            Some(vec!["--pages".to_string(), "1-4,7".to_string()])
        );
    }

    #[test]
    fn no_ocr_args_keeps_library_default() {
        let cli = Cli::try_parse_from(["pdf2rmd", "x.pdf"]).unwrap();
        assert_eq!(ocr_args(&cli, None), None);

        let config = ConversionConfig::builder().build().unwrap();
        assert_eq!(config.ocr_args, vec![std::ffi::OsString::from("--no-skipping")]);
    }

    #[test]
    fn empty_ocr_arg_clears_the_list() {
        let cli = Cli::try_parse_from(["pdf2rmd", "--ocr-arg=", "x.pdf"]).unwrap();
        assert_eq!(ocr_args(&cli, None), Some(Vec::new()));
    }
}
