//! CLI binary for ocr2text.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `RecognizeConfig`/`CleanConfig`, drives single-file and directory-batch
//! runs, and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use ocr2text::{
    clean_file, default_cleaned_path, default_output_path, recognize, CleanConfig,
    ProgressCallback, RecognitionProgressCallback, RecognizeConfig,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
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

/// Terminal progress callback: renders a live per-page progress bar and log
/// lines using [indicatif]. One instance is created per document.
struct CliProgressCallback {
    /// The single progress bar anchored at the bottom of the terminal.
    bar: ProgressBar,
    /// Count of tiles that contributed empty text due to engine failure.
    failed_tiles: AtomicUsize,
}

impl CliProgressCallback {
    /// Create a callback whose progress-bar length is set dynamically by
    /// `on_document_start` (called once the document has been opened).
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0); // length set in on_document_start

        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening document…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            failed_tiles: AtomicUsize::new(0),
        })
    }

    /// Switch to the full progress-bar style once we know `total`.
    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Recognizing");
    }
}

impl RecognitionProgressCallback for CliProgressCallback {
    fn on_document_start(&self, total_pages: usize) {
        self.activate_bar(total_pages);
    }

    fn on_page_start(&self, page_num: usize, _total: usize) {
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_tile_complete(&self, page_num: usize, tile_num: usize, chars: usize) {
        self.bar
            .set_message(format!("page {page_num} tile {tile_num} ({chars} chars)"));
    }

    fn on_page_complete(&self, page_num: usize, total: usize, chars: usize) {
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}",
            green("✓"),
            page_num,
            total,
            dim(&format!("{chars:>6} chars")),
        ));
        self.bar.inc(1);
    }

    fn on_document_complete(&self, _total_pages: usize, failed_tiles: usize) {
        self.failed_tiles.store(failed_tiles, Ordering::SeqCst);
        self.bar.finish_and_clear();
        if failed_tiles > 0 {
            eprintln!(
                "{} {} tile(s) failed and contributed no text",
                cyan("⚠"),
                red(&failed_tiles.to_string())
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # OCR a single PDF (writes document.txt beside it)
  ocr2text document.pdf

  # OCR a single image
  ocr2text scan.png

  # OCR every PDF and image in a directory
  ocr2text /path/to/scans -d

  # Batch mode without per-page progress
  ocr2text /path/to/scans -d -q

  # OCR and normalize in one run (also writes document_cleaned.txt)
  ocr2text document.pdf -c

  # Normalize an existing OCR text file (no OCR engine needed)
  ocr2text document.txt --clean-only

  # Normalize every .txt in a directory
  ocr2text /path/to/texts -d --clean-only

  # Structured JSON result on stdout
  ocr2text document.pdf --json > result.json

SUPPORTED FORMATS:
  pdf, png, jpg, jpeg, bmp, tiff, tif, webp

ENVIRONMENT VARIABLES:
  OCR2TEXT_TESSERACT      Path to the tesseract binary (default: PATH lookup)
  PDFIUM_DYNAMIC_LIB_PATH Path to libpdfium if not in a default location

SETUP:
  1. Install Tesseract and the language packs you need:
       apt install tesseract-ocr tesseract-ocr-chi-sim
       brew install tesseract tesseract-lang
  2. Run:  ocr2text document.pdf

EXIT STATUS:
  0  every file processed successfully
  1  any file failed
  130  interrupted (Ctrl-C)
"#;

/// Extract text from scanned PDFs and images with Tesseract OCR.
#[derive(Parser, Debug)]
#[command(
    name = "ocr2text",
    version,
    about = "Extract text from scanned PDFs and images with Tesseract OCR",
    long_about = "Extract text from scanned documents (PDF pages and raster images) using \
Tesseract OCR. Tall pages are sliced into overlapping bands rendered at high magnification; \
garbled recognition lines are filtered out. Optionally normalizes the result into clean, \
punctuation-canonical paragraphs.",
    arg_required_else_help = false,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF/image file path, or a directory with -d. Default: current directory.
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Process every supported file directly inside the directory.
    #[arg(short, long)]
    directory: bool,

    /// Suppress progress and banners; errors only.
    #[arg(short, long, env = "OCR2TEXT_QUIET")]
    quiet: bool,

    /// After OCR, also normalize the produced .txt (writes {stem}_cleaned.txt).
    #[arg(short, long)]
    clean: bool,

    /// Skip OCR; treat input file(s) as raw OCR text and only normalize.
    #[arg(long, conflicts_with = "clean")]
    clean_only: bool,

    /// Write output to this file instead of beside the input (single-file mode).
    #[arg(short, long, env = "OCR2TEXT_OUTPUT")]
    output: Option<PathBuf>,

    /// Print the structured result as pretty JSON on stdout.
    #[arg(long, env = "OCR2TEXT_JSON")]
    json: bool,

    /// Slice height in PDF points.
    #[arg(long, env = "OCR2TEXT_SLICE_HEIGHT", default_value_t = 1500.0)]
    slice_height: f32,

    /// Overlap between consecutive slices in PDF points.
    #[arg(long, env = "OCR2TEXT_SLICE_OVERLAP", default_value_t = 100.0)]
    slice_overlap: f32,

    /// Magnification factor applied when rendering pages.
    #[arg(long, env = "OCR2TEXT_ZOOM", default_value_t = 3.0)]
    zoom: f32,

    /// Preferred language packs, comma-separated, in order (e.g. chi_tra,chi_sim).
    #[arg(long, env = "OCR2TEXT_LANGUAGES", default_value = "chi_sim")]
    languages: String,

    /// Tesseract page-segmentation mode.
    #[arg(long, env = "OCR2TEXT_PSM", default_value_t = 6)]
    psm: u32,

    /// Disable the progress bar.
    #[arg(long, env = "OCR2TEXT_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "OCR2TEXT_VERBOSE")]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
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

    // ── Dispatch ─────────────────────────────────────────────────────────
    if cli.directory {
        let (_success, fail) = if cli.clean_only {
            run_clean_batch(&cli)?
        } else {
            run_ocr_batch(&cli)?
        };
        if fail > 0 {
            std::process::exit(1);
        }
        return Ok(());
    }

    if cli.path.is_dir() {
        eprintln!("'{}' is a directory", cli.path.display());
        eprintln!("Use -d to process every supported file in it:");
        eprintln!("  ocr2text {} -d", cli.path.display());
        std::process::exit(1);
    }

    if cli.clean_only {
        run_clean_single(&cli, &cli.path, cli.output.as_deref())
    } else {
        run_ocr_single(&cli, &cli.path, cli.output.as_deref())
    }
}

/// Map CLI args to `RecognizeConfig`, attaching a progress callback when the
/// terminal wants one.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<RecognizeConfig> {
    let languages: Vec<String> = cli
        .languages
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    let mut builder = RecognizeConfig::builder()
        .slice_height(cli.slice_height)
        .slice_overlap(cli.slice_overlap)
        .magnification(cli.zoom)
        .preferred_languages(languages)
        .page_segmentation_mode(cli.psm);

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// OCR one file: recognize, persist the text, optionally normalize, report.
fn run_ocr_single(cli: &Cli, source: &Path, output: Option<&Path>) -> Result<()> {
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let progress: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new_dynamic() as Arc<dyn RecognitionProgressCallback>)
    } else {
        None
    };
    let config = build_config(cli, progress)?;

    let result = recognize(source, &config)
        .with_context(|| format!("Recognition failed for '{}'", source.display()))?;

    let out_path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output_path(source));
    std::fs::write(&out_path, &result.text)
        .with_context(|| format!("Failed to write '{}'", out_path.display()))?;

    if cli.json {
        let json = serde_json::to_string_pretty(&result).context("Failed to serialise output")?;
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle.write_all(json.as_bytes()).ok();
        handle.write_all(b"\n").ok();
    }

    if !cli.quiet {
        eprintln!(
            "{}  {} pages  {} chars  {}ms  →  {}",
            if result.stats.failed_tiles == 0 {
                green("✔")
            } else {
                cyan("⚠")
            },
            result.stats.total_pages,
            result.stats.total_chars,
            result.stats.total_duration_ms,
            bold(&out_path.display().to_string()),
        );
        eprintln!(
            "   {} tiles  {} failed  —  language {}",
            dim(&result.stats.total_tiles.to_string()),
            dim(&result.stats.failed_tiles.to_string()),
            dim(&result.language),
        );
    }

    if cli.clean {
        let cleaned_path = default_cleaned_path(&out_path);
        let cleaned = clean_file(&out_path, &cleaned_path, &CleanConfig::default())
            .with_context(|| format!("Cleaning failed for '{}'", out_path.display()))?;
        if !cli.quiet {
            eprintln!(
                "{}  cleaned {} → {} chars ({})  →  {}",
                green("✔"),
                cleaned.stats.original_length,
                cleaned.stats.cleaned_length,
                cleaned.stats.compression_ratio,
                bold(&cleaned_path.display().to_string()),
            );
        }
    }

    Ok(())
}

/// Normalize one existing OCR text file.
fn run_clean_single(cli: &Cli, input: &Path, output: Option<&Path>) -> Result<()> {
    let out_path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_cleaned_path(input));

    let result = clean_file(input, &out_path, &CleanConfig::default())
        .with_context(|| format!("Cleaning failed for '{}'", input.display()))?;

    if cli.json {
        let json = serde_json::to_string_pretty(&result).context("Failed to serialise output")?;
        println!("{json}");
    }

    if !cli.quiet {
        eprintln!(
            "{}  {} → {} chars ({})  {} sentences  {} paragraphs  →  {}",
            green("✔"),
            result.stats.original_length,
            result.stats.cleaned_length,
            result.stats.compression_ratio,
            result.stats.sentence_count,
            result.stats.paragraph_count,
            bold(&out_path.display().to_string()),
        );
        if !result.metadata.title.is_empty() {
            eprintln!(
                "   {} {}  {} {}",
                dim("title:"),
                result.metadata.title,
                dim("date:"),
                result.metadata.date,
            );
        }
    }

    Ok(())
}

/// OCR every supported file directly inside the directory. Per-file errors
/// never abort the batch; returns (success, fail) counts.
fn run_ocr_batch(cli: &Cli) -> Result<(usize, usize)> {
    let files = collect_batch_files(&cli.path, |p| ocr2text::pipeline::input::is_supported(p))?;
    run_batch(cli, &files, |cli, file| run_ocr_single(cli, file, None))
}

/// Normalize every `.txt` directly inside the directory (skipping files that
/// are already `_cleaned`).
fn run_clean_batch(cli: &Cli) -> Result<(usize, usize)> {
    let files = collect_batch_files(&cli.path, |p| {
        p.extension().is_some_and(|e| e.eq_ignore_ascii_case("txt"))
            && !p
                .file_stem()
                .is_some_and(|s| s.to_string_lossy().ends_with("_cleaned"))
    })?;
    run_batch(cli, &files, |cli, file| run_clean_single(cli, file, None))
}

/// Collect the batch work list: files under `dir` (non-recursive) matching
/// `keep`, sorted by name for a deterministic processing order.
fn collect_batch_files(
    dir: &Path,
    keep: impl Fn(&Path) -> bool,
) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        anyhow::bail!(ocr2text::Ocr2TextError::NotADirectory {
            path: dir.to_path_buf()
        });
    }

    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory '{}'", dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| p.is_file() && keep(p))
        .collect();
    files.sort();

    if files.is_empty() {
        anyhow::bail!(ocr2text::Ocr2TextError::NoSupportedFiles {
            path: dir.to_path_buf()
        });
    }

    Ok(files)
}

/// Drive one file after another, tallying outcomes and printing the batch
/// summary.
fn run_batch(
    cli: &Cli,
    files: &[PathBuf],
    process: impl Fn(&Cli, &Path) -> Result<()>,
) -> Result<(usize, usize)> {
    let total = files.len();
    if !cli.quiet {
        eprintln!(
            "{} {}",
            cyan("◆"),
            bold(&format!(
                "Processing {total} file(s) in {}",
                cli.path.display()
            ))
        );
    }

    let mut success = 0usize;
    let mut fail = 0usize;

    for (idx, file) in files.iter().enumerate() {
        if !cli.quiet {
            eprintln!(
                "\n{} [{}/{}] {}",
                cyan("▸"),
                idx + 1,
                total,
                bold(&file.display().to_string())
            );
        }
        match process(cli, file.as_path()) {
            Ok(()) => success += 1,
            Err(e) => {
                fail += 1;
                eprintln!("  {} {:#}", red("✗"), e);
            }
        }
    }

    if !cli.quiet {
        eprintln!();
        eprintln!(
            "{} {}/{} succeeded{}",
            if fail == 0 { green("✔") } else { red("✘") },
            success,
            total,
            if fail > 0 {
                format!("  ({} failed)", red(&fail.to_string()))
            } else {
                String::new()
            },
        );
    }

    Ok((success, fail))
}
