//! # ocr2text
//!
//! Extract text from scanned documents (PDF pages and raster images) with
//! Tesseract OCR, then normalize the result into readable paragraphs.
//!
//! ## Why this crate?
//!
//! Scanned CJK documents defeat plain text extractors: the pages are images,
//! the text is often set vertically or as long scrolls, and naive OCR of a
//! whole tall page produces huge bitmaps and poor recognition. This crate
//! slices each page into overlapping horizontal bands rendered at high
//! magnification, recognizes each band through an external Tesseract
//! process, drops the statistically-garbled lines, and merges the rest in
//! reading order. A second, fully decoupled stage turns the raw text into
//! whitespace-free, punctuation-normalized paragraphs.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF / image
//!  │
//!  ├─ 1. Input    classify and validate the source path
//!  ├─ 2. Render   rasterise each page at 3× via pdfium
//!  ├─ 3. Slice    overlapping horizontal bands (1500 pt, 100 pt overlap)
//!  ├─ 4. OCR      tesseract subprocess per band, PSM 6, scratch PNG
//!  ├─ 5. Filter   drop garbled lines (allow-ratio + noise-run heuristics)
//!  └─ 6. Output   blank-line-joined document text + per-page stats
//!
//! raw text ──▶ clean ──▶ normalized paragraphs + metadata + stats
//! ```
//!
//! The two stages communicate only through plain text, so each is
//! independently testable and independently replaceable.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ocr2text::{recognize, clean, CleanConfig, RecognizeConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RecognizeConfig::default();
//!     let output = recognize("scan.pdf", &config)?;
//!     println!("{}", output.text);
//!
//!     let cleaned = clean(&output.text, "scan.pdf", &CleanConfig::default());
//!     for paragraph in &cleaned.paragraphs {
//!         println!("{paragraph}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `ocr2text` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only
//! deps:
//! ```toml
//! ocr2text = { version = "0.3", default-features = false }
//! ```
//!
//! ## Requirements
//!
//! The `tesseract` binary must be installed and on `PATH` (or pointed to by
//! `OCR2TEXT_TESSERACT`), together with the language packs you want —
//! `chi_sim` for simplified Chinese. pdfium is bound through
//! [`pdfium_render`]; set `PDFIUM_DYNAMIC_LIB_PATH` if the library is not in
//! a default location.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod clean;
pub mod config;
pub mod engine;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod recognize;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use clean::{
    clean, clean_file, default_cleaned_path, extract_metadata, normalize, split_paragraphs,
    split_sentences,
};
pub use config::{CleanConfig, FilterConfig, RecognizeConfig, RecognizeConfigBuilder};
pub use engine::{RecognitionEngine, TesseractEngine};
pub use error::{Ocr2TextError, TileError};
pub use output::{
    CleanResult, CleanStats, FileMetadata, PageText, RecognitionOutput, RecognitionStats,
};
pub use progress::{NoopProgressCallback, ProgressCallback, RecognitionProgressCallback};
pub use recognize::{default_output_path, recognize, recognize_to_file};
