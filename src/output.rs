//! Result types produced by the recognition and normalization stages.
//!
//! Everything here is plain data with serde derives so the CLI can emit
//! structured JSON (`--json`) and callers can persist run records.

use crate::error::TileError;
use serde::{Deserialize, Serialize};

/// Recognized text for a single page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageText {
    /// 1-indexed page number.
    pub page_num: usize,
    /// Filtered text for the page: non-empty tile texts joined by one blank
    /// line. Empty when nothing on the page was recognized.
    pub text: String,
    /// Number of tiles the page was sliced into (1 for image sources).
    pub tile_count: usize,
    /// Tiles whose engine call failed; each contributed empty text.
    pub failed_tiles: Vec<TileError>,
    /// Wall-clock time spent on this page.
    pub duration_ms: u64,
}

/// The result of recognizing one source document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionOutput {
    /// Document text: non-empty page texts joined by one blank line.
    pub text: String,
    /// Per-page results in page order.
    pub pages: Vec<PageText>,
    /// The language profile the engine ran with (e.g. `"chi_sim+eng"`).
    /// Resolved once per document; recorded for diagnostics.
    pub language: String,
    /// Aggregate counters and timings.
    pub stats: RecognitionStats,
}

/// Aggregate statistics for one recognition run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecognitionStats {
    /// Pages in the source document (1 for image sources).
    pub total_pages: usize,
    /// Total tiles across all pages.
    pub total_tiles: usize,
    /// Tiles that failed recognition and contributed empty text.
    pub failed_tiles: usize,
    /// Character count of the final document text.
    pub total_chars: usize,
    /// Time spent rasterising pages.
    pub render_duration_ms: u64,
    /// Time spent inside engine calls.
    pub ocr_duration_ms: u64,
    /// End-to-end wall-clock time.
    pub total_duration_ms: u64,
}

/// Metadata parsed from the underscore-delimited filename convention
/// (`Title_YYYYMMDDhhmmss_page_info.txt`). Best-effort: every field defaults
/// to the empty string and parsing never fails.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub title: String,
    /// `YYYY-MM-DD`, or empty when the second field is absent or not a
    /// timestamp.
    pub date: String,
    /// Remaining fields rejoined with underscores.
    pub page_info: String,
}

/// The result of normalizing one raw OCR text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanResult {
    pub metadata: FileMetadata,
    /// Whitespace-free, punctuation-normalized text.
    pub normalized_text: String,
    pub sentences: Vec<String>,
    pub paragraphs: Vec<String>,
    pub stats: CleanStats,
}

/// Size statistics for one normalization run. Lengths are character counts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleanStats {
    pub original_length: usize,
    pub cleaned_length: usize,
    pub sentence_count: usize,
    pub paragraph_count: usize,
    /// `(1 − cleaned/original) × 100` formatted as `"40.00%"`; `"0.00%"`
    /// when the original text is empty.
    pub compression_ratio: String,
}
