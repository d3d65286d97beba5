//! Error types for the ocr2text library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Ocr2TextError`] — **Fatal**: recognition of the document cannot
//!   proceed at all (missing input, unsupported format, corrupt PDF,
//!   Tesseract not installed). Returned as `Err(Ocr2TextError)` from the
//!   top-level `recognize*` and `clean*` functions.
//!
//! * [`TileError`] — **Non-fatal**: recognition of a single tile failed
//!   (engine crash, scratch-file glitch) but the remaining tiles are fine.
//!   Tallied inside [`crate::output::PageText`] so callers can inspect
//!   partial success rather than losing the whole document to one bad slice.
//!
//! The separation lets callers decide their own tolerance: abort on the first
//! tile failure, log and continue, or collect all errors for a post-run
//! report. Batch drivers rely on it — a per-file [`Ocr2TextError`] never
//! aborts the surrounding directory run.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the ocr2text library.
///
/// Tile-level failures use [`TileError`] and are tallied in
/// [`crate::output::PageText`] rather than propagated here.
#[derive(Debug, Error)]
pub enum Ocr2TextError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Source file not found: '{path}'\nCheck the path exists and is readable.")]
    SourceNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file extension is not in the supported set.
    #[error(
        "Unsupported file format '{extension}' for '{path}'\n\
         Supported: pdf, png, jpg, jpeg, bmp, tiff, tif, webp"
    )]
    UnsupportedFormat { path: PathBuf, extension: String },

    /// The file has a `.pdf` extension but does not start with `%PDF`.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// Batch mode was invoked on a path that is not a directory.
    #[error("Not a directory: '{path}'\nDrop -d to process a single file.")]
    NotADirectory { path: PathBuf },

    /// Batch mode found nothing to do.
    #[error("No supported files found in '{path}'\nSupported: pdf, png, jpg, jpeg, bmp, tiff, tif, webp")]
    NoSupportedFiles { path: PathBuf },

    // ── Document errors ───────────────────────────────────────────────────
    /// pdfium could not open or parse the document.
    #[error("PDF '{path}' could not be opened: {detail}")]
    CorruptDocument { path: PathBuf, detail: String },

    /// pdfium returned an error while rendering a page.
    #[error("Rendering failed for page {page}: {detail}")]
    RenderFailed { page: usize, detail: String },

    // ── Engine errors ─────────────────────────────────────────────────────
    /// The recognition engine could not be queried at all
    /// (binary missing, `--list-langs` failed).
    #[error(
        "OCR engine unavailable: {detail}\n\
         Install Tesseract (e.g. `apt install tesseract-ocr tesseract-ocr-chi-sim`\n\
         or `brew install tesseract tesseract-lang`) or set OCR2TEXT_TESSERACT\n\
         to the binary path."
    )]
    EngineUnavailable { detail: String },

    /// A recognition call failed for a whole-image source, where there is
    /// no further tile to fall back to.
    #[error("Recognition failed for '{path}': {detail}")]
    RecognitionFailed { path: PathBuf, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output text file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not read a text file handed to the normalizer.
    #[error("Failed to read text file '{path}': {source}")]
    InputReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single tile.
///
/// Recorded alongside [`crate::output::PageText`] when a tile fails.
/// The tile contributes empty text and document processing continues.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum TileError {
    /// Writing the scratch bitmap for the tile failed.
    #[error("Page {page} tile {tile}: scratch bitmap write failed: {detail}")]
    ScratchFailed {
        page: usize,
        tile: usize,
        detail: String,
    },

    /// The engine call for the tile failed.
    #[error("Page {page} tile {tile}: recognition failed: {detail}")]
    EngineFailed {
        page: usize,
        tile: usize,
        detail: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_not_found_display() {
        let e = Ocr2TextError::SourceNotFound {
            path: PathBuf::from("/tmp/missing.pdf"),
        };
        let msg = e.to_string();
        assert!(msg.contains("/tmp/missing.pdf"), "got: {msg}");
    }

    #[test]
    fn unsupported_format_lists_extensions() {
        let e = Ocr2TextError::UnsupportedFormat {
            path: PathBuf::from("notes.docx"),
            extension: "docx".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("docx"));
        assert!(msg.contains("webp"));
    }

    #[test]
    fn engine_unavailable_mentions_tesseract() {
        let e = Ocr2TextError::EngineUnavailable {
            detail: "No such file or directory".into(),
        };
        assert!(e.to_string().contains("Tesseract"));
    }

    #[test]
    fn tile_error_display() {
        let e = TileError::EngineFailed {
            page: 2,
            tile: 3,
            detail: "exit status 1".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("Page 2"));
        assert!(msg.contains("tile 3"));
        assert!(msg.contains("exit status 1"));
    }
}
