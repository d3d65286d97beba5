//! Source resolution: classify and validate a user-supplied input path.
//!
//! The pipeline accepts two kinds of source: paged PDF documents and single
//! raster images. Dispatch is by extension (the same convention scanners and
//! download tools follow), then the file is probed — existence, readability,
//! and for PDFs the `%PDF` magic bytes — so callers get a meaningful error
//! here rather than a pdfium failure three stages later.

use crate::error::Ocr2TextError;
use std::path::Path;

/// Image extensions accepted as single-image sources (lowercase).
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tiff", "tif", "webp"];

/// What kind of source a path refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// A paged document, rendered and sliced page by page.
    Pdf,
    /// A single raster image, recognized in one engine call.
    Image,
}

/// Classify a path by extension alone, without touching the filesystem.
///
/// Returns `None` for unsupported extensions (including none at all).
pub fn source_kind(path: &Path) -> Option<SourceKind> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    if ext == "pdf" {
        Some(SourceKind::Pdf)
    } else if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        Some(SourceKind::Image)
    } else {
        None
    }
}

/// Whether a path has a supported extension. Used by the batch driver to
/// collect work from a directory.
pub fn is_supported(path: &Path) -> bool {
    source_kind(path).is_some()
}

/// Validate a source path and return its kind.
///
/// Checks existence and readability; for PDFs, also verifies the `%PDF`
/// magic bytes so corrupt downloads fail fast.
pub fn resolve_source(path: &Path) -> Result<SourceKind, Ocr2TextError> {
    let kind = source_kind(path).ok_or_else(|| Ocr2TextError::UnsupportedFormat {
        path: path.to_path_buf(),
        extension: path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default(),
    })?;

    if !path.exists() {
        return Err(Ocr2TextError::SourceNotFound {
            path: path.to_path_buf(),
        });
    }

    // Check read permission by attempting to open
    match std::fs::File::open(path) {
        Ok(mut f) => {
            if kind == SourceKind::Pdf {
                use std::io::Read;
                let mut magic = [0u8; 4];
                if f.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
                    return Err(Ocr2TextError::NotAPdf {
                        path: path.to_path_buf(),
                        magic,
                    });
                }
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(Ocr2TextError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(_) => {
            return Err(Ocr2TextError::SourceNotFound {
                path: path.to_path_buf(),
            });
        }
    }

    Ok(kind)
}
