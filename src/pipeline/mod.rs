//! Pipeline stages for document recognition.
//!
//! Each submodule implements exactly one transformation step. Keeping
//! stages separate makes each independently testable and lets us swap
//! implementations (e.g. switch the rendering backend) without touching
//! other stages.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ engine ──▶ filter
//! (path)    (pdfium    (tesseract  (garbled-line
//!            + slices)  subprocess)  removal)
//! ```
//!
//! 1. [`input`]  — classify and validate the source path (PDF vs. image,
//!    existence, magic bytes)
//! 2. [`render`] — rasterise a page at the configured magnification and
//!    compute the overlapping slice plan
//! 3. engine     — recognition lives in [`crate::engine`]; it is a document
//!    collaborator rather than a per-document stage, so it sits outside this
//!    module tree
//! 4. [`filter`] — drop recognition lines that are statistically garbage
//!
//! The normalization stage ([`crate::clean`]) is deliberately not wired in
//! here: it consumes persisted OCR text, communicates with this pipeline
//! only through plain text, and is independently replaceable.

pub mod filter;
pub mod input;
pub mod render;
