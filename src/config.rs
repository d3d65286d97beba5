//! Configuration types for the slicing/OCR stage and the text normalizer.
//!
//! All recognition behaviour is controlled through [`RecognizeConfig`], built
//! via its [`RecognizeConfigBuilder`]. Keeping every knob in one struct makes
//! it trivial to share configs across batch workers, serialise them for
//! logging, and diff two runs to understand why their outputs differ.
//!
//! The filter and normalizer thresholds are fixed policy, not learned
//! parameters; they live in named fields ([`FilterConfig`], [`CleanConfig`])
//! rather than inline literals so policy stays testable and tunable
//! independently of the algorithms.

use crate::engine::RecognitionEngine;
use crate::error::Ocr2TextError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Configuration for document recognition.
///
/// Built via [`RecognizeConfig::builder()`] or using
/// [`RecognizeConfig::default()`].
///
/// # Example
/// ```rust
/// use ocr2text::RecognizeConfig;
///
/// let config = RecognizeConfig::builder()
///     .slice_height(1200.0)
///     .magnification(2.0)
///     .preferred_languages(["jpn"])
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct RecognizeConfig {
    /// Height of one page slice in logical page units (PDF points).
    /// Default: 1500.0.
    ///
    /// Scanned long-scroll pages can be tens of thousands of points tall;
    /// feeding the engine the whole page at once degrades recognition and
    /// blows up bitmap sizes. 1500 points at 3× magnification keeps each
    /// tile around 4500 px tall, comfortably inside Tesseract's sweet spot.
    pub slice_height: f32,

    /// Vertical overlap between consecutive slices, in logical units.
    /// Default: 100.0.
    ///
    /// Without overlap a glyph straddling a slice boundary is cut in half
    /// and misread in both tiles. 100 points covers several text lines at
    /// typical scan resolutions. Must be smaller than `slice_height`.
    pub slice_overlap: f32,

    /// Upscaling factor applied when rasterising a page region. Default: 3.0.
    ///
    /// Scanned PDFs often embed low-resolution images; rendering at 3× gives
    /// the engine enough pixels per glyph to recognise CJK strokes reliably.
    pub magnification: f32,

    /// Language packs to prefer, in order. Default: `["chi_sim"]`.
    ///
    /// The first pack that is actually installed is combined with
    /// [`latin_fallback`](Self::latin_fallback) (e.g. `chi_sim+eng`); if none
    /// is installed the engine runs Latin-only. Resolved once per document,
    /// not per tile.
    pub preferred_languages: Vec<String>,

    /// Latin pack appended to the selected primary pack, and the fallback
    /// when no preferred pack is installed. Default: `"eng"`.
    pub latin_fallback: String,

    /// Tesseract page-segmentation mode. Default: 6 (single uniform block).
    ///
    /// Tiles are uniform horizontal bands of running text; automatic layout
    /// segmentation (PSM 3) fragments them and hurts CJK accuracy.
    pub page_segmentation_mode: u32,

    /// Garbled-line filter thresholds applied to every recognition result.
    pub filter: FilterConfig,

    /// Pre-constructed recognition engine. If `None`, a
    /// [`TesseractEngine`](crate::engine::TesseractEngine) is created from
    /// the environment. Injecting an engine is the seam used by tests and by
    /// callers wrapping the engine with caching or rate limiting.
    pub engine: Option<Arc<dyn RecognitionEngine>>,

    /// Progress callback receiving per-page events. Default: `None`.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for RecognizeConfig {
    fn default() -> Self {
        Self {
            slice_height: 1500.0,
            slice_overlap: 100.0,
            magnification: 3.0,
            preferred_languages: vec!["chi_sim".to_string()],
            latin_fallback: "eng".to_string(),
            page_segmentation_mode: 6,
            filter: FilterConfig::default(),
            engine: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for RecognizeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecognizeConfig")
            .field("slice_height", &self.slice_height)
            .field("slice_overlap", &self.slice_overlap)
            .field("magnification", &self.magnification)
            .field("preferred_languages", &self.preferred_languages)
            .field("latin_fallback", &self.latin_fallback)
            .field("page_segmentation_mode", &self.page_segmentation_mode)
            .field("filter", &self.filter)
            .field(
                "engine",
                &self.engine.as_ref().map(|_| "<dyn RecognitionEngine>"),
            )
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl RecognizeConfig {
    /// Create a new builder for `RecognizeConfig`.
    pub fn builder() -> RecognizeConfigBuilder {
        RecognizeConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`RecognizeConfig`].
pub struct RecognizeConfigBuilder {
    config: RecognizeConfig,
}

impl RecognizeConfigBuilder {
    pub fn slice_height(mut self, h: f32) -> Self {
        self.config.slice_height = h;
        self
    }

    pub fn slice_overlap(mut self, o: f32) -> Self {
        self.config.slice_overlap = o.max(0.0);
        self
    }

    pub fn magnification(mut self, m: f32) -> Self {
        self.config.magnification = m;
        self
    }

    pub fn preferred_languages<I, S>(mut self, langs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.preferred_languages = langs.into_iter().map(Into::into).collect();
        self
    }

    pub fn latin_fallback(mut self, lang: impl Into<String>) -> Self {
        self.config.latin_fallback = lang.into();
        self
    }

    pub fn page_segmentation_mode(mut self, psm: u32) -> Self {
        self.config.page_segmentation_mode = psm;
        self
    }

    pub fn filter(mut self, filter: FilterConfig) -> Self {
        self.config.filter = filter;
        self
    }

    pub fn engine(mut self, engine: Arc<dyn RecognitionEngine>) -> Self {
        self.config.engine = Some(engine);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<RecognizeConfig, Ocr2TextError> {
        let c = &self.config;
        if !(c.slice_height > 0.0) {
            return Err(Ocr2TextError::InvalidConfig(format!(
                "slice_height must be positive, got {}",
                c.slice_height
            )));
        }
        if c.slice_overlap >= c.slice_height {
            return Err(Ocr2TextError::InvalidConfig(format!(
                "slice_overlap ({}) must be smaller than slice_height ({}) or slicing never advances",
                c.slice_overlap, c.slice_height
            )));
        }
        if !(c.magnification > 0.0) {
            return Err(Ocr2TextError::InvalidConfig(format!(
                "magnification must be positive, got {}",
                c.magnification
            )));
        }
        if c.latin_fallback.is_empty() {
            return Err(Ocr2TextError::InvalidConfig(
                "latin_fallback must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

/// Thresholds for the garbled-line filter.
///
/// See [`crate::pipeline::filter`] for the algorithm. These are heuristic
/// policy values, not learned parameters; the defaults come from manual
/// tuning against noisy CJK scans.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Minimum fraction of a line's characters that must belong to the
    /// allow-set (script characters, Latin, digits, whitespace, common
    /// punctuation) for the line to be kept. Default: 0.4.
    pub min_allowed_ratio: f32,

    /// A line containing a run of this many consecutive noise symbols is
    /// dropped regardless of its overall ratio. Default: 10.
    pub max_noise_run: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_allowed_ratio: 0.4,
            max_noise_run: 10,
        }
    }
}

/// Thresholds for sentence and paragraph segmentation in the normalizer.
///
/// All lengths are **character** counts, matching how the thresholds were
/// tuned on CJK text (byte counts would triple every limit).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CleanConfig {
    /// A paragraph buffer stops accepting sentences once appending the next
    /// one would reach this length. Default: 500.
    pub max_paragraph_chars: usize,

    /// Paragraph buffers shorter than this are discarded rather than
    /// emitted. Default: 50.
    pub min_paragraph_chars: usize,

    /// Sentence fragments with trimmed length at or below this are
    /// discarded. Default: 5.
    pub min_sentence_chars: usize,
}

impl Default for CleanConfig {
    fn default() -> Self {
        Self {
            max_paragraph_chars: 500,
            min_paragraph_chars: 50,
            min_sentence_chars: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = RecognizeConfig::builder().build().unwrap();
        assert_eq!(config.slice_height, 1500.0);
        assert_eq!(config.slice_overlap, 100.0);
        assert_eq!(config.magnification, 3.0);
        assert_eq!(config.preferred_languages, vec!["chi_sim".to_string()]);
        assert_eq!(config.latin_fallback, "eng");
        assert_eq!(config.page_segmentation_mode, 6);
    }

    #[test]
    fn overlap_must_be_smaller_than_slice_height() {
        let err = RecognizeConfig::builder()
            .slice_height(100.0)
            .slice_overlap(100.0)
            .build()
            .unwrap_err();
        assert!(matches!(err, Ocr2TextError::InvalidConfig(_)));
    }

    #[test]
    fn magnification_must_be_positive() {
        let err = RecognizeConfig::builder()
            .magnification(0.0)
            .build()
            .unwrap_err();
        assert!(matches!(err, Ocr2TextError::InvalidConfig(_)));
    }

    #[test]
    fn negative_overlap_is_clamped() {
        let config = RecognizeConfig::builder()
            .slice_overlap(-50.0)
            .build()
            .unwrap();
        assert_eq!(config.slice_overlap, 0.0);
    }

    #[test]
    fn debug_elides_engine() {
        let config = RecognizeConfig::default();
        let dbg = format!("{config:?}");
        assert!(dbg.contains("slice_height"));
        assert!(!dbg.contains("Tesseract"));
    }

    #[test]
    fn filter_defaults() {
        let f = FilterConfig::default();
        assert_eq!(f.min_allowed_ratio, 0.4);
        assert_eq!(f.max_noise_run, 10);
    }

    #[test]
    fn clean_defaults() {
        let c = CleanConfig::default();
        assert_eq!(c.max_paragraph_chars, 500);
        assert_eq!(c.min_paragraph_chars, 50);
        assert_eq!(c.min_sentence_chars, 5);
    }
}
