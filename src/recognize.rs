//! Document recognition entry points.
//!
//! [`recognize`] turns one source file (PDF or raster image) into raw
//! extracted text; [`recognize_to_file`] additionally persists it. The
//! normalization stage ([`crate::clean`]) consumes that text separately —
//! the two stages communicate only through plain UTF-8.
//!
//! ## Processing model
//!
//! Synchronous and strictly ordered: pages top to bottom, tiles top to
//! bottom within a page, because the downstream text concatenation is
//! order-dependent. There is no parallelism inside one document; batch
//! callers are free to process *different* documents on independent worker
//! threads, which is safe because every tile gets its own scratch file and
//! no state is shared between documents.
//!
//! ## Failure model
//!
//! A failed tile is logged, tallied, and contributes empty text; the
//! document continues. A failed page render or an unopenable document is
//! fatal for that document (but batch drivers tally and move on).

use crate::config::RecognizeConfig;
use crate::engine::{select_language, RecognitionEngine, TesseractEngine};
use crate::error::{Ocr2TextError, TileError};
use crate::output::{PageText, RecognitionOutput, RecognitionStats};
use crate::pipeline::{filter, input, render};
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Extract text from a source document.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `source` — path to a PDF or a supported raster image
/// * `config` — recognition configuration
///
/// # Returns
/// `Ok(RecognitionOutput)` on success, even if some tiles failed
/// (check `output.stats.failed_tiles`).
///
/// # Errors
/// Returns `Err(Ocr2TextError)` only for fatal conditions: missing or
/// unsupported source, corrupt PDF, page render failure, or an engine that
/// cannot be queried at all.
pub fn recognize(
    source: impl AsRef<Path>,
    config: &RecognizeConfig,
) -> Result<RecognitionOutput, Ocr2TextError> {
    let total_start = Instant::now();
    let source = source.as_ref();
    info!("Starting recognition: {}", source.display());

    // ── Step 1: Resolve the source ───────────────────────────────────────
    let kind = input::resolve_source(source)?;

    // ── Step 2: Resolve the engine and the language profile ──────────────
    let engine = resolve_engine(config);
    let installed = engine.installed_languages()?;
    let language = select_language(
        &installed,
        &config.preferred_languages,
        &config.latin_fallback,
    );
    if language == config.latin_fallback {
        warn!(
            "No preferred language pack installed ({:?}); recognizing with '{}' only",
            config.preferred_languages, language
        );
    } else {
        info!("Using language profile: {}", language);
    }

    // ── Step 3: Recognize ────────────────────────────────────────────────
    let mut output = match kind {
        input::SourceKind::Image => recognize_image(source, config, engine.as_ref(), &language)?,
        input::SourceKind::Pdf => recognize_pdf(source, config, engine.as_ref(), &language)?,
    };

    output.stats.total_duration_ms = total_start.elapsed().as_millis() as u64;
    info!(
        "Recognition complete: {} pages, {} chars, {}ms total",
        output.stats.total_pages, output.stats.total_chars, output.stats.total_duration_ms
    );
    Ok(output)
}

/// Recognize a source document and write the text to `output_path`.
///
/// Uses an atomic write (temp file + rename) to prevent partial files.
pub fn recognize_to_file(
    source: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &RecognizeConfig,
) -> Result<RecognitionStats, Ocr2TextError> {
    let output = recognize(source, config)?;
    let path = output_path.as_ref();
    write_text_atomically(path, &output.text)?;
    info!("Wrote {} chars to {}", output.stats.total_chars, path.display());
    Ok(output.stats)
}

/// Default output path for a source: same location, `.txt` extension.
pub fn default_output_path(source: &Path) -> PathBuf {
    source.with_extension("txt")
}

/// Write UTF-8 text via a sibling temp file and rename.
pub(crate) fn write_text_atomically(path: &Path, text: &str) -> Result<(), Ocr2TextError> {
    let map_err = |source: std::io::Error| Ocr2TextError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(map_err)?;
    }

    let tmp_path = path.with_extension("txt.tmp");
    std::fs::write(&tmp_path, text).map_err(map_err)?;
    std::fs::rename(&tmp_path, path).map_err(map_err)
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Resolve the recognition engine, most-specific first: an injected engine
/// wins; otherwise Tesseract is located via `OCR2TEXT_TESSERACT` or `PATH`.
fn resolve_engine(config: &RecognizeConfig) -> Arc<dyn RecognitionEngine> {
    if let Some(ref engine) = config.engine {
        return Arc::clone(engine);
    }
    Arc::new(TesseractEngine::from_env(config.page_segmentation_mode))
}

/// Single-image source: one engine call on the file itself, no rendering,
/// no scratch artifact.
fn recognize_image(
    path: &Path,
    config: &RecognizeConfig,
    engine: &dyn RecognitionEngine,
    language: &str,
) -> Result<RecognitionOutput, Ocr2TextError> {
    let page_start = Instant::now();
    if let Some(ref cb) = config.progress_callback {
        cb.on_document_start(1);
        cb.on_page_start(1, 1);
    }

    let raw = engine.recognize(path, language)?;
    let ocr_duration_ms = page_start.elapsed().as_millis() as u64;
    let text = filter::filter_garbled(&raw, &config.filter).trim().to_string();
    let chars = text.chars().count();

    if let Some(ref cb) = config.progress_callback {
        cb.on_tile_complete(1, 1, chars);
        cb.on_page_complete(1, 1, chars);
        cb.on_document_complete(1, 0);
    }

    let page = PageText {
        page_num: 1,
        text: text.clone(),
        tile_count: 1,
        failed_tiles: vec![],
        duration_ms: page_start.elapsed().as_millis() as u64,
    };

    Ok(RecognitionOutput {
        stats: RecognitionStats {
            total_pages: 1,
            total_tiles: 1,
            failed_tiles: 0,
            total_chars: chars,
            render_duration_ms: 0,
            ocr_duration_ms,
            total_duration_ms: 0,
        },
        text,
        pages: vec![page],
        language: language.to_string(),
    })
}

/// Paged source: slice every page into overlapping bands, recognize each
/// band from a scratch PNG, and merge the filtered results.
fn recognize_pdf(
    path: &Path,
    config: &RecognizeConfig,
    engine: &dyn RecognitionEngine,
    language: &str,
) -> Result<RecognitionOutput, Ocr2TextError> {
    let pdfium = Pdfium::default();
    let document = render::open_pdf(&pdfium, path)?;
    let pages = document.pages();
    let total_pages = pages.len() as usize;
    info!("PDF loaded: {} pages", total_pages);

    if let Some(ref cb) = config.progress_callback {
        cb.on_document_start(total_pages);
    }

    let mut page_results: Vec<PageText> = Vec::with_capacity(total_pages);
    let mut render_duration_ms = 0u64;
    let mut ocr_duration_ms = 0u64;

    for (idx, page) in pages.iter().enumerate() {
        let page_num = idx + 1;
        let page_start = Instant::now();
        if let Some(ref cb) = config.progress_callback {
            cb.on_page_start(page_num, total_pages);
        }

        let page_height = page.height().value;
        let ranges = render::slice_ranges(page_height, config.slice_height, config.slice_overlap);
        debug!(
            "Page {}: {} pt tall, {} tiles",
            page_num,
            page_height,
            ranges.len()
        );

        let mut tile_texts: Vec<String> = Vec::new();
        let mut failed_tiles: Vec<TileError> = Vec::new();

        if !ranges.is_empty() {
            let render_start = Instant::now();
            let page_image = render::render_page(&page, page_num, config.magnification)?;
            render_duration_ms += render_start.elapsed().as_millis() as u64;

            for (tile_idx, &range) in ranges.iter().enumerate() {
                let tile_num = tile_idx + 1;
                let tile = render::crop_tile(&page_image, range, config.magnification);
                debug!(
                    "Page {} tile {}: y={:.0}..{:.0} → {}x{} px",
                    page_num,
                    tile_num,
                    range.0,
                    range.1,
                    tile.width(),
                    tile.height()
                );

                let ocr_start = Instant::now();
                let result = recognize_tile(&tile, engine, language);
                ocr_duration_ms += ocr_start.elapsed().as_millis() as u64;

                let chars = match result {
                    Ok(raw) => {
                        let text =
                            filter::filter_garbled(&raw, &config.filter).trim().to_string();
                        let chars = text.chars().count();
                        if !text.is_empty() {
                            tile_texts.push(text);
                        }
                        chars
                    }
                    Err(err) => {
                        let tile_error = err.into_tile_error(page_num, tile_num);
                        warn!("{}", tile_error);
                        failed_tiles.push(tile_error);
                        0
                    }
                };

                if let Some(ref cb) = config.progress_callback {
                    cb.on_tile_complete(page_num, tile_num, chars);
                }
            }
        }

        let text = tile_texts.join("\n\n");
        let chars = text.chars().count();
        if let Some(ref cb) = config.progress_callback {
            cb.on_page_complete(page_num, total_pages, chars);
        }

        page_results.push(PageText {
            page_num,
            text,
            tile_count: ranges.len(),
            failed_tiles,
            duration_ms: page_start.elapsed().as_millis() as u64,
        });
    }

    let text = page_results
        .iter()
        .map(|p| p.text.as_str())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");

    let stats = RecognitionStats {
        total_pages,
        total_tiles: page_results.iter().map(|p| p.tile_count).sum(),
        failed_tiles: page_results.iter().map(|p| p.failed_tiles.len()).sum(),
        total_chars: text.chars().count(),
        render_duration_ms,
        ocr_duration_ms,
        total_duration_ms: 0,
    };

    if let Some(ref cb) = config.progress_callback {
        cb.on_document_complete(total_pages, stats.failed_tiles);
    }

    Ok(RecognitionOutput {
        text,
        pages: page_results,
        language: language.to_string(),
        stats,
    })
}

/// What went wrong with one tile, before page/tile numbers are attached.
#[derive(Debug)]
enum TileFailure {
    Scratch(String),
    Engine(String),
}

impl TileFailure {
    fn into_tile_error(self, page: usize, tile: usize) -> TileError {
        match self {
            TileFailure::Scratch(detail) => TileError::ScratchFailed { page, tile, detail },
            TileFailure::Engine(detail) => TileError::EngineFailed { page, tile, detail },
        }
    }
}

/// Run one tile through the engine via a scratch PNG.
///
/// The scratch file is a `NamedTempFile`: uniquely named (no collisions
/// across concurrent batch workers) and removed on drop on every exit path,
/// including engine failure.
fn recognize_tile(
    tile: &DynamicImage,
    engine: &dyn RecognitionEngine,
    language: &str,
) -> Result<String, TileFailure> {
    let mut scratch = tempfile::Builder::new()
        .prefix("ocr2text-tile-")
        .suffix(".png")
        .tempfile()
        .map_err(|e| TileFailure::Scratch(e.to_string()))?;

    tile.write_to(&mut scratch, image::ImageFormat::Png)
        .map_err(|e| TileFailure::Scratch(e.to_string()))?;
    scratch.flush().ok();

    engine
        .recognize(scratch.path(), language)
        .map_err(|e| TileFailure::Engine(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::sync::Mutex;

    /// Engine returning scripted responses in call order; never spawns a
    /// subprocess.
    struct ScriptedEngine {
        installed: BTreeSet<String>,
        responses: Mutex<Vec<Result<String, String>>>,
        seen_languages: Mutex<Vec<String>>,
    }

    impl ScriptedEngine {
        fn new<I: IntoIterator<Item = &'static str>>(
            installed: I,
            responses: Vec<Result<String, String>>,
        ) -> Self {
            Self {
                installed: installed.into_iter().map(String::from).collect(),
                responses: Mutex::new(responses),
                seen_languages: Mutex::new(Vec::new()),
            }
        }
    }

    impl RecognitionEngine for ScriptedEngine {
        fn installed_languages(&self) -> Result<BTreeSet<String>, Ocr2TextError> {
            Ok(self.installed.clone())
        }

        fn recognize(&self, image: &Path, language: &str) -> Result<String, Ocr2TextError> {
            self.seen_languages.lock().unwrap().push(language.to_string());
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                return Ok(String::new());
            }
            responses.remove(0).map_err(|detail| {
                Ocr2TextError::RecognitionFailed {
                    path: image.to_path_buf(),
                    detail,
                }
            })
        }
    }

    fn image_fixture(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("scan.png");
        // The scripted engine never decodes it; only existence matters.
        std::fs::write(&path, b"\x89PNG\r\n\x1a\n").unwrap();
        path
    }

    fn config_with_engine(engine: Arc<dyn RecognitionEngine>) -> RecognizeConfig {
        RecognizeConfig::builder().engine(engine).build().unwrap()
    }

    #[test]
    fn image_source_single_call_filtered_and_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        let path = image_fixture(&dir);
        let engine = Arc::new(ScriptedEngine::new(
            ["chi_sim", "eng"],
            vec![Ok("  今天的新闻内容如下\n@@@@@@@@@@@@\n".to_string())],
        ));
        let config = config_with_engine(engine.clone());

        let output = recognize(&path, &config).unwrap();
        assert_eq!(output.text, "今天的新闻内容如下");
        assert_eq!(output.language, "chi_sim+eng");
        assert_eq!(output.stats.total_pages, 1);
        assert_eq!(output.stats.total_tiles, 1);
        assert_eq!(output.stats.failed_tiles, 0);
        assert_eq!(
            output.stats.total_chars,
            "今天的新闻内容如下".chars().count()
        );
        assert_eq!(
            engine.seen_languages.lock().unwrap().as_slice(),
            &["chi_sim+eng".to_string()]
        );
    }

    #[test]
    fn image_source_without_cjk_pack_uses_latin_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = image_fixture(&dir);
        let engine = Arc::new(ScriptedEngine::new(
            ["eng"],
            vec![Ok("plain english".to_string())],
        ));
        let config = config_with_engine(engine.clone());

        let output = recognize(&path, &config).unwrap();
        assert_eq!(output.language, "eng");
        assert_eq!(
            engine.seen_languages.lock().unwrap().as_slice(),
            &["eng".to_string()]
        );
    }

    #[test]
    fn image_engine_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = image_fixture(&dir);
        let engine = Arc::new(ScriptedEngine::new(
            ["eng"],
            vec![Err("engine crashed".to_string())],
        ));
        let config = config_with_engine(engine);

        let err = recognize(&path, &config).unwrap_err();
        assert!(matches!(err, Ocr2TextError::RecognitionFailed { .. }));
    }

    #[test]
    fn missing_source_is_reported() {
        let config = RecognizeConfig::default();
        let err = recognize("/nonexistent/scan.png", &config).unwrap_err();
        assert!(matches!(err, Ocr2TextError::SourceNotFound { .. }));
    }

    #[test]
    fn recognize_to_file_writes_utf8(){
        let dir = tempfile::tempdir().unwrap();
        let path = image_fixture(&dir);
        let out = dir.path().join("scan.txt");
        let engine = Arc::new(ScriptedEngine::new(
            ["chi_sim", "eng"],
            vec![Ok("识别结果文本".to_string())],
        ));
        let config = config_with_engine(engine);

        let stats = recognize_to_file(&path, &out, &config).unwrap();
        assert_eq!(stats.total_pages, 1);
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "识别结果文本");
        // No stray temp file left behind.
        assert!(!dir.path().join("scan.txt.tmp").exists());
    }

    #[test]
    fn default_output_swaps_extension() {
        assert_eq!(
            default_output_path(Path::new("/data/report.pdf")),
            PathBuf::from("/data/report.txt")
        );
        assert_eq!(
            default_output_path(Path::new("scan.jpeg")),
            PathBuf::from("scan.txt")
        );
    }

    #[test]
    fn recognize_tile_cleans_up_scratch_on_engine_failure() {
        let tile = DynamicImage::new_rgba8(20, 20);
        let engine = ScriptedEngine::new(["eng"], vec![Err("boom".to_string())]);

        // Capture the scratch path the engine saw, then verify it is gone.
        struct PathCapturingEngine {
            inner: ScriptedEngine,
            seen_path: Mutex<Option<PathBuf>>,
        }
        impl RecognitionEngine for PathCapturingEngine {
            fn installed_languages(&self) -> Result<BTreeSet<String>, Ocr2TextError> {
                self.inner.installed_languages()
            }
            fn recognize(&self, image: &Path, language: &str) -> Result<String, Ocr2TextError> {
                *self.seen_path.lock().unwrap() = Some(image.to_path_buf());
                self.inner.recognize(image, language)
            }
        }

        let capturing = PathCapturingEngine {
            inner: engine,
            seen_path: Mutex::new(None),
        };

        let result = recognize_tile(&tile, &capturing, "eng");
        assert!(matches!(result, Err(TileFailure::Engine(_))));

        let scratch = capturing.seen_path.lock().unwrap().clone().unwrap();
        assert!(
            !scratch.exists(),
            "scratch file must be removed after engine failure: {scratch:?}"
        );
    }

    #[test]
    fn recognize_tile_scratch_is_a_decodable_png() {
        let tile = DynamicImage::new_rgba8(12, 34);

        struct DecodingEngine;
        impl RecognitionEngine for DecodingEngine {
            fn installed_languages(&self) -> Result<BTreeSet<String>, Ocr2TextError> {
                Ok(BTreeSet::new())
            }
            fn recognize(&self, image: &Path, _language: &str) -> Result<String, Ocr2TextError> {
                let decoded = image::open(image).map_err(|e| Ocr2TextError::Internal(e.to_string()))?;
                Ok(format!("{}x{}", decoded.width(), decoded.height()))
            }
        }

        let result = recognize_tile(&tile, &DecodingEngine, "eng").unwrap();
        assert_eq!(result, "12x34");
    }
}
