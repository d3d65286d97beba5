//! Recognition engine: the narrow seam between this crate and Tesseract.
//!
//! The pipeline never links against an OCR library. It talks to an external
//! engine through [`RecognitionEngine`], a two-method trait mirroring exactly
//! what the pipeline needs: "which language packs are installed" and
//! "recognize this bitmap". [`TesseractEngine`] implements it by spawning the
//! `tesseract` binary; tests implement it with scripted responses and never
//! touch a subprocess.
//!
//! ## Language selection
//!
//! CJK packs are optional Tesseract add-ons, so the caller's preference may
//! not be installed. [`select_language`] encodes the policy: the first
//! preferred pack that is installed is combined with the Latin pack
//! (`chi_sim+eng`), otherwise the engine runs Latin-only. The installed set
//! is queried **once per document** and the resolved profile is threaded
//! through the slicing loop — installed packs do not change mid-run, and a
//! per-tile re-query would only add subprocess round-trips.

use crate::error::Ocr2TextError;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Environment variable overriding the Tesseract binary path.
pub const TESSERACT_BIN_ENV: &str = "OCR2TEXT_TESSERACT";

/// An external character-recognition engine.
///
/// Implementations must be `Send + Sync`: a batch driver may process files
/// on independent worker threads sharing one engine handle.
pub trait RecognitionEngine: Send + Sync {
    /// The set of installed language packs (e.g. `{"chi_sim", "eng", "osd"}`).
    ///
    /// Assumed stable for the duration of a document; callers query once and
    /// cache.
    fn installed_languages(&self) -> Result<BTreeSet<String>, Ocr2TextError>;

    /// Recognize the bitmap at `image` using `language`, returning raw text.
    ///
    /// `language` is an engine profile string such as `"chi_sim+eng"`.
    fn recognize(&self, image: &Path, language: &str) -> Result<String, Ocr2TextError>;
}

/// Drives the `tesseract` CLI as a subprocess.
///
/// Every call requests a single uniform text block (PSM 6 by default): tiles
/// are uniform horizontal bands, and automatic layout segmentation fragments
/// them.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    binary: PathBuf,
    page_segmentation_mode: u32,
}

impl TesseractEngine {
    /// Engine using the given binary path and page-segmentation mode.
    pub fn new(binary: impl Into<PathBuf>, page_segmentation_mode: u32) -> Self {
        Self {
            binary: binary.into(),
            page_segmentation_mode,
        }
    }

    /// Engine resolved from the environment: `OCR2TEXT_TESSERACT` if set,
    /// else `tesseract` on `PATH`.
    pub fn from_env(page_segmentation_mode: u32) -> Self {
        let binary = std::env::var_os(TESSERACT_BIN_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("tesseract"));
        Self::new(binary, page_segmentation_mode)
    }
}

impl RecognitionEngine for TesseractEngine {
    fn installed_languages(&self) -> Result<BTreeSet<String>, Ocr2TextError> {
        let output = Command::new(&self.binary)
            .arg("--list-langs")
            .output()
            .map_err(|e| Ocr2TextError::EngineUnavailable {
                detail: format!("failed to run {:?} --list-langs: {e}", self.binary),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Ocr2TextError::EngineUnavailable {
                detail: format!("--list-langs failed: {}", stderr.trim()),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let langs = parse_list_langs(&stdout);
        debug!("Installed language packs: {:?}", langs);
        Ok(langs)
    }

    fn recognize(&self, image: &Path, language: &str) -> Result<String, Ocr2TextError> {
        let output = Command::new(&self.binary)
            .arg(image)
            .arg("stdout")
            .arg("-l")
            .arg(language)
            .arg("--psm")
            .arg(self.page_segmentation_mode.to_string())
            .output()
            .map_err(|e| Ocr2TextError::EngineUnavailable {
                detail: format!("failed to run {:?}: {e}", self.binary),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Ocr2TextError::RecognitionFailed {
                path: image.to_path_buf(),
                detail: format!("{} ({})", stderr.trim(), output.status),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Parse `tesseract --list-langs` output into the set of pack names.
///
/// The first line is a banner (`List of available languages in ... (N):`);
/// every following non-blank line is a pack name.
pub fn parse_list_langs(stdout: &str) -> BTreeSet<String> {
    stdout
        .lines()
        .skip(1)
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Resolve the language profile for a document.
///
/// The first entry of `preferred` that is installed wins and is combined
/// with `latin` (`"{pack}+{latin}"`); with no preferred pack installed the
/// profile is `latin` alone.
pub fn select_language(installed: &BTreeSet<String>, preferred: &[String], latin: &str) -> String {
    for pack in preferred {
        if installed.contains(pack) {
            return format!("{pack}+{latin}");
        }
    }
    latin.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_list_langs_skips_banner_and_blanks() {
        let stdout = "List of available languages in /usr/share/tessdata/ (3):\n\
                      chi_sim\n\
                      eng\n\
                      \n\
                      osd\n";
        let langs = parse_list_langs(stdout);
        assert_eq!(
            langs,
            ["chi_sim", "eng", "osd"]
                .iter()
                .map(|s| s.to_string())
                .collect()
        );
    }

    #[test]
    fn parse_list_langs_empty_output() {
        assert!(parse_list_langs("").is_empty());
        assert!(parse_list_langs("banner only\n").is_empty());
    }

    fn installed(packs: &[&str]) -> BTreeSet<String> {
        packs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn select_language_prefers_installed_pack() {
        let langs = installed(&["chi_sim", "eng", "osd"]);
        assert_eq!(
            select_language(&langs, &["chi_sim".into()], "eng"),
            "chi_sim+eng"
        );
    }

    #[test]
    fn select_language_falls_back_to_latin() {
        let langs = installed(&["eng", "osd"]);
        assert_eq!(select_language(&langs, &["chi_sim".into()], "eng"), "eng");
    }

    #[test]
    fn select_language_respects_preference_order() {
        let langs = installed(&["chi_tra", "chi_sim", "eng"]);
        let preferred = vec!["chi_tra".to_string(), "chi_sim".to_string()];
        assert_eq!(select_language(&langs, &preferred, "eng"), "chi_tra+eng");
    }

    #[test]
    fn select_language_skips_missing_preferences() {
        let langs = installed(&["jpn", "eng"]);
        let preferred = vec!["chi_sim".to_string(), "jpn".to_string()];
        assert_eq!(select_language(&langs, &preferred, "eng"), "jpn+eng");
    }

    #[test]
    fn from_env_defaults_to_path_lookup() {
        // Not setting the env var here; just assert the default binary name.
        let engine = TesseractEngine::new("tesseract", 6);
        assert_eq!(engine.binary, PathBuf::from("tesseract"));
    }
}
