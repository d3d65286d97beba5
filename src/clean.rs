//! Text normalization: raw OCR output → clean, paragraph-segmented text.
//!
//! ## Why strip *all* whitespace?
//!
//! OCR of vertically-set or wide-script (CJK) text over-inserts spaces
//! between characters — inter-character spacing carries no semantic value in
//! those scripts, and line breaks inside a tile are rendering artefacts, not
//! sentence boundaries. Removing every whitespace character and re-deriving
//! structure from terminal punctuation produces far more readable output
//! than trying to repair the original spacing.
//!
//! ## Pass order
//!
//! Whitespace removal runs before punctuation mapping, which makes
//! [`normalize`] idempotent: once the half-width marks are mapped away they
//! no longer occur, so a second pass is a no-op. Each operation is a pure
//! `&str → _` function with no shared state, in the same spirit as the
//! deterministic cleanup rules of the OCR stage's garbled filter.

use crate::config::CleanConfig;
use crate::error::Ocr2TextError;
use crate::output::{CleanResult, CleanStats, FileMetadata};
use crate::recognize::write_text_atomically;
use std::path::{Path, PathBuf};
use tracing::info;

/// Normalize raw OCR text: strip every whitespace character, then map
/// half-width punctuation to its full-width equivalent.
///
/// Pure, deterministic, and idempotent: `normalize(normalize(x)) ==
/// normalize(x)`, and the result never contains whitespace.
pub fn normalize(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c {
            ',' => '，',
            '.' => '。',
            '!' => '！',
            '?' => '？',
            ':' => '：',
            ';' => '；',
            '(' => '（',
            ')' => '）',
            other => other,
        })
        .collect()
}

/// Split normalized text into sentence units.
///
/// Splits on the four canonical terminal marks (`。 ！ ？ ；`); fragments
/// with trimmed character length at or below
/// [`CleanConfig::min_sentence_chars`] are discarded.
pub fn split_sentences(text: &str, config: &CleanConfig) -> Vec<String> {
    text.split(['。', '！', '？', '；'])
        .map(str::trim)
        .filter(|s| s.chars().count() > config.min_sentence_chars)
        .map(str::to_string)
        .collect()
}

/// Split normalized text into paragraphs.
///
/// Sentences are greedily packed (each re-terminated with `。`) while the
/// buffer stays under [`CleanConfig::max_paragraph_chars`]; a full buffer is
/// emitted only if it reached [`CleanConfig::min_paragraph_chars`] —
/// an under-length buffer is dropped, not merged forward, so short
/// fragments between long runs are lost. The final buffer is flushed under
/// the same gate. All lengths are character counts.
pub fn split_paragraphs(text: &str, config: &CleanConfig) -> Vec<String> {
    let sentences = split_sentences(text, config);

    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0usize;

    for sentence in sentences {
        let sentence_chars = sentence.chars().count();
        if current_chars + sentence_chars < config.max_paragraph_chars {
            current.push_str(&sentence);
            current.push('。');
            current_chars += sentence_chars + 1;
        } else {
            if current_chars >= config.min_paragraph_chars {
                paragraphs.push(std::mem::take(&mut current));
            } else {
                current.clear();
            }
            current.push_str(&sentence);
            current.push('。');
            current_chars = sentence_chars + 1;
        }
    }

    if current_chars >= config.min_paragraph_chars {
        paragraphs.push(current);
    }

    paragraphs
}

/// Parse metadata out of the underscore-delimited filename convention
/// (`Title_YYYYMMDDhhmmss_page_info.ext`).
///
/// Field 0 is the title; field 1 becomes a `YYYY-MM-DD` date when its first
/// eight bytes are ASCII digits; fields 2+ are rejoined with underscores as
/// page info. Never fails — malformed input yields partial or empty
/// metadata.
pub fn extract_metadata(filename: &str) -> FileMetadata {
    let stem = Path::new(filename)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let parts: Vec<&str> = stem.split('_').collect();
    let mut metadata = FileMetadata::default();

    if let Some(title) = parts.first() {
        metadata.title = (*title).to_string();
    }

    if let Some(date_str) = parts.get(1) {
        let bytes = date_str.as_bytes();
        if bytes.len() >= 8 && bytes[..8].iter().all(u8::is_ascii_digit) {
            metadata.date = format!(
                "{}-{}-{}",
                &date_str[0..4],
                &date_str[4..6],
                &date_str[6..8]
            );
        }
    }

    if parts.len() >= 3 {
        metadata.page_info = parts[2..].join("_");
    }

    metadata
}

/// Normalize one raw text and derive every downstream artefact in a single
/// record: metadata, sentences, paragraphs, and size statistics.
pub fn clean(input_text: &str, filename: &str, config: &CleanConfig) -> CleanResult {
    let metadata = extract_metadata(filename);
    let normalized_text = normalize(input_text);
    let sentences = split_sentences(&normalized_text, config);
    let paragraphs = split_paragraphs(&normalized_text, config);

    let original_length = input_text.chars().count();
    let cleaned_length = normalized_text.chars().count();
    let compression_ratio = if original_length == 0 {
        "0.00%".to_string()
    } else {
        format!(
            "{:.2}%",
            (1.0 - cleaned_length as f64 / original_length as f64) * 100.0
        )
    };

    let stats = CleanStats {
        original_length,
        cleaned_length,
        sentence_count: sentences.len(),
        paragraph_count: paragraphs.len(),
        compression_ratio,
    };

    CleanResult {
        metadata,
        normalized_text,
        sentences,
        paragraphs,
        stats,
    }
}

/// Clean a persisted OCR text file and write the normalized rendition.
///
/// The output is the persisted normalization format: a six-line metadata
/// header, a separator, then one paragraph per block. Written atomically.
pub fn clean_file(
    input: &Path,
    output: &Path,
    config: &CleanConfig,
) -> Result<CleanResult, Ocr2TextError> {
    let raw_text = match std::fs::read_to_string(input) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Ocr2TextError::SourceNotFound {
                path: input.to_path_buf(),
            })
        }
        Err(e) => {
            return Err(Ocr2TextError::InputReadFailed {
                path: input.to_path_buf(),
                source: e,
            })
        }
    };

    let filename = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let result = clean(&raw_text, &filename, config);
    write_text_atomically(output, &format_cleaned(&result))?;
    info!(
        "Cleaned {} → {} chars ({}), {} paragraphs, wrote {}",
        result.stats.original_length,
        result.stats.cleaned_length,
        result.stats.compression_ratio,
        result.stats.paragraph_count,
        output.display()
    );
    Ok(result)
}

/// Default output path for a cleaned file: `{stem}_cleaned.txt` beside the
/// input.
pub fn default_cleaned_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    input.with_file_name(format!("{stem}_cleaned.txt"))
}

/// Render a [`CleanResult`] in the persisted normalization format:
/// six `# ` header lines, a blank line, a 60-`=` separator, a blank line,
/// then each paragraph followed by a blank line.
pub fn format_cleaned(result: &CleanResult) -> String {
    let mut out = String::with_capacity(result.normalized_text.len() + 256);

    out.push_str(&format!("# 标题: {}\n", result.metadata.title));
    out.push_str(&format!("# 日期: {}\n", result.metadata.date));
    out.push_str(&format!("# 页面信息: {}\n", result.metadata.page_info));
    out.push_str(&format!(
        "# 原始长度: {} 字符\n",
        result.stats.original_length
    ));
    out.push_str(&format!(
        "# 清洗后长度: {} 字符\n",
        result.stats.cleaned_length
    ));
    out.push_str(&format!("# 压缩率: {}\n", result.stats.compression_ratio));
    out.push('\n');
    out.push_str(&"=".repeat(60));
    out.push_str("\n\n");

    for paragraph in &result.paragraphs {
        out.push_str(paragraph);
        out.push_str("\n\n");
    }

    out
}
