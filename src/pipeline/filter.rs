//! Garbled-text filter: drop recognition output lines that are very likely
//! noise.
//!
//! Genuine recognized text is dominated by script characters, Latin letters,
//! digits, and common punctuation; misrecognition of low-quality or
//! mis-segmented regions skews toward arbitrary symbols. Two line-level
//! rules catch the bulk of it:
//!
//! 1. **Allow-ratio** — the fraction of a line's characters inside the
//!    allow-set (CJK ideographs, `\w`, whitespace, CJK punctuation,
//!    full-width forms, common ASCII punctuation) must reach
//!    [`FilterConfig::min_allowed_ratio`].
//! 2. **Noise run** — a run of [`FilterConfig::max_noise_run`] or more
//!    consecutive symbols from the noise set kills the line outright.
//!
//! Blank lines are always retained; they carry paragraph-break information
//! for the normalizer. This is a heuristic, not a classifier — false
//! positives and negatives are expected and acceptable.

use crate::config::FilterConfig;
use once_cell::sync::Lazy;
use regex::Regex;

// CJK Unified Ideographs, word chars, whitespace, CJK symbols/punctuation,
// half- and full-width forms, and the ASCII punctuation that legitimately
// appears in prose.
static RE_ALLOWED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"[\x{4E00}-\x{9FFF}\w\s\x{3000}-\x{303F}\x{FF00}-\x{FFEF}\\/:.,!?;"'()\[\]{}+=<>-]"#,
    )
    .unwrap()
});

static RE_NOISE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[!@#$%^&*()_+={}\[\]|\\:;"'<>,?/]+"#).unwrap());

/// Apply the garbled-line filter to a block of recognition output.
///
/// Operates line by line; surviving lines keep their original content and
/// order. Blank lines pass through untouched.
pub fn filter_garbled(text: &str, config: &FilterConfig) -> String {
    if text.trim().is_empty() {
        return text.to_string();
    }

    let filtered: Vec<&str> = text
        .split('\n')
        .filter(|line| line.trim().is_empty() || line_is_plausible(line, config))
        .collect();

    filtered.join("\n")
}

/// Whether a non-blank line passes both heuristics.
fn line_is_plausible(line: &str, config: &FilterConfig) -> bool {
    let total_chars = line.chars().count();
    if total_chars == 0 {
        return true;
    }

    let allowed_chars = RE_ALLOWED.find_iter(line).count();
    let ratio = allowed_chars as f32 / total_chars as f32;
    if ratio < config.min_allowed_ratio {
        return false;
    }

    !RE_NOISE_RUN
        .find_iter(line)
        .any(|m| m.as_str().chars().count() >= config.max_noise_run)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(text: &str) -> String {
        filter_garbled(text, &FilterConfig::default())
    }

    #[test]
    fn cjk_prose_is_kept() {
        let text = "今天股市大幅波动，投资者情绪紧张。";
        assert_eq!(filter(text), text);
    }

    #[test]
    fn mixed_cjk_latin_is_kept() {
        let text = "A股4000点拉锯，黄金 (gold) 是否值得买入？";
        assert_eq!(filter(text), text);
    }

    #[test]
    fn symbol_soup_is_dropped() {
        // Mostly characters outside the allow-set.
        let text = "€€¥¥©©®®™™€€¥¥©©®®\n正常的一行中文文本内容";
        assert_eq!(filter(text), "正常的一行中文文本内容");
    }

    #[test]
    fn noise_run_is_dropped_even_with_good_ratio() {
        // Every char is in the allow-set, but the ten-symbol run marks it
        // as garbage.
        let text = "heading ((((((((((( tail";
        assert_eq!(filter(text), "");
    }

    #[test]
    fn short_symbol_run_survives() {
        let text = "f(x) = {a: [1, 2]}";
        assert_eq!(filter(text), text);
    }

    #[test]
    fn blank_lines_are_retained() {
        let text = "第一段文字\n\n第二段文字";
        assert_eq!(filter(text), text);
    }

    #[test]
    fn blank_input_passes_through() {
        assert_eq!(filter(""), "");
        assert_eq!(filter("   \n  "), "   \n  ");
    }

    #[test]
    fn retained_lines_satisfy_the_invariants() {
        let config = FilterConfig::default();
        let noisy = "絵文字€€€€€€€€€€€€\n普通文本行没有问题\n@@@@@@@@@@@@\nplain ascii text";
        let kept = filter_garbled(noisy, &config);
        for line in kept.split('\n').filter(|l| !l.trim().is_empty()) {
            let total = line.chars().count();
            let allowed = RE_ALLOWED.find_iter(line).count();
            assert!(
                allowed as f32 / total as f32 >= config.min_allowed_ratio,
                "line kept below ratio: {line:?}"
            );
            assert!(
                !RE_NOISE_RUN
                    .find_iter(line)
                    .any(|m| m.as_str().chars().count() >= config.max_noise_run),
                "line kept with noise run: {line:?}"
            );
        }
    }

    #[test]
    fn custom_thresholds_are_honoured() {
        let strict = FilterConfig {
            min_allowed_ratio: 0.4,
            max_noise_run: 3,
        };
        assert_eq!(filter_garbled("a ((( b", &strict), "");
        assert_eq!(filter_garbled("a (( b", &strict), "a (( b");
    }
}
