//! README heuristics. Both flavors share the word tokenizer; they differ in
//! how code blocks are recognized.

pub mod markdown;
pub mod rst;

use regex::Regex;
use std::sync::OnceLock;

/// Word and code-block counts for one README.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadmeMetrics {
    pub word_count: usize,
    pub code_count: usize,
}

/// Count maximal runs of `[A-Za-z0-9_]`. Intentionally rough: a dotted path
/// such as `com.app.example` is three words.
pub fn count_words(text: &str) -> usize {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"[A-Za-z0-9_]+").unwrap());
    re.find_iter(text).count()
}
