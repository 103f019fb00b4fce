//! reStructuredText READMEs (PyPI). No rendering; both metrics are pattern
//! matches on the raw text.

use regex::Regex;
use std::sync::OnceLock;

use super::{count_words, ReadmeMetrics};

pub fn analyze(readme_text: &str) -> ReadmeMetrics {
    ReadmeMetrics {
        word_count: count_words(readme_text),
        code_count: count_literal_blocks(readme_text),
    }
}

/// A literal block is introduced by a paragraph ending in `::` and must be
/// separated from it by a blank line, so the marker is followed by the rest
/// of its line and two newlines. Matches never overlap.
fn count_literal_blocks(text: &str) -> usize {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"::.*\n\n").unwrap());
    re.find_iter(text).count()
}
