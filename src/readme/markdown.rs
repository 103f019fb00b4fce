//! Markdown READMEs (npm). Metrics come from the parsed document, so markup
//! characters, link targets and tag attributes never count as words.

use pulldown_cmark::{Event, Parser, Tag, TagEnd};
use quick_xml::escape::resolve_html5_entity;
use regex::{Captures, Regex};
use std::borrow::Cow;
use std::sync::OnceLock;

use super::{count_words, ReadmeMetrics};

pub fn analyze(readme_text: &str) -> ReadmeMetrics {
    let mut page = VisiblePage::default();
    for event in Parser::new(readme_text) {
        page.push(event);
    }
    page.finish()
}

/// Visible text of the rendered page, built from parser events. Raw HTML is
/// buffered until the next non-HTML event so tags split across lines of an
/// HTML block are stripped as a whole.
#[derive(Default)]
struct VisiblePage {
    text: String,
    raw_html: String,
    code_blocks: usize,
    image_depth: usize,
}

impl VisiblePage {
    fn push(&mut self, event: Event<'_>) {
        if let Event::Html(html) | Event::InlineHtml(html) = &event {
            self.raw_html.push_str(html);
            return;
        }
        self.flush_html();
        match event {
            Event::Start(Tag::CodeBlock(_)) => self.code_blocks += 1,
            Event::Start(Tag::Image { .. }) => self.image_depth += 1,
            // Alt text renders into an attribute, not onto the page.
            Event::End(TagEnd::Image) => self.image_depth = self.image_depth.saturating_sub(1),
            Event::End(TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough | TagEnd::Link) => {}
            Event::End(_) | Event::SoftBreak | Event::HardBreak | Event::Rule => {
                self.text.push('\n')
            }
            Event::Text(t) | Event::Code(t) if self.image_depth == 0 => self.text.push_str(&t),
            _ => {}
        }
    }

    fn flush_html(&mut self) {
        if self.raw_html.is_empty() {
            return;
        }
        let html = std::mem::take(&mut self.raw_html);
        let mut last = 0;
        for caps in markup_re().captures_iter(&html) {
            let Some(tag) = caps.get(0) else {
                continue;
            };
            self.text.push_str(&decode_entities(&html[last..tag.start()]));
            last = tag.end();
            let opening = caps.get(1).map(|m| m.as_str()) == Some("");
            let is_pre = caps
                .get(2)
                .is_some_and(|name| name.as_str().eq_ignore_ascii_case("pre"));
            if opening && is_pre {
                self.code_blocks += 1;
            }
        }
        self.text.push_str(&decode_entities(&html[last..]));
    }

    fn finish(mut self) -> ReadmeMetrics {
        self.flush_html();
        ReadmeMetrics {
            word_count: count_words(&self.text),
            code_count: self.code_blocks,
        }
    }
}

/// Comments, declarations and processing instructions, then real tags: `<`
/// must be followed by a name, and quoted attribute values may hold `>`.
/// A bare `<` in text is left alone.
fn markup_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"(?s)<!--.*?-->|<![^>]*>|<\?.*?\?>|<(/?)([A-Za-z][A-Za-z0-9-]*)(?:[^>"']|"[^"]*"|'[^']*')*>"#,
        )
        .unwrap()
    })
}

fn decode_entities(text: &str) -> Cow<'_, str> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9A-Fa-f]{1,6}|[A-Za-z][A-Za-z0-9]{1,31});").unwrap()
    });
    re.replace_all(text, |caps: &Captures| {
        let body = &caps[1];
        let numeric = if let Some(hex) = body.strip_prefix("#x").or_else(|| body.strip_prefix("#X")) {
            u32::from_str_radix(hex, 16).ok()
        } else if let Some(dec) = body.strip_prefix('#') {
            dec.parse::<u32>().ok()
        } else {
            return resolve_html5_entity(body)
                .map(str::to_string)
                .unwrap_or_else(|| caps[0].to_string());
        };
        match numeric.and_then(char::from_u32) {
            Some(c) => c.to_string(),
            None => caps[0].to_string(),
        }
    })
}
