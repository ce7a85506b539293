//! # Content Formatter
//! Turns the raw HTML of an article section into chat-ready plain text.
//!
//! Only paragraph and list-item nodes produce output, in document order:
//! - `<p>`  → trimmed text + blank line
//! - `<li>` → `"• "` + trimmed text + newline (the `<ul>`/`<ol>` itself emits nothing)
//!
//! Inline Lari icons (`span.icon-gel`, no text of their own) become a trailing `₾`.
//! Non-breaking spaces are turned into plain spaces, runs of 3+ newlines are
//! collapsed to one blank line and the result is trimmed.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

/// Currency glyph appended when the item carries the Lari icon marker.
pub const LARI_SIGN: char = '₾';

static SEL_BLOCKS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p, li").expect("static selector: blocks"));
static SEL_GEL_ICON: Lazy<Selector> =
    Lazy::new(|| Selector::parse("span.icon-gel").expect("static selector: icon-gel"));
static RE_MULTI_NL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());
static RE_ANY_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[A-Za-z!/]").unwrap());

/// Format a raw structured-content block. Never fails: input without any tag
/// skips the block walk but is still normalised.
pub fn format_content(raw_html: &str) -> String {
    if !RE_ANY_TAG.is_match(raw_html) {
        return finish(raw_html);
    }

    let doc = Html::parse_fragment(raw_html);
    let mut out = String::with_capacity(raw_html.len() / 2);

    for el in doc.select(&SEL_BLOCKS) {
        let Some(text) = block_text(&el) else {
            continue;
        };
        match el.value().name() {
            "p" => {
                out.push_str(&text);
                out.push_str("\n\n");
            }
            "li" => {
                out.push_str("• ");
                out.push_str(&text);
                out.push('\n');
            }
            _ => {}
        }
    }

    finish(&out)
}

/// Shared tail: nbsp → space, blank-line runs collapsed, trimmed.
fn finish(s: &str) -> String {
    collapse_blank_lines(&normalize_spaces(s)).trim().to_string()
}

/// Trimmed text of a block node, with the Lari sign resolved. `None` for empty nodes.
fn block_text(el: &ElementRef<'_>) -> Option<String> {
    let text = el.text().collect::<String>();
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if el.select(&SEL_GEL_ICON).next().is_some() {
        return Some(format!("{text} {LARI_SIGN}"));
    }
    Some(text.to_string())
}

/// `&nbsp;` (decoded or still escaped) → plain space.
pub fn normalize_spaces(s: &str) -> String {
    s.replace('\u{00A0}', " ").replace("&nbsp;", " ")
}

/// Any run of three or more newlines becomes exactly two.
pub fn collapse_blank_lines(s: &str) -> String {
    RE_MULTI_NL.replace_all(s, "\n\n").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paragraphs_and_bullets() {
        let out = format_content("<p>Hello</p><ul><li>One</li><li>Two</li></ul>");
        assert_eq!(out, "Hello\n\n• One\n• Two");
    }

    #[test]
    fn collapse_runs_of_newlines() {
        assert_eq!(collapse_blank_lines("X\n\n\n\nY"), "X\n\nY");
        assert_eq!(collapse_blank_lines("X\n\n\n\n\n\n\nY\n\n\nZ"), "X\n\nY\n\nZ");
        assert_eq!(collapse_blank_lines("X\n\nY"), "X\n\nY");
    }

    #[test]
    fn lari_icon_appends_sign() {
        let out = format_content(r#"<li>Price 10 <span class="icon-gel"></span></li>"#);
        assert_eq!(out, "• Price 10 ₾");
    }

    #[test]
    fn non_breaking_spaces_become_plain() {
        let out = format_content("<p>50&nbsp;GB&nbsp;free</p>");
        assert_eq!(out, "50 GB free");
    }

    #[test]
    fn empty_blocks_and_other_tags_are_skipped() {
        let out = format_content("<div><h2>Heading</h2><p>  </p><p>Body</p><li></li></div>");
        assert_eq!(out, "Body");
    }

    #[test]
    fn plain_text_is_still_normalised() {
        assert_eq!(format_content("X\n\n\n\nY"), "X\n\nY");
        assert_eq!(format_content(" 50&nbsp;GB\n\n\n\nfree "), "50 GB\n\nfree");
    }
}
