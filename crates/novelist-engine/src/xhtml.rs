//! Converting chapters between EPUB content documents and plain text.

use std::sync::OnceLock;

use regex::Regex;

static HIDDEN_ELEMENTS: OnceLock<Regex> = OnceLock::new();
static BLOCK_CLOSE: OnceLock<Regex> = OnceLock::new();
static LINE_BREAK: OnceLock<Regex> = OnceLock::new();
static ANY_TAG: OnceLock<Regex> = OnceLock::new();
static UNSAFE_FILE_CHARS: OnceLock<Regex> = OnceLock::new();

const PARAGRAPH_MARK: &str = "\u{E000}P\u{E000}";
const LINE_MARK: &str = "\u{E000}L\u{E000}";
const MAX_STEM_CHARS: usize = 100;

/// Best-effort prose extraction from an XHTML or HTML chapter.
///
/// Block-level elements end paragraphs, `<br>` ends a line, everything else
/// is flattened to its text.
pub fn xhtml_to_text(html: &str) -> String {
    let hidden = HIDDEN_ELEMENTS.get_or_init(|| {
        Regex::new(r"(?is)<head\b.*?</head\s*>|<script\b.*?</script\s*>|<style\b.*?</style\s*>")
            .expect("Invalid hidden element regex")
    });
    let block_close = BLOCK_CLOSE.get_or_init(|| {
        Regex::new(
            r"(?i)</(p|h[1-6]|div|li|blockquote|pre|section|article|aside|header|footer|nav|figure|figcaption|table|tr|th|td)\s*>\s*",
        )
        .expect("Invalid block tag regex")
    });
    let line_break = LINE_BREAK
        .get_or_init(|| Regex::new(r"(?i)<br\s*/?>").expect("Invalid line break regex"));
    let any_tag = ANY_TAG.get_or_init(|| {
        Regex::new(r"(?s)<!--.*?-->|<!\[CDATA\[|\]\]>|<[^>]*>").expect("Invalid tag regex")
    });

    let text = hidden.replace_all(html, "");
    let text = block_close.replace_all(&text, format!(" {PARAGRAPH_MARK} ").as_str());
    let text = line_break.replace_all(&text, format!(" {LINE_MARK} ").as_str());
    let text = any_tag.replace_all(&text, "");
    let text = html_escape::decode_html_entities(&text);

    let text = text
        .replace(PARAGRAPH_MARK, "\n\n")
        .replace(LINE_MARK, "\n")
        .replace('\u{a0}', " ");
    normalize_whitespace(&text)
}

/// Collapse space runs, drop spaces around newlines, cap blank lines at one.
fn normalize_whitespace(text: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    for line in text.replace("\r\n", "\n").split('\n') {
        let collapsed = line
            .split([' ', '\t'])
            .filter(|word| !word.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        lines.push(collapsed);
    }

    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0;
    for line in &lines {
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }
    out.trim().to_string()
}

/// Render a chapter as an XHTML content document.
///
/// The title becomes an `<h2>`; each blank-line-separated paragraph a `<p>`.
pub fn text_to_xhtml(text: &str, chapter_title: &str) -> String {
    let title = html_escape::encode_quoted_attribute(chapter_title);
    let mut body = format!("<h2>{title}</h2>\n");
    for paragraph in split_blank_lines(&text.replace("\r\n", "\n")) {
        let paragraph = paragraph.trim();
        if !paragraph.is_empty() {
            body.push_str(&format!(
                "    <p>{}</p>\n",
                html_escape::encode_quoted_attribute(paragraph)
            ));
        }
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops" xml:lang="en">
<head>
  <title>{title}</title>
  <link rel="stylesheet" type="text/css" href="../css/style.css" />
</head>
<body>
  <section epub:type="chapter">
{body}  </section>
</body>
</html>"#
    )
}

fn split_blank_lines(text: &str) -> impl Iterator<Item = &str> {
    let mut rest = Some(text);
    std::iter::from_fn(move || {
        let current = rest?;
        match current.find("\n\n") {
            Some(at) => {
                let run = current[at..].bytes().take_while(|&b| b == b'\n').count();
                rest = Some(&current[at + run..]);
                Some(&current[..at])
            }
            None => {
                rest = None;
                Some(current)
            }
        }
    })
}

/// A filesystem-safe file stem: letters, digits, `.`, `_` and `-` only.
///
/// Falls back to `"file"` when nothing usable remains.
pub fn sanitize_file_stem(name: &str) -> String {
    let unsafe_chars = UNSAFE_FILE_CHARS.get_or_init(|| {
        Regex::new(r"[^\p{L}\p{N}._-]+").expect("Invalid file name regex")
    });

    let replaced = unsafe_chars.replace_all(name, "_");
    let mut stem = String::with_capacity(replaced.len());
    for c in replaced.chars() {
        if c == '_' && stem.ends_with('_') {
            continue;
        }
        stem.push(c);
    }
    let stem: String = stem
        .trim_matches(|c| matches!(c, '_' | '.' | '-'))
        .chars()
        .take(MAX_STEM_CHARS)
        .collect();

    if stem.is_empty() {
        "file".to_string()
    } else {
        stem
    }
}
