use regex::Regex;

use crate::error::EngineError;

/// Byte range of one match inside a block's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchSpan {
    pub start: usize,
    pub end: usize,
}

impl MatchSpan {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Match-finding capability shared by literal and regex search.
///
/// Offsets are byte offsets into `text`; offsets that fall inside a
/// multi-byte character are moved forward to the next character boundary.
pub trait Matcher {
    /// First match starting at or after `offset`.
    fn find_from(&self, text: &str, offset: usize) -> Option<MatchSpan>;

    /// The match that starts strictly before `ceiling` and ends closest to
    /// it without passing it. Ties go to the earlier start.
    fn find_last_before(&self, text: &str, ceiling: usize) -> Option<MatchSpan>;

    /// Replace every non-overlapping match, returning the new text and the
    /// number of replacements made.
    fn replace_all(&self, text: &str, replacement: &str) -> (String, usize);

    /// Whether blocks with empty text are worth searching at all.
    fn searches_empty_text(&self) -> bool;
}

/// Exact, case-sensitive substring search. An empty needle never matches.
#[derive(Debug, Clone)]
pub struct LiteralMatcher {
    needle: String,
}

impl LiteralMatcher {
    pub fn new(needle: impl Into<String>) -> Self {
        Self {
            needle: needle.into(),
        }
    }
}

impl Matcher for LiteralMatcher {
    fn find_from(&self, text: &str, offset: usize) -> Option<MatchSpan> {
        if self.needle.is_empty() || offset > text.len() {
            return None;
        }
        let offset = ceil_char_boundary(text, offset);
        text[offset..].find(&self.needle).map(|found| MatchSpan {
            start: offset + found,
            end: offset + found + self.needle.len(),
        })
    }

    fn find_last_before(&self, text: &str, ceiling: usize) -> Option<MatchSpan> {
        if self.needle.is_empty() {
            return None;
        }
        let ceiling = ceil_char_boundary(text, ceiling);
        text[..ceiling].rfind(&self.needle).map(|start| MatchSpan {
            start,
            end: start + self.needle.len(),
        })
    }

    fn replace_all(&self, text: &str, replacement: &str) -> (String, usize) {
        if self.needle.is_empty() {
            return (text.to_string(), 0);
        }
        let count = text.matches(self.needle.as_str()).count();
        if count == 0 {
            return (text.to_string(), 0);
        }
        (text.replace(self.needle.as_str(), replacement), count)
    }

    fn searches_empty_text(&self) -> bool {
        false
    }
}

/// Regular-expression search backed by the `regex` crate.
///
/// Replacement text uses the crate's expansion syntax (`$1`, `${name}`).
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    regex: Regex,
    empty_pattern: bool,
}

impl PatternMatcher {
    pub fn new(pattern: &str) -> Result<Self, EngineError> {
        let regex = Regex::new(pattern).map_err(|source| EngineError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self {
            regex,
            empty_pattern: pattern.is_empty(),
        })
    }
}

impl Matcher for PatternMatcher {
    fn find_from(&self, text: &str, offset: usize) -> Option<MatchSpan> {
        if offset > text.len() {
            return None;
        }
        let offset = ceil_char_boundary(text, offset);
        self.regex.find_at(text, offset).map(|m| MatchSpan {
            start: m.start(),
            end: m.end(),
        })
    }

    fn find_last_before(&self, text: &str, ceiling: usize) -> Option<MatchSpan> {
        let ceiling = ceil_char_boundary(text, ceiling);
        let mut best: Option<MatchSpan> = None;
        let mut pos = 0;

        // Visit the match anchored at every start below the ceiling, jumping
        // over stretches where nothing starts.
        while pos < ceiling {
            let Some(m) = self.regex.find_at(text, pos) else {
                break;
            };
            if m.start() >= ceiling {
                break;
            }
            if m.end() <= ceiling && best.is_none_or(|b| m.end() > b.end) {
                best = Some(MatchSpan {
                    start: m.start(),
                    end: m.end(),
                });
            }
            pos = m.start() + char_len_at(text, m.start());
        }
        best
    }

    fn replace_all(&self, text: &str, replacement: &str) -> (String, usize) {
        let count = self.regex.find_iter(text).count();
        if count == 0 {
            return (text.to_string(), 0);
        }
        (self.regex.replace_all(text, replacement).into_owned(), count)
    }

    fn searches_empty_text(&self) -> bool {
        self.empty_pattern
    }
}

/// Smallest character boundary at or after `index`, capped at `text.len()`.
pub(crate) fn ceil_char_boundary(text: &str, index: usize) -> usize {
    let mut index = index.min(text.len());
    while !text.is_char_boundary(index) {
        index += 1;
    }
    index
}

/// Byte length of the character starting at `index`, or 1 past the end.
pub(crate) fn char_len_at(text: &str, index: usize) -> usize {
    text.get(index..)
        .and_then(|rest| rest.chars().next())
        .map(char::len_utf8)
        .unwrap_or(1)
}
