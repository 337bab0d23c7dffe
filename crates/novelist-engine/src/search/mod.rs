//! # Find & Replace
//!
//! Incremental, resumable search over the blocks of a [`Document`](crate::Document).
//!
//! - **`cursor`**: the three-coordinate resume position and its exhausted states
//! - **`matcher`**: literal and regex match-finding behind one [`Matcher`] trait
//! - **`session`**: [`FindSession`], which owns the cursor and the current match
//!   and drives find next/previous, replace current and replace all
//!
//! Search state never lives in globals: every call takes the session and the
//! document explicitly, so one document can be searched by several sessions
//! one after another without hidden coupling.

pub mod cursor;
pub mod matcher;
pub mod session;

pub use cursor::{Cursor, Position};
pub use matcher::{LiteralMatcher, MatchSpan, Matcher, PatternMatcher};
pub use session::{FindSession, ReplaceAllOutcome, SearchOutcome};

use crate::error::EngineError;

/// What to look for, and how.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub pattern: String,
    pub is_regex: bool,
}

impl SearchQuery {
    pub fn new(pattern: impl Into<String>, is_regex: bool) -> Self {
        Self {
            pattern: pattern.into(),
            is_regex,
        }
    }

    pub fn literal(pattern: impl Into<String>) -> Self {
        Self::new(pattern, false)
    }

    pub fn regex(pattern: impl Into<String>) -> Self {
        Self::new(pattern, true)
    }

    /// Compile into a matcher. Only regex queries can fail.
    pub fn matcher(&self) -> Result<Box<dyn Matcher>, EngineError> {
        if self.is_regex {
            Ok(Box::new(PatternMatcher::new(&self.pattern)?))
        } else {
            Ok(Box::new(LiteralMatcher::new(self.pattern.clone())))
        }
    }
}

/// A located occurrence of a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub scene_index: usize,
    pub block_index: usize,
    /// Byte offset of the match within the block's text.
    pub start: usize,
    /// Byte length of the matched text.
    pub length: usize,
    pub chapter_title: String,
    /// The newline-delimited line of the block that contains `start`.
    pub line_text: String,
}

impl Match {
    pub fn end(&self) -> usize {
        self.start + self.length
    }
}

/// The line of `text` (split on `\n`) containing byte offset `at`.
pub fn line_containing(text: &str, at: usize) -> &str {
    let mut line_start = 0;
    for line in text.split('\n') {
        let line_end = line_start + line.len();
        if at <= line_end {
            return line;
        }
        line_start = line_end + 1;
    }
    ""
}
