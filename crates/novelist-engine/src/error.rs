use std::fmt;

/// Category of an [`EngineError`], for callers that present errors by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    InvalidPattern,
    NoActiveMatch,
    EmptySelection,
    Json,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Validation => "validation",
            ErrorKind::InvalidPattern => "invalid-pattern",
            ErrorKind::NoActiveMatch => "no-active-match",
            ErrorKind::EmptySelection => "empty-selection",
            ErrorKind::Json => "json",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Invalid regular expression {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },
    #[error("No current match to replace")]
    NoActiveMatch,
    #[error("Nothing selected: {0}")]
    EmptySelection(String),
    #[error("Malformed backup document: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Validation(_) => ErrorKind::Validation,
            EngineError::InvalidPattern { .. } => ErrorKind::InvalidPattern,
            EngineError::NoActiveMatch => ErrorKind::NoActiveMatch,
            EngineError::EmptySelection(_) => ErrorKind::EmptySelection,
            EngineError::Json(_) => ErrorKind::Json,
        }
    }
}

/// A scene whose stored text could not be parsed. The scene is treated as
/// having no blocks; the operation that hit it carries on.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneParseWarning {
    pub scene_index: usize,
    pub scene_title: String,
    pub message: String,
}

impl fmt::Display for SceneParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "skipped scene {} ({:?}): {}",
            self.scene_index, self.scene_title, self.message
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kinds_match_variants() {
        assert_eq!(
            EngineError::Validation("x".into()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(EngineError::NoActiveMatch.kind(), ErrorKind::NoActiveMatch);
        assert_eq!(
            EngineError::EmptySelection("none".into()).kind(),
            ErrorKind::EmptySelection
        );
    }

    #[test]
    fn invalid_pattern_message_names_pattern() {
        let source = regex::Regex::new("(").unwrap_err();
        let err = EngineError::InvalidPattern {
            pattern: "(".into(),
            source,
        };
        assert_eq!(err.kind(), ErrorKind::InvalidPattern);
        assert!(err.to_string().contains("\"(\""));
    }

    #[test]
    fn warning_display_mentions_scene() {
        let warning = SceneParseWarning {
            scene_index: 2,
            scene_title: "Ch3".into(),
            message: "expected value".into(),
        };
        assert_eq!(
            warning.to_string(),
            "skipped scene 2 (\"Ch3\"): expected value"
        );
    }
}
