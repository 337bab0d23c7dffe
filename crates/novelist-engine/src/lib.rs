pub mod builder;
pub mod chapters;
pub mod error;
pub mod io;
pub mod models;
pub mod search;
pub mod xhtml;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use builder::{BuildOptions, ChapterFile, build, build_from_chapters, extend, merge};
pub use chapters::{ChapterUnit, ExportMode, ExportOptions};
pub use error::{EngineError, ErrorKind, SceneParseWarning};
pub use io::*;
pub use models::{Block, Document, Revision, Scene, SceneBody, Section};
pub use search::{Cursor, FindSession, Match, SearchQuery};
