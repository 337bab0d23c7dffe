//! # Chapter Segmentation
//!
//! Moving prose between flat chapter text files and scene blocks.
//!
//! ## Modules
//! - **`segment`**: raw text to blocks on import, blocks to flat text on export
//! - **`export`**: naming and grouping chapters into output units
//! - **`natural`**: filename ordering used when importing a folder of chapters

pub mod export;
pub mod natural;
pub mod segment;

pub use export::{ChapterUnit, ExportMode, ExportOptions, chapter_texts, extract_chapter_units};
pub use natural::natural_cmp;
pub use segment::{
    CHAPTER_DIVIDER, GROUPED_CHAPTER_SEPARATOR, flatten_chapter_to_text, join_chapters,
    segment_imported_text,
};
