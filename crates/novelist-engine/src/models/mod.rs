pub mod document;
mod lenient;
pub mod scene;

pub use document::{
    BACKUP_VERSION, BookProgress, DEFAULT_STATUS_CODE, Document, Revision, Section, SectionScene,
    Status, now_millis,
};
pub use scene::{Block, Scene, SceneBody};
