use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

use crate::models::{Block, Document, Revision, Scene, SceneBody, Section, Status};

/// Create a temporary working directory
pub fn create_test_dir() -> TempDir {
    tempfile::tempdir().unwrap()
}

/// Create a test file with content
pub fn create_test_file(dir: &TempDir, filename: &str, content: &str) -> PathBuf {
    let file_path = dir.path().join(filename);
    fs::write(&file_path, content).unwrap();
    file_path
}

/// A document with one scene per entry, each holding a single text block.
/// Scenes are titled "Chapter N".
pub fn document_with_scenes(texts: &[&str]) -> Document {
    document_with_blocks(texts.iter().map(|text| vec![Some(*text)]).collect())
}

/// A document with one scene per entry. `None` is a spacer block without
/// any `text` field.
pub fn document_with_blocks(scenes: Vec<Vec<Option<&str>>>) -> Document {
    let mut built = Vec::new();
    let mut sections = Vec::new();
    for (index, blocks) in scenes.into_iter().enumerate() {
        let number = index + 1;
        let blocks = blocks
            .into_iter()
            .map(|text| match text {
                Some(text) => Block::text_block(text),
                None => Block::spacer(),
            })
            .collect();
        let code = format!("scene{number}");
        let title = format!("Chapter {number}");
        built.push(Scene::new(&code, &title, &SceneBody::new(blocks), number as i64).unwrap());
        sections.push(Section::for_scene(
            format!("section{number}"),
            &title,
            &code,
            number as i64,
        ));
    }

    Document {
        version: crate::models::BACKUP_VERSION,
        code: "testdoc1".to_string(),
        title: "Test Novel".to_string(),
        description: String::new(),
        show_table_of_contents: true,
        apply_automatic_indentation: true,
        last_update_date: 0,
        last_backup_date: 0,
        revisions: vec![Revision::new(built, sections, vec![Status::default()])],
        extra: Default::default(),
    }
}
