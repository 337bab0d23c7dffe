//! Creating, extending and merging backup documents.
//!
//! Every document produced here has exactly one revision whose scenes and
//! sections pair up 1:1 (`sceneN` / `sectionN`, ranking `N`).

use serde_json::Map;

use crate::chapters::{natural_cmp, segment_imported_text};
use crate::error::{EngineError, SceneParseWarning};
use crate::models::{
    BACKUP_VERSION, Block, BookProgress, Document, Revision, Scene, SceneBody, Section,
    SectionScene, Status, now_millis,
};

/// Choices for a freshly built document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    /// Document code; a random 8-digit hex code is generated when `None`.
    pub code: Option<String>,
    pub show_table_of_contents: bool,
    pub apply_automatic_indentation: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            code: None,
            show_table_of_contents: true,
            apply_automatic_indentation: true,
        }
    }
}

/// A chapter file handed to [`build_from_chapters`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterFile {
    pub name: String,
    pub text: String,
}

impl ChapterFile {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

/// Random 8-digit lowercase hex document code.
pub fn generate_code() -> String {
    let mut code = uuid::Uuid::new_v4().simple().to_string();
    code.truncate(8);
    code
}

/// `{prefix}{n}`, or just `n` without a prefix.
pub fn chapter_title(prefix: &str, number: usize) -> String {
    format!("{prefix}{number}")
}

fn scene_code(number: usize) -> String {
    format!("scene{number}")
}

fn section_code(number: usize) -> String {
    format!("section{number}")
}

/// A scene/section pair numbered `number` with the given blocks.
fn chapter_pair(
    number: usize,
    title: &str,
    blocks: Vec<Block>,
) -> Result<(Scene, Section), EngineError> {
    let code = scene_code(number);
    let scene = Scene::new(&code, title, &SceneBody::new(blocks), number as i64)?;
    let section = Section::for_scene(section_code(number), title, code, number as i64);
    Ok((scene, section))
}

fn blank_chapter(number: usize, prefix: &str) -> Result<(Scene, Section), EngineError> {
    chapter_pair(number, &chapter_title(prefix, number), vec![Block::empty()])
}

fn require_title(title: &str) -> Result<(), EngineError> {
    if title.trim().is_empty() {
        return Err(EngineError::Validation(
            "project title is required".to_string(),
        ));
    }
    Ok(())
}

fn assemble(
    title: &str,
    description: &str,
    code: Option<String>,
    show_table_of_contents: bool,
    apply_automatic_indentation: bool,
    revision: Revision,
) -> Document {
    let now = now_millis();
    let mut revision = revision;
    revision.date = now;
    Document {
        version: BACKUP_VERSION,
        code: code
            .filter(|code| !code.trim().is_empty())
            .unwrap_or_else(generate_code),
        title: title.to_string(),
        description: description.to_string(),
        show_table_of_contents,
        apply_automatic_indentation,
        last_update_date: now,
        last_backup_date: now,
        revisions: vec![revision],
        extra: Map::new(),
    }
}

/// A new document with `chapter_count` empty chapters titled from `prefix`.
pub fn build(
    title: &str,
    description: &str,
    chapter_count: usize,
    prefix: &str,
    options: &BuildOptions,
) -> Result<Document, EngineError> {
    require_title(title)?;
    if chapter_count < 1 {
        return Err(EngineError::Validation(
            "at least one chapter is required".to_string(),
        ));
    }

    let (scenes, sections): (Vec<Scene>, Vec<Section>) = (1..=chapter_count)
        .map(|number| blank_chapter(number, prefix))
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .unzip();

    log::debug!("built {title:?} with {chapter_count} chapter(s)");
    Ok(assemble(
        title,
        description,
        options.code.clone(),
        options.show_table_of_contents,
        options.apply_automatic_indentation,
        Revision::new(scenes, sections, vec![Status::default()]),
    ))
}

/// A new document with one chapter per `.txt` file, in natural filename order.
///
/// Each chapter is titled after its file name without the extension and its
/// text is split into paragraph blocks. The revision's progress entry records
/// the total word count.
pub fn build_from_chapters(
    title: &str,
    description: &str,
    files: Vec<ChapterFile>,
    options: &BuildOptions,
) -> Result<Document, EngineError> {
    require_title(title)?;

    let mut files: Vec<ChapterFile> = files
        .into_iter()
        .filter(|file| strip_txt_extension(&file.name).is_some())
        .collect();
    if files.is_empty() {
        return Err(EngineError::EmptySelection(
            "no .txt chapter files found".to_string(),
        ));
    }
    files.sort_by(|a, b| natural_cmp(&a.name, &b.name));

    let mut scenes = Vec::with_capacity(files.len());
    let mut sections = Vec::with_capacity(files.len());
    for (index, file) in files.iter().enumerate() {
        let chapter = strip_txt_extension(&file.name).unwrap_or(&file.name);
        let (scene, section) =
            chapter_pair(index + 1, chapter, segment_imported_text(&file.text))?;
        scenes.push(scene);
        sections.push(section);
    }

    let mut document = assemble(
        title,
        description,
        options.code.clone(),
        options.show_table_of_contents,
        options.apply_automatic_indentation,
        Revision::new(scenes, sections, vec![Status::default()]),
    );
    record_word_count(&mut document);
    log::debug!("built {title:?} from {} chapter file(s)", files.len());
    Ok(document)
}

fn strip_txt_extension(name: &str) -> Option<&str> {
    let split = name.len().checked_sub(4)?;
    let (stem, extension) = (name.get(..split)?, name.get(split..)?);
    extension.eq_ignore_ascii_case(".txt").then_some(stem)
}

/// Append `extra_count` empty chapters, numbered after the existing scenes.
pub fn extend(document: &mut Document, extra_count: usize, prefix: &str) -> Result<(), EngineError> {
    let revision = document
        .revision_mut()
        .ok_or_else(|| EngineError::Validation("backup has no revisions".to_string()))?;

    let existing = revision.scenes.len();
    for number in existing + 1..=existing + extra_count {
        let (scene, section) = blank_chapter(number, prefix)?;
        revision.scenes.push(scene);
        revision.sections.push(section);
    }

    document.touch();
    log::debug!("extended {:?} by {extra_count} chapter(s)", document.title);
    Ok(())
}

/// Concatenate the chapters of several documents into a new one.
///
/// Scenes are renumbered from 1 in input order and retitled from `prefix`.
/// Each scene keeps the section that sat at the same position in the merged
/// section list (synopsis and extra fields survive), re-linked to the new
/// scene code; scenes without one get a fresh section. Statuses come from
/// the first input that has any.
pub fn merge(
    documents: &[Document],
    title: &str,
    description: &str,
    prefix: &str,
) -> Result<Document, EngineError> {
    require_title(title)?;

    let mut scenes: Vec<Scene> = Vec::new();
    let mut sections: Vec<Section> = Vec::new();
    let mut statuses: Option<Vec<Status>> = None;
    for document in documents {
        let Some(revision) = document.revision() else {
            log::warn!("Merging {:?}: backup has no revisions", document.title);
            continue;
        };
        scenes.extend(revision.scenes.iter().cloned());
        sections.extend(revision.sections.iter().cloned());
        if statuses.is_none() && !revision.statuses.is_empty() {
            statuses = Some(revision.statuses.clone());
        }
    }

    if scenes.is_empty() {
        return Err(EngineError::EmptySelection(
            "merged backups contain no chapters".to_string(),
        ));
    }

    let mut sections = sections.into_iter();
    let mut linked_sections = Vec::with_capacity(scenes.len());
    for (index, scene) in scenes.iter_mut().enumerate() {
        let number = index + 1;
        let chapter = chapter_title(prefix, number);
        scene.code = scene_code(number);
        scene.title = chapter.clone();
        scene.ranking = number as i64;

        let section = match sections.next() {
            Some(mut section) => {
                section.code = section_code(number);
                section.title = chapter;
                section.ranking = number as i64;
                match section.section_scenes.first_mut() {
                    Some(link) => {
                        link.code = scene.code.clone();
                        link.ranking = 1;
                    }
                    None => section.section_scenes.push(SectionScene {
                        code: scene.code.clone(),
                        ranking: 1,
                        extra: Map::new(),
                    }),
                }
                section
            }
            None => Section::for_scene(section_code(number), chapter, &scene.code, number as i64),
        };
        linked_sections.push(section);
    }

    let chapter_count = scenes.len();
    let mut document = assemble(
        title,
        description,
        None,
        true,
        true,
        Revision::new(
            scenes,
            linked_sections,
            statuses.unwrap_or_else(|| vec![Status::default()]),
        ),
    );
    let warnings = record_word_count(&mut document);
    log::debug!(
        "merged {} backup(s) into {chapter_count} chapter(s), {} unreadable",
        documents.len(),
        warnings.len()
    );
    Ok(document)
}

/// Store today's word count as the revision's only progress entry.
fn record_word_count(document: &mut Document) -> Vec<SceneParseWarning> {
    let (word_count, warnings) = document.word_count_with_warnings();
    for warning in &warnings {
        log::warn!("Word count: {warning}");
    }
    if let Some(revision) = document.revision_mut() {
        revision.book_progresses = vec![BookProgress::today(word_count)];
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::document_with_scenes;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn titles(document: &Document) -> Vec<String> {
        document.scenes().iter().map(|scene| scene.title.clone()).collect()
    }

    fn codes(document: &Document) -> Vec<String> {
        document.scenes().iter().map(|scene| scene.code.clone()).collect()
    }

    #[test]
    fn build_creates_numbered_empty_chapters() {
        let doc = build("T", "", 3, "Ch", &BuildOptions::default()).unwrap();
        assert_eq!(codes(&doc), vec!["scene1", "scene2", "scene3"]);
        assert_eq!(titles(&doc), vec!["Ch1", "Ch2", "Ch3"]);
        for scene in doc.scenes() {
            assert_eq!(scene.blocks(), vec![Block::empty()]);
            assert_eq!(scene.status, "1");
        }
        assert_eq!(doc.sections().len(), 3);
        assert_eq!(doc.sections()[2].code, "section3");
        assert_eq!(doc.sections()[2].section_scenes[0].code, "scene3");
        assert_eq!(doc.version, BACKUP_VERSION);
        assert_eq!(doc.code.len(), 8);
        assert!(doc.code.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(doc.last_update_date, doc.revision().unwrap().date);
    }

    #[test]
    fn build_without_prefix_uses_bare_numbers() {
        let doc = build("T", "", 2, "", &BuildOptions::default()).unwrap();
        assert_eq!(titles(&doc), vec!["1", "2"]);
    }

    #[test]
    fn build_keeps_supplied_code_and_flags() {
        let options = BuildOptions {
            code: Some("deadbeef".to_string()),
            show_table_of_contents: false,
            apply_automatic_indentation: false,
        };
        let doc = build("T", "About", 1, "Ch", &options).unwrap();
        assert_eq!(doc.code, "deadbeef");
        assert_eq!(doc.description, "About");
        assert!(!doc.show_table_of_contents);
        assert!(!doc.apply_automatic_indentation);
    }

    #[rstest]
    #[case("", 3)]
    #[case("   ", 3)]
    #[case("T", 0)]
    fn build_rejects_bad_input(#[case] title: &str, #[case] count: usize) {
        let err = build(title, "", count, "Ch", &BuildOptions::default()).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn extend_continues_numbering() {
        let mut doc = build("T", "", 2, "Ch", &BuildOptions::default()).unwrap();
        doc.last_update_date = 0;
        extend(&mut doc, 2, "Part ").unwrap();
        assert_eq!(codes(&doc), vec!["scene1", "scene2", "scene3", "scene4"]);
        assert_eq!(titles(&doc)[3], "Part 4");
        assert_eq!(doc.sections().len(), 4);
        assert_eq!(doc.sections()[3].section_scenes[0].code, "scene4");
        assert!(doc.last_update_date > 0);
    }

    #[test]
    fn merge_renumbers_and_relinks() {
        let first = document_with_scenes(&["a", "b"]);
        let second = document_with_scenes(&["c"]);
        let merged = merge(&[first, second], "Merged", "", "C").unwrap();

        assert_eq!(codes(&merged), vec!["scene1", "scene2", "scene3"]);
        assert_eq!(titles(&merged), vec!["C1", "C2", "C3"]);
        let links: Vec<_> = merged
            .sections()
            .iter()
            .map(|section| section.section_scenes[0].code.as_str())
            .collect();
        assert_eq!(links, vec!["scene1", "scene2", "scene3"]);
        assert_eq!(merged.scenes()[2].blocks()[0].text(), "c");
        assert!(merged.show_table_of_contents);
        assert!(merged.apply_automatic_indentation);
        assert_eq!(
            merged.revision().unwrap().book_progresses[0].word_count,
            3
        );
    }

    #[test]
    fn merge_takes_first_non_empty_statuses() {
        let mut first = document_with_scenes(&["a"]);
        first.revision_mut().unwrap().statuses.clear();
        let mut second = document_with_scenes(&["b"]);
        second.revision_mut().unwrap().statuses[0].title = "Draft".to_string();
        let merged = merge(&[first, second], "M", "", "").unwrap();
        assert_eq!(merged.revision().unwrap().statuses[0].title, "Draft");
    }

    #[test]
    fn merge_skips_empty_documents() {
        let empty = document_with_scenes(&[]);
        let merged = merge(&[empty, document_with_scenes(&["x"])], "M", "", "").unwrap();
        assert_eq!(titles(&merged), vec!["1"]);
    }

    #[test]
    fn merge_with_no_chapters_is_empty_selection() {
        let err = merge(&[document_with_scenes(&[])], "M", "", "").unwrap_err();
        assert!(matches!(err, EngineError::EmptySelection(_)));
    }

    #[test]
    fn merge_fills_missing_sections() {
        let mut doc = document_with_scenes(&["a", "b"]);
        doc.revision_mut().unwrap().sections.truncate(1);
        let merged = merge(&[doc], "M", "", "").unwrap();
        assert_eq!(merged.sections().len(), 2);
        assert_eq!(merged.sections()[1].section_scenes[0].code, "scene2");
    }

    #[test]
    fn from_chapters_sorts_naturally_and_segments() {
        let files = vec![
            ChapterFile::new("Chapter 10.txt", "Ten."),
            ChapterFile::new("notes.md", "ignored"),
            ChapterFile::new("chapter 2.TXT", "Two a.\n\nTwo b."),
            ChapterFile::new("Chapter 1.txt", "One."),
        ];
        let doc = build_from_chapters("Novel", "", files, &BuildOptions::default()).unwrap();

        assert_eq!(titles(&doc), vec!["Chapter 1", "chapter 2", "Chapter 10"]);
        assert_eq!(doc.scenes()[1].blocks().len(), 4);
        assert_eq!(doc.sections()[1].title, "chapter 2");
        assert_eq!(doc.revision().unwrap().book_progresses[0].word_count, 6);
    }

    #[test]
    fn from_chapters_without_txt_files_is_empty_selection() {
        let files = vec![ChapterFile::new("cover.jpg", "")];
        let err = build_from_chapters("Novel", "", files, &BuildOptions::default()).unwrap_err();
        assert!(matches!(err, EngineError::EmptySelection(_)));
    }

    #[test]
    fn generated_codes_are_hex() {
        let code = generate_code();
        assert_eq!(code.len(), 8);
        assert!(code.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
