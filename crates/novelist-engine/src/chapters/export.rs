use crate::error::{EngineError, SceneParseWarning};
use crate::models::Document;

use super::segment::{flatten_chapter_to_text, join_chapters};

/// One exported file: a single chapter or a grouped run of chapters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterUnit {
    /// File name including the `.txt` extension.
    pub name: String,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportMode {
    /// One unit per chapter, named `{prefix}{NN}.txt`.
    Single,
    /// Runs of `group_size` chapters, named `{prefix} C{start}-{end}.txt`.
    Grouped { group_size: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    pub prefix: String,
    pub start_number: u32,
    /// Chapters to skip from the front.
    pub offset: usize,
    pub mode: ExportMode,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            prefix: "chapter".to_string(),
            start_number: 1,
            offset: 0,
            mode: ExportMode::Single,
        }
    }
}

/// Flattened text of every scene, in ranking order.
///
/// Scenes with malformed text flatten to an empty chapter and are reported.
pub fn chapter_texts(document: &Document) -> (Vec<String>, Vec<SceneParseWarning>) {
    let mut texts = Vec::new();
    let mut warnings = Vec::new();
    let ordered = document
        .revision()
        .map(|revision| revision.scenes_by_ranking())
        .unwrap_or_default();

    for (scene_index, scene) in ordered {
        match scene.body() {
            Ok(body) => texts.push(flatten_chapter_to_text(&body.blocks)),
            Err(err) => {
                log::warn!("Scene {:?} has unreadable text: {err}", scene.title);
                warnings.push(SceneParseWarning {
                    scene_index,
                    scene_title: scene.title.clone(),
                    message: err.to_string(),
                });
                texts.push(String::new());
            }
        }
    }
    (texts, warnings)
}

/// Turn chapter texts into named output units.
///
/// The first chapter kept after `offset` is numbered `start_number`.
pub fn extract_chapter_units<S: AsRef<str>>(
    chapters: &[S],
    options: &ExportOptions,
) -> Result<Vec<ChapterUnit>, EngineError> {
    let usable = chapters.get(options.offset..).unwrap_or_default();
    if usable.is_empty() {
        return Err(EngineError::EmptySelection(format!(
            "offset {} skips all {} chapter(s)",
            options.offset,
            chapters.len()
        )));
    }

    let prefix = &options.prefix;
    let start = options.start_number as usize;
    let units: Vec<ChapterUnit> = match options.mode {
        ExportMode::Single => usable
            .iter()
            .enumerate()
            .map(|(index, text)| ChapterUnit {
                name: format!("{prefix}{:02}.txt", start + index),
                content: text.as_ref().to_string(),
            })
            .collect(),
        ExportMode::Grouped { group_size } => usable
            .chunks(group_size.max(1))
            .enumerate()
            .map(|(group, members)| {
                let first = start + group * group_size.max(1);
                let last = first + members.len() - 1;
                let name = if first == last {
                    format!("{prefix} C{first:02}.txt")
                } else {
                    format!("{prefix} C{first:02}-{last:02}.txt")
                };
                ChapterUnit {
                    name,
                    content: join_chapters(members),
                }
            })
            .collect(),
    };

    log::debug!(
        "exported {} chapter(s) into {} unit(s), skipped {}",
        usable.len(),
        units.len(),
        options.offset
    );
    Ok(units)
}
