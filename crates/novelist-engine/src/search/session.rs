use crate::error::{EngineError, SceneParseWarning};
use crate::models::{Document, Scene, SceneBody};

use super::matcher::{Matcher, char_len_at};
use super::{Cursor, Match, MatchSpan, Position, SearchQuery, line_containing};

/// Result of one find call.
#[derive(Debug, Default, PartialEq)]
pub struct SearchOutcome {
    pub found: Option<Match>,
    /// Scenes skipped because their stored text could not be parsed.
    pub warnings: Vec<SceneParseWarning>,
}

/// Result of a document-wide replace.
#[derive(Debug, Default, PartialEq)]
pub struct ReplaceAllOutcome {
    pub replacements: usize,
    pub warnings: Vec<SceneParseWarning>,
}

/// Where a backward scan begins.
#[derive(Debug, Clone, Copy)]
struct BackwardStart {
    scene: usize,
    /// `None` means the scene's last block.
    block: Option<usize>,
    /// `None` means the block's full length.
    ceiling: Option<usize>,
}

/// Find & replace state for one document: the resume cursor and the match
/// most recently found.
///
/// The session does not own the document; it is passed in on every call.
/// Searching borrows it shared, replacing borrows it exclusively.
#[derive(Debug, Default)]
pub struct FindSession {
    cursor: Cursor,
    current: Option<Match>,
}

impl FindSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn current_match(&self) -> Option<&Match> {
        self.current.as_ref()
    }

    /// Move the cursor explicitly. Drops the held match.
    pub fn seek(&mut self, cursor: Cursor) {
        self.cursor = cursor;
        self.current = None;
    }

    /// Back to the start of the document with no held match.
    pub fn reset(&mut self) {
        self.seek(Cursor::default());
    }

    /// Find the next occurrence at or after the cursor.
    ///
    /// On a hit the cursor moves just past the match. When nothing is left the
    /// cursor becomes [`Cursor::ExhaustedForward`]. An invalid pattern fails
    /// without touching the cursor.
    pub fn find_next(
        &mut self,
        document: &Document,
        query: &SearchQuery,
    ) -> Result<SearchOutcome, EngineError> {
        let matcher = query.matcher()?;
        let scenes = document.scenes();
        let mut outcome = SearchOutcome::default();

        let start = match self.cursor {
            Cursor::Active(position) => position,
            Cursor::ExhaustedBackward => Position::origin(),
            Cursor::ExhaustedForward => {
                self.current = None;
                return Ok(outcome);
            }
        };

        for (scene_index, scene) in scenes.iter().enumerate().skip(start.scene) {
            let Some(body) = parse_or_warn(scene, scene_index, &mut outcome.warnings) else {
                continue;
            };
            let first_scene = scene_index == start.scene;
            let first_block = if first_scene { start.block } else { 0 };

            for (block_index, block) in body.blocks.iter().enumerate().skip(first_block) {
                let text = block.text();
                let min_start = if first_scene && block_index == start.block {
                    start.offset
                } else {
                    0
                };

                if text.is_empty() && !matcher.searches_empty_text() {
                    continue;
                }
                if min_start > text.len() || (min_start == text.len() && !text.is_empty()) {
                    continue;
                }

                if let Some(span) = matcher.find_from(text, min_start) {
                    let found = build_match(scene, scene_index, block_index, text, span);
                    let resume = if span.is_empty() {
                        span.start + char_len_at(text, span.start)
                    } else {
                        span.end
                    };
                    log::debug!(
                        "find next: match in scene {scene_index} block {block_index} at {}",
                        span.start
                    );
                    self.cursor = Cursor::at(scene_index, block_index, resume);
                    self.current = Some(found.clone());
                    outcome.found = Some(found);
                    return Ok(outcome);
                }
            }
        }

        self.cursor = Cursor::ExhaustedForward;
        self.current = None;
        Ok(outcome)
    }

    /// Find the last occurrence strictly before the cursor.
    ///
    /// Within a block this is the match ending nearest the cursor without
    /// reaching past it, so it undoes a preceding [`find_next`](Self::find_next).
    /// On a hit the cursor moves to the match start. A fresh session (origin
    /// cursor, no held match) and an exhausted-forward cursor both search from
    /// the end of the document. When nothing is left the cursor becomes
    /// [`Cursor::ExhaustedBackward`].
    pub fn find_previous(
        &mut self,
        document: &Document,
        query: &SearchQuery,
    ) -> Result<SearchOutcome, EngineError> {
        let matcher = query.matcher()?;
        let scenes = document.scenes();
        let mut outcome = SearchOutcome::default();

        let from_end = |scene_count: usize| {
            scene_count.checked_sub(1).map(|scene| BackwardStart {
                scene,
                block: None,
                ceiling: None,
            })
        };
        let start = match self.cursor {
            Cursor::ExhaustedBackward => {
                self.current = None;
                return Ok(outcome);
            }
            Cursor::ExhaustedForward => from_end(scenes.len()),
            Cursor::Active(position)
                if position.scene >= scenes.len()
                    || (position.is_origin() && self.current.is_none()) =>
            {
                from_end(scenes.len())
            }
            Cursor::Active(position) => Some(BackwardStart {
                scene: position.scene,
                block: Some(position.block),
                ceiling: Some(position.offset),
            }),
        };

        if let Some(start) = start {
            for scene_index in (0..=start.scene).rev() {
                let scene = &scenes[scene_index];
                let Some(body) = parse_or_warn(scene, scene_index, &mut outcome.warnings) else {
                    continue;
                };
                let Some(last_block) = body.blocks.len().checked_sub(1) else {
                    continue;
                };

                let first_scene = scene_index == start.scene;
                // A block index past the end means "from the end of the scene".
                let (first_block, first_ceiling) = match (first_scene, start.block) {
                    (true, Some(block)) if block <= last_block => (block, start.ceiling),
                    _ => (last_block, None),
                };

                for block_index in (0..=first_block).rev() {
                    let text = body.blocks[block_index].text();
                    let ceiling = if first_scene && block_index == first_block {
                        first_ceiling.unwrap_or(text.len())
                    } else {
                        text.len()
                    };

                    if text.is_empty() && !matcher.searches_empty_text() {
                        continue;
                    }

                    if let Some(span) = matcher.find_last_before(text, ceiling) {
                        let found = build_match(scene, scene_index, block_index, text, span);
                        log::debug!(
                            "find previous: match in scene {scene_index} block {block_index} at {}",
                            span.start
                        );
                        self.cursor = Cursor::at(scene_index, block_index, span.start);
                        self.current = Some(found.clone());
                        outcome.found = Some(found);
                        return Ok(outcome);
                    }
                }
            }
        }

        self.cursor = Cursor::ExhaustedBackward;
        self.current = None;
        Ok(outcome)
    }

    /// Replace the held match with `replacement`.
    ///
    /// The match is consumed; the cursor is left right after the inserted
    /// text so the next [`find_next`](Self::find_next) continues from there.
    pub fn replace_current(
        &mut self,
        document: &mut Document,
        replacement: &str,
    ) -> Result<(), EngineError> {
        let held = self.current.take().ok_or(EngineError::NoActiveMatch)?;

        let scene = document
            .scenes_mut()
            .get_mut(held.scene_index)
            .ok_or(EngineError::NoActiveMatch)?;
        let mut body = scene.body()?;
        let block = body
            .blocks
            .get_mut(held.block_index)
            .ok_or(EngineError::NoActiveMatch)?;

        let text = block.text();
        let (Some(before), Some(after)) = (text.get(..held.start), text.get(held.end()..)) else {
            return Err(EngineError::NoActiveMatch);
        };
        let replaced = format!("{before}{replacement}{after}");
        block.text = Some(replaced);
        scene.set_body(&body)?;

        self.cursor = Cursor::at(
            held.scene_index,
            held.block_index,
            held.start + replacement.len(),
        );
        Ok(())
    }

    /// Replace every occurrence in every block that carries text, whatever its
    /// `type`, so the result agrees with what the find calls visit.
    ///
    /// Ignores the cursor. Scenes with malformed text are left alone and
    /// reported. Afterwards the document timestamps are refreshed and the
    /// session is reset to the start.
    pub fn replace_all(
        &mut self,
        document: &mut Document,
        query: &SearchQuery,
        replacement: &str,
    ) -> Result<ReplaceAllOutcome, EngineError> {
        let matcher = query.matcher()?;
        let mut outcome = ReplaceAllOutcome::default();

        for (scene_index, scene) in document.scenes_mut().iter_mut().enumerate() {
            let Some(mut body) = parse_or_warn(scene, scene_index, &mut outcome.warnings) else {
                continue;
            };
            let replaced = replace_in_body(&mut body, matcher.as_ref(), replacement);
            if replaced > 0 {
                scene.set_body(&body)?;
                outcome.replacements += replaced;
            }
        }

        log::debug!("replace all: {} replacement(s)", outcome.replacements);
        document.touch();
        self.reset();
        Ok(outcome)
    }
}

fn replace_in_body(body: &mut SceneBody, matcher: &dyn Matcher, replacement: &str) -> usize {
    let mut count = 0;
    for block in body.blocks.iter_mut() {
        let Some(text) = block.text.as_deref() else {
            continue;
        };
        let (new_text, replaced) = matcher.replace_all(text, replacement);
        if replaced > 0 {
            block.text = Some(new_text);
            count += replaced;
        }
    }
    count
}

fn parse_or_warn(
    scene: &Scene,
    scene_index: usize,
    warnings: &mut Vec<SceneParseWarning>,
) -> Option<SceneBody> {
    match scene.body() {
        Ok(body) => Some(body),
        Err(err) => {
            log::warn!(
                "Skipping scene {:?} (index {scene_index}) due to invalid JSON: {err}",
                scene.title
            );
            warnings.push(SceneParseWarning {
                scene_index,
                scene_title: scene.title.clone(),
                message: err.to_string(),
            });
            None
        }
    }
}

fn build_match(
    scene: &Scene,
    scene_index: usize,
    block_index: usize,
    text: &str,
    span: MatchSpan,
) -> Match {
    Match {
        scene_index,
        block_index,
        start: span.start,
        length: span.len(),
        chapter_title: scene.title.clone(),
        line_text: line_containing(text, span.start).to_string(),
    }
}
