use chrono::{Datelike, Local, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Scene, lenient};
use crate::error::{EngineError, SceneParseWarning};

/// Backup format version written by this crate.
pub const BACKUP_VERSION: u32 = 4;
pub const DEFAULT_STATUS_CODE: &str = "1";

/// Milliseconds since the Unix epoch, the unit of every backup timestamp.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Status {
    #[serde(default, deserialize_with = "lenient::string")]
    pub code: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub title: String,
    #[serde(default)]
    pub color: i64,
    #[serde(default)]
    pub ranking: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Status {
    fn default() -> Self {
        Self {
            code: DEFAULT_STATUS_CODE.to_string(),
            title: "Todo".to_string(),
            color: -2697255,
            ranking: 1,
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookProgress {
    #[serde(default)]
    pub year: i32,
    #[serde(default)]
    pub month: u32,
    #[serde(default)]
    pub day: u32,
    #[serde(default)]
    pub word_count: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BookProgress {
    /// Progress entry dated today (local time).
    pub fn today(word_count: u64) -> Self {
        let now = Local::now();
        Self {
            year: now.year(),
            month: now.month(),
            day: now.day(),
            word_count,
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionScene {
    #[serde(default, deserialize_with = "lenient::string")]
    pub code: String,
    #[serde(default)]
    pub ranking: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Table-of-contents entry pointing at one scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    #[serde(default, deserialize_with = "lenient::string")]
    pub code: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub synopsis: String,
    #[serde(default)]
    pub ranking: i64,
    #[serde(default)]
    pub section_scenes: Vec<SectionScene>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Section {
    /// A section linking to `scene_code` as its only scene.
    pub fn for_scene(
        code: impl Into<String>,
        title: impl Into<String>,
        scene_code: impl Into<String>,
        ranking: i64,
    ) -> Self {
        Self {
            code: code.into(),
            title: title.into(),
            synopsis: String::new(),
            ranking,
            section_scenes: vec![SectionScene {
                code: scene_code.into(),
                ranking: 1,
                extra: Map::new(),
            }],
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Revision {
    #[serde(default)]
    pub number: i64,
    #[serde(default)]
    pub date: i64,
    #[serde(default)]
    pub book_progresses: Vec<BookProgress>,
    #[serde(default)]
    pub statuses: Vec<Status>,
    #[serde(default)]
    pub scenes: Vec<Scene>,
    #[serde(default)]
    pub sections: Vec<Section>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Revision {
    pub fn new(scenes: Vec<Scene>, sections: Vec<Section>, statuses: Vec<Status>) -> Self {
        Self {
            number: 1,
            date: now_millis(),
            book_progresses: vec![BookProgress::today(0)],
            statuses,
            scenes,
            sections,
            extra: Map::new(),
        }
    }

    /// Scenes in display order, paired with their stored index. Equal rankings keep their stored order.
    pub fn scenes_by_ranking(&self) -> Vec<(usize, &Scene)> {
        let mut scenes: Vec<(usize, &Scene)> = self.scenes.iter().enumerate().collect();
        scenes.sort_by_key(|(_, scene)| scene.ranking);
        scenes
    }
}

/// A manuscript backup. Only the first revision is ever operated on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default, deserialize_with = "lenient::string")]
    pub code: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub description: String,
    #[serde(default)]
    pub show_table_of_contents: bool,
    #[serde(default)]
    pub apply_automatic_indentation: bool,
    #[serde(default)]
    pub last_update_date: i64,
    #[serde(default)]
    pub last_backup_date: i64,
    #[serde(default)]
    pub revisions: Vec<Revision>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_version() -> u32 {
    BACKUP_VERSION
}

impl Document {
    /// Parse a backup. The document must carry at least one revision.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EngineError> {
        let document: Document = serde_json::from_slice(bytes)?;
        if document.revisions.is_empty() {
            return Err(EngineError::Validation(
                "backup has no revisions".to_string(),
            ));
        }
        Ok(document)
    }

    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        Self::from_bytes(json.as_bytes())
    }

    /// Pretty-printed JSON, the layout the backup format is exchanged in.
    pub fn to_json_pretty(&self) -> Result<String, EngineError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn revision(&self) -> Option<&Revision> {
        self.revisions.first()
    }

    pub fn revision_mut(&mut self) -> Option<&mut Revision> {
        self.revisions.first_mut()
    }

    pub fn scenes(&self) -> &[Scene] {
        self.revision()
            .map(|revision| revision.scenes.as_slice())
            .unwrap_or_default()
    }

    pub fn scenes_mut(&mut self) -> &mut [Scene] {
        self.revision_mut()
            .map(|revision| revision.scenes.as_mut_slice())
            .unwrap_or_default()
    }

    pub fn sections(&self) -> &[Section] {
        self.revision()
            .map(|revision| revision.sections.as_slice())
            .unwrap_or_default()
    }

    /// Refresh the update, backup and revision timestamps.
    pub fn touch(&mut self) {
        let now = now_millis();
        self.last_update_date = now;
        self.last_backup_date = now;
        if let Some(revision) = self.revision_mut() {
            revision.date = now;
        }
    }

    /// Words across all text blocks of the active revision.
    ///
    /// Scenes whose text cannot be parsed count as zero and are reported.
    pub fn word_count_with_warnings(&self) -> (u64, Vec<SceneParseWarning>) {
        let mut total = 0u64;
        let mut warnings = Vec::new();
        for (index, scene) in self.scenes().iter().enumerate() {
            match scene.body() {
                Ok(body) => {
                    total += body
                        .blocks
                        .iter()
                        .filter(|block| block.is_text())
                        .map(|block| block.text().split_whitespace().count() as u64)
                        .sum::<u64>();
                }
                Err(err) => warnings.push(SceneParseWarning {
                    scene_index: index,
                    scene_title: scene.title.clone(),
                    message: err.to_string(),
                }),
            }
        }
        (total, warnings)
    }

    pub fn word_count(&self) -> u64 {
        self.word_count_with_warnings().0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Block, SceneBody};
    use pretty_assertions::assert_eq;

    const MINIMAL: &str = r#"{
        "version": 4,
        "code": "abcd1234",
        "title": "Novel",
        "description": "",
        "show_table_of_contents": true,
        "apply_automatic_indentation": false,
        "last_update_date": 1,
        "last_backup_date": 2,
        "cover_image": "cover.png",
        "revisions": [{
            "number": 1,
            "date": 3,
            "book_progresses": [{"year": 2024, "month": 5, "day": 6, "word_count": 0}],
            "statuses": [{"code": "1", "title": "Todo", "color": -2697255, "ranking": 1}],
            "scenes": [{
                "code": "scene1",
                "title": "One",
                "text": "{\"blocks\":[{\"type\":\"text\",\"align\":\"left\",\"text\":\"Hello there world\"}]}",
                "ranking": 1,
                "status": "1"
            }],
            "sections": [{
                "code": "section1",
                "title": "One",
                "synopsis": "",
                "ranking": 1,
                "section_scenes": [{"code": "scene1", "ranking": 1}]
            }]
        }]
    }"#;

    #[test]
    fn parses_backup_document() {
        let doc = Document::from_json(MINIMAL).unwrap();
        assert_eq!(doc.version, 4);
        assert_eq!(doc.title, "Novel");
        assert_eq!(doc.scenes().len(), 1);
        assert_eq!(doc.sections()[0].section_scenes[0].code, "scene1");
        assert_eq!(doc.scenes()[0].blocks()[0].text(), "Hello there world");
    }

    #[test]
    fn unknown_top_level_fields_are_preserved() {
        let doc = Document::from_json(MINIMAL).unwrap();
        let json = doc.to_json_pretty().unwrap();
        assert!(json.contains("\"cover_image\": \"cover.png\""));
        let reparsed = Document::from_json(&json).unwrap();
        assert_eq!(reparsed, doc);
    }

    #[test]
    fn document_without_revisions_is_rejected() {
        let err = Document::from_json(r#"{"title":"x","revisions":[]}"#).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn malformed_json_is_a_json_error() {
        let err = Document::from_json("{").unwrap_err();
        assert!(matches!(err, EngineError::Json(_)));
    }

    #[test]
    fn touch_refreshes_all_timestamps() {
        let mut doc = Document::from_json(MINIMAL).unwrap();
        doc.touch();
        assert!(doc.last_update_date > 2);
        assert_eq!(doc.last_update_date, doc.last_backup_date);
        assert_eq!(doc.revision().unwrap().date, doc.last_update_date);
    }

    #[test]
    fn word_count_skips_malformed_scenes() {
        let mut doc = Document::from_json(MINIMAL).unwrap();
        let mut broken = doc.scenes()[0].clone();
        broken.text = "{broken".to_string();
        broken.title = "Broken".to_string();
        let mut extra = doc.scenes()[0].clone();
        extra
            .set_body(&SceneBody::new(vec![
                Block::text_block("two words"),
                Block::spacer(),
            ]))
            .unwrap();
        let revision = doc.revision_mut().unwrap();
        revision.scenes.push(broken);
        revision.scenes.push(extra);

        let (count, warnings) = doc.word_count_with_warnings();
        assert_eq!(count, 5);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].scene_index, 1);
        assert_eq!(warnings[0].scene_title, "Broken");
    }

    #[test]
    fn scenes_by_ranking_sorts_stably() {
        let body = SceneBody::default();
        let revision = Revision::new(
            vec![
                Scene::new("scene1", "B", &body, 2).unwrap(),
                Scene::new("scene2", "A", &body, 1).unwrap(),
                Scene::new("scene3", "C", &body, 2).unwrap(),
            ],
            Vec::new(),
            vec![Status::default()],
        );
        let ordered: Vec<_> = revision
            .scenes_by_ranking()
            .into_iter()
            .map(|(index, scene)| (index, scene.title.as_str()))
            .collect();
        assert_eq!(ordered, vec![(1, "A"), (0, "B"), (2, "C")]);
    }
}
