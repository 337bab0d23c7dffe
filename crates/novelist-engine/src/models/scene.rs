use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::lenient;

pub const BLOCK_TYPE_TEXT: &str = "text";
pub const BLOCK_ALIGN_LEFT: &str = "left";

/// A paragraph or spacer inside a scene.
///
/// `text` is optional in stored documents; a block without text and a block
/// with empty text both read as an empty paragraph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    #[serde(rename = "type", default = "default_block_type")]
    pub kind: String,
    #[serde(default = "default_align")]
    pub align: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_block_type() -> String {
    BLOCK_TYPE_TEXT.to_string()
}

fn default_align() -> String {
    BLOCK_ALIGN_LEFT.to_string()
}

impl Block {
    /// A left-aligned text block holding `text`.
    pub fn text_block(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::spacer()
        }
    }

    /// A left-aligned text block with no `text` field at all.
    pub fn spacer() -> Self {
        Self {
            kind: default_block_type(),
            align: default_align(),
            text: None,
            extra: Map::new(),
        }
    }

    /// A left-aligned text block with an explicitly empty `text` field.
    pub fn empty() -> Self {
        Self::text_block("")
    }

    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    pub fn is_text(&self) -> bool {
        self.kind == BLOCK_TYPE_TEXT
    }
}

/// The decoded form of [`Scene::text`].
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SceneBody {
    pub blocks: Vec<Block>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Deserialize)]
struct RawSceneBody {
    #[serde(default)]
    blocks: Value,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl SceneBody {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self {
            blocks,
            extra: Map::new(),
        }
    }

    /// Parse stored scene text.
    ///
    /// Blank text is an empty body. A `blocks` value that is not an array
    /// yields no blocks, and array entries that are not block objects become
    /// spacers so block indices stay stable. Only text that is not a JSON
    /// object at all is an error.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }

        let raw: RawSceneBody = serde_json::from_str(text)?;
        let blocks = match raw.blocks {
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::Object(_) => {
                        serde_json::from_value(item).unwrap_or_else(|_| Block::spacer())
                    }
                    _ => Block::spacer(),
                })
                .collect(),
            _ => Vec::new(),
        };

        Ok(Self {
            blocks,
            extra: raw.extra,
        })
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// A chapter-like unit of prose. Its blocks live serialized in `text`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    #[serde(default, deserialize_with = "lenient::string")]
    pub code: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub text: String,
    #[serde(default)]
    pub ranking: i64,
    #[serde(default, deserialize_with = "lenient::string")]
    pub status: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Scene {
    pub fn new(
        code: impl Into<String>,
        title: impl Into<String>,
        body: &SceneBody,
        ranking: i64,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            code: code.into(),
            title: title.into(),
            text: body.to_json()?,
            ranking,
            status: super::DEFAULT_STATUS_CODE.to_string(),
            extra: Map::new(),
        })
    }

    /// Decode the stored body; malformed text is reported, not swallowed.
    pub fn body(&self) -> Result<SceneBody, serde_json::Error> {
        SceneBody::parse(&self.text)
    }

    /// Blocks of this scene, or an empty list if the stored text is malformed.
    pub fn blocks(&self) -> Vec<Block> {
        self.body().map(|body| body.blocks).unwrap_or_default()
    }

    /// Replace the scene's blocks, keeping any other body fields.
    pub fn set_blocks(&mut self, blocks: Vec<Block>) -> Result<(), serde_json::Error> {
        let mut body = self.body().unwrap_or_default();
        body.blocks = blocks;
        self.set_body(&body)
    }

    pub fn set_body(&mut self, body: &SceneBody) -> Result<(), serde_json::Error> {
        self.text = body.to_json()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn block_without_text_reads_as_empty() {
        let block: Block = serde_json::from_str(r#"{"type":"text","align":"left"}"#).unwrap();
        assert_eq!(block.text, None);
        assert_eq!(block.text(), "");
    }

    #[test]
    fn spacer_serializes_without_text_field() {
        let json = serde_json::to_string(&Block::spacer()).unwrap();
        assert_eq!(json, r#"{"type":"text","align":"left"}"#);
    }

    #[test]
    fn empty_block_serializes_empty_text() {
        let json = serde_json::to_string(&Block::empty()).unwrap();
        assert_eq!(json, r#"{"type":"text","align":"left","text":""}"#);
    }

    #[test]
    fn unknown_block_fields_survive_round_trip() {
        let src = r#"{"type":"text","align":"center","text":"Hi","bold":true}"#;
        let block: Block = serde_json::from_str(src).unwrap();
        assert_eq!(block.align, "center");
        assert_eq!(serde_json::to_string(&block).unwrap(), src);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case(r#"{}"#)]
    #[case(r#"{"blocks":null}"#)]
    #[case(r#"{"blocks":"nope"}"#)]
    fn lenient_bodies_have_no_blocks(#[case] text: &str) {
        let body = SceneBody::parse(text).unwrap();
        assert!(body.blocks.is_empty());
    }

    #[rstest]
    #[case("{not json")]
    #[case("[1,2,3]")]
    #[case("42")]
    fn malformed_bodies_are_errors(#[case] text: &str) {
        assert!(SceneBody::parse(text).is_err());
    }

    #[test]
    fn non_object_entries_become_spacers() {
        let body = SceneBody::parse(r#"{"blocks":[null,{"text":"a"},7]}"#).unwrap();
        assert_eq!(body.blocks.len(), 3);
        assert_eq!(body.blocks[0], Block::spacer());
        assert_eq!(body.blocks[1].text(), "a");
        assert_eq!(body.blocks[2], Block::spacer());
    }

    #[test]
    fn set_blocks_reserializes_scene_text() {
        let mut scene = Scene::new("scene1", "One", &SceneBody::default(), 1).unwrap();
        scene
            .set_blocks(vec![Block::text_block("Hello"), Block::spacer()])
            .unwrap();
        assert_eq!(
            scene.text,
            r#"{"blocks":[{"type":"text","align":"left","text":"Hello"},{"type":"text","align":"left"}]}"#
        );
        assert_eq!(scene.blocks().len(), 2);
    }

    #[test]
    fn set_blocks_keeps_extra_body_fields() {
        let mut scene = Scene::new("scene1", "One", &SceneBody::default(), 1).unwrap();
        scene.text = r#"{"blocks":[],"version":2}"#.to_string();
        scene.set_blocks(vec![Block::empty()]).unwrap();
        assert!(scene.text.contains(r#""version":2"#));
    }

    #[test]
    fn blocks_of_malformed_scene_is_empty() {
        let mut scene = Scene::new("scene1", "One", &SceneBody::default(), 1).unwrap();
        scene.text = "{oops".to_string();
        assert!(scene.body().is_err());
        assert!(scene.blocks().is_empty());
    }

    #[test]
    fn numeric_status_is_accepted() {
        let scene: Scene =
            serde_json::from_str(r#"{"code":"scene1","title":"A","text":"","ranking":1,"status":2}"#)
                .unwrap();
        assert_eq!(scene.status, "2");
    }
}
