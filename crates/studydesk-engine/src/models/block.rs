use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::editing::markup::{is_blank, is_blank_text, plain_text};

/// Payload keys whose string values count as visible text in unknown blocks
const TEXT_KEYS: [&str; 5] = ["text", "message", "title", "caption", "content"];

/// Opaque block identifier assigned by the editing widget
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(String);

impl BlockId {
    /// Length of generated ids, matching the short ids the web editor hands out
    const GENERATED_LEN: usize = 10;

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mint a fresh id for a block created by the widget
    pub fn generate() -> Self {
        let mut id = uuid::Uuid::new_v4().simple().to_string();
        id.truncate(Self::GENERATED_LEN);
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BlockId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListStyle {
    Unordered,
    Ordered,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub text: String,
    #[serde(default)]
    pub checked: bool,
}

/// Type tag plus type-specific payload, serialized as `{"type": .., "data": ..}`
///
/// Text fields hold inline HTML (`<b>`, `<i>`, `&nbsp;` ...) exactly as the
/// widget stores it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum BlockContent {
    Paragraph {
        text: String,
    },
    Header {
        text: String,
        level: u8,
    },
    List {
        style: ListStyle,
        items: Vec<String>,
    },
    Checklist {
        items: Vec<ChecklistItem>,
    },
    CodeBox {
        code: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        language: Option<String>,
    },
    /// Any other block tool (alert, table, image, ...), kept as saved
    #[serde(untagged)]
    Other {
        #[serde(rename = "type")]
        kind: String,
        #[serde(default)]
        data: Value,
    },
}

impl BlockContent {
    pub fn paragraph(text: impl Into<String>) -> Self {
        BlockContent::Paragraph { text: text.into() }
    }

    pub fn header(level: u8, text: impl Into<String>) -> Self {
        BlockContent::Header {
            text: text.into(),
            level,
        }
    }

    pub fn list(style: ListStyle, items: impl IntoIterator<Item = impl Into<String>>) -> Self {
        BlockContent::List {
            style,
            items: items.into_iter().map(Into::into).collect(),
        }
    }

    /// The type tag as the widget names it
    pub fn type_name(&self) -> &str {
        match self {
            BlockContent::Paragraph { .. } => "paragraph",
            BlockContent::Header { .. } => "header",
            BlockContent::List { .. } => "list",
            BlockContent::Checklist { .. } => "checklist",
            BlockContent::CodeBox { .. } => "codeBox",
            BlockContent::Other { kind, .. } => kind,
        }
    }

    /// True when no visible text remains once control markup is stripped
    pub fn is_empty(&self) -> bool {
        match self {
            BlockContent::Paragraph { text } | BlockContent::Header { text, .. } => is_blank(text),
            BlockContent::List { items, .. } => items.iter().all(|item| is_blank(item)),
            BlockContent::Checklist { items } => items.iter().all(|item| is_blank(&item.text)),
            BlockContent::CodeBox { code, .. } => is_blank_text(code),
            BlockContent::Other { .. } => is_blank_text(&self.text()),
        }
    }

    /// Visible text with tags removed and entities decoded
    pub fn text(&self) -> String {
        match self {
            BlockContent::Paragraph { text } | BlockContent::Header { text, .. } => {
                plain_text(text)
            }
            BlockContent::List { items, .. } => items
                .iter()
                .map(|item| plain_text(item))
                .collect::<Vec<_>>()
                .join("\n"),
            BlockContent::Checklist { items } => items
                .iter()
                .map(|item| plain_text(&item.text))
                .collect::<Vec<_>>()
                .join("\n"),
            BlockContent::CodeBox { code, .. } => code.clone(),
            BlockContent::Other { data, .. } => {
                let mut parts = Vec::new();
                payload_text(data, &mut parts);
                parts.join("\n")
            }
        }
    }
}

fn payload_text(data: &Value, parts: &mut Vec<String>) {
    match data {
        Value::Object(fields) => {
            for (key, value) in fields {
                match value {
                    Value::String(text) if TEXT_KEYS.contains(&key.as_str()) => {
                        parts.push(plain_text(text))
                    }
                    Value::Object(_) | Value::Array(_) => payload_text(value, parts),
                    _ => {}
                }
            }
        }
        Value::Array(values) => {
            for value in values {
                match value {
                    Value::String(text) => parts.push(plain_text(text)),
                    other => payload_text(other, parts),
                }
            }
        }
        _ => {}
    }
}

/// One unit of document content. Position lives in the containing sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    #[serde(flatten)]
    pub content: BlockContent,
    /// Per-type display options, persisted under the widget's `tunes` key
    #[serde(default, rename = "tunes", skip_serializing_if = "Option::is_none")]
    pub config: Option<serde_json::Value>,
}

impl Block {
    pub fn new(id: impl Into<BlockId>, content: BlockContent) -> Self {
        Self {
            id: id.into(),
            content,
            config: None,
        }
    }

    /// Block with a freshly generated id
    pub fn generated(content: BlockContent) -> Self {
        Self::new(BlockId::generate(), content)
    }

    pub fn with_config(mut self, config: serde_json::Value) -> Self {
        self.config = Some(config);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

impl From<String> for BlockId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn test_block_serializes_in_widget_format() {
        let block = Block::new("x1", BlockContent::header(2, "Title"))
            .with_config(json!({"alignmentTune": {"alignment": "center"}}));

        let value = serde_json::to_value(&block).unwrap();

        assert_eq!(
            value,
            json!({
                "id": "x1",
                "type": "header",
                "data": {"text": "Title", "level": 2},
                "tunes": {"alignmentTune": {"alignment": "center"}}
            })
        );
    }

    #[test]
    fn test_block_deserializes_list_and_codebox() {
        let list: Block = serde_json::from_value(json!({
            "id": "l1",
            "type": "list",
            "data": {"style": "ordered", "items": ["a", "b"]}
        }))
        .unwrap();
        assert_eq!(list.content, BlockContent::list(ListStyle::Ordered, ["a", "b"]));
        assert_eq!(list.config, None);

        let code: Block = serde_json::from_value(json!({
            "id": "c1",
            "type": "codeBox",
            "data": {"code": "fn main() {}"}
        }))
        .unwrap();
        assert_eq!(code.content.type_name(), "codeBox");
    }

    #[rstest]
    #[case(BlockContent::paragraph(""), true)]
    #[case(BlockContent::paragraph("&nbsp;"), true)]
    #[case(BlockContent::paragraph("<br>"), true)]
    #[case(BlockContent::paragraph("Hello"), false)]
    #[case(BlockContent::header(1, "&nbsp;&nbsp;"), true)]
    #[case(BlockContent::list(ListStyle::Unordered, ["", ""]), true)]
    #[case(BlockContent::list(ListStyle::Unordered, ["", "x"]), false)]
    #[case(BlockContent::Checklist { items: vec![] }, true)]
    #[case(BlockContent::paragraph("   "), true)]
    #[case(BlockContent::paragraph("<b></b>"), true)]
    fn test_block_emptiness(#[case] content: BlockContent, #[case] expected: bool) {
        assert_eq!(content.is_empty(), expected);
    }

    #[test]
    fn test_unknown_block_type_round_trips_unchanged() {
        let saved = json!({
            "id": "w1",
            "type": "alert",
            "data": {"type": "info", "align": "left", "message": "Exam on <b>Friday</b>"}
        });

        let block: Block = serde_json::from_value(saved.clone()).unwrap();

        assert_eq!(block.content.type_name(), "alert");
        assert_eq!(block.content.text(), "Exam on Friday");
        assert!(!block.is_empty());
        assert_eq!(serde_json::to_value(&block).unwrap(), saved);
    }

    #[test]
    fn test_unknown_block_text_from_nested_arrays() {
        let table = BlockContent::Other {
            kind: "table".to_string(),
            data: json!({"withHeadings": true, "content": [["Cell", "Size"], ["", "&nbsp;"]]}),
        };
        let image = BlockContent::Other {
            kind: "image".to_string(),
            data: json!({"file": {"url": "https://x/cat.png"}, "caption": ""}),
        };

        assert_eq!(table.text(), "Cell\nSize\n\n\u{a0}");
        assert!(!table.is_empty());
        assert!(image.is_empty());
    }

    #[test]
    fn test_text_strips_inline_markup() {
        let content = BlockContent::paragraph("Some <b>bold</b> &amp; <i>italic</i>");
        assert_eq!(content.text(), "Some bold & italic");
    }

    #[test]
    fn test_generated_ids_are_short_and_distinct() {
        let a = BlockId::generate();
        let b = BlockId::generate();
        assert_eq!(a.as_str().len(), 10);
        assert_ne!(a, b);
    }
}
