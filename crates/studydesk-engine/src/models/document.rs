use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::models::{Block, BlockId};

/// Version string stamped on documents saved by this engine
pub const EDITOR_FORMAT_VERSION: &str = "2.30.0";

/// Saved form of one note: an ordered sequence of blocks
///
/// Order is positional; blocks carry no index of their own. This is also the
/// shape of a snapshot taken before a destructive replace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Milliseconds since the epoch when the document was saved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<u64>,
    pub blocks: Vec<Block>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl Document {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self {
            time: None,
            blocks,
            version: None,
        }
    }

    /// Stamp the document the way a fresh save would
    pub fn stamped(blocks: Vec<Block>) -> Self {
        let time = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as u64)
            .ok();
        Self {
            time,
            blocks,
            version: Some(EDITOR_FORMAT_VERSION.to_string()),
        }
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn position(&self, id: &BlockId) -> Option<usize> {
        self.blocks.iter().position(|block| &block.id == id)
    }

    pub fn ids(&self) -> Vec<BlockId> {
        self.blocks.iter().map(|block| block.id.clone()).collect()
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BlockContent;
    use crate::tests::paragraph;

    #[test]
    fn test_document_reads_saved_editor_output() {
        let json = br#"{
            "time": 1718000000000,
            "blocks": [
                {"id": "a", "type": "paragraph", "data": {"text": "Hello"}},
                {"id": "b", "type": "header", "data": {"text": "World", "level": 3}}
            ],
            "version": "2.29.1"
        }"#;

        let doc = Document::from_json(json).unwrap();

        assert_eq!(doc.len(), 2);
        assert_eq!(doc.time, Some(1718000000000));
        assert_eq!(doc.blocks[1].content, BlockContent::header(3, "World"));
        assert_eq!(doc.position(&BlockId::new("b")), Some(1));
        assert_eq!(doc.position(&BlockId::new("zz")), None);
    }

    #[test]
    fn test_document_json_survives_write_and_read() {
        let doc = Document::stamped(vec![paragraph("x1", "Hello"), paragraph("x2", "World")]);

        let json = doc.to_json_pretty().unwrap();
        let reread = Document::from_json(json.as_bytes()).unwrap();

        assert_eq!(reread, doc);
        assert_eq!(reread.version.as_deref(), Some(EDITOR_FORMAT_VERSION));
    }

    #[test]
    fn test_empty_document_has_no_ids() {
        let doc = Document::default();
        assert!(doc.is_empty());
        assert!(doc.ids().is_empty());
    }
}
