//! Markdown extraction for generation requests.
//!
//! Works from either the rendered view or saved blocks; both reduce to a
//! [`BlockShape`] and share one formatter.

use crate::editing::rendered::{ElementTag, RenderedBlock};
use crate::models::{Block, BlockContent, ListStyle};

/// What a block contributes to the extracted markdown
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockShape {
    Heading { level: u8, text: String },
    List { ordered: bool, items: Vec<String> },
    Plain(String),
}

impl BlockShape {
    pub fn from_rendered(block: &RenderedBlock) -> Self {
        let content = &block.content;
        match content.tag {
            ElementTag::Heading(level) if (1..=6).contains(&level) => BlockShape::Heading {
                level,
                text: content.inner_text(),
            },
            ElementTag::UnorderedList | ElementTag::OrderedList => BlockShape::List {
                ordered: content.tag == ElementTag::OrderedList,
                items: content.children.iter().map(|item| item.inner_text()).collect(),
            },
            _ => BlockShape::Plain(content.inner_text()),
        }
    }

    pub fn from_block(block: &Block) -> Self {
        match &block.content {
            BlockContent::Header { level, .. } if (1..=6).contains(level) => BlockShape::Heading {
                level: *level,
                text: block.content.text(),
            },
            BlockContent::List { style, items } => BlockShape::List {
                ordered: *style == ListStyle::Ordered,
                items: items
                    .iter()
                    .map(|item| crate::editing::markup::plain_text(item))
                    .collect(),
            },
            other => BlockShape::Plain(other.text()),
        }
    }

    /// Markdown for this block, without the trailing newline
    pub fn to_markdown(&self) -> String {
        match self {
            BlockShape::Heading { level, text } => {
                format!("{} {}", "#".repeat(*level as usize), text)
            }
            BlockShape::List { ordered, items } => items
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    if *ordered {
                        format!("{}. {}", index + 1, item)
                    } else {
                        format!("- {item}")
                    }
                })
                .collect::<Vec<_>>()
                .join("\n"),
            BlockShape::Plain(text) => text.clone(),
        }
    }
}

fn join_lines(shapes: impl Iterator<Item = BlockShape>) -> String {
    let mut out = String::new();
    for shape in shapes {
        out.push_str(&shape.to_markdown());
        out.push('\n');
    }
    out
}

/// Markdown for what is currently on screen, in document order
pub fn extract_rendered(blocks: &[RenderedBlock]) -> String {
    join_lines(blocks.iter().map(BlockShape::from_rendered))
}

/// Markdown for a saved block sequence
pub fn extract_blocks(blocks: &[Block]) -> String {
    join_lines(blocks.iter().map(BlockShape::from_block))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::rendered::Element;
    use crate::models::BlockId;
    use crate::tests::{header, list, paragraph};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn rendered(blocks: &[Block]) -> Vec<RenderedBlock> {
        blocks.iter().map(RenderedBlock::from_block).collect()
    }

    #[test]
    fn test_empty_document_extracts_to_empty_string() {
        assert_eq!(extract_rendered(&[]), "");
        assert_eq!(extract_blocks(&[]), "");
    }

    #[test]
    fn test_paragraphs_have_no_prefix() {
        let blocks = vec![paragraph("a", "Hello"), paragraph("b", "<b>World</b>")];

        assert_eq!(extract_rendered(&rendered(&blocks)), "Hello\nWorld\n");
        assert_eq!(extract_blocks(&blocks), "Hello\nWorld\n");
    }

    #[rstest]
    #[case(ListStyle::Unordered, "- a\n- b")]
    #[case(ListStyle::Ordered, "1. a\n2. b")]
    fn test_list_shapes(#[case] style: ListStyle, #[case] expected: &str) {
        let block = list("l", style, &["a", "b"]);

        assert_eq!(BlockShape::from_block(&block).to_markdown(), expected);
        assert_eq!(
            BlockShape::from_rendered(&RenderedBlock::from_block(&block)).to_markdown(),
            expected
        );
    }

    #[rstest]
    #[case(1, "# Title")]
    #[case(4, "#### Title")]
    #[case(6, "###### Title")]
    fn test_heading_prefix(#[case] level: u8, #[case] expected: &str) {
        let block = header("h", level, "Title");
        assert_eq!(BlockShape::from_block(&block).to_markdown(), expected);
    }

    #[test]
    fn test_mixed_document_snapshot() {
        let blocks = vec![
            header("h", 2, "Photosynthesis"),
            paragraph("p", "Plants make <i>sugar</i> &amp; oxygen."),
            list("l", ListStyle::Ordered, &["light", "water"]),
            paragraph("e", ""),
        ];

        let markdown = extract_rendered(&rendered(&blocks));

        insta::assert_snapshot!(
            markdown.trim_end(),
            @"## Photosynthesis\nPlants make sugar & oxygen.\n1. light\n2. water"
        );
        assert!(markdown.ends_with("2. water\n\n"));
    }

    #[test]
    fn test_unknown_tags_degrade_to_text() {
        let block = RenderedBlock::new(
            BlockId::new("x"),
            Element::new(ElementTag::Other("blockquote".to_string()), "Quoted <u>text</u>"),
        );
        assert_eq!(extract_rendered(&[block]), "Quoted text\n");
    }
}
