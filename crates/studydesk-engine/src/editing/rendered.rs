use crate::editing::markup::{is_blank_text, plain_text};
use crate::models::{Block, BlockContent, BlockId, ListStyle};

/// Tag of a rendered content element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementTag {
    Heading(u8),
    Paragraph,
    UnorderedList,
    OrderedList,
    ListItem,
    Preformatted,
    Other(String),
}

impl ElementTag {
    /// Map an HTML tag name (any case) to a tag
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "h1" => ElementTag::Heading(1),
            "h2" => ElementTag::Heading(2),
            "h3" => ElementTag::Heading(3),
            "h4" => ElementTag::Heading(4),
            "h5" => ElementTag::Heading(5),
            "h6" => ElementTag::Heading(6),
            "p" => ElementTag::Paragraph,
            "ul" => ElementTag::UnorderedList,
            "ol" => ElementTag::OrderedList,
            "li" => ElementTag::ListItem,
            "pre" => ElementTag::Preformatted,
            other => ElementTag::Other(other.to_string()),
        }
    }
}

/// A rendered element: the editable region of a block, or one of its items
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: ElementTag,
    pub inner_html: String,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(tag: ElementTag, inner_html: impl Into<String>) -> Self {
        Self {
            tag,
            inner_html: inner_html.into(),
            children: Vec::new(),
        }
    }

    pub fn with_children(tag: ElementTag, children: Vec<Element>) -> Self {
        let inner_html = children
            .iter()
            .map(|child| child.inner_html.as_str())
            .collect::<Vec<_>>()
            .join("");
        Self {
            tag,
            inner_html,
            children,
        }
    }

    /// Visible text, one line per child for container elements
    pub fn inner_text(&self) -> String {
        if self.children.is_empty() {
            plain_text(&self.inner_html)
        } else {
            self.children
                .iter()
                .map(Element::inner_text)
                .collect::<Vec<_>>()
                .join("\n")
        }
    }
}

/// A block as currently displayed, including transient empty blocks that a
/// save would drop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedBlock {
    pub id: BlockId,
    /// The block's single content child
    pub content: Element,
}

impl RenderedBlock {
    pub fn new(id: BlockId, content: Element) -> Self {
        Self { id, content }
    }

    pub fn from_block(block: &Block) -> Self {
        let content = match &block.content {
            BlockContent::Paragraph { text } => Element::new(ElementTag::Paragraph, text.clone()),
            BlockContent::Header { text, level } => {
                Element::new(ElementTag::Heading(*level), text.clone())
            }
            BlockContent::List { style, items } => {
                let tag = match style {
                    ListStyle::Unordered => ElementTag::UnorderedList,
                    ListStyle::Ordered => ElementTag::OrderedList,
                };
                Element::with_children(
                    tag,
                    items
                        .iter()
                        .map(|item| Element::new(ElementTag::ListItem, item.clone()))
                        .collect(),
                )
            }
            BlockContent::Checklist { items } => Element::with_children(
                ElementTag::Other("div".to_string()),
                items
                    .iter()
                    .map(|item| Element::new(ElementTag::Other("div".to_string()), item.text.clone()))
                    .collect(),
            ),
            BlockContent::CodeBox { code, .. } => Element::new(
                ElementTag::Preformatted,
                html_escape::encode_text(code).into_owned(),
            ),
            BlockContent::Other { kind, .. } => Element::new(
                ElementTag::Other(kind.clone()),
                html_escape::encode_text(&block.content.text()).into_owned(),
            ),
        };
        Self::new(block.id.clone(), content)
    }

    /// Text as a browser's `innerText` would report it
    pub fn inner_text(&self) -> String {
        self.content.inner_text()
    }

    /// Same rule a save uses to drop the block
    pub fn is_empty(&self) -> bool {
        is_blank_text(&self.inner_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{header, list, paragraph};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("H1", ElementTag::Heading(1))]
    #[case("h6", ElementTag::Heading(6))]
    #[case("UL", ElementTag::UnorderedList)]
    #[case("ol", ElementTag::OrderedList)]
    #[case("DIV", ElementTag::Other("div".to_string()))]
    fn test_tag_from_name(#[case] name: &str, #[case] expected: ElementTag) {
        assert_eq!(ElementTag::from_name(name), expected);
    }

    #[test]
    fn test_rendered_list_has_item_children() {
        let rendered = RenderedBlock::from_block(&list("l1", ListStyle::Ordered, &["a", "<b>b</b>"]));

        assert_eq!(rendered.content.tag, ElementTag::OrderedList);
        assert_eq!(rendered.content.children.len(), 2);
        assert_eq!(rendered.inner_text(), "a\nb");
    }

    #[test]
    fn test_rendered_header_keeps_level() {
        let rendered = RenderedBlock::from_block(&header("h1", 3, "Topic"));
        assert_eq!(rendered.content.tag, ElementTag::Heading(3));
        assert_eq!(rendered.inner_text(), "Topic");
    }

    #[rstest]
    #[case(paragraph("p", "&nbsp;"))]
    #[case(paragraph("p", "  <br> "))]
    #[case(paragraph("p", "<i></i>"))]
    #[case(paragraph("p", "Hello"))]
    #[case(header("h", 2, "&nbsp;&nbsp;"))]
    #[case(list("l", ListStyle::Unordered, &["", "&nbsp;"]))]
    #[case(list("l", ListStyle::Unordered, &["", "x"]))]
    fn test_rendered_emptiness_matches_saved_emptiness(#[case] block: Block) {
        assert_eq!(RenderedBlock::from_block(&block).is_empty(), block.is_empty());
    }

    #[test]
    fn test_blank_paragraph_has_empty_inner_text() {
        let rendered = RenderedBlock::from_block(&paragraph("p1", ""));
        assert_eq!(rendered.inner_text(), "");
    }
}
