//! Conversion between generated markdown and the widget's block/HTML forms.

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd, html};
use regex::Regex;
use std::sync::OnceLock;

use crate::models::{BlockContent, ListStyle};

/// Generated content ready for a destructive replace
///
/// `html` is what a browser-backed widget imports; `blocks` is the block
/// sequence the same markdown produces, in generation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Markup {
    pub html: String,
    pub blocks: Vec<BlockContent>,
}

impl Markup {
    pub fn from_markdown(markdown: &str) -> Self {
        Self {
            html: markdown_to_html(markdown),
            blocks: markdown_to_blocks(markdown),
        }
    }

    /// Number of blocks the replace is expected to produce
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// Render markdown to HTML using the tag names the widget's inline tools expect
pub fn markdown_to_html(markdown: &str) -> String {
    let mut out = String::new();
    html::push_html(&mut out, Parser::new_ext(markdown, Options::empty()));
    out.replace("<strong>", "<b>")
        .replace("</strong>", "</b>")
        .replace("<em>", "<i>")
        .replace("</em>", "</i>")
}

/// Remove control markup the widget leaves in blank editable regions
pub fn strip_control_markup(html: &str) -> String {
    html.replace("&nbsp;", "")
        .replace("<br>", "")
        .replace("<br/>", "")
        .replace('\u{a0}', "")
}

/// True when decoded text has nothing visible once control characters go
pub fn is_blank_text(text: &str) -> bool {
    strip_control_markup(text).trim().is_empty()
}

/// Emptiness rule shared by saves, focus tracking and the boundary search
pub fn is_blank(html: &str) -> bool {
    is_blank_text(&plain_text(html))
}

/// Visible text of an inline HTML fragment
pub fn plain_text(html: &str) -> String {
    static TAG: OnceLock<Regex> = OnceLock::new();
    let tag = TAG.get_or_init(|| Regex::new(r"<[^>]*>").expect("Invalid tag regex"));
    html_escape::decode_html_entities(&tag.replace_all(html, "")).into_owned()
}

/// Block under construction while walking parser events
enum Pending {
    Text { heading: Option<u8>, html: String },
    List { style: ListStyle, items: Vec<String>, depth: usize },
    Code { language: Option<String>, code: String },
}

fn markdown_to_blocks(markdown: &str) -> Vec<BlockContent> {
    let mut blocks = Vec::new();
    let mut pending: Option<Pending> = None;

    for event in Parser::new_ext(markdown, Options::empty()) {
        match event {
            Event::Start(Tag::List(first)) => match &mut pending {
                Some(Pending::List { depth, .. }) => *depth += 1,
                _ => {
                    let style = if first.is_some() {
                        ListStyle::Ordered
                    } else {
                        ListStyle::Unordered
                    };
                    pending = Some(Pending::List {
                        style,
                        items: Vec::new(),
                        depth: 0,
                    });
                }
            },
            Event::End(TagEnd::List(_)) => {
                if let Some(Pending::List { depth, .. }) = &mut pending
                    && *depth > 0
                {
                    *depth -= 1;
                } else {
                    flush(&mut pending, &mut blocks);
                }
            }
            Event::Start(Tag::Item) => {
                if let Some(Pending::List { items, .. }) = &mut pending {
                    items.push(String::new());
                }
            }
            Event::Start(Tag::Heading { level, .. }) => {
                if !in_list(&pending) {
                    pending = Some(Pending::Text {
                        heading: Some(level as u8),
                        html: String::new(),
                    });
                }
            }
            Event::Start(Tag::Paragraph) => {
                if !in_list(&pending) {
                    pending = Some(Pending::Text {
                        heading: None,
                        html: String::new(),
                    });
                }
            }
            Event::End(TagEnd::Heading(_)) | Event::End(TagEnd::Paragraph) => {
                if !in_list(&pending) {
                    flush(&mut pending, &mut blocks);
                }
            }
            Event::Start(Tag::CodeBlock(kind)) => {
                let language = match kind {
                    CodeBlockKind::Fenced(info) if !info.is_empty() => Some(info.to_string()),
                    _ => None,
                };
                pending = Some(Pending::Code {
                    language,
                    code: String::new(),
                });
            }
            Event::End(TagEnd::CodeBlock) => flush(&mut pending, &mut blocks),
            Event::Start(Tag::Strong) => push_inline(&mut pending, "<b>"),
            Event::End(TagEnd::Strong) => push_inline(&mut pending, "</b>"),
            Event::Start(Tag::Emphasis) => push_inline(&mut pending, "<i>"),
            Event::End(TagEnd::Emphasis) => push_inline(&mut pending, "</i>"),
            Event::Code(code) => {
                let escaped = html_escape::encode_text(&code);
                push_inline(
                    &mut pending,
                    &format!("<code class=\"inline-code\">{escaped}</code>"),
                );
            }
            Event::Text(text) => match &mut pending {
                Some(Pending::Code { code, .. }) => code.push_str(&text),
                _ => push_inline(&mut pending, &html_escape::encode_text(&text)),
            },
            Event::SoftBreak => push_inline(&mut pending, " "),
            Event::HardBreak => push_inline(&mut pending, "<br>"),
            _ => {}
        }
    }

    flush(&mut pending, &mut blocks);
    blocks
}

fn in_list(pending: &Option<Pending>) -> bool {
    matches!(pending, Some(Pending::List { .. }))
}

fn push_inline(pending: &mut Option<Pending>, fragment: &str) {
    match pending {
        Some(Pending::Text { html, .. }) => html.push_str(fragment),
        Some(Pending::List { items, .. }) => {
            if let Some(item) = items.last_mut() {
                item.push_str(fragment);
            }
        }
        Some(Pending::Code { code, .. }) => code.push_str(fragment),
        None => {}
    }
}

fn flush(pending: &mut Option<Pending>, blocks: &mut Vec<BlockContent>) {
    let Some(done) = pending.take() else {
        return;
    };

    let block = match done {
        Pending::Text { heading, html } => {
            let text = html.trim().to_string();
            if text.is_empty() {
                return;
            }
            match heading {
                Some(level) => BlockContent::Header { text, level },
                None => BlockContent::Paragraph { text },
            }
        }
        Pending::List { style, items, .. } => {
            let items: Vec<String> = items
                .into_iter()
                .map(|item| item.trim().to_string())
                .filter(|item| !item.is_empty())
                .collect();
            if items.is_empty() {
                return;
            }
            BlockContent::List { style, items }
        }
        Pending::Code { language, code } => BlockContent::CodeBox {
            code: code.trim_end_matches('\n').to_string(),
            language,
        },
    };
    blocks.push(block);
}
