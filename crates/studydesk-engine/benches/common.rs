// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
use studydesk_engine::models::{Block, BlockContent, Document};

#[allow(dead_code)]
pub fn generate_document(size: usize) -> Document {
    Document::new(
        (0..size)
            .map(|i| Block::new(format!("b{i}"), BlockContent::paragraph(format!("Line {i}"))))
            .collect(),
    )
}

#[allow(dead_code)]
pub fn generate_markdown_content(size: usize) -> String {
    let base = "## Section\n\nParagraph with some **bold** content.\n\n- Bullet point\n- Another item\n\n";
    base.repeat(size)
}
