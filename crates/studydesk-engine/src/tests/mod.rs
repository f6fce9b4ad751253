//! Shared fixtures for unit tests

use std::path::PathBuf;
use tempfile::TempDir;

use crate::models::{Block, BlockContent, ListStyle};

pub fn paragraph(id: &str, text: &str) -> Block {
    Block::new(id, BlockContent::paragraph(text))
}

pub fn header(id: &str, level: u8, text: &str) -> Block {
    Block::new(id, BlockContent::header(level, text))
}

pub fn list(id: &str, style: ListStyle, items: &[&str]) -> Block {
    Block::new(id, BlockContent::list(style, items.iter().copied()))
}

pub fn create_test_notes_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}

pub fn create_test_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create parent dirs");
    }
    std::fs::write(&path, content).expect("Failed to write test file");
    path
}
