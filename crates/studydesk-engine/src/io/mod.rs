use crate::models::{Document, NOTE_EXTENSION, NoteIndex};
use relative_path::{RelativePath, RelativePathBuf};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid note file {path}: {source}")]
    InvalidNote {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Invalid notes directory: {0}")]
    InvalidNotesDir(String),
}

/// Read a saved note document
pub fn read_note(relative_path: &RelativePath, notes_root: &Path) -> Result<Document, IoError> {
    let absolute_path = relative_path.to_path(notes_root);
    if !absolute_path.exists() {
        return Err(IoError::NotFound(absolute_path));
    }
    let bytes = fs::read(&absolute_path)?;
    Document::from_json(&bytes).map_err(|source| IoError::InvalidNote {
        path: absolute_path,
        source,
    })
}

/// Write a note document, creating parent directories as needed
pub fn write_note(
    relative_path: &RelativePath,
    notes_root: &Path,
    document: &Document,
) -> Result<(), IoError> {
    let absolute_path = relative_path.to_path(notes_root);

    if let Some(parent) = absolute_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let json = document
        .to_json_pretty()
        .map_err(|source| IoError::InvalidNote {
            path: absolute_path.clone(),
            source,
        })?;
    fs::write(&absolute_path, json).map_err(IoError::Io)
}

/// Scan for note files in the notes directory, as paths relative to it
pub fn scan_note_files(notes_root: &Path) -> Result<Vec<RelativePathBuf>, IoError> {
    validate_notes_dir(notes_root)?;

    let mut files = Vec::new();
    scan_directory_recursive(notes_root, notes_root, &mut files)?;
    files.sort();
    Ok(files)
}

/// Build the sorted note index for the notes directory
pub fn build_note_index(notes_root: &Path) -> Result<NoteIndex, IoError> {
    let mut index = NoteIndex::new();
    index.extend(scan_note_files(notes_root)?);
    Ok(index)
}

fn scan_directory_recursive(
    root: &Path,
    dir: &Path,
    files: &mut Vec<RelativePathBuf>,
) -> Result<(), IoError> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();

        if path.is_dir() {
            scan_directory_recursive(root, &path, files)?;
        } else if let Some(ext) = path.extension()
            && ext == NOTE_EXTENSION
            && let Ok(relative) = path.strip_prefix(root)
            && let Ok(relative) = RelativePathBuf::from_path(relative)
        {
            files.push(relative);
        }
    }

    Ok(())
}

pub fn validate_notes_dir(path: &Path) -> Result<(), IoError> {
    if !path.exists() || !path.is_dir() {
        return Err(IoError::InvalidNotesDir(
            "notes directory does not exist".to_string(),
        ));
    }

    Ok(())
}
