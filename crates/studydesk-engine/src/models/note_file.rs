use relative_path::{RelativePath, RelativePathBuf};

/// Extension of saved note documents
pub const NOTE_EXTENSION: &str = "json";

/// A saved note on disk, addressed relative to the notes root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteFile {
    relative_path: RelativePathBuf,
    title: String,
}

impl NoteFile {
    pub fn new(relative_path: RelativePathBuf) -> Self {
        let title = relative_path
            .file_stem()
            .filter(|stem| !stem.is_empty())
            .unwrap_or("Untitled")
            .to_string();

        Self {
            relative_path,
            title,
        }
    }

    pub fn relative_path(&self) -> &RelativePath {
        &self.relative_path
    }

    /// File name without the `.json` extension
    pub fn title(&self) -> &str {
        &self.title
    }
}

impl From<&str> for NoteFile {
    fn from(path: &str) -> Self {
        Self::new(RelativePathBuf::from(path))
    }
}
