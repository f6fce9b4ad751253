use relative_path::RelativePathBuf;
use std::collections::BTreeMap;

use crate::models::NoteFile;

/// Sorted, de-duplicated set of notes discovered under the notes root
#[derive(Debug, Default)]
pub struct NoteIndex {
    notes: BTreeMap<RelativePathBuf, NoteFile>,
}

impl NoteIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, relative_path: RelativePathBuf) {
        self.notes
            .insert(relative_path.clone(), NoteFile::new(relative_path));
    }

    pub fn extend(&mut self, paths: impl IntoIterator<Item = RelativePathBuf>) {
        for path in paths {
            self.add(path);
        }
    }

    /// Notes ordered by path
    pub fn notes(&self) -> impl Iterator<Item = &NoteFile> {
        self.notes.values()
    }

    pub fn get(&self, index: usize) -> Option<&NoteFile> {
        self.notes.values().nth(index)
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn remove(&mut self, relative_path: &RelativePathBuf) -> Option<NoteFile> {
        self.notes.remove(relative_path)
    }
}
